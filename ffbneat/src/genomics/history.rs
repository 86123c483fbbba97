use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of gene and node innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers within a
/// generation's mutation phase.
///
/// For connection innovations the source and target nodes are
/// used to identify identical mutations, and the corresponding
/// innovation number is recorded.
///
/// For node (split) innovations the split gene is used to
/// identify identical mutations, and the innovation numbers for
/// the corresponding incoming gene, new node, and outgoing gene
/// are recorded, in that order.
///
/// Calling [`clear`] at a generation boundary forgets the
/// recorded mutations while preserving the counters, so numbers
/// are never reused or decreased across generations.
///
/// [`clear`]: History::clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    next_connection_innovation: Innovation,
    next_node_id: Innovation,
    connection_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    connection_endpoints: Vec<(Innovation, Innovation)>,
    split_innovations: HashMap<Innovation, (Innovation, Innovation, Innovation), RandomState>,
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Initially generated genes are given the innovation number
    /// `o + i ⨯ output_count`, where `i` is the id of their source
    /// input node and `o` is the index of their target output node.
    /// Thus, genes created through mutation start at innovation
    /// number `input_count ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::zero());
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let (connection_innovations, connection_endpoints) = (0..config.input_count.get())
            // Cartesian product of inputs and outputs...
            .flat_map(|i| (0..config.output_count.get()).map(move |o| (i, o)))
            // Get the output node id, as we only have indices...
            .map(|(i, o)| (i, o, o + config.input_count.get()))
            // Get both gene innovations and gene endpoints...
            .map(|(i, o_idx, o)| (((i, o), o_idx + i * config.output_count.get()), (i, o)))
            .unzip();
        History {
            // Pre-allocate innovation numbers for all possible initial
            // genes, and the input and output nodes.
            next_connection_innovation: config.input_count.get() * config.output_count.get(),
            next_node_id: config.input_count.get() + config.output_count.get(),
            connection_innovations,
            connection_endpoints,
            split_innovations: HashMap::default(),
        }
    }

    /// Returns the next connection innovation number, or the
    /// previously assigned number for the same connection mutation.
    pub fn next_connection_innovation(
        &self,
        source_id: Innovation,
        target_id: Innovation,
    ) -> Innovation {
        *self
            .connection_innovations
            .get(&(source_id, target_id))
            .unwrap_or(&self.next_connection_innovation)
    }

    /// Records a connection mutation and returns the assigned
    /// innovation number, or the previously assigned number for
    /// the same connection mutation.
    pub(crate) fn add_connection_innovation(
        &mut self,
        source_id: Innovation,
        target_id: Innovation,
    ) -> Innovation {
        match self.connection_innovations.entry((source_id, target_id)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = *entry.insert(self.next_connection_innovation);
                self.connection_endpoints.push((source_id, target_id));
                self.next_connection_innovation += 1;
                id
            }
        }
    }

    /// Returns the next node and gene innovation numbers,
    /// or the previously assigned numbers for the same split
    /// mutation, in the format `(incoming gene, new node,
    /// outgoing gene)`.
    ///
    /// If `duplicate` is `true` and the split is already
    /// registered, the returned innovation numbers will be
    /// computed as if it were a new mutation. This is used in
    /// situations in which the mutating genome already carries
    /// the recorded split (e.g. inherited through mating and
    /// re-enabled), which would otherwise result in duplicate
    /// genes and nodes within the same genome. This can be
    /// detected if the numbers returned by this function without
    /// setting `duplicate` refer to a node already present in
    /// the genome.
    pub fn next_split_innovation(
        &self,
        split_gene: Innovation,
        duplicate: bool,
    ) -> (Innovation, Innovation, Innovation) {
        if !self.split_innovations.contains_key(&split_gene) || duplicate {
            (
                self.next_connection_innovation,
                self.next_node_id,
                self.next_connection_innovation + 1,
            )
        } else {
            self.split_innovations[&split_gene]
        }
    }

    /// Records a split mutation and returns the assigned
    /// `(incoming gene, new node, outgoing gene)` innovation
    /// numbers, or the previously assigned numbers for the same
    /// split mutation.
    ///
    /// If `duplicate` is `true` and the split is already
    /// registered, fresh numbers are minted and replace the
    /// previously recorded ones.
    pub(crate) fn add_split_innovation(
        &mut self,
        split_gene: Innovation,
        duplicate: bool,
    ) -> (Innovation, Innovation, Innovation) {
        if !self.split_innovations.contains_key(&split_gene) || duplicate {
            let (source_node, target_node) = self.connection_endpoints[split_gene];
            let new_node = self.next_node_id;

            let incoming_gene = self.add_connection_innovation(source_node, new_node);
            let outgoing_gene = self.add_connection_innovation(new_node, target_node);
            let record = (incoming_gene, new_node, outgoing_gene);

            self.split_innovations.insert(split_gene, record);
            self.next_node_id += 1;
            record
        } else {
            self.split_innovations[&split_gene]
        }
    }

    /// Returns the endpoints of the gene with the given
    /// innovation number, as recorded when it was assigned.
    pub fn connection_endpoints(&self, gene: Innovation) -> Option<(Innovation, Innovation)> {
        self.connection_endpoints.get(gene).copied()
    }

    /// Forgets the recorded mutations of the current generation,
    /// but keeps the innovation counters. Identical structural
    /// mutations in later generations will receive fresh numbers.
    pub fn clear(&mut self) {
        self.connection_innovations.clear();
        self.split_innovations.clear();
    }

    /// Returns the highest connection innovation number generated.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::zero());
    ///
    /// assert_eq!(history.max_connection_innovation(), 0);
    /// ```
    pub fn max_connection_innovation(&self) -> Innovation {
        self.next_connection_innovation - 1
    }

    /// Returns the highest node id generated.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::zero());
    ///
    /// assert_eq!(history.max_node_id(), 1);
    /// ```
    pub fn max_node_id(&self) -> Innovation {
        self.next_node_id - 1
    }

    /// Returns an iterator over the current generation's record of
    /// connection innovations, in the format
    /// `((source node, target node), gene innovation)`.
    /// No ordering is guaranteed.
    pub fn connection_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connection_innovations.iter()
    }

    /// Returns an iterator over the current generation's record of
    /// split innovations, in the format
    /// `(split gene, (incoming gene, new node, outgoing gene))`.
    /// No ordering is guaranteed.
    pub fn split_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&Innovation, &(Innovation, Innovation, Innovation))> {
        self.split_innovations.iter()
    }
}
