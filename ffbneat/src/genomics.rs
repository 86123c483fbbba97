//! Genomes are the focus of evolution in NEAT.
//! They are a collection of genes and nodes that can be instantiated
//! as a phenotype (a feed-forward gate circuit). Genomes can be
//! progressively mutated, thus adding complexity and functionality.
//!
//! Every node carries a topological rank, and genes only ever run
//! from a lower rank to a strictly higher one, so the enabled gene
//! graph of a valid genome is acyclic by construction. Hidden and
//! output nodes compute a [`GateKind`] of fixed arity, and the number
//! of enabled genes wired into a node never exceeds that arity.
//!
//! [`GateKind`]: crate::gates::GateKind

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use errors::{
    ConnectionMutationError, GeneValidityError, MatingError, NodeMutationError, NodeValidityError,
};
pub use genes::Gene;
pub use history::History;
pub use nodes::{Node, NodeRole};

use crate::gates::GateKind;
use crate::Innovation;

use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A mutable collection of genes and nodes.
///
/// Supports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    genes: HashMap<Innovation, Gene>,
    nodes: HashMap<Innovation, Node>,
    node_pairings: HashSet<(Innovation, Innovation)>,
    input_count: usize,
    output_count: usize,
    pub(crate) fitness: f32,
}

impl Genome {
    /// Create a new genome with the specified configuration.
    ///
    /// Input nodes take ids `0..input_count` at rank 0.0, output
    /// nodes take ids `input_count..input_count + output_count` at
    /// rank 1.0. For each output, with probability
    /// `config.initial_expression_chance`, a single enabled gene is
    /// wired from a uniformly chosen input. Such genes are given the
    /// innovation number `o + i ⨯ output_count`, where `i` is the id
    /// of their source and `o` the index of their target, so
    /// independently seeded genomes agree on initial innovations.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::gates::GateKind;
    /// use ffbneat::genomics::{GeneticConfig, Genome, NodeRole};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config, &mut rand::thread_rng());
    ///
    /// // As configured, the genome has 3 inputs + 2 outputs.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.role() == NodeRole::Input).count(), 3);
    /// assert_eq!(genome.nodes().filter(|n| n.role() == NodeRole::Output).count(), 2);
    ///
    /// // With an initial_expression_chance of 1, every output is wired once.
    /// assert_eq!(genome.genes().count(), 2);
    ///
    /// // Unconfigured output gates default to buffers.
    /// assert!(genome
    ///     .nodes()
    ///     .filter(|n| n.role() == NodeRole::Output)
    ///     .all(|n| n.gate() == Some(GateKind::Buffer)));
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut impl Rng) -> Genome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let mut genome = Genome {
            genes: HashMap::new(),
            nodes: HashMap::with_capacity(input_count + output_count),
            node_pairings: HashSet::new(),
            input_count,
            output_count,
            fitness: 0.0,
        };

        for i in 0..input_count {
            genome
                .nodes
                .insert(i, Node::new(i, NodeRole::Input, None, 0.0));
        }
        for o in 0..output_count {
            let gate = config
                .output_gate_kinds
                .get(o)
                .copied()
                .unwrap_or(GateKind::Buffer);
            genome.nodes.insert(
                o + input_count,
                Node::new(o + input_count, NodeRole::Output, Some(gate), 1.0),
            );
        }

        if config.initial_expression_chance > 0.0 {
            for o in 0..output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let i = rng.gen_range(0..input_count);
                    genome.add_gene_unchecked(o + i * output_count, i, o + input_count, true);
                }
            }
        }

        genome
    }

    /// Add a new gene to the genome.
    /// Returns a reference to the new gene.
    ///
    /// # Errors
    ///
    /// Returns an error if the gene is a duplicate (by id or by
    /// endpoints), if either endpoint does not exist, if the target
    /// is an input node, if the gene would not run from a strictly
    /// lower to a strictly higher rank, or if the gene is enabled
    /// and the target gate is already wired to its full arity.
    pub(crate) fn add_gene(
        &mut self,
        gene_id: Innovation,
        source_id: Innovation,
        target_id: Innovation,
        enabled: bool,
    ) -> Result<&Gene, GeneValidityError> {
        self.check_gene_viability(gene_id, source_id, target_id, enabled)?;
        Ok(self.add_gene_unchecked(gene_id, source_id, target_id, enabled))
    }

    /// Add a new gene to the genome.
    /// Assumes that the gene is not a duplicate
    /// or invalid gene for the genome.
    fn add_gene_unchecked(
        &mut self,
        gene_id: Innovation,
        source_id: Innovation,
        target_id: Innovation,
        enabled: bool,
    ) -> &Gene {
        self.nodes
            .get_mut(&source_id)
            .unwrap()
            .add_output_gene(gene_id);
        self.nodes
            .get_mut(&target_id)
            .unwrap()
            .add_input_gene(gene_id);
        self.node_pairings.insert((source_id, target_id));
        self.genes
            .entry(gene_id)
            .or_insert_with(|| Gene::new(gene_id, source_id, target_id, enabled))
    }

    /// Checks whether a gene is a duplicate or
    /// is invalid for the genome.
    fn check_gene_viability(
        &self,
        gene_id: Innovation,
        source_id: Innovation,
        target_id: Innovation,
        enabled: bool,
    ) -> Result<(), GeneValidityError> {
        use GeneValidityError::*;
        if self.genes.contains_key(&gene_id) {
            Err(DuplicateGeneId(gene_id))
        } else if !(self.nodes.contains_key(&source_id) && self.nodes.contains_key(&target_id)) {
            Err(NonexistentEndpoints(source_id, target_id))
        } else if self.node_pairings.contains(&(source_id, target_id)) {
            Err(DuplicateGeneWithEndpoints(gene_id, (source_id, target_id)))
        } else if self.nodes[&target_id].role() == NodeRole::Input {
            Err(InputEndpoint(target_id))
        } else if self.nodes[&source_id].rank() >= self.nodes[&target_id].rank() {
            Err(RankInversion(source_id, target_id))
        } else if enabled && !self.has_spare_arity(target_id) {
            let arity = self.nodes[&target_id].gate().map(GateKind::arity).unwrap_or(0);
            Err(TargetAtCapacity(target_id, arity))
        } else {
            Ok(())
        }
    }

    /// Add a new hidden node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Errors
    ///
    /// Returns an error if a node of the same id
    /// already exists in the genome.
    pub(crate) fn add_node(
        &mut self,
        node_id: Innovation,
        gate: GateKind,
        rank: f64,
    ) -> Result<&Node, NodeValidityError> {
        if self.nodes.contains_key(&node_id) {
            return Err(NodeValidityError::DuplicateNodeId(node_id));
        }
        Ok(self.add_node_unchecked(node_id, gate, rank))
    }

    /// Add a new hidden node to the genome.
    /// Assumes the node is not a duplicate.
    fn add_node_unchecked(&mut self, node_id: Innovation, gate: GateKind, rank: f64) -> &Node {
        self.nodes
            .entry(node_id)
            .or_insert_with(|| Node::new(node_id, NodeRole::Hidden, Some(gate), rank))
    }

    /// Returns the number of enabled genes wired into the node.
    pub fn enabled_in_degree(&self, node_id: Innovation) -> usize {
        self.nodes[&node_id]
            .input_genes()
            .filter(|id| self.genes[*id].enabled())
            .count()
    }

    fn has_spare_arity(&self, node_id: Innovation) -> bool {
        match self.nodes[&node_id].gate() {
            Some(gate) => self.enabled_in_degree(node_id) < gate.arity(),
            None => false,
        }
    }

    /// Induces a _connection mutation_ in the genome.
    /// If successful, returns the newly added gene.
    ///
    /// The new gene runs from a non-output node to a strictly
    /// higher-ranked hidden or output node whose gate still has
    /// arity headroom, and between which no gene already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if every gate is wired to its full arity,
    /// or if no viable pair was sampled within
    /// [`max_connection_mutation_attempts`]. Callers treat either
    /// case as a no-op.
    ///
    /// [`max_connection_mutation_attempts`]: GeneticConfig::max_connection_mutation_attempts
    pub fn mutate_add_connection(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<&Gene, ConnectionMutationError> {
        let sources: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| n.role() != NodeRole::Output)
            .map(Node::id)
            .collect();
        let targets: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| self.has_spare_arity(n.id()))
            .map(Node::id)
            .collect();

        if targets.is_empty() {
            return Err(ConnectionMutationError::AllTargetsAtCapacity);
        }

        for _ in 0..config.max_connection_mutation_attempts {
            let source = *sources.choose(rng).unwrap();
            let target = *targets.choose(rng).unwrap();
            if self.nodes[&source].rank() >= self.nodes[&target].rank()
                || self.node_pairings.contains(&(source, target))
            {
                continue;
            }
            let gene_id = history.add_connection_innovation(source, target);
            self.add_gene_unchecked(gene_id, source, target, true);
            return Ok(&self.genes[&gene_id]);
        }
        Err(ConnectionMutationError::NoViablePairFound)
    }

    /// Induces a _node mutation_ in the genome.
    /// If successful, returns the innovation numbers of the
    /// triplet (_incoming gene_, _new node_, _outgoing gene_).
    ///
    /// A random enabled gene A→B is disabled and replaced by a new
    /// hidden node N, ranked midway between A and B, with the genes
    /// A→N and N→B. The split is registered under a single descriptor
    /// in the [`History`], so every genome splitting the same gene in
    /// one generation receives the same numbers. If the gate drawn
    /// for N is binary, its second input is wired from a random
    /// strictly lower-ranked node when one is available; otherwise
    /// that input floats to the evaluation default.
    ///
    /// # Errors
    ///
    /// Returns an error if the genome has no enabled genes.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::gates::GateKind;
    /// use ffbneat::genomics::{GeneticConfig, Genome, History};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     gate_kinds: vec![GateKind::Not],
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut history = History::new(&config);
    ///
    /// // One input, one output, one gene between them.
    /// let mut genome = Genome::new(&config, &mut rng);
    ///
    /// let (incoming, node, outgoing) =
    ///     genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(genome.nodes().count(), 1 + 1 + 1);
    /// assert_eq!(genome.genes().count(), 1 + 2);
    ///
    /// // The split gene is suppressed, its replacements are enabled.
    /// assert!(genome.genes().filter(|g| g.innovation() == 0).all(|g| !g.enabled()));
    /// assert!(genome
    ///     .genes()
    ///     .filter(|g| [incoming, outgoing].contains(&g.innovation()))
    ///     .all(|g| g.enabled()));
    /// # assert_eq!(genome.nodes().find(|n| n.id() == node).unwrap().gate(), Some(GateKind::Not));
    /// ```
    pub fn mutate_add_node(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<(Innovation, Innovation, Innovation), NodeMutationError> {
        let split_gene = self
            .genes
            .values()
            .filter(|g| g.enabled())
            .map(Gene::innovation)
            .choose(rng)
            .ok_or(NodeMutationError::NoEnabledGenes)?;

        let (_, tentative_node, _) = history.next_split_innovation(split_gene, false);
        let duplicate = self.nodes.contains_key(&tentative_node);
        let (incoming_gene, new_node, outgoing_gene) =
            history.add_split_innovation(split_gene, duplicate);
        debug_assert!(!self.nodes.contains_key(&new_node));

        let (source, target) = self.genes[&split_gene].endpoints();
        let rank = (self.nodes[&source].rank() + self.nodes[&target].rank()) / 2.0;
        let gate = config
            .gate_kinds
            .choose(rng)
            .copied()
            .unwrap_or(GateKind::Buffer);

        self.genes.get_mut(&split_gene).unwrap().set_enabled(false);
        self.add_node_unchecked(new_node, gate, rank);
        self.add_gene_unchecked(incoming_gene, source, new_node, true);
        self.add_gene_unchecked(outgoing_gene, new_node, target, true);

        if gate.arity() > 1 {
            let spare_source = self
                .nodes
                .values()
                .filter(|n| {
                    n.rank() < rank
                        && n.id() != source
                        && !self.node_pairings.contains(&(n.id(), new_node))
                })
                .map(Node::id)
                .choose(rng);
            if let Some(spare_source) = spare_source {
                let gene_id = history.add_connection_innovation(spare_source, new_node);
                self.add_gene_unchecked(gene_id, spare_source, new_node, true);
            }
        }

        Ok((incoming_gene, new_node, outgoing_gene))
    }

    /// Induces a _gate mutation_ in the genome: one hidden or
    /// output node is reassigned a different gate kind from the
    /// configured pool whose arity can accommodate the node's
    /// current enabled in-degree.
    ///
    /// Returns `None`, leaving the genome unchanged, if no node
    /// has a compatible alternative kind.
    pub fn mutate_gate_kind(
        &mut self,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Option<(Innovation, GateKind)> {
        let candidates: Vec<(Innovation, Vec<GateKind>)> = self
            .nodes
            .values()
            .filter_map(|n| {
                let current = n.gate()?;
                let pool = match n.role() {
                    NodeRole::Output => &config.output_gate_kinds,
                    _ => &config.gate_kinds,
                };
                let wired = self.enabled_in_degree(n.id());
                let alternatives: Vec<GateKind> = pool
                    .iter()
                    .copied()
                    .filter(|kind| *kind != current && kind.arity() >= wired)
                    .collect();
                if alternatives.is_empty() {
                    None
                } else {
                    Some((n.id(), alternatives))
                }
            })
            .collect();

        let (node_id, alternatives) = candidates.choose(rng)?;
        let kind = *alternatives.choose(rng).unwrap();
        self.nodes.get_mut(node_id).unwrap().set_gate(kind);
        Some((*node_id, kind))
    }

    /// Induces an _enable toggle mutation_ in the genome: one
    /// random gene has its enabled flag flipped. Disabling is
    /// always legal; enabling is rejected (`None`, genome
    /// unchanged) if the target gate is already wired to its
    /// full arity.
    pub fn mutate_toggle_enable(&mut self, rng: &mut impl Rng) -> Option<(Innovation, bool)> {
        let gene_id = self.genes.keys().copied().choose(rng)?;
        let (enabled, target) = {
            let gene = &self.genes[&gene_id];
            (gene.enabled(), gene.target())
        };
        if enabled {
            self.genes.get_mut(&gene_id).unwrap().set_enabled(false);
            Some((gene_id, false))
        } else if self.has_spare_arity(target) {
            self.genes.get_mut(&gene_id).unwrap().set_enabled(true);
            Some((gene_id, true))
        } else {
            None
        }
    }

    /// Performs all mutations on self, each with its
    /// configured chance. Several may fire in one pass.
    pub fn mutate_all(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        if rng.gen::<f32>() < config.node_addition_mutation_chance {
            let _ = self.mutate_add_node(history, config, rng);
        }
        if rng.gen::<f32>() < config.connection_addition_mutation_chance {
            let _ = self.mutate_add_connection(history, config, rng);
        }
        if rng.gen::<f32>() < config.gate_mutation_chance {
            let _ = self.mutate_gate_kind(config, rng);
        }
        if rng.gen::<f32>() < config.enable_toggle_mutation_chance {
            let _ = self.mutate_toggle_enable(rng);
        }
    }

    /// Combines two parent genomes and returns their _child_ genome.
    ///
    /// The child inherits the fitter parent's full structure
    /// (ties favor `parent1`): matching genes take their enabled
    /// flag from either parent at random, while disjoint and excess
    /// genes of the fitter parent are kept as-is and those of the
    /// weaker parent are dropped. A gene disabled in either parent
    /// is inherited disabled with probability
    /// [`disabled_gene_inheritance_chance`]. Genes whose enabled
    /// inheritance would overfill a gate's arity are inherited
    /// disabled instead, oldest innovations keeping their wires.
    ///
    /// [`disabled_gene_inheritance_chance`]: GeneticConfig::disabled_gene_inheritance_chance
    ///
    /// # Errors
    ///
    /// Returns an error if a matching innovation number maps to
    /// different endpoints in the two parents. This cannot happen
    /// unless the shared [`History`] was corrupted; callers recover
    /// by cloning the fitter parent.
    pub fn mate(
        parent1: &Genome,
        parent2: &Genome,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<Genome, MatingError> {
        let (fitter, weaker) = if parent2.fitness > parent1.fitness {
            (parent2, parent1)
        } else {
            (parent1, parent2)
        };

        let mut child = fitter.clone();
        child.fitness = 0.0;

        for (id, own) in child.genes.iter_mut() {
            let theirs = match weaker.genes.get(id) {
                Some(theirs) => theirs,
                None => continue,
            };
            if theirs.endpoints() != own.endpoints() {
                return Err(MatingError::InconsistentAlignment(*id));
            }
            let mut enabled = if rng.gen::<bool>() {
                own.enabled()
            } else {
                theirs.enabled()
            };
            if (!own.enabled() || !theirs.enabled())
                && rng.gen::<f32>() < config.disabled_gene_inheritance_chance
            {
                enabled = false;
            }
            own.set_enabled(enabled);
        }

        child.enforce_arity_limits();
        Ok(child)
    }

    /// Disables enabled genes, highest innovations first, at any
    /// node wired beyond its gate's arity.
    fn enforce_arity_limits(&mut self) {
        let mut to_disable = Vec::new();
        for node in self.nodes.values() {
            let gate = match node.gate() {
                Some(gate) => gate,
                None => continue,
            };
            let mut enabled: Vec<Innovation> = node
                .input_genes()
                .copied()
                .filter(|id| self.genes[id].enabled())
                .collect();
            if enabled.len() > gate.arity() {
                enabled.sort_unstable();
                to_disable.extend(enabled.split_off(gate.arity()));
            }
        }
        for id in to_disable {
            self.genes.get_mut(&id).unwrap().set_enabled(false);
        }
    }

    /// Calculates the _genetic distance_ between `first` and `second`,
    /// weighting disjoint genes, excess genes and gate mismatches as
    /// specified in `config`.
    ///
    /// Disjoint and excess counts are normalized by the larger
    /// genome's gene count; the gate term is the fraction of matching
    /// genes whose target nodes compute different gate kinds in the
    /// two genomes. The distance is symmetric, and zero between a
    /// genome and itself.
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        let ids_first: HashSet<Innovation> = first.genes.keys().copied().collect();
        let ids_second: HashSet<Innovation> = second.genes.keys().copied().collect();
        let matching: Vec<Innovation> = ids_first.intersection(&ids_second).copied().collect();

        let larger = first.genes.len().max(second.genes.len()).max(1) as f32;

        let (mut disjoint, mut excess) = (0usize, 0usize);
        match (ids_first.iter().max(), ids_second.iter().max()) {
            (Some(&max_first), Some(&max_second)) => {
                let boundary = max_first.min(max_second);
                for id in ids_first.symmetric_difference(&ids_second) {
                    if *id <= boundary {
                        disjoint += 1;
                    } else {
                        excess += 1;
                    }
                }
            }
            _ => excess = ids_first.len() + ids_second.len(),
        }

        let gate_mismatches = matching
            .iter()
            .filter(|id| {
                let target_first = first.genes[*id].target();
                let target_second = second.genes[*id].target();
                first.nodes.get(&target_first).and_then(Node::gate)
                    != second.nodes.get(&target_second).and_then(Node::gate)
            })
            .count();
        let gate_term = if matching.is_empty() {
            0.0
        } else {
            gate_mismatches as f32 / matching.len() as f32
        };

        config.disjoint_gene_factor * disjoint as f32 / larger
            + config.excess_gene_factor * excess as f32 / larger
            + config.gate_difference_factor * gate_term
    }

    /// Returns an iterator over the set of the genome's genes.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    /// Returns an iterator over the set of the genome's nodes.
    ///
    /// # Notes
    /// No ordering is guaranteed.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the number of input nodes in the genome.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output nodes in the genome.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Sets the genome's fitness to the value passed.
    /// Fitness should be a positive quantity.
    pub fn set_fitness(&mut self, fitness: f32) {
        assert!(fitness >= 0.0, "fitness function returned a negative value");
        self.fitness = fitness;
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut genes: Vec<&Gene> = self.genes.values().collect();
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        genes.sort_unstable_by_key(|g| g.innovation());
        nodes.sort_unstable_by_key(|n| n.id());
        f.debug_struct("Genome")
            .field("Genes", &genes)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    /// Two inputs, one And output, one Or hidden node, no genes.
    fn scaffold() -> Genome {
        let mut cfg = config(2, 1);
        cfg.output_gate_kinds = vec![GateKind::And];
        let mut genome = Genome::new(&cfg, &mut test_rng());
        genome.add_node(3, GateKind::Or, 0.5).unwrap();
        genome
    }

    #[test]
    fn new_seeds_each_output_once() {
        let mut cfg = config(4, 3);
        cfg.initial_expression_chance = 1.0;
        for seed in 0..20 {
            let genome = Genome::new(&cfg, &mut ChaCha8Rng::seed_from_u64(seed));
            assert_eq!(genome.genes().count(), 3);
            for gene in genome.genes() {
                assert!(gene.enabled());
                let i = gene.source();
                let o = gene.target() - 4;
                assert_eq!(gene.innovation(), o + i * 3);
                assert_eq!(genome.enabled_in_degree(gene.target()), 1);
            }
        }
    }

    #[test]
    fn new_unconnected() {
        let genome = Genome::new(&config(2, 2), &mut test_rng());
        assert_eq!(genome.genes().count(), 0);
        assert_eq!(genome.nodes().count(), 4);
    }

    #[test]
    fn add_gene_rejects_invalid_structure() {
        let mut genome = scaffold();
        genome.add_gene(10, 0, 3, true).unwrap();

        assert_eq!(
            genome.add_gene(10, 1, 3, true),
            Err(GeneValidityError::DuplicateGeneId(10))
        );
        assert_eq!(
            genome.add_gene(11, 0, 3, true),
            Err(GeneValidityError::DuplicateGeneWithEndpoints(11, (0, 3)))
        );
        assert_eq!(
            genome.add_gene(11, 0, 99, true),
            Err(GeneValidityError::NonexistentEndpoints(0, 99))
        );
        assert_eq!(
            genome.add_gene(11, 3, 1, true),
            Err(GeneValidityError::InputEndpoint(1))
        );
        // Output (rank 1.0) to hidden (rank 0.5) inverts the order.
        assert_eq!(
            genome.add_gene(11, 2, 3, true),
            Err(GeneValidityError::RankInversion(2, 3))
        );
    }

    #[test]
    fn add_gene_respects_gate_arity() {
        let mut genome = scaffold();
        // The Or gate takes two inputs.
        genome.add_gene(10, 0, 3, true).unwrap();
        genome.add_gene(11, 1, 3, true).unwrap();
        genome.add_node(4, GateKind::Not, 0.25).unwrap();
        assert_eq!(
            genome.add_gene(12, 4, 3, true),
            Err(GeneValidityError::TargetAtCapacity(3, 2))
        );
        // A disabled gene may still be added past capacity.
        genome.add_gene(12, 4, 3, false).unwrap();
        assert_eq!(genome.enabled_in_degree(3), 2);
    }

    #[test]
    fn connection_mutation_preserves_invariants() {
        let mut cfg = config(3, 2);
        cfg.initial_expression_chance = 1.0;
        cfg.max_connection_mutation_attempts = 20;
        cfg.output_gate_kinds = vec![GateKind::And, GateKind::Or];
        let mut history = History::new(&cfg);
        let mut rng = test_rng();

        let mut genome = Genome::new(&cfg, &mut rng);
        for _ in 0..10 {
            let _ = genome.mutate_add_connection(&mut history, &cfg, &mut rng);
        }
        for gene in genome.genes() {
            let source = genome.nodes().find(|n| n.id() == gene.source()).unwrap();
            let target = genome.nodes().find(|n| n.id() == gene.target()).unwrap();
            assert!(source.rank() < target.rank());
        }
        for node in genome.nodes() {
            if let Some(gate) = node.gate() {
                assert!(genome.enabled_in_degree(node.id()) <= gate.arity());
            }
        }
    }

    #[test]
    fn connection_mutation_fails_when_gates_are_full() {
        let mut cfg = config(1, 1);
        cfg.initial_expression_chance = 1.0;
        cfg.max_connection_mutation_attempts = 20;
        let mut history = History::new(&cfg);
        let mut rng = test_rng();

        // The single buffer output is already wired.
        let mut genome = Genome::new(&cfg, &mut rng);
        assert_eq!(
            genome.mutate_add_connection(&mut history, &cfg, &mut rng),
            Err(ConnectionMutationError::AllTargetsAtCapacity)
        );
    }

    #[test]
    fn identical_connection_mutations_align_across_genomes() {
        let mut cfg = config(2, 1);
        cfg.initial_expression_chance = 0.0;
        cfg.max_connection_mutation_attempts = 50;
        cfg.output_gate_kinds = vec![GateKind::And];
        let mut history = History::new(&cfg);

        let mut first = Genome::new(&cfg, &mut test_rng());
        let mut second = Genome::new(&cfg, &mut test_rng());
        // Exhaust both genomes' possible connections; descriptors must agree.
        for genome in [&mut first, &mut second] {
            let mut rng = test_rng();
            while genome
                .mutate_add_connection(&mut history, &cfg, &mut rng)
                .is_ok()
            {}
        }
        for gene in first.genes() {
            let twin = second
                .genes()
                .find(|g| g.innovation() == gene.innovation());
            if let Some(twin) = twin {
                assert_eq!(twin.endpoints(), gene.endpoints());
            }
        }
    }

    #[test]
    fn node_mutation_splits_a_gene() {
        let mut cfg = config(1, 1);
        cfg.initial_expression_chance = 1.0;
        cfg.gate_kinds = vec![GateKind::Not];
        let mut history = History::new(&cfg);
        let mut rng = test_rng();

        let mut genome = Genome::new(&cfg, &mut rng);
        let (incoming, node, outgoing) =
            genome.mutate_add_node(&mut history, &cfg, &mut rng).unwrap();

        assert_eq!(genome.nodes().count(), 3);
        assert_eq!(genome.genes().count(), 3);
        let new_node = genome.nodes().find(|n| n.id() == node).unwrap();
        assert_eq!(new_node.role(), NodeRole::Hidden);
        assert_eq!(new_node.rank(), 0.5);
        assert!(!genome.genes().find(|g| g.innovation() == 0).unwrap().enabled());
        assert_eq!(
            genome.genes().find(|g| g.innovation() == incoming).unwrap().endpoints(),
            (0, node)
        );
        assert_eq!(
            genome.genes().find(|g| g.innovation() == outgoing).unwrap().endpoints(),
            (node, 1)
        );
    }

    #[test]
    fn node_mutation_wires_second_input_of_binary_gates() {
        let mut cfg = config(2, 1);
        cfg.initial_expression_chance = 1.0;
        cfg.gate_kinds = vec![GateKind::Xor];
        let mut history = History::new(&cfg);
        let mut rng = test_rng();

        let mut genome = Genome::new(&cfg, &mut rng);
        let (_, node, _) = genome.mutate_add_node(&mut history, &cfg, &mut rng).unwrap();

        // The spare input can only come from the unused input node.
        assert_eq!(genome.enabled_in_degree(node), 2);
        for gene in genome.genes().filter(|g| g.target() == node) {
            assert!(genome.nodes().find(|n| n.id() == gene.source()).unwrap().rank() < 0.5);
        }
    }

    #[test]
    fn identical_splits_align_across_genomes() {
        let mut cfg = config(1, 1);
        cfg.initial_expression_chance = 1.0;
        cfg.gate_kinds = vec![GateKind::Not];
        let mut history = History::new(&cfg);

        let mut first = Genome::new(&cfg, &mut ChaCha8Rng::seed_from_u64(1));
        let mut second = Genome::new(&cfg, &mut ChaCha8Rng::seed_from_u64(2));

        let a = first
            .mutate_add_node(&mut history, &cfg, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();
        let b = second
            .mutate_add_node(&mut history, &cfg, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn inherited_splits_mint_fresh_numbers() {
        let mut cfg = config(1, 1);
        cfg.initial_expression_chance = 1.0;
        cfg.gate_kinds = vec![GateKind::Buffer];
        let mut history = History::new(&cfg);
        let mut rng = test_rng();

        let mut genome = Genome::new(&cfg, &mut rng);
        let first = genome.mutate_add_node(&mut history, &cfg, &mut rng).unwrap();

        // A genome that already carries the recorded split re-splits
        // the same gene after re-enabling it. Disable the recorded
        // replacements first so the original gene is the only
        // enabled one.
        genome.genes.get_mut(&first.0).unwrap().set_enabled(false);
        genome.genes.get_mut(&first.2).unwrap().set_enabled(false);
        genome.genes.get_mut(&0).unwrap().set_enabled(true);
        let second = genome.mutate_add_node(&mut history, &cfg, &mut rng).unwrap();

        assert_ne!(first.1, second.1);
        assert_ne!(first.0, second.0);
    }

    #[test]
    fn gate_mutation_respects_wired_arity() {
        let mut cfg = config(2, 1);
        cfg.gate_kinds = vec![GateKind::Buffer, GateKind::Not, GateKind::And, GateKind::Xor];
        let mut genome = scaffold();
        genome.add_gene(10, 0, 3, true).unwrap();
        genome.add_gene(11, 1, 3, true).unwrap();

        let mut rng = test_rng();
        for _ in 0..50 {
            if let Some((node, kind)) = genome.mutate_gate_kind(&cfg, &mut rng) {
                assert!(kind.arity() >= genome.enabled_in_degree(node));
            }
        }
    }

    #[test]
    fn toggle_enable_rejects_overfilling() {
        let mut genome = scaffold();
        // Fill the And output's two slots, then add a disabled spare.
        genome.add_gene(10, 0, 3, true).unwrap();
        genome.add_gene(11, 1, 3, true).unwrap();
        genome.add_gene(12, 3, 2, true).unwrap();
        genome.add_node(4, GateKind::Not, 0.25).unwrap();
        genome.add_gene(13, 4, 3, false).unwrap();

        let mut rng = test_rng();
        for _ in 0..100 {
            let _ = genome.mutate_toggle_enable(&mut rng);
            for node in genome.nodes() {
                if let Some(gate) = node.gate() {
                    assert!(genome.enabled_in_degree(node.id()) <= gate.arity());
                }
            }
        }
    }

    #[test]
    fn mate_keeps_fitter_parent_excess() {
        let mut rng = test_rng();
        let cfg = config(2, 1);

        let mut first = scaffold();
        first.add_gene(1, 0, 3, true).unwrap();
        first.add_gene(2, 1, 3, true).unwrap();
        first.add_gene(3, 3, 2, true).unwrap();

        let mut second = scaffold();
        second.add_gene(1, 0, 3, true).unwrap();
        second.add_gene(2, 1, 3, true).unwrap();
        second.add_gene(4, 3, 2, true).unwrap();

        first.set_fitness(10.0);
        second.set_fitness(5.0);

        for _ in 0..20 {
            let child = Genome::mate(&first, &second, &cfg, &mut rng).unwrap();
            let ids: Vec<Innovation> = child.genes().map(Gene::innovation).collect();
            assert!(ids.contains(&3));
            assert!(!ids.contains(&4));
        }

        // With the fitness order reversed, gene 4 wins instead.
        first.set_fitness(1.0);
        for _ in 0..20 {
            let child = Genome::mate(&first, &second, &cfg, &mut rng).unwrap();
            let ids: Vec<Innovation> = child.genes().map(Gene::innovation).collect();
            assert!(ids.contains(&4));
            assert!(!ids.contains(&3));
        }
    }

    #[test]
    fn mate_detects_misaligned_innovations() {
        let mut rng = test_rng();
        let cfg = config(2, 1);

        let mut first = scaffold();
        first.add_gene(5, 0, 3, true).unwrap();
        let mut second = scaffold();
        second.add_gene(5, 1, 3, true).unwrap();
        first.set_fitness(2.0);
        second.set_fitness(1.0);

        assert_eq!(
            Genome::mate(&first, &second, &cfg, &mut rng),
            Err(MatingError::InconsistentAlignment(5))
        );
    }

    #[test]
    fn mate_repairs_overfilled_gates() {
        let mut rng = test_rng();
        let cfg = config(2, 1);

        // The output buffer admits a single enabled gene; the parents
        // disagree about which one is expressed.
        let mut first = Genome::new(&cfg, &mut test_rng());
        first.add_gene(0, 0, 2, true).unwrap();
        first.add_gene(1, 1, 2, false).unwrap();
        let mut second = Genome::new(&cfg, &mut test_rng());
        second.add_gene(0, 0, 2, false).unwrap();
        second.add_gene(1, 1, 2, true).unwrap();
        first.set_fitness(3.0);
        second.set_fitness(2.0);

        for _ in 0..100 {
            let child = Genome::mate(&first, &second, &cfg, &mut rng).unwrap();
            assert!(child.enabled_in_degree(2) <= 1);
        }
    }

    #[test]
    fn mate_inherits_disabled_genes() {
        let mut rng = test_rng();
        let mut cfg = config(2, 1);
        cfg.disabled_gene_inheritance_chance = 1.0;

        let mut first = Genome::new(&cfg, &mut test_rng());
        first.add_gene(0, 0, 2, true).unwrap();
        let mut second = Genome::new(&cfg, &mut test_rng());
        second.add_gene(0, 0, 2, false).unwrap();
        first.set_fitness(3.0);
        second.set_fitness(2.0);

        for _ in 0..20 {
            let child = Genome::mate(&first, &second, &cfg, &mut rng).unwrap();
            assert!(!child.genes().next().unwrap().enabled());
        }
    }

    #[test]
    fn genetic_distance_is_symmetric_and_zero_on_self() {
        let mut cfg = config(2, 1);
        cfg.disjoint_gene_factor = 1.0;
        cfg.excess_gene_factor = 1.0;
        cfg.gate_difference_factor = 0.4;

        let mut first = scaffold();
        first.add_gene(1, 0, 3, true).unwrap();
        first.add_gene(3, 3, 2, true).unwrap();
        let mut second = scaffold();
        second.add_gene(1, 0, 3, true).unwrap();
        second.add_gene(2, 1, 3, true).unwrap();
        second.add_gene(4, 3, 2, true).unwrap();

        assert_eq!(Genome::genetic_distance(&first, &first, &cfg), 0.0);
        assert_eq!(Genome::genetic_distance(&second, &second, &cfg), 0.0);
        assert_eq!(
            Genome::genetic_distance(&first, &second, &cfg),
            Genome::genetic_distance(&second, &first, &cfg)
        );
        // Genes 2 and 3 are disjoint, 4 is excess, over 3 genes.
        assert!(
            (Genome::genetic_distance(&first, &second, &cfg) - (2.0 / 3.0 + 1.0 / 3.0)).abs()
                < f32::EPSILON
        );
    }

    #[test]
    fn genetic_distance_counts_gate_mismatches() {
        let mut cfg = config(2, 1);
        cfg.gate_difference_factor = 1.0;

        let mut first = scaffold();
        first.add_gene(1, 0, 3, true).unwrap();
        let mut second = scaffold();
        second.add_gene(1, 0, 3, true).unwrap();
        second
            .nodes
            .get_mut(&3)
            .unwrap()
            .set_gate(GateKind::Nand);

        // One matching gene, its target gates differ.
        assert_eq!(Genome::genetic_distance(&first, &second, &cfg), 1.0);
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let mut cfg = config(2, 2);
        cfg.initial_expression_chance = 1.0;
        let mut history = History::new(&cfg);
        let mut rng = test_rng();
        let mut genome = Genome::new(&cfg, &mut rng);
        cfg.gate_kinds = vec![GateKind::Nand];
        let _ = genome.mutate_add_node(&mut history, &cfg, &mut rng);

        let serialized = serde_json::to_string(&genome).unwrap();
        let deserialized: Genome = serde_json::from_str(&serialized).unwrap();
        assert_eq!(genome, deserialized);
    }
}
