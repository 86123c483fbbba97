use crate::gates::GateKind;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// A NodeRole indicates the function of
/// the node's circuit equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Input nodes. Carry no gate; their value is
    /// supplied externally at evaluation time.
    Input,
    /// Hidden gate nodes.
    Hidden,
    /// Output gate nodes.
    Output,
}

/// Nodes are the structural elements of genomes
/// between which genes are created.
///
/// Each node carries a floating-point rank: inputs sit at 0.0,
/// outputs at 1.0, and a hidden node created by splitting a gene
/// sits at the midpoint of the split gene's endpoints. Genes may
/// only run from a strictly lower rank to a strictly higher one,
/// which keeps the enabled-connection graph acyclic by construction.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    role: NodeRole,
    gate: Option<GateKind>,
    rank: f64,
    inputs: HashSet<Innovation>,
    outputs: HashSet<Innovation>,
}

impl Node {
    /// Generate a new node with the passed parameters.
    /// Input nodes carry no gate; hidden and output nodes must
    /// have one.
    pub(crate) fn new(id: Innovation, role: NodeRole, gate: Option<GateKind>, rank: f64) -> Node {
        debug_assert_eq!(gate.is_none(), role == NodeRole::Input);
        Node {
            id,
            role,
            gate,
            rank,
            inputs: HashSet::new(),
            outputs: HashSet::new(),
        }
    }

    /// Adds the passed innovation number to the node's
    /// list of incoming genes.
    ///
    /// # Panics
    /// This function panics if the gene is already
    /// in the node's incoming set.
    pub(crate) fn add_input_gene(&mut self, gene_id: Innovation) {
        if !self.inputs.insert(gene_id) {
            panic!("attempted to add duplicate incoming gene with ID {}", gene_id)
        }
    }

    /// Adds the passed innovation number to the node's
    /// list of outgoing genes.
    ///
    /// # Panics
    /// This function panics if the gene is already
    /// in the node's outgoing set.
    pub(crate) fn add_output_gene(&mut self, gene_id: Innovation) {
        if !self.outputs.insert(gene_id) {
            panic!("attempted to add duplicate outgoing gene with ID {}", gene_id)
        }
    }

    /// Returns the node's id.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the node's role.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Returns the node's gate kind, or `None` for input nodes.
    pub fn gate(&self) -> Option<GateKind> {
        self.gate
    }

    /// Reassigns the node's gate kind.
    ///
    /// # Panics
    /// This function panics if called on an input node.
    pub(crate) fn set_gate(&mut self, gate: GateKind) {
        match self.role {
            NodeRole::Input => panic!("attempted to assign gate {} to input node {}", gate, self.id),
            _ => self.gate = Some(gate),
        }
    }

    /// Returns the node's topological rank.
    pub fn rank(&self) -> f64 {
        self.rank
    }

    /// Returns an iterator over the node's incoming gene ids.
    pub fn input_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.inputs.iter()
    }

    /// Returns an iterator over the node's outgoing gene ids.
    pub fn output_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.outputs.iter()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gate {
            Some(gate) => write!(
                f,
                "{:?}[{:?}, {}, r{:.3}, IN: {:?}, OUT: {:?}]",
                self.id, self.role, gate, self.rank, self.inputs, self.outputs,
            ),
            None => write!(
                f,
                "{:?}[{:?}, r{:.3}, OUT: {:?}]",
                self.id, self.role, self.rank, self.outputs,
            ),
        }
    }
}
