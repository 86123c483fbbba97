use crate::gates::GateKind;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// All quantities expressing probabilities should be
/// in the range [0.0, 1.0].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input nodes in a genome.
    pub input_count: NonZeroUsize,
    /// Number of output nodes in a genome.
    pub output_count: NonZeroUsize,
    /// Possible gate kinds for hidden nodes created
    /// by node addition mutations. If an empty vector
    /// is given, new nodes default to [`Buffer`].
    ///
    /// [`Buffer`]: crate::gates::GateKind::Buffer
    pub gate_kinds: Vec<GateKind>,
    /// Gate kinds of output nodes. If fewer than
    /// [`output_count`] are specified, the remainder
    /// default to [`Buffer`].
    ///
    /// [`output_count`]: GeneticConfig::output_count
    /// [`Buffer`]: crate::gates::GateKind::Buffer
    pub output_gate_kinds: Vec<GateKind>,
    /// Chance that each output is wired to a random
    /// input during initial genome generation.
    pub initial_expression_chance: f32,
    /// Chance of a connection addition mutation taking
    /// place during reproduction.
    pub connection_addition_mutation_chance: f32,
    /// Chance of a node addition mutation taking place
    /// during reproduction.
    pub node_addition_mutation_chance: f32,
    /// Chance of a gate reassignment mutation taking
    /// place during reproduction.
    pub gate_mutation_chance: f32,
    /// Chance of an enable-flag toggle mutation taking
    /// place during reproduction.
    pub enable_toggle_mutation_chance: f32,
    /// Maximum number of source/target samplings before
    /// a connection addition mutation gives up.
    pub max_connection_mutation_attempts: usize,
    /// Chance that a gene disabled in either parent is
    /// inherited disabled by the child during mating.
    pub disabled_gene_inheritance_chance: f32,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the gate-kind mismatch ratio among
    /// matching genes in genetic distance.
    pub gate_difference_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    pub fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            gate_kinds: vec![],
            output_gate_kinds: vec![],
            initial_expression_chance: 0.0,
            connection_addition_mutation_chance: 0.0,
            node_addition_mutation_chance: 0.0,
            gate_mutation_chance: 0.0,
            enable_toggle_mutation_chance: 0.0,
            max_connection_mutation_attempts: 0,
            disabled_gene_inheritance_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            gate_difference_factor: 0.0,
        }
    }
}
