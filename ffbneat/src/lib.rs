//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>,
//! adapted to evolve feed-forward networks of boolean logic gates
//! instead of weighted neural networks.
//!
//! Genomes encode acyclic gate circuits as node and connection genes.
//! Connection "weights" are binary (a wire is either there or it isn't),
//! so structural mutation and gate reassignment carry all the evolutionary
//! pressure. A genome is instantiated as a [`GateNetwork`], a layered,
//! read-only circuit that can be evaluated on boolean input vectors.
//!
//! [`GateNetwork`]: crate::networks::GateNetwork
//!
//! # Example usage: Evolution of an XOR circuit
//! ```
//! use ffbneat::gates::GateKind;
//! use ffbneat::genomics::GeneticConfig;
//! use ffbneat::networks::GateNetwork;
//! use ffbneat::populations::{Population, PopulationConfig};
//! use std::num::NonZeroUsize;
//!
//! const TRUTH_TABLE: [([bool; 2], bool); 4] = [
//!     ([false, false], false),
//!     ([false, true], true),
//!     ([true, false], true),
//!     ([true, true], false),
//! ];
//!
//! fn evaluate_xor(network: &GateNetwork) -> (f32, bool) {
//!     let mut correct = 0;
//!     for (inputs, expected) in &TRUTH_TABLE {
//!         if network.evaluate(inputs).map(|o| o[0] == *expected).unwrap_or(false) {
//!             correct += 1;
//!         }
//!     }
//!     (correct as f32 / 4.0, correct == 4)
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         gate_kinds: vec![GateKind::And, GateKind::Or, GateKind::Xor, GateKind::Nand],
//!         output_gate_kinds: vec![GateKind::Buffer],
//!         initial_expression_chance: 1.0,
//!         connection_addition_mutation_chance: 0.3,
//!         node_addition_mutation_chance: 0.05,
//!         gate_mutation_chance: 0.1,
//!         enable_toggle_mutation_chance: 0.05,
//!         max_connection_mutation_attempts: 20,
//!         disabled_gene_inheritance_chance: 0.75,
//!         excess_gene_factor: 1.0,
//!         disjoint_gene_factor: 1.0,
//!         gate_difference_factor: 0.4,
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(50).unwrap(),
//!         distance_threshold: 0.9,
//!         elitism: 1,
//!         survival_threshold: 0.2,
//!         sexual_reproduction_chance: 0.6,
//!         interspecies_mating_chance: 0.001,
//!         stagnation_threshold: NonZeroUsize::new(15).unwrap(),
//!     };
//!
//!     let mut rng = rand::thread_rng();
//!     let mut population = Population::new(population_config, genetic_config, &mut rng);
//!     for _ in 0..10 {
//!         population.evaluate_fitness(evaluate_xor);
//!         if population.solved() {
//!             println!("Solution found: {}", population.champion());
//!             break;
//!         }
//!         if let Err(e) = population.evolve(&mut rng) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod gates;
pub mod genomics;
pub mod networks;
pub mod populations;

/// An identifier for a structural innovation.
/// Used both for node ids and for connection-gene
/// innovation numbers, in separate counter spaces.
pub type Innovation = usize;
