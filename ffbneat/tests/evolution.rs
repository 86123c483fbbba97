//! End-to-end evolution runs against the XOR truth table,
//! plus long-running structural invariant sweeps.

use ffbneat::gates::GateKind;
use ffbneat::genomics::{GeneticConfig, Genome};
use ffbneat::networks::GateNetwork;
use ffbneat::populations::{Population, PopulationConfig};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::num::NonZeroUsize;

const TRUTH_TABLE: [([bool; 2], bool); 4] = [
    ([false, false], false),
    ([false, true], true),
    ([true, false], true),
    ([true, true], false),
];

fn evaluate_xor(network: &GateNetwork) -> (f32, bool) {
    let mut correct = 0;
    for (inputs, expected) in &TRUTH_TABLE {
        if network
            .evaluate(inputs)
            .map(|outputs| outputs[0] == *expected)
            .unwrap_or(false)
        {
            correct += 1;
        }
    }
    (correct as f32 / 4.0, correct == 4)
}

fn xor_configs() -> (PopulationConfig, GeneticConfig) {
    (
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap(),
            distance_threshold: 0.9,
            elitism: 1,
            survival_threshold: 0.2,
            sexual_reproduction_chance: 0.6,
            interspecies_mating_chance: 0.001,
            stagnation_threshold: NonZeroUsize::new(15).unwrap(),
        },
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            gate_kinds: vec![
                GateKind::And,
                GateKind::Or,
                GateKind::Nand,
                GateKind::Xor,
            ],
            output_gate_kinds: vec![GateKind::Buffer],
            initial_expression_chance: 1.0,
            connection_addition_mutation_chance: 0.3,
            node_addition_mutation_chance: 0.05,
            gate_mutation_chance: 0.1,
            enable_toggle_mutation_chance: 0.05,
            max_connection_mutation_attempts: 20,
            disabled_gene_inheritance_chance: 0.75,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            gate_difference_factor: 0.4,
        },
    )
}

/// Runs the generational loop until the task is solved or the
/// generation bound is hit. Returns the solving champion.
fn run_to_solution(
    seed: u64,
    max_generations: usize,
) -> Option<Genome> {
    let (pop_cfg, gen_cfg) = xor_configs();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);
    for _ in 0..max_generations {
        population.evaluate_fitness(evaluate_xor);
        if population.solved() {
            return Some(population.champion().clone());
        }
        if population.evolve(&mut rng).is_err() {
            return None;
        }
    }
    None
}

#[test]
fn evolves_a_xor_circuit() {
    let champion = (0..8)
        .filter_map(|seed| run_to_solution(seed, 300))
        .next()
        .expect("no run evolved a XOR circuit");

    // The champion must reproduce the full truth table.
    let network = GateNetwork::compile(&champion).unwrap();
    for (inputs, expected) in &TRUTH_TABLE {
        assert_eq!(network.evaluate(inputs), Ok(vec![*expected]), "{:?}", inputs);
    }
}

#[test]
fn every_genome_stays_compilable_and_arity_valid() {
    let (pop_cfg, gen_cfg) = xor_configs();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

    for _ in 0..40 {
        population.evaluate_fitness(evaluate_xor);
        assert_eq!(population.compilation_failures(), 0);
        assert_eq!(population.mating_fallbacks(), 0);

        for genome in population.genomes() {
            for node in genome.nodes() {
                if let Some(gate) = node.gate() {
                    assert!(
                        genome.enabled_in_degree(node.id()) <= gate.arity(),
                        "node {} exceeds its arity",
                        node.id()
                    );
                }
            }
            for gene in genome.genes() {
                let source = genome.nodes().find(|n| n.id() == gene.source()).unwrap();
                let target = genome.nodes().find(|n| n.id() == gene.target()).unwrap();
                assert!(source.rank() < target.rank());
            }
        }

        if population.evolve(&mut rng).is_err() {
            break;
        }
    }
}

#[test]
fn evaluation_of_champion_is_repeatable() {
    let (pop_cfg, gen_cfg) = xor_configs();
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

    for _ in 0..10 {
        population.evaluate_fitness(evaluate_xor);
        population.evolve(&mut rng).unwrap();
    }
    population.evaluate_fitness(evaluate_xor);

    let champion = population.champion();
    let network = GateNetwork::compile(champion).unwrap();
    for (inputs, _) in &TRUTH_TABLE {
        let first = network.evaluate(inputs).unwrap();
        for _ in 0..10 {
            assert_eq!(network.evaluate(inputs).unwrap(), first);
        }
    }
}
