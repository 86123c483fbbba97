//! Evolves a boolean circuit that computes XOR, then prints the
//! winning genome, writes it out as a Graphviz dot diagram, and
//! snapshots it in RON form.

use ffbneat::gates::GateKind;
use ffbneat::genomics::{GeneticConfig, Genome, NodeRole};
use ffbneat::networks::GateNetwork;
use ffbneat::populations::logging::{EvolutionLogger, ReportingLevel};
use ffbneat::populations::{Population, PopulationConfig};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::fs;
use std::num::NonZeroUsize;

const MAX_GENERATIONS: usize = 500;

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

fn main() {
    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        gate_kinds: vec![
            GateKind::And,
            GateKind::Or,
            GateKind::Nand,
            GateKind::Nor,
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
    };
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        distance_threshold: 0.9,
        elitism: 1,
        survival_threshold: 0.2,
        sexual_reproduction_chance: 0.6,
        interspecies_mating_chance: 0.001,
        stagnation_threshold: NonZeroUsize::new(15).unwrap(),
    };

    let mut rng = ChaCha8Rng::from_entropy();
    let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    let mut population = Population::new(population_config, genetic_config, &mut rng);

    for _ in 0..MAX_GENERATIONS {
        population.evaluate_fitness(evaluate_xor);
        logger.log(&population);
        if population.solved() {
            break;
        }
        if let Err(e) = population.evolve(&mut rng) {
            eprintln!("{}", e);
            break;
        }
    }

    if let Some(log) = logger.iter().last() {
        println!("{}", log);
    }

    let champion = population.champion();
    if population.solved() {
        println!(
            "XOR solved in {} generations: {}",
            population.generation(),
            champion
        );
        if let Err(e) = fs::write("champion.dot", render_dot(champion)) {
            eprintln!("could not write champion.dot: {}", e);
        }
        match ron::to_string(champion) {
            Ok(snapshot) => {
                if let Err(e) = fs::write("champion.ron", snapshot) {
                    eprintln!("could not write champion.ron: {}", e);
                }
            }
            Err(e) => eprintln!("could not serialize champion: {}", e),
        }
    } else {
        println!(
            "no solution within {} generations; best fitness {:.2}",
            MAX_GENERATIONS,
            champion.fitness()
        );
    }
}

/// Renders a genome as a Graphviz digraph, using the genome's
/// read-only node and gene traversal. Disabled genes are dotted.
fn render_dot(genome: &Genome) -> String {
    let mut dot = String::from("digraph {\n");
    let mut nodes: Vec<_> = genome.nodes().collect();
    nodes.sort_unstable_by_key(|n| n.id());
    for node in nodes {
        let label = match node.gate() {
            Some(gate) => format!("{} {}", gate, node.id()),
            None => format!("in {}", node.id()),
        };
        let shape = match node.role() {
            NodeRole::Input => "invtriangle",
            NodeRole::Output => "triangle",
            NodeRole::Hidden => "box",
        };
        dot.push_str(&format!(
            "  {} [label=\"{}\", shape={}]\n",
            node.id(),
            label,
            shape
        ));
    }
    let mut genes: Vec<_> = genome.genes().collect();
    genes.sort_unstable_by_key(|g| g.innovation());
    for gene in genes {
        if gene.enabled() {
            dot.push_str(&format!("  {} -> {}\n", gene.source(), gene.target()));
        } else {
            dot.push_str(&format!(
                "  {} -> {} [style=dotted]\n",
                gene.source(),
                gene.target()
            ));
        }
    }
    dot.push_str("}\n");
    dot
}
