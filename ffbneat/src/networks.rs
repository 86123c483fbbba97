//! A GateNetwork is the phenotype of a [`Genome`]: its enabled
//! genes compiled into a layered, read-only combinational circuit.
//! Suppressed genes are ignored. Networks are recompiled fresh from
//! a genome for each round of scoring and never mutated in place,
//! so evaluation is pure and repeatable.
//!
//! [`Genome`]: crate::genomics::Genome

use crate::gates::GateKind;
use crate::genomics::{Genome, Node};
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// A compiled feed-forward boolean gate circuit.
#[derive(Clone, Debug)]
pub struct GateNetwork {
    node_ids: Box<[Innovation]>,
    gates: Box<[Option<GateKind>]>,
    incoming: Box<[Box<[usize]>]>,
    layers: Box<[Box<[usize]>]>,
    input_positions: Box<[usize]>,
    output_positions: Box<[usize]>,
    floating_input_value: bool,
}

impl GateNetwork {
    /// Compiles the genome's enabled genes into a layered circuit,
    /// with unconnected gate inputs floating to `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the enabled gene graph contains a cycle.
    /// Genomes built through the mutation and mating operators rank
    /// their genes, so this cannot happen for them; the check guards
    /// the compilation boundary itself.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::{GeneticConfig, Genome};
    /// use ffbneat::networks::GateNetwork;
    ///
    /// let genome = Genome::new(
    ///     &GeneticConfig {
    ///         initial_expression_chance: 1.0,
    ///         ..GeneticConfig::zero()
    ///     },
    ///     &mut rand::thread_rng(),
    /// );
    ///
    /// // A single buffered wire from the input to the output.
    /// let network = GateNetwork::compile(&genome).unwrap();
    /// assert_eq!(network.evaluate(&[true]), Ok(vec![true]));
    /// assert_eq!(network.evaluate(&[false]), Ok(vec![false]));
    /// ```
    pub fn compile(genome: &Genome) -> Result<GateNetwork, CompileError> {
        Self::compile_with(genome, false)
    }

    /// Compiles the genome with the given value for unconnected
    /// gate inputs.
    pub fn compile_with(
        genome: &Genome,
        floating_input_value: bool,
    ) -> Result<GateNetwork, CompileError> {
        // Sorting by id makes the compiled circuit deterministic,
        // independently of node iteration order.
        let mut node_ids: Vec<Innovation> = genome.nodes().map(Node::id).collect();
        node_ids.sort_unstable();
        let node_count = node_ids.len();

        let index_of: HashMap<Innovation, usize, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let mut gates = vec![None; node_count];
        for node in genome.nodes() {
            gates[index_of[&node.id()]] = node.gate();
        }

        let mut enabled_genes: Vec<_> = genome.genes().filter(|g| g.enabled()).collect();
        enabled_genes.sort_unstable_by_key(|g| g.innovation());

        let mut incoming = vec![vec![]; node_count];
        let mut outgoing = vec![vec![]; node_count];
        let mut in_degree = vec![0usize; node_count];
        for gene in &enabled_genes {
            let source = index_of[&gene.source()];
            let target = index_of[&gene.target()];
            incoming[target].push(source);
            outgoing[source].push(target);
            in_degree[target] += 1;
        }

        let mut layers = Vec::new();
        let mut frontier: Vec<usize> = (0..node_count).filter(|i| in_degree[*i] == 0).collect();
        let mut processed = 0;
        while !frontier.is_empty() {
            processed += frontier.len();
            let mut next = Vec::new();
            for &node in &frontier {
                for &successor in &outgoing[node] {
                    in_degree[successor] -= 1;
                    if in_degree[successor] == 0 {
                        next.push(successor);
                    }
                }
            }
            next.sort_unstable();
            layers.push(std::mem::replace(&mut frontier, next).into_boxed_slice());
        }
        if processed != node_count {
            return Err(CompileError::CycleDetected);
        }

        let input_positions = (0..genome.input_count())
            .map(|id| index_of[&id])
            .collect();
        let output_positions = (genome.input_count()..genome.input_count() + genome.output_count())
            .map(|id| index_of[&id])
            .collect();

        Ok(GateNetwork {
            node_ids: node_ids.into(),
            gates: gates.into(),
            incoming: incoming.into_iter().map(Vec::into_boxed_slice).collect(),
            layers: layers.into(),
            input_positions,
            output_positions,
            floating_input_value,
        })
    }

    /// Evaluates the circuit on the given input vector, returning
    /// one boolean per output node, in output-node order.
    ///
    /// Gate inputs left unwired by the genome are padded with the
    /// floating value the network was compiled with. Evaluation is
    /// pure: the same inputs always produce the same outputs, in
    /// any call order.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` does not have exactly one value
    /// per input node.
    pub fn evaluate(&self, inputs: &[bool]) -> Result<Vec<bool>, NetworkEvaluationError> {
        if inputs.len() != self.input_positions.len() {
            return Err(NetworkEvaluationError::InputLengthMismatch {
                expected: self.input_positions.len(),
                actual: inputs.len(),
            });
        }

        let mut values = vec![self.floating_input_value; self.node_ids.len()];
        for (position, value) in self.input_positions.iter().zip(inputs) {
            values[*position] = *value;
        }

        let mut gathered = Vec::with_capacity(2);
        for layer in self.layers.iter() {
            for &node in layer.iter() {
                let gate = match self.gates[node] {
                    Some(gate) => gate,
                    None => continue,
                };
                gathered.clear();
                gathered.extend(self.incoming[node].iter().map(|&source| values[source]));
                while gathered.len() < gate.arity() {
                    gathered.push(self.floating_input_value);
                }
                values[node] = gate
                    .evaluate(&gathered)
                    .unwrap_or_else(|e| panic!("{} in compiled network", e));
            }
        }

        Ok(self
            .output_positions
            .iter()
            .map(|&position| values[position])
            .collect())
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.input_positions.len()
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.output_positions.len()
    }

    /// Returns the circuit's evaluation layers, as node ids in
    /// evaluation order. Every node's wired inputs come from
    /// strictly earlier layers.
    pub fn layers(&self) -> impl Iterator<Item = Vec<Innovation>> + '_ {
        self.layers
            .iter()
            .map(move |layer| layer.iter().map(|&index| self.node_ids[index]).collect())
    }

    /// Returns the number of evaluation layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl fmt::Display for GateNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

/// An error type indicating a genome could not be
/// compiled into a circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// The enabled gene graph contains a cycle. The genome is
    /// malformed and should be excluded from reproduction.
    CycleDetected,
}

/// An error type indicating a circuit was evaluated
/// on a malformed input vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkEvaluationError {
    InputLengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "cycle detected in enabled gene graph"),
        }
    }
}

impl fmt::Display for NetworkEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputLengthMismatch { expected, actual } => write!(
                f,
                "network evaluated on {} inputs, expected {}",
                actual, expected
            ),
        }
    }
}

impl Error for CompileError {}
impl Error for NetworkEvaluationError {}
