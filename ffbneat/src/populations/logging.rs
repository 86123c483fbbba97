//! Generational population logging.
//!
//! An [`EvolutionLogger`] stores per-generation snapshots of a
//! population at a configurable level of detail, along with
//! basic statistics and the generation's structural-defect
//! counters.

use crate::genomics::Genome;
use crate::populations::{Population, SpeciesID};
use crate::Innovation;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub fitness: Stats,
    pub gene_count: Stats,
    pub node_count: Stats,
    pub max_connection_innovation: Innovation,
    pub max_node_id: Innovation,
    /// Matings that fell back to cloning the fitter parent.
    /// Nonzero values signal an innovation-history defect.
    pub mating_fallbacks: usize,
    /// Genomes whose compilation failed and which were
    /// assigned zero fitness.
    pub compilation_failures: usize,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            \tgene_count: {:?}\n\
            \tnode_count: {:?}\n\
            \tmax_connection_innovation: {:?}\n\
            \tmax_node_id: {:?}\n\
            \tmating_fallbacks: {:?}\n\
            \tcompilation_failures: {:?}\n\
            }}",
            &self.generation_number,
            &self.species_count,
            &self.fitness,
            &self.gene_count,
            &self.node_count,
            &self.max_connection_innovation,
            &self.max_node_id,
            &self.mating_fallbacks,
            &self.compilation_failures,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all-zero statistics.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        let mid = data.len() / 2;
        let (mut max, mut min, mut sum) = (f32::MIN, f32::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f32;
        let mut median = *data
            .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap())
            .1;
        if data.len() % 2 == 0 {
            median = (median
                + *data
                    .select_nth_unstable_by(mid - 1, |a, b| a.partial_cmp(b).unwrap())
                    .1)
                / 2.0;
        }
        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependent store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesID, Vec<Genome>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesID, Genome, usize)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropriate reporting level.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::populations::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    pub fn log(&mut self, population: &Population) {
        let stats: Vec<(f32, f32, f32)> = population
            .genomes()
            .map(|g| {
                (
                    g.genes().count() as f32,
                    g.nodes().count() as f32,
                    g.fitness(),
                )
            })
            .collect();
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                    population
                        .species()
                        .map(|s| (s.id(), s.genomes().cloned().collect(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .map(|s| (s.id(), s.champion().clone(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => {
                    GenerationMemberRecord::PopulationChampion(population.champion().clone())
                }
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().count(),
            fitness: Stats::from(stats.iter().map(|(_, _, f)| *f)),
            gene_count: Stats::from(stats.iter().map(|(g, _, _)| *g)),
            node_count: Stats::from(stats.iter().map(|(_, n, _)| *n)),
            max_connection_innovation: population.history().max_connection_innovation(),
            max_node_id: population.history().max_node_id(),
            mating_fallbacks: population.mating_fallbacks(),
            compilation_failures: population.compilation_failures(),
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Stats;

    #[test]
    fn stats_of_empty_sequence_are_zero() {
        let stats = Stats::from(std::iter::empty());
        assert_eq!(stats.maximum, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn stats_of_even_length_sequence() {
        let stats = Stats::from([1.0, 2.0, 3.0, 4.0].iter().copied());
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
    }
}
