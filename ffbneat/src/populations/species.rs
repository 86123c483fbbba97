use crate::genomics::{GeneticConfig, Genome};
use crate::populations::PopulationConfig;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_, which
/// is re-chosen each generation as the species' best
/// performer.
///
/// Species accumulate stagnation for every generation
/// in which their best fitness does not improve, and
/// are culled from reproduction once they stagnate for
/// [`stagnation_threshold`] generations, unless they
/// hold the population champion.
///
/// [genetic distance]: PopulationConfig::distance_threshold
/// [`stagnation_threshold`]: PopulationConfig::stagnation_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    pub(super) genomes: Vec<Genome>,
    representative: Genome,
    stagnation: usize,
    max_fitness: f32,
}

impl Species {
    /// Creates a new species with the specified ID and
    /// representative. The representative is also added
    /// to the species' genome pool.
    pub(super) fn new(id: SpeciesID, representative: Genome) -> Species {
        Species {
            id,
            genomes: vec![representative.clone()],
            representative,
            stagnation: 0,
            max_fitness: 0.0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    pub fn genetic_distance(&self, other: &Genome, config: &GeneticConfig) -> f32 {
        Genome::genetic_distance(&self.representative, other, config)
    }

    /// Adds a genome to the species.
    pub(super) fn add_genome(&mut self, genome: Genome) {
        self.genomes.push(genome);
    }

    /// Updates the species' record of maximum fitness,
    /// resetting the stagnation counter whenever the
    /// record improves.
    pub(super) fn update_fitness(&mut self) {
        let max_fitness = self
            .genomes
            .iter()
            .map(Genome::fitness)
            .max_by(|a, b| {
                a.partial_cmp(b)
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .unwrap_or(0.0);
        if max_fitness > self.max_fitness {
            self.stagnation = 0;
            self.max_fitness = max_fitness;
        } else {
            self.stagnation += 1;
        }
    }

    /// Re-chooses the species' representative for the
    /// next generation as its current best performer.
    /// Assumes members are sorted by decreasing fitness.
    pub(super) fn promote_champion_representative(&mut self) {
        if let Some(best) = self.genomes.first() {
            self.representative = best.clone();
        }
    }

    /// Returns the species' _member-count adjusted_
    /// fitness, i.e. the average of the species'
    /// genomes' fitnesses. This is the species'
    /// share weight under fitness sharing.
    pub fn adjusted_fitness(&self) -> f32 {
        self.genomes.iter().map(Genome::fitness).sum::<f32>() / self.genomes.len() as f32
    }

    /// Returns the number of generations the species
    /// has gone without improving its best fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Returns an iterator over the species' members.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns the currently best-performing genome.
    ///
    /// # Panics
    /// Panics if the species is empty.
    pub fn champion(&self) -> &Genome {
        self.genomes
            .iter()
            .max_by(|g1, g2| {
                g1.fitness()
                    .partial_cmp(&g2.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .expect("empty species has no champion")
    }

    pub(super) fn count_elite(&self, config: &PopulationConfig) -> usize {
        self.genomes.len().min(config.elitism)
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        (self.genomes.len() as f32 * config.survival_threshold).ceil() as usize
    }
}
