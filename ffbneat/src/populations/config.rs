use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f32,
    /// Top n of each species which is copied
    /// as-is to the next generation.
    pub elitism: usize,
    /// Top % of each species which can participate
    /// in mating.
    pub survival_threshold: f32,
    /// Chance that offspring will be the result
    /// of sexual reproduction (as opposed to a
    /// mutated clone of a single parent).
    pub sexual_reproduction_chance: f32,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f32,
    /// Number of generations without a fitness
    /// increase after which a species is culled
    /// from reproduction. The species holding the
    /// population champion is exempt.
    pub stagnation_threshold: NonZeroUsize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::populations::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     // Specify some values here...
    ///     distance_threshold: 0.9,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(1).unwrap(),
            distance_threshold: 0.0,
            elitism: 0,
            survival_threshold: 0.0,
            sexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 0.0,
            stagnation_threshold: NonZeroUsize::new(1).unwrap(),
        }
    }
}
