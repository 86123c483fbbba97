//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
//!
//! Each generation runs Evaluate → Speciate → Adjust →
//! Reproduce → Replace: genomes are scored in parallel
//! against their compiled circuits, clustered by genetic
//! distance, allotted offspring by shared fitness, and
//! replaced by their species' next brood.

mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod species;

use crate::genomics::{GeneticConfig, Genome, History};
use crate::networks::GateNetwork;

pub use config::PopulationConfig;
pub use errors::OffspringAllotmentError;
use offspring_factory::OffspringFactory;
pub use species::{Species, SpeciesID};

use rand::prelude::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A population of genomes.
#[derive(Serialize, Deserialize)]
pub struct Population {
    species: Vec<Species>,
    history: History,
    generation: usize,
    historical_species_count: usize,
    mating_fallbacks: usize,
    compilation_failures: usize,
    solved: bool,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population of minimal genomes using
    /// the passed configurations.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::GeneticConfig;
    /// use ffbneat::populations::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::zero(),
    ///     &mut rand::thread_rng(),
    /// );
    ///
    /// assert_eq!(population.genomes().count(), 20);
    /// ```
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        rng: &mut impl Rng,
    ) -> Population {
        Population {
            species: {
                let mut s0 = Species::new(SpeciesID(0, 0), Genome::new(&genetic_config, rng));
                s0.genomes.extend(
                    (1..population_config.size.get()).map(|_| Genome::new(&genetic_config, rng)),
                );
                vec![s0]
            },
            history: History::new(&genetic_config),
            generation: 0,
            historical_species_count: 1,
            mating_fallbacks: 0,
            compilation_failures: 0,
            solved: false,
            population_config,
            genetic_config,
        }
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// Each genome is compiled into a [`GateNetwork`] and scored
    /// independently, in parallel. The evaluator returns the
    /// genome's fitness (which must be non-negative) and whether
    /// the genome meets the task's success criterion; the latter
    /// is surfaced through [`solved`].
    ///
    /// Genomes whose compilation fails are assigned zero fitness,
    /// which excludes them from reproduction, and counted in
    /// [`compilation_failures`].
    ///
    /// [`solved`]: Population::solved
    /// [`compilation_failures`]: Population::compilation_failures
    ///
    /// # Examples
    /// ```
    /// use ffbneat::genomics::GeneticConfig;
    /// use ffbneat::populations::{Population, PopulationConfig};
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig::zero(),
    ///     GeneticConfig {
    ///         initial_expression_chance: 1.0,
    ///         ..GeneticConfig::zero()
    ///     },
    ///     &mut rand::thread_rng(),
    /// );
    ///
    /// // Reward circuits that answer `true` on a `true` input.
    /// population.evaluate_fitness(|network| {
    ///     let output = network.evaluate(&[true]).unwrap()[0];
    ///     (if output { 1.0 } else { 0.0 }, output)
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, evaluator: E)
    where
        E: Fn(&GateNetwork) -> (f32, bool) + Sync,
    {
        let genomes: Vec<&mut Genome> = self
            .species
            .iter_mut()
            .flat_map(|s| s.genomes.iter_mut())
            .collect();

        let (solved, failures) = genomes
            .into_par_iter()
            .map(|genome| match GateNetwork::compile(genome) {
                Ok(network) => {
                    let (fitness, solved) = evaluator(&network);
                    assert!(fitness >= 0.0, "fitness function returned a negative value");
                    genome.set_fitness(fitness);
                    (solved, 0)
                }
                Err(_) => {
                    genome.set_fitness(0.0);
                    (false, 1)
                }
            })
            .reduce(|| (false, 0), |a, b| (a.0 || b.0, a.1 + b.1));

        self.solved = solved;
        self.compilation_failures = failures;
    }

    /// Returns whether any genome met the task's success
    /// criterion during the last fitness evaluation.
    pub fn solved(&self) -> bool {
        self.solved
    }

    /// Evolves the population by mating the best performing
    /// genomes of each species, and re-speciating genomes
    /// as appropriate.
    ///
    /// Offspring are allotted to species proportionally to
    /// their mean member fitness. Species that have stagnated
    /// beyond the configured threshold are allotted nothing and
    /// die out, unless they hold the population champion.
    ///
    /// # Panics
    /// This function will panic if
    /// `config.survival_threshold == 0.0` and
    /// `config.elitism` isn't high enough to cover
    /// the number of offspring assigned to a species,
    /// as there would be no parents from which to generate
    /// offspring.
    ///
    /// # Errors
    /// Returns an error if the population has become degenerate
    /// (zero fitness for every genome).
    pub fn evolve(&mut self, rng: &mut impl Rng) -> Result<(), OffspringAllotmentError> {
        self.species.iter_mut().for_each(Species::update_fitness);
        self.sort_species_members_by_decreasing_fitness();
        self.species
            .iter_mut()
            .for_each(Species::promote_champion_representative);

        let allotted_offspring = self.allot_offspring()?;

        // Structural changes of the new generation are numbered
        // from a blank per-generation record.
        self.history.clear();
        self.generate_offspring(&allotted_offspring, rng);
        self.respeciate_all();
        self.remove_extinct_species();
        self.generation += 1;
        Ok(())
    }

    /// Allot the number of offspring for each species,
    /// based on proportional adjusted species fitness
    /// and stagnation status.
    fn allot_offspring(&self) -> Result<Vec<usize>, OffspringAllotmentError> {
        match self.get_species_adjusted_fitness() {
            Some(adjusted_fitnesses) => Ok(round_retain_sum(&adjusted_fitnesses)),
            None => Err(OffspringAllotmentError::DegeneratePopulation),
        }
    }

    /// Collects all species' adjusted fitnesses, scaled to
    /// sum to the population size.
    /// Returns `None` if the population fitness sum is 0.
    fn get_species_adjusted_fitness(&self) -> Option<Vec<f32>> {
        let fitnesses = self.species_fitness_with_stagnation_culling();
        let fitness_sum: f32 = fitnesses.iter().copied().sum();
        if fitness_sum == 0.0 {
            return None;
        }
        Some(
            fitnesses
                .iter()
                .map(|f| *f / fitness_sum * self.population_config.size.get() as f32)
                .collect(),
        )
    }

    /// Returns each species' adjusted fitness, zeroed for
    /// species stagnated beyond the configured threshold.
    /// The species holding the population champion is never
    /// culled.
    fn species_fitness_with_stagnation_culling(&self) -> Vec<f32> {
        let champion_species = self.champion_species_index();
        self.species
            .iter()
            .enumerate()
            .map(|(index, s)| {
                if Some(index) != champion_species
                    && s.time_stagnated() >= self.population_config.stagnation_threshold.get()
                {
                    0.0
                } else {
                    s.adjusted_fitness()
                }
            })
            .collect()
    }

    /// Returns the index of the species holding the
    /// best-performing genome.
    fn champion_species_index(&self) -> Option<usize> {
        self.species
            .iter()
            .enumerate()
            .max_by(|(_, s1), (_, s2)| {
                s1.champion()
                    .fitness()
                    .partial_cmp(&s2.champion().fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
            })
            .map(|(index, _)| index)
    }

    /// Generates each species' assigned offspring,
    /// keeping the [species' elite] and breeding the
    /// [top performers].
    ///
    /// [species' elite]: PopulationConfig::elitism
    /// [top performers]: PopulationConfig::survival_threshold
    fn generate_offspring(&mut self, allotted_offspring: &[usize], rng: &mut impl Rng) {
        let mut factory = OffspringFactory::new(
            &self.species,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
        );
        let mut species_offspring = factory.generate_offspring(allotted_offspring, rng);
        self.mating_fallbacks = factory.mating_fallbacks();

        for species in &mut self.species {
            species.genomes = species_offspring.remove(&species.id()).unwrap();
        }
    }

    /// Sorts each species' members by fitness in descending order.
    fn sort_species_members_by_decreasing_fitness(&mut self) {
        for species in &mut self.species {
            species.genomes.sort_unstable_by(|g1, g2| {
                g2.fitness()
                    .partial_cmp(&g1.fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
            });
        }
    }

    /// Reassigns each genome to a species based on genetic
    /// distance to species representatives.
    fn respeciate_all(&mut self) {
        let mut new_species_count = 0;
        for genome in self.drain_incompatible_genomes_from_species() {
            if self.respeciate(
                genome,
                SpeciesID(self.historical_species_count, new_species_count),
            ) {
                new_species_count += 1;
            }
        }
        if new_species_count > 0 {
            self.historical_species_count += 1;
        }
    }

    /// Assigns a genome to a species based on genetic distance
    /// to species representatives. Returns whether a new species
    /// was created to house the genome.
    fn respeciate(&mut self, genome: Genome, new_species_id: SpeciesID) -> bool {
        // Assign if possible to the first compatible species.
        for species in &mut self.species {
            if species.genetic_distance(&genome, &self.genetic_config)
                < self.population_config.distance_threshold
            {
                species.add_genome(genome);
                return false;
            }
        }
        // Create a new species if a compatible one has not been found.
        self.species.push(Species::new(new_species_id, genome));
        true
    }

    /// Removes and returns all genomes incompatible with their
    /// current species.
    fn drain_incompatible_genomes_from_species(&mut self) -> impl Iterator<Item = Genome> {
        let mut incompatibles = vec![];
        for species in &mut self.species {
            let mut i = 0;
            while i < species.genomes.len() {
                if Genome::genetic_distance(
                    &species.genomes[i],
                    species.representative(),
                    &self.genetic_config,
                ) >= self.population_config.distance_threshold
                {
                    incompatibles.push(species.genomes.swap_remove(i));
                } else {
                    i += 1;
                }
            }
        }
        incompatibles.into_iter()
    }

    /// Removes all extinct (0 remaining members)
    /// species from the population.
    fn remove_extinct_species(&mut self) {
        let mut i = 0;
        while i < self.species.len() {
            if self.species[i].genomes.is_empty() {
                self.species.swap_remove(i);
            } else {
                i += 1;
            }
        }
        self.species.sort_unstable_by_key(|s| s.id());
    }

    /// Resets the population to an initial randomized state.
    /// Used primarily in case of population degeneration, e.g.
    /// when all genomes have a fitness score of 0.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        *self = Population::new(
            self.population_config.clone(),
            self.genetic_config.clone(),
            rng,
        );
    }

    /// Returns the currently best-performing genome.
    ///
    /// # Panics
    /// Panics if the population is empty.
    pub fn champion(&self) -> &Genome {
        self.species
            .iter()
            .flat_map(|s| &s.genomes)
            .max_by(|g1, g2| {
                g1.fitness()
                    .partial_cmp(&g2.fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
            })
            .expect("empty population has no champion")
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|s| &s.genomes)
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the number of matings that fell back to cloning
    /// the fitter parent during the last reproduction phase.
    pub fn mating_fallbacks(&self) -> usize {
        self.mating_fallbacks
    }

    /// Returns the number of genomes whose compilation failed
    /// during the last fitness evaluation.
    pub fn compilation_failures(&self) -> usize {
        self.compilation_failures
    }
}

/// Rounds all values to positive whole numbers
/// while preserving their order and sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f32]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f32>().round() as usize;
    let mut truncated: Vec<(usize, usize, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            let e = f - u;
            (i, u as usize, e)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder: usize = total_sum - truncated_sum;
    // Sort in decreasing order of error
    truncated.sort_unstable_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::GateKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn test_configs() -> (PopulationConfig, GeneticConfig) {
        (
            PopulationConfig {
                size: NonZeroUsize::new(30).unwrap(),
                distance_threshold: 0.9,
                elitism: 1,
                survival_threshold: 0.5,
                sexual_reproduction_chance: 0.6,
                interspecies_mating_chance: 0.01,
                stagnation_threshold: NonZeroUsize::new(10).unwrap(),
            },
            GeneticConfig {
                input_count: NonZeroUsize::new(2).unwrap(),
                output_count: NonZeroUsize::new(1).unwrap(),
                gate_kinds: vec![GateKind::And, GateKind::Or, GateKind::Xor],
                initial_expression_chance: 1.0,
                connection_addition_mutation_chance: 0.2,
                node_addition_mutation_chance: 0.05,
                gate_mutation_chance: 0.1,
                enable_toggle_mutation_chance: 0.05,
                max_connection_mutation_attempts: 20,
                disabled_gene_inheritance_chance: 0.75,
                excess_gene_factor: 1.0,
                disjoint_gene_factor: 1.0,
                gate_difference_factor: 0.4,
                ..GeneticConfig::zero()
            },
        )
    }

    #[test]
    fn round_retain_sum_preserves_total() {
        let v = [
            5.2,
            9.5,
            2.8,
            1.3,
            2.2,
            2.7,
            6.3,
            1.0000000000001,
            0.9999999999999,
        ];
        let w = super::round_retain_sum(&v);
        assert_eq!(v.iter().sum::<f32>(), w.iter().sum::<usize>() as f32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
    }

    #[test]
    fn population_size_is_invariant_across_generations() {
        let (pop_cfg, gen_cfg) = test_configs();
        let size = pop_cfg.size.get();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

        for _ in 0..25 {
            population.evaluate_fitness(|network| {
                let output = network.evaluate(&[true, false]).unwrap()[0];
                (if output { 2.0 } else { 1.0 }, false)
            });
            population.evolve(&mut rng).unwrap();
            assert_eq!(population.genomes().count(), size);
        }
    }

    #[test]
    fn degenerate_population_is_reported() {
        let (pop_cfg, gen_cfg) = test_configs();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

        population.evaluate_fitness(|_| (0.0, false));
        assert_eq!(
            population.evolve(&mut rng),
            Err(OffspringAllotmentError::DegeneratePopulation)
        );
    }

    #[test]
    fn speciation_is_idempotent_within_a_generation() {
        let (pop_cfg, gen_cfg) = test_configs();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

        for _ in 0..5 {
            population.evaluate_fitness(|network| {
                (network.depth() as f32 + 1.0, false)
            });
            population.evolve(&mut rng).unwrap();
        }

        let membership = |population: &Population| -> Vec<(SpeciesID, usize)> {
            population
                .species()
                .map(|s| (s.id(), s.genomes().count()))
                .collect()
        };

        let before = membership(&population);
        population.respeciate_all();
        population.remove_extinct_species();
        assert_eq!(before, membership(&population));
    }

    #[test]
    fn champion_has_maximum_fitness() {
        let (pop_cfg, gen_cfg) = test_configs();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

        population.evaluate_fitness(|network| (network.evaluate(&[true, true]).unwrap().len() as f32, false));
        let best = population.champion().fitness();
        assert!(population.genomes().all(|g| g.fitness() <= best));
    }

    #[test]
    fn solved_latch_reflects_last_evaluation() {
        let (pop_cfg, gen_cfg) = test_configs();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut population = Population::new(pop_cfg, gen_cfg, &mut rng);

        population.evaluate_fitness(|_| (1.0, false));
        assert!(!population.solved());
        population.evaluate_fitness(|_| (1.0, true));
        assert!(population.solved());
    }
}
