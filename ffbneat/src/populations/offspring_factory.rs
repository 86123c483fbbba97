use crate::genomics::{GeneticConfig, Genome, History};
use crate::populations::{PopulationConfig, Species, SpeciesID};

use rand::prelude::{IteratorRandom, Rng, SliceRandom};

use std::collections::HashMap;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a> {
    species: &'a [Species],
    history: &'a mut History,
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
    mating_fallbacks: usize,
}

impl<'a> OffspringFactory<'a> {
    pub(super) fn new(
        species: &'a [Species],
        history: &'a mut History,
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
            mating_fallbacks: 0,
        }
    }

    /// Generate the allotted offspring. Assumes each species'
    /// members are sorted by decreasing fitness.
    pub(super) fn generate_offspring(
        &mut self,
        allotted_offspring: &[usize],
        rng: &mut impl Rng,
    ) -> HashMap<SpeciesID, Vec<Genome>> {
        let mut offspring_of_species: HashMap<SpeciesID, Vec<Genome>> = self
            .species
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), Vec::with_capacity(allotted_offspring[i])))
            .collect();

        for (species_index, allotted) in allotted_offspring.iter().enumerate() {
            let current_species = &self.species[species_index];
            let elite = current_species
                .count_elite(self.population_config)
                .min(*allotted);
            let offspring = *allotted - elite;

            self.add_species_elite(&mut offspring_of_species, species_index, elite);
            self.add_bred_offspring(&mut offspring_of_species, species_index, offspring, rng);
        }

        offspring_of_species
    }

    /// Returns the number of matings that fell back to
    /// cloning the fitter parent due to misaligned genes.
    pub(super) fn mating_fallbacks(&self) -> usize {
        self.mating_fallbacks
    }

    /// Add the top "elite" members of the species
    /// to the offspring.
    fn add_species_elite(
        &mut self,
        offspring_map: &mut HashMap<SpeciesID, Vec<Genome>>,
        species_index: usize,
        elite: usize,
    ) {
        let species = &self.species[species_index];
        offspring_map
            .get_mut(&species.id())
            .unwrap()
            .extend_from_slice(&species.genomes[0..elite])
    }

    /// Breed the species' remaining allotment: each child is
    /// either a mated pair's offspring or a clone of a single
    /// parent, and then undergoes the mutation pass.
    fn add_bred_offspring(
        &mut self,
        offspring_map: &mut HashMap<SpeciesID, Vec<Genome>>,
        species_index: usize,
        offspring: usize,
        rng: &mut impl Rng,
    ) {
        let species = &self.species[species_index];
        let survivors = species.count_survivors(self.population_config);
        let eligible_parents: Vec<&Genome> = species.genomes[..survivors].iter().collect();

        for _ in 0..offspring {
            let parent1 = *eligible_parents
                .choose(rng)
                .unwrap_or_else(|| panic!("no eligible parents in species {:?}", species.id()));

            let mut child = if rng.gen::<f32>() < self.population_config.sexual_reproduction_chance
            {
                let parent2 = self.choose_second_parent(species, rng);
                match Genome::mate(parent1, parent2, self.genetic_config, rng) {
                    Ok(child) => child,
                    Err(_) => {
                        self.mating_fallbacks += 1;
                        let fitter = if parent2.fitness() > parent1.fitness() {
                            parent2
                        } else {
                            parent1
                        };
                        fitter.clone()
                    }
                }
            } else {
                parent1.clone()
            };
            child.set_fitness(0.0);
            child.mutate_all(self.history, self.genetic_config, rng);

            offspring_map.get_mut(&species.id()).unwrap().push(child);
        }
    }

    /// Choose a second parent from the current species,
    /// or from another randomly selected.
    fn choose_second_parent(
        &self,
        current_species: &'a Species,
        rng: &mut impl Rng,
    ) -> &'a Genome {
        if self.species.len() > 1
            && rng.gen::<f32>() < self.population_config.interspecies_mating_chance
        {
            let other_species = self
                .species
                .iter()
                .filter(|s| s.id() != current_species.id())
                .choose(rng)
                .unwrap();
            other_species.genomes.choose(rng).unwrap_or_else(|| {
                panic!("no eligible parents in species {:?}", other_species.id())
            })
        } else {
            current_species.genomes.choose(rng).unwrap_or_else(|| {
                panic!("no eligible parents in species {:?}", current_species.id())
            })
        }
    }
}
