// ============================================================================
// world.rs — GeneLife
// World: owns the toroidal grid, habitat map and RNG; seeds it, advances it one
// generation at a time and tracks dominance / catastrophe state.
// ============================================================================

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catastrophe::{Catastrophe, CatastropheEvent};
use crate::config::{validate_dimensions, ConfigError, WorldConfig};
use crate::genome::{color_distance, crossover, mutate, Genome, Rgb};
use crate::grid::{Cell, Grid};
use crate::habitat::{HabitatMap, HabitatModifiers};
use crate::metrics::WorldStats;
use crate::presets::Preset;

// ======================== Constants ========================

/// Dominant color moving this far (Manhattan) from the baseline breaks the streak.
pub const DOMINANCE_SHIFT_DISTANCE: u32 = 60;
/// Streak length before catastrophes become possible.
pub const CATASTROPHE_MIN_STREAK: u32 = 150;
/// Population must exceed this for a natural catastrophe.
pub const CATASTROPHE_MIN_POPULATION: usize = 500;
/// Birth always succeeds at this neighbor count, whatever the genomes say.
pub const CLASSIC_BIRTH_COUNT: usize = 3;

const CLUSTER_COUNT: std::ops::Range<usize> = 12..20;
const CLUSTER_RADIUS: std::ops::Range<usize> = 8..14;
const CLUSTER_ADOPTION: f32 = 0.85;
const CLUSTER_COLOR_JITTER: i32 = 20;

/// Chance per tick of a natural catastrophe once the gates are passed.
pub fn catastrophe_probability(streak: u32) -> f64 {
    (0.005 + (streak / 100) as f64 * 0.01).min(0.10)
}

// ======================== World ========================

pub struct World {
    config: WorldConfig,
    grid: Grid,
    habitats: HabitatMap,
    generation: u64,
    stats: WorldStats,
    dominance_streak: u32,
    baseline_color: Rgb,
    catastrophe_history: Vec<CatastropheEvent>,
    rng: ChaCha8Rng,
}

impl World {
    /// Validates the config and builds an all-dead world.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let habitats =
            HabitatMap::generate(config.width, config.height, config.habitat_layout, &mut rng);
        let stats = WorldStats::default();
        Ok(Self {
            grid: Grid::new(config.width, config.height),
            habitats,
            generation: 0,
            baseline_color: stats.dominant_color,
            stats,
            dominance_streak: 0,
            catastrophe_history: Vec::new(),
            rng,
            config,
        })
    }

    /// Reset to generation 0 and seed from `preset`. The random preset, or a
    /// preset that yields no cells, falls back to clustered seeding.
    pub fn initialize(&mut self, preset: Preset) {
        let (width, height) = (self.config.width, self.config.height);
        self.grid = Grid::new(width, height);
        self.generation = 0;
        self.dominance_streak = 0;
        self.catastrophe_history.clear();
        self.stats = WorldStats::default();

        let cells = preset.generate(width, height, self.config.initial_density, &mut self.rng);
        if cells.is_empty() {
            self.seed_clusters();
        } else {
            for placed in cells {
                let genome = placed.genome.clamped();
                self.grid
                    .set(placed.x, placed.y, Cell::newborn(genome, genome.energy as f32, 0));
            }
        }

        self.recompute_stats();
        self.baseline_color = self.stats.dominant_color;
        log::info!(
            "World initialized: {}x{} preset={} population={} dominant={:?}",
            width,
            height,
            preset.id(),
            self.stats.population,
            self.stats.dominant_color
        );
    }

    /// Groups of related genomes scattered over the grid, with unrelated
    /// random genomes filling the gaps.
    fn seed_clusters(&mut self) {
        let grid = &mut self.grid;
        let rng = &mut self.rng;
        let (width, height) = (grid.width(), grid.height());
        let density = self.config.initial_density;

        let radius = rng.gen_range(CLUSTER_RADIUS) as f32;
        let clusters: Vec<((usize, usize), Genome)> = (0..rng.gen_range(CLUSTER_COUNT))
            .map(|_| {
                let center = (rng.gen_range(0..width), rng.gen_range(0..height));
                (center, Genome::random(rng))
            })
            .collect();

        for y in 0..height {
            for x in 0..width {
                if rng.gen::<f32>() >= density {
                    continue;
                }
                let nearest = clusters
                    .iter()
                    .map(|(center, genome)| (grid.toroidal_distance((x, y), *center), genome))
                    .min_by(|a, b| a.0.total_cmp(&b.0));

                let genome = match nearest {
                    Some((dist, genome))
                        if dist < radius
                            && rng.gen::<f32>() < (1.0 - dist / radius).powi(2) * CLUSTER_ADOPTION =>
                    {
                        jitter_color(genome, rng)
                    }
                    _ => Genome::random(rng),
                };
                grid.set(x, y, Cell::newborn(genome, genome.energy as f32, 0));
            }
        }
    }

    // ======================== Transition ========================

    /// Advance one generation. Returns the natural catastrophe it triggered, if any.
    pub fn tick(&mut self) -> Option<CatastropheEvent> {
        let (width, height) = (self.grid.width(), self.grid.height());
        let mut next = Grid::new(width, height);
        let mut births = 0usize;
        let mut deaths = 0usize;
        let mut neighbors: Vec<&Cell> = Vec::with_capacity(8);

        for y in 0..height {
            for x in 0..width {
                let Some(cell) = self.grid.get(x, y) else {
                    continue;
                };
                neighbors.clear();
                neighbors.extend(
                    self.grid
                        .neighbor_coords(x, y)
                        .iter()
                        .filter_map(|&(nx, ny)| self.grid.get(nx, ny))
                        .filter(|n| n.alive),
                );
                let modifiers = self.habitats.modifiers_at(x, y);

                let outcome = if cell.alive {
                    let survivor = advance_alive(cell, neighbors.len(), modifiers, &mut self.rng);
                    if survivor.is_none() {
                        deaths += 1;
                    }
                    survivor
                } else {
                    let child = try_birth(&mut neighbors, modifiers, self.generation, &mut self.rng);
                    if child.is_some() {
                        births += 1;
                    }
                    child
                };

                if let Some(cell) = outcome {
                    next.set(x, y, cell);
                }
            }
        }

        self.grid = next;
        self.generation += 1;
        self.stats.births = births;
        self.stats.deaths = deaths;
        self.recompute_stats();
        log::debug!(
            "gen {}: pop={} births={} deaths={} avg_energy={:.1} dominant={:?}",
            self.generation,
            self.stats.population,
            births,
            deaths,
            self.stats.avg_energy,
            self.stats.dominant_color
        );

        self.check_catastrophe()
    }

    // ======================== Catastrophes ========================

    /// Update the dominance streak and roll for a natural catastrophe.
    pub fn check_catastrophe(&mut self) -> Option<CatastropheEvent> {
        let current = self.stats.dominant_color;
        if color_distance(current, self.baseline_color) < DOMINANCE_SHIFT_DISTANCE {
            self.dominance_streak += 1;
        } else {
            self.dominance_streak = 0;
            self.baseline_color = current;
        }

        if self.dominance_streak < CATASTROPHE_MIN_STREAK
            || self.stats.population <= CATASTROPHE_MIN_POPULATION
        {
            return None;
        }
        if !self.rng.gen_bool(catastrophe_probability(self.dominance_streak)) {
            return None;
        }
        let kind = Catastrophe::random(&mut self.rng);
        Some(self.trigger_catastrophe(kind))
    }

    /// Apply `kind` now against the current dominant color.
    pub fn trigger_catastrophe(&mut self, kind: Catastrophe) -> CatastropheEvent {
        let dominant = self.stats.dominant_color;
        let affected = kind.apply(&mut self.grid, dominant, &mut self.rng);
        let event = CatastropheEvent {
            generation: self.generation,
            catastrophe: kind,
            affected,
            dominant_color: dominant,
        };
        log::info!(
            "Catastrophe at gen {}: {} hit {} cells (dominant {:?}, streak {})",
            self.generation,
            kind.name(),
            affected,
            dominant,
            self.dominance_streak
        );
        self.catastrophe_history.push(event.clone());
        self.dominance_streak = 0;
        self.recompute_stats();
        event
    }

    /// Rescan the grid. Births and deaths of the last tick are kept.
    pub fn recompute_stats(&mut self) {
        self.stats.refresh(&self.grid, self.generation);
    }

    // ======================== Editing ========================

    /// Alive with a fresh random genome, or dead. Out-of-bounds is ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool) {
        if !self.grid.contains(x, y) {
            return;
        }
        let cell = if alive {
            let genome = Genome::random(&mut self.rng);
            Cell::newborn(genome, genome.energy as f32, self.generation)
        } else {
            Cell::dead()
        };
        self.grid.set(x, y, cell);
    }

    /// Alive cell carrying `genome`. Out-of-bounds is ignored.
    pub fn place_cell(&mut self, x: usize, y: usize, genome: Genome) {
        let genome = genome.clamped();
        self.grid
            .set(x, y, Cell::newborn(genome, genome.energy as f32, self.generation));
    }

    /// Kill everything and rewind to generation 0. History is kept.
    pub fn clear(&mut self) {
        self.grid = Grid::new(self.config.width, self.config.height);
        self.generation = 0;
        self.stats = WorldStats::default();
        self.dominance_streak = 0;
        self.baseline_color = self.stats.dominant_color;
    }

    /// New empty grid and habitat map. Streak, baseline and catastrophe
    /// history are reset along with the grid.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), ConfigError> {
        validate_dimensions(width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.habitats =
            HabitatMap::generate(width, height, self.config.habitat_layout, &mut self.rng);
        self.catastrophe_history.clear();
        self.clear();
        log::info!("World resized to {}x{}", width, height);
        Ok(())
    }

    // ======================== Accessors ========================

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> WorldStats {
        self.stats.clone()
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn habitats(&self) -> &HabitatMap {
        &self.habitats
    }

    pub fn last_catastrophe(&self) -> Option<&CatastropheEvent> {
        self.catastrophe_history.last()
    }

    pub fn catastrophe_history(&self) -> Vec<CatastropheEvent> {
        self.catastrophe_history.clone()
    }

    pub fn dominance_streak(&self) -> u32 {
        self.dominance_streak
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }
}

// ======================== Cell Rules ========================

/// Next state of a live cell, `None` when it dies.
fn advance_alive<R: Rng + ?Sized>(
    cell: &Cell,
    alive_neighbors: usize,
    modifiers: HabitatModifiers,
    rng: &mut R,
) -> Option<Cell> {
    if cell.current_energy <= 0.0 {
        return None;
    }
    let genome = &cell.genome;
    let count = alive_neighbors as i32;
    let low = genome.survival_min as i32 + modifiers.survival_modifier;
    let high = genome.survival_max as i32 + modifiers.survival_modifier;

    let mut next = cell.clone();
    next.age += 1;
    if (low..=high).contains(&count) {
        let max_energy = genome.energy as f32 * modifiers.energy_multiplier;
        let gained = genome.aggressiveness * alive_neighbors as f32 * 0.5;
        next.current_energy = (cell.current_energy - 1.0 + gained).min(max_energy);
        Some(next)
    } else if rng.gen::<f32>() < genome.resilience * 0.1 {
        next.current_energy = cell.current_energy - 2.0;
        Some(next)
    } else {
        None
    }
}

/// Child for an empty cell, if its live neighbors agree on a birth.
fn try_birth<R: Rng + ?Sized>(
    parents: &mut [&Cell],
    modifiers: HabitatModifiers,
    generation: u64,
    rng: &mut R,
) -> Option<Cell> {
    if parents.is_empty() {
        return None;
    }
    let count = parents.len();
    let mean_birth = parents.iter().map(|c| c.genome.birth_count as f32).sum::<f32>() / count as f32;
    let target = mean_birth.round() as i32 + modifiers.birth_modifier;
    if count as i32 != target && count != CLASSIC_BIRTH_COUNT {
        return None;
    }

    let (chosen, _) = parents.partial_shuffle(rng, 2);
    let inherited = match chosen {
        [a, b] => crossover(&a.genome, &b.genome, rng),
        [a] => a.genome,
        _ => return None,
    };
    let genome = mutate(&inherited, modifiers.mutation_multiplier, rng);
    let energy = genome.energy as f32 * modifiers.energy_multiplier;
    Some(Cell::newborn(genome, energy, generation))
}

/// Copy of `genome` with every color channel shifted by up to ±20.
fn jitter_color<R: Rng + ?Sized>(genome: &Genome, rng: &mut R) -> Genome {
    let mut jittered = *genome;
    for channel in jittered.color.iter_mut() {
        let shifted = *channel as i32 + rng.gen_range(-CLUSTER_COLOR_JITTER..=CLUSTER_COLOR_JITTER);
        *channel = shifted.clamp(0, 255) as u8;
    }
    jittered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habitat::HabitatLayout;

    fn config(width: usize, height: usize, layout: HabitatLayout) -> WorldConfig {
        WorldConfig {
            width,
            height,
            habitat_layout: layout,
            seed: Some(7),
            ..WorldConfig::default()
        }
    }

    /// Deterministic classic-Life genome.
    fn still_genome() -> Genome {
        Genome {
            mutation_rate: 0.0,
            resilience: 0.0,
            ..Genome::default()
        }
    }

    fn place_block(world: &mut World, x: usize, y: usize, genome: Genome) {
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            world.place_cell(x + dx, y + dy, genome);
        }
    }

    #[test]
    fn probability_steps_per_hundred_and_caps() {
        assert!((catastrophe_probability(150) - 0.015).abs() < 1e-12);
        assert!((catastrophe_probability(199) - 0.015).abs() < 1e-12);
        assert!((catastrophe_probability(200) - 0.025).abs() < 1e-12);
        assert!((catastrophe_probability(5_000) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let bad = WorldConfig {
            width: 0,
            ..WorldConfig::default()
        };
        assert_eq!(World::new(bad).err(), Some(ConfigError::ZeroWidth));
    }

    #[test]
    fn out_of_bounds_edits_are_ignored() {
        let mut world = World::new(config(10, 10, HabitatLayout::Uniform)).unwrap();
        world.set_cell(10, 3, true);
        world.place_cell(3, 99, Genome::default());
        world.recompute_stats();
        assert_eq!(world.stats().population, 0);
        world.set_cell(9, 9, true);
        assert!(world.cell(9, 9).map_or(false, |c| c.alive));
    }

    #[test]
    fn random_seeding_honours_density_extremes() {
        let full = WorldConfig {
            initial_density: 1.0,
            ..config(40, 30, HabitatLayout::Zones)
        };
        let mut world = World::new(full).unwrap();
        world.initialize(Preset::Random);
        assert_eq!(world.stats().population, 1_200);
        assert_eq!(world.generation(), 0);
        assert_eq!(world.stats().dominant_color, world.baseline_color);

        let empty = WorldConfig {
            initial_density: 0.0,
            ..config(40, 30, HabitatLayout::Zones)
        };
        let mut world = World::new(empty).unwrap();
        world.initialize(Preset::Random);
        assert_eq!(world.stats().population, 0);
    }

    #[test]
    fn pattern_preset_places_only_its_cells() {
        let cfg = WorldConfig {
            initial_density: 1.0,
            ..config(100, 100, HabitatLayout::Zones)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let expected = Preset::Cross.generate(100, 100, 1.0, &mut rng).len();

        let mut world = World::new(cfg).unwrap();
        world.initialize(Preset::Cross);
        assert_eq!(world.stats().population, expected);
        // Corners lie outside every arm.
        assert!(!world.cell(0, 0).map_or(true, |c| c.alive));
    }

    #[test]
    fn same_seed_gives_same_history() {
        let cfg = WorldConfig {
            seed: Some(42),
            ..config(48, 32, HabitatLayout::Zones)
        };
        let mut a = World::new(cfg.clone()).unwrap();
        let mut b = World::new(cfg).unwrap();
        a.initialize(Preset::Random);
        b.initialize(Preset::Random);
        for _ in 0..15 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn surviving_energy_is_capped_at_genome_maximum() {
        let mut world = World::new(config(10, 10, HabitatLayout::Uniform)).unwrap();
        let hungry = Genome {
            aggressiveness: 1.0,
            ..still_genome()
        };
        place_block(&mut world, 4, 4, hungry);
        world.tick();
        assert_eq!(world.stats().population, 4);
        // 100 - 1 + 1.0 * 3 * 0.5 would overshoot 100.
        assert_eq!(world.cell(4, 4).map(|c| c.current_energy), Some(100.0));
        assert_eq!(world.cell(4, 4).map(|c| c.age), Some(1));
    }

    #[test]
    fn desert_shifts_survival_below_a_block() {
        // Bottom-right quadrant of a zoned 200x120 map is desert.
        let mut world = World::new(config(200, 120, HabitatLayout::Zones)).unwrap();
        place_block(&mut world, 190, 110, still_genome());
        world.tick();
        assert_eq!(world.stats().population, 0);
        assert_eq!(world.stats().deaths, 4);
    }

    #[test]
    fn volcanic_block_survives_with_shifted_window() {
        // Bottom-left quadrant is volcanic: survival window [3, 4].
        let mut world = World::new(config(200, 120, HabitatLayout::Zones)).unwrap();
        place_block(&mut world, 5, 110, still_genome());
        for _ in 0..3 {
            world.tick();
        }
        assert_eq!(world.stats().population, 4);
        assert_eq!(world.stats().births, 0);
    }

    #[test]
    fn exhausted_cells_die() {
        let mut world = World::new(config(10, 10, HabitatLayout::Uniform)).unwrap();
        place_block(&mut world, 2, 2, still_genome());
        if let Some(cell) = world.grid.get_mut(2, 2) {
            cell.current_energy = 0.0;
        }
        world.tick();
        assert!(!world.cell(2, 2).map_or(true, |c| c.alive));
        assert_eq!(world.stats().deaths, 1);
    }

    #[test]
    fn newborns_carry_the_birth_generation() {
        let mut world = World::new(config(10, 10, HabitatLayout::Uniform)).unwrap();
        // L-tromino: (3,3) gets three neighbors and is born.
        for (x, y) in [(2, 2), (3, 2), (2, 3)] {
            world.place_cell(x, y, still_genome());
        }
        world.tick();
        let born = world.cell(3, 3).cloned().unwrap();
        assert!(born.alive);
        assert_eq!(born.generation, 0);
        assert_eq!(born.age, 0);
        assert_eq!(born.current_energy, 100.0);
        assert_eq!(world.stats().births, 1);
    }

    #[test]
    fn manual_catastrophe_is_recorded_and_resets_streak() {
        let mut world = World::new(config(20, 20, HabitatLayout::Uniform)).unwrap();
        place_block(&mut world, 5, 5, still_genome());
        for _ in 0..5 {
            world.tick();
        }
        assert_eq!(world.dominance_streak(), 5);

        let event = world.trigger_catastrophe(Catastrophe::IceAge);
        assert_eq!(event.generation, 5);
        // resilience 0 < 0.5
        assert_eq!(event.affected, 4);
        assert_eq!(world.dominance_streak(), 0);
        assert_eq!(world.stats().population, 0);
        assert_eq!(world.last_catastrophe(), Some(&event));
        assert_eq!(world.catastrophe_history().len(), 1);
    }

    #[test]
    fn clear_keeps_history_and_resize_drops_it() {
        let mut world = World::new(config(20, 20, HabitatLayout::Zones)).unwrap();
        world.initialize(Preset::Random);
        world.tick();
        world.trigger_catastrophe(Catastrophe::Meteor);

        world.clear();
        assert_eq!(world.generation(), 0);
        assert_eq!(world.stats().population, 0);
        assert_eq!(world.stats().avg_energy, 0.0);
        assert_eq!(world.catastrophe_history().len(), 1);

        world.resize(30, 12).unwrap();
        assert_eq!((world.width(), world.height()), (30, 12));
        assert_eq!((world.habitats().width(), world.habitats().height()), (30, 12));
        assert!(world.catastrophe_history().is_empty());
        assert_eq!(world.resize(0, 5), Err(ConfigError::ZeroWidth));
        assert_eq!(world.width(), 30);
    }
}
