// ============================================================================
// metrics.rs — GeneLife
// Per-tick world statistics (population, energy, bucketed dominant color) and
// extended diagnostics: color entropy, species count, genome averages.
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::genome::{fitness, Genome, Rgb};
use crate::grid::Grid;
use crate::habitat::{Habitat, HabitatMap};

/// Channel width of one dominant-color bucket.
pub const COLOR_BUCKET_SIZE: u8 = 64;

/// A bucket must hold this share of the population to count as a species.
const SPECIES_MIN_SHARE: f32 = 0.01;

// ======================== World Stats ========================

/// Aggregate state republished after every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldStats {
    pub generation: u64,
    pub population: usize,
    pub births: usize,
    pub deaths: usize,
    pub avg_energy: f32,
    pub avg_mutation_rate: f32,
    pub dominant_color: Rgb,
}

impl Default for WorldStats {
    fn default() -> Self {
        Self {
            generation: 0,
            population: 0,
            births: 0,
            deaths: 0,
            avg_energy: 0.0,
            avg_mutation_rate: 0.0,
            dominant_color: Genome::default().color,
        }
    }
}

impl WorldStats {
    /// Recompute population, averages and dominant color from one scan.
    /// Births and deaths are left to the caller. An empty grid keeps the last
    /// valid averages and dominant color.
    pub fn refresh(&mut self, grid: &Grid, generation: u64) {
        let mut population = 0usize;
        let mut total_energy = 0.0f64;
        let mut total_mutation = 0.0f64;
        let mut histogram = ColorHistogram::default();

        for cell in grid.cells().iter().filter(|c| c.alive) {
            population += 1;
            total_energy += cell.current_energy as f64;
            total_mutation += cell.genome.mutation_rate as f64;
            histogram.add(cell.genome.color);
        }

        self.generation = generation;
        self.population = population;
        if population > 0 {
            self.avg_energy = (total_energy / population as f64) as f32;
            self.avg_mutation_rate = (total_mutation / population as f64) as f32;
            if let Some(color) = histogram.dominant() {
                self.dominant_color = color;
            }
        }
    }
}

// ======================== Color Histogram ========================

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    count: usize,
    sum: [u64; 3],
}

/// Colors quantized into 64-wide buckets per channel.
#[derive(Clone, Debug, Default)]
pub struct ColorHistogram {
    buckets: HashMap<[u8; 3], Bucket>,
    total: usize,
}

impl ColorHistogram {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut histogram = Self::default();
        for cell in grid.cells().iter().filter(|c| c.alive) {
            histogram.add(cell.genome.color);
        }
        histogram
    }

    pub fn bucket_key(color: Rgb) -> [u8; 3] {
        color.map(|c| c / COLOR_BUCKET_SIZE)
    }

    pub fn add(&mut self, color: Rgb) {
        let bucket = self.buckets.entry(Self::bucket_key(color)).or_default();
        bucket.count += 1;
        for (sum, &c) in bucket.sum.iter_mut().zip(color.iter()) {
            *sum += c as u64;
        }
        self.total += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Rounded channel mean of the most populous bucket. Ties go to the
    /// lowest bucket key so the result does not depend on hash order.
    pub fn dominant(&self) -> Option<Rgb> {
        let (_, bucket) = self
            .buckets
            .iter()
            .max_by(|(ka, a), (kb, b)| a.count.cmp(&b.count).then_with(|| kb.cmp(ka)))?;
        let n = bucket.count as u64;
        Some(bucket.sum.map(|s| ((s + n / 2) / n).min(255) as u8))
    }

    /// Shannon entropy (bits) of the bucket distribution.
    pub fn entropy(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f32;
        self.buckets
            .values()
            .map(|b| b.count as f32 / total)
            .filter(|&p| p > 1e-9)
            .map(|p| -p * p.log2())
            .sum()
    }

    /// Buckets holding at least 1% of the population.
    pub fn species_count(&self) -> usize {
        let min = ((self.total as f32 * SPECIES_MIN_SHARE).ceil() as usize).max(1);
        self.buckets.values().filter(|b| b.count >= min).count()
    }
}

// ======================== Diagnostics ========================

/// Averages over the living genomes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenomeStats {
    pub avg_survival_range: f32,
    pub avg_birth_count: f32,
    pub avg_mutation_rate: f32,
    pub avg_aggressiveness: f32,
    pub avg_resilience: f32,
    pub avg_max_energy: f32,
    pub avg_fitness: f32,
    /// Fraction with aggressiveness > 0.5.
    pub predator_fraction: f32,
}

/// Full diagnostics snapshot for one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldDiagnostics {
    pub population: usize,
    pub live_fraction: f32,

    pub avg_energy: f32,
    pub min_energy_live: f32,
    /// Fraction of live cells with energy at or below 5.
    pub starving_fraction: f32,
    pub avg_age: f32,
    pub max_age: u32,

    pub color_entropy: f32,
    pub species_count: usize,
    pub dominant_color: Option<Rgb>,
    pub genome_stats: GenomeStats,

    pub habitat_population: [(Habitat, usize); 6],
}

impl WorldDiagnostics {
    pub fn from_grid(grid: &Grid, habitats: &HabitatMap) -> Self {
        let n = grid.cells().len().max(1);
        let histogram = ColorHistogram::from_grid(grid);

        let mut population = 0usize;
        let mut sum_energy = 0.0f64;
        let mut min_energy_live = f32::MAX;
        let mut starving = 0usize;
        let mut sum_age = 0u64;
        let mut max_age = 0u32;
        let mut habitat_population = Habitat::ALL.map(|h| (h, 0usize));

        let mut sum_range = 0.0f64;
        let mut sum_birth = 0.0f64;
        let mut sum_mut = 0.0f64;
        let mut sum_agg = 0.0f64;
        let mut sum_res = 0.0f64;
        let mut sum_max_energy = 0.0f64;
        let mut sum_fitness = 0.0f64;
        let mut predators = 0usize;

        for (x, y, cell) in grid.iter() {
            if !cell.alive {
                continue;
            }
            population += 1;
            sum_energy += cell.current_energy as f64;
            min_energy_live = min_energy_live.min(cell.current_energy);
            if cell.current_energy <= 5.0 {
                starving += 1;
            }
            sum_age += cell.age as u64;
            max_age = max_age.max(cell.age);

            let habitat = habitats.habitat_at(x, y);
            if let Some(slot) = habitat_population.iter_mut().find(|(h, _)| *h == habitat) {
                slot.1 += 1;
            }

            let g = &cell.genome;
            sum_range += g.survival_range() as f64;
            sum_birth += g.birth_count as f64;
            sum_mut += g.mutation_rate as f64;
            sum_agg += g.aggressiveness as f64;
            sum_res += g.resilience as f64;
            sum_max_energy += g.energy as f64;
            sum_fitness += fitness(g) as f64;
            if g.aggressiveness > 0.5 {
                predators += 1;
            }
        }

        let avg = |sum: f64| {
            if population > 0 {
                (sum / population as f64) as f32
            } else {
                0.0
            }
        };

        let genome_stats = GenomeStats {
            avg_survival_range: avg(sum_range),
            avg_birth_count: avg(sum_birth),
            avg_mutation_rate: avg(sum_mut),
            avg_aggressiveness: avg(sum_agg),
            avg_resilience: avg(sum_res),
            avg_max_energy: avg(sum_max_energy),
            avg_fitness: avg(sum_fitness),
            predator_fraction: avg(predators as f64),
        };

        WorldDiagnostics {
            population,
            live_fraction: population as f32 / n as f32,
            avg_energy: avg(sum_energy),
            min_energy_live: if population > 0 { min_energy_live } else { 0.0 },
            starving_fraction: avg(starving as f64),
            avg_age: avg(sum_age as f64),
            max_age,
            color_entropy: histogram.entropy(),
            species_count: histogram.species_count(),
            dominant_color: histogram.dominant(),
            genome_stats,
            habitat_population,
        }
    }

    /// Log all diagnostics at INFO level, with optional delta from a previous snapshot.
    pub fn log(&self, generation: u64, prev: Option<&WorldDiagnostics>) {
        log::info!(
            "══════════════ Generation {} Diagnostics ══════════════",
            generation
        );

        if let Some(p) = prev {
            let dpop = self.population as i64 - p.population as i64;
            let dmut = self.genome_stats.avg_mutation_rate - p.genome_stats.avg_mutation_rate;
            let dagg = self.genome_stats.avg_aggressiveness - p.genome_stats.avg_aggressiveness;
            log::info!(
                "TRENDS: Δpop={:+} | Δmut={:+.4} | Δagg={:+.4} | Δentropy={:+.2} | Δspecies={:+}",
                dpop,
                dmut,
                dagg,
                self.color_entropy - p.color_entropy,
                self.species_count as i64 - p.species_count as i64,
            );
        }

        log::info!(
            "POPULATION: live={} ({:.1}%) | avg_age={:.1} | max_age={}",
            self.population,
            self.live_fraction * 100.0,
            self.avg_age,
            self.max_age,
        );
        log::info!(
            "ENERGY: avg={:.2} | min_live={:.2} | starving={:.1}%",
            self.avg_energy,
            self.min_energy_live,
            self.starving_fraction * 100.0,
        );
        log::info!(
            "GENETICS: entropy={:.2} bits | species={} | dominant={:?} | predators={:.1}%",
            self.color_entropy,
            self.species_count,
            self.dominant_color,
            self.genome_stats.predator_fraction * 100.0,
        );
        log::info!(
            "GENOME AVG: range={:.2} birth={:.2} mut_rate={:.4} agg={:.3} res={:.3} energy={:.1} fitness={:.3}",
            self.genome_stats.avg_survival_range,
            self.genome_stats.avg_birth_count,
            self.genome_stats.avg_mutation_rate,
            self.genome_stats.avg_aggressiveness,
            self.genome_stats.avg_resilience,
            self.genome_stats.avg_max_energy,
            self.genome_stats.avg_fitness,
        );
        let habitats: Vec<String> = self
            .habitat_population
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(h, n)| format!("{}={}", h.id(), n))
            .collect();
        log::info!("HABITATS: {}", habitats.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::habitat::HabitatLayout;

    fn place(grid: &mut Grid, count: usize, offset: usize, color: Rgb, energy: f32) {
        for i in offset..offset + count {
            let genome = Genome {
                color,
                ..Genome::default()
            };
            grid.set(i % grid.width(), i / grid.width(), Cell::newborn(genome, energy, 0));
        }
    }

    #[test]
    fn dominant_color_is_bucket_mode_not_mean() {
        let mut grid = Grid::new(20, 20);
        place(&mut grid, 60, 0, [250, 0, 0], 10.0);
        place(&mut grid, 40, 60, [0, 0, 250], 10.0);

        let mut stats = WorldStats::default();
        stats.refresh(&grid, 3);
        assert_eq!(stats.population, 100);
        assert_eq!(stats.generation, 3);
        assert_eq!(stats.dominant_color, [250, 0, 0]);
    }

    #[test]
    fn dominant_color_averages_within_its_bucket() {
        let mut grid = Grid::new(10, 10);
        place(&mut grid, 3, 0, [200, 10, 10], 1.0);
        place(&mut grid, 1, 3, [240, 20, 30], 1.0);
        place(&mut grid, 2, 4, [10, 200, 10], 1.0);
        let histogram = ColorHistogram::from_grid(&grid);
        // (3*200 + 240) / 4 = 210, (30 + 20) / 4 = 12.5 -> 13, (30 + 30) / 4 = 15
        assert_eq!(histogram.dominant(), Some([210, 13, 15]));
        assert_eq!(histogram.bucket_count(), 2);
    }

    #[test]
    fn empty_grid_keeps_last_valid_averages() {
        let mut grid = Grid::new(5, 5);
        place(&mut grid, 4, 0, [250, 0, 0], 20.0);
        let mut stats = WorldStats::default();
        stats.refresh(&grid, 1);
        assert_eq!(stats.avg_energy, 20.0);

        let empty = Grid::new(5, 5);
        stats.refresh(&empty, 2);
        assert_eq!(stats.population, 0);
        assert_eq!(stats.avg_energy, 20.0);
        assert_eq!(stats.dominant_color, [250, 0, 0]);
        assert!(!stats.avg_mutation_rate.is_nan());
    }

    #[test]
    fn entropy_and_species_reflect_bucket_spread() {
        let mut grid = Grid::new(10, 10);
        place(&mut grid, 50, 0, [250, 0, 0], 1.0);
        place(&mut grid, 50, 50, [0, 0, 250], 1.0);
        let histogram = ColorHistogram::from_grid(&grid);
        assert!((histogram.entropy() - 1.0).abs() < 1e-5);
        assert_eq!(histogram.species_count(), 2);

        let empty = ColorHistogram::default();
        assert_eq!(empty.entropy(), 0.0);
        assert_eq!(empty.dominant(), None);
    }

    #[test]
    fn diagnostics_count_population_per_habitat() {
        let mut grid = Grid::new(20, 20);
        place(&mut grid, 20, 0, [0, 255, 128], 3.0);
        let habitats =
            HabitatMap::generate(20, 20, HabitatLayout::Uniform, &mut rand::thread_rng());
        let diag = WorldDiagnostics::from_grid(&grid, &habitats);
        assert_eq!(diag.population, 20);
        assert_eq!(diag.habitat_population[0], (Habitat::Temperate, 20));
        assert_eq!(diag.starving_fraction, 1.0);
        assert_eq!(diag.species_count, 1);
        assert!((diag.genome_stats.avg_fitness - 0.9).abs() < 1e-5);
    }
}
