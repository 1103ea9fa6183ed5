// ============================================================================
// genome.rs — GeneLife
// Heritable per-cell rules: random creation, crossover, mutation and fitness.
// Every stochastic operator takes the caller's RNG so runs can be seeded.
// ============================================================================

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// RGB color; `u8` channels keep every color inside [0,255]³.
pub type Rgb = [u8; 3];

pub const SURVIVAL_LIMITS: (u8, u8) = (0, 8);
pub const BIRTH_LIMITS: (u8, u8) = (1, 8);
pub const ENERGY_LIMITS: (u16, u16) = (10, 500);

/// Parents whose colors are at least this similar may produce a purified child.
const PURIFY_SIMILARITY: f32 = 0.7;
const PURIFY_SHIFT: i32 = 40;

// ======================== Genome ========================

/// Per-cell rule set. Every cell owns its own copy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Inclusive neighbor-count range for survival.
    pub survival_min: u8,
    pub survival_max: u8,
    /// Neighbor count that makes an empty cell eligible for birth.
    pub birth_count: u8,
    /// Probability that a gene mutates per reproduction event.
    pub mutation_rate: f32,
    pub color: Rgb,
    /// Maximum / starting energy reserve.
    pub energy: u16,
    /// Fraction of neighbor energy extracted per tick.
    pub aggressiveness: f32,
    /// Chance (scaled by 0.1) to ignore death conditions.
    pub resilience: f32,
}

impl Default for Genome {
    /// Classic Conway parameters. Used as the dead-cell placeholder.
    fn default() -> Self {
        Self {
            survival_min: 2,
            survival_max: 3,
            birth_count: 3,
            mutation_rate: 0.05,
            color: [0, 255, 128],
            energy: 100,
            aggressiveness: 0.0,
            resilience: 0.5,
        }
    }
}

impl Genome {
    /// Random genome with a vivid, separable color.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            survival_min: rng.gen_range(1..=3),
            survival_max: rng.gen_range(2..=5),
            birth_count: rng.gen_range(2..=5),
            mutation_rate: rng.gen_range(0.0..0.2),
            color: saturated_color(rng, 180..255, 0..120),
            energy: rng.gen_range(50..150),
            aggressiveness: rng.gen_range(0.0..0.3),
            resilience: rng.gen_range(0.3..0.7),
        }
    }

    /// Random genome carrying a fixed color, as used by pattern presets.
    pub fn random_with_color<R: Rng + ?Sized>(rng: &mut R, color: Rgb) -> Self {
        Self {
            color,
            ..Self::random(rng)
        }
    }

    /// Pull every gene back inside its declared domain.
    pub fn clamped(mut self) -> Self {
        self.survival_min = self.survival_min.clamp(SURVIVAL_LIMITS.0, SURVIVAL_LIMITS.1);
        self.survival_max = self.survival_max.clamp(SURVIVAL_LIMITS.0, SURVIVAL_LIMITS.1);
        self.birth_count = self.birth_count.clamp(BIRTH_LIMITS.0, BIRTH_LIMITS.1);
        self.mutation_rate = self.mutation_rate.clamp(0.0, 1.0);
        self.energy = self.energy.clamp(ENERGY_LIMITS.0, ENERGY_LIMITS.1);
        self.aggressiveness = self.aggressiveness.clamp(0.0, 1.0);
        self.resilience = self.resilience.clamp(0.0, 1.0);
        self
    }

    pub fn survival_range(&self) -> i32 {
        self.survival_max as i32 - self.survival_min as i32 + 1
    }
}

// ======================== Colors ========================

/// One random channel drawn from `dominant`, the other two from `other`.
pub fn saturated_color<R: Rng + ?Sized>(rng: &mut R, dominant: Range<u8>, other: Range<u8>) -> Rgb {
    let boosted = rng.gen_range(0..3);
    let mut color = [0u8; 3];
    for (channel, value) in color.iter_mut().enumerate() {
        *value = if channel == boosted {
            rng.gen_range(dominant.clone())
        } else {
            rng.gen_range(other.clone())
        };
    }
    color
}

/// Manhattan distance in RGB space (0..=765).
pub fn color_distance(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
        .sum()
}

/// 1.0 for identical colors, 0.0 for opposite corners of the RGB cube.
pub fn color_similarity(a: Rgb, b: Rgb) -> f32 {
    1.0 - color_distance(a, b) as f32 / (255.0 * 3.0)
}

/// Floor-average of two colors with the channel contrast pushed apart.
pub fn purify(a: Rgb, b: Rgb) -> Rgb {
    let avg = [
        ((a[0] as u16 + b[0] as u16) / 2) as u8,
        ((a[1] as u16 + b[1] as u16) / 2) as u8,
        ((a[2] as u16 + b[2] as u16) / 2) as u8,
    ];
    let max = *avg.iter().max().unwrap_or(&0);
    let min = *avg.iter().min().unwrap_or(&0);
    avg.map(|c| {
        if c == max {
            shift_channel(c, PURIFY_SHIFT)
        } else if c == min {
            shift_channel(c, -PURIFY_SHIFT)
        } else {
            c
        }
    })
}

/// Per-channel `floor(a * bias + b * (1 - bias))`.
pub fn blend(a: Rgb, b: Rgb, bias: f32) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let mixed = a[i] as f32 * bias + b[i] as f32 * (1.0 - bias);
        out[i] = mixed.floor().clamp(0.0, 255.0) as u8;
    }
    out
}

fn shift_channel(value: u8, delta: i32) -> u8 {
    (value as i32 + delta).clamp(0, 255) as u8
}

// ======================== Crossover ========================

/// How a child's color is derived from its two parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorInheritance {
    /// Take one parent's color wholesale.
    Dominant,
    /// Average the parents and boost channel contrast.
    Purify,
    /// Brand new saturated color.
    Speciate,
    /// Weighted mix with a random bias.
    Blend,
}

impl ColorInheritance {
    /// Branch chosen for a roll in [0,1). Purification needs similar parents;
    /// otherwise its slice of the roll falls through to speciation.
    pub fn select(roll: f32, similarity: f32) -> Self {
        if roll < 0.3 {
            Self::Dominant
        } else if roll < 0.5 && similarity > PURIFY_SIMILARITY {
            Self::Purify
        } else if roll < 0.55 {
            Self::Speciate
        } else {
            Self::Blend
        }
    }
}

/// Child color for an already chosen inheritance branch.
pub fn inherit_color<R: Rng + ?Sized>(a: Rgb, b: Rgb, mode: ColorInheritance, rng: &mut R) -> Rgb {
    match mode {
        ColorInheritance::Dominant => {
            if rng.gen_bool(0.5) {
                a
            } else {
                b
            }
        }
        ColorInheritance::Purify => purify(a, b),
        ColorInheritance::Speciate => saturated_color(rng, 200..255, 0..100),
        ColorInheritance::Blend => blend(a, b, rng.gen_range(0.3..0.7)),
    }
}

/// Sexual reproduction: discrete genes by coin flip, continuous genes averaged.
pub fn crossover<R: Rng + ?Sized>(a: &Genome, b: &Genome, rng: &mut R) -> Genome {
    let similarity = color_similarity(a.color, b.color);
    let mode = ColorInheritance::select(rng.gen(), similarity);
    let color = inherit_color(a.color, b.color, mode, rng);

    Genome {
        survival_min: pick(rng, a.survival_min, b.survival_min),
        survival_max: pick(rng, a.survival_max, b.survival_max),
        birth_count: pick(rng, a.birth_count, b.birth_count),
        mutation_rate: (a.mutation_rate + b.mutation_rate) / 2.0,
        color,
        energy: ((a.energy as u32 + b.energy as u32) / 2) as u16,
        aggressiveness: (a.aggressiveness + b.aggressiveness) / 2.0,
        resilience: (a.resilience + b.resilience) / 2.0,
    }
    .clamped()
}

fn pick<T, R: Rng + ?Sized>(rng: &mut R, a: T, b: T) -> T {
    if rng.gen_bool(0.5) {
        a
    } else {
        b
    }
}

// ======================== Mutation ========================

/// Genes eligible for point mutation, drawn uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gene {
    SurvivalMin,
    SurvivalMax,
    BirthCount,
    MutationRate,
    Color,
    Energy,
    Aggressiveness,
    Resilience,
}

impl Gene {
    pub const ALL: [Gene; 8] = [
        Gene::SurvivalMin,
        Gene::SurvivalMax,
        Gene::BirthCount,
        Gene::MutationRate,
        Gene::Color,
        Gene::Energy,
        Gene::Aggressiveness,
        Gene::Resilience,
    ];
}

/// Returns a copy of `genome` with at most one gene perturbed. The chance of a
/// mutation is `min(1, mutation_rate * multiplier)`; habitats supply the multiplier.
pub fn mutate<R: Rng + ?Sized>(genome: &Genome, multiplier: f32, rng: &mut R) -> Genome {
    let mut mutated = *genome;
    let effective_rate = (genome.mutation_rate * multiplier).clamp(0.0, 1.0);
    if rng.gen::<f32>() >= effective_rate {
        return mutated;
    }

    let gene = Gene::ALL[rng.gen_range(0..Gene::ALL.len())];
    match gene {
        Gene::SurvivalMin => {
            mutated.survival_min = nudge(mutated.survival_min, rng.gen_range(-1..=1), SURVIVAL_LIMITS);
        }
        Gene::SurvivalMax => {
            mutated.survival_max = nudge(mutated.survival_max, rng.gen_range(-1..=1), SURVIVAL_LIMITS);
        }
        Gene::BirthCount => {
            mutated.birth_count = nudge(mutated.birth_count, rng.gen_range(-1..=1), BIRTH_LIMITS);
        }
        Gene::MutationRate => {
            mutated.mutation_rate = (mutated.mutation_rate + rng.gen_range(-0.05..=0.05)).clamp(0.0, 1.0);
        }
        Gene::Color => mutate_color(&mut mutated.color, rng),
        Gene::Energy => {
            let energy = mutated.energy as i32 + rng.gen_range(-20..=20);
            mutated.energy = energy.clamp(ENERGY_LIMITS.0 as i32, ENERGY_LIMITS.1 as i32) as u16;
        }
        Gene::Aggressiveness => {
            mutated.aggressiveness = (mutated.aggressiveness + rng.gen_range(-0.1..=0.1)).clamp(0.0, 1.0);
        }
        Gene::Resilience => {
            mutated.resilience = (mutated.resilience + rng.gen_range(-0.1..=0.1)).clamp(0.0, 1.0);
        }
    }
    mutated
}

fn nudge(value: u8, delta: i32, limits: (u8, u8)) -> u8 {
    (value as i32 + delta).clamp(limits.0 as i32, limits.1 as i32) as u8
}

fn mutate_color<R: Rng + ?Sized>(color: &mut Rgb, rng: &mut R) {
    if rng.gen::<f32>() < 0.3 {
        // Re-saturate toward a pure hue.
        let dominant = rng.gen_range(0..3);
        let boost = rng.gen_range(50..100);
        for (channel, value) in color.iter_mut().enumerate() {
            *value = if channel == dominant {
                shift_channel(*value, boost)
            } else {
                shift_channel(*value, -30)
            };
        }
    } else {
        let channel = rng.gen_range(0..3);
        color[channel] = shift_channel(color[channel], rng.gen_range(-30..=30));
    }
}

// ======================== Fitness ========================

/// Display-only composite score; the transition rule never reads it.
pub fn fitness(genome: &Genome) -> f32 {
    let survival_range = genome.survival_range() as f32;
    let energy_score = genome.energy as f32 / 100.0;
    (survival_range * 10.0 + energy_score * 50.0 + genome.resilience * 40.0) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_in_domain(g: &Genome) {
        assert!(g.survival_min <= 8, "survival_min {}", g.survival_min);
        assert!(g.survival_max <= 8, "survival_max {}", g.survival_max);
        assert!((1..=8).contains(&g.birth_count), "birth_count {}", g.birth_count);
        assert!((0.0..=1.0).contains(&g.mutation_rate), "mutation_rate {}", g.mutation_rate);
        assert!((10..=500).contains(&g.energy), "energy {}", g.energy);
        assert!((0.0..=1.0).contains(&g.aggressiveness));
        assert!((0.0..=1.0).contains(&g.resilience));
    }

    #[test]
    fn default_genome_is_classic_life() {
        let g = Genome::default();
        assert_eq!((g.survival_min, g.survival_max, g.birth_count), (2, 3, 3));
        assert_eq!(g.energy, 100);
        assert_eq!(g.aggressiveness, 0.0);
        assert!((fitness(&g) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn random_genomes_respect_creation_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..2_000 {
            let g = Genome::random(&mut rng);
            assert!((1..=3).contains(&g.survival_min));
            assert!((2..=5).contains(&g.survival_max));
            assert!((2..=5).contains(&g.birth_count));
            assert!(g.mutation_rate < 0.2);
            assert!((50..150).contains(&g.energy));
            assert!(g.aggressiveness < 0.3);
            assert!((0.3..0.7).contains(&g.resilience));
            let vivid = g.color.iter().filter(|&&c| c >= 180).count();
            let muted = g.color.iter().filter(|&&c| c < 120).count();
            assert_eq!((vivid, muted), (1, 2), "color {:?}", g.color);
        }
    }

    #[test]
    fn mutation_never_leaves_gene_domains() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let low = Genome {
            survival_min: 0,
            survival_max: 0,
            birth_count: 1,
            mutation_rate: 1.0,
            color: [0, 0, 0],
            energy: 10,
            aggressiveness: 0.0,
            resilience: 0.0,
        };
        let high = Genome {
            survival_min: 8,
            survival_max: 8,
            birth_count: 8,
            mutation_rate: 1.0,
            color: [255, 255, 255],
            energy: 500,
            aggressiveness: 1.0,
            resilience: 1.0,
        };
        let mut a = low;
        let mut b = high;
        for i in 0..10_000 {
            a = mutate(&a, 3.0, &mut rng);
            b = mutate(&b, 3.0, &mut rng);
            assert_in_domain(&a);
            assert_in_domain(&b);
            if i % 500 == 0 {
                // Re-anchor at the boundaries so both edges stay exercised.
                a = Genome { mutation_rate: 1.0, ..low };
                b = Genome { mutation_rate: 1.0, ..high };
            }
        }
    }

    #[test]
    fn mutation_changes_at_most_one_gene() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let base = Genome {
            mutation_rate: 1.0,
            ..Genome::default()
        };
        for _ in 0..1_000 {
            let m = mutate(&base, 1.0, &mut rng);
            let changed = [
                m.survival_min != base.survival_min,
                m.survival_max != base.survival_max,
                m.birth_count != base.birth_count,
                m.mutation_rate != base.mutation_rate,
                m.color != base.color,
                m.energy != base.energy,
                m.aggressiveness != base.aggressiveness,
                m.resilience != base.resilience,
            ]
            .iter()
            .filter(|&&c| c)
            .count();
            assert!(changed <= 1);
        }
    }

    #[test]
    fn zero_rate_never_mutates() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let base = Genome {
            mutation_rate: 0.0,
            ..Genome::default()
        };
        for _ in 0..1_000 {
            assert_eq!(mutate(&base, 3.0, &mut rng), base);
        }
    }

    #[test]
    fn color_inheritance_branches_follow_roll_thresholds() {
        assert_eq!(ColorInheritance::select(0.0, 1.0), ColorInheritance::Dominant);
        assert_eq!(ColorInheritance::select(0.29, 0.0), ColorInheritance::Dominant);
        assert_eq!(ColorInheritance::select(0.3, 0.9), ColorInheritance::Purify);
        assert_eq!(ColorInheritance::select(0.49, 0.71), ColorInheritance::Purify);
        assert_eq!(ColorInheritance::select(0.4, 0.5), ColorInheritance::Speciate);
        assert_eq!(ColorInheritance::select(0.52, 0.9), ColorInheritance::Speciate);
        assert_eq!(ColorInheritance::select(0.55, 0.9), ColorInheritance::Blend);
        assert_eq!(ColorInheritance::select(0.99, 0.1), ColorInheritance::Blend);
    }

    #[test]
    fn purify_boosts_contrast_of_average() {
        // avg = (200, 40, 100) -> max +40, min -40
        assert_eq!(purify([220, 60, 90], [180, 20, 110]), [240, 0, 100]);
        // clamps at both ends
        assert_eq!(purify([250, 10, 128], [240, 20, 128]), [255, 0, 128]);
    }

    #[test]
    fn blend_floors_weighted_mix() {
        assert_eq!(blend([100, 0, 255], [0, 100, 55], 0.25), [25, 75, 105]);
        assert_eq!(blend([255, 255, 255], [0, 0, 0], 0.5), [127, 127, 127]);
    }

    #[test]
    fn each_inheritance_branch_reproduces_its_arithmetic() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let a = [240, 40, 30];
        let b = [200, 60, 50];

        for _ in 0..200 {
            let c = inherit_color(a, b, ColorInheritance::Dominant, &mut rng);
            assert!(c == a || c == b);

            assert_eq!(inherit_color(a, b, ColorInheritance::Purify, &mut rng), purify(a, b));

            let s = inherit_color(a, b, ColorInheritance::Speciate, &mut rng);
            assert_eq!(s.iter().filter(|&&v| v >= 200).count(), 1);
            assert_eq!(s.iter().filter(|&&v| v < 100).count(), 2);

            let m = inherit_color(a, b, ColorInheritance::Blend, &mut rng);
            let lo = blend(a, b, 0.3);
            let hi = blend(a, b, 0.7);
            for i in 0..3 {
                let (min, max) = (lo[i].min(hi[i]), lo[i].max(hi[i]));
                assert!((min..=max).contains(&m[i]), "channel {} = {} outside {}..={}", i, m[i], min, max);
            }
        }
    }

    #[test]
    fn crossover_averages_continuous_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = Genome {
            mutation_rate: 0.1,
            energy: 101,
            aggressiveness: 0.2,
            resilience: 0.4,
            ..Genome::default()
        };
        let b = Genome {
            survival_min: 1,
            survival_max: 5,
            birth_count: 4,
            mutation_rate: 0.3,
            energy: 200,
            aggressiveness: 0.0,
            resilience: 0.8,
            color: [255, 0, 0],
        };
        for _ in 0..100 {
            let child = crossover(&a, &b, &mut rng);
            assert!((child.mutation_rate - 0.2).abs() < 1e-6);
            assert_eq!(child.energy, 150);
            assert!((child.aggressiveness - 0.1).abs() < 1e-6);
            assert!((child.resilience - 0.6).abs() < 1e-6);
            assert!(child.survival_min == a.survival_min || child.survival_min == b.survival_min);
            assert!(child.survival_max == a.survival_max || child.survival_max == b.survival_max);
            assert!(child.birth_count == a.birth_count || child.birth_count == b.birth_count);
        }
    }

    #[test]
    fn similarity_spans_unit_interval() {
        assert_eq!(color_similarity([10, 20, 30], [10, 20, 30]), 1.0);
        assert_eq!(color_similarity([0, 0, 0], [255, 255, 255]), 0.0);
        assert_eq!(color_distance([250, 0, 0], [0, 0, 250]), 500);
    }
}
