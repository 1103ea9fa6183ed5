// ============================================================================
// habitat.rs — GeneLife
// Static biome partition of the grid and the rule modifiers each biome applies
// during the transition.
// ============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::Rgb;

/// Fraction of min(width, height) used as the oasis radius.
const OASIS_RADIUS_FRACTION: f32 = 0.22;

/// Horizontal bands of the gradient layout, top to bottom.
const GRADIENT_BANDS: [Habitat; 5] = [
    Habitat::Frozen,
    Habitat::Temperate,
    Habitat::Oasis,
    Habitat::Desert,
    Habitat::Volcanic,
];

// ======================== Habitat ========================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Habitat {
    Temperate,
    Oasis,
    Desert,
    Radioactive,
    Volcanic,
    Frozen,
}

/// Rule adjustments applied to every cell inside a biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HabitatModifiers {
    /// Scales maximum / starting energy.
    pub energy_multiplier: f32,
    /// Scales the effective mutation rate of newborns.
    pub mutation_multiplier: f32,
    /// Added to both survival bounds.
    pub survival_modifier: i32,
    /// Added to the birth target.
    pub birth_modifier: i32,
}

impl HabitatModifiers {
    pub const NEUTRAL: HabitatModifiers = HabitatModifiers {
        energy_multiplier: 1.0,
        mutation_multiplier: 1.0,
        survival_modifier: 0,
        birth_modifier: 0,
    };
}

impl Habitat {
    pub const ALL: [Habitat; 6] = [
        Habitat::Temperate,
        Habitat::Oasis,
        Habitat::Desert,
        Habitat::Radioactive,
        Habitat::Volcanic,
        Habitat::Frozen,
    ];

    pub fn modifiers(self) -> HabitatModifiers {
        match self {
            Self::Temperate => HabitatModifiers::NEUTRAL,
            Self::Oasis => HabitatModifiers {
                energy_multiplier: 1.5,
                mutation_multiplier: 0.5,
                ..HabitatModifiers::NEUTRAL
            },
            Self::Desert => HabitatModifiers {
                energy_multiplier: 0.6,
                mutation_multiplier: 1.2,
                survival_modifier: -1,
                birth_modifier: 0,
            },
            Self::Radioactive => HabitatModifiers {
                energy_multiplier: 0.8,
                mutation_multiplier: 3.0,
                ..HabitatModifiers::NEUTRAL
            },
            Self::Volcanic => HabitatModifiers {
                energy_multiplier: 1.8,
                mutation_multiplier: 1.5,
                survival_modifier: 1,
                birth_modifier: 1,
            },
            Self::Frozen => HabitatModifiers {
                energy_multiplier: 0.7,
                mutation_multiplier: 0.3,
                survival_modifier: -1,
                birth_modifier: -1,
            },
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Temperate => "temperate",
            Self::Oasis => "oasis",
            Self::Desert => "desert",
            Self::Radioactive => "radioactive",
            Self::Volcanic => "volcanic",
            Self::Frozen => "frozen",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Temperate => "Temperate",
            Self::Oasis => "Oasis",
            Self::Desert => "Desert",
            Self::Radioactive => "Radioactive",
            Self::Volcanic => "Volcanic",
            Self::Frozen => "Frozen",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Temperate => "Balanced conditions, standard rules",
            Self::Oasis => "Abundant energy, low mutation",
            Self::Desert => "Scarce energy, strong selective pressure",
            Self::Radioactive => "Extreme mutation, moderate energy",
            Self::Volcanic => "High energy but unstable",
            Self::Frozen => "Slow metabolism, harsh survival",
        }
    }

    /// Dim background tint used when rendering empty cells.
    pub fn background_color(self) -> Rgb {
        match self {
            Self::Temperate => [12, 18, 12],
            Self::Oasis => [12, 18, 25],
            Self::Desert => [20, 15, 8],
            Self::Radioactive => [20, 22, 8],
            Self::Volcanic => [25, 10, 8],
            Self::Frozen => [18, 22, 28],
        }
    }
}

// ======================== Habitat Map ========================

/// How the grid is partitioned into biomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitatLayout {
    /// Oasis disk in the center, one biome per quadrant elsewhere.
    #[default]
    Zones,
    /// Temperate everywhere; reproduces unmodified per-genome rules.
    Uniform,
    /// Five horizontal bands from frozen at the top to volcanic at the bottom.
    Gradient,
    /// Independent biome per cell.
    Random,
}

impl HabitatLayout {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "zones" => Some(Self::Zones),
            "uniform" => Some(Self::Uniform),
            "gradient" => Some(Self::Gradient),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Immutable biome lookup, same dimensions as the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct HabitatMap {
    width: usize,
    height: usize,
    cells: Vec<Habitat>,
}

impl HabitatMap {
    /// Only the random layout draws from `rng`; every other layout is
    /// deterministic given `(width, height, layout)`.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        layout: HabitatLayout,
        rng: &mut R,
    ) -> Self {
        let cells = match layout {
            HabitatLayout::Uniform => vec![Habitat::Temperate; width * height],
            HabitatLayout::Gradient => {
                let mut cells = Vec::with_capacity(width * height);
                for y in 0..height {
                    let band = (y * GRADIENT_BANDS.len() / height).min(GRADIENT_BANDS.len() - 1);
                    cells.extend(std::iter::repeat(GRADIENT_BANDS[band]).take(width));
                }
                cells
            }
            HabitatLayout::Random => (0..width * height)
                .map(|_| Habitat::ALL[rng.gen_range(0..Habitat::ALL.len())])
                .collect(),
            HabitatLayout::Zones => {
                let cx = width as f32 / 2.0;
                let cy = height as f32 / 2.0;
                let radius = OASIS_RADIUS_FRACTION * width.min(height) as f32;

                let mut cells = Vec::with_capacity(width * height);
                for y in 0..height {
                    for x in 0..width {
                        let dx = x as f32 - cx;
                        let dy = y as f32 - cy;
                        let top = (y as f32) < cy;
                        let left = (x as f32) < cx;
                        let habitat = if (dx * dx + dy * dy).sqrt() < radius {
                            Habitat::Oasis
                        } else {
                            match (top, left) {
                                (true, true) => Habitat::Frozen,
                                (true, false) => Habitat::Radioactive,
                                (false, true) => Habitat::Volcanic,
                                (false, false) => Habitat::Desert,
                            }
                        };
                        cells.push(habitat);
                    }
                }
                cells
            }
        };

        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// O(1) lookup; anything outside the map is temperate.
    pub fn habitat_at(&self, x: usize, y: usize) -> Habitat {
        if x >= self.width || y >= self.height {
            return Habitat::Temperate;
        }
        self.cells
            .get(y * self.width + x)
            .copied()
            .unwrap_or(Habitat::Temperate)
    }

    pub fn modifiers_at(&self, x: usize, y: usize) -> HabitatModifiers {
        self.habitat_at(x, y).modifiers()
    }

    /// Cell count per biome, in `Habitat::ALL` order.
    pub fn coverage(&self) -> [(Habitat, usize); 6] {
        Habitat::ALL.map(|h| (h, self.cells.iter().filter(|&&c| c == h).count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(width: usize, height: usize, layout: HabitatLayout) -> HabitatMap {
        HabitatMap::generate(width, height, layout, &mut ChaCha8Rng::seed_from_u64(3))
    }

    #[test]
    fn zones_place_oasis_in_center_and_biomes_in_quadrants() {
        let map = generate(200, 120, HabitatLayout::Zones);
        assert_eq!(map.habitat_at(100, 60), Habitat::Oasis);
        assert_eq!(map.habitat_at(0, 0), Habitat::Frozen);
        assert_eq!(map.habitat_at(199, 0), Habitat::Radioactive);
        assert_eq!(map.habitat_at(0, 119), Habitat::Volcanic);
        assert_eq!(map.habitat_at(199, 119), Habitat::Desert);
        // radius = 0.22 * 120 = 26.4
        assert_eq!(map.habitat_at(100 + 26, 60), Habitat::Oasis);
        assert_eq!(map.habitat_at(100 + 27, 60), Habitat::Desert);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(64, 48, HabitatLayout::Zones);
        let b = generate(64, 48, HabitatLayout::Zones);
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_lookup_is_temperate() {
        let map = generate(10, 10, HabitatLayout::Zones);
        assert_eq!(map.habitat_at(10, 0), Habitat::Temperate);
        assert_eq!(map.habitat_at(0, 99), Habitat::Temperate);
    }

    #[test]
    fn uniform_layout_is_all_temperate() {
        let map = generate(30, 20, HabitatLayout::Uniform);
        let coverage = map.coverage();
        assert_eq!(coverage[0], (Habitat::Temperate, 600));
        assert!(coverage[1..].iter().all(|&(_, n)| n == 0));
        assert_eq!(map.modifiers_at(5, 5), HabitatModifiers::NEUTRAL);
    }

    #[test]
    fn volcanic_and_frozen_shift_rules_in_opposite_directions() {
        let v = Habitat::Volcanic.modifiers();
        let f = Habitat::Frozen.modifiers();
        assert_eq!((v.survival_modifier, v.birth_modifier), (1, 1));
        assert_eq!((f.survival_modifier, f.birth_modifier), (-1, -1));
        assert!(Habitat::Radioactive.modifiers().mutation_multiplier > 1.0);
    }

    #[test]
    fn gradient_bands_run_frozen_to_volcanic() {
        let map = generate(8, 10, HabitatLayout::Gradient);
        assert_eq!(map.habitat_at(0, 0), Habitat::Frozen);
        assert_eq!(map.habitat_at(7, 1), Habitat::Frozen);
        assert_eq!(map.habitat_at(3, 2), Habitat::Temperate);
        assert_eq!(map.habitat_at(3, 4), Habitat::Oasis);
        assert_eq!(map.habitat_at(3, 6), Habitat::Desert);
        assert_eq!(map.habitat_at(3, 9), Habitat::Volcanic);
        // each band is two full rows
        let coverage = map.coverage();
        assert_eq!(coverage[0], (Habitat::Temperate, 16));
        assert_eq!(coverage[3], (Habitat::Radioactive, 0));
        assert_eq!(coverage[5], (Habitat::Frozen, 16));
    }

    #[test]
    fn gradient_handles_fewer_rows_than_bands() {
        let map = generate(4, 3, HabitatLayout::Gradient);
        assert_eq!(map.habitat_at(0, 0), Habitat::Frozen);
        assert_eq!(map.habitat_at(0, 1), Habitat::Temperate);
        assert_eq!(map.habitat_at(0, 2), Habitat::Desert);
    }

    #[test]
    fn random_layout_mixes_biomes_and_follows_the_seed() {
        let a = generate(40, 40, HabitatLayout::Random);
        let b = generate(40, 40, HabitatLayout::Random);
        assert_eq!(a, b);
        let coverage = a.coverage();
        assert_eq!(coverage.iter().map(|&(_, n)| n).sum::<usize>(), 1600);
        assert!(coverage.iter().all(|&(_, n)| n > 150));

        let c = HabitatMap::generate(40, 40, HabitatLayout::Random, &mut ChaCha8Rng::seed_from_u64(4));
        assert_ne!(a, c);
    }

    #[test]
    fn layout_ids_parse() {
        assert_eq!(HabitatLayout::from_id("gradient"), Some(HabitatLayout::Gradient));
        assert_eq!(HabitatLayout::from_id("random"), Some(HabitatLayout::Random));
        assert_eq!(HabitatLayout::from_id("hex"), None);
    }
}
