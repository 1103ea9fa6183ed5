// ============================================================================
// presets.rs — GeneLife
// Initial spatial color patterns. Each generator thins its shape with a
// per-position Bernoulli(density) draw and hands back genomed cells.
// ============================================================================

use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::{Genome, Rgb};

/// Group colors shared by the patterns.
pub const PALETTE: [Rgb; 8] = [
    [255, 60, 60],  // red
    [60, 255, 60],  // green
    [60, 60, 255],  // blue
    [255, 255, 60], // yellow
    [255, 60, 255], // magenta
    [60, 255, 255], // cyan
    [255, 160, 60], // orange
    [160, 60, 255], // purple
];

/// One cell produced by a preset.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetCell {
    pub x: usize,
    pub y: usize,
    pub genome: Genome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Sentinel: World falls back to clustered-random seeding.
    #[default]
    Random,
    Cross,
    Circles,
    Ring,
    Triangles,
    Corners,
    Stripes,
    Checkerboard,
    Horizontal,
    Vertical,
    Diagonal,
    Waves,
    Gradient,
    Bullseye,
}

impl Preset {
    pub const ALL: [Preset; 14] = [
        Preset::Random,
        Preset::Cross,
        Preset::Circles,
        Preset::Ring,
        Preset::Triangles,
        Preset::Corners,
        Preset::Stripes,
        Preset::Checkerboard,
        Preset::Horizontal,
        Preset::Vertical,
        Preset::Diagonal,
        Preset::Waves,
        Preset::Gradient,
        Preset::Bullseye,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Cross => "cross",
            Self::Circles => "circles",
            Self::Ring => "ring",
            Self::Triangles => "triangles",
            Self::Corners => "corners",
            Self::Stripes => "stripes",
            Self::Checkerboard => "checkerboard",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
            Self::Waves => "waves",
            Self::Gradient => "gradient",
            Self::Bullseye => "bullseye",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Random => "Random clusters (default)",
            Self::Cross => "Four colors arranged as a cross",
            Self::Circles => "Six circles of different colors",
            Self::Ring => "A large ring colored by angle",
            Self::Triangles => "Three facing triangles",
            Self::Corners => "Four colors in the corners",
            Self::Stripes => "Vertical color stripes",
            Self::Checkerboard => "Two-color checkerboard",
            Self::Horizontal => "Horizontal color layers",
            Self::Vertical => "Vertical color layers",
            Self::Diagonal => "Diagonal color stripes",
            Self::Waves => "Wavy horizontal layers",
            Self::Gradient => "Smooth positional gradient",
            Self::Bullseye => "Concentric color rings",
        }
    }

    /// Cells for a `width × height` grid. `Random` always returns an empty list.
    pub fn generate<R: Rng + ?Sized>(
        self,
        width: usize,
        height: usize,
        density: f32,
        rng: &mut R,
    ) -> Vec<PresetCell> {
        let mut cells = Vec::new();
        if self == Self::Random || density <= 0.0 {
            return cells;
        }
        let shape = Shape::new(width as f32, height as f32);

        for y in 0..height {
            for x in 0..width {
                if rng.gen::<f32>() > density {
                    continue;
                }
                if let Some(color) = self.color_at(&shape, x as f32, y as f32) {
                    cells.push(PresetCell {
                        x,
                        y,
                        genome: Genome::random_with_color(rng, color),
                    });
                }
            }
        }
        cells
    }

    /// Color of the pattern at a position, `None` outside the shape.
    fn color_at(self, s: &Shape, x: f32, y: f32) -> Option<Rgb> {
        let dx = x - s.cx;
        let dy = y - s.cy;
        let dist = (dx * dx + dy * dy).sqrt();

        match self {
            Self::Random => None,
            Self::Cross => {
                let arm_width = s.height / 6.0;
                let arm_length = s.min_side * 0.4;
                if dy < 0.0 && dy.abs() < arm_length && dx.abs() < arm_width {
                    Some(PALETTE[0])
                } else if dy > 0.0 && dy.abs() < arm_length && dx.abs() < arm_width {
                    Some(PALETTE[1])
                } else if dx < 0.0 && dx.abs() < arm_length && dy.abs() < arm_width {
                    Some(PALETTE[2])
                } else if dx > 0.0 && dx.abs() < arm_length && dy.abs() < arm_width {
                    Some(PALETTE[3])
                } else {
                    None
                }
            }
            Self::Circles => {
                let radius = s.min_side / 8.0;
                let centers = [
                    (0.25, 0.3),
                    (0.75, 0.3),
                    (0.5, 0.5),
                    (0.25, 0.7),
                    (0.75, 0.7),
                    (0.5, 0.85),
                ];
                centers.iter().enumerate().find_map(|(i, &(fx, fy))| {
                    let ddx = x - s.width * fx;
                    let ddy = y - s.height * fy;
                    ((ddx * ddx + ddy * ddy).sqrt() < radius).then_some(PALETTE[i])
                })
            }
            Self::Ring => {
                let outer = s.min_side * 0.4;
                let inner = outer * 0.5;
                if dist >= inner && dist <= outer {
                    let angle = dy.atan2(dx);
                    let idx = (((angle + PI) / (2.0 * PI)) * PALETTE.len() as f32).floor() as usize;
                    Some(PALETTE[idx % PALETTE.len()])
                } else {
                    None
                }
            }
            Self::Triangles => {
                let size = s.min_side * 0.35;
                if y < s.cy && dx.abs() < (s.cy - y) * 0.8 && y > s.cy - size {
                    Some(PALETTE[0])
                } else if y > s.cy && x < s.cx && (x - (s.cx - size * 0.8)) > dy * -0.8 && x > s.cx - size {
                    Some(PALETTE[1])
                } else if y > s.cy && x > s.cx && ((s.cx + size * 0.8) - x) > dy * -0.8 && x < s.cx + size {
                    Some(PALETTE[2])
                } else {
                    None
                }
            }
            Self::Corners => {
                let size = s.min_side * 0.3;
                let left = x < size;
                let right = x > s.width - size;
                let top = y < size;
                let bottom = y > s.height - size;
                match (left, right, top, bottom) {
                    (true, _, true, _) => Some(PALETTE[0]),
                    (_, true, true, _) => Some(PALETTE[1]),
                    (true, _, _, true) => Some(PALETTE[2]),
                    (_, true, _, true) => Some(PALETTE[3]),
                    _ => None,
                }
            }
            Self::Stripes | Self::Vertical => {
                let band = s.width / 5.0;
                Some(cycle((x / band).floor() as i64))
            }
            Self::Horizontal => {
                let band = s.height / 5.0;
                Some(cycle((y / band).floor() as i64))
            }
            Self::Checkerboard => {
                let tile = 15.0;
                let even = ((x / tile).floor() as i64 + (y / tile).floor() as i64) % 2 == 0;
                Some(if even { PALETTE[0] } else { PALETTE[2] })
            }
            Self::Diagonal => Some(cycle(((x + y) / 25.0).floor() as i64)),
            Self::Waves => {
                let band = s.height / 5.0;
                let wave = (x * 0.05).sin() * 10.0;
                Some(cycle(((y - wave) / band).floor() as i64))
            }
            Self::Gradient => {
                let r = (x / s.width * 255.0).floor();
                let g = (y / s.height * 255.0).floor();
                let b = ((s.width - x + s.height - y) / (s.width + s.height) * 255.0).floor();
                Some([r as u8, g as u8, b.clamp(0.0, 255.0) as u8])
            }
            Self::Bullseye => {
                let ring = s.min_side / 10.0;
                Some(cycle((dist / ring).floor() as i64))
            }
        }
    }
}

/// Palette entry for a (possibly negative) band index.
fn cycle(index: i64) -> Rgb {
    PALETTE[(index.unsigned_abs() as usize) % PALETTE.len()]
}

/// Precomputed grid geometry shared by the pattern predicates.
struct Shape {
    width: f32,
    height: f32,
    cx: f32,
    cy: f32,
    min_side: f32,
}

impl Shape {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            cx: width / 2.0,
            cy: height / 2.0,
            min_side: width.min(height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn random_preset_is_the_empty_sentinel() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(Preset::Random.generate(100, 60, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn zero_density_yields_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for preset in Preset::ALL {
            assert!(preset.generate(60, 40, 0.0, &mut rng).is_empty(), "{:?}", preset);
        }
    }

    #[test]
    fn every_pattern_fills_cells_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for preset in Preset::ALL.into_iter().skip(1) {
            let cells = preset.generate(80, 50, 1.0, &mut rng);
            assert!(!cells.is_empty(), "{:?} produced nothing", preset);
            assert!(cells.iter().all(|c| c.x < 80 && c.y < 50));
        }
    }

    #[test]
    fn full_cover_patterns_cover_every_position_at_full_density() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for preset in [Preset::Stripes, Preset::Checkerboard, Preset::Gradient, Preset::Bullseye] {
            assert_eq!(preset.generate(40, 30, 1.0, &mut rng).len(), 1200, "{:?}", preset);
        }
    }

    #[test]
    fn cross_uses_four_arm_colors() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let colors: HashSet<Rgb> = Preset::Cross
            .generate(100, 100, 1.0, &mut rng)
            .into_iter()
            .map(|c| c.genome.color)
            .collect();
        assert_eq!(colors, PALETTE[..4].iter().copied().collect());
    }

    #[test]
    fn density_thins_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let n = Preset::Horizontal.generate(100, 100, 0.3, &mut rng).len();
        assert!((2_500..3_500).contains(&n), "kept {}", n);
    }

    #[test]
    fn ids_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_id(preset.id()), Some(preset));
        }
        assert_eq!(Preset::from_id("spiral"), None);
    }
}
