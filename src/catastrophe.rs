// ============================================================================
// catastrophe.rs — GeneLife
// Catastrophic operators that strike the dominant color lineage, plus the
// event record World keeps for every occurrence.
// ============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::{color_distance, Rgb};
use crate::grid::{Cell, Grid};

/// Cells within this Manhattan distance of the dominant color are targeted.
pub const TARGET_COLOR_THRESHOLD: u32 = 80;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Catastrophe {
    Plague,
    Meteor,
    Drought,
    Infertility,
    MutationBurst,
    IceAge,
}

/// One catastrophe occurrence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatastropheEvent {
    pub generation: u64,
    pub catastrophe: Catastrophe,
    pub affected: usize,
    pub dominant_color: Rgb,
}

impl Catastrophe {
    pub const ALL: [Catastrophe; 6] = [
        Catastrophe::Plague,
        Catastrophe::Meteor,
        Catastrophe::Drought,
        Catastrophe::Infertility,
        Catastrophe::MutationBurst,
        Catastrophe::IceAge,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Plague => "plague",
            Self::Meteor => "meteor",
            Self::Drought => "drought",
            Self::Infertility => "infertility",
            Self::MutationBurst => "mutation_burst",
            Self::IceAge => "ice_age",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plague => "Plague",
            Self::Meteor => "Meteor",
            Self::Drought => "Drought",
            Self::Infertility => "Infertility",
            Self::MutationBurst => "Radiation",
            Self::IceAge => "Ice Age",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Plague => "A disease strikes the dominant color",
            Self::Meteor => "Devastating impact at a random location",
            Self::Drought => "Resource scarcity drains the dominant lineage",
            Self::Infertility => "The dominant lineage loses reproductive capacity",
            Self::MutationBurst => "Extreme mutations scramble the dominant lineage",
            Self::IceAge => "Extreme cold kills the weakest of the dominant lineage",
        }
    }

    /// Uniform pick over the registry.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Apply in place. Returns the number of affected cells; an empty grid
    /// yields 0.
    pub fn apply<R: Rng + ?Sized>(self, grid: &mut Grid, dominant: Rgb, rng: &mut R) -> usize {
        match self {
            Self::Meteor => meteor(grid, rng),
            Self::Plague => for_each_target(grid, dominant, |cell| {
                if rng.gen::<f32>() < 0.4 {
                    cell.kill();
                    true
                } else {
                    false
                }
            }),
            Self::Drought => for_each_target(grid, dominant, |cell| {
                cell.current_energy = (cell.current_energy * 0.4).floor();
                if cell.current_energy <= 0.0 {
                    cell.kill();
                }
                true
            }),
            Self::Infertility => for_each_target(grid, dominant, |cell| {
                let g = &mut cell.genome;
                g.birth_count = (g.birth_count + 2).min(8);
                g.survival_min = g.survival_min.saturating_sub(1).max(1);
                true
            }),
            Self::MutationBurst => for_each_target(grid, dominant, |cell| {
                let g = &mut cell.genome;
                g.mutation_rate = (g.mutation_rate + 0.3).min(1.0);
                g.color = [rng.gen(), rng.gen(), rng.gen()];
                true
            }),
            Self::IceAge => for_each_target(grid, dominant, |cell| {
                if cell.genome.resilience < 0.5 || cell.current_energy < 30.0 {
                    cell.kill();
                    true
                } else {
                    false
                }
            }),
        }
    }
}

pub fn is_target_color(color: Rgb, dominant: Rgb) -> bool {
    color_distance(color, dominant) < TARGET_COLOR_THRESHOLD
}

/// Run `effect` on every alive cell close to the dominant color and count the
/// cells it reports as affected.
fn for_each_target<F>(grid: &mut Grid, dominant: Rgb, mut effect: F) -> usize
where
    F: FnMut(&mut Cell) -> bool,
{
    let mut affected = 0;
    for cell in grid.cells_mut() {
        if cell.alive && is_target_color(cell.genome.color, dominant) && effect(cell) {
            affected += 1;
        }
    }
    affected
}

/// Kill every alive cell inside a randomly centered toroidal disk.
fn meteor<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> usize {
    if grid.width() == 0 || grid.height() == 0 {
        return 0;
    }
    let center = (rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
    let radius = rng.gen_range(15..25) as f32;

    let mut impacted = Vec::new();
    for (x, y, cell) in grid.iter() {
        if cell.alive && grid.toroidal_distance((x, y), center) < radius {
            impacted.push((x, y));
        }
    }
    for &(x, y) in &impacted {
        if let Some(cell) = grid.get_mut(x, y) {
            cell.kill();
        }
    }
    log::debug!(
        "Meteor impact at ({}, {}) radius {:.0}: {} cells",
        center.0,
        center.1,
        radius,
        impacted.len()
    );
    impacted.len()
}
