// ============================================================================
// render.rs — GeneLife
// CPU rasterizer turning a World into an RGBA snapshot, and PNG output.
// ============================================================================

use std::path::Path;

use crate::genome::Rgb;
use crate::grid::Cell;
use crate::world::World;

/// Species color faded by energy over the habitat background.
pub const MODE_SPECIES: u32 = 0;
/// Live cells colored by their energy fraction.
pub const MODE_ENERGY: u32 = 1;
/// Habitat map with live cells overlaid.
pub const MODE_HABITAT: u32 = 2;

/// Alive cells never fade below this fraction of their color.
const MIN_BRIGHTNESS: f32 = 0.3;
const HABITAT_BOOST: f32 = 5.0;

const ENERGY_LOW: Rgb = [40, 40, 160];
const ENERGY_HIGH: Rgb = [255, 220, 40];

/// Rasterize the world at `cell_size` pixels per cell.
/// Returns `(width_px, height_px, rgba)`.
pub fn rasterize(world: &World, mode: u32, cell_size: u32) -> (u32, u32, Vec<u8>) {
    let scale = cell_size.max(1) as usize;
    let (w, h) = (world.width(), world.height());
    let (px_w, px_h) = (w * scale, h * scale);
    let mut rgba = vec![0u8; px_w * px_h * 4];

    for (x, y, cell) in world.grid().iter() {
        let background = world.habitats().habitat_at(x, y).background_color();
        let color = match mode {
            MODE_ENERGY => energy_color(cell),
            MODE_HABITAT => habitat_color(cell, background),
            _ => species_color(cell, background),
        };

        for sy in 0..scale {
            let row = (y * scale + sy) * px_w;
            for sx in 0..scale {
                let i = (row + x * scale + sx) * 4;
                rgba[i..i + 3].copy_from_slice(&color);
                rgba[i + 3] = 255;
            }
        }
    }

    (px_w as u32, px_h as u32, rgba)
}

/// Write an RGBA buffer as PNG.
pub fn save_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), image::ImageError> {
    image::save_buffer(path, rgba, width, height, image::ColorType::Rgba8)
}

fn species_color(cell: &Cell, background: Rgb) -> Rgb {
    if !cell.alive {
        return background;
    }
    lerp(background, cell.genome.color, vitality(cell).max(MIN_BRIGHTNESS))
}

fn energy_color(cell: &Cell) -> Rgb {
    if !cell.alive {
        return [0, 0, 0];
    }
    lerp(ENERGY_LOW, ENERGY_HIGH, vitality(cell))
}

fn habitat_color(cell: &Cell, background: Rgb) -> Rgb {
    let zone = background.map(|c| (c as f32 * HABITAT_BOOST).min(255.0) as u8);
    if cell.alive {
        lerp(zone, [255, 255, 255], 0.6)
    } else {
        zone
    }
}

/// Current energy as a fraction of the genome maximum, clamped to [0,1].
fn vitality(cell: &Cell) -> f32 {
    let max = cell.genome.energy.max(1) as f32;
    (cell.current_energy / max).clamp(0.0, 1.0)
}

fn lerp(from: Rgb, to: Rgb, t: f32) -> Rgb {
    let mut out = [0u8; 3];
    for (o, (&a, &b)) in out.iter_mut().zip(from.iter().zip(to.iter())) {
        *o = (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8;
    }
    out
}
