// ============================================================================
// grid.rs — GeneLife
// Cell record and the toroidal row-major grid that World double-buffers.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::genome::Genome;

// ======================== Cell ========================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub alive: bool,
    pub genome: Genome,
    pub age: u32,
    pub current_energy: f32,
    /// Generation in which the cell was born.
    pub generation: u64,
}

impl Default for Cell {
    fn default() -> Self {
        Self::dead()
    }
}

impl Cell {
    /// Empty slot. The placeholder genome carries no meaning.
    pub fn dead() -> Self {
        Self {
            alive: false,
            genome: Genome::default(),
            age: 0,
            current_energy: 0.0,
            generation: 0,
        }
    }

    pub fn newborn(genome: Genome, energy: f32, generation: u64) -> Self {
        Self {
            alive: true,
            genome,
            age: 0,
            current_energy: energy,
            generation,
        }
    }

    /// Replace with an empty slot.
    pub fn kill(&mut self) {
        *self = Self::dead();
    }
}

// ======================== Grid ========================

/// Fixed-size toroidal grid stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

/// Offsets of the Moore neighborhood.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Grid {
    /// All-dead grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::dead(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if self.contains(x, y) {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if self.contains(x, y) {
            let idx = self.index(x, y);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Overwrite one cell. Returns false (and does nothing) when out of bounds.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Iterate `(x, y, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i % width, i / width, cell))
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.alive).count()
    }

    /// Coordinates of the 8 wrap-around neighbors of `(x, y)`.
    pub fn neighbor_coords(&self, x: usize, y: usize) -> [(usize, usize); 8] {
        let w = self.width as isize;
        let h = self.height as isize;
        NEIGHBOR_OFFSETS.map(|(dx, dy)| {
            let nx = (x as isize + dx).rem_euclid(w);
            let ny = (y as isize + dy).rem_euclid(h);
            (nx as usize, ny as usize)
        })
    }

    /// Euclidean distance with wrap-around on both axes.
    pub fn toroidal_distance(&self, a: (usize, usize), b: (usize, usize)) -> f32 {
        let dx = a.0.abs_diff(b.0);
        let dy = a.1.abs_diff(b.1);
        let dx = dx.min(self.width - dx) as f32;
        let dy = dy.min(self.height - dy) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}
