// ============================================================================
// lib.rs — GeneLife
// Genetically modified Game of Life: per-cell heritable rules on a toroidal
// grid, static habitats, and catastrophes that strike the dominant lineage.
// ============================================================================

pub mod catastrophe;
pub mod config;
pub mod genome;
pub mod grid;
pub mod habitat;
pub mod headless;
pub mod lab;
pub mod metrics;
pub mod presets;
pub mod render;
pub mod world;

pub use catastrophe::{Catastrophe, CatastropheEvent};
pub use config::{ConfigError, WorldConfig};
pub use genome::{Genome, Rgb};
pub use grid::{Cell, Grid};
pub use habitat::{Habitat, HabitatLayout, HabitatMap};
pub use headless::{run_headless, DriverError, HeadlessConfig};
pub use metrics::{WorldDiagnostics, WorldStats};
pub use presets::Preset;
pub use world::World;
