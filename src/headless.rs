// ============================================================================
// headless.rs — GeneLife
// Headless simulation driver: runs a World for a fixed number of generations,
// journals metrics and events, and exports the run artifacts.
// ============================================================================

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::catastrophe::Catastrophe;
use crate::config::{ConfigError, WorldConfig};
use crate::lab::{ExportError, LabState, RunSummary};
use crate::metrics::WorldDiagnostics;
use crate::presets::Preset;
use crate::render;
use crate::world::World;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid world configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

#[derive(Clone, Debug)]
pub struct HeadlessConfig {
    pub generations: u64,
    pub preset: Preset,
    /// Generations between progress log lines; 0 disables.
    pub progress_interval: u64,
    /// Generations between metrics samples; 0 disables.
    pub metrics_interval: u64,
    /// Generations between PNG snapshots; 0 disables.
    pub snapshot_interval: u64,
    pub output_dir: PathBuf,
    /// Sleep `tick_rate_ms` between generations.
    pub realtime: bool,
    /// Manual catastrophes fired after the given generation.
    pub scheduled_catastrophes: Vec<(u64, Catastrophe)>,
    pub cell_size: u32,
    pub render_mode: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            generations: 1_000,
            preset: Preset::Random,
            progress_interval: 250,
            metrics_interval: 10,
            snapshot_interval: 0,
            output_dir: PathBuf::from("runs"),
            realtime: false,
            scheduled_catastrophes: Vec::new(),
            cell_size: 4,
            render_mode: render::MODE_SPECIES,
        }
    }
}

pub fn run_headless(
    world_config: &WorldConfig,
    config: &HeadlessConfig,
) -> Result<RunSummary, DriverError> {
    let mut world = World::new(world_config.clone())?;
    world.initialize(config.preset);

    let mut lab = LabState::new(&config.output_dir);
    lab.start_run(world_config, config.preset, config.generations)?;

    log::info!(
        "Headless run started: {} generations on {}x{} (preset {}, run {})",
        config.generations,
        world_config.width,
        world_config.height,
        config.preset.id(),
        lab.run_id,
    );

    let mut prev_stats = world.stats();
    let mut prev_diag: Option<WorldDiagnostics> = None;
    sample(&mut lab, &world, 0.0);
    if config.snapshot_interval > 0 {
        snapshot(&mut lab, &world, config)?;
    }

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut last_report_generation = 0u64;

    for step in 0..config.generations {
        if config.realtime {
            std::thread::sleep(world_config.tick_interval());
        }

        if let Some(event) = world.tick() {
            lab.log_catastrophe(&event, false);
        }
        let done = step + 1;

        for &(_, kind) in config
            .scheduled_catastrophes
            .iter()
            .filter(|(at, _)| *at == done)
        {
            let event = world.trigger_catastrophe(kind);
            lab.log_catastrophe(&event, true);
        }

        let stats = world.stats();
        lab.observe(&prev_stats, &stats);
        prev_stats = stats;

        let total_elapsed = started.elapsed().as_secs_f64().max(1e-6);
        let total_tps = done as f64 / total_elapsed;

        if config.metrics_interval > 0 && done % config.metrics_interval == 0 {
            sample(&mut lab, &world, total_tps as f32);
        }
        if config.snapshot_interval > 0 && done % config.snapshot_interval == 0 {
            snapshot(&mut lab, &world, config)?;
        }

        if config.progress_interval > 0 && done % config.progress_interval == 0 {
            let window_elapsed = last_report.elapsed().as_secs_f64().max(1e-6);
            let window_tps = (done - last_report_generation) as f64 / window_elapsed;

            let remaining = config.generations.saturating_sub(done);
            let eta_secs = if total_tps > 1e-6 {
                remaining as f64 / total_tps
            } else {
                0.0
            };

            log::info!(
                "Headless progress: {}/{} | pop={} | tps={:.0} (window {:.0}) | ETA={:.1} min",
                done,
                config.generations,
                prev_stats.population,
                total_tps,
                window_tps,
                eta_secs / 60.0,
            );

            let diag = WorldDiagnostics::from_grid(world.grid(), world.habitats());
            diag.log(done, prev_diag.as_ref());
            prev_diag = Some(diag);

            last_report = Instant::now();
            last_report_generation = done;
        }
    }

    let summary = lab.finalize_run(world_config, &world.stats())?;
    log::info!(
        "Headless run finished: {} generations, population {}, {} catastrophes, artifacts in {:?}",
        summary.generations,
        summary.final_population,
        summary.catastrophes,
        summary.run_dir,
    );
    Ok(summary)
}

fn sample(lab: &mut LabState, world: &World, tps: f32) {
    let diag = WorldDiagnostics::from_grid(world.grid(), world.habitats());
    lab.record_metrics(&world.stats(), &diag, world.dominance_streak(), tps);
}

fn snapshot(lab: &mut LabState, world: &World, config: &HeadlessConfig) -> Result<(), DriverError> {
    let (width, height, rgba) = render::rasterize(world, config.render_mode, config.cell_size);
    lab.save_snapshot(world.generation(), width, height, &rgba, config.render_mode)?;
    Ok(())
}
