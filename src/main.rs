// ============================================================================
// main.rs — GeneLife
// Entry point. Initializes logging, parses the command line and runs the
// headless simulation driver.
// ============================================================================

use std::path::PathBuf;

use clap::Parser;

use genelife::catastrophe::Catastrophe;
use genelife::config::{render_mode_name, WorldConfig, RENDER_MODE_COUNT};
use genelife::habitat::HabitatLayout;
use genelife::headless::{run_headless, HeadlessConfig};
use genelife::presets::Preset;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 200)]
    width: usize,

    #[arg(long, default_value_t = 120)]
    height: usize,

    /// Initial alive probability / preset thinning.
    #[arg(long, default_value_t = 0.3)]
    density: f32,

    /// Milliseconds per generation with --realtime.
    #[arg(long, default_value_t = 100)]
    tick_rate: u64,

    #[arg(short, long, default_value_t = 1_000)]
    generations: u64,

    /// Initial pattern id (random, cross, circles, ring, ...).
    #[arg(short, long, default_value = "random")]
    preset: String,

    #[arg(long)]
    seed: Option<u64>,

    /// Habitat layout: zones, uniform, gradient or random.
    #[arg(long, default_value = "zones")]
    layout: String,

    /// Root directory for run artifacts.
    #[arg(short, long, default_value = "runs")]
    out: PathBuf,

    /// Generations between PNG snapshots (0 disables).
    #[arg(long, default_value_t = 0)]
    snapshot_every: u64,

    #[arg(long, default_value_t = 10)]
    metrics_every: u64,

    #[arg(long, default_value_t = 250)]
    progress_every: u64,

    #[arg(long, default_value_t = 4)]
    cell_size: u32,

    /// 0 species, 1 energy, 2 habitat.
    #[arg(long, default_value_t = 0)]
    render_mode: u32,

    /// Pace generations at the tick rate instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Manual catastrophe as `<id>@<generation>`, repeatable.
    #[arg(long = "catastrophe")]
    catastrophes: Vec<String>,
}

/// `plague@120` -> (120, Plague).
fn parse_scheduled(spec: &str) -> Option<(u64, Catastrophe)> {
    let (id, generation) = spec.split_once('@')?;
    let kind = Catastrophe::from_id(id.trim())?;
    let generation = generation.trim().parse().ok()?;
    Some((generation, kind))
}

fn build_configs(args: &Args) -> (WorldConfig, HeadlessConfig) {
    let habitat_layout = HabitatLayout::from_id(&args.layout).unwrap_or_else(|| {
        log::warn!("Unknown habitat layout '{}', using zones", args.layout);
        HabitatLayout::Zones
    });
    let preset = Preset::from_id(&args.preset).unwrap_or_else(|| {
        log::warn!("Unknown preset '{}', using random", args.preset);
        Preset::Random
    });

    let mut scheduled = Vec::new();
    for spec in &args.catastrophes {
        match parse_scheduled(spec) {
            Some(entry) => scheduled.push(entry),
            None => log::warn!("Ignoring catastrophe '{}', expected <id>@<generation>", spec),
        }
    }

    let render_mode = if args.render_mode < RENDER_MODE_COUNT {
        args.render_mode
    } else {
        log::warn!("Unknown render mode {}, using species color", args.render_mode);
        0
    };

    let world = WorldConfig {
        width: args.width,
        height: args.height,
        initial_density: args.density,
        tick_rate_ms: args.tick_rate,
        habitat_layout,
        seed: args.seed,
    };
    let headless = HeadlessConfig {
        generations: args.generations,
        preset,
        progress_interval: args.progress_every,
        metrics_interval: args.metrics_every,
        snapshot_interval: args.snapshot_every,
        output_dir: args.out.clone(),
        realtime: args.realtime,
        scheduled_catastrophes: scheduled,
        cell_size: args.cell_size,
        render_mode,
    };
    (world, headless)
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let (world_config, headless_config) = build_configs(&args);
    log::info!(
        "GeneLife v{}: {}x{} density={} layout={:?} seed={:?} render={}",
        env!("CARGO_PKG_VERSION"),
        world_config.width,
        world_config.height,
        world_config.initial_density,
        world_config.habitat_layout,
        world_config.seed,
        render_mode_name(headless_config.render_mode),
    );

    if let Err(e) = run_headless(&world_config, &headless_config) {
        log::error!("Run failed: {}", e);
        std::process::exit(1);
    }
}
