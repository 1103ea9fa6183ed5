// ============================================================================
// lab.rs — GeneLife Run Journal
// Per-run experiment state: metrics history, event journal, snapshots and the
// exported artifacts (config.json, metrics.csv, events.log, report.md).
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

use crate::catastrophe::CatastropheEvent;
use crate::config::{render_mode_name, WorldConfig};
use crate::genome::{color_distance, Rgb};
use crate::metrics::{WorldDiagnostics, WorldStats};
use crate::presets::Preset;
use crate::render;

/// Event thresholds used by [`detect_events`].
const BOOM_BIRTHS: usize = 50;
const DIE_OFF_DEATHS: usize = 50;
const COLOR_SHIFT_DISTANCE: u32 = 30;
const COLOR_SHIFT_MIN_GENERATION: u64 = 10;
const MUTATION_SHIFT: f32 = 0.02;
const MILESTONE_EVERY: u64 = 100;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

// ======================== Metrics Record ========================

#[derive(Clone, Debug, Serialize)]
pub struct MetricsRecord {
    pub generation: u64,
    pub time_ms: f64,
    pub tps: f32,
    pub population: usize,
    pub births: usize,
    pub deaths: usize,
    pub avg_energy: f32,
    pub avg_mutation_rate: f32,
    pub dominant_color: Rgb,
    pub dominance_streak: u32,
    pub entropy: f32,
    pub species: usize,
    pub live_fraction: f32,
    pub predator_fraction: f32,
    pub avg_survival_range: f32,
    pub avg_birth_count: f32,
    pub avg_aggressiveness: f32,
    pub avg_resilience: f32,
    pub avg_fitness: f32,
}

impl MetricsRecord {
    pub fn csv_header() -> &'static str {
        "generation,time_ms,tps,population,births,deaths,avg_energy,avg_mutation_rate,dominant_color,dominance_streak,entropy,species,live_fraction,predator_fraction,avg_survival_range,avg_birth_count,avg_aggressiveness,avg_resilience,avg_fitness"
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{:.1},{:.1},{},{},{},{:.3},{:.5},{},{},{:.3},{},{:.4},{:.4},{:.3},{:.3},{:.4},{:.4},{:.4}",
            self.generation, self.time_ms, self.tps, self.population,
            self.births, self.deaths, self.avg_energy, self.avg_mutation_rate,
            hex_color(self.dominant_color), self.dominance_streak,
            self.entropy, self.species, self.live_fraction, self.predator_fraction,
            self.avg_survival_range, self.avg_birth_count,
            self.avg_aggressiveness, self.avg_resilience, self.avg_fitness,
        )
    }
}

pub fn hex_color(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

// ======================== Lab Event ========================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EventKind {
    RunStart,
    RunEnd,
    BabyBoom,
    MassDieOff,
    LifeEmerges,
    TotalExtinction,
    ColorShift,
    MutationShift,
    Milestone,
    Catastrophe,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::RunStart => "RUN_START",
            Self::RunEnd => "RUN_END",
            Self::BabyBoom => "BABY_BOOM",
            Self::MassDieOff => "MASS_DIE_OFF",
            Self::LifeEmerges => "LIFE_EMERGES",
            Self::TotalExtinction => "TOTAL_EXTINCTION",
            Self::ColorShift => "COLOR_SHIFT",
            Self::MutationShift => "MUTATION_SHIFT",
            Self::Milestone => "MILESTONE",
            Self::Catastrophe => "CATASTROPHE",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LabEvent {
    pub generation: u64,
    pub time_ms: f64,
    pub kind: EventKind,
    pub details: String,
}

impl LabEvent {
    pub fn to_log_line(&self) -> String {
        format!(
            "[{:.1}ms] gen={} {}: {}",
            self.time_ms,
            self.generation,
            self.kind.label(),
            self.details,
        )
    }
}

/// Notable changes between two consecutive stat snapshots.
pub fn detect_events(prev: &WorldStats, current: &WorldStats) -> Vec<(EventKind, String)> {
    let mut events = Vec::new();

    if current.births > BOOM_BIRTHS {
        events.push((EventKind::BabyBoom, format!("{} births", current.births)));
    }
    if current.deaths > DIE_OFF_DEATHS {
        events.push((EventKind::MassDieOff, format!("{} deaths", current.deaths)));
    }
    if prev.population == 0 && current.population > 0 {
        events.push((
            EventKind::LifeEmerges,
            format!("population {}", current.population),
        ));
    }
    if prev.population > 0 && current.population == 0 {
        events.push((
            EventKind::TotalExtinction,
            format!("last population {}", prev.population),
        ));
    }
    if current.generation > COLOR_SHIFT_MIN_GENERATION
        && color_distance(prev.dominant_color, current.dominant_color) > COLOR_SHIFT_DISTANCE
    {
        events.push((
            EventKind::ColorShift,
            format!(
                "dominant {} -> {}",
                hex_color(prev.dominant_color),
                hex_color(current.dominant_color)
            ),
        ));
    }
    let mutation_delta = current.avg_mutation_rate - prev.avg_mutation_rate;
    if mutation_delta.abs() > MUTATION_SHIFT {
        let direction = if mutation_delta > 0.0 { "up" } else { "down" };
        events.push((
            EventKind::MutationShift,
            format!(
                "mutation rate {} to {:.1}%",
                direction,
                current.avg_mutation_rate * 100.0
            ),
        ));
    }
    if current.generation > 0 && current.generation % MILESTONE_EVERY == 0 {
        events.push((
            EventKind::Milestone,
            format!("generation {} reached", current.generation),
        ));
    }

    events
}

// ======================== Run Summary ========================

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub start_time: String,
    pub generations: u64,
    pub final_population: usize,
    pub metrics_count: usize,
    pub events_count: usize,
    pub catastrophes: usize,
    pub snapshots: usize,
}

// ======================== Lab State ========================

pub struct LabState {
    // -- Run management --
    pub run_id: String,
    pub run_start: Instant,
    pub run_start_time: String,
    pub run_dir: PathBuf,
    pub run_active: bool,

    // -- Metrics --
    pub metrics_history: Vec<MetricsRecord>,

    // -- Journal --
    pub events: Vec<LabEvent>,
    pub catastrophes: Vec<CatastropheEvent>,
    pub snapshots: Vec<PathBuf>,
}

impl LabState {
    /// Journal rooted at `output_root/<date>/<run_id>`.
    pub fn new(output_root: &Path) -> Self {
        let now = Local::now();
        let run_id = format!("run_{}", now.format("%Y%m%d_%H%M%S"));
        let run_dir = output_root
            .join(now.format("%Y-%m-%d").to_string())
            .join(&run_id);

        Self {
            run_id,
            run_start: Instant::now(),
            run_start_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            run_dir,
            run_active: false,
            metrics_history: Vec::with_capacity(1_000),
            events: Vec::with_capacity(1_000),
            catastrophes: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Start a new run: create the output directory and save the config.
    pub fn start_run(
        &mut self,
        config: &WorldConfig,
        preset: Preset,
        generations: u64,
    ) -> Result<(), ExportError> {
        self.run_start = Instant::now();
        self.run_active = true;
        self.metrics_history.clear();
        self.events.clear();
        self.catastrophes.clear();
        self.snapshots.clear();

        fs::create_dir_all(self.run_dir.join("snapshots"))?;
        self.save_config(config, preset, generations)?;
        self.log_event(0, EventKind::RunStart, &format!("Run {} started", self.run_id));
        Ok(())
    }

    /// Save config.json for the current run.
    pub fn save_config(
        &self,
        config: &WorldConfig,
        preset: Preset,
        generations: u64,
    ) -> Result<PathBuf, ExportError> {
        let json = serde_json::json!({
            "run_id": self.run_id,
            "timestamp": self.run_start_time,
            "app_version": env!("CARGO_PKG_VERSION"),
            "preset": preset.id(),
            "generations": generations,
            "world": config,
        });
        let path = self.run_dir.join("config.json");
        fs::write(&path, serde_json::to_string_pretty(&json)?)?;
        log::info!("Saved config to {:?}", path);
        Ok(path)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.run_start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn record_metrics(
        &mut self,
        stats: &WorldStats,
        diag: &WorldDiagnostics,
        dominance_streak: u32,
        tps: f32,
    ) {
        let record = MetricsRecord {
            generation: stats.generation,
            time_ms: self.elapsed_ms(),
            tps,
            population: stats.population,
            births: stats.births,
            deaths: stats.deaths,
            avg_energy: stats.avg_energy,
            avg_mutation_rate: stats.avg_mutation_rate,
            dominant_color: stats.dominant_color,
            dominance_streak,
            entropy: diag.color_entropy,
            species: diag.species_count,
            live_fraction: diag.live_fraction,
            predator_fraction: diag.genome_stats.predator_fraction,
            avg_survival_range: diag.genome_stats.avg_survival_range,
            avg_birth_count: diag.genome_stats.avg_birth_count,
            avg_aggressiveness: diag.genome_stats.avg_aggressiveness,
            avg_resilience: diag.genome_stats.avg_resilience,
            avg_fitness: diag.genome_stats.avg_fitness,
        };
        self.metrics_history.push(record);
    }

    pub fn log_event(&mut self, generation: u64, kind: EventKind, details: &str) {
        let time_ms = self.elapsed_ms();
        self.events.push(LabEvent {
            generation,
            time_ms,
            kind,
            details: details.to_string(),
        });
    }

    /// Journal every notable change between two stat snapshots.
    pub fn observe(&mut self, prev: &WorldStats, current: &WorldStats) {
        for (kind, details) in detect_events(prev, current) {
            self.log_event(current.generation, kind, &details);
        }
    }

    pub fn log_catastrophe(&mut self, event: &CatastropheEvent, manual: bool) {
        let details = format!(
            "{}{} affected {} cells (dominant {})",
            event.catastrophe.name(),
            if manual { " (manual)" } else { "" },
            event.affected,
            hex_color(event.dominant_color),
        );
        self.log_event(event.generation, EventKind::Catastrophe, &details);
        self.catastrophes.push(event.clone());
    }

    /// Export metrics to CSV.
    pub fn export_metrics_csv(&self) -> Result<PathBuf, ExportError> {
        let path = self.run_dir.join("metrics.csv");
        let mut file = fs::File::create(&path)?;
        writeln!(file, "{}", MetricsRecord::csv_header())?;
        for record in &self.metrics_history {
            writeln!(file, "{}", record.to_csv_line())?;
        }
        log::info!("Exported {} metrics records to {:?}", self.metrics_history.len(), path);
        Ok(path)
    }

    /// Export the event journal.
    pub fn export_events_log(&self) -> Result<PathBuf, ExportError> {
        let path = self.run_dir.join("events.log");
        let mut file = fs::File::create(&path)?;
        for event in &self.events {
            writeln!(file, "{}", event.to_log_line())?;
        }
        log::info!("Exported {} events to {:?}", self.events.len(), path);
        Ok(path)
    }

    /// Export a full run report (markdown).
    pub fn export_report(&self, config: &WorldConfig) -> Result<PathBuf, ExportError> {
        let path = self.run_dir.join("report.md");
        let last_metrics = self.metrics_history.last();

        let final_metrics = match last_metrics {
            Some(m) => format!(
                "| Metric | Value |\n|--------|-------|\n\
                 | Generation | {} |\n\
                 | Population | {} ({:.1}%) |\n\
                 | Avg Energy | {:.2} |\n\
                 | Avg Mutation Rate | {:.4} |\n\
                 | Dominant Color | {} |\n\
                 | Entropy | {:.3} bits |\n\
                 | Species | {} |\n\
                 | Avg Fitness | {:.3} |\n\
                 | Ticks/s | {:.0} |",
                m.generation,
                m.population,
                m.live_fraction * 100.0,
                m.avg_energy,
                m.avg_mutation_rate,
                hex_color(m.dominant_color),
                m.entropy,
                m.species,
                m.avg_fitness,
                m.tps,
            ),
            None => "No metrics collected.".to_string(),
        };

        let catastrophes = if self.catastrophes.is_empty() {
            "None.".to_string()
        } else {
            self.catastrophes
                .iter()
                .map(|c| {
                    format!(
                        "- gen {}: {} ({} cells, dominant {})",
                        c.generation,
                        c.catastrophe.name(),
                        c.affected,
                        hex_color(c.dominant_color)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let report = format!(
            "# GeneLife Run Report\n\n\
             ## Run Info\n\
             - **Run ID**: {}\n\
             - **Start**: {}\n\
             - **Generations**: {}\n\
             - **Metrics Samples**: {}\n\
             - **Snapshots**: {}\n\
             - **App Version**: {}\n\
             - **World Size**: {}×{}\n\n\
             ## Configuration\n\
             ```json\n{}\n```\n\n\
             ## Final Metrics\n\
             {}\n\n\
             ## Catastrophes\n\
             {}\n\n\
             ## Events Summary\n\
             - Total events: {}\n\
             {}\n",
            self.run_id,
            self.run_start_time,
            last_metrics.map_or(0, |m| m.generation),
            self.metrics_history.len(),
            self.snapshots.len(),
            env!("CARGO_PKG_VERSION"),
            config.width,
            config.height,
            serde_json::to_string_pretty(config)?,
            final_metrics,
            catastrophes,
            self.events.len(),
            self.events
                .iter()
                .rev()
                .take(10)
                .map(|e| format!("- {}", e.to_log_line()))
                .collect::<Vec<_>>()
                .join("\n"),
        );

        fs::write(&path, report)?;
        log::info!("Exported report to {:?}", path);
        Ok(path)
    }

    /// Save an RGBA snapshot into the run's snapshots directory.
    pub fn save_snapshot(
        &mut self,
        generation: u64,
        width: u32,
        height: u32,
        rgba: &[u8],
        mode: u32,
    ) -> Result<PathBuf, ExportError> {
        let dir = self.run_dir.join("snapshots");
        fs::create_dir_all(&dir)?;

        let filename = format!(
            "gen{:06}_{}.png",
            generation,
            render_mode_name(mode).to_lowercase().replace(' ', "_"),
        );
        let path = dir.join(filename);
        render::save_png(&path, width, height, rgba)?;
        log::info!("Snapshot saved: {:?}", path);
        self.snapshots.push(path.clone());
        Ok(path)
    }

    /// Export everything and close the run.
    pub fn finalize_run(
        &mut self,
        config: &WorldConfig,
        final_stats: &WorldStats,
    ) -> Result<RunSummary, ExportError> {
        self.log_event(
            final_stats.generation,
            EventKind::RunEnd,
            &format!("Run {} finalized", self.run_id),
        );

        self.export_metrics_csv()?;
        self.export_events_log()?;
        self.export_report(config)?;
        self.run_active = false;

        Ok(RunSummary {
            run_id: self.run_id.clone(),
            run_dir: self.run_dir.clone(),
            start_time: self.run_start_time.clone(),
            generations: final_stats.generation,
            final_population: final_stats.population,
            metrics_count: self.metrics_history.len(),
            events_count: self.events.len(),
            catastrophes: self.catastrophes.len(),
            snapshots: self.snapshots.len(),
        })
    }
}
