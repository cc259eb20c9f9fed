//! # Prism CLI
//!
//! Command-line inspector for Prism frame graphs.
//!
//! ## Commands
//! - `plan` - Build the forward pipeline for a number of frames and print the last frame's plan
//! - `cull-demo` - Add an unused pass next to the forward pipeline and show it culled

pub mod pipeline;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use prism_framegraph::{FrameGraphConfig, FrameGraphStats, HeadlessDevice, ScheduleReport};

use crate::pipeline::{add_debug_overlay, build_forward_frame, Engine};

/// Prism frame graph inspector
#[derive(Parser)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Plan and execute the forward pipeline on the headless device
    Plan {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Render target width
        #[arg(long)]
        width: Option<u32>,

        /// Render target height
        #[arg(long)]
        height: Option<u32>,

        /// Disable temporal anti-aliasing
        #[arg(long)]
        no_taa: bool,

        /// Copy the final color before presenting
        #[arg(long)]
        copy: bool,

        /// Number of frames to run
        #[arg(short, long, default_value = "1")]
        frames: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a pass without consumers being culled
    CullDemo {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Outcome of a planning run
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub config: FrameGraphConfig,
    /// Plan of the last frame
    pub schedule: ScheduleReport,
    pub stats: FrameGraphStats,
    /// Framebuffers allocated over all frames
    pub framebuffers_created: usize,
    /// Commands recorded during the last frame
    pub commands: Vec<String>,
}

impl PlanSummary {
    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        print!("{}", self.schedule);
        for command in &self.commands {
            println!("  > {}", command);
        }
        println!(
            "frames={} executed={} culled={} materialized={} pooled={} allocated={}",
            self.stats.frames_executed,
            self.stats.passes_executed,
            self.stats.passes_culled,
            self.stats.resources_materialized,
            self.stats.pooled_resources,
            self.framebuffers_created
        );
        Ok(())
    }
}

/// Load a configuration file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<FrameGraphConfig> {
    let Some(path) = path else {
        return Ok(FrameGraphConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Run `frames` frames of the forward pipeline
pub fn run_plan(config: FrameGraphConfig, frames: u32, debug_overlay: bool) -> Result<PlanSummary> {
    let mut engine = Engine::new(HeadlessDevice::new());
    let frames = frames.max(1);
    let mut schedule = None;
    let mut commands = Vec::new();

    for frame in 0..u64::from(frames) {
        build_forward_frame(&mut engine, &config, frame)?;
        if debug_overlay {
            add_debug_overlay(&mut engine, &config)?;
        }
        engine.compile()?;
        log::debug!("Frame {} compiled with {} passes", frame, engine.pass_count());

        engine.device_mut().take_commands();
        schedule = Some(engine.schedule());
        engine.execute_pass_nodes()?;
        commands = engine.device_mut().take_commands();
    }

    let summary = PlanSummary {
        config,
        schedule: schedule.context("no frame was planned")?,
        stats: engine.stats().clone(),
        framebuffers_created: engine.device().framebuffers_created(),
        commands,
    };
    engine.tear_down();
    Ok(summary)
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Plan {
            config,
            width,
            height,
            no_taa,
            copy,
            frames,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(width) = width {
                config.width = width;
            }
            if let Some(height) = height {
                config.height = height;
            }
            if no_taa {
                config.taa.enabled = false;
            }
            if copy {
                config.copy_output = true;
            }

            log::info!("Planning {} frame(s) at {}x{}", frames, config.width, config.height);
            run_plan(config, frames, false)?.print(json)?;
        }

        Commands::CullDemo { json } => {
            log::info!("Adding an unpresented debug overlay to the forward pipeline");
            let summary = run_plan(FrameGraphConfig::default(), 1, true)?;
            log::info!("{} pass(es) culled", summary.schedule.culled_count());
            summary.print(json)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::parse_from(["prism", "plan"]);
        assert!(matches!(cli.command, Commands::Plan { frames: 1, .. }));
    }

    #[test]
    fn test_plan_command() {
        let cli = Cli::parse_from(["prism", "-v", "plan", "--width", "640", "--no-taa", "--copy", "-f", "3", "--json"]);
        assert!(cli.verbose);
        if let Commands::Plan {
            width,
            no_taa,
            copy,
            frames,
            json,
            ..
        } = cli.command
        {
            assert_eq!(width, Some(640));
            assert!(no_taa);
            assert!(copy);
            assert_eq!(frames, 3);
            assert!(json);
        } else {
            panic!("Expected Plan command");
        }
    }

    #[test]
    fn test_cull_demo_parse() {
        let cli = Cli::parse_from(["prism", "cull-demo"]);
        assert!(matches!(cli.command, Commands::CullDemo { json: false }));
    }

    #[test]
    fn test_run_plan_reuses_pool() {
        let summary = run_plan(FrameGraphConfig::default(), 3, false).unwrap();

        assert_eq!(summary.stats.frames_executed, 3);
        // Scene color and TAA history, allocated once
        assert_eq!(summary.framebuffers_created, 2);
        assert_eq!(summary.commands.len(), 2);
        assert_eq!(summary.schedule.culled_count(), 0);
    }

    #[test]
    fn test_run_plan_with_overlay() {
        let summary = run_plan(FrameGraphConfig::default(), 1, true).unwrap();
        assert_eq!(summary.stats.passes_culled, 1);
        assert!(summary.commands.iter().all(|command| !command.contains("overlay")));
    }

    #[test]
    fn test_load_config_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config, FrameGraphConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/prism.json"))).is_err());
    }
}
