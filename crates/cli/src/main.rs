use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use duel_agent::controllers;
use duel_agent::recorder::EpisodeRecorder;
use duel_agent::{EpisodeLoop, QTable, UdpTransport};
use duel_shared::*;

#[derive(Parser)]
#[command(name = "duel", about = "Tank duel controller CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Control one tank for a single episode
    Run {
        /// Participant to control (1 or 2)
        #[arg(long)]
        tank: i32,

        /// Controller variant (see `duel controllers`)
        #[arg(long)]
        controller: Option<ControllerKind>,

        /// Restore the Q-table before the episode starts
        #[arg(long)]
        load_q_table: bool,

        /// Q-table location
        #[arg(long)]
        q_table: Option<PathBuf>,

        /// JSON configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for exploration
        #[arg(long)]
        seed: Option<u64>,

        /// Write a CSV episode log into this directory
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Print statistics for a saved Q-table
    Inspect {
        #[arg(long)]
        q_table: PathBuf,

        /// Learning variant whose preset action space the table was trained on
        #[arg(long, default_value = "terminator")]
        controller: ControllerKind,
    },

    /// List controller variants
    Controllers,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            tank,
            controller,
            load_q_table,
            q_table,
            config,
            seed,
            record,
        } => {
            let mut cfg = match (&config, controller) {
                (Some(path), _) => ControllerConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                (None, Some(kind)) => ControllerConfig::for_kind(kind),
                (None, None) => ControllerConfig::default(),
            };
            cfg.participant = tank;
            if let Some(kind) = controller {
                cfg.kind = kind;
            }
            cfg.persistence.load_q_table |= load_q_table;
            if let Some(path) = q_table {
                cfg.persistence.q_table_path = path;
            }
            if seed.is_some() {
                cfg.learning.seed = seed;
            }
            if record.is_some() {
                cfg.persistence.record_dir = record;
            }
            cfg.validate().context("invalid configuration")?;
            cmd_run(cfg)
        }
        Commands::Inspect { q_table, controller } => cmd_inspect(&q_table, controller),
        Commands::Controllers => {
            cmd_controllers();
            Ok(())
        }
    }
}

fn cmd_run(config: ControllerConfig) -> Result<()> {
    let controller = controllers::build(&config).with_context(|| {
        format!(
            "restoring Q-table from {}",
            config.persistence.q_table_path.display()
        )
    })?;
    let transport = UdpTransport::bind(&config).context("opening simulator sockets")?;

    let mut episode = EpisodeLoop::new(config.clone(), transport, controller);
    if let Some(dir) = &config.persistence.record_dir {
        let (recorder, path) = EpisodeRecorder::create(dir)
            .with_context(|| format!("creating episode log in {}", dir.display()))?;
        info!(path = %path.display(), "recording episode");
        episode = episode.with_recorder(recorder);
    }

    let summary = episode.run().context("episode failed")?;

    println!();
    println!("=== Episode Result ===");
    println!("Controller:  {}", summary.controller);
    println!("Reason:      {:?}", summary.reason);
    println!("Final timer: {}", summary.final_timer);
    println!("Cycles:      {}", summary.cycles);
    println!(
        "Commands:    {} sent, {} failed",
        summary.commands_sent, summary.send_failures
    );
    println!(
        "Frames:      {} dropped, {} discarded",
        summary.dropped_frames, summary.discarded_frames
    );
    println!();
    println!("--- Shots ---");
    println!(
        "  fired={} resolved={} hits={} hit_rate={:.2} reward={:.1}",
        summary.stats.fired,
        summary.stats.resolved,
        summary.stats.hits,
        summary.stats.hit_rate(),
        summary.stats.total_reward
    );
    if summary.q_states > 0 {
        println!(
            "  Q-table: {} states -> {}",
            summary.q_states,
            config.persistence.q_table_path.display()
        );
    }
    Ok(())
}

fn cmd_inspect(path: &Path, kind: ControllerKind) -> Result<()> {
    let space = controllers::action_space(&ControllerConfig::for_kind(kind))
        .with_context(|| format!("{kind} is a heuristic controller and keeps no Q-table"))?;
    let table = QTable::load(path, space.len())
        .with_context(|| format!("loading Q-table {}", path.display()))?;
    let summary = table.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_controllers() {
    for kind in ControllerKind::ALL {
        let marker = if kind == ControllerKind::default() { " (default)" } else { "" };
        let learns = if kind.learns() { "learning" } else { "heuristic" };
        println!("{:<12} {}{}", kind.name(), learns, marker);
    }
}
