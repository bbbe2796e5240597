//! `tfmesh` – command line front end of the transform service.
//!
//! Replays rosbridge JSON-lines captures into a [`TransformNode`] and answers
//! frame queries against the resulting graph.  See [`args::USAGE`].

mod args;
mod replay;

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use tfmesh_runtime::config::{self, TfConfig};
use tfmesh_runtime::{GeometricTransform, TransformNode};
use tracing::debug;

use crate::args::Command;
use crate::replay::{ReplayReport, replay_file};

fn main() -> ExitCode {
    let _guard = tfmesh_runtime::init_tracing("tfmesh");

    let args = match args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}: {}\n\n{}", "error".red().bold(), e, args::USAGE);
            return ExitCode::from(2);
        }
    };

    let cfg = match config::load_or_default(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            TfConfig::default()
        }
    };
    debug!(?cfg, "configuration loaded");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: failed to start runtime: {}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args.command, cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, cfg: TfConfig) -> Result<(), String> {
    match command {
        Command::Help => {
            println!("{}", args::USAGE);
            Ok(())
        }
        Command::Config => {
            print!("{}", cfg.to_toml().map_err(|e| e.to_string())?);
            Ok(())
        }
        Command::Replay { file } => {
            let (node, report) = load_capture(cfg, &file).await?;
            print_report(&file, &report);
            print_frames(&node);
            Ok(())
        }
        Command::Frames { file } => {
            let (node, _) = load_capture(cfg, &file).await?;
            print_frames(&node);
            Ok(())
        }
        Command::Lookup {
            file,
            source,
            target,
            time_ms,
            json,
        } => {
            let (node, _) = load_capture(cfg, &file).await?;
            let service = node.service();
            let tf = match time_ms {
                Some(t) => service.lookup(&source, &target, t),
                None => service.lookup_latest(&source, &target),
            }
            .map_err(|e| e.to_string())?;

            if json {
                let text = serde_json::to_string_pretty(&tf).map_err(|e| e.to_string())?;
                println!("{text}");
            } else {
                print_transform(&tf);
            }
            Ok(())
        }
    }
}

async fn load_capture(cfg: TfConfig, file: &Path) -> Result<(TransformNode, ReplayReport), String> {
    let mut node = TransformNode::new(cfg);
    for e in node.start() {
        eprintln!("  {} {}", "⚠".yellow(), e.to_string().dimmed());
    }
    if node.feeds().active().is_empty() {
        return Err("no transform feed is enabled".to_string());
    }

    let report = replay_file(&node, file).await?;
    Ok((node, report))
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_report(file: &Path, report: &ReplayReport) {
    println!(
        "  Replayed {} ({} line(s), {} delivered)",
        file.display().to_string().bold(),
        report.lines,
        report.delivered
    );
    println!(
        "  Records: {} forwarded, {} rejected",
        report.stats.records_forwarded.to_string().green(),
        report.stats.records_rejected.to_string().yellow()
    );
    for (line, e) in &report.errors {
        println!("  {} line {}: {}", "✗".red(), line, e);
    }
}

fn print_frames(node: &TransformNode) {
    let frames = node.service().known_frames();
    println!("  {} frame(s):", frames.len());
    for frame in frames {
        println!("    • {}", frame.bold());
    }
}

fn print_transform(tf: &GeometricTransform) {
    println!(
        "  {} → {} at {} ms (sequence {})",
        tf.source.bold(),
        tf.target.bold(),
        tf.time_ms,
        tf.sequence
    );
    println!(
        "  translation: [{:.6}, {:.6}, {:.6}]",
        tf.translation.x, tf.translation.y, tf.translation.z
    );
    println!(
        "  rotation:    [{:.6}, {:.6}, {:.6}, {:.6}] (x, y, z, w)",
        tf.rotation.x, tf.rotation.y, tf.rotation.z, tf.rotation.w
    );
    println!("  matrix:");
    for row in tf.to_matrix() {
        println!(
            "    {}",
            row.iter()
                .map(|v| format!("{v:>10.6}"))
                .collect::<Vec<_>>()
                .join(" ")
                .dimmed()
        );
    }
}
