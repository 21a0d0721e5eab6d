//! Car Interface Debug Harness
//!
//! Command-line harness around the car-interface library. It adds:
//! - Bounded model identification from a recorded frame log
//! - Per-cycle playback of signal snapshots with event printout
//! - A manual state-observation checklist for bench-testing a port
//! - TXT session report generation

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

mod checklist;
mod config;
mod playback;
mod report;

use car_interface::{
    ActuationChannel, Actuators, AlertFlags, CarInterface, FingerprintSample, FingerprintTable,
    Identification,
};
use checklist::Checklist;
use report::SessionReport;

/// Car Interface - identify a vehicle and replay signal logs through it
#[derive(Parser, Debug)]
#[command(name = "car-interface-cli")]
#[command(about = "Replay recorded bus traffic through the car interface", long_about = None)]
#[command(version)]
struct Args {
    /// Path to JSON frame log for identification
    #[arg(short, long, value_name = "FILE")]
    frames: Option<PathBuf>,

    /// Path to JSON snapshot playback to drive through the control cycle
    #[arg(short, long, value_name = "FILE")]
    playback: Option<PathBuf>,

    /// Path to a private fingerprint extension file (JSON)
    #[arg(long, value_name = "FILE")]
    extra_fingerprints: Option<PathBuf>,

    /// Frame budget for identification
    #[arg(long, value_name = "COUNT", default_value_t = 1000)]
    max_frames: usize,

    /// Skip identification and assume this model
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Step through the manual observation checklist during playback
    #[arg(long)]
    checklist: bool,

    /// Output file for the session report (default: print to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Resolved inputs for one harness session, from flags or config file
struct RunPlan {
    frame_log: Option<PathBuf>,
    playback: Option<PathBuf>,
    extra_fingerprints: Option<PathBuf>,
    max_frames: usize,
    model: Option<String>,
    checklist: bool,
    report: Option<PathBuf>,
}

impl RunPlan {
    fn from_args(args: &Args) -> Self {
        Self {
            frame_log: args.frames.clone(),
            playback: args.playback.clone(),
            extra_fingerprints: args.extra_fingerprints.clone(),
            max_frames: args.max_frames,
            model: args.model.clone(),
            checklist: args.checklist,
            report: args.output.clone(),
        }
    }

    fn from_config(config: config::AppConfig) -> Self {
        Self {
            frame_log: config.input.frame_log,
            playback: config.input.playback,
            extra_fingerprints: config.input.extra_fingerprints,
            max_frames: config.identify.max_frames,
            model: config.identify.model,
            checklist: config.output.checklist,
            report: config.output.report,
        }
    }

    fn has_input(&self) -> bool {
        self.frame_log.is_some() || self.playback.is_some()
    }
}

/// Actuation channel that only logs what would go on the wire
struct DebugChannel;

impl ActuationChannel for DebugChannel {
    fn send(
        &mut self,
        frame: u64,
        actuators: &Actuators,
        _alerts: &AlertFlags,
        cruise_cancel: bool,
    ) -> car_interface::Result<()> {
        log::debug!(
            "frame {}: steer {:.3} gas {:.3} brake {:.3} cancel {}",
            frame,
            actuators.steer,
            actuators.gas,
            actuators.brake,
            cruise_cancel
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Car Interface CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using library v{}", car_interface::VERSION);

    let plan = if let Some(config_path) = &args.config {
        log::info!("Loading configuration from: {:?}", config_path);
        RunPlan::from_config(config::load_config(config_path)?)
    } else {
        RunPlan::from_args(&args)
    };

    if !plan.has_input() {
        println!("Car Interface - No input specified");
        println!("\nQuick Start:");
        println!("  car-interface-cli --frames startup.json");
        println!("  car-interface-cli --frames startup.json --playback drive.json");
        println!("  car-interface-cli --model \"TOYOTA RAV4 2017\" --playback drive.json --checklist");
        println!("\nFor a prepared session:");
        println!("  car-interface-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    run(&plan)
}

fn run(plan: &RunPlan) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  Car Interface - Debug Harness");
    println!("═══════════════════════════════════════════════\n");

    let table = FingerprintTable::load(plan.extra_fingerprints.as_deref())?;
    let mut report = SessionReport::new();

    // Identification phase
    let ident = if let Some(path) = &plan.frame_log {
        let frames = playback::load_frames(path)?;
        print!(
            "Identifying from {} frames (budget {}) ... ",
            frames.len(),
            plan.max_frames
        );
        match table.identify(frames, plan.max_frames) {
            Ok(ident) => {
                println!("✓ {} ({} frames)", ident.model, ident.frames);
                ident
            }
            Err(e) => {
                println!("✗");
                return Err(e.into());
            }
        }
    } else if let Some(model) = &plan.model {
        if table.model_fingerprint(model).is_none() {
            bail!(
                "unknown model {:?}; known models: {:?}",
                model,
                table.all_known_cars()
            );
        }
        println!("Assuming model: {}", model);
        Identification {
            model: model.clone(),
            sample: FingerprintSample::new(),
            frames: 0,
        }
    } else {
        bail!("playback requires --frames for identification or an explicit --model");
    };
    report.set_model(&ident.model);

    // Driving phase
    if let Some(path) = &plan.playback {
        let cycles = playback::load_playback(path)?;
        let mut interface = CarInterface::from_identification(&ident, DebugChannel)?;
        let mut checklist = plan.checklist.then(Checklist::new);

        println!("\nReplaying {} cycles", cycles.len());
        println!("───────────────────────────────────────────────");

        for (n, cycle) in cycles.iter().enumerate() {
            let out = interface.update(&cycle.snapshot, &cycle.command);

            for event in &out.events {
                println!("  cycle {:>5}: {}", n, event);
            }
            for button in &out.button_events {
                let direction = if button.pressed { "pressed" } else { "released" };
                println!("  cycle {:>5}: {} {}", n, button.kind, direction);
            }
            if let Some(cl) = checklist.as_mut() {
                for step in cl.observe(&out) {
                    println!("  cycle {:>5}: ✓ observed {}", n, step);
                }
            }

            report.record(&out);
            interface.apply(&cycle.command)?;
        }

        if let Some(cl) = &checklist {
            if cl.is_done() {
                println!("\n✓ Checklist complete ({} steps)", Checklist::total());
            } else if let Some(step) = cl.current() {
                println!("\n⚠ Checklist incomplete, still waiting for: {}", step);
            }
        }
    }

    // Session summary
    println!();
    match &plan.report {
        Some(path) => {
            report.write(path)?;
            println!("✓ Report written to {:?}", path);
        }
        None => print!("{}", report.render()),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
