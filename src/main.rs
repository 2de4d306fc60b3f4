//! Theremidi - a capacitive proximity theremin that speaks MIDI

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use theremidi::config;
use theremidi::engine::{self, Engine};
use theremidi::mapping::{pitch_class, CurveMapper, MappingPipeline, MappingSpec, QuantizeMapper, Scale};
use theremidi::sensors::{LoggedResetLine, ReplayDriver, SimulatedDriver, SimulationSettings, TouchDriver};

mod cli;

use cli::{Cli, Commands, CurveArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config: config_path,
            trace,
            simulate,
            polls,
        } => {
            let cfg = config::load_config(&config_path)?;

            let driver: Box<dyn TouchDriver> = match (trace, simulate) {
                (Some(path), _) => {
                    let driver = ReplayDriver::from_path(&path)?;
                    info!("replaying {} frames from {:?}", driver.len(), path);
                    Box::new(driver)
                }
                (None, true) => Box::new(SimulatedDriver::new(cfg.electrodes, SimulationSettings::default())),
                (None, false) => bail!("No touch controller attached: pass --trace <file> or --simulate"),
            };

            let transport = engine::open_transport(&cfg.output)
                .with_context(|| format!("failed to open MIDI output {:?}", cfg.output))?;

            let mut engine = Engine::new(cfg, driver, Box::new(LoggedResetLine), transport);
            engine.start()?;

            let running = Arc::new(AtomicBool::new(true));
            let handler_flag = Arc::clone(&running);
            ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

            engine.run(&running, polls)?;
        }

        Commands::Ports => {
            println!("Available MIDI output ports:\n");

            match engine::list_ports() {
                Ok(ports) if ports.is_empty() => println!("  (none)"),
                Ok(ports) => {
                    for port in ports {
                        println!("  - {}", port);
                    }
                }
                Err(e) => println!("  Error listing ports: {}", e),
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  MIDI channel: {}", cfg.midi.channel);
                    println!("  Output: {:?}", cfg.output);
                    println!("  Poll period: {} ms", cfg.timing.poll_ms);
                    println!(
                        "  Electrodes: pitch {}, volume {}, up {}, down {}",
                        cfg.electrodes.pitch,
                        cfg.electrodes.volume,
                        cfg.electrodes.instrument_up,
                        cfg.electrodes.instrument_down
                    );
                    println!(
                        "  Pitch: {}..{}{} curve {} ({} {})",
                        cfg.pitch.low,
                        cfg.pitch.high,
                        if cfg.pitch.inverted { " inverted" } else { "" },
                        cfg.pitch.curve,
                        cfg.pitch.key,
                        cfg.pitch.scale
                    );
                    println!(
                        "  Volume: {}..{}{} curve {}",
                        cfg.volume.low,
                        cfg.volume.high,
                        if cfg.volume.inverted { " inverted" } else { "" },
                        cfg.volume.curve
                    );
                    println!(
                        "  Instruments: {}..={} starting at {}",
                        cfg.instruments.first, cfg.instruments.last, cfg.instruments.default
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../theremidi.example.yaml");

            let path = "theremidi.yaml";
            if std::path::Path::new(path).exists() {
                println!("theremidi.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created theremidi.yaml with example configuration.");
            }
        }

        Commands::Curve(args) => print_curve(&args)?,
    }

    Ok(())
}

fn print_curve(args: &CurveArgs) -> Result<()> {
    if args.steps < 2 {
        bail!("Need at least 2 steps");
    }
    if args.in_min >= args.in_max {
        bail!("--in-min must be below --in-max");
    }

    let spec = MappingSpec::new(args.low, args.high, args.inverted, args.curve);
    let mut pipeline = MappingPipeline::new().with(CurveMapper::new("curve", args.in_min, args.in_max, spec));

    if let Some(name) = &args.scale {
        let scale = Scale::from_name(name).with_context(|| format!("unknown scale '{}'", name))?;
        let root = pitch_class(&args.key).with_context(|| format!("unknown key '{}'", args.key))?;
        pipeline = pipeline.with(QuantizeMapper::new(name, root, scale));
    }

    println!("Stages: {}", pipeline.stages().join(" -> "));
    println!("{:>12}  {:>10}", "reading", "output");

    let span = args.in_max - args.in_min;
    for i in 0..args.steps {
        let reading = args.in_min + span * i as f64 / (args.steps - 1) as f64;
        println!("{:>12.1}  {:>10.3}", reading, pipeline.apply(reading));
    }

    Ok(())
}
