use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ph_calibrator::calibration::{
    CalibrationModel, CalibrationSession, CalibrationStore, Quality, SessionState,
    StabilityDetector, StabilityOutcome,
};
use ph_calibrator::config::AppConfig;
use ph_calibrator::error::{log_calibration_error, log_sensor_error, CalibrationError};
use ph_calibrator::reader::CalibratedReader;
use ph_calibrator::sensor::{RawPhSource, SerialPhSensor, SimulatedPhSensor};

/// Default path of the persisted calibration record
const DEFAULT_CALIBRATION_FILE: &str = "ph_calibration_data.json";

/// A calibration passes the buffer check when the error stays under this
const TEST_PASS_MARGIN: f64 = 0.2;

/// Centre and noise band of the simulated probe
const SIMULATED_CENTRE: f64 = 7.0;
const SIMULATED_NOISE: f64 = 0.02;

#[derive(Parser, Debug)]
#[command(
    name = "ph_cli",
    about = "Three-buffer pH probe calibration and calibrated readings"
)]
struct Cli {
    /// Path of the calibration record
    #[arg(long, default_value = DEFAULT_CALIBRATION_FILE)]
    calibration_file: PathBuf,
    /// Optional JSON config file overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Serial port of the probe (overrides the config file)
    #[arg(long)]
    port: Option<String>,
    /// Use a simulated probe instead of serial hardware
    #[arg(long)]
    simulate: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a new three-buffer calibration and save the fitted curve
    Calibrate,
    /// Check the stored calibration against a known buffer solution
    Test,
    /// Take calibrated readings (raw fallback when no record exists)
    Read {
        /// Report a single unmodified raw reading
        #[arg(long)]
        raw: bool,
        /// Keep reading until interrupted
        #[arg(long)]
        watch: bool,
        /// Seconds between readings in watch mode
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
    },
    /// Print the stored calibration record and its quality
    Show,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    if let Some(port) = &cli.port {
        config.sensor.port = port.clone();
    }
    let store = CalibrationStore::new(&cli.calibration_file);
    tracing::info!(
        "[Cli] Records at {}; probe backend: {}",
        cli.calibration_file.display(),
        if cli.simulate {
            "simulated"
        } else {
            config.sensor.port.as_str()
        }
    );

    match cli.command {
        Commands::Calibrate => {
            if cli.simulate {
                run_calibrate(simulated_probe(), &config, &store)
            } else {
                run_calibrate(open_serial(&config)?, &config, &store)
            }
        }
        Commands::Test => {
            if cli.simulate {
                run_test(simulated_probe(), &config, &store)
            } else {
                run_test(open_serial(&config)?, &config, &store)
            }
        }
        Commands::Read {
            raw,
            watch,
            interval,
        } => {
            if cli.simulate {
                run_read(simulated_probe(), &config, &store, raw, watch, interval)
            } else {
                run_read(open_serial(&config)?, &config, &store, raw, watch, interval)
            }
        }
        Commands::Show => run_show(&config, &store),
    }
}

fn open_serial(config: &AppConfig) -> Result<SerialPhSensor> {
    SerialPhSensor::open(&config.sensor)
        .with_context(|| format!("opening pH probe on {}", config.sensor.port))
}

fn simulated_probe() -> SimulatedPhSensor {
    SimulatedPhSensor::new(SIMULATED_CENTRE, SIMULATED_NOISE)
}

fn run_calibrate<S: RawPhSource>(
    mut source: S,
    config: &AppConfig,
    store: &CalibrationStore,
) -> Result<ExitCode> {
    let detector = StabilityDetector::from_config(&config.stability);
    let mut session = CalibrationSession::new(detector);

    println!("=== pH Sensor Calibration ===");
    println!("This calibration uses pH 4, 7, and 10 buffer solutions.");
    println!("Make sure you have clean calibration fluids ready.");

    loop {
        match session.state() {
            SessionState::AwaitingBuffer(stage) => {
                println!();
                println!(
                    "Calibrating with {} (pH {:.1})",
                    stage.display_name(),
                    stage.target_ph()
                );
                println!("Immerse the probe in the calibration fluid.");
                prompt("Press Enter when ready...")?;
                session.begin_sampling()?;
                println!("Taking readings...");
            }
            SessionState::Sampling(stage) => {
                if collect_until_stable(&mut source, &mut session, config)? {
                    continue;
                }
                println!(
                    "Readings for {} did not settle within {} polls.",
                    stage.display_name(),
                    config.session.max_polls_per_stage
                );
                if confirm("Retry this buffer? [y/N] ")? {
                    session.restart_stage()?;
                } else {
                    session.abort()?;
                }
            }
            SessionState::Stabilized { stage, value } => {
                println!(
                    "Stable reading achieved for {}: {:.3}",
                    stage.display_name(),
                    value
                );
                session.advance()?;
            }
            SessionState::Fitting => {
                let model = session.fit()?;
                print_fit_report(&model, config.quality.min_r_squared);
                store.save(&model)?;
                session.mark_saved()?;
                tracing::info!(
                    "[Cli] Calibration session complete; record at {}",
                    store.path().display()
                );
                println!("Calibration data saved to {}", store.path().display());
            }
            SessionState::Saved => return Ok(ExitCode::SUCCESS),
            SessionState::Aborted => {
                println!("Calibration aborted.");
                return Ok(ExitCode::from(1));
            }
        }
    }
}

/// Poll the probe until the current stage settles or the budget runs out
///
/// # Returns
/// * `Ok(true)` - Stage stabilized
/// * `Ok(false)` - Poll budget exhausted
fn collect_until_stable<S: RawPhSource>(
    source: &mut S,
    session: &mut CalibrationSession,
    config: &AppConfig,
) -> Result<bool> {
    let interval = Duration::from_millis(config.session.poll_interval_ms);
    for poll in 0..config.session.max_polls_per_stage {
        let raw = match source.next_raw_reading() {
            Ok(raw) => raw,
            Err(err) => {
                log_sensor_error(&err, "collect_readings");
                session.abort()?;
                return Err(err).context("reading the probe during calibration");
            }
        };
        session.add_reading(raw)?;
        println!("Reading {}: {:.3}", poll + 1, raw);

        match session.assess()? {
            StabilityOutcome::Stable { .. } => return Ok(true),
            StabilityOutcome::TooFewSamples { .. } => {}
            StabilityOutcome::TooNoisy { std_dev, .. } => {
                println!("  readings not stable yet (std dev: {:.3})", std_dev);
            }
        }
        thread::sleep(interval);
    }
    Ok(false)
}

fn print_fit_report(model: &CalibrationModel, min_r_squared: f64) {
    let curve = &model.calibration_curve;
    println!();
    println!("=== Calibration Results ===");
    println!("Slope: {:.6}", curve.slope);
    println!("Intercept: {:.6}", curve.intercept);
    println!("R-squared: {:.6}", curve.r_squared);
    println!("Standard error: {:.6}", curve.std_error);
    match model.evaluate_quality(min_r_squared) {
        Quality::Good => {
            println!("Calibration quality is good (R-squared > {})", min_r_squared);
        }
        Quality::Poor => {
            println!(
                "Calibration quality is poor (R-squared <= {}). Consider recalibrating.",
                min_r_squared
            );
        }
    }
}

fn run_test<S: RawPhSource>(
    mut source: S,
    config: &AppConfig,
    store: &CalibrationStore,
) -> Result<ExitCode> {
    let model = match store.load() {
        Ok(model) => model,
        Err(CalibrationError::NoCalibrationFile { .. }) => {
            println!("No calibration data available for testing.");
            return Ok(ExitCode::from(1));
        }
        Err(err) => {
            log_calibration_error(&err, "load_calibration");
            return Err(err).context("loading the calibration record");
        }
    };

    println!("=== Calibration Test ===");
    println!("Immerse the probe in a known buffer solution.");
    let answer = prompt("Enter the pH of the test buffer (4, 7, or 10): ")?;
    let target: f64 = answer
        .trim()
        .parse()
        .context("buffer pH must be a number")?;
    if ![4.0, 7.0, 10.0].contains(&target) {
        bail!("invalid buffer pH {}: use 4, 7, or 10", answer.trim());
    }

    println!("Testing with pH {:.0} buffer...", target);
    prompt("Press Enter when ready...")?;
    println!("Taking readings...");
    let raw = match stable_reading(&mut source, config)? {
        Some(raw) => raw,
        None => {
            println!("Readings did not settle; test aborted. Try again with fresh buffer fluid.");
            return Ok(ExitCode::from(1));
        }
    };

    let calibrated = model.apply(raw);
    let error = (calibrated - target).abs();

    println!();
    println!("=== Test Results ===");
    println!("Raw reading: {:.3}", raw);
    println!("Calibrated pH: {:.2}", calibrated);
    println!("Expected pH: {:.1}", target);
    println!("Error: {:.2} pH units", error);
    if error < TEST_PASS_MARGIN {
        println!("Calibration test passed (error < {} pH units)", TEST_PASS_MARGIN);
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "Calibration test failed (error >= {} pH units). Consider recalibrating.",
            TEST_PASS_MARGIN
        );
        Ok(ExitCode::from(1))
    }
}

/// Poll the probe until the stability detector accepts a window
///
/// # Returns
/// * `Ok(Some(value))` - Settled mean
/// * `Ok(None)` - Poll budget exhausted
fn stable_reading<S: RawPhSource>(source: &mut S, config: &AppConfig) -> Result<Option<f64>> {
    let detector = StabilityDetector::from_config(&config.stability);
    let interval = Duration::from_millis(config.session.poll_interval_ms);
    let mut window = Vec::new();

    for poll in 0..config.session.max_polls_per_stage {
        let raw = source.next_raw_reading().context("reading the probe")?;
        window.push(raw);
        println!("Reading {}: {:.3}", poll + 1, raw);

        match detector.assess(&window) {
            StabilityOutcome::Stable { value } => return Ok(Some(value)),
            StabilityOutcome::TooFewSamples { .. } => {}
            StabilityOutcome::TooNoisy { std_dev, .. } => {
                println!("  readings not stable yet (std dev: {:.3})", std_dev);
            }
        }
        thread::sleep(interval);
    }
    Ok(None)
}

fn run_read<S: RawPhSource>(
    source: S,
    config: &AppConfig,
    store: &CalibrationStore,
    raw: bool,
    watch: bool,
    interval: f64,
) -> Result<ExitCode> {
    if !(0.0..=86_400.0).contains(&interval) {
        bail!("invalid --interval {}: use 0 to 86400 seconds", interval);
    }
    let model = store
        .load_optional()
        .context("loading the calibration record")?;
    let mut reader = CalibratedReader::new(source, model, config.reader.samples_per_reading);
    if !raw {
        match reader.model() {
            Some(model) => println!("Using calibration from {}", model.calibration_date),
            None => println!("No calibration found; reporting raw sensor values."),
        }
    }
    let pause = Duration::from_secs_f64(interval);

    loop {
        if raw {
            let value = reader.read_raw().context("reading the probe")?;
            println!("raw: {:.3}", value);
        } else {
            let reading = reader.read().context("reading the probe")?;
            let label = if reading.calibrated { "pH" } else { "raw" };
            println!(
                "{}: {:.2} (std dev {:.3})",
                label, reading.value, reading.dispersion
            );
        }
        if !watch {
            return Ok(ExitCode::SUCCESS);
        }
        thread::sleep(pause);
    }
}

fn run_show(config: &AppConfig, store: &CalibrationStore) -> Result<ExitCode> {
    match store.load() {
        Ok(model) => {
            println!("=== Current Calibration Data ===");
            println!("{}", serde_json::to_string_pretty(&model)?);
            match model.evaluate_quality(config.quality.min_r_squared) {
                Quality::Good => println!("Quality: good"),
                Quality::Poor => println!("Quality: poor. Consider recalibrating."),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(CalibrationError::NoCalibrationFile { .. }) => {
            println!("No calibration data found at {}", store.path().display());
            Ok(ExitCode::from(1))
        }
        Err(err) => {
            log_calibration_error(&err, "load_calibration");
            Err(err).context("loading the calibration record")
        }
    }
}

/// Print a prompt and read one line from stdin
fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("reading operator input")?;
    Ok(line)
}

/// Yes/no prompt defaulting to no
fn confirm(message: &str) -> Result<bool> {
    let answer = prompt(message)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
