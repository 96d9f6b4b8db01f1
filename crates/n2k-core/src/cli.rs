//! Command-line surface: `validate` for finished log files and `record` for
//! replaying decoded messages through a live logger.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use n2k_common::{InboundMessage, COLUMN_COUNT};
use n2k_config::{resolve_config, ConfigError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LoggerError;
use crate::exit_codes::ExitCode;
use crate::logger::DataLogger;
use crate::logging::LogFormat;
use crate::stats::Statistics;
use crate::validate::{
    validate_schema, validate_timing_with_period, ValidationReport, DEFAULT_TIMING_TOLERANCE_SECS,
    NOMINAL_PERIOD_SECS,
};

const RULE_WIDTH: usize = 60;

/// Fixed-rate NMEA 2000 sample logger tools
#[derive(Parser, Debug)]
#[command(name = "n2k-core", version, about)]
pub struct Cli {
    /// Log output format on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a CSV log file for format compliance and timing
    Validate(ValidateArgs),
    /// Log decoded messages (JSON lines) from a file or stdin
    Record(RecordArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to CSV file to validate
    pub csv_file: PathBuf,

    /// Skip 1 Hz timing validation
    #[arg(long)]
    pub skip_timing: bool,

    /// Tolerance for timing in seconds
    #[arg(long, default_value_t = DEFAULT_TIMING_TOLERANCE_SECS)]
    pub timing_tolerance: f64,

    /// Nominal sampling period in seconds
    #[arg(long, default_value_t = NOMINAL_PERIOD_SECS)]
    pub period: f64,

    /// Print the reports as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Configuration file (YAML, or JSON by extension)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON-lines input; stdin when omitted or "-"
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Override logging.data_directory
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override sampling.period_ms
    #[arg(long, value_name = "MS")]
    pub period_ms: Option<u64>,

    /// Keep logging for this many seconds instead of stopping at end of input
    #[arg(long, value_name = "SECS")]
    pub duration_secs: Option<f64>,
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> ExitCode {
    match &cli.command {
        Commands::Validate(args) => run_validate(args, cli.verbose),
        Commands::Record(args) => run_record(args),
    }
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    file: &'a Path,
    passed: bool,
    schema: &'a ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    timing: Option<&'a ValidationReport>,
}

fn run_validate(args: &ValidateArgs, verbose: bool) -> ExitCode {
    let path = &args.csv_file;
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        return ExitCode::ValidationFailed;
    }
    if !is_positive(args.period) || args.timing_tolerance.is_nan() || args.timing_tolerance < 0.0 {
        eprintln!("Error: --period must be positive and --timing-tolerance non-negative");
        return ExitCode::ConfigError;
    }

    let schema = validate_schema(path);
    let timing = (!args.skip_timing)
        .then(|| validate_timing_with_period(path, args.period, args.timing_tolerance));
    let passed = schema.passed && timing.as_ref().is_none_or(|t| t.passed);

    if args.json {
        let output = ValidateOutput {
            file: path,
            passed,
            schema: &schema,
            timing: timing.as_ref(),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                return ExitCode::InternalError;
            }
        }
    } else {
        print_validation(args, verbose, &schema, timing.as_ref());
    }

    if passed {
        ExitCode::Clean
    } else {
        ExitCode::ValidationFailed
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn print_validation(
    args: &ValidateArgs,
    verbose: bool,
    schema: &ValidationReport,
    timing: Option<&ValidationReport>,
) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("Validating CSV file: {}", args.csv_file.display());
    println!("{rule}");

    println!("\n1. Checking CSV format compliance...");
    if schema.passed {
        println!("   ✓ CSV format is valid");
        if verbose {
            println!("   - Column count: {COLUMN_COUNT}");
            println!("   - Column names match reference");
            println!("   - Version line present");
        }
    } else {
        println!("   ✗ CSV format validation FAILED");
        for error in &schema.errors {
            println!("     - {error}");
        }
    }

    match timing {
        Some(report) => {
            println!("\n2. Checking sampling frequency...");
            if report.passed {
                println!("   ✓ Sample timing is valid");
                if verbose {
                    println!("   - Period: {}s", args.period);
                    println!("   - Tolerance: ±{}s", args.timing_tolerance);
                    if let Some(stats) = report.intervals {
                        println!("   - Intervals checked: {}", stats.intervals);
                        println!("   - Max deviation: {:.3}s", stats.max_deviation_secs);
                    }
                }
            } else {
                println!("   ✗ Sample timing validation FAILED");
                for error in &report.errors {
                    println!("     - {error}");
                }
            }
        }
        None => println!("\n2. Skipping timing validation (--skip-timing)"),
    }

    println!("\n{rule}");
    let timing_failed = timing.is_some_and(|t| !t.passed);
    if schema.passed && !timing_failed {
        println!("✓ All validations PASSED");
    } else {
        println!("✗ Validation FAILED");
        if !schema.passed {
            println!("  - CSV format issues detected");
        }
        if timing_failed {
            println!("  - Timing issues detected");
        }
    }
}

/// Lines seen by the replay thread, readable while it is still blocked on input.
#[derive(Debug, Default)]
struct ReplayCounts {
    lines: AtomicU64,
    skipped: AtomicU64,
}

impl ReplayCounts {
    fn lines(&self) -> u64 {
        self.lines.load(Ordering::Acquire)
    }

    fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Acquire)
    }
}

#[derive(Serialize)]
struct RecordSummary {
    data_directory: PathBuf,
    lines_read: u64,
    lines_skipped: u64,
    statistics: Statistics,
}

fn run_record(args: &RecordArgs) -> ExitCode {
    let (mut config, source) = match resolve_config(args.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {e}");
            return match e {
                ConfigError::Io { .. } => ExitCode::IoError,
                _ => ExitCode::ConfigError,
            };
        }
    };
    info!(source = %source, "configuration resolved");
    if let Some(dir) = &args.data_dir {
        config.logging.data_directory = dir.clone();
    }
    if let Some(period_ms) = args.period_ms {
        config.sampling.period_ms = period_ms;
    }
    let duration = match args.duration_secs.map(Duration::try_from_secs_f64).transpose() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: invalid --duration-secs: {e}");
            return ExitCode::ConfigError;
        }
    };

    let input: Box<dyn BufRead + Send> = match args.input.as_deref() {
        None => Box::new(BufReader::new(io::stdin())),
        Some(p) if p == Path::new("-") => Box::new(BufReader::new(io::stdin())),
        Some(p) => match File::open(p) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("Error: cannot open input {}: {e}", p.display());
                return ExitCode::IoError;
            }
        },
    };

    let logger = match DataLogger::new(config) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            eprintln!("Error: {e}");
            return match e {
                LoggerError::DataDirectory { .. }
                | LoggerError::DataDirectoryNotWritable { .. } => ExitCode::IoError,
                LoggerError::InvalidConfig(_) | LoggerError::FilenameFormat(_) => {
                    ExitCode::ConfigError
                }
                LoggerError::Spawn(_) => ExitCode::InternalError,
            };
        }
    };
    if let Err(e) = logger.start() {
        eprintln!("Error: {e}");
        return ExitCode::InternalError;
    }

    let started = Instant::now();
    let counts = Arc::new(ReplayCounts::default());
    let reader = {
        let logger = Arc::clone(&logger);
        let counts = Arc::clone(&counts);
        thread::spawn(move || replay(input, &logger, &counts))
    };

    match duration {
        Some(limit) => {
            thread::sleep(limit);
            // A reader still blocked on input is left behind.
            if reader.is_finished() {
                if reader.join().is_err() {
                    warn!("input reader panicked");
                }
            } else {
                debug!("input still open after duration elapsed");
            }
        }
        None => {
            if reader.join().is_err() {
                warn!("input reader panicked");
            }
        }
    }

    let stopped = logger.stop();
    let (lines, skipped) = (counts.lines(), counts.skipped());
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        lines,
        skipped,
        "recording finished"
    );

    let summary = RecordSummary {
        data_directory: logger.data_directory().to_path_buf(),
        lines_read: lines,
        lines_skipped: skipped,
        statistics: logger.statistics(),
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to serialize statistics: {e}");
            return ExitCode::InternalError;
        }
    }

    if stopped {
        ExitCode::Clean
    } else {
        ExitCode::InternalError
    }
}

/// Feed every JSON-lines record into the logger until end of input.
fn replay(input: impl BufRead, logger: &DataLogger, counts: &ReplayCounts) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stopped reading input");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let number = counts.lines.fetch_add(1, Ordering::AcqRel) + 1;
        match InboundMessage::from_json_str(line) {
            Ok(message) => logger.handle_message(message),
            Err(e) => {
                counts.skipped.fetch_add(1, Ordering::AcqRel);
                debug!(line = number, error = %e, "skipping unparseable input line");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Read;
    use std::sync::mpsc;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_validate_defaults() {
        let cli = Cli::try_parse_from(["n2k-core", "validate", "log.csv"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.csv_file, PathBuf::from("log.csv"));
        assert!(!args.skip_timing);
        assert_eq!(args.timing_tolerance, 0.2);
        assert_eq!(args.period, 1.0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "n2k-core", "validate", "x.csv", "-v", "--log-format", "json", "--skip-timing",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    const SPEED_LINE: &str =
        r#"{"pgn": 128259, "fields": [{"id": "speed_water_referenced", "value": 6.5}]}"#;

    /// Yields its text, then blocks like an idle stdin until `release` is dropped.
    struct StalledInput {
        text: io::Cursor<Vec<u8>>,
        release: mpsc::Receiver<()>,
    }

    impl io::Read for StalledInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.text.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            let _ = self.release.recv();
            Ok(0)
        }
    }

    fn test_logger(dir: &Path) -> DataLogger {
        DataLogger::new(n2k_config::LoggerConfig::with_data_directory(dir)).unwrap()
    }

    #[test]
    fn test_replay_counts_lines() {
        let tmp = tempfile::TempDir::new().unwrap();
        let logger = test_logger(tmp.path());
        let input = format!("\n{SPEED_LINE}\nnot json\n[1,2]\n");
        let counts = ReplayCounts::default();
        replay(input.as_bytes(), &logger, &counts);
        assert_eq!(counts.lines(), 3);
        assert_eq!(counts.skipped(), 2);
        assert_eq!(logger.statistics().max_speed, 6.5);
    }

    #[test]
    fn test_replay_counts_visible_while_input_open() {
        let tmp = tempfile::TempDir::new().unwrap();
        let logger = Arc::new(test_logger(tmp.path()));
        let counts = Arc::new(ReplayCounts::default());
        let (hold, release) = mpsc::channel::<()>();
        let input = StalledInput {
            text: io::Cursor::new(format!("{SPEED_LINE}\nnot json\n").into_bytes()),
            release,
        };

        let reader = {
            let logger = Arc::clone(&logger);
            let counts = Arc::clone(&counts);
            thread::spawn(move || replay(BufReader::new(input), &logger, &counts))
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while counts.lines() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!reader.is_finished());
        assert_eq!(counts.lines(), 2);
        assert_eq!(counts.skipped(), 1);
        assert_eq!(logger.statistics().max_speed, 6.5);

        drop(hold);
        reader.join().unwrap();
    }
}
