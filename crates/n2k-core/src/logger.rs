//! The data logger: lifecycle, ingestion entry point and the emission worker.
//!
//! Ingestion threads call [`DataLogger::handle_message`] at any rate; a single
//! background worker snapshots the sample buffer once per sampling period and
//! appends the row to the current CSV file.
//!
//! ```text
//!   Stopped ──start()──▶ Running ──stop()──▶ Stopping ──worker exits──▶ Stopped
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use n2k_common::{to_serial_time, InboundMessage, N2kMessage};
use n2k_config::LoggerConfig;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::buffer::SampleBuffer;
use crate::error::{LoggerError, Result, TickError};
use crate::mapper::{MapperOptions, PgnMapper};
use crate::sink::{render_filename, LogFile};
use crate::stats::{Statistics, StatsTracker};

/// Minimum spacing between repeated tick error reports.
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(10);

const WRITE_PROBE: &str = ".n2k_write_probe";

/// Lifecycle phase of a [`DataLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Stopped,
    Running,
    Stopping,
}

struct Control {
    phase: Mutex<LoggerState>,
    signal: Condvar,
    current_file: Mutex<Option<PathBuf>>,
}

impl Control {
    fn is_running(&self) -> bool {
        *self.phase.lock() == LoggerState::Running
    }

    /// Sleep until `deadline`; returns false as soon as a stop is requested.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut phase = self.phase.lock();
        while *phase == LoggerState::Running {
            if self.signal.wait_until(&mut phase, deadline).timed_out() {
                break;
            }
        }
        *phase == LoggerState::Running
    }
}

struct Shared {
    buffer: SampleBuffer,
    stats: StatsTracker,
    control: Control,
}

/// Fixed-rate sample logger.
pub struct DataLogger {
    config: Arc<LoggerConfig>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DataLogger {
    /// Validate `config` and prepare the data directory.
    ///
    /// Fails if the configuration is invalid, the filename pattern cannot be
    /// rendered, or the data directory cannot be created or written to.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        n2k_config::validate(&config).map_err(LoggerError::InvalidConfig)?;

        let format = &config.logging.csv_filename_format;
        if render_filename(format, &Local::now()).is_none() {
            return Err(LoggerError::FilenameFormat(format.clone()));
        }

        let dir = &config.logging.data_directory;
        prepare_data_directory(dir)?;
        info!(
            data_directory = %dir.display(),
            period_ms = config.sampling.period_ms,
            boat_id = %config.sampling.boat_id,
            "data logger initialized"
        );

        let mapper = PgnMapper::new(MapperOptions {
            water_speed_as_sog: config.mapping.water_speed_as_sog,
        });
        let shared = Arc::new(Shared {
            buffer: SampleBuffer::new(&config.sampling.boat_id, mapper),
            stats: StatsTracker::new(),
            control: Control {
                phase: Mutex::new(LoggerState::Stopped),
                signal: Condvar::new(),
                current_file: Mutex::new(None),
            },
        });

        Ok(Self {
            config: Arc::new(config),
            shared,
            worker: Mutex::new(None),
        })
    }

    /// Begin periodic emission. Calling this while not stopped is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        {
            let mut phase = self.shared.control.phase.lock();
            if *phase != LoggerState::Stopped {
                warn!(state = ?*phase, "start requested while logger is not stopped; ignoring");
                return Ok(());
            }
            *phase = LoggerState::Running;
        }

        // A worker that outlived a timed-out stop has finished by now.
        if let Some(stale) = worker.take() {
            let _ = stale.join();
        }

        let emitter = Emitter::new(Arc::clone(&self.shared), Arc::clone(&self.config));
        let spawned = thread::Builder::new()
            .name("n2k-emitter".into())
            .spawn(move || emitter.run());
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!("data logger started");
                Ok(())
            }
            Err(e) => {
                *self.shared.control.phase.lock() = LoggerState::Stopped;
                Err(LoggerError::Spawn(e))
            }
        }
    }

    /// Request the worker to finish and wait up to the configured timeout.
    ///
    /// Returns true once the logger is stopped. Idempotent.
    pub fn stop(&self) -> bool {
        let control = &self.shared.control;
        let deadline = Instant::now() + self.config.stop_timeout();

        let stopped = {
            let mut phase = control.phase.lock();
            match *phase {
                LoggerState::Stopped => return true,
                LoggerState::Running => {
                    *phase = LoggerState::Stopping;
                    control.signal.notify_all();
                }
                LoggerState::Stopping => {}
            }
            while *phase != LoggerState::Stopped {
                if control.signal.wait_until(&mut phase, deadline).timed_out() {
                    break;
                }
            }
            *phase == LoggerState::Stopped
        };

        if stopped {
            if let Some(handle) = self.worker.lock().take() {
                if handle.join().is_err() {
                    error!("emission worker panicked");
                }
            }
            info!("data logger stopped");
        } else {
            warn!(
                timeout_ms = self.config.sampling.stop_timeout_ms,
                "emission worker did not stop in time"
            );
        }
        stopped
    }

    pub fn state(&self) -> LoggerState {
        *self.shared.control.phase.lock()
    }

    /// Ingest one message in any accepted shape. Malformed input is dropped.
    pub fn handle_message(&self, message: InboundMessage) {
        match message.normalize() {
            Ok(msg) => {
                self.apply_message(&msg);
            }
            Err(e) => trace!(error = %e, code = e.code(), "dropping malformed message"),
        }
    }

    /// Ingest one canonical message; returns the number of columns written.
    pub fn apply_message(&self, msg: &N2kMessage) -> usize {
        self.shared.stats.update(msg);
        self.shared.buffer.apply_message(msg)
    }

    pub fn statistics(&self) -> Statistics {
        self.shared.stats.snapshot()
    }

    pub fn data_directory(&self) -> &Path {
        &self.config.logging.data_directory
    }

    /// Path of the CSV file currently being written, if any.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.shared.control.current_file.lock().clone()
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }
}

impl Drop for DataLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

fn prepare_data_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| LoggerError::DataDirectory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let probe = dir.join(WRITE_PROBE);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .map_err(|e| LoggerError::DataDirectoryNotWritable {
            path: dir.to_path_buf(),
            source: e,
        })?;
    if let Err(e) = fs::remove_file(&probe) {
        debug!(path = %probe.display(), error = %e, "failed to remove write probe");
    }
    Ok(())
}

/// Logs the first failure immediately, then at most once per interval.
struct ErrorThrottle {
    last_logged: Option<Instant>,
    suppressed: u64,
    total: u64,
}

impl ErrorThrottle {
    fn new() -> Self {
        Self {
            last_logged: None,
            suppressed: 0,
            total: 0,
        }
    }

    fn report(&mut self, err: &TickError) {
        self.total += 1;
        let due = self
            .last_logged
            .is_none_or(|last| last.elapsed() >= ERROR_LOG_INTERVAL);
        if !due {
            self.suppressed += 1;
            return;
        }
        self.last_logged = Some(Instant::now());
        error!(
            error = %err,
            suppressed_count = self.suppressed,
            total_errors = self.total,
            "emission tick failed"
        );
        self.suppressed = 0;
    }
}

/// State owned by the emission worker thread.
struct Emitter {
    shared: Arc<Shared>,
    config: Arc<LoggerConfig>,
    file: Option<LogFile>,
    last_flush: Instant,
    errors: ErrorThrottle,
}

impl Emitter {
    fn new(shared: Arc<Shared>, config: Arc<LoggerConfig>) -> Self {
        Self {
            shared,
            config,
            file: None,
            last_flush: Instant::now(),
            errors: ErrorThrottle::new(),
        }
    }

    fn run(mut self) {
        let period = self.config.period();
        let warn_every = self.config.sampling.timing_warn_every.max(1);
        debug!(period_ms = period.as_millis() as u64, "emission worker running");

        loop {
            let started = Instant::now();
            let deadline = started + period;

            if let Err(e) = self.tick() {
                self.errors.report(&e);
                // A failed file is abandoned; the next tick opens a fresh one.
                if !matches!(e, TickError::FilenameFormat(_)) {
                    self.abandon_file();
                }
                if !self.shared.control.wait_until(Instant::now() + self.config.error_backoff()) {
                    break;
                }
                continue;
            }

            let now = Instant::now();
            if now >= deadline {
                let total = self.shared.stats.record_timing_error();
                if total == 1 || total % warn_every == 0 {
                    warn!(
                        elapsed_ms = now.duration_since(started).as_millis() as u64,
                        period_ms = period.as_millis() as u64,
                        timing_errors = total,
                        "emission tick overran sampling period"
                    );
                }
                if !self.shared.control.is_running() {
                    break;
                }
                continue;
            }

            if !self.shared.control.wait_until(deadline) {
                break;
            }
        }

        self.shutdown();
    }

    /// Snapshot the buffer and append one row.
    fn tick(&mut self) -> std::result::Result<(), TickError> {
        let row = self.shared.buffer.snapshot(to_serial_time(Utc::now()));

        let rotate = match (&self.file, self.config.rotate_interval()) {
            (Some(file), Some(every)) => file.age() >= every,
            _ => false,
        };
        if rotate {
            if let Some(old) = self.file.take() {
                debug!(
                    path = %old.path().display(),
                    rows = old.rows_written(),
                    "rotating log file"
                );
                old.close()?;
            }
        }

        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let opened = LogFile::create(
                    &self.config.logging.data_directory,
                    &self.config.logging.csv_filename_format,
                    &Local::now(),
                )?;
                *self.shared.control.current_file.lock() = Some(opened.path().to_path_buf());
                self.last_flush = Instant::now();
                opened
            }
        };
        let file = self.file.insert(file);

        file.write_row(&row)?;
        self.shared.stats.record_row();

        if self.last_flush.elapsed() >= self.config.flush_interval() {
            file.flush()?;
            self.last_flush = Instant::now();
        }
        Ok(())
    }

    fn abandon_file(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        *self.shared.control.current_file.lock() = None;
    }

    fn shutdown(mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                error!(error = %e, "failed to close log file");
            }
        }
        *self.shared.control.current_file.lock() = None;

        let control = &self.shared.control;
        let mut phase = control.phase.lock();
        *phase = LoggerState::Stopped;
        control.signal.notify_all();
        debug!("emission worker exited");
    }
}
