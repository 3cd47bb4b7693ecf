use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{DEFAULT_LOG_DIR, DEFAULT_MAX_LOG_FILES};
use crate::error::{DeployError, Result};

const LOG_FILE_PREFIX: &str = "deploy";
const LOG_FILE_SUFFIX: &str = "log";

/// Rotating JSON log files, one per day by default.
#[derive(Debug, Clone)]
pub struct FileLogger {
    log_directory: PathBuf,
    max_files: usize,
    rotation: Rotation,
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_LOG_DIR))
    }
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            max_files: DEFAULT_MAX_LOG_FILES,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn create_file_appender(&self) -> Result<RollingFileAppender> {
        std::fs::create_dir_all(&self.log_directory)?;

        RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.log_directory)
            .map_err(|e: InitError| DeployError::Io(std::io::Error::other(e)))
    }

    /// The writer must be paired with its guard; dropping the guard flushes
    /// and stops the background writer.
    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        let file_appender = self.create_file_appender()?;
        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Installs the global subscriber: console output plus JSON lines to the
/// rotating file. Keep the returned guard alive for the lifetime of `main`.
pub fn setup_logging(file_logger: &FileLogger) -> Result<WorkerGuard> {
    let (file_writer, guard) = file_logger.setup_file_logging()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer()) // Console output
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

/// In-memory subscriber for asserting on what the service logs.
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;

    #[derive(Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Routes this thread's events into the returned buffer until the guard drops.
    pub(crate) fn capture_logs() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }
}

#[cfg(test)]
mod tests {
    use super::capture::capture_logs;
    use super::*;

    #[test]
    fn captured_logs_keep_level_and_message() {
        let (logs, _guard) = capture_logs();
        tracing::warn!("The secret will be ignored.");

        let contents = logs.contents();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("The secret will be ignored."));
    }

    #[test]
    fn creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let logger = FileLogger::new(log_dir.clone())
            .with_max_files(2)
            .with_rotation(Rotation::NEVER);
        logger.create_file_appender().unwrap();

        assert!(log_dir.is_dir());
    }
}
