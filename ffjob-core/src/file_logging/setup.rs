use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;
use anyhow::{Context, Result};

/// Line layout for log files: timestamp, level, message.
pub const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Encoder chatter that is not progress telemetry.
const STDERR_TARGET: &str = "ffjob::stderr";

/// Builds a log4rs configuration that appends to `log_file`.
///
/// The parent directory is created if needed and the file is opened
/// immediately, so a bad path fails here rather than at the first log line.
pub fn build_file_logging_config(log_file: &Path, log_level: LevelFilter) -> Result<Config> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_LOG_PATTERN)))
        .build(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    // Raw encoder output is only worth keeping when tracing.
    let stderr_level = if log_level >= LevelFilter::Trace {
        LevelFilter::Trace
    } else {
        LevelFilter::Off
    };

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(
            Logger::builder()
                .appender("file")
                .additive(false)
                .build(STDERR_TARGET, stderr_level),
        )
        .build(Root::builder().appender("file").build(log_level))?;

    Ok(config)
}

/// Installs a global logger writing to `log_file` at `log_level`.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    let config = build_file_logging_config(log_file, log_level)?;
    log4rs::init_config(config).context("installing file logger")?;
    Ok(())
}
