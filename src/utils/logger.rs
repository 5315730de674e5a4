use crate::config::LoggingConfig;
use crate::utils::error::{Result, SheetCastError};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 將設定中的等級名稱轉成 tracing 的等級；未知名稱視為 info
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "info" | "notice" => "info",
        "warning" | "warn" => "warn",
        "error" | "critical" | "alert" | "emergency" => "error",
        _ => "info",
    }
}

/// 檔案 (每日輪替) + 終端機兩個輸出。回傳的 guard 必須持有到程式結束。
pub fn init_cli_logger(verbose: bool, config: &LoggingConfig) -> Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(config)?);

    build_subscriber(verbose, file_filter(config), writer)
        .try_init()
        .map_err(|e| SheetCastError::ConfigError {
            message: format!("failed to install logger: {}", e),
        })?;

    Ok(guard)
}

/// RUST_LOG 優先，否則使用設定中的等級
fn file_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("sheet_cast={}", level_directive(&config.level)))
    })
}

/// 兩個 layer 各自過濾：檔案依設定等級，終端機為 warn，verbose 時本程式的 debug 也輸出
fn build_subscriber<W>(
    verbose: bool,
    file_filter: EnvFilter,
    file_writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_filter = if verbose {
        EnvFilter::new("warn,sheet_cast=debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_filter(console_filter),
        )
}

fn file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    let directory = config
        .file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.to_path_buf())
        .unwrap_or_else(|| ".".into());
    std::fs::create_dir_all(&directory)?;

    let prefix = config
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix);

    if let Some(extension) = config.file.extension() {
        builder = builder.filename_suffix(extension.to_string_lossy().into_owned());
    }
    if config.max_files > 0 {
        builder = builder.max_log_files(config.max_files);
    }

    builder
        .build(&directory)
        .map_err(|e| SheetCastError::ConfigError {
            message: format!(
                "cannot open log file in {}: {}",
                directory.display(),
                e
            ),
        })
}
