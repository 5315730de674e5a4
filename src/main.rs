use anyhow::Context;
use clap::Parser;
use sheet_cast::app::report;
use sheet_cast::config::LoggingConfig;
use sheet_cast::utils::{logger, validation::Validate};
use sheet_cast::{
    AppConfig, CliArgs, FeedSource, FtpClient, GoogleSheetsClient, ImportHandler, SheetCastError,
    SheetsExporter,
};

fn load_config(args: &CliArgs) -> Result<AppConfig, SheetCastError> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // 配置無效時改用預設的日誌設定記錄錯誤
            let guard = logger::init_cli_logger(args.verbose, &LoggingConfig::default()).ok();
            tracing::error!(
                category = ?e.category(),
                severity = ?e.severity(),
                "❌ Configuration failed: {}",
                e
            );
            eprint!("{}", report::render_config_error(&e));
            drop(guard);
            std::process::exit(1);
        }
    };

    let guard = logger::init_cli_logger(args.verbose, &config.logging)
        .context("failed to initialize logging")?;

    tracing::info!("Starting sheet-cast");
    tracing::debug!("Configuration: {:?}", config);

    let options = args.import_options(&config.ftp.file);

    let source = FeedSource::new(FtpClient::new(config.ftp.clone()));
    let sheets = GoogleSheetsClient::new(config.sheets.clone())
        .context("failed to build Google Sheets HTTP client")?;
    let exporter = SheetsExporter::new(sheets, config.sheets.range.clone());
    let handler = ImportHandler::new(source, exporter);

    let outcome = handler.handle(&options).await;
    report::print_outcome(&outcome);

    let exit_code = report::exit_code(&outcome);
    if exit_code != 0 {
        // process::exit 不會執行解構子，先讓檔案日誌寫完
        drop(guard);
        std::process::exit(exit_code);
    }

    Ok(())
}
