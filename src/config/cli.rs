use clap::Parser;
use std::path::PathBuf;

use crate::domain::model::ImportOptions;

#[derive(Debug, Clone, Parser)]
#[command(name = "sheet-cast")]
#[command(about = "Import spreadsheet data from XML file")]
pub struct CliArgs {
    /// XML file path (local or remote); defaults to the configured FTP file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Limit number of records to display
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Push data to Google Sheets
    #[arg(short, long)]
    pub push_to_sheets: bool,

    /// Optional TOML configuration file; environment variables are used otherwise
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// 將命令列參數轉成一次匯入的選項，未指定檔案時退回預設遠端檔名
    pub fn import_options(&self, default_file: &str) -> ImportOptions {
        ImportOptions {
            file_path: self
                .file
                .clone()
                .unwrap_or_else(|| default_file.to_string()),
            limit: self.limit,
            push_to_sheets: self.push_to_sheets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["sheet-cast"]);
        assert!(args.file.is_none());
        assert_eq!(args.limit, 10);
        assert!(!args.push_to_sheets);

        let options = args.import_options("coffee_feed.xml");
        assert_eq!(options.file_path, "coffee_feed.xml");
    }

    #[test]
    fn test_short_flags() {
        let args = CliArgs::parse_from(["sheet-cast", "-f", "feed.xml", "-l", "3", "-p"]);
        let options = args.import_options("coffee_feed.xml");

        assert_eq!(options.file_path, "feed.xml");
        assert_eq!(options.limit, 3);
        assert!(options.push_to_sheets);
    }

    #[test]
    fn test_push_flag_takes_no_value() {
        assert!(CliArgs::try_parse_from(["sheet-cast", "--push-to-sheets", "yes"]).is_err());
    }
}
