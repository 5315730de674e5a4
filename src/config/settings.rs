use crate::utils::error::{Result, SheetCastError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_REMOTE_FILE: &str = "coffee_feed.xml";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// 允許的日誌等級，沿用 PSR-3 / syslog 的命名
pub const LOG_LEVELS: [&str; 8] = [
    "debug",
    "info",
    "notice",
    "warning",
    "error",
    "critical",
    "alert",
    "emergency",
];

/// 啟動時建立一次，之後以參考傳給各個元件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ftp: FtpConfig,
    pub sheets: SheetsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// 未指定 --file 時下載的遠端檔名
    pub file: String,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            username: None,
            password: None,
            timeout_secs: 90,
            file: DEFAULT_REMOTE_FILE.to_string(),
        }
    }
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("file", &self.file)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub credentials_path: PathBuf,
    pub application_name: String,
    /// 預先取得的 OAuth bearer token，設定時優先於 service account 金鑰
    pub access_token: Option<String>,
    /// 寫入的起始儲存格 (anchor cell)
    pub range: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials_path: PathBuf::from("config/google-credentials.json"),
            application_name: "Sheet Cast".to_string(),
            access_token: None,
            range: "A1".to_string(),
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            timeout_secs: 60,
        }
    }
}

impl SheetsConfig {
    /// 匯出時才需要試算表 ID，因此不放在 validate() 中檢查
    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SheetCastError::MissingConfigError {
                field: "GOOGLE_SHEETS_SPREADSHEET_ID".to_string(),
            })
    }
}

impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("credentials_path", &self.credentials_path)
            .field("application_name", &self.application_name)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("range", &self.range)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: PathBuf,
    /// 保留的輪替檔數量，0 代表全部保留
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("logs/app.log"),
            max_files: 5,
        }
    }
}

impl AppConfig {
    /// 從行程環境變數載入配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 從任意 key/value 來源載入配置，未設定的 key 使用預設值
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ftp_defaults = FtpConfig::default();
        let sheets_defaults = SheetsConfig::default();
        let logging_defaults = LoggingConfig::default();

        let ftp = FtpConfig {
            host: lookup("FTP_HOST").unwrap_or(ftp_defaults.host),
            port: parse_var(&lookup, "FTP_PORT", ftp_defaults.port)?,
            username: non_empty(lookup("FTP_USERNAME")),
            password: non_empty(lookup("FTP_PASSWORD")),
            timeout_secs: parse_var(&lookup, "FTP_TIMEOUT", ftp_defaults.timeout_secs)?,
            file: lookup("FTP_FILE").unwrap_or(ftp_defaults.file),
        };

        let sheets = SheetsConfig {
            spreadsheet_id: non_empty(lookup("GOOGLE_SHEETS_SPREADSHEET_ID")),
            credentials_path: lookup("GOOGLE_SHEETS_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(sheets_defaults.credentials_path),
            application_name: lookup("GOOGLE_SHEETS_APPLICATION_NAME")
                .unwrap_or(sheets_defaults.application_name),
            access_token: non_empty(lookup("GOOGLE_SHEETS_ACCESS_TOKEN")),
            range: lookup("GOOGLE_SHEETS_RANGE").unwrap_or(sheets_defaults.range),
            api_base: lookup("GOOGLE_SHEETS_API_BASE").unwrap_or(sheets_defaults.api_base),
            timeout_secs: parse_var(&lookup, "GOOGLE_SHEETS_TIMEOUT", sheets_defaults.timeout_secs)?,
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").unwrap_or(logging_defaults.level),
            file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(logging_defaults.file),
            max_files: parse_var(&lookup, "LOG_MAX_FILES", logging_defaults.max_files)?,
        };

        Ok(Self {
            ftp,
            sheets,
            logging,
        })
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SheetCastError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，`${VAR}` 以環境變數替換
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, |key| std::env::var(key).ok())
    }

    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = substitute_vars(content, lookup)?;

        toml::from_str(&processed_content).map_err(|e| SheetCastError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// 替換 `${VAR_NAME}`，找不到的變數原樣保留
fn substitute_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| SheetCastError::ConfigError {
        message: format!("invalid placeholder pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| SheetCastError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// 等級名稱不分大小寫
fn validate_log_level(level: &str) -> Result<()> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    Err(SheetCastError::InvalidConfigValueError {
        field: "logging.level".to_string(),
        value: level.to_string(),
        reason: format!("Allowed values: {}", LOG_LEVELS.join(", ")),
    })
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("ftp.host", &self.ftp.host)?;
        validate_range("ftp.port", self.ftp.port, 1, u16::MAX)?;
        validate_positive_number("ftp.timeout_secs", self.ftp.timeout_secs, 1)?;
        validate_non_empty_string("ftp.file", &self.ftp.file)?;

        validate_url("sheets.api_base", &self.sheets.api_base)?;
        validate_non_empty_string("sheets.range", &self.sheets.range)?;
        validate_positive_number("sheets.timeout_secs", self.sheets.timeout_secs, 1)?;

        validate_log_level(&self.logging.level)?;
        validate_path("logging.file", &self.logging.file.to_string_lossy())?;

        Ok(())
    }
}
