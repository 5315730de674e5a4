use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetCastError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("FTP error: {0}")]
    FtpError(#[from] suppaftp::FtpError),

    #[error("XML parse error: {message}")]
    XmlParseError { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Google Sheets API returned {status}: {message}")]
    SheetsApiError { status: u16, message: String },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl From<quick_xml::Error> for SheetCastError {
    fn from(e: quick_xml::Error) -> Self {
        SheetCastError::XmlParseError {
            message: e.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for SheetCastError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        SheetCastError::AuthError {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SheetCastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SheetCastError::ConfigError { .. }
            | SheetCastError::MissingConfigError { .. }
            | SheetCastError::InvalidConfigValueError { .. }
            | SheetCastError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SheetCastError::FtpError(_)
            | SheetCastError::ApiError(_)
            | SheetCastError::SheetsApiError { .. } => ErrorCategory::Network,
            SheetCastError::AuthError { .. } => ErrorCategory::Authentication,
            SheetCastError::XmlParseError { .. }
            | SheetCastError::SerializationError(_)
            | SheetCastError::ProcessingError { .. } => ErrorCategory::Data,
            SheetCastError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端暫時性錯誤，可重試
            SheetCastError::FtpError(_)
            | SheetCastError::ApiError(_)
            | SheetCastError::SheetsApiError { .. } => ErrorSeverity::Medium,
            SheetCastError::XmlParseError { .. }
            | SheetCastError::SerializationError(_)
            | SheetCastError::ProcessingError { .. }
            | SheetCastError::AuthError { .. } => ErrorSeverity::High,
            SheetCastError::ConfigError { .. }
            | SheetCastError::MissingConfigError { .. }
            | SheetCastError::InvalidConfigValueError { .. }
            | SheetCastError::ConfigValidationError { .. }
            | SheetCastError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            SheetCastError::IoError(e) => format!("Could not read or write a file: {}", e),
            SheetCastError::FtpError(e) => format!("FTP transfer failed: {}", e),
            SheetCastError::XmlParseError { message } => {
                format!("The feed is not well-formed XML: {}", message)
            }
            SheetCastError::ApiError(e) => format!("HTTP request failed: {}", e),
            SheetCastError::SheetsApiError { status, message } => {
                format!("Google Sheets rejected the write ({}): {}", status, message)
            }
            SheetCastError::AuthError { message } => {
                format!("Google authentication failed: {}", message)
            }
            SheetCastError::SerializationError(e) => format!("Unexpected response format: {}", e),
            SheetCastError::ConfigError { message } => format!("Configuration problem: {}", message),
            SheetCastError::MissingConfigError { field } => {
                format!("Required setting {} is not set", field)
            }
            SheetCastError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Setting {} has invalid value '{}': {}", field, value, reason),
            SheetCastError::ConfigValidationError { field, message } => {
                format!("Setting {} is invalid: {}", field, message)
            }
            SheetCastError::ProcessingError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the environment variables or the file passed with --config"
            }
            ErrorCategory::Network => {
                "Check the server address, credentials and network connectivity, then retry"
            }
            ErrorCategory::Authentication => {
                "Check GOOGLE_SHEETS_CREDENTIALS_PATH points to a valid service account key"
            }
            ErrorCategory::Data => "Inspect the XML feed; it must be a single well-formed document",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetCastError>;
