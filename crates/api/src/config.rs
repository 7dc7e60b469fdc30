use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use export::{Margins, PageSetup, PaperSize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Send `Strict-Transport-Security`. Enable only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

/// Report export settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Exports allowed per client within one window.
    #[serde(default = "default_export_rate_limit")]
    pub rate_limit_per_window: u32,

    /// Length of the trailing rate window in seconds.
    #[serde(default = "default_export_rate_window")]
    pub rate_limit_window_secs: u64,

    /// Longest allowed span between `date_from` and `date_to`, in months.
    #[serde(default = "default_max_span_months")]
    pub max_span_months: u32,

    /// Parent directory for per-request artifact directories. System temp dir when unset.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    #[serde(default = "default_report_title")]
    pub report_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_window: default_export_rate_limit(),
            rate_limit_window_secs: default_export_rate_window(),
            max_span_months: default_max_span_months(),
            temp_dir: None,
            report_title: default_report_title(),
        }
    }
}

impl ExportConfig {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// HTML-to-PDF backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    /// Base URL of the Gotenberg service.
    #[serde(default = "default_pdf_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_pdf_timeout_ms")]
    pub timeout_ms: u64,

    /// PNG or JPEG shown in the running header.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,

    /// `a4` or `letter`
    #[serde(default = "default_paper")]
    pub paper: String,

    #[serde(default)]
    pub landscape: bool,

    #[serde(default = "default_margin_top")]
    pub margin_top_mm: f64,
    #[serde(default = "default_margin_side")]
    pub margin_right_mm: f64,
    #[serde(default = "default_margin_bottom")]
    pub margin_bottom_mm: f64,
    #[serde(default = "default_margin_side")]
    pub margin_left_mm: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            backend_url: default_pdf_backend_url(),
            timeout_ms: default_pdf_timeout_ms(),
            logo_path: None,
            paper: default_paper(),
            landscape: false,
            margin_top_mm: default_margin_top(),
            margin_right_mm: default_margin_side(),
            margin_bottom_mm: default_margin_bottom(),
            margin_left_mm: default_margin_side(),
        }
    }
}

impl PdfConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Page setup for the document renderer. Unknown paper names fall back to A4.
    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            paper: self.paper.parse().unwrap_or(PaperSize::A4),
            landscape: self.landscape,
            margins: Margins {
                top: self.margin_top_mm,
                right: self.margin_right_mm,
                bottom: self.margin_bottom_mm,
                left: self.margin_left_mm,
            },
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    120
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_export_rate_limit() -> u32 {
    10
}
fn default_export_rate_window() -> u64 {
    60
}
fn default_max_span_months() -> u32 {
    shared::validation::DEFAULT_MAX_SPAN_MONTHS
}
fn default_report_title() -> String {
    "GLPI Ticket Report".to_string()
}
fn default_pdf_backend_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_pdf_timeout_ms() -> u64 {
    60000
}
fn default_paper() -> String {
    "a4".to_string()
}
fn default_margin_top() -> f64 {
    40.0
}
fn default_margin_side() -> f64 {
    15.0
}
fn default_margin_bottom() -> f64 {
    25.0
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with RPT__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("RPT").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration from embedded defaults plus `overrides`, without touching
    /// the filesystem or the environment.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 120

            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            hsts_enabled = false

            [export]
            rate_limit_per_window = 10
            rate_limit_window_secs = 60
            max_span_months = 12
            report_title = "GLPI Ticket Report"

            [pdf]
            backend_url = "http://localhost:3000"
            timeout_ms = 60000
            paper = "a4"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "RPT__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.export.rate_limit_per_window == 0 || self.export.rate_limit_window_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "export rate limit and window must be positive".to_string(),
            ));
        }

        if self.export.max_span_months == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "export.max_span_months must be positive".to_string(),
            ));
        }

        if self.pdf.backend_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "RPT__PDF__BACKEND_URL must be set".to_string(),
            ));
        }

        if self.pdf.paper.parse::<PaperSize>().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "pdf.paper must be a4 or letter, got '{}'",
                self.pdf.paper
            )));
        }

        let margins = [
            self.pdf.margin_top_mm,
            self.pdf.margin_right_mm,
            self.pdf.margin_bottom_mm,
            self.pdf.margin_left_mm,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ConfigValidationError::InvalidValue(
                "pdf margins must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
