use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::LLMProvider;

/// Upper bound on preview rows returned with an upload.
pub const MAX_PREVIEW_ROWS: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:4000".to_string(),
            ],
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    pub model: String,
    /// "live" calls the model, "mock" always uses the rule-based fallback.
    pub mode: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub temperature: f32,
}

impl LLMConfig {
    /// Whether a model client should be constructed at all.
    pub fn is_live(&self) -> bool {
        self.mode.eq_ignore_ascii_case("live") && !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Groq,
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            mode: "live".to_string(),
            base_url: None,
            timeout_secs: 30,
            max_attempts: 2,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    pub profile_sample_rows: usize,
    pub preview_rows: usize,
    pub max_widgets: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_rows: 1,
            min_columns: 1,
            profile_sample_rows: 200,
            preview_rows: MAX_PREVIEW_ROWS,
            max_widgets: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub keep_uploads: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("tmp/uploads"),
            keep_uploads: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider_id = env::var("LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string());
        let provider = LLMProvider::from_id(&provider_id)
            .with_context(|| format!("Unsupported LLM_PROVIDER: {}", provider_id))?;

        let llm_defaults = LLMConfig::default();
        let pipeline_defaults = PipelineConfig::default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("PORT must be a port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:4000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                max_upload_bytes: upload_limit_bytes(env_parse("MAX_UPLOAD_MB", 25)?)?,
            },
            llm: LLMConfig {
                provider,
                api_key: env::var("LLM_API_KEY")
                    .or_else(|_| env::var("GROQ_API_KEY"))
                    .unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or(llm_defaults.model),
                mode: env::var("LLM_MODE").unwrap_or(llm_defaults.mode),
                base_url: env::var("LLM_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
                timeout_secs: env_parse("LLM_TIMEOUT_SECS", llm_defaults.timeout_secs)?,
                max_attempts: env_parse("LLM_MAX_ATTEMPTS", llm_defaults.max_attempts)?,
                temperature: env_parse("LLM_TEMPERATURE", llm_defaults.temperature)?,
            },
            pipeline: PipelineConfig {
                min_rows: env_parse("MIN_ROWS", pipeline_defaults.min_rows)?,
                min_columns: env_parse("MIN_COLUMNS", pipeline_defaults.min_columns)?,
                profile_sample_rows: env_parse(
                    "PROFILE_SAMPLE_ROWS",
                    pipeline_defaults.profile_sample_rows,
                )?,
                preview_rows: env_parse("PREVIEW_ROWS", pipeline_defaults.preview_rows)?
                    .min(MAX_PREVIEW_ROWS),
                max_widgets: env_parse("MAX_WIDGETS", pipeline_defaults.max_widgets)?,
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("tmp/uploads")),
                keep_uploads: env_parse("KEEP_UPLOADS", true)?,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }
}

fn upload_limit_bytes(megabytes: usize) -> Result<usize> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow!("MAX_UPLOAD_MB is too large: {}", megabytes))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
