use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::CommonArgs;
use crate::error::NutriaError;
use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::storage::DEFAULT_STORAGE_DIR;

// Flags win over NUTRIA_* variables, which win over the TOML file.

const DEFAULT_SECRETS_PATH: &str = ".streamlit/secrets.toml";

const ENV_PREFIX: &str = "NUTRIA_";

/// Resolved configuration for one `nutria` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutriaConfig {
    pub model: String,
    pub api_base: String,
    pub storage_dir: PathBuf,
    /// TOML secret store consulted for `gemini_api_key` before the environment.
    pub secrets_path: PathBuf,
    /// `None` means no local timeout; provider-side limits apply.
    pub request_timeout_sec: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Shape of `nutria.toml`. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    api_base: Option<String>,
    storage_dir: Option<PathBuf>,
    secrets_path: Option<PathBuf>,
    request_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

/// One source's partial view of the config.
#[derive(Debug, Default)]
struct ConfigLayer {
    model: Option<String>,
    api_base: Option<String>,
    storage_dir: Option<PathBuf>,
    secrets_path: Option<PathBuf>,
    request_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

impl NutriaConfig {
    /// Resolve flags, `NUTRIA_*` variables and the optional `--config` file.
    pub fn load(cli_args: &CommonArgs) -> anyhow::Result<Self> {
        Self::load_with_env(cli_args, real_env_var)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_sec.map(Duration::from_secs)
    }

    /// Same as [`load`](Self::load) with the environment lookup injected.
    fn load_with_env(
        cli_args: &CommonArgs,
        env_fn: fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let file_layer = match cli_args.config.as_deref() {
            Some(path) => load_file_layer(path)?,
            None => ConfigLayer::default(),
        };
        let env_layer = load_env_layer(env_fn)?;
        let cli_layer = cli_layer_from(cli_args);

        let merged = merge_layers(file_layer, env_layer, cli_layer);

        Ok(NutriaConfig {
            model: merged.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            api_base: merged
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_owned()),
            storage_dir: merged
                .storage_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            secrets_path: merged
                .secrets_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_PATH)),
            request_timeout_sec: merged.request_timeout_sec.filter(|s| *s > 0),
            log_level: merged.log_level,
            log_file: merged.log_file,
        })
    }
}

fn load_file_layer(path: &Path) -> anyhow::Result<ConfigLayer> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let fc: FileConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    Ok(ConfigLayer {
        model: fc.model,
        api_base: fc.api_base,
        storage_dir: fc.storage_dir,
        secrets_path: fc.secrets_path,
        request_timeout_sec: fc.request_timeout_sec,
        log_level: fc.log_level,
        log_file: fc.log_file,
    })
}

fn real_env_var(suffix: &str) -> Option<String> {
    let key = format!("{ENV_PREFIX}{suffix}");
    env::var(&key).ok().filter(|v| !v.is_empty())
}

fn load_env_layer(env_fn: fn(&str) -> Option<String>) -> Result<ConfigLayer, NutriaError> {
    Ok(ConfigLayer {
        model: env_fn("MODEL"),
        api_base: env_fn("API_BASE"),
        storage_dir: env_fn("STORAGE_DIR").map(PathBuf::from),
        secrets_path: env_fn("SECRETS_PATH").map(PathBuf::from),
        request_timeout_sec: parse_env_u64(env_fn, "REQUEST_TIMEOUT_SEC")?,
        log_level: env_fn("LOG_LEVEL"),
        log_file: env_fn("LOG_FILE").map(PathBuf::from),
    })
}

fn parse_env_u64(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<u64>, NutriaError> {
    match env_fn(suffix) {
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|e| NutriaError::ConfigEnvParseError {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn cli_layer_from(args: &CommonArgs) -> ConfigLayer {
    ConfigLayer {
        model: args.model.clone(),
        api_base: args.api_base.clone(),
        storage_dir: args.storage_dir.clone(),
        secrets_path: args.secrets.clone(),
        request_timeout_sec: args.request_timeout_sec,
        log_level: args.log_level.clone(),
        log_file: args.log_file.clone(),
    }
}

/// First set value wins, flags before env before file.
fn merge_layers(file: ConfigLayer, env: ConfigLayer, cli: ConfigLayer) -> ConfigLayer {
    ConfigLayer {
        model: cli.model.or(env.model).or(file.model),
        api_base: cli.api_base.or(env.api_base).or(file.api_base),
        storage_dir: cli.storage_dir.or(env.storage_dir).or(file.storage_dir),
        secrets_path: cli.secrets_path.or(env.secrets_path).or(file.secrets_path),
        request_timeout_sec: cli
            .request_timeout_sec
            .or(env.request_timeout_sec)
            .or(file.request_timeout_sec),
        log_level: cli.log_level.or(env.log_level).or(file.log_level),
        log_file: cli.log_file.or(env.log_file).or(file.log_file),
    }
}
