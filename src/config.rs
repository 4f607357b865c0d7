use anyhow::{Context, Result, anyhow, bail};
use std::{
    collections::HashMap,
    env, fmt, fs,
    path::{Path, PathBuf},
};

use crate::library::{FailurePolicy, SyncSettings};
use crate::wait::PollSettings;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_VIDEO_PATH: &str = "/youtube";
pub const DEFAULT_COLLECTION: &str = "youtube";
pub const DEFAULT_COLLECTION_ART: &str = "assets/collection-art.jpg";
pub const DEFAULT_WEBHOOK_HOST: &str = "0.0.0.0";
pub const DEFAULT_WEBHOOK_PORT: u16 = 8080;

/// Connection details and paths for one deployment.
#[derive(Clone)]
pub struct Config {
    pub ta_url: String,
    pub ta_token: String,
    pub jf_url: String,
    pub jf_token: String,
    pub ta_video_path: PathBuf,
    pub jf_folder: String,
    pub collection_art: PathBuf,
    pub on_show_failure: FailurePolicy,
    pub webhook_host: String,
    pub webhook_port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ta_url", &self.ta_url)
            .field("ta_token", &"<redacted>")
            .field("jf_url", &self.jf_url)
            .field("jf_token", &"<redacted>")
            .field("ta_video_path", &self.ta_video_path)
            .field("jf_folder", &self.jf_folder)
            .field("collection_art", &self.collection_art)
            .field("on_show_failure", &self.on_show_failure)
            .field("webhook_host", &self.webhook_host)
            .field("webhook_port", &self.webhook_port)
            .finish()
    }
}

impl Config {
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            video_root: self.ta_video_path.clone(),
            collection_name: self.jf_folder.clone(),
            collection_art: self.collection_art.clone(),
            on_show_failure: self.on_show_failure,
            season_poll: PollSettings::default(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    resolve_config(ConfigOverrides::default())
}

/// Values that win over every other source, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ta_url: Option<String>,
    pub jf_url: Option<String>,
    pub ta_video_path: Option<PathBuf>,
    pub jf_folder: Option<String>,
    pub collection_art: Option<PathBuf>,
    pub on_show_failure: Option<FailurePolicy>,
    pub webhook_host: Option<String>,
    pub webhook_port: Option<u16>,
    pub env_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Resolves every key through overrides, the process environment, the `.env`
/// file and finally `config.json`, in that order.
pub fn resolve_config(overrides: ConfigOverrides) -> Result<Config> {
    let env_path = overrides
        .env_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let config_path = overrides
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut file_vars = read_config_file(&config_path)?;
    file_vars.extend(read_env_file(&env_path)?);
    build_config_with_overrides(&file_vars, env_var_string, overrides)
}

#[cfg(test)]
fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    build_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default())
}

fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<Config> {
    let required = |key: &str, value: Option<String>| {
        value
            .or_else(|| lookup_value(key, file_vars, &env_lookup))
            .ok_or_else(|| anyhow!("{key} not set"))
    };
    let ta_url = required("TA_URL", overrides.ta_url)?;
    let ta_token = required("TA_TOKEN", None)?;
    let jf_url = required("JF_URL", overrides.jf_url)?;
    let jf_token = required("JF_TOKEN", None)?;

    let ta_video_path = overrides
        .ta_video_path
        .or_else(|| lookup_value("TA_VIDEO_PATH", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_VIDEO_PATH));
    let jf_folder = non_blank(overrides.jf_folder)
        .or_else(|| lookup_value("JF_FOLDER", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
    let collection_art = overrides
        .collection_art
        .or_else(|| lookup_value("COLLECTION_ART", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COLLECTION_ART));
    let on_show_failure = match overrides.on_show_failure {
        Some(policy) => policy,
        None => match lookup_value("ON_SHOW_FAILURE", file_vars, &env_lookup) {
            Some(value) => value
                .parse::<FailurePolicy>()
                .map_err(|err| anyhow!("ON_SHOW_FAILURE: {err}"))?,
            None => FailurePolicy::default(),
        },
    };
    let webhook_port = overrides
        .webhook_port
        .or_else(|| {
            lookup_value("WEBHOOK_PORT", file_vars, &env_lookup)
                .and_then(|value| value.parse::<u16>().ok())
        })
        .unwrap_or(DEFAULT_WEBHOOK_PORT);
    let webhook_host = non_blank(overrides.webhook_host)
        .or_else(|| lookup_value("WEBHOOK_HOST", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_WEBHOOK_HOST.to_string());

    Ok(Config {
        ta_url: ta_url.trim_end_matches('/').to_string(),
        ta_token,
        jf_url: jf_url.trim_end_matches('/').to_string(),
        jf_token,
        ta_video_path,
        jf_folder,
        collection_art,
        on_show_failure,
        webhook_host,
        webhook_port,
    })
}

/// Fails when the archive's video tree is not reachable from this process;
/// season folders could not be created otherwise.
pub fn env_check(config: &Config) -> Result<()> {
    if !config.ta_video_path.exists() {
        bail!(
            "failed to access ta_video_path {}",
            config.ta_video_path.display()
        );
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn env_var_string(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Reads a flat JSON object (`{"ta_url": "...", ...}`) and returns it keyed
/// the same way as the environment, i.e. upper-cased.
pub fn read_config_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Parsing {}", path.display()))?;
    for (key, value) in parsed {
        let value = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        vars.insert(key.to_ascii_uppercase(), value);
    }
    Ok(vars)
}
