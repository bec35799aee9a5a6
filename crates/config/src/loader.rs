//! Config file discovery and layering: file, then environment.

use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{
    error::{ConfigError, Result},
    schema::DocchatConfig,
};

const CONFIG_STEM: &str = "docchat";
const EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Environment variables consulted for the API key, in priority order.
/// The second is the legacy name used by older `.env` files.
const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "REACT_APP_OPENAI_API_KEY"];

/// Load configuration from `explicit` when given, otherwise from the first
/// `docchat.{toml,yaml,yml,json}` found in the working directory or the
/// platform config directory. Falls back to defaults when none exists.
/// Process environment overrides are applied last.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<DocchatConfig> {
    let mut config = match explicit {
        Some(path) => load_from_path(path)?,
        None => match find_config_file() {
            Some(path) => load_from_path(&path)?,
            None => {
                debug!("no config file found, using defaults");
                DocchatConfig::default()
            },
        },
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Parse a single config file, picking the format from its extension.
pub fn load_from_path(path: &Path) -> Result<DocchatConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let config = match ext.as_str() {
        "toml" => toml::from_str(&content).map_err(|e| parse_err(e.message().to_string()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        "json" => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        _ => {
            return Err(ConfigError::UnknownFormat {
                path: path.to_path_buf(),
            });
        },
    };
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Overlay environment variables onto `config`. `lookup` abstracts the
/// process environment so callers and tests can supply their own.
pub fn apply_env_overrides<F>(config: &mut DocchatConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = API_KEY_VARS.iter().find_map(|&var| lookup(var)) {
        config.openai.api_key = Some(Secret::new(key));
    }
    if let Some(url) = lookup("OPENAI_BASE_URL") {
        config.openai.base_url = url;
    }
    if let Some(bind) = lookup("DOCCHAT_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("DOCCHAT_PORT") {
        config.server.port = port.trim().parse().map_err(|e| ConfigError::EnvVar {
            var: "DOCCHAT_PORT".into(),
            message: format!("{e}"),
        })?;
    }
    if let Some(dir) = lookup("DOCCHAT_UPLOAD_DIR") {
        config.server.upload_dir = PathBuf::from(dir);
    }
    Ok(())
}

fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(project) = directories::ProjectDirs::from("org", "docchat", "docchat") {
        dirs.push(project.config_dir().to_path_buf());
    }
    dirs.iter().find_map(|dir| {
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_STEM}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}
