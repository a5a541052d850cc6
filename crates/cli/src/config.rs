use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trialdesk_runtime_config::{CONFIG_FILE_NAME, TrialdeskConfig};

/// Where the config comes from: `--config`, then `TRIALDESK_CONFIG`, then
/// `./trialdesk.toml` if it exists.
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var("TRIALDESK_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
    {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    local.exists().then_some(local)
}

/// Load config from `path`, or defaults when there is none.
pub fn load(path: Option<&Path>) -> Result<TrialdeskConfig> {
    let Some(path) = path else {
        return Ok(TrialdeskConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config = TrialdeskConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    tracing::debug!("config loaded from {}", path.display());
    Ok(config)
}

/// Print the effective config as TOML.
pub fn show_config(config: &TrialdeskConfig, source: Option<&Path>) -> Result<()> {
    match source {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults"),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}
