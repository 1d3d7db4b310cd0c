use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/sourcecheck/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Upper bound on concurrent validation workers per run.
    pub thread_count: usize,
    /// Default search keyword; a source's own check keyword overrides it.
    pub keyword: String,
    /// Wall-clock budget for one source, in seconds.
    pub timeout_secs: u64,
    /// Group tag added to sources that fail validation.
    #[serde(default = "default_broken_group")]
    pub broken_group: String,
    /// Group tag added to sources whose search step came back empty.
    #[serde(default = "default_search_broken_group")]
    pub search_broken_group: String,
}

fn default_broken_group() -> String {
    "失效".to_string()
}

fn default_search_broken_group() -> String {
    "搜索失效".to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            thread_count: 8,
            keyword: "我的".to_string(),
            timeout_secs: 180,
            broken_group: default_broken_group(),
            search_broken_group: default_search_broken_group(),
        }
    }
}

impl CheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sourcecheck")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CheckConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CheckConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: CheckConfig = toml::from_str(&data)?;
    Ok(cfg)
}
