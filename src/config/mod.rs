use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::view::ViewFilters;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Vaultview";
const APP_NAME: &str = "vaultview";

pub const CONFIG_ENV: &str = "VAULTVIEW_CONFIG";
pub const DATA_ENV: &str = "VAULTVIEW_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub snapshot_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let snapshot_path = data_dir.join("vault.json");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            snapshot_path,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub vault: VaultOptions,
    pub groups: ViewFilters,
    pub entries: ViewFilters,
    pub display: DisplayOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.vault.resolve(paths);
        tracing::debug!(snapshot = %self.vault.snapshot_path.display(), "resolved vault snapshot path");
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultOptions {
    /// Snapshot to read when no `--vault` flag is given. Empty means the data directory default.
    pub snapshot_path: PathBuf,
}

impl VaultOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.snapshot_path.as_os_str().is_empty() {
            self.snapshot_path = paths.snapshot_path.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub reveal_passwords: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SortMode;
    use tempfile::TempDir;

    fn temp_paths(root: &Path) -> ConfigPaths {
        ConfigPaths {
            config_dir: root.join("config"),
            config_file: root.join("config/config.toml"),
            data_dir: root.join("data"),
            snapshot_path: root.join("data/vault.json"),
        }
    }

    #[test]
    fn first_run_writes_default_config() -> Result<()> {
        let temp = TempDir::new().context("creating temp dir")?;
        let loader = ConfigLoader::with_paths(temp_paths(temp.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.vault.snapshot_path, temp.path().join("data/vault.json"));
        assert_eq!(cfg.entries.sort_mode, SortMode::Natural);
        assert!(!cfg.display.reveal_passwords);

        let reloaded = loader.load()?;
        assert_eq!(reloaded.vault.snapshot_path, cfg.vault.snapshot_path);
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "[entries]\nsort_mode = \"za\"\nterm = \"bank\"\n\n[groups]\nsort_mode = \"az\"\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.entries.sort_mode, SortMode::Descending);
        assert_eq!(cfg.entries.term, "bank");
        assert_eq!(cfg.groups.sort_mode, SortMode::Ascending);
        assert_eq!(cfg.vault.snapshot_path, temp.path().join("data/vault.json"));
        Ok(())
    }

    #[test]
    fn unknown_sort_mode_is_a_parse_error() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "[entries]\nsort_mode = \"sideways\"\n")?;
        let err = ConfigLoader::with_paths(paths).load().unwrap_err();
        assert!(err.to_string().contains("parsing config toml"));
        Ok(())
    }
}
