//! Optional TOML configuration for the batch binary.
//!
//! ```toml
//! rows = 100
//! columns = 26
//! history_limit = 500
//! ```

use anyhow::{Context, Result, bail};
use cellgrid_core::SheetConfig;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    rows: Option<usize>,
    columns: Option<usize>,
    history_limit: Option<usize>,
}

impl ConfigFile {
    fn apply(self, config: &mut SheetConfig) {
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(history_limit) = self.history_limit {
            config.history_limit = history_limit;
        }
    }
}

/// Resolve the sheet configuration.
///
/// An explicit path must exist. The per-user `config.toml` is only consulted
/// when `use_default` is set, and a missing one means defaults.
pub fn load_config(explicit: Option<&Path>, use_default: bool) -> Result<SheetConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if use_default => user_config_path().filter(|p| p.exists()),
        None => None,
    };

    let mut config = SheetConfig::default();
    if let Some(path) = path {
        log::debug!("reading config from {}", path.display());
        let content = read_config_file(&path)?;
        parse_config(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
            .apply(&mut config);
    }
    Ok(config)
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str::<ConfigFile>(content)?)
}

fn read_config_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Config file not found: {}", path.display()))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        );
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellgrid")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut config = SheetConfig::default();
        parse_config("rows = 10\n").unwrap().apply(&mut config);
        assert_eq!(config.rows, 10);
        assert_eq!(config.columns, SheetConfig::default().columns);
        assert_eq!(config.history_limit, SheetConfig::default().history_limit);
    }

    #[test]
    fn test_full_config() {
        let mut config = SheetConfig::default();
        parse_config("rows = 5\ncolumns = 3\nhistory_limit = 7\n")
            .unwrap()
            .apply(&mut config);
        assert_eq!(
            config,
            SheetConfig {
                rows: 5,
                columns: 3,
                history_limit: 7,
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("rows = 5\ntheme = \"dark\"\n").is_err());
        assert!(parse_config("rows = -1\n").is_err());
    }

    #[test]
    fn test_no_file_means_defaults() {
        let config = load_config(None, false).unwrap();
        assert_eq!(config, SheetConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("cellgrid_no_such_config.toml");
        assert!(load_config(Some(&path), true).is_err());
    }
}
