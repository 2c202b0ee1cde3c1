mod settings;

pub use settings::{Backend, Config, LedgerSettings, RemoteSettings, StoreSettings};

use crate::error::{LedgerError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.feeledger/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "feeledger") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.feeledger/
    let home = dirs_home().ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".feeledger"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the record file: absolute and ~ paths as given, anything else
/// relative to the config directory
pub fn resolve_data_file(data_file: &str, cfg_dir: &Path) -> PathBuf {
    let path = expand_path(data_file);
    if path.is_absolute() {
        path
    } else {
        cfg_dir.join(path)
    }
}

/// Load the main config.toml
pub fn load_config(cfg_dir: &Path) -> Result<Config> {
    if !cfg_dir.exists() {
        return Err(LedgerError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    let path = cfg_dir.join("config.toml");
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    parse_config(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

pub fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Create the config directory and write the template config
pub fn init_config_dir(cfg_dir: &Path) -> Result<PathBuf> {
    if cfg_dir.exists() {
        return Err(LedgerError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }
    fs::create_dir_all(cfg_dir)?;
    let path = cfg_dir.join("config.toml");
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(path)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[ledger]
currency_symbol = "$"
# Refuse a payment against a fee that is already paid.
# When false the payment is recorded and the fee stays paid.
reject_payments_on_paid_fees = false

[store]
backend = "file"              # "file" or "remote"
data_file = "records.toml"    # relative to this directory

# Hosted record service, used when backend = "remote"
# [store.remote]
# base_url = "https://records.example.com/api/v1/projects/fees"
# api_key = "..."
# timeout_secs = 10
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_parses_to_defaults() {
        let config = parse_config(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.ledger.currency_symbol, "$");
        assert!(!config.ledger.reject_payments_on_paid_fees);
        assert_eq!(config.store.backend, Backend::File);
        assert_eq!(config.store.data_file, "records.toml");
        assert!(config.store.remote.is_none());
    }

    #[test]
    fn remote_section_parses() {
        let config = parse_config(
            r#"
[store]
backend = "remote"

[store.remote]
base_url = "https://records.test/api"
api_key = "secret"
"#,
        )
        .unwrap();
        let remote = config.store.remote.unwrap();
        assert_eq!(config.store.backend, Backend::Remote);
        assert_eq!(remote.base_url, "https://records.test/api");
        assert_eq!(remote.timeout_secs, 10);
    }

    #[test]
    fn data_file_resolves_against_config_dir() {
        let dir = Path::new("/etc/feeledger");
        assert_eq!(
            resolve_data_file("records.toml", dir),
            PathBuf::from("/etc/feeledger/records.toml")
        );
        assert_eq!(
            resolve_data_file("/var/lib/fees.toml", dir),
            PathBuf::from("/var/lib/fees.toml")
        );
    }

    #[test]
    fn init_refuses_existing_dir() {
        let temp = TempDir::new().unwrap();
        let cfg = temp.path().join("cfg");
        init_config_dir(&cfg).unwrap();
        assert!(load_config(&cfg).is_ok());
        assert!(matches!(
            init_config_dir(&cfg),
            Err(LedgerError::AlreadyInitialized(_))
        ));
    }
}
