use crate::core::ProviderId;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the example configuration to the platform config directory.
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(&path)?;
    println!("Wrote {}", path.display());
    println!("Provide API keys through the environment or a .env file:");
    for id in ProviderId::ALL {
        println!("  {:<22} {}", id.env_var(), id.display_name());
    }
    Ok(())
}

/// Writes the example configuration to `path`. An existing file is left untouched.
pub fn setup_at_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            anyhow::bail!("Configuration file already exists at {}", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create {}", path.display()));
        }
    };
    file.write_all(EXAMPLE_CONFIG.as_bytes())
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!(path = %path.display(), "Created configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TickerPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_written_config_loads_back() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        setup_at_path(&config_path)?;

        let config = AppConfig::load_from_path(&config_path)?;
        assert!(matches!(config.default_ticker, TickerPolicy::Random(ref c) if c.len() == 6));
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.normalize);
        assert!(config.queue.is_none());
        for id in ProviderId::ALL {
            assert_eq!(config.providers.base_url(id), id.default_base_url());
        }
        Ok(())
    }

    #[test]
    fn test_existing_config_is_kept() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "timeout_secs: 3\n")?;

        let err = setup_at_path(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&config_path)?, "timeout_secs: 3\n");
        Ok(())
    }
}
