use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolves where the database lives
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("kizuna")
        });

        // Ensure data directory exists
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        Ok(Self { data_dir })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("kizuna.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir() {
        let dir = std::env::temp_dir().join("kizuna-config-test");
        let config = Config::new(Some(dir.clone())).unwrap();

        assert_eq!(config.data_dir, dir);
        assert_eq!(config.db_path(), dir.join("kizuna.db"));
        assert!(dir.exists());

        std::fs::remove_dir_all(dir).ok();
    }
}
