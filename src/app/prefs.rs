//! User preferences, persisted as YAML.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the preferences in the configuration directory.
pub const PREFS_FILE_NAME: &str = "resip.yaml";

/// Defaults used to build import contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Parent of the temporary extraction directories
    pub work_dir: PathBuf,
    /// Directory last used to pick an import source
    pub import_dir: Option<PathBuf>,
    pub csv_charset: String,
    pub csv_delimiter: char,
    /// File name patterns left out of on-disk and mail imports
    pub ignore_patterns: Vec<String>,
    /// Units of work between two progress lines
    pub progress_step: u64,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("resip"),
            import_dir: None,
            csv_charset: "UTF-8".to_string(),
            csv_delimiter: ';',
            ignore_patterns: vec!["Thumbs\\.db".to_string(), "\\.DS_Store".to_string(), "desktop\\.ini".to_string()],
            progress_step: 100,
        }
    }
}

impl Prefs {
    /// Load preferences from `path`, the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No preferences file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        serde_saphyr::from_str(&text)
            .map_err(|e| Error::Config(format!("Invalid preferences [{}]: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize preferences to YAML: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Prefs::load(&dir.path().join(PREFS_FILE_NAME)).unwrap();
        assert_eq!(prefs, Prefs::default());
        assert_eq!(prefs.csv_delimiter, ';');
        assert_eq!(prefs.progress_step, 100);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(PREFS_FILE_NAME);
        let prefs = Prefs {
            work_dir: dir.path().join("work"),
            import_dir: Some(dir.path().to_path_buf()),
            csv_charset: "windows-1252".to_string(),
            csv_delimiter: ',',
            ignore_patterns: vec![".*\\.tmp".to_string()],
            progress_step: 10,
        };
        prefs.save(&path).unwrap();
        assert_eq!(Prefs::load(&path).unwrap(), prefs);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFS_FILE_NAME);
        std::fs::write(&path, "progress_step: 5\n").unwrap();
        let prefs = Prefs::load(&path).unwrap();
        assert_eq!(prefs.progress_step, 5);
        assert_eq!(prefs.csv_charset, "UTF-8");
    }
}
