//! The external key/value preference slot the configuration blob lives in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Key of the configuration blob.
pub const CONFIG_KEY: &str = "cfg";

/// A string-valued preference store. Absent keys read as the empty string.
pub trait PrefStore {
    fn get(&self, key: &str) -> Result<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPrefs {
    entries: BTreeMap<String, String>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let mut prefs = Self::default();
        prefs.entries.insert(key.to_string(), value.to_string());
        prefs
    }
}

impl PrefStore for MemoryPrefs {
    fn get(&self, key: &str) -> Result<String> {
        Ok(self.entries.get(key).cloned().unwrap_or_default())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a YAML map in a single file.
#[derive(Debug, Clone)]
pub struct FilePrefs {
    path: PathBuf,
}

impl FilePrefs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_yaml::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl PrefStore for FilePrefs {
    fn get(&self, key: &str) -> Result<String> {
        Ok(self.load()?.remove(key).unwrap_or_default())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let staged = self.path.with_extension("yaml.tmp");
        std::fs::write(&staged, serde_yaml::to_string(&entries)?)?;
        std::fs::rename(&staged, &self.path)?;
        Ok(())
    }
}
