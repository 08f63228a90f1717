use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{BionicError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOptions {
    /// Apply the transform automatically on page load.
    #[serde(default = "default_autouse")]
    pub autouse: bool,
}

fn default_autouse() -> bool {
    true
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            autouse: default_autouse(),
        }
    }
}

/// Key-value settings provider for the persisted user options.
pub trait PreferenceStore {
    fn get_user_options(&mut self) -> Result<UserOptions>;
    fn set_user_options(&mut self, options: UserOptions) -> Result<()>;
}

/// Options stored as JSON on disk, cached after the first read or write.
pub struct JsonPreferenceStore {
    path: PathBuf,
    cache: Option<UserOptions>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Store at the default per-user location.
    pub fn open_default() -> Self {
        Self::new(Self::get_options_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get options file path (cross-platform)
    pub fn get_options_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("bionic-reader");
        path.push("options.json");
        path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get_user_options(&mut self) -> Result<UserOptions> {
        if let Some(options) = self.cache {
            return Ok(options);
        }
        let options = match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserOptions::default(),
            Err(e) => return Err(e.into()),
        };
        self.cache = Some(options);
        Ok(options)
    }

    fn set_user_options(&mut self, options: UserOptions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&options)?;
        fs::write(&self.path, json)?;
        self.cache = Some(options);
        Ok(())
    }
}

/// Options held only in memory, for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    options: Option<UserOptions>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryPreferenceStore {
    pub fn new(options: UserOptions) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }
}

#[cfg(test)]
impl MemoryPreferenceStore {
    /// A store whose reads fail, as a rejected storage request would.
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_writes(options: UserOptions) -> Self {
        Self {
            options: Some(options),
            fail_writes: true,
            ..Default::default()
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_user_options(&mut self) -> Result<UserOptions> {
        if self.fail_reads {
            return Err(BionicError::Preferences("read rejected".to_string()));
        }
        Ok(self.options.unwrap_or_default())
    }

    fn set_user_options(&mut self, options: UserOptions) -> Result<()> {
        if self.fail_writes {
            return Err(BionicError::Preferences("write rejected".to_string()));
        }
        self.options = Some(options);
        Ok(())
    }
}
