use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Which surface the widget is running in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// The rendered gallery; configuration is read-only.
    #[default]
    Home,
    /// The settings editor; configuration is read and written.
    Config,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Home => "home",
            Self::Config => "config",
        })
    }
}

/// What the host page tells the widget about its surroundings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HostEnvironment {
    pub view: View,
    /// URL of the page embedding the widget.
    pub parent: String,
    /// Page serve time in milliseconds since the Unix epoch.
    pub serve_time: i64,
    /// Widget height in pixels; enables the sizing checks in home view.
    pub height: Option<i64>,
    /// Append a cache-busting query to the theme URL.
    pub no_cache: bool,
    /// YAML file standing in for the host's preference slot.
    pub prefs_path: PathBuf,
    /// Local directory standing in for the theme host.
    pub theme_root: Option<PathBuf>,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self {
            view: View::default(),
            parent: String::new(),
            serve_time: chrono::Utc::now().timestamp_millis(),
            height: None,
            no_cache: false,
            prefs_path: PathBuf::from("prefs.yaml"),
            theme_root: None,
        }
    }
}

impl HostEnvironment {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Checks host-supplied data and normalizes the parent URL.
    pub fn validated(mut self) -> Result<Self> {
        if !(self.parent.starts_with("http://") || self.parent.starts_with("https://")) {
            return Err(Error::runtime("parent must be an http(s) URL").with_info(&self.parent));
        }
        if let Some(end) = self.parent.find(['?', '#']) {
            self.parent.truncate(end);
        }
        if self.serve_time < 0 {
            return Err(Error::runtime("serve-time must not be negative").with_info(self.serve_time));
        }
        if let Some(height) = self.height
            && height < 0
        {
            return Err(Error::runtime("height must not be negative").with_info(height));
        }
        Ok(self)
    }
}
