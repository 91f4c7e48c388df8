use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::generator::adaptive::DEFAULT_ADAPT_VALUE;
use crate::generator::registry::SourceContext;
use crate::generator::typeable::{LAYOUTS, TypeableChars};

pub const MIN_LINE_LENGTH: usize = 10;
pub const MAX_LINE_LENGTH: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default = "default_adapt_value")]
    pub adapt_value: f64,
    #[serde(default = "default_keyboard_layout")]
    pub keyboard_layout: String,
    #[serde(default = "default_texts_dir")]
    pub texts_dir: String,
    #[serde(default = "default_strategies_dir")]
    pub strategies_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_max_line_length() -> usize {
    60
}
fn default_adapt_value() -> f64 {
    DEFAULT_ADAPT_VALUE
}
fn default_keyboard_layout() -> String {
    "en_US".to_string()
}
fn data_subdir(name: &str) -> String {
    let base = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytrain");
    let path = if name.is_empty() { base } else { base.join(name) };
    path.to_string_lossy().to_string()
}
fn default_texts_dir() -> String {
    data_subdir("texts")
}
fn default_strategies_dir() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytrain")
        .join("strategies")
        .to_string_lossy()
        .to_string()
}
fn default_data_dir() -> String {
    data_subdir("")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            adapt_value: default_adapt_value(),
            keyboard_layout: default_keyboard_layout(),
            texts_dir: default_texts_dir(),
            strategies_dir: default_strategies_dir(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keytrain")
            .join("config.toml")
    }

    /// Clamp out-of-range values after loading a hand-edited file.
    pub fn validate(&mut self) {
        self.max_line_length = self.max_line_length.clamp(MIN_LINE_LENGTH, MAX_LINE_LENGTH);
        if !(self.adapt_value.is_finite() && self.adapt_value > 0.0) {
            log::warn!(
                "adapt_value {} is not positive, using {DEFAULT_ADAPT_VALUE}",
                self.adapt_value
            );
            self.adapt_value = DEFAULT_ADAPT_VALUE;
        }
        if TypeableChars::for_layout(&self.keyboard_layout).is_none() {
            log::warn!(
                "Unknown keyboard layout `{}`, using {}",
                self.keyboard_layout,
                LAYOUTS[0].layout
            );
            self.keyboard_layout = LAYOUTS[0].layout.to_string();
        }
    }

    pub fn layout(&self) -> &'static TypeableChars {
        TypeableChars::for_layout(&self.keyboard_layout).unwrap_or(&LAYOUTS[0])
    }

    pub fn source_context(&self) -> SourceContext {
        SourceContext {
            texts_dir: PathBuf::from(&self.texts_dir),
            adapt_value: self.adapt_value,
            layout: self.layout(),
            seed: None,
        }
    }
}
