//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database the import command writes to.
    pub db_path: PathBuf,

    /// Tesseract executable (name resolved via PATH, or an absolute path).
    pub tesseract: PathBuf,

    /// Optional tessdata directory passed through to tesseract.
    pub tessdata: Option<PathBuf>,

    /// OCR language of the target sentences.
    pub lang: String,

    /// Write block and half crops next to parsed files for inspection.
    pub dump_crops: bool,

    /// Parsing constants. Only worth touching when the upstream app changes
    /// its rendering again.
    pub parse: pex::ParseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("fraza.db"),
            tesseract: PathBuf::from("tesseract"),
            tessdata: None,
            lang: "pol".to_string(),
            dump_crops: false,
            parse: pex::ParseConfig::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("fraza.json"))
    }

    /// Load configuration from disk, falling back to defaults on missing file.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Build the OCR engine described by this config.
    pub fn recognizer(&self) -> pex::Tesseract {
        let mut ocr = pex::Tesseract::new(&self.tesseract, &self.lang);
        if let Some(dir) = &self.tessdata {
            ocr = ocr.with_tessdata(dir);
        }
        ocr
    }
}
