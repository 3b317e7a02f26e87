//! Configuration settings
//!
//! Settings are loaded from `printarea.toml`:
//!
//! ```toml
//! [region]
//! selector = "print-area"
//!
//! [document]
//! language = "en"
//! default_title = "Document"
//!
//! [output]
//! disposition = "download"
//! backend = "pdf"
//!
//! [pdf]
//! fonts = ["fonts/NotoSans-Regular.ttf"]
//! asset_root = "public/"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::request::Disposition;

/// Selector value used when none is configured
pub const DEFAULT_SELECTOR: &str = "print-area";

/// Banner placed above every document
pub const DEFAULT_DISCLAIMER: &str = "This document was generated automatically from web \
content. It has been structured for accessibility, but some visual elements may not be \
fully described. Contact the publisher if you need an alternative format.";

/// Config file names looked up in the working directory
pub const CONFIG_CANDIDATES: [&str; 2] = ["printarea.toml", ".printarea.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Region selection
    pub region: RegionSettings,
    /// Document assembly
    pub document: DocumentSettings,
    /// Output delivery
    pub output: OutputSettings,
    /// PDF backend
    pub pdf: PdfSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read settings from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Load from an explicit path, else the first candidate in `dir`, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in CONFIG_CANDIDATES {
            let path = dir.join(candidate);
            if path.exists() {
                log::debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }
}

/// Region selector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionSettings {
    /// Class name or element id marking the printable region
    pub selector: String,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
        }
    }
}

/// Document assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentSettings {
    /// Accessibility disclaimer banner text
    pub disclaimer: String,
    /// Document language (BCP 47)
    pub language: String,
    /// Title used when a request carries none
    pub default_title: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            language: "en".to_string(),
            default_title: "Document".to_string(),
        }
    }
}

/// Which backend produces the output bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Tagged PDF
    #[default]
    Pdf,
    /// Assembled HTML page
    Html,
}

/// Output delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Inline viewing or forced download
    pub disposition: Disposition,
    /// Output backend
    pub backend: BackendKind,
}

/// PDF backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PdfSettings {
    /// Font files to embed
    pub fonts: Vec<PathBuf>,
    /// Directory local image sources resolve against
    pub asset_root: Option<PathBuf>,
    /// Produce a tagged PDF
    pub tagged: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            fonts: Vec::new(),
            asset_root: None,
            tagged: true,
        }
    }
}
