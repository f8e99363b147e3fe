use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: Scan,

    pub preview: Preview,

    pub export: Export,
}

/// Options requested from the device before every capture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scan {
    pub resolution: u32,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Preview {
    /// Intermediate file the preview is decoded from. Overwritten by every scan.
    pub path: PathBuf,

    pub max_width: u32,
    pub max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Export {
    pub pdf_dpi: f32,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            resolution: 300,
            mode: "Color".to_owned(),
        }
    }
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            path: PathBuf::from("last_scan.png"),
            max_width: 600,
            max_height: 600,
        }
    }
}

impl Default for Export {
    fn default() -> Self {
        Self { pdf_dpi: 100.0 }
    }
}

impl Config {
    pub fn read_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let dpath = path.display();

        let raw = fs::read_to_string(path).with_context(|| format!("reading file '{dpath}'"))?;
        let config = toml::from_str(&raw).with_context(|| format!("parsing file '{dpath}'"))?;

        Ok(config)
    }
}
