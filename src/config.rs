use serde::{ Deserialize, Serialize };

use std::fs;
use std::path::Path;

use crate::error::LprError;
use crate::recognizer::OcrConfig;

/// Tunables of the detection pipeline.
///
/// The defaults are the values the selector, rectifier and filter were tuned with,
/// so most callers should only ever touch the OCR settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Canny hysteresis thresholds for the edge map of the whole image.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Contours with an area at or below this are not explored at all.
    pub min_area: f64,
    /// A plate needs at least this many directly nested contours.
    pub min_children: usize,
    /// Open interval for the width/height ratio of a plate.
    pub min_ratio: f64,
    pub max_ratio: f64,
    /// Rectified plates are scaled uniformly to fit this envelope.
    pub envelope_width: u32,
    pub envelope_height: u32,
    /// Pixels cropped from every side of the rectified plate.
    pub edge_margin: u32,
    /// Binary-inverse threshold applied before masking.
    pub plate_threshold: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 100.0,
            min_area: 400.0,
            min_children: 3,
            min_ratio: 3.0,
            max_ratio: 10.0,
            envelope_width: 240,
            envelope_height: 180,
            edge_margin: 3,
            plate_threshold: 120,
        }
    }
}

/// Everything the command line front end can read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub ocr: OcrConfig,
}

impl AppConfig {

    pub fn from_toml(text: &str) -> Result<Self, LprError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LprError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
