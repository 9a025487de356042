use image::{ GrayImage, ImageFormat };
use serde::{ Deserialize, Serialize };
use tempfile::NamedTempFile;
use tracing::warn;

use std::path::PathBuf;
use std::process::Command;

use crate::error::{ LprError, LprErrorKind };

/// Tesseract-style engine: hand over a raster, run recognition, read the text back.
/// Engines are stateful, so every call takes `&mut self`.
pub trait TextRecognizer {
    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError>;
    /// Fails with [`LprErrorKind::NoImage`] when no image was set.
    fn recognize(&mut self) -> Result<(), LprError>;
    fn text(&mut self) -> Result<String, LprError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &mut R {
    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError> {
        (**self).set_image(image)
    }

    fn recognize(&mut self) -> Result<(), LprError> {
        (**self).recognize()
    }

    fn text(&mut self) -> Result<String, LprError> {
        (**self).text()
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError> {
        (**self).set_image(image)
    }

    fn recognize(&mut self) -> Result<(), LprError> {
        (**self).recognize()
    }

    fn text(&mut self) -> Result<String, LprError> {
        (**self).text()
    }
}

/// Runs one filtered plate through the engine. Failures leave the text empty.
pub fn read_plate<R: TextRecognizer + ?Sized>(engine: &mut R, plate: &GrayImage) -> String {
    let run = |engine: &mut R| -> Result<String, LprError> {
        engine.set_image(plate)?;
        engine.recognize()?;
        engine.text()
    };
    match run(engine) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "recognition failed, keeping empty text");
            String::new()
        }
    }
}

/// Tesseract's `--oem` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineMode {
    TesseractOnly,
    LstmOnly,
    TesseractLstmCombined,
    Default,
}

impl Default for EngineMode {
    fn default() -> Self {
        EngineMode::TesseractLstmCombined
    }
}

impl EngineMode {
    pub fn oem(self) -> u8 {
        match self {
            EngineMode::TesseractOnly => 0,
            EngineMode::LstmOnly => 1,
            EngineMode::TesseractLstmCombined => 2,
            EngineMode::Default => 3,
        }
    }

    pub fn from_oem(oem: u8) -> Option<Self> {
        match oem {
            0 => Some(EngineMode::TesseractOnly),
            1 => Some(EngineMode::LstmOnly),
            2 => Some(EngineMode::TesseractLstmCombined),
            3 => Some(EngineMode::Default),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory holding the `*.traineddata` files; `None` uses the engine's default.
    pub data_path: Option<PathBuf>,
    /// Language code such as `rus` or `eng+rus`.
    pub language: String,
    pub engine_mode: EngineMode,
    /// Tesseract page segmentation mode.
    pub page_segmentation_mode: u32,
    /// Executable to run.
    pub binary: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            language: "rus".to_string(),
            engine_mode: EngineMode::default(),
            page_segmentation_mode: 3,
            binary: PathBuf::from("tesseract"),
        }
    }
}

/// Drives the `tesseract` command line tool, one process per recognized plate.
pub struct TesseractCli {
    config: OcrConfig,
    input: Option<NamedTempFile>,
    output: Option<String>,
}

impl TesseractCli {

    pub fn new(config: OcrConfig) -> Self {
        Self { config, input: None, output: None }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Arguments following the input path.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec!["stdout".to_string()];
        if let Some(dir) = &self.config.data_path {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args.extend([
            "-l".to_string(),
            self.config.language.clone(),
            "--oem".to_string(),
            self.config.engine_mode.oem().to_string(),
            "--psm".to_string(),
            self.config.page_segmentation_mode.to_string(),
        ]);
        args
    }
}

impl TextRecognizer for TesseractCli {

    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError> {
        let file = tempfile::Builder::new().suffix(".png").tempfile()?;
        image.save_with_format(file.path(), ImageFormat::Png)?;
        self.input = Some(file);
        self.output = None;
        Ok(())
    }

    fn recognize(&mut self) -> Result<(), LprError> {
        let input = self.input.as_ref().ok_or(LprErrorKind::NoImage)?;
        let output = Command::new(&self.config.binary)
            .arg(input.path())
            .args(self.command_args())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LprError::recognition(stderr.trim()));
        }
        self.output = Some(String::from_utf8_lossy(&output.stdout).trim().to_string());
        Ok(())
    }

    fn text(&mut self) -> Result<String, LprError> {
        Ok(self.output.clone().unwrap_or_default())
    }
}
