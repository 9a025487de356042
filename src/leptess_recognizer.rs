use image::{ GrayImage, ImageFormat };
use leptess::{ LepTess, Variable };
use tracing::debug;

use std::io::Cursor;
use std::path::Path;

use crate::error::{ LprError, LprErrorKind };
use crate::recognizer::{ OcrConfig, TextRecognizer };

/// Tesseract linked into the process. Language data is loaded once, in [`new`](Self::new).
///
/// `engine_mode` is not applied here: the engine starts in its built-in default mode.
pub struct LeptessRecognizer {
    engine: LepTess,
    has_image: bool,
    output: Option<String>,
}

impl LeptessRecognizer {

    pub fn new(config: &OcrConfig) -> Result<Self, LprError> {
        let data_path = config.data_path.as_deref().map(data_path_str).transpose()?;
        let mut engine = LepTess::new(data_path, &config.language)
            .map_err(|e| LprError::recognition(format!("tesseract init with '{}': {}", config.language, e)))?;
        engine.set_variable(Variable::TesseditPagesegMode, &config.page_segmentation_mode.to_string())
            .map_err(|e| LprError::recognition(format!("page segmentation mode: {}", e)))?;
        debug!(language = %config.language, psm = config.page_segmentation_mode, "tesseract engine ready");
        Ok(Self { engine, has_image: false, output: None })
    }
}

fn data_path_str(path: &Path) -> Result<&str, LprError> {
    path.to_str().ok_or_else(|| LprError::recognition(format!("tessdata path {:?} is not UTF-8", path)))
}

fn encode_png(image: &GrayImage) -> Result<Vec<u8>, LprError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

impl TextRecognizer for LeptessRecognizer {

    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError> {
        let png = encode_png(image)?;
        self.engine.set_image_from_mem(&png)
            .map_err(|e| LprError::recognition(format!("set image: {}", e)))?;
        self.has_image = true;
        self.output = None;
        Ok(())
    }

    fn recognize(&mut self) -> Result<(), LprError> {
        if !self.has_image {
            return Err(LprErrorKind::NoImage.into());
        }
        let text = self.engine.get_utf8_text()
            .map_err(|e| LprError::recognition(format!("utf-8 text: {}", e)))?;
        self.output = Some(text.trim().to_string());
        Ok(())
    }

    fn text(&mut self) -> Result<String, LprError> {
        Ok(self.output.clone().unwrap_or_default())
    }
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, Luma };
    use std::error::Error;
    use std::path::PathBuf;

    use super::{ data_path_str, encode_png, LeptessRecognizer };
    use crate::recognizer::OcrConfig;

    #[test]
    fn plate_is_handed_over_as_png() -> Result<(), Box<dyn Error>> {
        let png = encode_png(&GrayImage::from_pixel(20, 8, Luma([255u8])))?;
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png)?;
        assert_eq!((decoded.width(), decoded.height()), (20, 8));
        Ok(())
    }

    #[test]
    fn tessdata_path_is_passed_through() {
        let path = PathBuf::from("/usr/share/tessdata");
        assert_eq!(data_path_str(&path).ok(), Some("/usr/share/tessdata"));
    }

    #[test]
    fn missing_language_data_fails_at_construction() {
        let config = OcrConfig {
            data_path: Some(PathBuf::from("/nonexistent/tessdata")),
            ..Default::default()
        };
        let err = LeptessRecognizer::new(&config).err().map(|e| e.to_string());
        assert!(err.map_or(false, |e| e.contains("tesseract init")));
    }
}
