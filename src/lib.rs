//! License plate detection from contour geometry.
//!
//! ```no_run
//! use lpr_contour::{ Lpr, OcrConfig, TesseractCli };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut lpr = Lpr::new(TesseractCli::new(OcrConfig::default()));
//! let img = image::open("car.jpg")?;
//! for plate in lpr.detect_license_plates(&img)? {
//!     println!("{} at {:?}", plate.text, plate.region.center);
//! }
//! # Ok(())
//! # }
//! ```

use image::{ DynamicImage, GrayImage };
use tracing::{ info, warn };

pub mod config;
pub mod contour_tree;
pub mod error;
pub mod geometry;
pub mod image_process;
#[cfg(feature = "tesseract")]
pub mod leptess_recognizer;
pub mod recognizer;
pub mod selector;
pub mod utils;

pub use config::{ AppConfig, DetectorConfig };
pub use contour_tree::ContourTree;
pub use error::{ LprError, LprErrorKind };
pub use geometry::OrientedBox;
pub use image_process::{ CharacterMaskFilter, PlateRectifier };
pub use recognizer::{ EngineMode, OcrConfig, TesseractCli, TextRecognizer };
pub use selector::{ Candidate, ContourSource, PlateSelector };
#[cfg(feature = "tesseract")]
pub use leptess_recognizer::LeptessRecognizer;

/// One plate found in an image.
#[derive(Debug, Clone)]
pub struct PlateDetection {
    /// Recognized text, empty when the engine read nothing or failed.
    pub text: String,
    /// Upright gray-scale crop of the plate.
    pub plate: GrayImage,
    /// Binary characters-only version of `plate` that was sent to OCR.
    pub filtered: GrayImage,
    /// Plate region in source image coordinates.
    pub region: OrientedBox,
}

/// Detection entry point. Owns the OCR engine, so one `Lpr` serves one thread.
pub struct Lpr<R> {
    config: DetectorConfig,
    selector: PlateSelector,
    rectifier: PlateRectifier,
    filter: CharacterMaskFilter,
    ocr: R,
}

impl<R: TextRecognizer> Lpr<R> {

    pub fn new(ocr: R) -> Self {
        Self::with_config(ocr, DetectorConfig::default())
    }

    pub fn with_config(ocr: R, config: DetectorConfig) -> Self {
        Self {
            selector: PlateSelector::new(&config),
            rectifier: PlateRectifier::new(&config),
            filter: CharacterMaskFilter::new(&config),
            config,
            ocr,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn ocr(&self) -> &R {
        &self.ocr
    }

    pub fn ocr_mut(&mut self) -> &mut R {
        &mut self.ocr
    }

    pub fn into_ocr(self) -> R {
        self.ocr
    }

    /// Finds, straightens and reads every plate, in contour visiting order.
    pub fn detect_license_plates(&mut self, img: &DynamicImage) -> Result<Vec<PlateDetection>, LprError> {
        let gray = image_process::to_gray(img)?;
        let edges = image_process::edge_map(&gray, self.config.canny_low, self.config.canny_high);
        let tree = ContourTree::from_edge_map(&edges);
        let plates = self.detect_in_tree(&tree, &gray);
        info!(contours = tree.len(), plates = plates.len(), "detection finished");
        Ok(plates)
    }

    /// Plate search over an already built hierarchy; `gray` supplies the pixels.
    pub fn detect_in_tree<S: ContourSource + ?Sized>(&mut self, source: &S, gray: &GrayImage) -> Vec<PlateDetection> {
        let mut plates = Vec::new();
        let Self { selector, rectifier, filter, ocr, .. } = self;
        selector.select_with(source, |candidate| {
            match process_candidate(rectifier, filter, ocr, gray, &candidate) {
                Ok(plate) => {
                    info!(id = candidate.id, text = %plate.text, "plate found");
                    plates.push(plate);
                }
                Err(e) => warn!(id = candidate.id, error = %e, "dropping plate candidate"),
            }
        });
        plates
    }
}

fn process_candidate<R: TextRecognizer>(
    rectifier: &PlateRectifier,
    filter: &CharacterMaskFilter,
    ocr: &mut R,
    gray: &GrayImage,
    candidate: &Candidate,
) -> Result<PlateDetection, LprError> {
    let plate = rectifier.rectify(gray, &candidate.region)?;
    let filtered = filter.filter(&plate);
    let text = recognizer::read_plate(ocr, &filtered);
    Ok(PlateDetection { text, plate, filtered, region: candidate.region })
}
