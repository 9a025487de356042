use clap::{ Arg, App };
use image::{ DynamicImage, ImageFormat };
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::fs;
use std::path::Path;

use lpr_contour::{ utils, AppConfig, EngineMode, Lpr, OcrConfig, PlateDetection, TextRecognizer };


fn main() -> Result<(), Box<dyn Error>> {
    let matches = App::new("lpr-contour")
                    .version("0.1.0")
                    .author("kingrong")
                    .about("Finds license plates by contour geometry and reads them with Tesseract")
                    .arg(Arg::with_name("INPUT")
                        .help("image file with license plate")
                        .required(true)
                        .index(1))
                    .arg(Arg::with_name("config")
                        .long("config")
                        .value_name("FILE")
                        .help("TOML file with [detector] and [ocr] sections")
                        .takes_value(true))
                    .arg(Arg::with_name("tessdata")
                        .long("tessdata")
                        .value_name("DIR")
                        .help("directory with *.traineddata files")
                        .takes_value(true))
                    .arg(Arg::with_name("lang")
                        .long("lang")
                        .value_name("CODE")
                        .help("recognition language, e.g. rus")
                        .takes_value(true))
                    .arg(Arg::with_name("oem")
                        .long("oem")
                        .value_name("N")
                        .help("tesseract engine mode, 0-3")
                        .takes_value(true))
                    .arg(Arg::with_name("output")
                        .long("output")
                        .value_name("DIR")
                        .help("write annotated.png and plate_<i>.png here")
                        .takes_value(true))
                    .arg(Arg::with_name("font")
                        .long("font")
                        .value_name("TTF")
                        .help("font for plate labels in annotated.png")
                        .takes_value(true))
                    .arg(Arg::with_name("display")
                        .long("display")
                        .help("show the annotated image in a window"))
                    .arg(Arg::with_name("verbose")
                        .short("v")
                        .help("log every selector decision"))
                    .get_matches();

    let level = if matches.is_present("verbose") { "lpr_contour=debug" } else { "lpr_contour=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match matches.value_of("config") {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = matches.value_of("tessdata") {
        config.ocr.data_path = Some(dir.into());
    }
    if let Some(lang) = matches.value_of("lang") {
        config.ocr.language = lang.to_string();
    }
    if let Some(oem) = matches.value_of("oem") {
        config.ocr.engine_mode = oem.parse().ok()
            .and_then(EngineMode::from_oem)
            .ok_or("--oem expects a number from 0 to 3")?;
    }

    let file_name = matches.value_of("INPUT").ok_or("image is required")?;
    let img = image::open(file_name)?;

    let mut lpr = Lpr::with_config(ocr_engine(config.ocr)?, config.detector);
    let plates = lpr.detect_license_plates(&img)?;
    for (i, plate) in plates.iter().enumerate() {
        let r = &plate.region;
        println!("{}: {:?} center: ({:.1}, {:.1}), size: {:.1}x{:.1}, angle: {:.1}",
            i, plate.text, r.center.x, r.center.y, r.width, r.height, r.angle);
    }

    let annotated = annotate(&img, &plates, matches.value_of("font"))?;
    if let Some(dir) = matches.value_of("output") {
        let dir = Path::new(dir);
        fs::create_dir_all(dir)?;
        annotated.save_with_format(dir.join("annotated.png"), ImageFormat::Png)?;
        for (i, plate) in plates.iter().enumerate() {
            utils::plate_strip(&plate.plate, &plate.filtered)
                .save_with_format(dir.join(format!("plate_{}.png", i)), ImageFormat::Png)?;
        }
    }

    if matches.is_present("display") {
        show(&annotated);
    }

    Ok(())
}

#[cfg(feature = "tesseract")]
fn ocr_engine(config: OcrConfig) -> Result<Box<dyn TextRecognizer>, Box<dyn Error>> {
    Ok(Box::new(lpr_contour::LeptessRecognizer::new(&config)?))
}

#[cfg(not(feature = "tesseract"))]
fn ocr_engine(config: OcrConfig) -> Result<Box<dyn TextRecognizer>, Box<dyn Error>> {
    Ok(Box::new(lpr_contour::TesseractCli::new(config)))
}

fn annotate(img: &DynamicImage, plates: &[PlateDetection], font: Option<&str>) -> Result<image::RgbImage, Box<dyn Error>> {
    let mut canvas = img.to_rgb8();
    let font = font.map(utils::load_font).transpose()?;
    for plate in plates {
        utils::draw_region_mut(&mut canvas, &plate.region, utils::BOX_COLOR, utils::BOX_THICKNESS);
        if let Some(font) = &font {
            utils::draw_label_mut(&mut canvas, &plate.region, &plate.text, font, utils::BOX_COLOR);
        }
    }
    Ok(canvas)
}

#[cfg(feature = "display-window")]
fn show(annotated: &image::RgbImage) {
    let rgba = DynamicImage::ImageRgb8(annotated.clone()).to_rgba8();
    imageproc::window::display_image("res", &rgba, 700, 700);
}

#[cfg(not(feature = "display-window"))]
fn show(_annotated: &image::RgbImage) {
    tracing::warn!("built without the display-window feature, nothing to show");
}
