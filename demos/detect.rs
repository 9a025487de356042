use image::ImageFormat;

use std::error::Error;
use std::env::args;
use std::process;

use lpr_contour::{ image_process, utils, ContourTree, DetectorConfig, PlateSelector };

// Geometry only: outlines every plate candidate without running OCR.
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = args();
    args.next();
    let path = args.next();
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("didn't get a image from args");
            process::exit(1);
        }
    };

    let config = DetectorConfig::default();
    let img = image::open(path)?;
    let gray = image_process::to_gray(&img)?;
    let edges = image_process::edge_map(&gray, config.canny_low, config.canny_high);
    let tree = ContourTree::from_edge_map(&edges);
    let candidates = PlateSelector::new(&config).select(&tree);

    let mut canvas = img.to_rgb8();
    for candidate in &candidates {
        let r = &candidate.region;
        println!("contour {}: area: {:.0}, children: {}, box: {:.1}x{:.1} at ({:.1}, {:.1}), angle: {:.1}",
            candidate.id, candidate.area, candidate.children, r.width, r.height, r.center.x, r.center.y, r.angle);
        utils::draw_region_mut(&mut canvas, r, utils::BOX_COLOR, utils::BOX_THICKNESS);
    }
    println!("contours: {}, candidates: {}", tree.len(), candidates.len());
    canvas.save_with_format("detect_result.png", ImageFormat::Png)?;
    Ok(())
}
