use std::error::Error;
use std::env::args;
use std::process;
use std::time::SystemTime;
use std::fs;

use lpr_contour::{ Lpr, OcrConfig, TesseractCli };

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = args();
    args.next();
    let path = args.next();
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("didn't get a image dir from args");
            process::exit(1);
        }
    };
    let mut lpr = Lpr::new(TesseractCli::new(OcrConfig::default()));
    let dir = fs::read_dir(path)?;

    let mut speeds = Vec::new();
    let mut total_amount = 0;
    let mut success = 0;
    for entry_result in dir {
        if let Ok(item) = entry_result {
            let path = item.path();
            let is_jpg = path.extension().map_or(false, |ext| ext == "jpg");
            if !is_jpg {
                continue;
            }
            print!("file: {:?},  ", path);
            let before_time = SystemTime::now();
            let img = image::open(&path)?;
            let res = lpr.detect_license_plates(&img)?;
            let duration = SystemTime::now().duration_since(before_time)?;
            let speed = duration.as_millis();
            total_amount += 1;
            speeds.push(speed);
            if res.iter().any(|plate| !plate.text.is_empty()) {
                success += 1;
            }
            let texts: Vec<&str> = res.iter().map(|plate| plate.text.as_str()).collect();
            println!("res: {:?}, speed: {}", texts, speed);
        }
    }
    let total_speed: u128 = speeds.iter().sum();
    let average_speed = if speeds.is_empty() { 0 } else { total_speed / speeds.len() as u128 };
    println!("total_amount: {}, success: {}, average_speed: {}", total_amount, success, average_speed);
    Ok(())
}
