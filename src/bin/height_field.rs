// ============================================================================
// height-field — reconstruct a height map from a shading map
// ============================================================================
//
// Usage examples:
//   height-field --shading-map shading_shading.png
//   height-field --shading-map shading_shading.png --azimuth 135 --polar 60

use std::process::ExitCode;

use clap::Parser;

use shading_separator::height::{compute_absolute_heights, compute_relative_heights};
use shading_separator::normals::{compute_relative_normals, DEFAULT_LAMBDA};
use shading_separator::{image_io, log_err, log_info, logger, pixelmath};

/// Reconstructs a height field from a shading (illumination) map under a
/// known light direction.
#[derive(Parser, Debug)]
#[command(
    name = "height-field",
    about = "Reconstruct a height field from a shading map",
    long_about = "Solve for per-pixel surface normals from a shading map and a\n\
                  known light direction, then integrate those normals into an\n\
                  absolute height field via Poisson-style relaxation.\n\n\
                  Example:\n  height-field --shading-map shading_shading.png"
)]
struct CliArgs {
    /// Shading (illumination) map produced by `separator`.
    #[arg(long = "shading-map", value_name = "PATH")]
    shading_map: std::path::PathBuf,

    /// Output height map path.
    #[arg(long, default_value = "height_map.png", value_name = "PATH")]
    output: std::path::PathBuf,

    /// Light azimuth angle in degrees.
    #[arg(long, default_value_t = 45.0, value_name = "DEG")]
    azimuth: f32,

    /// Light polar (zenith) angle in degrees.
    #[arg(long, default_value_t = 45.0, value_name = "DEG")]
    polar: f32,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init("height-field");
    log_info!(
        "shading_map={:?} azimuth={} polar={}",
        args.shading_map,
        args.azimuth,
        args.polar
    );

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            log_err!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut shading, width, height) = image_io::read_gray_f32(&args.shading_map)?;
    pixelmath::clamp_scalar(&mut shading);

    let azimuth = args.azimuth.to_radians();
    let polar = args.polar.to_radians();
    let light = [
        polar.sin() * azimuth.cos(),
        polar.sin() * azimuth.sin(),
        polar.cos(),
    ];

    let normals = compute_relative_normals(&shading, light, DEFAULT_LAMBDA);
    let relative_heights = compute_relative_heights(&normals, width, height);
    let absolute_heights = compute_absolute_heights(&relative_heights, width, height);

    image_io::write_gray_f32(&absolute_heights, width, height, &args.output)?;

    println!("wrote {}", args.output.display());
    log_info!("wrote {}", args.output.display());
    Ok(())
}
