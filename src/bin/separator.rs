// ============================================================================
// separator — albedo/shading decomposition from a single RGB photograph
// ============================================================================
//
// Usage examples:
//   separator --source photo.png
//   separator --source photo.png --output result --region 14 --direct-iterations 8
//   separator --source photo.jpg --format tga --quantize-slots 16

use std::process::ExitCode;

use clap::Parser;

use shading_separator::pixelmath;
use shading_separator::separator::{separate, SeparatorParams};
use shading_separator::{image_io, log_err, log_info, logger};

/// Separates a photograph into an albedo (reflectance) map and a shading
/// (illumination) map via iterative expectation-maximization.
#[derive(Parser, Debug)]
#[command(
    name = "separator",
    about = "Separate a photograph into albedo and shading maps",
    long_about = "Decompose a single RGB photograph of a roughly flat, roughly\n\
                  uniformly-lit surface into an albedo map (view-independent\n\
                  reflectance color) and a shading map (illumination).\n\n\
                  Example:\n  separator --source photo.png --output result"
)]
struct CliArgs {
    /// Source photograph to decompose.
    #[arg(long, value_name = "PATH")]
    source: std::path::PathBuf,

    /// Output file prefix; writes `{prefix}_albedo.{format}` and `{prefix}_shading.{format}`.
    #[arg(long, default_value = "shading", value_name = "PREFIX")]
    output: String,

    /// Output image format/extension.
    #[arg(long, default_value = "png", value_name = "EXT")]
    format: String,

    /// Region side length R for the sliding-window decomposition.
    #[arg(long, default_value_t = 10, value_name = "R")]
    region: u32,

    /// Number of chroma quantization steps per axis.
    #[arg(long = "quantize-slots", default_value_t = 10, value_name = "S")]
    quantize_slots: u32,

    /// Inner (per direct-iteration) intensity re-estimation pass count.
    #[arg(long = "intensity-iterations", default_value_t = 5, value_name = "T")]
    intensity_iterations: u32,

    /// Outer direct-iteration pass count.
    #[arg(long = "direct-iterations", default_value_t = 5, value_name = "D")]
    direct_iterations: u32,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init("separator");
    log_info!("source={:?} output_prefix={}", args.source, args.output);

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
    let (mut source, width, height) = image_io::read_rgb_f32(&args.source)?;
    pixelmath::clamp(&mut source);

    let params = SeparatorParams {
        region: args.region,
        direct_iterations: args.direct_iterations,
        intensity_iterations: args.intensity_iterations,
        chroma_slots: args.quantize_slots,
    };

    let result = separate(&source, width, height, params, |d| {
        print!("\x1b[2K\rIteration {d}.");
        use std::io::Write;
        let _ = std::io::stdout().flush();
        log_info!("Iteration {d}.");
    })?;
    println!();

    let albedo_path = format!("{}_albedo.{}", args.output, args.format);
    let shading_path = format!("{}_shading.{}", args.output, args.format);
    image_io::write_rgb_f32(&result.albedo, width, height, std::path::Path::new(&albedo_path))?;
    image_io::write_gray_f32(&result.shading, width, height, std::path::Path::new(&shading_path))?;

    println!("wrote {albedo_path}");
    println!("wrote {shading_path}");
    log_info!("wrote {albedo_path} and {shading_path}");
    Ok(())
}
