// ============================================================================
// probability — per-material probability masks from an albedo image
// ============================================================================
//
// Usage examples:
//   probability --input-image shading_albedo.png --output probability_map.png --sets 4

use std::process::ExitCode;

use clap::Parser;

use shading_separator::material::{compute_probability, init_material_sets, remove_outliers};
use shading_separator::{image_io, log_err, log_info, logger, pixelmath};

/// Clusters an albedo image into material sets and writes a per-set
/// probability mask for each.
#[derive(Parser, Debug)]
#[command(
    name = "probability",
    about = "Synthesize per-material probability masks from an albedo image",
    long_about = "Cluster an albedo image into material sets via k-means, purify\n\
                  each set with morphological erosion and a majority-KNN outlier\n\
                  filter, then write one probability mask per set.\n\n\
                  Example:\n  probability --input-image albedo.png --output probability_map.png --sets 4"
)]
struct CliArgs {
    /// Albedo (or any RGB) image to cluster into material sets.
    #[arg(long = "input-image", value_name = "PATH")]
    input_image: std::path::PathBuf,

    /// Output file path; the set index is inserted before the extension, e.g.
    /// `--output probability_map.png` writes `probability_map0.png`,
    /// `probability_map1.png`, …
    #[arg(long, value_name = "PATH")]
    output: String,

    /// Number of material sets to synthesize.
    #[arg(long, value_name = "N")]
    sets: usize,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init("probability");
    log_info!(
        "input_image={:?} output={} sets={}",
        args.input_image,
        args.output,
        args.sets
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
    let (mut albedo, width, height) = image_io::read_rgb_f32(&args.input_image)?;
    pixelmath::clamp(&mut albedo);

    let sets = init_material_sets(&albedo, width, height, args.sets);
    let sets = remove_outliers(&sets, &albedo);
    let probabilities = compute_probability(&sets, &albedo);

    let (prefix, ext) = split_prefix_ext(&args.output);
    for (i, prob) in probabilities.iter().enumerate() {
        let path = format!("{prefix}{i}{ext}");
        image_io::write_gray_f32(prob, width, height, std::path::Path::new(&path))?;
        println!("wrote {path}");
        log_info!("wrote {path}");
    }
    Ok(())
}

/// Splits `output` at its first `.` into a prefix and an extension (the
/// extension keeps the leading dot). If there is no `.`, the whole string is
/// the prefix and the extension is empty — matching the original CLI's
/// `outName.find('.')` / `substr` split.
fn split_prefix_ext(output: &str) -> (&str, &str) {
    match output.find('.') {
        Some(pos) => (&output[..pos], &output[pos..]),
        None => (output, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_prefix_before_first_dot() {
        assert_eq!(split_prefix_ext("probability_map.png"), ("probability_map", ".png"));
    }

    #[test]
    fn splits_at_first_dot_with_multiple_dots() {
        assert_eq!(split_prefix_ext("masks.v2.tga"), ("masks", ".v2.tga"));
    }

    #[test]
    fn no_dot_leaves_extension_empty() {
        assert_eq!(split_prefix_ext("masks"), ("masks", ""));
    }
}
