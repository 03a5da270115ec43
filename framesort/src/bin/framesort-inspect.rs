use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use framesort::{features::Features, record::FrameFeatures};
use framesort_common::bin_common::init::init_eyre;
use rayon::prelude::*;

#[derive(Parser)]
#[command()]
/// Calculates the ranking features of still images
///
/// This uses rayon, so the `RAYON_NUM_THREADS` environment variable might be of interest.
struct Cli {
    #[command(flatten)]
    features_args: Features,

    /// The image files to use
    inputs: Vec<PathBuf>,
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = Cli::parse();

    let features: Vec<FrameFeatures> = cli
        .inputs
        .par_iter()
        .map(|input| -> eyre::Result<FrameFeatures> {
            let pic = image::open(input)
                .wrap_err_with(|| format!("Could not open {:?}", input))?
                .to_rgb8();
            Ok(cli.features_args.extract(&pic))
        })
        .collect::<eyre::Result<_>>()?;

    for (input, features) in cli.inputs.iter().zip(features) {
        let FrameFeatures {
            hue,
            saturation,
            contours,
        } = features;
        let input = input.display();
        println!(
            "{input}: Hue={:.6}±{:.6}, Saturation={:.6}±{:.6}, Contours={}(area std {:.3})",
            hue.mean, hue.std, saturation.mean, saturation.std, contours.count, contours.area_std
        );
    }

    Ok(())
}
