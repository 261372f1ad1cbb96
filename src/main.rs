use std::error::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use zstack_volume::metadata::{self, AcquisitionParameters};
use zstack_volume::scale::PhysicalScale;
use zstack_volume::stack_loader::{LoadOptions, StackLoader};

#[derive(Parser, Debug)]
#[command(about = "Assemble multi-channel microscopy z-stacks from a folder of TIFF slices")]
struct Args {
    /// Acquisition folder containing "acquisition parameters.json" and "0/"
    folder: PathBuf,

    /// Average blocks of NxN pixels in each plane
    #[arg(long, default_value = "1")]
    binning: NonZeroUsize,

    /// Keep every Nth z-slice
    #[arg(long, default_value = "1")]
    z_downsample: NonZeroUsize,

    /// Half-open z-index range to load
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    z_range: Option<Vec<i64>>,

    /// Center-crop each plane to SIZExSIZE before binning
    #[arg(long, value_name = "SIZE")]
    crop: Option<NonZeroUsize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();
    info!("{}", metadata::summary_or_error(&args.folder));

    let params = AcquisitionParameters::load(&args.folder)?;
    let options = LoadOptions {
        xy_binning: args.binning,
        z_downsample: args.z_downsample,
        z_range: args.z_range.as_ref().map(|range| (range[0], range[1])),
        crop_size: args.crop,
    };
    let scale = PhysicalScale::from_parameters(&params, options.xy_binning, options.z_downsample)?;

    let assembled = StackLoader::load_from_folder(&args.folder, &options)?;
    info!("loaded z-indices: {:?}", assembled.plan);
    for (channel, stack) in &assembled.stacks {
        info!("{channel}: {:?}", stack.dim());
    }
    info!(
        "voxel size: {} x {} x {} µm (z, y, x)",
        scale.z_spacing_um, scale.pixel_size_um, scale.pixel_size_um
    );
    if !assembled.diagnostics.is_empty() {
        warn!("{} diagnostics emitted during assembly", assembled.diagnostics.len());
    }

    Ok(())
}
