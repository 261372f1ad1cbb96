//! # zstack-volume
//!
//! Assemble multi-channel microscopy z-stacks from a folder of individually
//! named 2D TIFF slices.
//!
//! An acquisition folder is expected to contain a descriptor file
//! (`acquisition parameters.json`) and a `0/` subdirectory of slice images
//! whose underscore-delimited filenames encode a z-index and a channel id.
//! The loader indexes the folder once, selects the z-indices to load
//! (optional half-open range filter plus stride), optionally center-crops
//! and block-mean-bins each plane, and builds one `[z, row, col]`
//! `Array3<f32>` per channel. Slice loads are independent and run in
//! parallel using rayon. Missing slice files degrade to zero-filled planes
//! with a diagnostic record instead of failing the assembly.
//!
//! Acquisition metadata (z-step, sensor pixel size, objective magnification)
//! yields the physical voxel size so a viewer can render the stacks with
//! correct proportions; the [`display::DisplaySink`] trait is the only
//! contract the crate has with any renderer.
//!
//! # Examples
//!
//! ## Assembling the stacks of an acquisition folder
//!
//! Load every channel at full resolution, keeping every second z-slice,
//! and compute the matching voxel size.
//!
//! ```no_run
//! # use std::num::NonZeroUsize;
//! # use std::path::PathBuf;
//! # use zstack_volume::metadata::AcquisitionParameters;
//! # use zstack_volume::scale::PhysicalScale;
//! # use zstack_volume::stack_loader::{LoadOptions, StackLoader};
//! let folder = PathBuf::from("acquisition");
//! let options = LoadOptions {
//!     z_downsample: NonZeroUsize::new(2).unwrap(),
//!     ..LoadOptions::default()
//! };
//! let assembled = StackLoader::load_from_folder(&folder, &options)
//!     .expect("should have assembled stacks from folder");
//! let params = AcquisitionParameters::load(&folder)
//!     .expect("should have read acquisition parameters");
//! let scale = PhysicalScale::from_parameters(&params, options.xy_binning, options.z_downsample)
//!     .expect("should have derived the voxel size");
//! for (channel, stack) in &assembled.stacks {
//!     println!("{channel}: {:?} at {:?}", stack.dim(), scale);
//! }
//! ```

pub mod display;
pub mod error;
pub mod filename;
pub mod metadata;
pub mod scale;
pub mod selection;
pub mod settings;
pub mod stack_loader;
pub mod transform;
