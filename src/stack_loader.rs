use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use tiff::decoder::{Decoder, DecodingResult};

use crate::error::StackError;
use crate::filename::{SliceKey, is_stack_image};
use crate::selection::select_z_indices;
use crate::transform::{bin_image, crop_center};

/// Subdirectory of the acquisition folder holding the slice images.
pub const IMAGE_SUBFOLDER: &str = "0";

/// Processing parameters for one assembly request.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Average blocks of NxN pixels in each plane.
    pub xy_binning: NonZeroUsize,
    /// Keep every Nth z-slice.
    pub z_downsample: NonZeroUsize,
    /// Half-open `[start, end)` filter on z-indices.
    pub z_range: Option<(i64, i64)>,
    /// Center-crop each plane to this square size before binning.
    pub crop_size: Option<NonZeroUsize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            xy_binning: NonZeroUsize::MIN,
            z_downsample: NonZeroUsize::MIN,
            z_range: None,
            crop_size: None,
        }
    }
}

/// Non-fatal conditions observed during assembly.
///
/// Each record is also forwarded to `log::warn!` when it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No source file matched a planned (z-index, channel) pair; the
    /// corresponding plane stays zero-filled.
    MissingSlice { z_index: i64, channel: String },
    /// An image file in the folder did not follow the filename layout and
    /// was left out of the scan.
    SkippedFile { filename: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSlice { z_index, channel } => {
                write!(f, "missing file for z={z_index}, channel={channel}")
            }
            Self::SkippedFile { filename, reason } => {
                write!(f, "skipped {filename}: {reason}")
            }
        }
    }
}

/// Cooperative cancellation for long-running assemblies.
///
/// Checked between slice loads; a cancelled load returns
/// [`StackError::Cancelled`] with nothing partially assembled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one assembly request.
#[derive(Debug)]
pub struct AssembledStacks {
    /// One `[z, row, col]` stack of 32-bit float intensities per discovered
    /// channel. All stacks share the same shape.
    pub stacks: BTreeMap<String, Array3<f32>>,
    /// The z-indices actually loaded, in stack order.
    pub plan: Vec<i64>,
    /// Missing or skipped files observed along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl AssembledStacks {
    /// Common shape of the channel stacks as (depth, height, width).
    pub fn dim(&self) -> Option<(usize, usize, usize)> {
        self.stacks.values().next().map(|stack| stack.dim())
    }
}

pub struct StackLoader;

impl StackLoader {
    /// Assemble one 3D stack per channel from an acquisition folder.
    ///
    /// Images are read from `<folder>/0/`. Each plane is center-cropped
    /// first (when requested) and then binned, in that order. Missing
    /// (z, channel) files leave zero-filled planes and a
    /// [`Diagnostic::MissingSlice`] record.
    ///
    /// # Errors
    ///
    /// Fails fast, before any stack is allocated, on an unreadable folder
    /// or an empty selection plan. Individual slice reads fail the request
    /// on IO/decode errors or dimension mismatches.
    pub fn load_from_folder(
        folder: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<AssembledStacks, StackError> {
        Self::load_from_folder_with_cancel(folder, options, &CancelToken::new())
    }

    /// Same as [`Self::load_from_folder`] with a cancellation token checked
    /// between slice loads.
    pub fn load_from_folder_with_cancel(
        folder: impl AsRef<Path>,
        options: &LoadOptions,
        cancel: &CancelToken,
    ) -> Result<AssembledStacks, StackError> {
        let image_folder = folder.as_ref().join(IMAGE_SUBFOLDER);
        let mut diagnostics = Vec::new();

        // Pass 1: index every well-formed image file once.
        let index = Self::scan_folder(&image_folder, &mut diagnostics)?;

        // A folder without a single usable image offers no z-indices to
        // select from. The lowest key doubles as the sizing sample so that
        // plane dimensions do not depend on directory listing order.
        let Some(sample_path) = index.iter().min_by(|a, b| a.0.cmp(b.0)).map(|(_, path)| path)
        else {
            return Err(StackError::EmptySelection);
        };

        let z_indices: BTreeSet<i64> = index.keys().map(|key| key.z_index).collect();
        let channels: BTreeSet<String> = index.keys().map(|key| key.channel.clone()).collect();
        let plan = select_z_indices(&z_indices, options.z_range, options.z_downsample)?;

        let (plane_height, plane_width) = Self::plane_dimensions(sample_path, options)?;

        // Pass 2: fill the stacks by exact key lookup. Plane loads within a
        // channel are independent, so they run in parallel; assignment and
        // diagnostics stay on the calling thread.
        let mut stacks = BTreeMap::new();
        for channel in &channels {
            let planes: Vec<(usize, Option<Array2<f32>>)> = plan
                .par_iter()
                .enumerate()
                .map(|(position, &z_index)| {
                    if cancel.is_cancelled() {
                        return Err(StackError::Cancelled);
                    }
                    let key = SliceKey {
                        z_index,
                        channel: channel.clone(),
                    };
                    match index.get(&key) {
                        Some(path) => {
                            let plane = Self::load_plane(path, options)?;
                            if plane.dim() != (plane_height, plane_width) {
                                return Err(StackError::InconsistentDimensions);
                            }
                            Ok((position, Some(plane)))
                        }
                        None => Ok((position, None)),
                    }
                })
                .collect::<Result<_, StackError>>()?;

            let mut stack = Array3::<f32>::zeros((plan.len(), plane_height, plane_width));
            for (position, plane) in planes {
                match plane {
                    Some(plane) => stack.slice_mut(s![position, .., ..]).assign(&plane),
                    None => {
                        let diagnostic = Diagnostic::MissingSlice {
                            z_index: plan[position],
                            channel: channel.clone(),
                        };
                        warn!("{diagnostic}");
                        diagnostics.push(diagnostic);
                    }
                }
            }
            stacks.insert(channel.clone(), stack);
        }

        Ok(AssembledStacks {
            stacks,
            plan,
            diagnostics,
        })
    }

    fn scan_folder(
        image_folder: &Path,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<HashMap<SliceKey, PathBuf>, StackError> {
        let mut index = HashMap::new();
        for entry in fs::read_dir(image_folder)? {
            let entry = entry?;
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !is_stack_image(&filename) {
                continue;
            }
            match SliceKey::parse(&filename) {
                Ok(key) => {
                    index.insert(key, entry.path());
                }
                Err(err) => {
                    let diagnostic = Diagnostic::SkippedFile {
                        filename,
                        reason: err.to_string(),
                    };
                    warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }
        }
        Ok(index)
    }

    /// Output plane dimensions, anticipated from one sample image before the
    /// main load loop.
    fn plane_dimensions(
        sample_path: &Path,
        options: &LoadOptions,
    ) -> Result<(usize, usize), StackError> {
        let mut sample = Self::read_image(sample_path)?;
        if let Some(crop_size) = options.crop_size {
            sample = crop_center(&sample, crop_size)?;
        }
        let (height, width) = sample.dim();
        let binning = options.xy_binning.get();
        // Floor division, identical to the truncation bin_image applies.
        Ok((height / binning, width / binning))
    }

    fn load_plane(path: &Path, options: &LoadOptions) -> Result<Array2<f32>, StackError> {
        let mut plane = Self::read_image(path)?;
        if let Some(crop_size) = options.crop_size {
            plane = crop_center(&plane, crop_size)?;
        }
        if options.xy_binning.get() > 1 {
            plane = bin_image(&plane, options.xy_binning);
        }
        Ok(plane)
    }

    fn read_image(path: &Path) -> Result<Array2<f32>, StackError> {
        let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
        let (width, height) = decoder.dimensions()?;
        let shape = (height as usize, width as usize);

        let pixels: Vec<f32> = match decoder.read_image()? {
            DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|value| value as f32).collect(),
            DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|value| value as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.into_iter().map(|value| value as f32).collect(),
            _ => return Err(StackError::UnsupportedSampleFormat(path.to_owned())),
        };

        // A length mismatch means more than one sample per pixel.
        Array2::from_shape_vec(shape, pixels)
            .map_err(|_| StackError::UnsupportedSampleFormat(path.to_owned()))
    }
}
