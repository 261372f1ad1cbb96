use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling a z-stack from an acquisition folder.
///
/// Missing individual slice files are not errors; they degrade to zero-filled
/// planes and are reported as [`Diagnostic`] records instead.
///
/// [`Diagnostic`]: crate::stack_loader::Diagnostic
#[derive(Debug, Error)]
pub enum StackError {
    #[error("malformed filename {0:?}: expected <f0>_<f1>_<f2>_<z>_<f4>_<ch>_<ch>_<ch>.tif")]
    MalformedFilename(String),

    #[error("acquisition parameters not found at {0}")]
    MetadataNotFound(PathBuf),

    #[error("malformed acquisition parameters: {0}")]
    MetadataMalformed(#[source] serde_json::Error),

    #[error("invalid acquisition parameters: {0}")]
    InvalidAcquisitionParameters(String),

    #[error("crop size {size} exceeds image dimensions {height}x{width}")]
    CropTooLarge {
        size: usize,
        height: usize,
        width: usize,
    },

    #[error("selection produced no z-indices")]
    EmptySelection,

    #[error("inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("unsupported TIFF sample format in {0}")]
    UnsupportedSampleFormat(PathBuf),

    #[error("malformed layer settings: {0}")]
    SettingsMalformed(#[source] serde_json::Error),

    #[error("stack assembly cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
}
