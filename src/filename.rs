use std::ops::Range;
use std::path::Path;

use crate::error::StackError;

/// Prefix used by resource-fork and other hidden sidecar files.
pub const HIDDEN_PREFIX: &str = "._";

const IMAGE_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

// Fixed underscore-delimited layout: the 4th field is the z-index, fields
// 6-8 joined form the channel id.
const Z_FIELD: usize = 3;
const CHANNEL_FIELDS: Range<usize> = 5..8;

/// Identifies one source image within an acquisition folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceKey {
    pub z_index: i64,
    pub channel: String,
}

impl SliceKey {
    /// Derive the key from a slice filename.
    ///
    /// The extension is stripped first, so the last channel field never
    /// carries a `.tif`/`.tiff` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::MalformedFilename`] if the name has fewer
    /// fields than the fixed layout requires or the z field is not an
    /// integer.
    pub fn parse(filename: &str) -> Result<Self, StackError> {
        let malformed = || StackError::MalformedFilename(filename.to_owned());

        let stem = Path::new(filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(malformed)?;
        let fields: Vec<&str> = stem.split('_').collect();
        if fields.len() < CHANNEL_FIELDS.end {
            return Err(malformed());
        }

        let z_index = fields[Z_FIELD].parse::<i64>().map_err(|_| malformed())?;
        let channel = fields[CHANNEL_FIELDS].join("_");
        Ok(Self { z_index, channel })
    }
}

/// Whether a directory entry should enter the folder scan at all.
pub fn is_stack_image(filename: &str) -> bool {
    if filename.starts_with(HIDDEN_PREFIX) {
        return false;
    }
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
