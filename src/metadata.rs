use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::StackError;

/// Descriptor file written by the acquisition software, relative to the
/// acquisition folder.
pub const ACQUISITION_FILE: &str = "acquisition parameters.json";

/// Acquisition metadata needed to place the stack in physical space.
///
/// Loaded once per folder and immutable for the session. The descriptor
/// carries many more keys; only the ones relevant to display geometry are
/// deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionParameters {
    /// Spacing between consecutive z-slices, in micrometers.
    #[serde(rename = "dz(um)")]
    pub dz_um: f64,
    /// Physical size of one sensor pixel, in micrometers.
    pub sensor_pixel_size_um: f64,
    pub objective: Objective,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Objective {
    pub magnification: f64,
}

impl AcquisitionParameters {
    /// Read the descriptor file from an acquisition folder.
    ///
    /// # Errors
    ///
    /// [`StackError::MetadataNotFound`] if the file is absent,
    /// [`StackError::MetadataMalformed`] if required keys are missing or
    /// non-numeric.
    pub fn load(folder: impl AsRef<Path>) -> Result<Self, StackError> {
        let path = folder.as_ref().join(ACQUISITION_FILE);
        if !path.exists() {
            return Err(StackError::MetadataNotFound(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        serde_json::from_reader(reader).map_err(StackError::MetadataMalformed)
    }
}

impl fmt::Display for AcquisitionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Z-step: {:.2} µm, Pixel size: {} µm, Magnification: {}x",
            self.dz_um, self.sensor_pixel_size_um, self.objective.magnification
        )
    }
}

/// Human-readable acquisition summary for a folder.
///
/// Load failures are reported in the returned string rather than raised, so
/// a front end can always show something next to the folder picker.
pub fn summary_or_error(folder: impl AsRef<Path>) -> String {
    match AcquisitionParameters::load(folder) {
        Ok(params) => params.to_string(),
        Err(err) => format!("Error loading acquisition parameters: {err}"),
    }
}
