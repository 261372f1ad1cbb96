use std::num::NonZeroUsize;

use crate::error::StackError;
use crate::metadata::AcquisitionParameters;

/// Physical size of one voxel of an assembled stack, in micrometers.
///
/// `pixel_size_um` applies to both planar axes; `z_spacing_um` to the slice
/// axis. Display geometry only, pixel values are unaffected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalScale {
    pub z_spacing_um: f64,
    pub pixel_size_um: f64,
}

impl PhysicalScale {
    /// Derive the voxel size from acquisition metadata and the two
    /// resolution-reduction factors.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::InvalidAcquisitionParameters`] when the
    /// magnification is zero or non-finite.
    pub fn from_parameters(
        params: &AcquisitionParameters,
        xy_binning: NonZeroUsize,
        z_downsample: NonZeroUsize,
    ) -> Result<Self, StackError> {
        let magnification = params.objective.magnification;
        if magnification == 0.0 || !magnification.is_finite() {
            return Err(StackError::InvalidAcquisitionParameters(format!(
                "magnification must be finite and non-zero, got {magnification}"
            )));
        }

        Ok(Self {
            z_spacing_um: params.dz_um * z_downsample.get() as f64,
            pixel_size_um: (params.sensor_pixel_size_um / magnification) * xy_binning.get() as f64,
        })
    }
}
