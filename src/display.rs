use std::collections::BTreeMap;

use ndarray::Array3;

use crate::scale::PhysicalScale;
use crate::settings::ChannelSettings;

/// Rendering boundary of the assembly core.
///
/// Implementations receive the per-channel stacks together with the physical
/// voxel size and draw them however they like; the core never learns how.
/// `scale.z_spacing_um` applies to axis 0, `scale.pixel_size_um` uniformly
/// to both planar axes.
pub trait DisplaySink {
    /// Present the stacks. Previously exported layer settings, when given,
    /// are restored before the first draw.
    fn show(
        &mut self,
        stacks: &BTreeMap<String, Array3<f32>>,
        scale: PhysicalScale,
        settings: Option<&ChannelSettings>,
    );

    /// Current per-channel display preferences, for export.
    fn current_settings(&self) -> ChannelSettings;
}
