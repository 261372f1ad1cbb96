use std::num::NonZeroUsize;

use ndarray::{Array2, Zip, s};

use crate::error::StackError;

/// Extract the `size`x`size` sub-array centered on the image.
///
/// The top-left offset is `((height - size) / 2, (width - size) / 2)` with
/// floor division, matching the established assembly flow.
///
/// # Errors
///
/// Returns [`StackError::CropTooLarge`] if `size` exceeds either source
/// dimension.
pub fn crop_center(image: &Array2<f32>, crop_size: NonZeroUsize) -> Result<Array2<f32>, StackError> {
    let size = crop_size.get();
    let (height, width) = image.dim();
    if size > height || size > width {
        return Err(StackError::CropTooLarge {
            size,
            height,
            width,
        });
    }

    let top = (height - size) / 2;
    let left = (width - size) / 2;
    Ok(image.slice(s![top..top + size, left..left + size]).to_owned())
}

/// Replace each `factor`x`factor` block with its arithmetic mean.
///
/// Rows and columns that do not fill a whole block are discarded; the lossy
/// edge is deliberate. A factor of 1 is the identity.
pub fn bin_image(image: &Array2<f32>, factor: NonZeroUsize) -> Array2<f32> {
    let factor = factor.get();
    if factor == 1 {
        return image.clone();
    }

    let (height, width) = image.dim();
    let mut binned = Array2::<f32>::zeros((height / factor, width / factor));
    let block_area = (factor * factor) as f32;
    Zip::from(&mut binned)
        .and(image.exact_chunks((factor, factor)))
        .for_each(|out, block| *out = block.sum() / block_area);
    binned
}
