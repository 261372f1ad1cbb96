use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use crate::error::StackError;

/// Compute the ordered sequence of z-indices to load.
///
/// The discovered indices are taken in ascending order, filtered to the
/// half-open `[start, end)` range when one is given, then strided so that
/// the 0th, Nth, 2Nth, ... surviving elements remain.
///
/// # Errors
///
/// Returns [`StackError::EmptySelection`] when nothing survives; the caller
/// aborts before allocating any stack rather than building zero-depth arrays.
pub fn select_z_indices(
    discovered: &BTreeSet<i64>,
    z_range: Option<(i64, i64)>,
    z_downsample: NonZeroUsize,
) -> Result<Vec<i64>, StackError> {
    let plan: Vec<i64> = discovered
        .iter()
        .copied()
        .filter(|z| z_range.is_none_or(|(start, end)| (start..end).contains(z)))
        .step_by(z_downsample.get())
        .collect();

    if plan.is_empty() {
        return Err(StackError::EmptySelection);
    }
    Ok(plan)
}
