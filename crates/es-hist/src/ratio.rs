//! Bin-by-bin ratio of two histograms with identical binning.

use es_core::{Error, Result};

use crate::histogram::Histogram1D;

/// Ratio histogram `numerator / denominator`.
///
/// For every bin whose denominator value is nonzero, the result is filled
/// once at the bin center with weight `num / den`. Bins with a zero
/// denominator are skipped entirely and stay empty (zero entries), so a
/// renderer can tell "no denominator" apart from a ratio of zero.
pub fn ratio(numerator: &Histogram1D, denominator: &Histogram1D) -> Result<Histogram1D> {
    if !numerator.same_binning(denominator) {
        return Err(Error::Validation(format!(
            "ratio needs identical binning: numerator {} bins [{}, {}), denominator {} bins [{}, {})",
            numerator.n_bins(),
            numerator.x_min(),
            numerator.x_max(),
            denominator.n_bins(),
            denominator.x_min(),
            denominator.x_max(),
        )));
    }

    let mut out = denominator.empty_like();
    for (num, den) in numerator.bins().zip(denominator.bins()) {
        if den.value != 0.0 {
            out.fill(den.center, num.value / den.value);
        }
    }
    Ok(out)
}
