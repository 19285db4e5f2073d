//! Fixed-range, fixed-bin 1D accumulator.

use serde::{Deserialize, Serialize};

use es_core::{Error, Result};

/// Under/overflow handling policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPolicy {
    /// Drop entries outside the histogram range (record them in `underflow/overflow`).
    #[default]
    Drop,
    /// Fold underflow into the first bin and overflow into the last bin.
    Fold,
}

/// Per-bin accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinContent {
    /// Number of fills that landed in the bin.
    pub entries: u64,
    /// Sum of weights.
    pub sum_w: f64,
    /// Sum of squared weights.
    pub sum_w2: f64,
}

/// Read-back view of one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Bin index.
    pub index: usize,
    /// Bin center on the x axis.
    pub center: f64,
    /// Sum of weights.
    pub value: f64,
    /// Number of fills.
    pub entries: u64,
    /// Statistical error, `sqrt(sum_w2)`.
    pub error: f64,
}

/// Summary statistics over in-range fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// In-range fills (folded fills included).
    pub entries: u64,
    /// Sum of in-range weights.
    pub sum_w: f64,
    /// Weighted mean of x.
    pub mean: f64,
    /// `sqrt(Σw·x² / Σw)`.
    pub rms: f64,
    /// Weighted standard deviation of x.
    pub std_dev: f64,
    /// Sum of weights below range.
    pub underflow: f64,
    /// Sum of weights at or above range.
    pub overflow: f64,
}

/// A 1D histogram with uniform bins over `[x_min, x_max)`.
///
/// Filled through [`Histogram1D::fill`]; no interior mutability, so a value
/// has exactly one writer at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    x_min: f64,
    x_max: f64,
    bins: Vec<BinContent>,
    flow_policy: FlowPolicy,
    underflow: BinContent,
    overflow: BinContent,
    nan_entries: u64,
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

impl Histogram1D {
    /// Empty histogram with `n_bins` uniform bins over `[x_min, x_max)`.
    pub fn new(n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("histogram needs at least one bin".into()));
        }
        if !(x_min.is_finite() && x_max.is_finite() && x_min < x_max) {
            return Err(Error::Validation(format!(
                "invalid histogram range [{x_min}, {x_max})"
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            bins: vec![BinContent::default(); n_bins],
            flow_policy: FlowPolicy::Drop,
            underflow: BinContent::default(),
            overflow: BinContent::default(),
            nan_entries: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        })
    }

    /// Set the under/overflow policy.
    pub fn with_flow_policy(mut self, policy: FlowPolicy) -> Self {
        self.flow_policy = policy;
        self
    }

    /// Empty histogram with the same binning and flow policy as `self`.
    pub fn empty_like(&self) -> Self {
        Self {
            x_min: self.x_min,
            x_max: self.x_max,
            bins: vec![BinContent::default(); self.bins.len()],
            flow_policy: self.flow_policy,
            underflow: BinContent::default(),
            overflow: BinContent::default(),
            nan_entries: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        }
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Lower edge of the first bin.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Upper edge of the last bin.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Under/overflow policy.
    pub fn flow_policy(&self) -> FlowPolicy {
        self.flow_policy
    }

    /// Bin width.
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.bins.len() as f64
    }

    /// Whether `other` has identical binning.
    pub fn same_binning(&self, other: &Histogram1D) -> bool {
        self.bins.len() == other.bins.len() && self.x_min == other.x_min && self.x_max == other.x_max
    }

    /// Bin index for `x`, or `None` when `x` is out of range or NaN.
    ///
    /// Uses the linear mapping `floor((x - x_min) / (x_max - x_min) * n)`.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.x_min && x < self.x_max) {
            return None;
        }
        let n = self.bins.len();
        let idx = ((x - self.x_min) / (self.x_max - self.x_min) * n as f64).floor() as usize;
        // Rounding may map values just below x_max onto n.
        Some(idx.min(n - 1))
    }

    /// Add `weight` at `x`.
    pub fn fill(&mut self, x: f64, weight: f64) {
        if x.is_nan() {
            self.nan_entries += 1;
            return;
        }

        let (target, x) = if x < self.x_min {
            accumulate(&mut self.underflow, weight);
            match self.flow_policy {
                FlowPolicy::Drop => return,
                FlowPolicy::Fold => (0, self.bin(0).center),
            }
        } else if x >= self.x_max {
            accumulate(&mut self.overflow, weight);
            match self.flow_policy {
                FlowPolicy::Drop => return,
                FlowPolicy::Fold => {
                    let last = self.bins.len() - 1;
                    (last, self.bin(last).center)
                }
            }
        } else {
            match self.find_bin(x) {
                Some(b) => (b, x),
                None => return,
            }
        };

        // Folded values enter the moments at their bin center.
        accumulate(&mut self.bins[target], weight);
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
    }

    /// Read back bin `i`. Panics if `i >= n_bins()`.
    pub fn bin(&self, i: usize) -> Bin {
        let b = &self.bins[i];
        Bin {
            index: i,
            center: self.x_min + (i as f64 + 0.5) * self.bin_width(),
            value: b.sum_w,
            entries: b.entries,
            error: b.sum_w2.sqrt(),
        }
    }

    /// All bins in axis order.
    pub fn bins(&self) -> impl ExactSizeIterator<Item = Bin> + '_ {
        (0..self.bins.len()).map(move |i| self.bin(i))
    }

    /// Raw accumulation of bin `i`.
    pub fn content(&self, i: usize) -> &BinContent {
        &self.bins[i]
    }

    /// Bin edges (length `n_bins + 1`).
    pub fn bin_edges(&self) -> Vec<f64> {
        let w = self.bin_width();
        (0..=self.bins.len()).map(|i| self.x_min + i as f64 * w).collect()
    }

    /// Underflow accumulation.
    pub fn underflow(&self) -> &BinContent {
        &self.underflow
    }

    /// Overflow accumulation.
    pub fn overflow(&self) -> &BinContent {
        &self.overflow
    }

    /// Fills skipped because the value was NaN.
    pub fn nan_entries(&self) -> u64 {
        self.nan_entries
    }

    /// Number of fills that landed in a bin.
    pub fn entries(&self) -> u64 {
        self.bins.iter().map(|b| b.entries).sum()
    }

    /// Sum of in-bin weights.
    pub fn sum_w(&self) -> f64 {
        self.sum_w
    }

    /// Entries, mean, RMS and standard deviation of binned fills.
    pub fn summary(&self) -> Summary {
        let (mean, rms, std_dev) = if self.sum_w != 0.0 {
            let mean = self.sum_wx / self.sum_w;
            let mean_x2 = self.sum_wx2 / self.sum_w;
            // Clamp rounding noise only; a NaN variance stays NaN.
            let var = mean_x2 - mean * mean;
            let std_dev = if var < 0.0 { 0.0 } else { var.sqrt() };
            (mean, mean_x2.sqrt(), std_dev)
        } else {
            (f64::NAN, f64::NAN, f64::NAN)
        };
        Summary {
            entries: self.entries(),
            sum_w: self.sum_w,
            mean,
            rms,
            std_dev,
            underflow: self.underflow.sum_w,
            overflow: self.overflow.sum_w,
        }
    }
}

fn accumulate(bin: &mut BinContent, weight: f64) {
    bin.entries += 1;
    bin.sum_w += weight;
    bin.sum_w2 += weight * weight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn h(n: usize, lo: f64, hi: f64) -> Histogram1D {
        Histogram1D::new(n, lo, hi).unwrap()
    }

    #[test]
    fn rejects_bad_binning() {
        assert!(Histogram1D::new(0, 0.0, 1.0).is_err());
        assert!(Histogram1D::new(10, 1.0, 1.0).is_err());
        assert!(Histogram1D::new(10, 2.0, 1.0).is_err());
        assert!(Histogram1D::new(10, f64::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn fill_simple() {
        let mut hist = h(3, 0.0, 3.0);
        for x in [0.5, 1.5, 2.5, 0.5, -1.0, 3.5] {
            hist.fill(x, 1.0);
        }
        let values: Vec<f64> = hist.bins().map(|b| b.value).collect();
        assert_eq!(values, vec![2.0, 1.0, 1.0]);
        assert_eq!(hist.underflow().sum_w, 1.0);
        assert_eq!(hist.overflow().sum_w, 1.0);
        assert_eq!(hist.entries(), 4);
    }

    #[test]
    fn fill_with_weight() {
        let mut hist = h(2, 0.0, 2.0);
        hist.fill(0.5, 2.0);
        hist.fill(1.5, 3.0);
        hist.fill(0.5, 1.0);
        assert_eq!(hist.content(0).sum_w, 3.0);
        assert_eq!(hist.content(0).sum_w2, 5.0);
        assert_eq!(hist.content(0).entries, 2);
        assert_eq!(hist.content(1).sum_w2, 9.0);
        assert_relative_eq!(hist.bin(0).error, 5.0f64.sqrt());
    }

    #[test]
    fn fill_flow_fold() {
        let mut hist = h(2, 0.0, 2.0).with_flow_policy(FlowPolicy::Fold);
        for x in [-1.0, 0.2, 1.2, 3.0] {
            hist.fill(x, 1.0);
        }
        assert_eq!(hist.bin(0).value, 2.0);
        assert_eq!(hist.bin(1).value, 2.0);
        assert_eq!(hist.underflow().sum_w, 1.0);
        assert_eq!(hist.overflow().sum_w, 1.0);
        assert_eq!(hist.entries(), 4);
    }

    #[test]
    fn edges_are_half_open() {
        let hist = h(4, 0.0, 4.0);
        assert_eq!(hist.find_bin(-0.5), None);
        assert_eq!(hist.find_bin(0.0), Some(0));
        assert_eq!(hist.find_bin(1.0), Some(1));
        assert_eq!(hist.find_bin(3.99), Some(3));
        assert_eq!(hist.find_bin(4.0), None);
        assert_eq!(hist.find_bin(f64::NAN), None);
    }

    #[test]
    fn value_just_below_upper_edge_stays_in_last_bin() {
        let hist = h(50, -5.0, 5.0);
        let x = 5.0f64.next_down();
        assert_eq!(hist.find_bin(x), Some(49));
    }

    #[test]
    fn nan_and_infinite_fills_never_touch_bins() {
        let mut hist = h(10, -5.0, 5.0).with_flow_policy(FlowPolicy::Fold);
        hist.fill(f64::NAN, 1.0);
        hist.fill(f64::NAN, 1.0);
        assert_eq!(hist.nan_entries(), 2);
        assert_eq!(hist.entries(), 0);

        let mut dropping = h(10, -5.0, 5.0);
        dropping.fill(f64::INFINITY, 1.0);
        dropping.fill(f64::NEG_INFINITY, 1.0);
        assert_eq!(dropping.entries(), 0);
        assert_eq!(dropping.overflow().entries, 1);
        assert_eq!(dropping.underflow().entries, 1);
    }

    #[test]
    fn bin_centers() {
        let hist = h(50, -5.0, 5.0);
        assert_relative_eq!(hist.bin(0).center, -4.9, epsilon = 1e-12);
        assert_relative_eq!(hist.bin(25).center, 0.1, epsilon = 1e-12);
        assert_relative_eq!(hist.bin(49).center, 4.9, epsilon = 1e-12);
        let edges = hist.bin_edges();
        assert_eq!(edges.len(), 51);
        assert_eq!(edges[0], -5.0);
        assert_relative_eq!(edges[50], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_like_copies_binning_only() {
        let mut a = h(7, 1.0, 8.0).with_flow_policy(FlowPolicy::Fold);
        a.fill(2.0, 4.0);
        let b = a.empty_like();
        assert!(a.same_binning(&b));
        assert_eq!(b.flow_policy(), FlowPolicy::Fold);
        assert_eq!(b.entries(), 0);
        assert_eq!(b.sum_w(), 0.0);
    }

    #[test]
    fn summary_statistics() {
        let mut hist = h(10, 0.0, 10.0);
        hist.fill(2.0, 1.0);
        hist.fill(4.0, 1.0);
        hist.fill(20.0, 1.0);
        let s = hist.summary();
        assert_eq!(s.entries, 2);
        assert_relative_eq!(s.mean, 3.0);
        assert_relative_eq!(s.rms, 10.0f64.sqrt());
        assert_relative_eq!(s.std_dev, 1.0);
        assert_eq!(s.overflow, 1.0);

        assert!(h(3, 0.0, 1.0).summary().mean.is_nan());
    }

    #[test]
    fn folded_fills_enter_summary_at_edge_centers() {
        let mut hist = h(4, 0.0, 0.4).with_flow_policy(FlowPolicy::Fold);
        hist.fill(0.1, 1.0);
        hist.fill(0.3, 1.0);
        hist.fill(f64::INFINITY, 1.0);
        hist.fill(-7.0, 1.0);

        let s = hist.summary();
        assert_eq!(s.entries, 4);
        assert!(s.mean.is_finite() && s.rms.is_finite() && s.std_dev.is_finite());
        // 0.1 + 0.3 + 0.35 + 0.05
        assert_relative_eq!(s.mean, 0.2, epsilon = 1e-12);
        assert!(s.std_dev > 0.0);
        assert_eq!(s.overflow, 1.0);
        assert_eq!(s.underflow, 1.0);
    }

    #[test]
    fn summary_reports_nan_variance_as_nan() {
        let mut hist = h(2, 0.0, 2.0);
        hist.fill(0.5, f64::INFINITY);
        let s = hist.summary();
        assert!(s.mean.is_nan());
        assert!(s.std_dev.is_nan());
    }

    proptest! {
        #[test]
        fn bin_weights_sum_to_submitted_weight(
            fills in proptest::collection::vec((-5.0f64..5.0, 0.0f64..10.0), 0..200),
        ) {
            let mut hist = h(50, -5.0, 5.0);
            let mut total = 0.0;
            for &(x, w) in &fills {
                hist.fill(x, w);
                total += w;
            }
            let binned: f64 = hist.bins().map(|b| b.value).sum();
            prop_assert!((binned - total).abs() <= 1e-9 * total.max(1.0));
            prop_assert_eq!(hist.entries(), fills.len() as u64);
        }

        #[test]
        fn fills_commute(
            fills in proptest::collection::vec((-6.0f64..6.0, 1u32..4), 1..100),
            rotate in 0usize..100,
        ) {
            let mut forward = h(12, -5.0, 5.0);
            let mut permuted = forward.empty_like();
            for &(x, w) in &fills {
                forward.fill(x, f64::from(w));
            }
            let mut shuffled = fills.clone();
            shuffled.reverse();
            let k = rotate % shuffled.len();
            shuffled.rotate_left(k);
            for &(x, w) in &shuffled {
                permuted.fill(x, f64::from(w));
            }
            for i in 0..forward.n_bins() {
                prop_assert_eq!(forward.content(i), permuted.content(i));
            }
            prop_assert_eq!(forward.underflow(), permuted.underflow());
            prop_assert_eq!(forward.overflow(), permuted.overflow());
        }
    }
}
