//! # es-hist
//!
//! Uniform-binning 1D histograms for evscan.
//!
//! A [`Histogram1D`] is a plain value: the aggregator owns every instance of
//! a run and fills them from a single thread. Fills are sums, so the final
//! contents do not depend on the order records arrive in.
//!
//! ## Example
//!
//! ```
//! use es_hist::{Histogram1D, ratio};
//!
//! let mut truth = Histogram1D::new(50, -5.0, 5.0).unwrap();
//! let mut reco = truth.empty_like();
//! truth.fill(0.3, 1.0);
//! reco.fill(0.3, 1.0);
//! let eff = ratio(&reco, &truth).unwrap();
//! assert_eq!(eff.entries(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod histogram;
pub mod ratio;

pub use histogram::{Bin, BinContent, FlowPolicy, Histogram1D, Summary};
pub use ratio::ratio;
