//! Regular bin axes and multi-dimensional count histograms.
//!
//! Bin edges and centers are computed once at construction. Counts are
//! accumulated into per-worker [`ThreadLocal`] buffers and merged by
//! [`Histogram::reduce`].

use crate::error::{Error, Result};
use crate::thread_local::ThreadLocal;

/// Uniformly spaced bins over `[min, max)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RegularAxis {
    bins: usize,
    min: f64,
    max: f64,
    width: f64,
}

impl RegularAxis {
    pub fn new(bins: usize, min: f64, max: f64) -> Result<Self> {
        if bins == 0 {
            return Err(Error::config("number of bins must be greater than zero"));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::config(format!("axis bounds must be finite, got [{}, {})", min, max)));
        }
        if max <= min {
            return Err(Error::config(format!(
                "axis maximum ({}) must be greater than its minimum ({})",
                max, min
            )));
        }
        Ok(RegularAxis {
            bins,
            min,
            max,
            width: (max - min) / bins as f64,
        })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Bin containing `value`. The right edge is exclusive; values that
    /// round onto `bins` are dropped as well.
    #[inline]
    pub fn bin(&self, value: f64) -> Option<usize> {
        if !(value >= self.min && value < self.max) {
            return None;
        }
        let index = ((value - self.min) / self.width) as usize;
        (index < self.bins).then_some(index)
    }

    /// The `bins + 1` bin boundaries.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.bins).map(|i| self.min + i as f64 * self.width).collect()
    }

    /// Bin midpoints.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.bins)
            .map(|i| self.min + (i as f64 + 0.5) * self.width)
            .collect()
    }
}

/// Count histogram over one or more regular axes.
///
/// Bins are stored flat with the first axis varying fastest.
#[derive(Clone, Debug)]
pub struct Histogram {
    axes: Vec<RegularAxis>,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn new(axes: Vec<RegularAxis>) -> Result<Self> {
        if axes.is_empty() {
            return Err(Error::config("a histogram needs at least one axis"));
        }
        let size = axes.iter().map(RegularAxis::bins).product();
        Ok(Histogram {
            axes,
            counts: vec![0; size],
        })
    }

    pub fn axes(&self) -> &[RegularAxis] {
        &self.axes
    }

    /// Number of bins along each axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(RegularAxis::bins).collect()
    }

    /// Total number of bins.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Flat bin of a coordinate tuple, `None` if any coordinate falls
    /// outside its axis.
    #[inline]
    pub fn bin_index(&self, values: &[f64]) -> Option<usize> {
        let mut index = 0;
        let mut stride = 1;
        for (axis, &v) in self.axes.iter().zip(values) {
            index += axis.bin(v)? * stride;
            stride *= axis.bins();
        }
        Some(index)
    }

    /// The reduced counts, valid after [`Histogram::reduce`].
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bin_edges(&self) -> Vec<Vec<f64>> {
        self.axes.iter().map(RegularAxis::edges).collect()
    }

    pub fn bin_centers(&self) -> Vec<Vec<f64>> {
        self.axes.iter().map(RegularAxis::centers).collect()
    }

    /// Per-worker count buffers shaped like this histogram.
    pub fn local_storage(&self) -> ThreadLocal<Vec<u64>> {
        let size = self.len();
        ThreadLocal::new(move || vec![0u64; size])
    }

    /// Replaces the counts with the sum over all per-worker buffers.
    pub fn reduce(&mut self, local: &ThreadLocal<Vec<u64>>) {
        local.reduce_into(&mut self.counts);
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}
