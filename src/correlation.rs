//! Pair correlation functions `C(r)`: the mean of a per-pair product of point
//! values, binned by pair distance.
//!
//! Accumulation fans out over query points (or over the bonds of a
//! precomputed [`NeighborList`]) with one [`ThreadLocal`] slot per rayon
//! worker. Results are reduced lazily: the first read after new data merges
//! the slots, later reads reuse the merged arrays until the next
//! [`CorrelationFunction::accumulate`] or [`CorrelationFunction::reset`].

use crate::bounds::PeriodicBox;
use crate::error::{Error, Result};
use crate::histogram::RegularAxis;
use crate::neighbor_list::{NeighborList, for_each_bond};
use crate::query::{NeighborQuery, QueryArgs};
use crate::thread_local::ThreadLocal;
use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;
use std::ops::{AddAssign, Mul};

/// A value that can be multiplied pairwise, summed per bin and averaged.
pub trait PairValue: Copy + Default + Send + Sync + AddAssign + Mul<Output = Self> + 'static {
    /// Multiplicative identity, used when no values are supplied.
    fn one() -> Self;

    /// `self / count`.
    fn div_count(self, count: u64) -> Self;
}

impl PairValue for f64 {
    fn one() -> Self {
        1.0
    }

    fn div_count(self, count: u64) -> Self {
        self / count as f64
    }
}

impl PairValue for Complex64 {
    fn one() -> Self {
        Complex64::new(1.0, 0.0)
    }

    fn div_count(self, count: u64) -> Self {
        self / count as f64
    }
}

#[derive(Clone, Debug)]
struct LocalBins<T> {
    counts: Vec<u64>,
    sums: Vec<T>,
}

impl<T: PairValue> LocalBins<T> {
    fn new(bins: usize) -> Self {
        LocalBins {
            counts: vec![0; bins],
            sums: vec![T::default(); bins],
        }
    }
}

/// Distance-binned mean of `values[point] * query_values[query_point]`.
pub struct CorrelationFunction<T: PairValue> {
    axis: RegularAxis,
    local: ThreadLocal<LocalBins<T>>,
    bin_counts: Vec<u64>,
    correlation: Vec<T>,
    frame_count: usize,
    needs_reduce: bool,
    simbox: Option<PeriodicBox>,
}

impl<T: PairValue> CorrelationFunction<T> {
    /// `bins` equal-width bins over `[0, r_max)`.
    pub fn new(bins: usize, r_max: f64) -> Result<Self> {
        if !(r_max > 0.0) {
            return Err(Error::config(format!("r_max must be positive, got {}", r_max)));
        }
        let axis = RegularAxis::new(bins, 0.0, r_max)?;
        Ok(CorrelationFunction {
            local: ThreadLocal::new(move || LocalBins::new(bins)),
            bin_counts: vec![0; bins],
            correlation: vec![T::default(); bins],
            axis,
            frame_count: 0,
            needs_reduce: false,
            simbox: None,
        })
    }

    /// Adds one frame.
    ///
    /// `values` belong to the points of `query` and `query_values` to
    /// `query_points`; a missing side contributes a factor of one. When
    /// `nlist` is given its bonds are used and `args` is ignored.
    pub fn accumulate<Q: NeighborQuery>(
        &mut self,
        query: &Q,
        values: Option<&[T]>,
        query_points: &[[f64; 3]],
        query_values: Option<&[T]>,
        nlist: Option<&NeighborList>,
        args: &QueryArgs,
    ) -> Result<()> {
        if query_points.is_empty() {
            return Err(Error::config("cannot accumulate over an empty set of query points"));
        }
        if let Some(v) = values {
            if v.len() != query.points().len() {
                return Err(Error::shape("values", query.points().len(), v.len()));
            }
        }
        if let Some(v) = query_values {
            if v.len() != query_points.len() {
                return Err(Error::shape("query values", query_points.len(), v.len()));
            }
        }

        let axis = &self.axis;
        for_each_bond(&mut self.local, query, query_points, nlist, args, |slot, bond| {
            if let Some(bin) = axis.bin(bond.distance) {
                let a = values.map_or_else(T::one, |v| v[bond.point_index]);
                let b = query_values.map_or_else(T::one, |v| v[bond.query_point_index]);
                slot.counts[bin] += 1;
                slot.sums[bin] += a * b;
            }
        })?;

        self.simbox = Some(*query.simbox());
        self.frame_count += 1;
        self.needs_reduce = true;
        Ok(())
    }

    /// Clears all accumulated frames.
    pub fn reset(&mut self) {
        self.local.for_each_mut(|slot| {
            slot.counts.iter_mut().for_each(|c| *c = 0);
            slot.sums.iter_mut().for_each(|s| *s = T::default());
        });
        self.bin_counts.iter_mut().for_each(|c| *c = 0);
        self.correlation.iter_mut().for_each(|c| *c = T::default());
        self.frame_count = 0;
        self.needs_reduce = false;
        self.simbox = None;
    }

    fn reduce(&mut self) {
        if !self.needs_reduce {
            return;
        }
        debug!(
            "reducing correlation function over {} slots, {} bins",
            self.local.len(),
            self.axis.bins()
        );
        let slots = self.local.slots();
        self.correlation
            .par_iter_mut()
            .zip(self.bin_counts.par_iter_mut())
            .enumerate()
            .for_each(|(i, (mean, count))| {
                let mut n = 0;
                let mut sum = T::default();
                for slot in slots {
                    n += slot.counts[i];
                    sum += slot.sums[i];
                }
                *count = n;
                *mean = if n > 0 { sum.div_count(n) } else { sum };
            });
        self.needs_reduce = false;
    }

    /// Mean pair value per bin; zero for empty bins.
    pub fn correlation(&mut self) -> &[T] {
        self.reduce();
        &self.correlation
    }

    /// Number of pairs per bin.
    pub fn bin_counts(&mut self) -> &[u64] {
        self.reduce();
        &self.bin_counts
    }

    pub fn bin_edges(&self) -> Vec<f64> {
        self.axis.edges()
    }

    /// Shell-volume weighted bin centers, `2/3 (r2^3 - r1^3) / (r2^2 - r1^2)`.
    pub fn bin_centers(&self) -> Vec<f64> {
        let edges = self.axis.edges();
        edges
            .windows(2)
            .map(|w| {
                let (r1, r2) = (w[0], w[1]);
                2.0 / 3.0 * (r2.powi(3) - r1.powi(3)) / (r2 * r2 - r1 * r1)
            })
            .collect()
    }

    pub fn r_max(&self) -> f64 {
        self.axis.max()
    }

    pub fn bins(&self) -> usize {
        self.axis.bins()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Box of the most recent frame.
    pub fn simbox(&self) -> Option<&PeriodicBox> {
        self.simbox.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_grid::CellGrid;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_construction() {
        assert!(CorrelationFunction::<f64>::new(0, 5.0).is_err());
        assert!(CorrelationFunction::<f64>::new(10, 0.0).is_err());
        assert!(CorrelationFunction::<f64>::new(10, -1.0).is_err());
    }

    #[test]
    fn test_two_points() {
        let b = PeriodicBox::cube(10.0).unwrap();
        let points = [[0.0; 3], [1.5, 0.0, 0.0]];
        let grid = CellGrid::new(b, &points, 5.0).unwrap();
        let values = [2.0, 3.0];

        let mut cf = CorrelationFunction::<f64>::new(10, 5.0).unwrap();
        cf.accumulate(
            &grid,
            Some(&values),
            &points,
            Some(&values),
            None,
            &QueryArgs::ball(5.0).with_exclude_ii(true),
        )
        .unwrap();

        let counts = cf.bin_counts().to_vec();
        assert_eq!(counts[3], 2);
        assert_eq!(counts.iter().sum::<u64>(), 2);
        assert_relative_eq!(cf.correlation()[3], 6.0);
        assert_eq!(cf.correlation()[0], 0.0);
        assert_eq!(cf.frame_count(), 1);
    }

    #[test]
    fn test_complex_values() {
        let b = PeriodicBox::cube(10.0).unwrap();
        let points = [[0.0; 3], [1.0, 0.0, 0.0]];
        let grid = CellGrid::new(b, &points, 2.0).unwrap();
        let values = [Complex64::new(0.0, 1.0), Complex64::new(0.0, 1.0)];

        let mut cf = CorrelationFunction::<Complex64>::new(4, 2.0).unwrap();
        cf.accumulate(
            &grid,
            Some(&values),
            &points,
            Some(&values),
            None,
            &QueryArgs::ball(2.0).with_exclude_ii(true),
        )
        .unwrap();
        // i * i = -1
        assert_relative_eq!(cf.correlation()[2].re, -1.0);
        assert_relative_eq!(cf.correlation()[2].im, 0.0);
    }

    #[test]
    fn test_reduce_is_idempotent_and_frames_add() {
        let b = PeriodicBox::cube(10.0).unwrap();
        let points = [[0.0; 3], [1.5, 0.0, 0.0], [0.0, 2.2, 0.0]];
        let grid = CellGrid::new(b, &points, 5.0).unwrap();
        let args = QueryArgs::ball(5.0).with_exclude_ii(true);

        let mut cf = CorrelationFunction::<f64>::new(10, 5.0).unwrap();
        cf.accumulate(&grid, None, &points, None, None, &args).unwrap();
        let first = cf.bin_counts().to_vec();
        assert_eq!(cf.bin_counts(), first.as_slice());

        cf.accumulate(&grid, None, &points, None, None, &args).unwrap();
        let doubled: Vec<u64> = first.iter().map(|c| c * 2).collect();
        assert_eq!(cf.bin_counts(), doubled.as_slice());
        assert_eq!(cf.frame_count(), 2);

        cf.reset();
        assert_eq!(cf.frame_count(), 0);
        assert!(cf.bin_counts().iter().all(|&c| c == 0));
        assert!(cf.simbox().is_none());
    }

    #[test]
    fn test_shape_errors_leave_state_untouched() {
        let b = PeriodicBox::cube(10.0).unwrap();
        let points = [[0.0; 3], [1.5, 0.0, 0.0]];
        let grid = CellGrid::new(b, &points, 5.0).unwrap();
        let mut cf = CorrelationFunction::<f64>::new(10, 5.0).unwrap();

        let res = cf.accumulate(&grid, Some(&[1.0]), &points, None, None, &QueryArgs::ball(5.0));
        assert_eq!(
            res,
            Err(Error::ShapeMismatch {
                what: "values",
                expected: 2,
                actual: 1
            })
        );
        // r_max of 6 is more than half the box
        assert!(cf.accumulate(&grid, None, &points, None, None, &QueryArgs::ball(6.0)).is_err());
        assert_eq!(cf.frame_count(), 0);
        assert!(cf.bin_counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_bin_centers_shell_weighted() {
        let cf = CorrelationFunction::<f64>::new(2, 2.0).unwrap();
        let centers = cf.bin_centers();
        assert_relative_eq!(centers[0], 2.0 / 3.0);
        assert_relative_eq!(centers[1], 2.0 / 3.0 * 7.0 / 3.0);
        assert_eq!(cf.bin_edges(), vec![0.0, 1.0, 2.0]);
    }
}
