use crate::error::{Error, Result};
use crate::histogram::{Histogram, RegularAxis};
use crate::neighbor_list::{NeighborList, for_each_bond};
use crate::query::{NeighborQuery, QueryArgs};
use crate::thread_local::ThreadLocal;
use log::debug;
use std::f64::consts::PI;

/// Radial distribution function `g(r)` and cumulative neighbor count `N(r)`.
///
/// Frames are accumulated into per-worker histograms; `g(r)` is normalized
/// by the summed ideal-gas pair density of all accumulated frames, so frames
/// with different particle counts or box volumes may be mixed.
pub struct Rdf {
    histogram: Histogram,
    local: ThreadLocal<Vec<u64>>,
    /// Sum over frames of `n_query * n_points / volume`.
    pair_density: f64,
    /// Sum over frames of `n_query`.
    query_count: f64,
    frame_count: usize,
    is_2d: Option<bool>,
    rdf: Vec<f64>,
    n_r: Vec<f64>,
    needs_reduce: bool,
}

impl Rdf {
    pub fn new(bins: usize, r_max: f64, r_min: f64) -> Result<Self> {
        if !(r_min >= 0.0) {
            return Err(Error::config(format!("r_min must be non-negative, got {}", r_min)));
        }
        if !(r_max > r_min) {
            return Err(Error::config(format!(
                "r_max ({}) must be greater than r_min ({})",
                r_max, r_min
            )));
        }
        let histogram = Histogram::new(vec![RegularAxis::new(bins, r_min, r_max)?])?;
        Ok(Rdf {
            local: histogram.local_storage(),
            histogram,
            pair_density: 0.0,
            query_count: 0.0,
            frame_count: 0,
            is_2d: None,
            rdf: vec![0.0; bins],
            n_r: vec![0.0; bins],
            needs_reduce: false,
        })
    }

    fn axis(&self) -> &RegularAxis {
        &self.histogram.axes()[0]
    }

    /// Query arguments covering exactly the binned range.
    pub fn default_query_args(&self) -> QueryArgs {
        QueryArgs::ball(self.axis().max()).with_r_min(self.axis().min())
    }

    /// Adds one frame of pairs between `query_points` and the points of
    /// `query`, either searched with `args` or taken from `nlist`.
    pub fn accumulate<Q: NeighborQuery>(
        &mut self,
        query: &Q,
        query_points: &[[f64; 3]],
        nlist: Option<&NeighborList>,
        args: &QueryArgs,
    ) -> Result<()> {
        if query_points.is_empty() {
            return Err(Error::config("cannot accumulate over an empty set of query points"));
        }
        let simbox = *query.simbox();
        if let Some(is_2d) = self.is_2d {
            if is_2d != simbox.is_2d() {
                return Err(Error::config("cannot mix 2D and 3D frames in one RDF"));
            }
        }

        let histogram = &self.histogram;
        for_each_bond(&mut self.local, query, query_points, nlist, args, |slot, bond| {
            if let Some(bin) = histogram.bin_index(&[bond.distance]) {
                slot[bin] += 1;
            }
        })?;

        let n_query = query_points.len() as f64;
        self.pair_density += n_query * query.points().len() as f64 / simbox.volume();
        self.query_count += n_query;
        self.is_2d = Some(simbox.is_2d());
        self.frame_count += 1;
        self.needs_reduce = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.local.reset();
        self.histogram.reset();
        self.rdf.iter_mut().for_each(|v| *v = 0.0);
        self.n_r.iter_mut().for_each(|v| *v = 0.0);
        self.pair_density = 0.0;
        self.query_count = 0.0;
        self.frame_count = 0;
        self.is_2d = None;
        self.needs_reduce = false;
    }

    /// Volume of each bin's spherical shell (3D) or ring (2D).
    pub fn shell_volumes(&self) -> Vec<f64> {
        let is_2d = self.is_2d.unwrap_or(false);
        self.axis()
            .edges()
            .windows(2)
            .map(|w| {
                let (r1, r2) = (w[0], w[1]);
                if is_2d {
                    PI * (r2 * r2 - r1 * r1)
                } else {
                    4.0 / 3.0 * PI * (r2.powi(3) - r1.powi(3))
                }
            })
            .collect()
    }

    fn reduce(&mut self) {
        if !self.needs_reduce {
            return;
        }
        debug!(
            "reducing RDF over {} slots after {} frames",
            self.local.len(),
            self.frame_count
        );
        self.histogram.reduce(&self.local);

        let volumes = self.shell_volumes();
        let counts = self.histogram.counts();
        let mut cumulative = 0u64;
        for (i, &count) in counts.iter().enumerate() {
            self.rdf[i] = count as f64 / (self.pair_density * volumes[i]);
            cumulative += count;
            self.n_r[i] = cumulative as f64 / self.query_count;
        }
        self.needs_reduce = false;
    }

    /// `g(r)` per bin.
    pub fn rdf(&mut self) -> &[f64] {
        self.reduce();
        &self.rdf
    }

    /// Average number of points closer than each bin's outer edge.
    pub fn n_r(&mut self) -> &[f64] {
        self.reduce();
        &self.n_r
    }

    pub fn bin_counts(&mut self) -> &[u64] {
        self.reduce();
        self.histogram.counts()
    }

    pub fn bin_centers(&self) -> Vec<f64> {
        self.axis().centers()
    }

    pub fn bin_edges(&self) -> Vec<f64> {
        self.axis().edges()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
