use crate::error::{Error, Result};
use crate::histogram::{Histogram, RegularAxis};
use crate::neighbor_list::{NeighborList, for_each_bond};
use crate::query::{NeighborQuery, QueryArgs};
use crate::thread_local::ThreadLocal;
use log::debug;

/// Potential of mean force and torque in the body frame of 2D particles.
///
/// For every bond the displacement `query_point - point` is wrapped into the
/// box, rotated by `-orientation[point]` and histogrammed on a regular
/// `n_x * n_y` grid over `[-x_max, x_max) * [-y_max, y_max)`.
pub struct PmftXy2d {
    histogram: Histogram,
    local: ThreadLocal<Vec<u64>>,
    pair_density: f64,
    frame_count: usize,
    pcf: Vec<f64>,
    needs_reduce: bool,
}

impl PmftXy2d {
    pub fn new(x_max: f64, y_max: f64, n_x: usize, n_y: usize) -> Result<Self> {
        if n_x < 1 || n_y < 1 {
            return Err(Error::config(format!(
                "PMFT needs at least one bin per axis, got {} x {}",
                n_x, n_y
            )));
        }
        if !(x_max > 0.0) || !(y_max > 0.0) {
            return Err(Error::config(format!(
                "PMFT extents must be positive, got x_max = {}, y_max = {}",
                x_max, y_max
            )));
        }
        let histogram = Histogram::new(vec![
            RegularAxis::new(n_x, -x_max, x_max)?,
            RegularAxis::new(n_y, -y_max, y_max)?,
        ])?;
        Ok(PmftXy2d {
            local: histogram.local_storage(),
            pcf: vec![0.0; histogram.len()],
            histogram,
            pair_density: 0.0,
            frame_count: 0,
            needs_reduce: false,
        })
    }

    fn x_axis(&self) -> &RegularAxis {
        &self.histogram.axes()[0]
    }

    fn y_axis(&self) -> &RegularAxis {
        &self.histogram.axes()[1]
    }

    /// Radius of the smallest disk holding the whole histogram.
    pub fn r_cut(&self) -> f64 {
        self.x_axis().max().hypot(self.y_axis().max())
    }

    /// A ball query of radius [`PmftXy2d::r_cut`].
    pub fn default_query_args(&self) -> QueryArgs {
        QueryArgs::ball(self.r_cut())
    }

    /// Adds one frame. `orientations` are the angles of the points of
    /// `query` in radians. Without `args` the pairs come from
    /// [`PmftXy2d::default_query_args`].
    pub fn accumulate<Q: NeighborQuery>(
        &mut self,
        query: &Q,
        orientations: &[f64],
        query_points: &[[f64; 3]],
        nlist: Option<&NeighborList>,
        args: Option<&QueryArgs>,
    ) -> Result<()> {
        let simbox = *query.simbox();
        if !simbox.is_2d() {
            return Err(Error::config("PMFT XY requires a 2D box"));
        }
        if query_points.is_empty() {
            return Err(Error::config("cannot accumulate over an empty set of query points"));
        }
        let points = query.points();
        if orientations.len() != points.len() {
            return Err(Error::shape("orientations", points.len(), orientations.len()));
        }

        let default_args = self.default_query_args();
        let args = args.unwrap_or(&default_args);
        let histogram = &self.histogram;
        for_each_bond(&mut self.local, query, query_points, nlist, args, |slot, bond| {
            let p = points[bond.point_index];
            let q = query_points[bond.query_point_index];
            let d = simbox.wrap([q[0] - p[0], q[1] - p[1], 0.0]);
            let (sin, cos) = (-orientations[bond.point_index]).sin_cos();
            let x = cos * d[0] - sin * d[1];
            let y = sin * d[0] + cos * d[1];
            if let Some(bin) = histogram.bin_index(&[x, y]) {
                slot[bin] += 1;
            }
        })?;

        self.pair_density += points.len() as f64 * query_points.len() as f64 / simbox.volume();
        self.frame_count += 1;
        self.needs_reduce = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.local.reset();
        self.histogram.reset();
        self.pcf.iter_mut().for_each(|v| *v = 0.0);
        self.pair_density = 0.0;
        self.frame_count = 0;
        self.needs_reduce = false;
    }

    fn reduce(&mut self) {
        if !self.needs_reduce {
            return;
        }
        debug!("reducing PMFT over {} slots after {} frames", self.local.len(), self.frame_count);
        self.histogram.reduce(&self.local);

        let norm = self.pair_density * self.x_axis().width() * self.y_axis().width();
        for (pcf, &count) in self.pcf.iter_mut().zip(self.histogram.counts()) {
            *pcf = count as f64 / norm;
        }
        self.needs_reduce = false;
    }

    /// Pair correlation per bin, flat with `x` varying fastest.
    pub fn pcf(&mut self) -> &[f64] {
        self.reduce();
        &self.pcf
    }

    /// `-ln(pcf)`; positive infinity where no pair was seen.
    pub fn pmft(&mut self) -> Vec<f64> {
        self.pcf().iter().map(|&g| -g.ln()).collect()
    }

    pub fn bin_counts(&mut self) -> &[u64] {
        self.reduce();
        self.histogram.counts()
    }

    /// `[n_x, n_y]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.x_axis().bins(), self.y_axis().bins()]
    }

    /// Edges along `x` and `y`.
    pub fn bin_edges(&self) -> [Vec<f64>; 2] {
        [self.x_axis().edges(), self.y_axis().edges()]
    }

    /// Centers along `x` and `y`.
    pub fn bin_centers(&self) -> [Vec<f64>; 2] {
        [self.x_axis().centers(), self.y_axis().centers()]
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
