use crate::bounds::PeriodicBox;
use crate::cell_shell::CellShellIterator;
use crate::error::{Error, Result};
use crate::query::{BallQueryIter, NearestQueryIter, NeighborQuery, QueryArgs, QueryMode};
use log::debug;
use std::collections::BTreeSet;

/// A cell list over a periodic box.
///
/// The box is divided into a regular grid of cells that are at least
/// `cell_width` thick along every lattice direction. Each cell owns a
/// bucket holding the indices of the points that fall inside it. The grid is
/// immutable once built, so it can be queried from many threads at once.
pub struct CellGrid {
    simbox: PeriodicBox,
    /// Positions wrapped into the box, indexed like the input points.
    points: Vec<[f64; 3]>,
    cell_width: f64,
    /// Number of cells along each lattice axis (`z` is 1 in 2D).
    dims: [usize; 3],
    /// The cell buckets, each containing a list of point indices.
    cells: Vec<Vec<usize>>,
    /// Map from point index to its cell index.
    point_cells: Vec<usize>,
}

impl CellGrid {
    /// Builds a cell list for `points` inside `simbox`.
    ///
    /// Fails if `cell_width` is not positive, if twice the cell width
    /// exceeds the nearest plane distance of any periodic axis, or if no
    /// points are given. Axes thinner than one cell width are clamped to a
    /// single cell.
    pub fn new(simbox: PeriodicBox, points: &[[f64; 3]], cell_width: f64) -> Result<Self> {
        if !cell_width.is_finite() || cell_width <= 0.0 {
            return Err(Error::config(format!(
                "cell width must be positive and finite, got {}",
                cell_width
            )));
        }
        if points.is_empty() {
            return Err(Error::config("cannot build a cell list of 0 points"));
        }

        let npd = simbox.nearest_plane_distance();
        let periodic = simbox.periodic();
        for axis in 0..simbox.dimensions() {
            if periodic[axis] && cell_width * 2.0 > npd[axis] {
                return Err(Error::config(format!(
                    "cell width {} is larger than half the box along axis {} (nearest plane distance {})",
                    cell_width, axis, npd[axis]
                )));
            }
        }
        if let Some(i) = points.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(Error::config(format!("point {} has a non-finite coordinate", i)));
        }

        let dims = Self::compute_dimensions(&simbox, cell_width);
        let num_cells = dims[0] * dims[1] * dims[2];

        let mut grid = CellGrid {
            simbox,
            points: Vec::with_capacity(points.len()),
            cell_width,
            dims,
            cells: vec![Vec::new(); num_cells],
            point_cells: Vec::with_capacity(points.len()),
        };

        for (i, p) in points.iter().enumerate() {
            let wrapped = simbox.wrap(*p);
            let cell = grid.cell_of(wrapped);
            grid.points.push(wrapped);
            grid.cells[cell].push(i);
            grid.point_cells.push(cell);
        }

        debug!(
            "built cell grid: {} points, cell width {}, dims {:?} ({} cells)",
            points.len(),
            cell_width,
            dims,
            num_cells
        );
        Ok(grid)
    }

    /// Number of cells along each axis for the given box and cell width.
    ///
    /// Dimensions are floored and never drop below one.
    pub fn compute_dimensions(simbox: &PeriodicBox, cell_width: f64) -> [usize; 3] {
        let npd = simbox.nearest_plane_distance();
        let mut dims = [1usize; 3];
        for axis in 0..simbox.dimensions() {
            let n = (npd[axis] / cell_width).floor();
            if n < 1.0 {
                debug!("axis {} thinner than one cell width, clamping to a single cell", axis);
            } else {
                dims[axis] = n as usize;
            }
        }
        dims
    }

    pub fn simbox(&self) -> &PeriodicBox {
        &self.simbox
    }

    /// The wrapped point positions.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Point indices stored in cell `cell`, `None` past the last cell.
    pub fn cell_members(&self, cell: usize) -> Option<&[usize]> {
        self.cells.get(cell).map(Vec::as_slice)
    }

    /// Cell index that point `index` was binned into.
    pub fn point_cell(&self, index: usize) -> Option<usize> {
        self.point_cells.get(index).copied()
    }

    /// Bucket of a cell index produced by this grid.
    #[inline]
    pub(crate) fn members(&self, cell: usize) -> &[usize] {
        &self.cells[cell]
    }

    /// Integer cell coordinates of a position.
    pub fn cell_coord(&self, point: [f64; 3]) -> [usize; 3] {
        let f = self.simbox.make_fractional(self.simbox.wrap(point));
        let mut coord = [0usize; 3];
        for axis in 0..self.simbox.dimensions() {
            let n = self.dims[axis];
            let c = (f[axis] * n as f64).floor();
            // rounding can push a wrapped coordinate onto the upper edge, and
            // aperiodic axes may hold points outside the box
            coord[axis] = if c > 0.0 { (c as usize).min(n - 1) } else { 0 };
        }
        coord
    }

    /// Flat index of the cell containing `point`.
    pub fn cell_of(&self, point: [f64; 3]) -> usize {
        let [x, y, z] = self.cell_coord(point);
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// Flat index for (possibly out of range) cell coordinates, wrapped
    /// periodically into the grid.
    pub fn cell_index(&self, coord: [i32; 3]) -> usize {
        let x = coord[0].rem_euclid(self.dims[0] as i32) as usize;
        let y = coord[1].rem_euclid(self.dims[1] as i32) as usize;
        let z = coord[2].rem_euclid(self.dims[2] as i32) as usize;
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// Cell coordinates for a flat cell index.
    pub fn index_to_coord(&self, cell: usize) -> [usize; 3] {
        let nx = self.dims[0];
        let ny = self.dims[1];
        [cell % nx, (cell / nx) % ny, cell / (nx * ny)]
    }

    /// Sorted, duplicate free list of cells within Chebyshev distance
    /// `shell_radius` of `cell`, wrapped periodically.
    ///
    /// Axes with fewer cells than the requested window collapse, so a cell
    /// is never listed twice.
    pub fn cell_neighbors(&self, cell: usize, shell_radius: usize) -> Vec<usize> {
        let origin = self.index_to_coord(cell);
        let r = shell_radius as i64;

        let mut per_axis: [Vec<usize>; 3] = Default::default();
        for axis in 0..3 {
            let n = self.dims[axis] as i64;
            if axis == 2 && self.simbox.is_2d() {
                per_axis[axis].push(origin[axis]);
                continue;
            }
            let unique: BTreeSet<usize> = (-r..=r)
                .map(|o| (origin[axis] as i64 + o).rem_euclid(n) as usize)
                .collect();
            per_axis[axis] = unique.into_iter().collect();
        }

        let mut neighbors = Vec::with_capacity(per_axis.iter().map(Vec::len).product());
        for &z in &per_axis[2] {
            for &y in &per_axis[1] {
                for &x in &per_axis[0] {
                    neighbors.push(x + self.dims[0] * (y + self.dims[1] * z));
                }
            }
        }
        neighbors.sort_unstable();
        neighbors
    }

    /// Shell radius past which every cell has been visited through wrapping.
    pub(crate) fn max_shell_range(&self) -> i32 {
        let widest = self.dims.iter().copied().max().unwrap_or(1);
        (widest / 2) as i32 + 1
    }

    /// A fresh shell iterator positioned on the origin cell.
    pub(crate) fn shell_iter(&self) -> CellShellIterator {
        CellShellIterator::new(self.simbox.is_2d())
    }
}

impl NeighborQuery for CellGrid {
    type Iter<'a>
        = CellGridIter<'a>
    where
        Self: 'a;

    fn simbox(&self) -> &PeriodicBox {
        &self.simbox
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn query_point(&self, point: [f64; 3], index: usize, args: &QueryArgs) -> CellGridIter<'_> {
        match args.mode {
            QueryMode::Ball => CellGridIter::Ball(BallQueryIter::new(self, point, index, args)),
            QueryMode::Nearest => CellGridIter::Nearest(NearestQueryIter::new(self, point, index, args)),
        }
    }
}

/// Per-query-point iterator returned by [`CellGrid`].
pub enum CellGridIter<'a> {
    Ball(BallQueryIter<'a>),
    Nearest(NearestQueryIter<'a>),
}

impl Iterator for CellGridIter<'_> {
    type Item = crate::query::NeighborBond;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            CellGridIter::Ball(it) => it.next(),
            CellGridIter::Nearest(it) => it.next(),
        }
    }
}
