use crate::cell_grid::CellGrid;
use crate::query::{NeighborBond, QueryArgs, sort_by_distance};
use std::collections::HashSet;

/// Enumerates the `k` nearest reference points of a query point.
///
/// On the first call to `next` the shell walk collects every candidate in
/// `[r_min, r_max)` cell by cell. It stops as soon as `k` candidates are
/// closer than anything the next unvisited cell could hold, that is
/// `(range - 1) * width`. The buffered bonds are then handed out in
/// ascending distance order.
pub struct NearestQueryIter<'a> {
    grid: &'a CellGrid,
    point: [f64; 3],
    index: usize,
    num_neighbors: usize,
    r_max: f64,
    r_min: f64,
    exclude_ii: bool,
    neighbors: Vec<NeighborBond>,
    count: usize,
    expanded: bool,
    finished: bool,
}

impl<'a> NearestQueryIter<'a> {
    pub fn new(grid: &'a CellGrid, point: [f64; 3], index: usize, args: &QueryArgs) -> Self {
        NearestQueryIter {
            grid,
            point,
            index,
            num_neighbors: args.num_neighbors,
            r_max: args.r_max,
            r_min: args.r_min,
            exclude_ii: args.exclude_ii,
            neighbors: Vec::new(),
            count: 0,
            expanded: false,
            finished: false,
        }
    }

    fn scan_cell(&mut self, cell: usize) {
        let grid = self.grid;
        let simbox = grid.simbox();
        let points = grid.points();
        let r_max_sq = self.r_max * self.r_max;
        let r_min_sq = self.r_min * self.r_min;

        for &j in grid.members(cell) {
            if self.exclude_ii && j == self.index {
                continue;
            }
            let r_sq = simbox.distance_sq(self.point, points[j]);
            if r_sq < r_max_sq && r_sq >= r_min_sq {
                self.neighbors.push(NeighborBond::new(self.index, j, r_sq.sqrt()));
            }
        }
    }

    fn expand(&mut self) {
        let grid = self.grid;
        let width = grid.cell_width();
        let max_range = grid.max_shell_range();
        let k = self.num_neighbors;

        let [cx, cy, cz] = grid.cell_coord(self.point);
        let origin = [cx as i32, cy as i32, cz as i32];
        let mut shells = grid.shell_iter();
        let mut searched = HashSet::new();

        let mut cell = grid.cell_index(origin);
        searched.insert(cell);

        loop {
            self.scan_cell(cell);

            let mut next_cell = None;
            loop {
                shells.advance();
                if shells.range() > max_range {
                    break;
                }
                let o = shells.current();
                let candidate = grid.cell_index([origin[0] + o[0], origin[1] + o[1], origin[2] + o[2]]);
                if searched.insert(candidate) {
                    next_cell = Some(candidate);
                    break;
                }
            }
            let Some(next) = next_cell else {
                break;
            };

            let bound = (shells.range() - 1) as f64 * width;
            if bound > self.r_max {
                // nothing left to find below r_max
                break;
            }
            if self.neighbors.len() >= k {
                sort_by_distance(&mut self.neighbors);
                if self.neighbors[k - 1].distance < bound {
                    break;
                }
            }
            cell = next;
        }

        sort_by_distance(&mut self.neighbors);
    }
}

impl Iterator for NearestQueryIter<'_> {
    type Item = NeighborBond;

    fn next(&mut self) -> Option<NeighborBond> {
        if self.finished {
            return None;
        }
        if !self.expanded {
            self.expand();
            self.expanded = true;
        }

        if self.count < self.num_neighbors && self.count < self.neighbors.len() {
            let bond = self.neighbors[self.count];
            self.count += 1;
            if bond.distance > self.r_max {
                self.finished = true;
                return None;
            }
            return Some(bond);
        }

        self.finished = true;
        None
    }
}
