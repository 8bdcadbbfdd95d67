use crate::cell_grid::CellGrid;
use crate::cell_shell::CellShellIterator;
use crate::query::{NeighborBond, QueryArgs};
use std::collections::HashSet;

/// Lazily enumerates every reference point within `[r_min, r_max)` of a
/// query point.
///
/// Each call to `next` scans the current cell bucket until it finds a match
/// or moves on to the next unvisited cell of the shell walk. The walk stops
/// once the closest possible point of the next shell, `(range - 1) * width`,
/// lies beyond `r_max`.
pub struct BallQueryIter<'a> {
    grid: &'a CellGrid,
    point: [f64; 3],
    index: usize,
    r_max: f64,
    r_max_sq: f64,
    r_min_sq: f64,
    exclude_ii: bool,
    origin: [i32; 3],
    shells: CellShellIterator,
    searched: HashSet<usize>,
    cell: usize,
    cursor: usize,
    max_range: i32,
    finished: bool,
}

impl<'a> BallQueryIter<'a> {
    pub fn new(grid: &'a CellGrid, point: [f64; 3], index: usize, args: &QueryArgs) -> Self {
        let [cx, cy, cz] = grid.cell_coord(point);
        let origin = [cx as i32, cy as i32, cz as i32];
        let cell = grid.cell_index(origin);
        let mut searched = HashSet::new();
        searched.insert(cell);

        BallQueryIter {
            grid,
            point,
            index,
            r_max: args.r_max,
            r_max_sq: args.r_max * args.r_max,
            r_min_sq: args.r_min * args.r_min,
            exclude_ii: args.exclude_ii,
            origin,
            shells: grid.shell_iter(),
            searched,
            cell,
            cursor: 0,
            max_range: grid.max_shell_range(),
            finished: false,
        }
    }

    /// Moves to the next cell that has not been scanned yet. Returns false
    /// once no remaining cell can hold a point closer than `r_max`.
    fn advance_cell(&mut self) -> bool {
        loop {
            self.shells.advance();
            let range = self.shells.range();
            if range > self.max_range || (range - 1) as f64 * self.grid.cell_width() > self.r_max {
                return false;
            }

            let o = self.shells.current();
            let cell = self.grid.cell_index([
                self.origin[0] + o[0],
                self.origin[1] + o[1],
                self.origin[2] + o[2],
            ]);
            if self.searched.insert(cell) {
                self.cell = cell;
                self.cursor = 0;
                return true;
            }
        }
    }
}

impl Iterator for BallQueryIter<'_> {
    type Item = NeighborBond;

    fn next(&mut self) -> Option<NeighborBond> {
        if self.finished {
            return None;
        }

        let grid = self.grid;
        let simbox = grid.simbox();
        let points = grid.points();
        loop {
            let members = grid.members(self.cell);
            while self.cursor < members.len() {
                let j = members[self.cursor];
                self.cursor += 1;
                if self.exclude_ii && j == self.index {
                    continue;
                }

                let r_sq = simbox.distance_sq(self.point, points[j]);
                if r_sq < self.r_max_sq && r_sq >= self.r_min_sq {
                    return Some(NeighborBond::new(self.index, j, r_sq.sqrt()));
                }
            }

            if !self.advance_cell() {
                self.finished = true;
                return None;
            }
        }
    }
}
