use crate::bounds::PeriodicBox;
use crate::error::{Error, Result};
use crate::query::{NeighborBond, NeighborQuery, QueryArgs, QueryMode, sort_by_distance};

/// Neighbor search that checks every reference point.
///
/// Quadratic in the number of points. Useful for very small systems and as a
/// reference to validate the cell list against.
pub struct BruteForceQuery {
    simbox: PeriodicBox,
    points: Vec<[f64; 3]>,
}

impl BruteForceQuery {
    pub fn new(simbox: PeriodicBox, points: &[[f64; 3]]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::config("cannot search an empty point set"));
        }
        Ok(BruteForceQuery {
            simbox,
            points: points.iter().map(|p| simbox.wrap(*p)).collect(),
        })
    }
}

impl NeighborQuery for BruteForceQuery {
    type Iter<'a>
        = std::vec::IntoIter<NeighborBond>
    where
        Self: 'a;

    fn simbox(&self) -> &PeriodicBox {
        &self.simbox
    }

    fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn query_point(&self, point: [f64; 3], index: usize, args: &QueryArgs) -> Self::Iter<'_> {
        let r_max_sq = args.r_max * args.r_max;
        let r_min_sq = args.r_min * args.r_min;

        let mut bonds: Vec<NeighborBond> = self
            .points
            .iter()
            .enumerate()
            .filter(|(j, _)| !(args.exclude_ii && *j == index))
            .filter_map(|(j, p)| {
                let r_sq = self.simbox.distance_sq(point, *p);
                (r_sq < r_max_sq && r_sq >= r_min_sq).then(|| NeighborBond::new(index, j, r_sq.sqrt()))
            })
            .collect();

        if args.mode == QueryMode::Nearest {
            sort_by_distance(&mut bonds);
            bonds.truncate(args.num_neighbors);
        }
        bonds.into_iter()
    }
}
