use crate::bounds::PeriodicBox;
use crate::error::{Error, Result};

mod ball;
mod brute_force;
mod nearest;

pub use ball::BallQueryIter;
pub use brute_force::BruteForceQuery;
pub use nearest::NearestQueryIter;

/// A pair found by a neighbor search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborBond {
    /// Index into the query points (searched from).
    pub query_point_index: usize,
    /// Index into the reference points (searched into).
    pub point_index: usize,
    /// Minimum image distance between the two.
    pub distance: f64,
}

impl NeighborBond {
    pub fn new(query_point_index: usize, point_index: usize, distance: f64) -> Self {
        NeighborBond {
            query_point_index,
            point_index,
            distance,
        }
    }
}

/// Kind of neighbor search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QueryMode {
    /// Every reference point with `r_min <= r < r_max`.
    Ball,
    /// The `num_neighbors` closest reference points with `r_min <= r < r_max`.
    Nearest,
}

/// Arguments for a neighbor search.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryArgs {
    pub mode: QueryMode,
    /// Exclusive upper distance bound.
    pub r_max: f64,
    /// Inclusive lower distance bound.
    pub r_min: f64,
    /// Number of neighbors for [`QueryMode::Nearest`].
    pub num_neighbors: usize,
    /// Skip pairs whose query and reference index coincide.
    pub exclude_ii: bool,
}

impl QueryArgs {
    /// A ball query with cutoff `r_max`.
    pub fn ball(r_max: f64) -> Self {
        QueryArgs {
            mode: QueryMode::Ball,
            r_max,
            r_min: 0.0,
            num_neighbors: 0,
            exclude_ii: false,
        }
    }

    /// A k-nearest query. `r_max` may be `f64::INFINITY`.
    pub fn nearest(num_neighbors: usize, r_max: f64) -> Self {
        QueryArgs {
            mode: QueryMode::Nearest,
            r_max,
            r_min: 0.0,
            num_neighbors,
            exclude_ii: false,
        }
    }

    pub fn with_r_min(mut self, r_min: f64) -> Self {
        self.r_min = r_min;
        self
    }

    pub fn with_exclude_ii(mut self, exclude_ii: bool) -> Self {
        self.exclude_ii = exclude_ii;
        self
    }

    /// Checks the arguments against the box they will be used in.
    pub fn validate(&self, simbox: &PeriodicBox) -> Result<()> {
        if !self.r_min.is_finite() || self.r_min < 0.0 {
            return Err(Error::query(format!("r_min must be finite and non-negative, got {}", self.r_min)));
        }
        if self.r_max.is_nan() || self.r_max <= 0.0 {
            return Err(Error::query(format!("r_max must be positive, got {}", self.r_max)));
        }
        if self.r_min > self.r_max {
            return Err(Error::query(format!(
                "r_min ({}) must not exceed r_max ({})",
                self.r_min, self.r_max
            )));
        }

        match self.mode {
            QueryMode::Ball => {
                if !self.r_max.is_finite() {
                    return Err(Error::query("ball queries require a finite r_max"));
                }
                let limit = simbox.min_periodic_plane_distance();
                if self.r_max * 2.0 > limit {
                    return Err(Error::query(format!(
                        "r_max ({}) must not exceed half the smallest periodic box thickness ({})",
                        self.r_max, limit
                    )));
                }
            }
            QueryMode::Nearest => {
                if self.num_neighbors == 0 {
                    return Err(Error::query("nearest queries require num_neighbors >= 1"));
                }
            }
        }
        Ok(())
    }
}

/// A spatial index that can enumerate the neighbors of arbitrary points.
///
/// Implementations are read-only after construction and are shared between
/// worker threads; every query point gets its own iterator instance.
pub trait NeighborQuery: Send + Sync {
    /// Lazily produces the bonds of a single query point.
    type Iter<'a>: Iterator<Item = NeighborBond>
    where
        Self: 'a;

    fn simbox(&self) -> &PeriodicBox;

    /// The reference points.
    fn points(&self) -> &[[f64; 3]];

    /// Searches around `point`, reporting bonds with query index `index`.
    ///
    /// The arguments must have passed [`NeighborQuery::validate_args`].
    fn query_point(&self, point: [f64; 3], index: usize, args: &QueryArgs) -> Self::Iter<'_>;

    fn validate_args(&self, args: &QueryArgs) -> Result<()> {
        args.validate(self.simbox())
    }

    /// Collects the bonds of every query point, in query order.
    fn query_all(&self, query_points: &[[f64; 3]], args: &QueryArgs) -> Result<Vec<NeighborBond>> {
        self.validate_args(args)?;
        Ok(query_points
            .iter()
            .enumerate()
            .flat_map(|(i, p)| self.query_point(*p, i, args))
            .collect())
    }
}

/// Orders bonds by distance, breaking ties by reference index.
pub(crate) fn sort_by_distance(bonds: &mut [NeighborBond]) {
    bonds.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.point_index.cmp(&b.point_index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ball() {
        let b = PeriodicBox::cube(10.0).unwrap();
        assert!(QueryArgs::ball(5.0).validate(&b).is_ok());
        assert!(QueryArgs::ball(5.1).validate(&b).is_err());
        assert!(QueryArgs::ball(0.0).validate(&b).is_err());
        assert!(QueryArgs::ball(f64::INFINITY).validate(&b).is_err());
        assert!(QueryArgs::ball(2.0).with_r_min(3.0).validate(&b).is_err());
        assert!(QueryArgs::ball(2.0).with_r_min(-1.0).validate(&b).is_err());
        assert!(QueryArgs::ball(2.0).with_r_min(2.0).validate(&b).is_ok());
    }

    #[test]
    fn test_validate_ball_aperiodic() {
        let b = PeriodicBox::cube(10.0).unwrap().with_periodic([false; 3]);
        assert!(QueryArgs::ball(50.0).validate(&b).is_ok());
    }

    #[test]
    fn test_validate_nearest() {
        let b = PeriodicBox::cube(10.0).unwrap();
        assert!(QueryArgs::nearest(4, f64::INFINITY).validate(&b).is_ok());
        assert!(QueryArgs::nearest(0, 2.0).validate(&b).is_err());
    }

    #[test]
    fn test_sort_by_distance_ties() {
        let mut bonds = vec![
            NeighborBond::new(0, 5, 1.0),
            NeighborBond::new(0, 2, 1.0),
            NeighborBond::new(0, 9, 0.5),
        ];
        sort_by_distance(&mut bonds);
        let order: Vec<usize> = bonds.iter().map(|b| b.point_index).collect();
        assert_eq!(order, vec![9, 2, 5]);
    }
}
