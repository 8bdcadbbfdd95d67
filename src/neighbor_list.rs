use crate::error::{Error, Result};
use crate::query::{NeighborBond, NeighborQuery, QueryArgs};
use crate::thread_local::ThreadLocal;
use log::warn;
use rayon::prelude::*;

/// A precomputed list of bonds between query points and reference points.
///
/// Bonds are always kept sorted by query index and then by reference index.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborList {
    bonds: Vec<NeighborBond>,
    num_query_points: usize,
    num_points: usize,
}

impl NeighborList {
    /// Runs `args` for every query point in parallel and collects the bonds.
    pub fn from_query<Q: NeighborQuery>(query: &Q, query_points: &[[f64; 3]], args: &QueryArgs) -> Result<Self> {
        query.validate_args(args)?;

        let per_point: Vec<Vec<NeighborBond>> = query_points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut bonds: Vec<NeighborBond> = query.query_point(*p, i, args).collect();
                bonds.sort_by_key(|b| b.point_index);
                bonds
            })
            .collect();

        Ok(NeighborList {
            bonds: per_point.into_iter().flatten().collect(),
            num_query_points: query_points.len(),
            num_points: query.points().len(),
        })
    }

    /// Wraps externally computed bonds after checking their indices.
    ///
    /// The bonds are put into list order; bonds sharing both indices keep
    /// their input order.
    pub fn from_bonds(mut bonds: Vec<NeighborBond>, num_query_points: usize, num_points: usize) -> Result<Self> {
        for b in &bonds {
            if b.query_point_index >= num_query_points {
                return Err(Error::IndexOutOfRange {
                    what: "query point",
                    index: b.query_point_index,
                    len: num_query_points,
                });
            }
            if b.point_index >= num_points {
                return Err(Error::IndexOutOfRange {
                    what: "point",
                    index: b.point_index,
                    len: num_points,
                });
            }
            if !(b.distance >= 0.0) {
                return Err(Error::config(format!("bond distance must be non-negative, got {}", b.distance)));
            }
        }
        bonds.sort_by_key(|b| (b.query_point_index, b.point_index));
        Ok(NeighborList {
            bonds,
            num_query_points,
            num_points,
        })
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn num_query_points(&self) -> usize {
        self.num_query_points
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn bonds(&self) -> &[NeighborBond] {
        &self.bonds
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NeighborBond> {
        self.bonds.iter()
    }

    pub fn query_point_indices(&self) -> Vec<usize> {
        self.bonds.iter().map(|b| b.query_point_index).collect()
    }

    pub fn point_indices(&self) -> Vec<usize> {
        self.bonds.iter().map(|b| b.point_index).collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.bonds.iter().map(|b| b.distance).collect()
    }

    /// Number of bonds of each query point.
    pub fn neighbor_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_query_points];
        for b in &self.bonds {
            counts[b.query_point_index] += 1;
        }
        counts
    }

    /// Index of the first bond of each query point.
    pub fn segments(&self) -> Vec<usize> {
        let mut start = 0;
        self.neighbor_counts()
            .into_iter()
            .map(|count| {
                let s = start;
                start += count;
                s
            })
            .collect()
    }

    /// Keeps the bonds for which `keep` returns true.
    pub fn filter(&mut self, keep: impl FnMut(&NeighborBond) -> bool) {
        self.bonds.retain(keep);
    }

    /// Keeps the bonds with `r_min <= distance < r_max`.
    pub fn filter_r(&mut self, r_max: f64, r_min: f64) -> Result<()> {
        if !(r_max > r_min) || r_min < 0.0 {
            return Err(Error::config(format!(
                "filter_r requires 0 <= r_min < r_max, got r_min = {}, r_max = {}",
                r_min, r_max
            )));
        }
        self.filter(|b| b.distance >= r_min && b.distance < r_max);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a NeighborList {
    type Item = &'a NeighborBond;
    type IntoIter = std::slice::Iter<'a, NeighborBond>;

    fn into_iter(self) -> Self::IntoIter {
        self.bonds.iter()
    }
}

/// Feeds every bond between `query_points` and the points of `query` to `f`,
/// in parallel, with one [`ThreadLocal`] slot per worker.
///
/// If `nlist` is given its bonds are used as they are and `args` is ignored;
/// otherwise `query` is searched with `args`. All checks run before any
/// slot is touched.
pub fn for_each_bond<Q, S, F>(
    local: &mut ThreadLocal<S>,
    query: &Q,
    query_points: &[[f64; 3]],
    nlist: Option<&NeighborList>,
    args: &QueryArgs,
    f: F,
) -> Result<()>
where
    Q: NeighborQuery,
    S: Send,
    F: Fn(&mut S, &NeighborBond) + Sync,
{
    match nlist {
        Some(nlist) => {
            if nlist.num_query_points() != query_points.len() || nlist.num_points() != query.points().len() {
                warn!(
                    "neighbor list built for {} query points / {} points used with {} / {}",
                    nlist.num_query_points(),
                    nlist.num_points(),
                    query_points.len(),
                    query.points().len()
                );
                if nlist.num_query_points() != query_points.len() {
                    return Err(Error::shape("neighbor list query points", query_points.len(), nlist.num_query_points()));
                }
                return Err(Error::shape("neighbor list points", query.points().len(), nlist.num_points()));
            }
            let bonds = nlist.bonds();
            local.fan_out(bonds.len(), |slot, i| f(slot, &bonds[i]));
        }
        None => {
            query.validate_args(args)?;
            local.fan_out(query_points.len(), |slot, i| {
                for bond in query.query_point(query_points[i], i, args) {
                    f(slot, &bond);
                }
            });
        }
    }
    Ok(())
}
