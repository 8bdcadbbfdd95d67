//! Static structure factors from reduced pair-distance histograms.
//!
//! The Debye scattering equation turns a histogram of ordered pair distances
//! into `S(k)` without a Fourier transform over the box, so it is valid for
//! any `k`, including values below the box's reciprocal lattice spacing.

use crate::error::{Error, Result};
use crate::histogram::RegularAxis;
use rayon::prelude::*;

/// Particle counts entering the Faber-Ziman normalization of a partial
/// structure factor `S_ab`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartialCounts {
    /// Particles of species `a` (the query points).
    pub n_a: usize,
    /// Particles of species `b` (the reference points).
    pub n_b: usize,
    /// All particles in the system.
    pub n_total: usize,
    /// Number of frames the histogram was accumulated over.
    pub frames: usize,
    /// Whether `a` and `b` are the same species (adds the self term).
    pub same_species: bool,
}

impl PartialCounts {
    /// A single-species system, `S(k)` in the usual sense.
    pub fn single(n: usize, frames: usize) -> Self {
        PartialCounts {
            n_a: n,
            n_b: n,
            n_total: n,
            frames,
            same_species: true,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.n_a == 0 || self.n_b == 0 || self.n_total == 0 || self.frames == 0 {
            return Err(Error::config(format!(
                "structure factor normalization needs non-zero counts, got {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// `sin(x) / x`, equal to one at the origin.
#[inline]
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 { 1.0 } else { x.sin() / x }
}

/// Centers of `bins` equally spaced wave numbers over `[k_min, k_max)`.
pub fn k_values(bins: usize, k_min: f64, k_max: f64) -> Result<Vec<f64>> {
    if k_min < 0.0 {
        return Err(Error::config(format!("k_min must be non-negative, got {}", k_min)));
    }
    Ok(RegularAxis::new(bins, k_min, k_max)?.centers())
}

/// Debye `S_ab(k)` with Faber-Ziman partial normalization:
///
/// `S_ab(k) = δ_ab + N_total / (N_a N_b frames) · Σ_bins counts · sinc(k r_bin)`
///
/// `counts` holds ordered pair counts per distance bin, for instance the
/// reduced [`crate::Rdf::bin_counts`], and `bin_centers` the matching radii.
pub fn debye_from_histogram(
    k_values: &[f64],
    bin_centers: &[f64],
    counts: &[u64],
    partial: &PartialCounts,
) -> Result<Vec<f64>> {
    if bin_centers.len() != counts.len() {
        return Err(Error::shape("bin centers", counts.len(), bin_centers.len()));
    }
    partial.validate()?;

    let self_term = if partial.same_species { 1.0 } else { 0.0 };
    let norm = partial.n_total as f64 / (partial.n_a as f64 * partial.n_b as f64 * partial.frames as f64);

    Ok(k_values
        .par_iter()
        .map(|&k| {
            let sum: f64 = bin_centers
                .iter()
                .zip(counts)
                .map(|(&r, &c)| c as f64 * sinc(k * r))
                .sum();
            self_term + norm * sum
        })
        .collect())
}
