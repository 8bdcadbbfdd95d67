//! Sample systems: crystal lattices with optional thermal noise, and ideal
//! gases. Every generator is seeded, so repeated calls reproduce the same
//! configuration.

use crate::bounds::PeriodicBox;
use crate::error::{Error, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

/// A lattice cell plus a basis in fractional coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitCell {
    lattice: PeriodicBox,
    basis: Vec<[f64; 3]>,
}

impl UnitCell {
    /// Every basis coordinate must lie in `[0, 1)`; 2D cells need `z = 0`.
    pub fn new(lattice: PeriodicBox, basis: Vec<[f64; 3]>) -> Result<Self> {
        if basis.is_empty() {
            return Err(Error::config("a unit cell needs at least one basis position"));
        }
        for b in &basis {
            if b.iter().any(|c| !(0.0..1.0).contains(c)) {
                return Err(Error::config(format!(
                    "basis positions must be fractional in [0, 1), got {:?}",
                    b
                )));
            }
            if lattice.is_2d() && b[2] != 0.0 {
                return Err(Error::config(format!("2D basis positions need z = 0, got {:?}", b)));
            }
        }
        Ok(UnitCell { lattice, basis })
    }

    /// Simple cubic.
    pub fn sc() -> Result<Self> {
        Self::new(PeriodicBox::cube(1.0)?, vec![[0.0; 3]])
    }

    /// Body-centered cubic.
    pub fn bcc() -> Result<Self> {
        Self::new(PeriodicBox::cube(1.0)?, vec![[0.5, 0.5, 0.5], [0.0; 3]])
    }

    /// Face-centered cubic.
    pub fn fcc() -> Result<Self> {
        Self::new(
            PeriodicBox::cube(1.0)?,
            vec![[0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5], [0.0; 3]],
        )
    }

    /// Square lattice in 2D.
    pub fn square() -> Result<Self> {
        Self::new(PeriodicBox::square(1.0)?, vec![[0.0; 3]])
    }

    pub fn lattice(&self) -> &PeriodicBox {
        &self.lattice
    }

    pub fn basis(&self) -> &[[f64; 3]] {
        &self.basis
    }

    pub fn dimensions(&self) -> usize {
        self.lattice.dimensions()
    }

    /// Tiles the cell `replicas` times along each lattice vector, scales the
    /// result by `scale` and displaces every point by Gaussian noise of
    /// standard deviation `sigma_noise` before wrapping it back into the box.
    ///
    /// 2D cells must be replicated exactly once along `z`.
    pub fn to_system(
        &self,
        replicas: [usize; 3],
        scale: f64,
        sigma_noise: f64,
        seed: u64,
    ) -> Result<(PeriodicBox, Vec<[f64; 3]>)> {
        if replicas.contains(&0) {
            return Err(Error::config(format!("replicas must be positive, got {:?}", replicas)));
        }
        if self.lattice.is_2d() && replicas[2] != 1 {
            return Err(Error::config("a 2D unit cell can only be replicated once along z"));
        }
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(Error::config(format!("scale must be positive and finite, got {}", scale)));
        }
        let noise = Normal::new(0.0, sigma_noise)
            .map_err(|e| Error::config(format!("invalid noise width {}: {}", sigma_noise, e)))?;

        let [lx, ly, lz] = self.lattice.lengths();
        let simbox = PeriodicBox::new(
            [
                lx * scale * replicas[0] as f64,
                ly * scale * replicas[1] as f64,
                lz * scale * replicas[2] as f64,
            ],
            self.lattice.tilts(),
            self.lattice.is_2d(),
        )?;

        let n = replicas.iter().product::<usize>() * self.basis.len();
        let mut points = Vec::with_capacity(n);
        for i in 0..replicas[0] {
            for j in 0..replicas[1] {
                for k in 0..replicas[2] {
                    for b in &self.basis {
                        points.push(simbox.make_absolute([
                            (i as f64 + b[0]) / replicas[0] as f64,
                            (j as f64 + b[1]) / replicas[1] as f64,
                            (k as f64 + b[2]) / replicas[2] as f64,
                        ]));
                    }
                }
            }
        }

        if sigma_noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(seed);
            let axes = simbox.dimensions();
            for p in points.iter_mut() {
                for c in p.iter_mut().take(axes) {
                    *c += noise.sample(&mut rng);
                }
                *p = simbox.wrap(*p);
            }
        }
        Ok((simbox, points))
    }
}

/// `n` points drawn uniformly from `simbox`.
pub fn random_system(simbox: &PeriodicBox, n: usize, seed: u64) -> Result<Vec<[f64; 3]>> {
    if n == 0 {
        return Err(Error::config("a random system needs at least one point"));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let is_2d = simbox.is_2d();
    Ok((0..n)
        .map(|_| {
            let fx = rng.r#gen::<f64>();
            let fy = rng.r#gen::<f64>();
            let fz = if is_2d { 0.5 } else { rng.r#gen::<f64>() };
            simbox.make_absolute([fx, fy, fz])
        })
        .collect())
}
