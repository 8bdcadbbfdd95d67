use crate::error::{Error, Result};

/// A periodic simulation box centered at the origin.
///
/// The box is spanned by the lattice vectors
/// `a1 = (Lx, 0, 0)`, `a2 = (xy·Ly, Ly, 0)` and `a3 = (xz·Lz, yz·Lz, Lz)`.
/// Fractional coordinate `0` maps to `-L/2` and `1` to `+L/2` along each
/// axis. In 2D mode the box lies in the `z = 0` plane: `Lz`, `xz` and `yz`
/// are zero and every `z` component is dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicBox {
    lx: f64,
    ly: f64,
    lz: f64,
    xy: f64,
    xz: f64,
    yz: f64,
    periodic: [bool; 3],
    is_2d: bool,
}

impl PeriodicBox {
    /// Creates a new box from edge lengths and tilt factors.
    ///
    /// For 2D boxes `lz`, `xz` and `yz` are ignored.
    pub fn new(lengths: [f64; 3], tilts: [f64; 3], is_2d: bool) -> Result<Self> {
        let [lx, ly, lz] = lengths;
        let [xy, xz, yz] = tilts;

        let checked = if is_2d { &lengths[..2] } else { &lengths[..] };
        if checked.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(Error::config(format!(
                "box lengths must be positive and finite, got {:?}",
                checked
            )));
        }
        if tilts.iter().any(|t| !t.is_finite()) {
            return Err(Error::config(format!("box tilt factors must be finite, got {:?}", tilts)));
        }

        Ok(if is_2d {
            PeriodicBox {
                lx,
                ly,
                lz: 0.0,
                xy,
                xz: 0.0,
                yz: 0.0,
                periodic: [true; 3],
                is_2d,
            }
        } else {
            PeriodicBox {
                lx,
                ly,
                lz,
                xy,
                xz,
                yz,
                periodic: [true; 3],
                is_2d,
            }
        })
    }

    /// A cubic 3D box of side `l`.
    pub fn cube(l: f64) -> Result<Self> {
        Self::new([l, l, l], [0.0; 3], false)
    }

    /// A square 2D box of side `l`.
    pub fn square(l: f64) -> Result<Self> {
        Self::new([l, l, 0.0], [0.0; 3], true)
    }

    /// An orthorhombic 3D box.
    pub fn from_lengths(lx: f64, ly: f64, lz: f64) -> Result<Self> {
        Self::new([lx, ly, lz], [0.0; 3], false)
    }

    /// Returns a copy of the box with per-axis periodicity flags.
    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn lengths(&self) -> [f64; 3] {
        [self.lx, self.ly, self.lz]
    }

    /// Tilt factors `[xy, xz, yz]`.
    pub fn tilts(&self) -> [f64; 3] {
        [self.xy, self.xz, self.yz]
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn is_2d(&self) -> bool {
        self.is_2d
    }

    /// Number of spatial dimensions, 2 or 3.
    pub fn dimensions(&self) -> usize {
        if self.is_2d { 2 } else { 3 }
    }

    /// Area in 2D, volume in 3D.
    pub fn volume(&self) -> f64 {
        if self.is_2d {
            self.lx * self.ly
        } else {
            self.lx * self.ly * self.lz
        }
    }

    /// Converts an absolute position into fractional coordinates.
    pub fn make_fractional(&self, v: [f64; 3]) -> [f64; 3] {
        let z = if self.is_2d { 0.0 } else { v[2] };
        // undo the shear in reverse order of `make_absolute`
        let y = v[1] - self.yz * z;
        let x = v[0] - self.xy * y - self.xz * z;

        let fx = x / self.lx + 0.5;
        let fy = y / self.ly + 0.5;
        let fz = if self.is_2d { 0.0 } else { z / self.lz + 0.5 };
        [fx, fy, fz]
    }

    /// Converts fractional coordinates into an absolute position.
    pub fn make_absolute(&self, f: [f64; 3]) -> [f64; 3] {
        let z = if self.is_2d { 0.0 } else { (f[2] - 0.5) * self.lz };
        let mut y = (f[1] - 0.5) * self.ly;
        let mut x = (f[0] - 0.5) * self.lx;
        x += self.xy * y + self.xz * z;
        y += self.yz * z;
        [x, y, z]
    }

    /// Wraps a vector back into the box along every periodic axis.
    ///
    /// Applied to a displacement this yields the minimum image.
    ///
    /// Whole lattice vectors are subtracted, so vectors already inside the
    /// box come back unchanged.
    pub fn wrap(&self, v: [f64; 3]) -> [f64; 3] {
        let f = self.make_fractional(v);
        let mut image = [0.0; 3];
        for axis in 0..self.dimensions() {
            if self.periodic[axis] {
                image[axis] = f[axis].floor();
            }
        }
        let [nx, ny, nz] = image;
        let z = if self.is_2d { 0.0 } else { v[2] - nz * self.lz };
        [
            v[0] - nx * self.lx - ny * self.xy * self.ly - nz * self.xz * self.lz,
            v[1] - ny * self.ly - nz * self.yz * self.lz,
            z,
        ]
    }

    /// Squared length of the minimum image of `b - a`.
    pub fn distance_sq(&self, a: [f64; 3], b: [f64; 3]) -> f64 {
        let d = self.wrap([b[0] - a[0], b[1] - a[1], b[2] - a[2]]);
        d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
    }

    /// Distances between opposite faces of the box along each lattice axis.
    pub fn nearest_plane_distance(&self) -> [f64; 3] {
        let shear = self.xy * self.yz - self.xz;
        [
            self.lx / (1.0 + self.xy * self.xy + shear * shear).sqrt(),
            self.ly / (1.0 + self.yz * self.yz).sqrt(),
            self.lz,
        ]
    }

    /// Smallest nearest-plane distance over the periodic axes that exist in
    /// this dimensionality. Infinite for a fully aperiodic box.
    pub fn min_periodic_plane_distance(&self) -> f64 {
        let npd = self.nearest_plane_distance();
        (0..self.dimensions())
            .filter(|&axis| self.periodic[axis])
            .map(|axis| npd[axis])
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_invalid_boxes() {
        assert!(PeriodicBox::cube(0.0).is_err());
        assert!(PeriodicBox::cube(f64::NAN).is_err());
        assert!(PeriodicBox::from_lengths(1.0, -2.0, 1.0).is_err());
        // Lz is irrelevant for a 2D box
        assert!(PeriodicBox::new([1.0, 1.0, 0.0], [0.0; 3], true).is_ok());
    }

    #[test]
    fn test_wrap_minimum_image() {
        let b = PeriodicBox::cube(10.0).unwrap();
        assert!(close(b.wrap([6.0, -7.0, 0.5]), [-4.0, 3.0, 0.5]));
        // inside the box nothing changes, not even by rounding
        assert_eq!(b.wrap([1.5, -2.7, 0.3]), [1.5, -2.7, 0.3]);
        assert!((b.distance_sq([-4.5, 0.0, 0.0], [4.5, 0.0, 0.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_respects_aperiodic_axes() {
        let b = PeriodicBox::cube(10.0).unwrap().with_periodic([true, false, true]);
        let w = b.wrap([9.0, 9.0, 9.0]);
        assert!(close(w, [-1.0, 9.0, -1.0]), "got {:?}", w);
        assert_eq!(b.min_periodic_plane_distance(), 10.0);
    }

    #[test]
    fn test_fractional_inverse_with_tilt() {
        let b = PeriodicBox::new([4.0, 5.0, 6.0], [0.3, -0.2, 0.5], false).unwrap();
        let v = [0.7, -1.1, 2.4];
        assert!(close(b.make_absolute(b.make_fractional(v)), v));
        assert!(close(b.make_fractional([0.0, 0.0, 0.0]), [0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_nearest_plane_distance() {
        let b = PeriodicBox::from_lengths(2.0, 3.0, 4.0).unwrap();
        assert!(close(b.nearest_plane_distance(), [2.0, 3.0, 4.0]));

        let tilted = PeriodicBox::new([2.0, 2.0, 2.0], [1.0, 0.0, 0.0], false).unwrap();
        let npd = tilted.nearest_plane_distance();
        assert!((npd[0] - 2.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!((npd[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_2d_box() {
        let b = PeriodicBox::square(3.0).unwrap();
        assert_eq!(b.dimensions(), 2);
        assert_eq!(b.volume(), 9.0);
        assert_eq!(b.wrap([2.0, 0.0, 5.0])[2], 0.0);
        assert_eq!(b.min_periodic_plane_distance(), 3.0);
    }
}
