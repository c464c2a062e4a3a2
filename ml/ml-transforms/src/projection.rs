//! Planar projections and bilinear warping.
//!
//! A [`Projection`] maps continuous output coordinates to continuous input
//! coordinates (pixel `(x, y)` covers `[x, x + 1) x [y, y + 1)`). Warping
//! samples the input at the projected center of every output pixel.

use ml_types::Image;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::error::{Result, TransformError};

/// A 3x3 homography from output space to input space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection(Matrix3<f64>);

impl Projection {
    /// The identity projection.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Wraps a raw homography matrix.
    #[must_use]
    pub const fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    /// Translation by `(tx, ty)`.
    #[must_use]
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// Axis-aligned scaling.
    #[must_use]
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self(Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0))
    }

    /// Rotation by `radians` about the origin.
    #[must_use]
    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self(Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0))
    }

    /// Conjugates `self` so it acts about `(cx, cy)` instead of the origin.
    #[must_use]
    pub fn about(self, cx: f64, cy: f64) -> Self {
        Self::translation(cx, cy)
            .then(self)
            .then(Self::translation(-cx, -cy))
    }

    /// Solves the homography taking each `from` corner onto its `to` corner.
    ///
    /// # Errors
    ///
    /// Returns an error if the corners are degenerate (for example three of
    /// them collinear).
    pub fn from_corners(from: [[f64; 2]; 4], to: [[f64; 2]; 4]) -> Result<Self> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (&[x, y], &[u, v])) in from.iter().zip(to.iter()).enumerate() {
            let r = 2 * i;
            let rows = [
                [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u],
                [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v],
            ];
            for (dr, row) in rows.iter().enumerate() {
                for (j, &value) in row.iter().enumerate() {
                    a[(r + dr, j)] = value;
                }
            }
            b[r] = u;
            b[r + 1] = v;
        }

        if a.determinant().abs() < 1e-10 {
            return Err(TransformError::singular_projection("degenerate corner set"));
        }
        let h = a
            .lu()
            .solve(&b)
            .ok_or_else(|| TransformError::singular_projection("degenerate corner set"))?;

        Ok(Self(Matrix3::new(
            h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
        )))
    }

    /// Composes two projections: `other` is applied first, then `self`.
    #[must_use]
    pub fn then(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }

    /// Returns the inverse projection.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is singular.
    pub fn inverse(&self) -> Result<Self> {
        self.0
            .try_inverse()
            .map(Self)
            .ok_or_else(|| TransformError::singular_projection("matrix is not invertible"))
    }

    /// The underlying matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Projects a point, or `None` if it maps to infinity.
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p.z.abs() < 1e-12 {
            return None;
        }
        Some((p.x / p.z, p.y / p.z))
    }

    /// Warps `src` into `out`, which must already have its final shape.
    ///
    /// Output pixels whose center projects outside `src` are zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn warp(&self, src: &Image, out: &mut Image) {
        let channels = src.channels();
        let out_width = out.width();

        for (index, pixel) in out.data_mut().chunks_exact_mut(channels).enumerate() {
            let ox = (index % out_width) as f64 + 0.5;
            let oy = (index / out_width) as f64 + 0.5;
            match self.apply(ox, oy) {
                Some((ix, iy)) => sample_bilinear(src, ix - 0.5, iy - 0.5, pixel),
                None => pixel.fill(0.0),
            }
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::identity()
    }
}

/// Bilinear sample at index-space `(fx, fy)` into `pixel`.
///
/// Points within half a pixel of the border clamp to the edge; points
/// further out produce zeros.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn sample_bilinear(src: &Image, fx: f64, fy: f64, pixel: &mut [f32]) {
    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;

    let inside = (-0.5..=max_x + 0.5).contains(&fx) && (-0.5..=max_y + 0.5).contains(&fy);
    if !inside {
        pixel.fill(0.0);
        return;
    }

    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);
    let x0 = fx.floor() as usize;
    let y0 = fy.floor() as usize;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let tx = (fx - x0 as f64) as f32;
    let ty = (fy - y0 as f64) as f32;

    for (c, value) in pixel.iter_mut().enumerate() {
        let top = (src.get(x1, y0, c) - src.get(x0, y0, c)).mul_add(tx, src.get(x0, y0, c));
        let bottom = (src.get(x1, y1, c) - src.get(x0, y1, c)).mul_add(tx, src.get(x0, y1, c));
        *value = (bottom - top).mul_add(ty, top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ml_types::ColorType;

    #[allow(clippy::cast_precision_loss)]
    fn gradient(width: usize, height: usize) -> Image {
        let mut image = Image::zeros(width, height, ColorType::Gray);
        for y in 0..height {
            for x in 0..width {
                image.set(x, y, 0, (x + y * width) as f32);
            }
        }
        image
    }

    #[test]
    fn identity_warp_copies() {
        let src = gradient(4, 3);
        let mut out = Image::zeros(4, 3, ColorType::Gray);
        Projection::identity().warp(&src, &mut out);

        assert_eq!(out, src);
    }

    #[test]
    fn translation_shifts_pixels() {
        let src = gradient(4, 1);
        let mut out = Image::zeros(4, 1, ColorType::Gray);
        Projection::translation(1.0, 0.0).warp(&src, &mut out);

        assert_relative_eq!(out.get(0, 0, 0), 1.0);
        assert_relative_eq!(out.get(2, 0, 0), 3.0);
        // Projected past the right edge.
        assert_relative_eq!(out.get(3, 0, 0), 0.0);
    }

    #[test]
    fn flip_about_center() {
        let src = gradient(3, 1);
        let mut out = Image::zeros(3, 1, ColorType::Gray);
        Projection::scaling(-1.0, 1.0)
            .about(1.5, 0.5)
            .warp(&src, &mut out);

        assert_relative_eq!(out.get(0, 0, 0), 2.0);
        assert_relative_eq!(out.get(1, 0, 0), 1.0);
        assert_relative_eq!(out.get(2, 0, 0), 0.0);
    }

    #[test]
    fn bilinear_interpolates() {
        let src = gradient(2, 1);
        let mut pixel = [0.0f32];
        sample_bilinear(&src, 0.25, 0.0, &mut pixel);

        assert_relative_eq!(pixel[0], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn from_corners_recovers_affine() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let doubled = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];

        let p = Projection::from_corners(square, doubled).unwrap_or_default();
        let (x, y) = p.apply(0.5, 0.25).unwrap_or((0.0, 0.0));

        assert_relative_eq!(x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn from_corners_rejects_degenerate() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let line = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];

        assert!(Projection::from_corners(square, line).is_err());
    }

    #[test]
    fn inverse_round_trip() {
        let p = Projection::rotation(0.3).then(Projection::scaling(2.0, 0.5));
        let inv = p.inverse().unwrap_or_default();
        let (x, y) = p.then(inv).apply(3.0, -1.0).unwrap_or((0.0, 0.0));

        assert_relative_eq!(x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(y, -1.0, epsilon = 1e-9);
    }
}
