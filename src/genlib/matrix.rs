use kurbo::{Affine, Point as KPoint};

use crate::foundation::geometry::{Point, Rectangle};

/// Invertible 2x2 matrix plus translation, acting on logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformationMatrix {
    affine: Affine,
}

impl TransformationMatrix {
    /// `[a11 a12; a21 a22]` applied to `(x, y)`, then translated by `(tx, ty)`.
    pub fn new(a11: f64, a12: f64, a21: f64, a22: f64, tx: f64, ty: f64) -> Self {
        Self {
            affine: Affine::new([a11, a21, a12, a22, tx, ty]),
        }
    }

    pub fn identity() -> Self {
        Self {
            affine: Affine::IDENTITY,
        }
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.affine.determinant();
        det.is_finite() && det != 0.0
    }

    pub fn inverse(&self) -> Self {
        Self {
            affine: self.affine.inverse(),
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.affine * KPoint::new(x, y);
        (p.x, p.y)
    }

    /// Integer bounding rectangle of the image of `rect` (corners taken as continuous).
    pub fn map_rectangle(&self, rect: Rectangle) -> Rectangle {
        if rect.is_empty() {
            return Rectangle::new(rect.position, Default::default());
        }
        let x0 = f64::from(rect.position.x);
        let y0 = f64::from(rect.position.y);
        let x1 = x0 + f64::from(rect.size.width);
        let y1 = y0 + f64::from(rect.size.height);
        let corners = [(x0, y0), (x1, y0), (x0, y1), (x1, y1)].map(|(x, y)| self.apply(x, y));
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        let clamp = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        Rectangle::from_points(
            Point::new(clamp(min_x.floor()), clamp(min_y.floor())),
            Point::new(
                clamp(max_x.ceil()).saturating_sub(1),
                clamp(max_y.ceil()).saturating_sub(1),
            ),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/genlib/matrix.rs"]
mod tests;
