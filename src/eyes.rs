//! Eye centers from face mesh landmarks.

use crate::error::GazeError;
use crate::types::{EyeIndices, Landmarks, Point2D};

/// Mean (x, y) of the landmarks picked out by `indices`.
///
/// Depth is ignored. Fails if an index falls outside the mesh, which means the
/// model does not produce the layout the indices were written for.
pub fn eye_center(landmarks: &Landmarks, indices: EyeIndices) -> Result<Point2D, GazeError> {
    let mut x = 0.0;
    let mut y = 0.0;
    for &i in indices.as_slice() {
        let p = landmarks.points.get(i).ok_or(GazeError::IndexOutOfRange {
            index: i,
            len: landmarks.len(),
        })?;
        x += p.x;
        y += p.y;
    }
    let n = indices.len() as f32;
    Ok(Point2D::new(x / n, y / n))
}

/// Point halfway between the two eye centers.
pub fn eyes_midpoint(left: Point2D, right: Point2D) -> Point2D {
    Point2D::new((left.x + right.x) / 2.0, (left.y + right.y) / 2.0)
}
