use crate::error::GazeError;

/// A plain 2D coordinate in frame pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Represents a single 3D mesh point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Represents the result of a face mesh inference
#[derive(Debug, Clone, Default)]
pub struct Landmarks {
    pub points: Vec<Point3D>,
}

impl Landmarks {
    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// One face found in a frame.
#[derive(Debug, Clone, Default)]
pub struct FacePrediction {
    pub landmarks: Landmarks,
    /// Region the mesh was fitted in, when a detector ran first.
    pub face_box: Option<Rect>,
}

impl FacePrediction {
    pub fn new(landmarks: Landmarks) -> Self {
        Self { landmarks, face_box: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Geometric center of the frame.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Mesh indices that outline one eye. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices(&'static [usize]);

impl EyeIndices {
    pub fn new(indices: &'static [usize]) -> Result<Self, GazeError> {
        if indices.is_empty() {
            return Err(GazeError::EmptyIndexGroup);
        }
        Ok(Self(indices))
    }

    pub fn as_slice(&self) -> &'static [usize] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Number of points in the MediaPipe face mesh.
pub const MESH_POINTS: usize = 468;

// Eye contour indices in the 468-point mesh.
pub const LEFT_EYE: EyeIndices = EyeIndices(&[33, 133, 160, 159, 158, 144, 145, 153]);
pub const RIGHT_EYE: EyeIndices = EyeIndices(&[362, 263, 387, 386, 385, 373, 374, 380]);
