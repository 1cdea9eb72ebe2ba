//! Model loading and conversion into the four vertex streams.
//!
//! A [`Model`] is a flat-shaded triangle soup. It is usually read from an STL
//! file and then turned into the streams the renderer draws:
//!
//! | Stream      | Variant   | Built by                       |
//! |-------------|-----------|--------------------------------|
//! | faces       | `model`   | [`Model::faces`]               |
//! | wireframe   | `mesh`    | [`Model::wireframe`]           |
//! | bounding box| `lines`   | [`Model::bounding_box_lines`]  |
//! | corners     | `circles` | [`Model::corner_markers`]      |
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes                      |
//! |--------|------------|----------------------------|
//! | STL    | `.stl`     | Binary and ASCII           |

use std::fmt;
use std::path::Path;

use glam::{Vec3, Vec4};

use crate::vertices::{Vertices, VerticesError};

/// Errors that can occur when loading geometry.
#[derive(Debug)]
pub enum GeometryError {
    /// File could not be read.
    Io(std::io::Error),
    /// File format could not be determined from extension.
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    Parse(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::Io(e) => write!(f, "IO error: {}", e),
            GeometryError::UnknownFormat(ext) => {
                write!(f, "Unknown geometry format: '{}'", ext)
            }
            GeometryError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e)
    }
}

/// One face of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub corners: [Vec3; 3],
    /// Unit normal; zero for degenerate faces.
    pub normal: Vec3,
}

impl Triangle {
    /// Builds a face, deriving the normal from the winding.
    pub fn new(corners: [Vec3; 3]) -> Self {
        let [a, b, c] = corners;
        Self {
            corners,
            normal: (b - a).cross(c - a).normalize_or_zero(),
        }
    }

    /// Builds a face with a given normal, falling back to the winding when it is unusable.
    pub fn with_normal(corners: [Vec3; 3], normal: Vec3) -> Self {
        match normal.try_normalize() {
            Some(normal) => Self { corners, normal },
            None => Self::new(corners),
        }
    }
}

/// A triangle soup with a single base color.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub triangles: Vec<Triangle>,
    /// Straight RGBA.
    pub color: Vec4,
}

impl Model {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
        }
    }

    pub fn with_color(mut self, color: impl Into<Vec4>) -> Self {
        self.color = color.into();
        self
    }

    /// Loads a model, detecting the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => {
                let file = std::fs::File::open(path)?;
                let mut reader = std::io::BufReader::new(file);
                let model = Self::parse_stl(&mut reader)?;
                log::info!(
                    "loaded {} triangles from {}",
                    model.triangles.len(),
                    path.display()
                );
                Ok(model)
            }
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Parses STL (binary or ASCII) from memory.
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL parse error: {}", e)))?;

        let mut triangles = Vec::with_capacity(stl.faces.len());
        for face in &stl.faces {
            let mut corners = [Vec3::ZERO; 3];
            for (corner, &index) in corners.iter_mut().zip(&face.vertices) {
                let vertex = stl.vertices.get(index).ok_or_else(|| {
                    GeometryError::Parse(format!("face references missing vertex {}", index))
                })?;
                let position: [f32; 3] = (*vertex).into();
                *corner = Vec3::from(position);
            }
            let normal: [f32; 3] = face.normal.into();
            triangles.push(Triangle::with_normal(corners, Vec3::from(normal)));
        }

        Ok(Self::new(triangles))
    }

    /// An axis-aligned cube of edge length 1 centred on the origin.
    pub fn cube() -> Self {
        let h = 0.5;
        let p = |x: f32, y: f32, z: f32| Vec3::new(x * h, y * h, z * h);

        // Each face as two CCW triangles, seen from outside.
        let quads = [
            [p(-1., -1., 1.), p(1., -1., 1.), p(1., 1., 1.), p(-1., 1., 1.)],
            [p(1., -1., -1.), p(-1., -1., -1.), p(-1., 1., -1.), p(1., 1., -1.)],
            [p(1., -1., 1.), p(1., -1., -1.), p(1., 1., -1.), p(1., 1., 1.)],
            [p(-1., -1., -1.), p(-1., -1., 1.), p(-1., 1., 1.), p(-1., 1., -1.)],
            [p(-1., 1., 1.), p(1., 1., 1.), p(1., 1., -1.), p(-1., 1., -1.)],
            [p(-1., -1., -1.), p(1., -1., -1.), p(1., -1., 1.), p(-1., -1., 1.)],
        ];

        let triangles = quads
            .iter()
            .flat_map(|[a, b, c, d]| [Triangle::new([*a, *b, *c]), Triangle::new([*a, *c, *d])])
            .collect();

        Self::new(triangles)
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    ///
    /// An empty model yields `(+inf, -inf)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for corner in self.triangles.iter().flat_map(|t| t.corners) {
            min = min.min(corner);
            max = max.max(corner);
        }

        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Length of the longest bounding-box edge; zero for an empty model.
    pub fn extent(&self) -> f32 {
        if self.triangles.is_empty() {
            return 0.0;
        }
        let (min, max) = self.bounds();
        (max - min).max_element()
    }

    /// Moves the model so its bounding box is centred on the origin.
    pub fn recenter(&mut self) {
        if self.triangles.is_empty() {
            return;
        }
        let center = self.center();
        for triangle in &mut self.triangles {
            for corner in &mut triangle.corners {
                *corner -= center;
            }
        }
    }

    /// Scales the model uniformly to fit in a unit cube.
    pub fn normalize(&mut self) {
        let extent = self.extent();
        if extent > 0.0 {
            for triangle in &mut self.triangles {
                for corner in &mut triangle.corners {
                    *corner /= extent;
                }
            }
        }
    }

    /// The face stream.
    pub fn faces(&self) -> Vertices {
        let mut faces = Vertices::new();
        for triangle in &self.triangles {
            faces.push_triangle(triangle.corners, triangle.normal, self.color);
        }
        faces
    }

    /// The wireframe stream: every face edge, in the face color.
    pub fn wireframe(&self) -> Vertices {
        self.faces().wireframe()
    }

    /// The twelve edges of the bounding box.
    pub fn bounding_box_lines(&self, color: Vec4) -> Vertices {
        let mut lines = Vertices::new();
        if self.triangles.is_empty() {
            return lines;
        }

        let corners = self.box_corners();
        // Corner index bits are (x, y, z); edges join corners one bit apart.
        for a in 0..8usize {
            for bit in [1usize, 2, 4] {
                let b = a | bit;
                if b != a {
                    lines.push_line(corners[a], corners[b], color);
                }
            }
        }
        lines
    }

    /// One marker on each bounding-box corner.
    ///
    /// `right` and `up` span the marker quads; pass camera axes to have them face the viewer.
    pub fn corner_markers(
        &self,
        right: Vec3,
        up: Vec3,
        color: Vec4,
    ) -> Result<Vertices, VerticesError> {
        let mut points = Vertices::new();
        if self.triangles.is_empty() {
            return Ok(points);
        }

        for corner in self.box_corners() {
            points.push_point(corner, right, up, color)?;
        }
        Ok(points)
    }

    fn box_corners(&self) -> [Vec3; 8] {
        let (min, max) = self.bounds();
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }
}
