//! CPU-side geometry produced by the OBJ parser.
//!
//! Buffers are non-indexed: every triangle corner carries its own copy of
//! position/texcoord/normal/color, ready for a `drawArrays`-style upload.

/// Flat per-corner attribute buffers of one geometry group.
/// `None` means the attribute never appeared in the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    pub position: Vec<f32>,
    pub texcoord: Option<Vec<f32>>,
    pub normal: Option<Vec<f32>>,
    pub color: Option<Vec<f32>>,
}

impl GeometryData {
    /// Number of emitted corners (3 floats per position).
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Bounding box of the position buffer, `None` when it is empty.
    pub fn extents(&self) -> Option<Extents> {
        Extents::from_positions(&self.position)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Extents {
    /// Inverted box; any `union` replaces it.
    pub const EMPTY: Extents = Extents {
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
    };

    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut chunks = positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for p in chunks {
            for j in 0..3 {
                min[j] = min[j].min(p[j]);
                max[j] = max[j].max(p[j]);
            }
        }
        Some(Self { min, max })
    }

    pub fn union(&self, other: &Extents) -> Extents {
        let mut out = *self;
        for j in 0..3 {
            out.min[j] = out.min[j].min(other.min[j]);
            out.max[j] = out.max[j].max(other.max[j]);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|j| self.min[j] > self.max[j])
    }

    pub fn range(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f32; 3] {
        let r = self.range();
        [
            self.min[0] + r[0] * 0.5,
            self.min[1] + r[1] * 0.5,
            self.min[2] + r[2] * 0.5,
        ]
    }

    /// Translation that moves the box center to the origin.
    pub fn center_offset(&self) -> [f32; 3] {
        let c = self.center();
        [-c[0], -c[1], -c[2]]
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::EMPTY
    }
}
