//! Per-triangle tangents for normal mapping.

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Used whenever the UV Jacobian is singular.
pub const FALLBACK_TANGENT: [f32; 3] = [1.0, 0.0, 0.0];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TangentError {
    #[error("vertex index {index} out of range ({vertices} vertices)")]
    IndexOutOfRange { index: u32, vertices: usize },
    #[error("texcoord buffer has {len} floats, need {needed}")]
    TexcoordsTooShort { len: usize, needed: usize },
}

/// Generate one tangent per triangle corner.
///
/// `position` holds 3 floats and `texcoord` 2 floats per vertex. Without
/// `indices` consecutive vertex triples form triangles. The output is
/// unindexed: each triangle's tangent is repeated three times, so it lines
/// up with the per-corner buffers the OBJ parser emits.
pub fn generate_tangents(
    position: &[f32],
    texcoord: &[f32],
    indices: Option<&[u32]>,
) -> Result<Vec<f32>, TangentError> {
    let vertices = position.len() / 3;
    if texcoord.len() < vertices * 2 {
        return Err(TangentError::TexcoordsTooShort {
            len: texcoord.len(),
            needed: vertices * 2,
        });
    }

    let corners: Vec<usize> = match indices {
        Some(indices) => indices
            .iter()
            .map(|&i| {
                if (i as usize) < vertices {
                    Ok(i as usize)
                } else {
                    Err(TangentError::IndexOutOfRange { index: i, vertices })
                }
            })
            .collect::<Result<_, _>>()?,
        None => (0..vertices).collect(),
    };

    let p = |n: usize| Vec3::from_slice(&position[n * 3..n * 3 + 3]);
    let uv = |n: usize| Vec2::from_slice(&texcoord[n * 2..n * 2 + 2]);

    let mut tangents = Vec::with_capacity(corners.len() / 3 * 9);
    for tri in corners.chunks_exact(3) {
        let (n1, n2, n3) = (tri[0], tri[1], tri[2]);

        let dp12 = p(n2) - p(n1);
        let dp13 = p(n3) - p(n1);
        let duv12 = uv(n2) - uv(n1);
        let duv13 = uv(n3) - uv(n1);

        let f = 1.0 / (duv12.x * duv13.y - duv13.x * duv12.y);
        let tangent = if f.is_finite() {
            ((dp12 * duv13.y - dp13 * duv12.y) * f)
                .normalize_or_zero()
                .to_array()
        } else {
            FALLBACK_TANGENT
        };

        for _ in 0..3 {
            tangents.extend_from_slice(&tangent);
        }
    }
    Ok(tangents)
}
