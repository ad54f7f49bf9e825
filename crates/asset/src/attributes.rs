//! Render-ready vertex attributes: a named map of flat buffers or constant
//! fills, consumed by whatever uploads buffers to the GPU.

use std::collections::BTreeMap;

use crate::{
    mesh::GeometryData,
    tangent::{FALLBACK_TANGENT, generate_tangents},
};

/// Vertex-shader attribute slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeName {
    Position,
    Texcoord,
    Normal,
    Color,
    Tangent,
}

impl AttributeName {
    pub const ALL: [AttributeName; 5] = [
        AttributeName::Position,
        AttributeName::Texcoord,
        AttributeName::Normal,
        AttributeName::Color,
        AttributeName::Tangent,
    ];

    /// Shader attribute name.
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeName::Position => "a_position",
            AttributeName::Texcoord => "a_texcoord",
            AttributeName::Normal => "a_normal",
            AttributeName::Color => "a_color",
            AttributeName::Tangent => "a_tangent",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum VertexAttribute {
    /// Per-vertex data, `components` floats per vertex.
    Buffer { components: usize, data: Vec<f32> },
    /// Same value for every vertex.
    Constant(Vec<f32>),
}

impl VertexAttribute {
    fn buffer(components: usize, data: Vec<f32>) -> Self {
        VertexAttribute::Buffer { components, data }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, VertexAttribute::Constant(_))
    }

    /// Raw bytes for upload (buffer data or the constant value).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexAttribute::Buffer { data, .. } => bytemuck::cast_slice(data.as_slice()),
            VertexAttribute::Constant(value) => bytemuck::cast_slice(value.as_slice()),
        }
    }
}

pub type AttributeMap = BTreeMap<AttributeName, VertexAttribute>;

/// Optional buffer with `components` floats per vertex, or `None` after a
/// warning when its length does not match the vertex count.
fn aligned<'a>(
    buffer: Option<&'a [f32]>,
    components: usize,
    vertices: usize,
    name: AttributeName,
) -> Option<&'a [f32]> {
    let buffer = buffer?;
    if buffer.len() == components * vertices {
        return Some(buffer);
    }
    log::warn!(
        "{} has {} floats for {} vertices, using the constant fallback",
        name.as_str(),
        buffer.len(),
        vertices
    );
    None
}

/// Build the attribute map for one geometry, filling absent attributes with
/// constants and generating tangents when texcoords and normals exist.
/// Partially specified texcoords or normals (faces mixing `a/b/c` and
/// `a//c` in one geometry) are treated as absent.
pub fn prepare_attributes(data: &GeometryData) -> AttributeMap {
    let vertices = data.vertex_count();
    let texcoord = aligned(data.texcoord.as_deref(), 2, vertices, AttributeName::Texcoord);
    let normal = aligned(data.normal.as_deref(), 3, vertices, AttributeName::Normal);

    let mut map = AttributeMap::new();
    map.insert(
        AttributeName::Position,
        VertexAttribute::buffer(3, data.position.clone()),
    );

    let color = match &data.color {
        // RGB when there is one color triple per position, RGBA otherwise.
        Some(color) if color.len() == data.position.len() => {
            VertexAttribute::buffer(3, color.clone())
        }
        Some(color) => VertexAttribute::buffer(4, color.clone()),
        None => VertexAttribute::Constant(vec![1.0, 1.0, 1.0, 1.0]),
    };
    map.insert(AttributeName::Color, color);

    let tangents = match (texcoord, normal) {
        (Some(texcoord), Some(_)) => match generate_tangents(&data.position, texcoord, None) {
            Ok(tangents) => Some(tangents),
            Err(err) => {
                log::warn!("Tangent generation failed ({}), using the constant tangent", err);
                None
            }
        },
        _ => None,
    };
    let tangent = match tangents {
        Some(tangents) => VertexAttribute::buffer(3, tangents),
        None => VertexAttribute::Constant(FALLBACK_TANGENT.to_vec()),
    };
    map.insert(AttributeName::Tangent, tangent);

    let texcoord = match texcoord {
        Some(texcoord) => VertexAttribute::buffer(2, texcoord.to_vec()),
        None => VertexAttribute::Constant(vec![0.0, 0.0]),
    };
    map.insert(AttributeName::Texcoord, texcoord);

    let normal = match normal {
        Some(normal) => VertexAttribute::buffer(3, normal.to_vec()),
        None => VertexAttribute::Constant(vec![0.0, 0.0, 1.0]),
    };
    map.insert(AttributeName::Normal, normal);

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GeometryData {
        GeometryData {
            position: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn absent_attributes_become_constants() {
        let map = prepare_attributes(&triangle());
        assert_eq!(map.len(), AttributeName::ALL.len());
        assert!(!map[&AttributeName::Position].is_constant());
        assert_eq!(
            map[&AttributeName::Color],
            VertexAttribute::Constant(vec![1.0, 1.0, 1.0, 1.0])
        );
        assert_eq!(
            map[&AttributeName::Tangent],
            VertexAttribute::Constant(vec![1.0, 0.0, 0.0])
        );
        assert_eq!(
            map[&AttributeName::Texcoord],
            VertexAttribute::Constant(vec![0.0, 0.0])
        );
        assert_eq!(
            map[&AttributeName::Normal],
            VertexAttribute::Constant(vec![0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn tangents_need_texcoords_and_normals() {
        let mut data = triangle();
        data.texcoord = Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let map = prepare_attributes(&data);
        assert!(map[&AttributeName::Tangent].is_constant());

        data.normal = Some([0.0, 0.0, 1.0].repeat(3));
        let map = prepare_attributes(&data);
        match &map[&AttributeName::Tangent] {
            VertexAttribute::Buffer { components, data } => {
                assert_eq!(*components, 3);
                assert_eq!(data.len(), 9);
            }
            other => panic!("expected tangent buffer, got {other:?}"),
        }
    }

    #[test]
    fn partial_texcoords_fall_back_to_constants() {
        let mut data = triangle();
        data.position.extend_from_slice(&[0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        // Only the first triangle carried `vt` references.
        data.texcoord = Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        data.normal = Some([0.0, 0.0, 1.0].repeat(6));
        let map = prepare_attributes(&data);
        assert_eq!(
            map[&AttributeName::Texcoord],
            VertexAttribute::Constant(vec![0.0, 0.0])
        );
        assert_eq!(
            map[&AttributeName::Tangent],
            VertexAttribute::Constant(FALLBACK_TANGENT.to_vec())
        );
        assert!(!map[&AttributeName::Normal].is_constant());
    }

    #[test]
    fn color_component_count() {
        let mut data = triangle();
        data.color = Some(vec![0.5; 9]);
        let map = prepare_attributes(&data);
        assert!(matches!(
            map[&AttributeName::Color],
            VertexAttribute::Buffer { components: 3, .. }
        ));

        data.color = Some(vec![0.5; 12]);
        let map = prepare_attributes(&data);
        assert!(matches!(
            map[&AttributeName::Color],
            VertexAttribute::Buffer { components: 4, .. }
        ));
    }

    #[test]
    fn bytes_cover_all_floats() {
        let map = prepare_attributes(&triangle());
        assert_eq!(map[&AttributeName::Position].as_bytes().len(), 9 * 4);
        assert_eq!(map[&AttributeName::Normal].as_bytes().len(), 3 * 4);
        assert_eq!(AttributeName::Tangent.as_str(), "a_tangent");
    }
}
