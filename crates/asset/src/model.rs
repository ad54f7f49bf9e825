//! OBJ + MTL + textures loaded together into render-ready parts.

use std::path::Path;

use anyhow::{Context, Result};

use crate::{
    attributes::{AttributeMap, prepare_attributes},
    mesh::Extents,
    mtl::{MaterialLibrary, Shading, parse_mtl_sources},
    obj::{Geometry, ObjData, load_obj_from_path, parse_obj},
    texture::{TextureCache, resolve_relative},
};

/// One drawable piece: attributes plus the material it is shaded with.
#[derive(Clone, Debug)]
pub struct ModelPart {
    /// `object/material` label for logs.
    pub name: String,
    pub material: Shading,
    pub attributes: AttributeMap,
    pub extents: Option<Extents>,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub parts: Vec<ModelPart>,
    pub materials: MaterialLibrary,
    pub textures: TextureCache,
}

impl Model {
    /// Read an OBJ file, its material libraries (relative to the OBJ's
    /// directory) and their texture maps.
    pub fn load(obj_path: impl AsRef<Path>, defaults: &Shading) -> Result<Self> {
        let obj_path = obj_path.as_ref();
        let obj = load_obj_from_path(obj_path)?;
        let base_dir = obj_path.parent().unwrap_or_else(|| Path::new("."));

        let mut sources = Vec::with_capacity(obj.material_libs.len());
        for lib in &obj.material_libs {
            let path = resolve_relative(base_dir, lib);
            match std::fs::read_to_string(&path) {
                Ok(text) => sources.push(text),
                Err(err) => log::warn!("Material library {:?} unavailable: {}", path, err),
            }
        }
        let materials = parse_mtl_sources(&sources)
            .with_context(|| format!("Failed to parse materials for {}", obj_path.display()))?;

        let mut textures = TextureCache::new();
        textures.load_library(&materials, base_dir);

        let model = Self::assemble(obj, materials, textures, defaults);
        log::info!(
            "Loaded model {}: {} parts, {} materials, {} textures",
            obj_path.display(),
            model.parts.len(),
            model.materials.len(),
            model.textures.len()
        );
        Ok(model)
    }

    /// Build from in-memory OBJ/MTL text. No textures are loaded.
    pub fn from_sources(obj_text: &str, mtl_texts: &[&str], defaults: &Shading) -> Result<Self> {
        let obj = parse_obj(obj_text)?;
        let materials = parse_mtl_sources(mtl_texts)?;
        Ok(Self::assemble(obj, materials, TextureCache::new(), defaults))
    }

    fn assemble(
        obj: ObjData,
        materials: MaterialLibrary,
        textures: TextureCache,
        defaults: &Shading,
    ) -> Self {
        let parts = obj
            .geometries
            .iter()
            .map(|geometry| build_part(geometry, &materials, defaults))
            .collect();
        Self {
            parts,
            materials,
            textures,
        }
    }

    /// Union of the extents of every part.
    pub fn extents(&self) -> Option<Extents> {
        self.parts
            .iter()
            .filter_map(|p| p.extents)
            .reduce(|a, b| a.union(&b))
    }

    /// Translation that centers the model on the origin.
    pub fn center_offset(&self) -> [f32; 3] {
        self.extents()
            .map(|e| e.center_offset())
            .unwrap_or([0.0; 3])
    }
}

fn build_part(geometry: &Geometry, materials: &MaterialLibrary, defaults: &Shading) -> ModelPart {
    if materials.get(&geometry.material).is_none() && geometry.material != "default" {
        log::warn!(
            "Material '{}' not found, using defaults",
            geometry.material
        );
    }
    let name = format!("{}/{}", geometry.object, geometry.material);
    ModelPart {
        material: materials.shading_for(&geometry.material, defaults),
        extents: geometry.data.extents(),
        attributes: prepare_attributes(&geometry.data),
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeName, VertexAttribute};

    const OBJ: &str = "\
mtllib scene.mtl
o Balloon
v -1 0 0
v 1 0 0
v 1 2 0
v -1 2 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl Red
f 1/1/1 2/2/1 3/3/1 4/4/1
usemtl Missing
f 1 2 3
";

    const MTL: &str = "newmtl Red\nKd 1 0 0\nd 0.5\n";

    #[test]
    fn parts_carry_resolved_materials() {
        let model = Model::from_sources(OBJ, &[MTL], &Shading::default()).unwrap();
        assert_eq!(model.parts.len(), 2);
        assert_eq!(model.parts[0].name, "Balloon/Red");
        assert_eq!(model.parts[0].material.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(model.parts[0].material.opacity, 0.5);
        assert_eq!(model.parts[1].material, Shading::default());

        assert!(matches!(
            model.parts[0].attributes[&AttributeName::Tangent],
            VertexAttribute::Buffer { components: 3, .. }
        ));
        assert!(model.parts[1].attributes[&AttributeName::Tangent].is_constant());
    }

    #[test]
    fn mixed_face_formats_still_load() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\n\
                   f 1/1/1 2/2/1 3/3/1\nf 1//1 2//1 3//1\n";
        let model = Model::from_sources(obj, &[], &Shading::default()).unwrap();
        assert_eq!(model.parts.len(), 1);
        let attributes = &model.parts[0].attributes;
        assert!(attributes[&AttributeName::Texcoord].is_constant());
        assert!(attributes[&AttributeName::Tangent].is_constant());
        assert!(matches!(
            &attributes[&AttributeName::Normal],
            VertexAttribute::Buffer { components: 3, data } if data.len() == 18
        ));
    }

    #[test]
    fn extents_span_all_parts() {
        let model = Model::from_sources(OBJ, &[MTL], &Shading::default()).unwrap();
        let e = model.extents().unwrap();
        assert_eq!(e.min, [-1.0, 0.0, 0.0]);
        assert_eq!(e.max, [1.0, 2.0, 0.0]);
        assert_eq!(model.center_offset(), [-0.0, -1.0, -0.0]);
    }

    #[test]
    fn load_resolves_libraries_next_to_obj() {
        let dir = std::env::temp_dir().join(format!("asset-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("balloon.obj"), OBJ).unwrap();
        std::fs::write(dir.join("scene.mtl"), format!("{MTL}map_Kd skin.png\n")).unwrap();

        let model = Model::load(dir.join("balloon.obj"), &Shading::default()).unwrap();
        assert_eq!(model.materials.len(), 1);
        // skin.png does not exist: placeholder is cached under its name.
        assert_eq!(model.textures.len(), 1);
        assert!(model.textures.get("skin.png").is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_library_is_not_fatal() {
        let dir = std::env::temp_dir().join(format!("asset-model-nolib-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("only.obj"), OBJ).unwrap();
        let model = Model::load(dir.join("only.obj"), &Shading::default()).unwrap();
        assert!(model.materials.is_empty());
        assert_eq!(model.parts[0].material, Shading::default());
        std::fs::remove_dir_all(&dir).ok();
        assert!(Model::load(dir.join("only.obj"), &Shading::default()).is_err());
    }
}
