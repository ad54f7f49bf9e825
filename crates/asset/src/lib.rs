//! Asset loading/parsers (OBJ geometry, MTL materials, textures).
//! Parsers are pure and synchronous; file access is confined to the
//! `load*` front-ends and [`model::Model::load`].

pub mod attributes;
pub mod mesh;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod tangent;
pub mod texture;

mod text;
