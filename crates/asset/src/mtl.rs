//! MTL material-library parser.
//!
//! Only properties present in the text are set on a [`Material`]; the
//! renderer merges them over a caller-provided [`Shading`] default.
//! No I/O happens here: texture maps stay as filenames.

use std::collections::{BTreeSet, HashMap, hash_map};

use thiserror::Error;

use crate::text::{self, Line};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MtlError {
    #[error("line {line}: missing {what}")]
    MissingField { line: usize, what: &'static str },
    #[error("line {line}: invalid number '{token}' for {keyword}")]
    InvalidNumber {
        line: usize,
        keyword: &'static str,
        token: String,
    },
    #[error("line {line}: invalid integer '{token}' for {keyword}")]
    InvalidInteger {
        line: usize,
        keyword: &'static str,
        token: String,
    },
}

pub type MtlResult<T> = Result<T, MtlError>;

/// Material as written in the MTL file. `None` = property absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub opacity: Option<f32>,
    pub optical_density: Option<f32>,
    pub illum: Option<i32>,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub normal_map: Option<String>,
}

/// Fully resolved shading parameters handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Shading {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    pub optical_density: f32,
    pub illum: i32,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub normal_map: Option<String>,
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            ambient: [0.0, 0.0, 0.0],
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            shininess: 400.0,
            opacity: 1.0,
            optical_density: 1.0,
            illum: 2,
            diffuse_map: None,
            specular_map: None,
            normal_map: None,
        }
    }
}

impl Material {
    /// Explicit fields of `self` over `defaults`.
    pub fn resolve(&self, defaults: &Shading) -> Shading {
        Shading {
            ambient: self.ambient.unwrap_or(defaults.ambient),
            diffuse: self.diffuse.unwrap_or(defaults.diffuse),
            specular: self.specular.unwrap_or(defaults.specular),
            emissive: self.emissive.unwrap_or(defaults.emissive),
            shininess: self.shininess.unwrap_or(defaults.shininess),
            opacity: self.opacity.unwrap_or(defaults.opacity),
            optical_density: self.optical_density.unwrap_or(defaults.optical_density),
            illum: self.illum.unwrap_or(defaults.illum),
            diffuse_map: self
                .diffuse_map
                .clone()
                .or_else(|| defaults.diffuse_map.clone()),
            specular_map: self
                .specular_map
                .clone()
                .or_else(|| defaults.specular_map.clone()),
            normal_map: self
                .normal_map
                .clone()
                .or_else(|| defaults.normal_map.clone()),
        }
    }

    /// Texture filenames referenced by this material.
    pub fn maps(&self) -> impl Iterator<Item = &str> {
        [&self.diffuse_map, &self.specular_map, &self.normal_map]
            .into_iter()
            .filter_map(|m| m.as_deref())
    }
}

/// Material name -> material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Material> {
        self.materials.iter()
    }

    /// Merge `other` into `self`; names in `other` win.
    pub fn extend(&mut self, other: MaterialLibrary) {
        self.materials.extend(other.materials);
    }

    /// Resolved shading for `name`, or `defaults` when the library lacks it.
    pub fn shading_for(&self, name: &str, defaults: &Shading) -> Shading {
        match self.get(name) {
            Some(material) => material.resolve(defaults),
            None => defaults.clone(),
        }
    }

    /// Every distinct texture filename, sorted.
    pub fn texture_files(&self) -> Vec<&str> {
        self.materials
            .values()
            .flat_map(Material::maps)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum MtlRecord<'a> {
    NewMaterial(&'a str),
    Ambient([f32; 3]),
    Diffuse([f32; 3]),
    Specular([f32; 3]),
    Emissive([f32; 3]),
    Shininess(f32),
    OpticalDensity(f32),
    Opacity(f32),
    Illum(i32),
    DiffuseMap(&'a str),
    SpecularMap(&'a str),
    NormalMap(&'a str),
    Unknown(&'a str),
}

impl<'a> MtlRecord<'a> {
    fn parse(line: &Line<'a>) -> MtlResult<Self> {
        let record = match line.keyword {
            "newmtl" => MtlRecord::NewMaterial(line.rest),
            "Ka" => MtlRecord::Ambient(color(line, "Ka")?),
            "Kd" => MtlRecord::Diffuse(color(line, "Kd")?),
            "Ks" => MtlRecord::Specular(color(line, "Ks")?),
            "Ke" => MtlRecord::Emissive(color(line, "Ke")?),
            "Ns" => MtlRecord::Shininess(scalar(line, "Ns")?),
            "Ni" => MtlRecord::OpticalDensity(scalar(line, "Ni")?),
            "d" => MtlRecord::Opacity(scalar(line, "d")?),
            "illum" => {
                let token = first_field(line, "illum")?;
                let value = token.parse::<i32>().map_err(|_| MtlError::InvalidInteger {
                    line: line.number,
                    keyword: "illum",
                    token: token.to_string(),
                })?;
                MtlRecord::Illum(value)
            }
            // TODO: split map options such as `-bm 0.5` from the filename.
            "map_Kd" => MtlRecord::DiffuseMap(map_file(line, "map_Kd")?),
            "map_Ns" => MtlRecord::SpecularMap(map_file(line, "map_Ns")?),
            "map_Bump" | "map_bump" | "bump" => MtlRecord::NormalMap(map_file(line, "map_Bump")?),
            other => MtlRecord::Unknown(other),
        };
        Ok(record)
    }
}

fn first_field<'a>(line: &Line<'a>, keyword: &'static str) -> MtlResult<&'a str> {
    line.fields().next().ok_or(MtlError::MissingField {
        line: line.number,
        what: keyword,
    })
}

fn scalar(line: &Line<'_>, keyword: &'static str) -> MtlResult<f32> {
    let token = first_field(line, keyword)?;
    token.parse::<f32>().map_err(|_| MtlError::InvalidNumber {
        line: line.number,
        keyword,
        token: token.to_string(),
    })
}

fn color(line: &Line<'_>, keyword: &'static str) -> MtlResult<[f32; 3]> {
    let values = text::floats(line.fields()).map_err(|token| MtlError::InvalidNumber {
        line: line.number,
        keyword,
        token: token.to_string(),
    })?;
    match values.as_slice() {
        [r, g, b, ..] => Ok([*r, *g, *b]),
        _ => Err(MtlError::MissingField {
            line: line.number,
            what: "color component",
        }),
    }
}

fn map_file<'a>(line: &Line<'a>, keyword: &'static str) -> MtlResult<&'a str> {
    if line.rest.is_empty() {
        return Err(MtlError::MissingField {
            line: line.number,
            what: keyword,
        });
    }
    Ok(line.rest)
}

/// Parse one MTL payload.
pub fn parse_mtl(text: &str) -> MtlResult<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    let mut current: Option<(String, Material)> = None;

    for line in text::lines(text) {
        let record = MtlRecord::parse(&line)?;
        if let MtlRecord::NewMaterial(name) = record {
            if let Some((name, material)) = current.take() {
                library.insert(name, material);
            }
            current = Some((name.to_string(), Material::default()));
            continue;
        }
        if let MtlRecord::Unknown(keyword) = record {
            log::warn!("Unhandled MTL keyword '{}' on line {}", keyword, line.number);
            continue;
        }
        let Some((_, material)) = current.as_mut() else {
            log::warn!(
                "MTL property '{}' on line {} before any newmtl, skipped",
                line.keyword,
                line.number
            );
            continue;
        };
        apply(material, record);
    }

    if let Some((name, material)) = current {
        library.insert(name, material);
    }
    log::debug!("MTL parsed: {} materials", library.len());
    Ok(library)
}

/// Parse several MTL payloads as one newline-joined text.
pub fn parse_mtl_sources<S: AsRef<str>>(sources: &[S]) -> MtlResult<MaterialLibrary> {
    let joined = sources
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    parse_mtl(&joined)
}

fn apply(material: &mut Material, record: MtlRecord<'_>) {
    match record {
        MtlRecord::Ambient(c) => material.ambient = Some(c),
        MtlRecord::Diffuse(c) => material.diffuse = Some(c),
        MtlRecord::Specular(c) => material.specular = Some(c),
        MtlRecord::Emissive(c) => material.emissive = Some(c),
        MtlRecord::Shininess(v) => material.shininess = Some(v),
        MtlRecord::OpticalDensity(v) => material.optical_density = Some(v),
        MtlRecord::Opacity(v) => material.opacity = Some(v),
        MtlRecord::Illum(v) => material.illum = Some(v),
        MtlRecord::DiffuseMap(f) => material.diffuse_map = Some(f.to_string()),
        MtlRecord::SpecularMap(f) => material.specular_map = Some(f.to_string()),
        MtlRecord::NormalMap(f) => material.normal_map = Some(f.to_string()),
        MtlRecord::NewMaterial(_) | MtlRecord::Unknown(_) => {}
    }
}
