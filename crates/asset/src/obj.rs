//! OBJ parser producing non-indexed geometry groups split by object/group/material.
//!
//! Not a full OBJ implementation: free-form curves and multi-file `mtllib`
//! lines are not supported (a `mtllib` line names a single file, spaces allowed).

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::Context as _;
use thiserror::Error;

use crate::{
    mesh::GeometryData,
    text::{self, Line},
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObjError {
    #[error("line {line}: missing {what}")]
    MissingField { line: usize, what: &'static str },
    #[error("line {line}: invalid number '{token}' in {what}")]
    InvalidNumber {
        line: usize,
        what: &'static str,
        token: String,
    },
    #[error("line {line}: invalid face index '{token}'")]
    InvalidIndex { line: usize, token: String },
    #[error("line {line}: {table} index {index} out of range ({len} declared)")]
    IndexOutOfRange {
        line: usize,
        table: &'static str,
        index: i64,
        len: usize,
    },
}

pub type ObjResult<T> = Result<T, ObjError>;

/// Load and parse an OBJ file.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> anyhow::Result<ObjData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))
}

/// Load an OBJ payload from any reader.
pub fn load_obj_from_reader<R: Read>(mut reader: R) -> anyhow::Result<ObjData> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("Failed to read OBJ text")?;
    load_obj_from_str(&text)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> anyhow::Result<ObjData> {
    Ok(parse_obj(contents)?)
}

/// Parse a complete OBJ payload.
pub fn parse_obj(text: &str) -> ObjResult<ObjData> {
    let mut parser = ObjParser::new();
    parser.parse_str(text)?;
    Ok(parser.finish())
}

/// Result of an OBJ scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub geometries: Vec<Geometry>,
    /// `mtllib` filenames in declaration order, unresolved.
    pub material_libs: Vec<String>,
}

/// A run of triangles sharing one object/group/material context.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub object: String,
    pub groups: Vec<String>,
    pub material: String,
    pub data: GeometryData,
}

/// Attribute tables indexed by OBJ references. Row 0 of every table is a
/// zero sentinel, so 1-based indices address rows directly.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexTables {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<Vec<f32>>,
    /// Color row of every position (0 = uncolored), aligned with `positions`.
    color_rows: Vec<usize>,
}

impl Default for VertexTables {
    fn default() -> Self {
        Self {
            positions: vec![[0.0; 3]],
            texcoords: vec![[0.0; 2]],
            normals: vec![[0.0; 3]],
            colors: vec![vec![0.0; 3]],
            color_rows: vec![0],
        }
    }
}

impl VertexTables {
    /// Positions including the sentinel row.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Vertex colors including the sentinel row. Only `v` lines with more
    /// than three fields add a row, so this table is not aligned with positions;
    /// use [`VertexTables::color_of`] to look up a position's color.
    pub fn colors(&self) -> &[Vec<f32>] {
        &self.colors
    }

    /// Color row of position `index`, or `None` (the sentinel) when that
    /// vertex was declared without color.
    pub fn color_of(&self, index: usize) -> Option<&[f32]> {
        match self.color_rows.get(index) {
            Some(&row) if row > 0 => Some(&self.colors[row]),
            _ => None,
        }
    }

    /// Floats per emitted color, taken from the first colored vertex.
    pub fn color_width(&self) -> usize {
        self.colors.get(1).map_or(3, Vec::len)
    }

    /// `true` once any `v` line carried color components.
    pub fn has_colors(&self) -> bool {
        self.colors.len() > 1
    }

    fn resolve_corner(&self, token: &str, line: usize) -> ObjResult<Corner> {
        let mut parts = token.split('/');
        let position = match parts.next() {
            Some(p) if !p.is_empty() => resolve_index(p, self.positions.len(), "position", line)?,
            _ => {
                return Err(ObjError::MissingField {
                    line,
                    what: "position index",
                });
            }
        };
        let texcoord = match parts.next() {
            Some(t) if !t.is_empty() => {
                Some(resolve_index(t, self.texcoords.len(), "texcoord", line)?)
            }
            _ => None,
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(n, self.normals.len(), "normal", line)?),
            _ => None,
        };
        Ok(Corner {
            position,
            texcoord,
            normal,
        })
    }
}

/// Resolve a 1-based (or negative, relative) OBJ index against a table whose
/// length includes the sentinel row. `0` lands on the sentinel.
fn resolve_index(token: &str, len: usize, table: &'static str, line: usize) -> ObjResult<usize> {
    let raw = token.parse::<i64>().map_err(|_| ObjError::InvalidIndex {
        line,
        token: token.to_string(),
    })?;
    let idx = if raw >= 0 { raw } else { len as i64 + raw };
    if idx < 0 || idx >= len as i64 {
        return Err(ObjError::IndexOutOfRange {
            line,
            table,
            index: raw,
            len: len - 1,
        });
    }
    Ok(idx as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Corner {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// One recognised OBJ line with its typed payload.
#[derive(Clone, Debug, PartialEq)]
enum ObjRecord<'a> {
    Position {
        xyz: [f32; 3],
        color: Option<Vec<f32>>,
    },
    Normal([f32; 3]),
    Texcoord([f32; 2]),
    Face(Vec<&'a str>),
    MaterialLib(&'a str),
    UseMaterial(&'a str),
    Group(Vec<&'a str>),
    Object(&'a str),
    Smoothing,
    Unknown(&'a str),
}

impl<'a> ObjRecord<'a> {
    fn parse(line: &Line<'a>) -> ObjResult<Self> {
        let record = match line.keyword {
            "v" => {
                let values = numbers(line, "vertex position")?;
                if values.len() < 3 {
                    return Err(ObjError::MissingField {
                        line: line.number,
                        what: "vertex position component",
                    });
                }
                let color = (values.len() > 3).then(|| values[3..].to_vec());
                ObjRecord::Position {
                    xyz: [values[0], values[1], values[2]],
                    color,
                }
            }
            "vn" => {
                let values = numbers(line, "vertex normal")?;
                if values.len() < 3 {
                    return Err(ObjError::MissingField {
                        line: line.number,
                        what: "vertex normal component",
                    });
                }
                ObjRecord::Normal([values[0], values[1], values[2]])
            }
            "vt" => {
                let values = numbers(line, "texture coordinate")?;
                match values.as_slice() {
                    [] => {
                        return Err(ObjError::MissingField {
                            line: line.number,
                            what: "texture coordinate component",
                        });
                    }
                    [u] => ObjRecord::Texcoord([*u, 0.0]),
                    [u, v, ..] => ObjRecord::Texcoord([*u, *v]),
                }
            }
            "f" => ObjRecord::Face(line.fields().collect()),
            "mtllib" => ObjRecord::MaterialLib(line.rest),
            "usemtl" => ObjRecord::UseMaterial(line.rest),
            "g" => ObjRecord::Group(line.fields().collect()),
            "o" => ObjRecord::Object(line.rest),
            "s" => ObjRecord::Smoothing,
            other => ObjRecord::Unknown(other),
        };
        Ok(record)
    }
}

fn numbers(line: &Line<'_>, what: &'static str) -> ObjResult<Vec<f32>> {
    text::floats(line.fields()).map_err(|token| ObjError::InvalidNumber {
        line: line.number,
        what,
        token: token.to_string(),
    })
}

#[derive(Clone, Debug, PartialEq)]
struct GroupContext {
    object: String,
    groups: Vec<String>,
    material: String,
}

impl Default for GroupContext {
    fn default() -> Self {
        Self {
            object: "default".to_string(),
            groups: vec!["default".to_string()],
            material: "default".to_string(),
        }
    }
}

/// Geometry currently receiving face corners.
#[derive(Debug)]
struct GeometryBuilder {
    context: GroupContext,
    position: Vec<f32>,
    texcoord: Vec<f32>,
    normal: Vec<f32>,
    color: Vec<f32>,
}

impl GeometryBuilder {
    fn new(context: &GroupContext) -> Self {
        Self {
            context: context.clone(),
            position: Vec::new(),
            texcoord: Vec::new(),
            normal: Vec::new(),
            color: Vec::new(),
        }
    }

    fn push(&mut self, tables: &VertexTables, corner: Corner) {
        self.position
            .extend_from_slice(&tables.positions[corner.position]);
        if let Some(t) = corner.texcoord {
            self.texcoord.extend_from_slice(&tables.texcoords[t]);
        }
        if let Some(n) = corner.normal {
            self.normal.extend_from_slice(&tables.normals[n]);
        }
        if tables.has_colors() {
            // Every corner emits exactly `color_width` floats: uncolored
            // vertices pad with zeros, short colors pad with 1.
            let width = tables.color_width();
            let end = self.color.len() + width;
            match tables.color_of(corner.position) {
                Some(color) => {
                    self.color
                        .extend_from_slice(&color[..color.len().min(width)]);
                    self.color.resize(end, 1.0);
                }
                None => self.color.resize(end, 0.0),
            }
        }
    }

    /// Drop attribute buffers that never received data.
    fn finish(self) -> Option<Geometry> {
        if self.position.is_empty() {
            return None;
        }
        let non_empty = |v: Vec<f32>| (!v.is_empty()).then_some(v);
        Some(Geometry {
            object: self.context.object,
            groups: self.context.groups,
            material: self.context.material,
            data: GeometryData {
                position: self.position,
                texcoord: non_empty(self.texcoord),
                normal: non_empty(self.normal),
                color: non_empty(self.color),
            },
        })
    }
}

/// Incremental OBJ parser. Feed text with [`ObjParser::parse_str`], then call
/// [`ObjParser::finish`].
#[derive(Debug, Default)]
pub struct ObjParser {
    tables: VertexTables,
    context: GroupContext,
    open: Option<GeometryBuilder>,
    geometries: Vec<Geometry>,
    material_libs: Vec<String>,
}

impl ObjParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables as declared so far.
    pub fn tables(&self) -> &VertexTables {
        &self.tables
    }

    pub fn parse_str(&mut self, text: &str) -> ObjResult<()> {
        for line in text::lines(text) {
            let record = ObjRecord::parse(&line)?;
            self.apply(record, line.number)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> ObjData {
        if let Some(builder) = self.open.take() {
            self.geometries.extend(builder.finish());
        }
        log::debug!(
            "OBJ parsed: {} geometries, {} positions, {} material libs",
            self.geometries.len(),
            self.tables.positions.len() - 1,
            self.material_libs.len()
        );
        ObjData {
            geometries: self.geometries,
            material_libs: self.material_libs,
        }
    }

    fn apply(&mut self, record: ObjRecord<'_>, line: usize) -> ObjResult<()> {
        match record {
            ObjRecord::Position { xyz, color } => {
                self.tables.positions.push(xyz);
                let row = match color {
                    Some(color) => {
                        self.tables.colors.push(color);
                        self.tables.colors.len() - 1
                    }
                    None => 0,
                };
                self.tables.color_rows.push(row);
            }
            ObjRecord::Normal(n) => self.tables.normals.push(n),
            ObjRecord::Texcoord(uv) => self.tables.texcoords.push(uv),
            ObjRecord::Face(refs) => self.add_face(&refs, line)?,
            ObjRecord::MaterialLib(name) => {
                if name.is_empty() {
                    log::warn!("Empty mtllib on line {}", line);
                } else {
                    self.material_libs.push(name.to_string());
                }
            }
            ObjRecord::UseMaterial(name) => {
                self.context.material = name.to_string();
                self.switch_context();
            }
            ObjRecord::Group(names) => {
                self.context.groups = names.into_iter().map(str::to_string).collect();
                self.switch_context();
            }
            ObjRecord::Object(name) => {
                self.context.object = name.to_string();
                self.switch_context();
            }
            ObjRecord::Smoothing => {}
            ObjRecord::Unknown(keyword) => {
                log::warn!("Unhandled OBJ keyword '{}' on line {}", keyword, line);
            }
        }
        Ok(())
    }

    /// Geometry rotation. Geometries open lazily on the first face, so only
    /// a geometry that already holds vertices is ever closed here.
    fn switch_context(&mut self) {
        if let Some(builder) = self.open.take() {
            self.geometries.extend(builder.finish());
        }
    }

    fn add_face(&mut self, refs: &[&str], line: usize) -> ObjResult<()> {
        if refs.len() < 3 {
            log::warn!(
                "Face with {} vertices on line {} skipped (need at least 3)",
                refs.len(),
                line
            );
            return Ok(());
        }
        // All references are resolved before anything is emitted.
        let corners = refs
            .iter()
            .map(|token| self.tables.resolve_corner(token, line))
            .collect::<ObjResult<Vec<_>>>()?;

        let builder = self
            .open
            .get_or_insert_with(|| GeometryBuilder::new(&self.context));
        // Fan triangulation around the first corner.
        for tri in 1..corners.len() - 1 {
            for corner in [corners[0], corners[tri], corners[tri + 1]] {
                builder.push(&self.tables, corner);
            }
        }
        Ok(())
    }
}
