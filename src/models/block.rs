//! Model blocks: a fixed 148-byte metadata region followed by the vertex and index arrays.

use std::ops::RangeInclusive;

use bitflags::bitflags;
use tracing::{trace, warn};
use winnow::Parser;
use winnow::binary::{le_f32, le_u8, le_u32};
use winnow::combinator::repeat;

use crate::data::parser_utils::{
    WResult, all_within, parse_fixed_name, parse_vec3, parse_vec4, region,
};
use crate::error::{IResult, ImportError};
use crate::models::table::{ModelTable, NODE_NAME_SIZE};
use crate::recognized::Recognized;

/// Size of the metadata region. Vertex data always starts right after it.
pub const BLOCK_METADATA_SIZE: usize = 148;

pub const MESH_NAME_SIZE: usize = 20;

/// Width of the NUL-padded node path (49 characters + terminator).
pub const NODE_PATH_SIZE: usize = 50;

/// Stride of one vertex: position, normal, uv and tangent, all f32.
pub const VERTEX_SIZE: usize = 48;

pub const INDEX_SIZE: usize = 4;

/// Allowed range for each position component.
///
/// Membership is a closed-range test, so a NaN component is rejected. Plain
/// `< min || > max` comparisons would let NaN through.
pub const POSITION_RANGE: RangeInclusive<f32> = -10000.0..=10000.0;

/// Allowed range for each size component. NaN is rejected as for
/// [`POSITION_RANGE`].
pub const SIZE_RANGE: RangeInclusive<f32> = 0.01..=10000.0;

bitflags! {
    /// Optional data categories stored alongside a model.
    ///
    /// Bits 5-7 are unused. They are kept as read rather than rejected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DataTypeFlags: u8 {
        const MATERIAL = 1 << 0;
        const TEXTURE = 1 << 1;
        const CAMERA = 1 << 2;
        const LIGHT = 1 << 3;
        /// Animations, bones and curves.
        const ANIMATION = 1 << 4;
    }
}

/// How a model should be blended when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RenderType {
    #[default]
    Opaque = 0,
    /// Material has a transparent texture or color.
    Transparent = 1,
    /// Material has transparency, but alpha is all-or-nothing.
    Masked = 2,
}

impl RenderType {
    pub fn from_raw(raw: u8) -> Recognized<RenderType, u8> {
        match raw {
            0 => Recognized::Known(RenderType::Opaque),
            1 => Recognized::Known(RenderType::Transparent),
            2 => Recognized::Known(RenderType::Masked),
            other => Recognized::Unknown(other),
        }
    }
}

/// Render-ready data for a single vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub tangent: [f32; 4],
}

/// A fully validated model block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelBlock {
    pub node_name: String,
    pub mesh_name: String,
    pub node_path: String,
    pub data_type_flags: DataTypeFlags,
    /// Raw render type. Use [`ModelBlock::effective_render_type`] to resolve unused values.
    pub render_type: Recognized<RenderType, u8>,
    pub position: [f32; 3],
    /// Quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub size: [f32; 3],
    /// Stored as written. Geometry is always located right after the
    /// metadata region, so these two are informational only.
    pub vertices_offset: u32,
    pub vertices_size: u32,
    pub indices_offset: u32,
    pub indices_size: u32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ModelBlock {
    /// The render type to actually use; unused values behave as opaque.
    pub fn effective_render_type(&self) -> RenderType {
        self.render_type.unwrap_or(RenderType::Opaque)
    }

    pub fn has(&self, flags: DataTypeFlags) -> bool {
        self.data_type_flags.contains(flags)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// The metadata region exactly as stored.
struct BlockFields {
    node_name: String,
    mesh_name: String,
    node_path: String,
    data_type_flags: u8,
    render_type: u8,
    position: [f32; 3],
    rotation: [f32; 4],
    size: [f32; 3],
    vertices_offset: u32,
    vertices_size: u32,
    indices_offset: u32,
    indices_size: u32,
}

fn parse_block_fields(input: &mut &[u8]) -> WResult<BlockFields> {
    let node_name = parse_fixed_name::<NODE_NAME_SIZE>(input)?;
    let mesh_name = parse_fixed_name::<MESH_NAME_SIZE>(input)?;
    let node_path = parse_fixed_name::<NODE_PATH_SIZE>(input)?;
    let data_type_flags = le_u8.parse_next(input)?;
    let render_type = le_u8.parse_next(input)?;
    let position = parse_vec3(input)?;
    let rotation = parse_vec4(input)?;
    let size = parse_vec3(input)?;
    let vertices_offset = le_u32.parse_next(input)?;
    let vertices_size = le_u32.parse_next(input)?;
    let indices_offset = le_u32.parse_next(input)?;
    let indices_size = le_u32.parse_next(input)?;
    Ok(BlockFields {
        node_name,
        mesh_name,
        node_path,
        data_type_flags,
        render_type,
        position,
        rotation,
        size,
        vertices_offset,
        vertices_size,
        indices_offset,
        indices_size,
    })
}

fn parse_vertex(input: &mut &[u8]) -> WResult<Vertex> {
    let position = parse_vec3(input)?;
    let normal = parse_vec3(input)?;
    let u = le_f32.parse_next(input)?;
    let v = le_f32.parse_next(input)?;
    let tangent = parse_vec4(input)?;
    Ok(Vertex {
        position,
        normal,
        tex_coord: [u, v],
        tangent,
    })
}

fn parse_vertices(input: &mut &[u8], count: usize) -> WResult<Vec<Vertex>> {
    repeat(count, parse_vertex).parse_next(input)
}

fn parse_indices(input: &mut &[u8], count: usize) -> WResult<Vec<u32>> {
    repeat(count, le_u32).parse_next(input)
}

/// Read and validate the block a table entry points at.
///
/// Checks run in this order, and the first failure wins:
/// the whole block must lie inside the file, position must be in range,
/// size must be in range, then the vertex and index arrays must lie inside
/// the file. No geometry is read until the metadata has been accepted.
pub fn parse_block(file_data: &[u8], table: &ModelTable) -> IResult<ModelBlock> {
    let block_offset = table.block_offset as usize;

    match table.block_end() {
        Some(end) if end <= file_data.len() => {}
        _ => return Err(ImportError::UnexpectedEof),
    }

    let input = &mut region(file_data, block_offset, BLOCK_METADATA_SIZE)?;
    let fields = parse_block_fields(input)?;

    if !all_within(&fields.position, &POSITION_RANGE) {
        return Err(ImportError::InvalidModelPosition);
    }
    if !all_within(&fields.size, &SIZE_RANGE) {
        return Err(ImportError::InvalidModelSize);
    }

    let vertices_size = fields.vertices_size as usize;
    let indices_size = fields.indices_size as usize;

    let geometry_start = block_offset + BLOCK_METADATA_SIZE;
    let vertex_bytes = &mut region(file_data, geometry_start, vertices_size)?;
    let indices_start = geometry_start + vertices_size;
    let index_bytes = &mut region(file_data, indices_start, indices_size)?;

    if vertices_size % VERTEX_SIZE != 0 {
        warn!(
            node = %fields.node_name,
            "vertex data is {vertices_size} bytes, not a multiple of {VERTEX_SIZE}; ignoring the tail"
        );
    }
    if indices_size % INDEX_SIZE != 0 {
        warn!(
            node = %fields.node_name,
            "index data is {indices_size} bytes, not a multiple of {INDEX_SIZE}; ignoring the tail"
        );
    }

    let vertices = parse_vertices(vertex_bytes, vertices_size / VERTEX_SIZE)?;
    let indices = parse_indices(index_bytes, indices_size / INDEX_SIZE)?;

    let render_type = RenderType::from_raw(fields.render_type);
    if let Recognized::Unknown(raw) = render_type {
        warn!(node = %fields.node_name, "unused render type {raw}, treating as opaque");
    }

    trace!(
        node = %fields.node_name,
        mesh = %fields.mesh_name,
        vertices = vertices.len(),
        indices = indices.len(),
        "parsed model block"
    );

    Ok(ModelBlock {
        node_name: fields.node_name,
        mesh_name: fields.mesh_name,
        node_path: fields.node_path,
        data_type_flags: DataTypeFlags::from_bits_retain(fields.data_type_flags),
        render_type,
        position: fields.position,
        rotation: fields.rotation,
        size: fields.size,
        vertices_offset: fields.vertices_offset,
        vertices_size: fields.vertices_size,
        indices_offset: fields.indices_offset,
        indices_size: fields.indices_size,
        vertices,
        indices,
    })
}
