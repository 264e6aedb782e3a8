//! Test-only builder for `.kmd` byte buffers.
//!
//! Produces well-formed containers by default; tests then override single
//! fields or patch bytes to exercise one failure at a time.

use crate::models::block::{BLOCK_METADATA_SIZE, DataTypeFlags, Vertex};
use crate::models::header::{HEADER_SIZE, KMD_MAGIC, KMD_VERSION};
use crate::models::table::TABLE_ENTRY_SIZE;

#[derive(Debug, Clone)]
pub struct ModelDesc {
    pub node_name: String,
    pub mesh_name: String,
    pub node_path: String,
    pub flags: DataTypeFlags,
    pub render_type: u8,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub size: [f32; 3],
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub geometry_offsets: Option<(u32, u32)>,
    /// Junk bytes appended to the vertex array and counted in `vertices_size`.
    pub extra_vertex_bytes: usize,
    /// Junk bytes appended to the index array and counted in `indices_size`.
    pub extra_index_bytes: usize,
    /// Written as `vertices_size` without adding any bytes.
    pub vertices_size_override: Option<u32>,
    /// Written as `indices_size` without adding any bytes.
    pub indices_size_override: Option<u32>,
}

impl ModelDesc {
    pub fn named(name: &str) -> Self {
        ModelDesc {
            node_name: name.to_string(),
            mesh_name: format!("{name}_mesh"),
            node_path: format!("scene/{name}"),
            flags: DataTypeFlags::empty(),
            render_type: 0,
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            size: [1.0; 3],
            vertices: Vec::new(),
            indices: Vec::new(),
            geometry_offsets: None,
            extra_vertex_bytes: 0,
            extra_index_bytes: 0,
            vertices_size_override: None,
            indices_size_override: None,
        }
    }

    pub fn mesh_name(mut self, name: &str) -> Self {
        self.mesh_name = name.to_string();
        self
    }

    pub fn node_path(mut self, path: &str) -> Self {
        self.node_path = path.to_string();
        self
    }

    pub fn flags(mut self, flags: DataTypeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn render_type(mut self, render_type: u8) -> Self {
        self.render_type = render_type;
        self
    }

    pub fn position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn size(mut self, size: [f32; 3]) -> Self {
        self.size = size;
        self
    }

    pub fn vertices(mut self, vertices: Vec<Vertex>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn geometry_offsets(mut self, vertices_offset: u32, indices_offset: u32) -> Self {
        self.geometry_offsets = Some((vertices_offset, indices_offset));
        self
    }

    fn vertex_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for v in &self.vertices {
            for f in v
                .position
                .iter()
                .chain(&v.normal)
                .chain(&v.tex_coord)
                .chain(&v.tangent)
            {
                out.extend_from_slice(&f.to_le_bytes());
            }
        }
        out.resize(out.len() + self.extra_vertex_bytes, 0xAB);
        out
    }

    fn index_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = self.indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        out.resize(out.len() + self.extra_index_bytes, 0xCD);
        out
    }

    fn encode(&self) -> Vec<u8> {
        let vertex_bytes = self.vertex_bytes();
        let index_bytes = self.index_bytes();
        let vertices_size = self
            .vertices_size_override
            .unwrap_or(vertex_bytes.len() as u32);
        let indices_size = self
            .indices_size_override
            .unwrap_or(index_bytes.len() as u32);
        let (vertices_offset, indices_offset) = self.geometry_offsets.unwrap_or((
            BLOCK_METADATA_SIZE as u32,
            BLOCK_METADATA_SIZE as u32 + vertex_bytes.len() as u32,
        ));

        let mut out = Vec::with_capacity(BLOCK_METADATA_SIZE);
        out.extend_from_slice(&fixed_name::<20>(&self.node_name));
        out.extend_from_slice(&fixed_name::<20>(&self.mesh_name));
        out.extend_from_slice(&fixed_name::<50>(&self.node_path));
        out.push(self.flags.bits());
        out.push(self.render_type);
        for f in self.position.iter().chain(&self.rotation).chain(&self.size) {
            out.extend_from_slice(&f.to_le_bytes());
        }
        for value in [vertices_offset, vertices_size, indices_offset, indices_size] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(out.len(), BLOCK_METADATA_SIZE);

        out.extend_from_slice(&vertex_bytes);
        out.extend_from_slice(&index_bytes);
        out
    }
}

#[derive(Debug, Clone)]
pub struct KmdBuilder {
    version: u8,
    scale_factor: u8,
    model_count: Option<u32>,
    model_tables_size: Option<u32>,
    model_blocks_size: Option<u32>,
    models: Vec<ModelDesc>,
}

impl KmdBuilder {
    pub fn new() -> Self {
        KmdBuilder {
            version: KMD_VERSION,
            scale_factor: 0,
            model_count: None,
            model_tables_size: None,
            model_blocks_size: None,
            models: Vec::new(),
        }
    }

    /// One empty model at the origin with unit size: exactly 194 bytes.
    pub fn minimal() -> Self {
        KmdBuilder::new().model(ModelDesc::named("node0"))
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn scale_factor(mut self, scale_factor: u8) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn model_count(mut self, count: u32) -> Self {
        self.model_count = Some(count);
        self
    }

    pub fn model_tables_size(mut self, size: u32) -> Self {
        self.model_tables_size = Some(size);
        self
    }

    pub fn model_blocks_size(mut self, size: u32) -> Self {
        self.model_blocks_size = Some(size);
        self
    }

    pub fn model(mut self, model: ModelDesc) -> Self {
        self.models.push(model);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let blocks: Vec<Vec<u8>> = self.models.iter().map(ModelDesc::encode).collect();
        let tables_len = self.models.len() * TABLE_ENTRY_SIZE;
        let blocks_len: usize = blocks.iter().map(Vec::len).sum();

        let mut out = Vec::with_capacity(HEADER_SIZE + tables_len + blocks_len);
        out.extend_from_slice(&KMD_MAGIC);
        out.push(self.version);
        out.push(self.scale_factor);
        let header_values = [
            self.model_count.unwrap_or(self.models.len() as u32),
            self.model_tables_size.unwrap_or(tables_len as u32),
            self.model_blocks_size.unwrap_or(blocks_len as u32),
        ];
        for value in header_values {
            out.extend_from_slice(&value.to_le_bytes());
        }

        let mut block_offset = HEADER_SIZE + tables_len;
        for (model, block) in self.models.iter().zip(&blocks) {
            out.extend_from_slice(&fixed_name::<20>(&model.node_name));
            out.extend_from_slice(&(block_offset as u32).to_le_bytes());
            out.extend_from_slice(&(block.len() as u32).to_le_bytes());
            block_offset += block.len();
        }

        for block in &blocks {
            out.extend_from_slice(block);
        }
        out
    }
}

fn fixed_name<const N: usize>(name: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = name.as_bytes();
    let len = bytes.len().min(N - 1);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Overwrite a little-endian u32 in an already built buffer.
pub fn patch_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Overwrite a little-endian f32 in an already built buffer.
pub fn patch_f32(data: &mut [u8], offset: usize, value: f32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// A vertex whose every component is derived from `seed`, so vertices compare distinctly.
pub fn sample_vertex(seed: f32) -> Vertex {
    Vertex {
        position: [seed, seed + 0.5, seed + 1.0],
        normal: [0.0, 1.0, 0.0],
        tex_coord: [seed / 10.0, 1.0 - seed / 10.0],
        tangent: [1.0, 0.0, 0.0, -1.0],
    }
}
