//! In-memory backend used by unit tests

use crate::backend::traits::*;
use crate::backend::types::*;
use std::ops::Range;

/// Backend that records calls without touching a GPU
#[derive(Default)]
pub struct NullBackend {
    next_id: u64,
    pub buffer_writes: Vec<(BufferHandle, u64, usize)>,
    pub texture_writes: Vec<(TextureHandle, u32)>,
    pub draws: Vec<(Range<u32>, i32, Range<u32>)>,
    pub submits: u32,
    pub waits: u32,
    pub pass_open: bool,
}

impl NullBackend {
    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsBackend for NullBackend {
    fn new() -> BackendResult<Self> {
        Ok(Self::default())
    }

    fn create_buffer(&mut self, _desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        Ok(BufferHandle(self.next()))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        self.buffer_writes.push((buffer, offset, data.len()));
    }

    fn create_texture(&mut self, _desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        Ok(TextureHandle(self.next()))
    }

    fn create_texture_view(&mut self, _texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        Ok(TextureViewHandle(self.next()))
    }

    fn write_texture_layer(
        &mut self,
        texture: TextureHandle,
        layer: u32,
        _data: &[u8],
        _width: u32,
        _height: u32,
    ) {
        self.texture_writes.push((texture, layer));
    }

    fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        Ok(SamplerHandle(self.next()))
    }

    fn create_bind_group_layout(
        &mut self,
        _entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        Ok(BindGroupLayoutHandle(self.next()))
    }

    fn create_bind_group(
        &mut self,
        _layout: BindGroupLayoutHandle,
        _entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        Ok(BindGroupHandle(self.next()))
    }

    fn create_render_pipeline(
        &mut self,
        _desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        Ok(RenderPipelineHandle(self.next()))
    }

    fn begin_render_pass(&mut self, _desc: &RenderPassDescriptor) {
        self.pass_open = true;
    }

    fn end_render_pass(&mut self) {
        self.pass_open = false;
    }

    fn set_render_pipeline(&mut self, _pipeline: RenderPipelineHandle) {}

    fn set_bind_group(&mut self, _index: u32, _bind_group: BindGroupHandle) {}

    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle, _offset: u64) {}

    fn set_index_buffer(&mut self, _buffer: BufferHandle, _offset: u64, _format: IndexFormat) {}

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.draws.push((indices, base_vertex, instances));
    }

    fn submit(&mut self) {
        self.submits += 1;
    }

    fn wait_idle(&mut self) {
        self.waits += 1;
    }
}
