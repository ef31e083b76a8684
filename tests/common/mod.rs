//! Shared test backend recording every GPU interaction

use batched_tiles::backend::traits::*;
use batched_tiles::backend::types::*;
use std::collections::HashMap;
use std::ops::Range;

/// Initialize logging for tests; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Record of one staged buffer write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferWrite {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub len: usize,
}

/// Backend that keeps buffer contents in memory and logs all calls
#[derive(Default)]
pub struct RecordingBackend {
    next_id: u64,
    buffers: HashMap<u64, (Option<String>, Vec<u8>)>,
    pub buffer_writes: Vec<BufferWrite>,
    pub texture_layer_writes: Vec<(TextureHandle, u32, usize)>,
    pub draws: Vec<(Range<u32>, i32, Range<u32>)>,
    pub submits: u32,
    pub waits: u32,
    pub passes_begun: u32,
    pub pass_open: bool,
}

impl RecordingBackend {
    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current contents of a buffer, located by its creation label
    pub fn buffer_by_label(&self, label: &str) -> &[u8] {
        self.buffers
            .values()
            .find(|(l, _)| l.as_deref() == Some(label))
            .map(|(_, data)| data.as_slice())
            .unwrap_or_else(|| panic!("no buffer labeled {:?}", label))
    }

    pub fn handle_by_label(&self, label: &str) -> BufferHandle {
        let (&id, _) = self
            .buffers
            .iter()
            .find(|(_, (l, _))| l.as_deref() == Some(label))
            .unwrap_or_else(|| panic!("no buffer labeled {:?}", label));
        BufferHandle(id)
    }

    pub fn clear_logs(&mut self) {
        self.buffer_writes.clear();
        self.texture_layer_writes.clear();
        self.draws.clear();
        self.submits = 0;
        self.waits = 0;
        self.passes_begun = 0;
    }
}

impl GraphicsBackend for RecordingBackend {
    fn new() -> BackendResult<Self> {
        Ok(Self::default())
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let id = self.next();
        self.buffers
            .insert(id, (desc.label.clone(), vec![0; desc.size as usize]));
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        self.buffer_writes.push(BufferWrite {
            buffer,
            offset,
            len: data.len(),
        });
        let (_, contents) = self.buffers.get_mut(&buffer.0).expect("unknown buffer");
        let start = offset as usize;
        contents[start..start + data.len()].copy_from_slice(data);
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
        data: &[u8],
        _width: u32,
        _height: u32,
    ) {
        self.texture_layer_writes.push((texture, layer, data.len()));
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
        self.passes_begun += 1;
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
