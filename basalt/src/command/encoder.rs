use glam::Vec4;

use crate::config::COMMAND_STREAM_SIZE;
use crate::handle::{BufferHandle, ComputePipelineHandle, GraphicsPipelineHandle, TextureHandle};
use crate::types::{
    AccessFlags, BufferBarrier, BufferCopyRegion, BufferTextureCopyRegion, CullingMode,
    GlobalBarrier, IndexType, Rect, RenderPass, Scissor, TextureBarrier, TextureCopyRegion,
    Viewport,
};

/// The closed set of recordable commands. The encoder appends these, the
/// decoder replays them against the GPU; nothing in between interprets
/// them.
#[derive(Debug, Clone)]
pub enum Command {
    BeginCommandBuffer,
    EndCommandBuffer,
    BeginRegion {
        name: String,
        color: Vec4,
    },
    EndRegion,
    BeginRenderPass {
        render_area: Rect,
        render_pass: RenderPass,
    },
    EndRenderPass,
    PushConstants {
        ubo_buffer: BufferHandle,
        offset: u32,
    },
    BindGraphicsPipeline {
        pipeline: GraphicsPipelineHandle,
    },
    SetViewport {
        viewport: Viewport,
    },
    SetScissor {
        scissor: Scissor,
    },
    SetCullingMode {
        culling_mode: CullingMode,
    },
    BindIndexBuffer {
        buffer: BufferHandle,
        offset: u64,
        index_type: IndexType,
    },
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    DrawIndexed {
        indices_count: u32,
        first_index: u32,
        vertex_offset: i32,
    },
    DrawIndexedInstanced {
        indices_count: u32,
        num_instances: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndexedIndirect {
        buffer: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    DrawIndexedIndirectCount {
        buffer: BufferHandle,
        offset: u64,
        count_buffer: BufferHandle,
        count_buffer_offset: u64,
        max_draw_count: u32,
        stride: u32,
    },
    Dispatch {
        pipeline: ComputePipelineHandle,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    },
    DispatchIndirect {
        pipeline: ComputePipelineHandle,
        buffer: BufferHandle,
        offset: u64,
    },
    BufferCopy {
        src: BufferHandle,
        dst: BufferHandle,
        regions: Vec<BufferCopyRegion>,
    },
    TextureCopy {
        src: TextureHandle,
        src_texture_access: AccessFlags,
        dst: TextureHandle,
        dst_texture_access: AccessFlags,
        regions: Vec<TextureCopyRegion>,
    },
    BufferTextureCopy {
        src: BufferHandle,
        dst: TextureHandle,
        texture_access: AccessFlags,
        regions: Vec<BufferTextureCopyRegion>,
    },
    TextureBufferCopy {
        src: TextureHandle,
        texture_access: AccessFlags,
        dst: BufferHandle,
        regions: Vec<BufferTextureCopyRegion>,
    },
    GlobalBarrier {
        barrier: GlobalBarrier,
    },
    TextureBarrier {
        barriers: Vec<TextureBarrier>,
    },
    BufferBarrier {
        barriers: Vec<BufferBarrier>,
    },
}

/// Write-only command stream. Appends are O(1) into storage reserved once
/// from a fixed byte budget; no validation or GPU work happens here. The
/// decoder walks the stream in insertion order at submit time.
pub struct CommandEncoder {
    commands: Vec<Command>,
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandEncoder {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(COMMAND_STREAM_SIZE / std::mem::size_of::<Command>()),
        }
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn begin_command_buffer(&mut self) {
        self.push(Command::BeginCommandBuffer);
    }

    pub fn end_command_buffer(&mut self) {
        self.push(Command::EndCommandBuffer);
    }

    pub fn begin_region(&mut self, name: impl Into<String>, color: Vec4) {
        self.push(Command::BeginRegion {
            name: name.into(),
            color,
        });
    }

    pub fn end_region(&mut self) {
        self.push(Command::EndRegion);
    }

    pub fn begin_render_pass(&mut self, render_area: Rect, render_pass: RenderPass) {
        self.push(Command::BeginRenderPass {
            render_area,
            render_pass,
        });
    }

    pub fn end_render_pass(&mut self) {
        self.push(Command::EndRenderPass);
    }

    pub fn push_constants(&mut self, ubo_buffer: BufferHandle, offset: u32) {
        self.push(Command::PushConstants { ubo_buffer, offset });
    }

    pub fn bind_graphics_pipeline(&mut self, pipeline: GraphicsPipelineHandle) {
        self.push(Command::BindGraphicsPipeline { pipeline });
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.push(Command::SetViewport { viewport });
    }

    pub fn set_scissor(&mut self, scissor: Scissor) {
        self.push(Command::SetScissor { scissor });
    }

    pub fn set_culling_mode(&mut self, culling_mode: CullingMode) {
        self.push(Command::SetCullingMode { culling_mode });
    }

    pub fn bind_index_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        index_type: IndexType,
    ) {
        self.push(Command::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        });
    }

    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.push(Command::Draw {
            vertex_count,
            first_vertex,
        });
    }

    pub fn draw_indexed(&mut self, indices_count: u32, first_index: u32, vertex_offset: i32) {
        self.push(Command::DrawIndexed {
            indices_count,
            first_index,
            vertex_offset,
        });
    }

    pub fn draw_indexed_instanced(
        &mut self,
        indices_count: u32,
        num_instances: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.push(Command::DrawIndexedInstanced {
            indices_count,
            num_instances,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    pub fn draw_indexed_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.push(Command::DrawIndexedIndirect {
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    pub fn draw_indexed_indirect_count(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        count_buffer: BufferHandle,
        count_buffer_offset: u64,
        max_draw_count: u32,
        stride: u32,
    ) {
        self.push(Command::DrawIndexedIndirectCount {
            buffer,
            offset,
            count_buffer,
            count_buffer_offset,
            max_draw_count,
            stride,
        });
    }

    pub fn dispatch(
        &mut self,
        pipeline: ComputePipelineHandle,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        self.push(Command::Dispatch {
            pipeline,
            group_count_x,
            group_count_y,
            group_count_z,
        });
    }

    pub fn dispatch_indirect(
        &mut self,
        pipeline: ComputePipelineHandle,
        buffer: BufferHandle,
        offset: u64,
    ) {
        self.push(Command::DispatchIndirect {
            pipeline,
            buffer,
            offset,
        });
    }

    pub fn buffer_copy(
        &mut self,
        src: BufferHandle,
        dst: BufferHandle,
        regions: Vec<BufferCopyRegion>,
    ) {
        self.push(Command::BufferCopy { src, dst, regions });
    }

    pub fn texture_copy(
        &mut self,
        src: TextureHandle,
        src_texture_access: AccessFlags,
        dst: TextureHandle,
        dst_texture_access: AccessFlags,
        regions: Vec<TextureCopyRegion>,
    ) {
        self.push(Command::TextureCopy {
            src,
            src_texture_access,
            dst,
            dst_texture_access,
            regions,
        });
    }

    pub fn copy_buffer_to_texture(
        &mut self,
        src: BufferHandle,
        dst: TextureHandle,
        texture_access: AccessFlags,
        regions: Vec<BufferTextureCopyRegion>,
    ) {
        self.push(Command::BufferTextureCopy {
            src,
            dst,
            texture_access,
            regions,
        });
    }

    pub fn copy_texture_to_buffer(
        &mut self,
        src: TextureHandle,
        texture_access: AccessFlags,
        dst: BufferHandle,
        regions: Vec<BufferTextureCopyRegion>,
    ) {
        self.push(Command::TextureBufferCopy {
            src,
            texture_access,
            dst,
            regions,
        });
    }

    pub fn global_barrier(&mut self, barrier: GlobalBarrier) {
        self.push(Command::GlobalBarrier { barrier });
    }

    pub fn texture_barrier(&mut self, barriers: Vec<TextureBarrier>) {
        self.push(Command::TextureBarrier { barriers });
    }

    pub fn buffer_barrier(&mut self, barriers: Vec<BufferBarrier>) {
        self.push(Command::BufferBarrier { barriers });
    }

    /// Drops every recorded command in insertion order and rewinds the
    /// stream; storage is kept for the next recording.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Bindable;

    #[test]
    fn test_round_trip_preserves_order() {
        let mut encoder = CommandEncoder::new();
        encoder.begin_command_buffer();
        encoder.draw(3, 0);
        encoder.draw_indexed(6, 0, 0);
        encoder.set_culling_mode(CullingMode::Back);
        encoder.end_command_buffer();

        assert_eq!(encoder.len(), 5);
        let kinds: Vec<_> = encoder
            .commands()
            .iter()
            .map(std::mem::discriminant)
            .collect();
        assert_eq!(kinds[0], std::mem::discriminant(&Command::BeginCommandBuffer));
        assert_eq!(kinds[4], std::mem::discriminant(&Command::EndCommandBuffer));
        match &encoder.commands()[1] {
            Command::Draw {
                vertex_count,
                first_vertex,
            } => {
                assert_eq!(*vertex_count, 3);
                assert_eq!(*first_vertex, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_reset_clears_but_keeps_capacity() {
        let mut encoder = CommandEncoder::new();
        let capacity = encoder.commands.capacity();
        for _ in 0..100 {
            encoder.push_constants(Bindable::default(), 0);
        }
        encoder.reset();
        assert!(!encoder.has_commands());
        assert_eq!(encoder.len(), 0);
        assert_eq!(encoder.commands.capacity(), capacity);
    }
}
