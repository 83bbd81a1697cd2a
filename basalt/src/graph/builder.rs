use crate::graph::resource::{BufferHandle, GraphHandle, TextureHandle};
use crate::graph::FrameGraph;
use crate::resource::{BufferCreateInfo, TextureCreateInfo};
use crate::types::AccessFlags;

/// Declares one pass's resource usage during graph construction. Handed to
/// the pass's setup closure; the returned record closure runs later, at
/// execution, against the realized resources.
pub struct PassBuilder<'a> {
    pub(crate) graph: &'a mut FrameGraph,
    pub(crate) pass: usize,
}

impl PassBuilder<'_> {
    pub fn create_texture(
        &mut self,
        name: impl Into<String>,
        mut create_info: TextureCreateInfo,
    ) -> TextureHandle {
        create_info.name = name.into();
        self.graph.create_texture_impl(self.pass, create_info)
    }

    pub fn create_buffer(
        &mut self,
        name: impl Into<String>,
        mut create_info: BufferCreateInfo,
    ) -> BufferHandle {
        assert!(create_info.size > 0, "`create_info.size` must be greater than `0`!");
        create_info.name = name.into();
        self.graph.create_buffer_impl(self.pass, create_info)
    }

    /// Reads don't version: the same handle comes back.
    pub fn read<T>(&mut self, handle: GraphHandle<T>, usage: AccessFlags) -> GraphHandle<T> {
        GraphHandle::new(self.graph.read_impl(self.pass, handle.node, usage))
    }

    /// Writing produces the next version of the resource; this pass
    /// becomes its writer.
    pub fn write<T>(&mut self, handle: GraphHandle<T>, usage: AccessFlags) -> GraphHandle<T> {
        GraphHandle::new(self.graph.write_impl(self.pass, handle.node, usage))
    }

    /// Mark the current pass as a leaf to prevent it from being culled.
    pub fn side_effect(&mut self) {
        self.graph.side_effect_impl(self.pass);
    }
}
