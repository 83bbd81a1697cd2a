use std::collections::HashMap;

use crate::graph::dependency::NodeId;
use crate::graph::resource::{BufferHandle, TextureHandle};

/// Resolves virtual frame-graph handles to the physical handles picked
/// during realization. Every version of a resource maps to the same
/// physical handle.
#[derive(Default)]
pub struct Registry {
    textures: HashMap<u16, crate::handle::TextureHandle>,
    buffers: HashMap<u16, crate::handle::BufferHandle>,
}

impl Registry {
    pub(crate) fn add_texture(&mut self, node: NodeId, handle: crate::handle::TextureHandle) {
        self.textures.insert(node.0, handle);
    }

    pub(crate) fn add_buffer(&mut self, node: NodeId, handle: crate::handle::BufferHandle) {
        self.buffers.insert(node.0, handle);
    }

    pub fn texture(&self, handle: TextureHandle) -> crate::handle::TextureHandle {
        *self
            .textures
            .get(&handle.node.0)
            .expect("virtual texture was not realized")
    }

    pub fn buffer(&self, handle: BufferHandle) -> crate::handle::BufferHandle {
        *self
            .buffers
            .get(&handle.node.0)
            .expect("virtual buffer was not realized")
    }
}
