use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use crate::graph::dependency::NodeId;
use crate::resource::{BufferCreateInfo, TextureCreateInfo};
use crate::types::AccessFlags;

/// Marker for texture-typed graph handles.
pub enum GraphTexture {}
/// Marker for buffer-typed graph handles.
pub enum GraphBuffer {}

/// Opaque reference to one version of a virtual resource. Reading returns
/// the same handle; writing returns the next version.
pub struct GraphHandle<T> {
    pub(crate) node: NodeId,
    _marker: PhantomData<T>,
}

impl<T> GraphHandle<T> {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for GraphHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHandle").field("node", &self.node).finish()
    }
}

impl<T> Clone for GraphHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for GraphHandle<T> {}

impl<T> PartialEq for GraphHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
impl<T> Eq for GraphHandle<T> {}

pub type TextureHandle = GraphHandle<GraphTexture>;
pub type BufferHandle = GraphHandle<GraphBuffer>;

#[derive(Debug, Clone)]
pub(crate) enum ResourceInfo {
    Texture(TextureCreateInfo),
    Buffer(BufferCreateInfo),
}

#[derive(Debug, Copy, Clone)]
pub(crate) enum ImportedResource {
    Texture(crate::handle::TextureHandle),
    Buffer(crate::handle::BufferHandle),
}

/// One version of a virtual resource. Writes produce a fresh node whose
/// `parent` is the previous version; all versions share the `root` node,
/// which is what gets realized to a physical resource.
pub(crate) struct ResourceNode {
    pub name: String,
    pub dep_node: NodeId,
    pub info: ResourceInfo,
    /// Pre-existing physical resource, plus its access when entering the
    /// graph. `None` for transients.
    pub imported: Option<(ImportedResource, AccessFlags)>,
    /// Pass that created the first version; `None` for imports.
    pub creator: Option<usize>,
    /// Pass that produced this version; `None` for version zero of a
    /// created or imported resource.
    pub writer: Option<usize>,
    pub parent: Option<NodeId>,
    pub version: u32,
    /// Dependency node of version zero; physical identity.
    pub root: NodeId,
}
