use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Packed 64-bit resource handle.
///
/// | type   |                 index                  |   generation   |
/// |--------|----------------------------------------|----------------|
/// |   8    |                  40                    |       16       |
pub const INDEX_MASK: u64 = 0x00FF_FFFF_FFFF_0000;
pub const INDEX_SHIFT: u64 = 16;
pub const GENERATION_MASK: u64 = 0x0000_0000_0000_FFFF;
pub const GENERATION_SHIFT: u64 = 0;
pub const MAX_GENERATION: u64 = GENERATION_MASK;
pub const HANDLE_TYPE_MASK: u64 = 0xFF00_0000_0000_0000;
pub const HANDLE_TYPE_SHIFT: u64 = 56;
pub const NULL_HANDLE: u64 = INDEX_MASK | GENERATION_MASK;

/// Discriminant stamped into the top byte of every handle. Keeps ids unique
/// across the per-type handle tables, so a single resource tracker can key
/// on the raw id alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandleType {
    Buffer,
    Shader,
    ComputePipeline,
    GraphicsPipeline,
    Swapchain,
    Texture,
    TextureView,
    Sampler,
}

/// Implemented by every payload type stored in a handle table.
pub trait HandleKind {
    const HANDLE_TYPE: HandleType;
}

/// Typed generational handle over a [`HandleTable`](crate::util::HandleTable) slot.
pub struct Handle<T> {
    id: u64,
    _marker: PhantomData<T>,
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("generation", &self.generation())
            .finish()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: HandleKind> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: HandleKind> Handle<T> {
    pub fn new(index: u64, generation: u64) -> Self {
        debug_assert!(index < (INDEX_MASK >> INDEX_SHIFT));
        debug_assert!(generation < MAX_GENERATION);
        Self {
            id: ((T::HANDLE_TYPE as u64) << HANDLE_TYPE_SHIFT)
                | (index << INDEX_SHIFT)
                | (generation << GENERATION_SHIFT),
            _marker: PhantomData,
        }
    }

    pub fn null() -> Self {
        Self {
            id: ((T::HANDLE_TYPE as u64) << HANDLE_TYPE_SHIFT) | NULL_HANDLE,
            _marker: PhantomData,
        }
    }
}

impl<T> Handle<T> {
    /// Raw id including the type byte. Unique across every handle table.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn index(&self) -> u64 {
        (self.id & INDEX_MASK) >> INDEX_SHIFT
    }

    pub fn generation(&self) -> u64 {
        (self.id & GENERATION_MASK) >> GENERATION_SHIFT
    }

    pub fn handle_type(&self) -> u64 {
        (self.id & HANDLE_TYPE_MASK) >> HANDLE_TYPE_SHIFT
    }

    pub fn is_null(&self) -> bool {
        (self.id & !HANDLE_TYPE_MASK) == NULL_HANDLE
    }
}

unsafe impl<T> Send for Handle<T> {}
unsafe impl<T> Sync for Handle<T> {}

/// Bindless slot indices stamped onto a resource handle at creation time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BindableResource {
    pub srv: u32,
    pub uav: u32,
}

impl BindableResource {
    pub const INVALID_INDEX: u32 = u32::MAX;
}

impl Default for BindableResource {
    fn default() -> Self {
        Self {
            srv: Self::INVALID_INDEX,
            uav: Self::INVALID_INDEX,
        }
    }
}

/// A handle paired with its bindless slots. Handed out for every resource
/// kind shaders can index directly (buffers, textures, texture views,
/// samplers).
pub struct Bindable<T> {
    handle: Handle<T>,
    bindings: BindableResource,
}

impl<T> Debug for Bindable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindable")
            .field("handle", &self.handle)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl<T> Clone for Bindable<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Bindable<T> {}

impl<T> PartialEq for Bindable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.bindings == other.bindings
    }
}
impl<T> Eq for Bindable<T> {}

impl<T> Hash for Bindable<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: HandleKind> Default for Bindable<T> {
    fn default() -> Self {
        Self {
            handle: Handle::null(),
            bindings: BindableResource::default(),
        }
    }
}

impl<T> Bindable<T> {
    pub fn new(handle: Handle<T>, bindings: BindableResource) -> Self {
        Self { handle, bindings }
    }

    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    pub fn bindings(&self) -> BindableResource {
        self.bindings
    }

    /// Bindless index for shader-visible reads.
    pub fn srv(&self) -> u32 {
        self.bindings.srv
    }

    /// Bindless index for unordered access.
    pub fn uav(&self) -> u32 {
        self.bindings.uav
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }
}

unsafe impl<T> Send for Bindable<T> {}
unsafe impl<T> Sync for Bindable<T> {}

pub type BufferHandle = Bindable<crate::resource::Buffer>;
pub type TextureHandle = Bindable<crate::resource::Texture>;
pub type TextureViewHandle = Bindable<crate::resource::TextureView>;
pub type SamplerHandle = Bindable<crate::resource::Sampler>;

pub type ShaderHandle = Handle<crate::resource::Shader>;
pub type GraphicsPipelineHandle = Handle<crate::pipeline::GraphicsPipeline>;
pub type ComputePipelineHandle = Handle<crate::pipeline::ComputePipeline>;
pub type SwapchainHandle = Handle<crate::resource::Swapchain>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Payload;
    impl HandleKind for Payload {
        const HANDLE_TYPE: HandleType = HandleType::Texture;
    }

    #[test]
    fn test_pack_round_trip() {
        let handle: Handle<Payload> = Handle::new(1234, 56);
        assert_eq!(handle.index(), 1234);
        assert_eq!(handle.generation(), 56);
        assert_eq!(handle.handle_type(), HandleType::Texture as u64);
        assert!(!handle.is_null());
    }

    #[test]
    fn test_null_ignores_type_bits() {
        let handle: Handle<Payload> = Handle::null();
        assert!(handle.is_null());
        assert_eq!(handle.handle_type(), HandleType::Texture as u64);
    }

    #[test]
    fn test_equality_includes_generation() {
        let a: Handle<Payload> = Handle::new(7, 0);
        let b: Handle<Payload> = Handle::new(7, 1);
        assert_ne!(a, b);
        assert_eq!(a, Handle::new(7, 0));
    }
}
