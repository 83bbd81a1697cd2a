use bitflags::bitflags;
use glam::{IVec2, IVec4, UVec2, UVec4, Vec4};

use crate::handle::{BufferHandle, TextureHandle, TextureViewHandle};

/// Logical queues exposed by the device. Each maps onto a physical queue
/// family picked by [`QueueFamilies`](crate::device::QueueFamilies).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueueType {
    Graphics,
    /// Don't use the compute queue for small work. It's most likely not worth it.
    /// Use it for long async tasks and post-processing at the end of a frame.
    Compute,
    Transfer,
    Present,
}

impl QueueType {
    pub const ALL: [QueueType; 4] = [
        QueueType::Graphics,
        QueueType::Compute,
        QueueType::Transfer,
        QueueType::Present,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueueType::Graphics => "Graphics",
            QueueType::Compute => "Compute",
            QueueType::Transfer => "Transfer",
            QueueType::Present => "Present",
        }
    }
}

///
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemoryType {
    /// Device-local, not host visible.
    Gpu,
    /// Host visible, write-combined. CPU to GPU traffic.
    Upload,
    /// Host visible, cached. GPU to CPU traffic.
    Readback,
    /// Host visible, device local where available. Per-frame constants.
    Dynamic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub offset: IVec2,
    pub extent: UVec2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub rect: Rect,
    pub depth_min: f32,
    pub depth_max: f32,
}

pub type Scissor = Rect;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CullingMode {
    None,
    Front,
    Back,
    FrontBack,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Point,
    Lines,
    Triangle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SamplerAddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

/// Shader stages. `Invalid` is the default-initialized state and is rejected
/// by validation before a module is ever created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ShaderStage {
    #[default]
    Invalid,
    Vertex,
    Fragment,
    Compute,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SampleCount {
    Count1,
    Count2,
    Count4,
    Count8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureTiling {
    Optimal,
    Linear,
}

bitflags! {
    /// Resource access states used by barriers and the frame graph.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const NONE = 0;
        const INDIRECT_BUFFER = 1 << 0;
        const INDEX_BUFFER = 1 << 1;
        const VERTEX_BUFFER = 1 << 2;
        const SRV_GRAPHICS = 1 << 3;
        const SRV_COMPUTE = 1 << 4;
        const TRANSFER_READ = 1 << 5;
        const HOST_READ = 1 << 6;
        const COLOR_ATTACHMENT_READ = 1 << 7;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 8;
        const PRESENT = 1 << 9;
        const UAV_GRAPHICS = 1 << 10;
        const UAV_COMPUTE = 1 << 11;
        const TRANSFER_WRITE = 1 << 12;
        const HOST_WRITE = 1 << 13;
        const COLOR_ATTACHMENT_WRITE = 1 << 14;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 15;
    }
}

impl AccessFlags {
    const WRITE_MASK: AccessFlags = AccessFlags::UAV_GRAPHICS
        .union(AccessFlags::UAV_COMPUTE)
        .union(AccessFlags::TRANSFER_WRITE)
        .union(AccessFlags::HOST_WRITE)
        .union(AccessFlags::COLOR_ATTACHMENT_WRITE)
        .union(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE);

    pub fn is_write_access(&self) -> bool {
        self.intersects(Self::WRITE_MASK)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SRV = 1 << 2;
        const UAV = 1 << 3;
        const CBV = 1 << 4;
        const INDEX = 1 << 5;
        const VERTEX = 1 << 6;
        const INDIRECT = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct TextureUsage: u32 {
        const COLOR_ATTACHMENT = 1 << 0;
        const DEPTH_ATTACHMENT = 1 << 1;
        const STENCIL_ATTACHMENT = 1 << 2;
        const SRV = 1 << 3;
        const UAV = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
        const PRESENT = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct TextureAspect: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Pipeline stages a chained submit waits at.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct SynchronizationStage: u32 {
        const NONE = 0;
        const TOP_OF_PIPE = 1 << 0;
        const BOTTOM_OF_PIPE = 1 << 1;
        const EARLY_FRAGMENT_TESTS = 1 << 2;
        const LATE_FRAGMENT_TESTS = 1 << 3;
        const VERTEX_SHADER = 1 << 4;
        const FRAGMENT_SHADER = 1 << 5;
        const COMPUTE_SHADER = 1 << 6;
        const TRANSFER = 1 << 7;
        const ALL_GRAPHICS = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u32 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::all()
    }
}

/// Shape of a texture. Mip and layer counts ride along so one enum fully
/// describes the subresource space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture1D {
        width: u32,
        num_mips: u32,
    },
    Texture2D {
        width: u32,
        height: u32,
        num_layers: u32,
        num_mips: u32,
        sample_count: SampleCount,
    },
    Texture3D {
        width: u32,
        height: u32,
        depth: u32,
        num_mips: u32,
    },
    TextureCube {
        width: u32,
        height: u32,
        num_mips: u32,
    },
}

impl TextureKind {
    pub fn extent(&self) -> Extent {
        match *self {
            TextureKind::Texture1D { width, .. } => Extent::new(width, 1, 1),
            TextureKind::Texture2D { width, height, .. } => Extent::new(width, height, 1),
            TextureKind::Texture3D {
                width,
                height,
                depth,
                ..
            } => Extent::new(width, height, depth),
            TextureKind::TextureCube { width, height, .. } => Extent::new(width, height, 1),
        }
    }

    pub fn num_mips(&self) -> u32 {
        match *self {
            TextureKind::Texture1D { num_mips, .. }
            | TextureKind::Texture2D { num_mips, .. }
            | TextureKind::Texture3D { num_mips, .. }
            | TextureKind::TextureCube { num_mips, .. } => num_mips,
        }
    }

    pub fn num_layers(&self) -> u32 {
        match *self {
            TextureKind::Texture2D { num_layers, .. } => num_layers,
            TextureKind::TextureCube { .. } => 6,
            _ => 1,
        }
    }

    pub fn sample_count(&self) -> SampleCount {
        match *self {
            TextureKind::Texture2D { sample_count, .. } => sample_count,
            _ => SampleCount::Count1,
        }
    }
}

/// Full mip-chain length for `extent`. Multisampled textures always get a
/// single mip; Vulkan forbids anything else.
pub fn compute_num_mips(extent: Extent, sample_count: SampleCount) -> u32 {
    if sample_count != SampleCount::Count1 {
        return 1;
    }
    let largest = extent.width.max(extent.height).max(extent.depth).max(1);
    32 - largest.leading_zeros()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureSubresourceRange {
    pub first_mip_level: u32,
    pub mip_count: u32,
    pub first_layer: u32,
    pub layer_count: u32,
}

impl Default for TextureSubresourceRange {
    fn default() -> Self {
        Self {
            first_mip_level: 0,
            mip_count: 1,
            first_layer: 0,
            layer_count: 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureSubresourceLayers {
    pub mip_level: u32,
    pub first_layer: u32,
    pub layer_count: u32,
}

impl Default for TextureSubresourceLayers {
    fn default() -> Self {
        Self {
            mip_level: 0,
            first_layer: 0,
            layer_count: 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferSubresourceRange {
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferCopyRegion {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureCopyRegion {
    pub src_subresource: TextureSubresourceLayers,
    pub src_offset: Offset,
    pub dst_subresource: TextureSubresourceLayers,
    pub dst_offset: Offset,
    pub extent: Extent,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferTextureCopyRegion {
    pub buffer_offset: u64,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub texture_subresource: TextureSubresourceLayers,
    pub texture_extent: Extent,
}

#[derive(Debug, Clone)]
pub struct BufferUpdateRegion {
    pub data: Vec<u8>,
    pub dst_offset: u64,
}

/// Memory barrier between two access states. No resource attached.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlobalBarrier {
    pub previous_access: AccessFlags,
    pub next_access: AccessFlags,
}

/// Either both queues are set (ownership transfer) or neither is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureBarrier {
    pub texture: TextureHandle,
    pub previous_access: AccessFlags,
    pub next_access: AccessFlags,
    pub source_queue: Option<QueueType>,
    pub destination_queue: Option<QueueType>,
    pub subresource_range: TextureSubresourceRange,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferBarrier {
    pub buffer: BufferHandle,
    pub previous_access: AccessFlags,
    pub next_access: AccessFlags,
    pub source_queue: Option<QueueType>,
    pub destination_queue: Option<QueueType>,
    pub subresource_range: BufferSubresourceRange,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentLoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentStoreOp {
    Store,
    DontCare,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentOps {
    pub load: AttachmentLoadOp,
    pub store: AttachmentStoreOp,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClearValue {
    Color(Vec4),
    ColorInt(IVec4),
    ColorUint(UVec4),
}

/// Render pass attachments accept whole textures or subresource views.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachmentTexture {
    Texture(TextureHandle),
    TextureView(TextureViewHandle),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolveTexture {
    pub texture: AttachmentTexture,
    pub texture_access: AccessFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorAttachment {
    pub texture: AttachmentTexture,
    pub texture_access: AccessFlags,
    pub ops: AttachmentOps,
    pub clear_value: ClearValue,
    pub resolve_texture: Option<ResolveTexture>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilAttachment {
    pub texture: AttachmentTexture,
    pub texture_access: AccessFlags,
    pub ops: AttachmentOps,
    pub clear_value: DepthStencilClearValue,
    pub resolve_texture: Option<ResolveTexture>,
}

/// Dynamic-rendering pass description. No render pass objects exist;
/// attachments are specified per begin/end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPass {
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

/// The only per-draw parameter channel. Shaders chase `buffer_index` into
/// the bindless storage-buffer array and read their arguments at
/// `buffer_offset`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PushConstants {
    pub buffer_index: u32,
    pub buffer_offset: u32,
}

/// Swapchain health reported back from `submit`. Recreation on
/// `OutOfDate` is the consumer's job.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwapchainStatus {
    Optimal,
    Suboptimal,
    OutOfDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_num_mips_full_chain() {
        assert_eq!(
            compute_num_mips(Extent::new(1024, 512, 1), SampleCount::Count1),
            11
        );
        assert_eq!(compute_num_mips(Extent::new(1, 1, 1), SampleCount::Count1), 1);
        assert_eq!(
            compute_num_mips(Extent::new(16, 16, 1), SampleCount::Count1),
            5
        );
    }

    #[test]
    fn test_compute_num_mips_multisampled() {
        assert_eq!(
            compute_num_mips(Extent::new(1024, 1024, 1), SampleCount::Count4),
            1
        );
    }

    #[test]
    fn test_write_access_classification() {
        assert!(AccessFlags::COLOR_ATTACHMENT_WRITE.is_write_access());
        assert!(AccessFlags::UAV_COMPUTE.is_write_access());
        assert!(!AccessFlags::SRV_GRAPHICS.is_write_access());
        assert!(!(AccessFlags::INDEX_BUFFER | AccessFlags::INDIRECT_BUFFER).is_write_access());
    }

    #[test]
    fn test_texture_kind_accessors() {
        let kind = TextureKind::Texture2D {
            width: 128,
            height: 64,
            num_layers: 4,
            num_mips: 3,
            sample_count: SampleCount::Count1,
        };
        assert_eq!(kind.extent(), Extent::new(128, 64, 1));
        assert_eq!(kind.num_layers(), 4);
        assert_eq!(kind.num_mips(), 3);

        let cube = TextureKind::TextureCube {
            width: 32,
            height: 32,
            num_mips: 1,
        };
        assert_eq!(cube.num_layers(), 6);
    }
}
