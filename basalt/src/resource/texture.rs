use std::sync::Arc;

use anyhow::Result;
use ash::vk;
use derivative::Derivative;

use crate::allocator::{DeviceAllocation, DeviceAllocator};
use crate::device::LogicalDevice;
use crate::format::{map_texture_aspect, TextureFormat};
use crate::handle::{HandleKind, HandleType};
use crate::types::{
    Extent, MemoryType, SampleCount, TextureKind, TextureTiling, TextureUsage,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureCreateInfo {
    pub name: String,
    pub kind: TextureKind,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub tiling: TextureTiling,
    pub memory_type: MemoryType,
}

/// Presentable textures get blitted from, and attachments end up sampled by
/// later passes, so the declared usage is widened before translation.
pub(crate) fn patch_texture_usage(mut usage: TextureUsage) -> TextureUsage {
    if usage.contains(TextureUsage::PRESENT) {
        usage |= TextureUsage::TRANSFER_SRC;
    }
    if usage.intersects(
        TextureUsage::COLOR_ATTACHMENT
            | TextureUsage::DEPTH_ATTACHMENT
            | TextureUsage::STENCIL_ATTACHMENT,
    ) {
        usage |= TextureUsage::SRV;
    }
    usage
}

pub(crate) fn map_texture_usage(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.intersects(TextureUsage::DEPTH_ATTACHMENT | TextureUsage::STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsage::SRV) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::UAV) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(TextureUsage::TRANSFER_SRC) || usage.contains(TextureUsage::PRESENT) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(TextureUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn map_sample_count(sample_count: SampleCount) -> vk::SampleCountFlags {
    match sample_count {
        SampleCount::Count1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::Count2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::Count4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::Count8 => vk::SampleCountFlags::TYPE_8,
    }
}

pub(crate) fn map_extent(extent: Extent) -> vk::Extent3D {
    vk::Extent3D {
        width: extent.width,
        height: extent.height,
        depth: extent.depth,
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Texture {
    image: vk::Image,
    image_view: vk::ImageView,
    device: LogicalDevice,
    #[derivative(Debug = "ignore")]
    allocator: Arc<DeviceAllocator>,
    #[derivative(Debug = "ignore")]
    allocation: Option<DeviceAllocation>,
    kind: TextureKind,
    format: TextureFormat,
    usage: TextureUsage,
    name: String,
}

unsafe impl Send for Texture {}
unsafe impl Sync for Texture {}

impl HandleKind for Texture {
    const HANDLE_TYPE: HandleType = HandleType::Texture;
}

impl Texture {
    pub fn new(
        device: LogicalDevice,
        allocator: Arc<DeviceAllocator>,
        create_info: &TextureCreateInfo,
    ) -> Result<Self> {
        let usage = patch_texture_usage(create_info.usage);

        let (image_type, view_type, create_flags) = match create_info.kind {
            TextureKind::Texture1D { .. } => (
                vk::ImageType::TYPE_1D,
                vk::ImageViewType::TYPE_1D,
                vk::ImageCreateFlags::empty(),
            ),
            TextureKind::Texture2D { num_layers, .. } => (
                vk::ImageType::TYPE_2D,
                if num_layers > 1 {
                    vk::ImageViewType::TYPE_2D_ARRAY
                } else {
                    vk::ImageViewType::TYPE_2D
                },
                vk::ImageCreateFlags::empty(),
            ),
            TextureKind::Texture3D { .. } => (
                vk::ImageType::TYPE_3D,
                vk::ImageViewType::TYPE_3D,
                vk::ImageCreateFlags::empty(),
            ),
            TextureKind::TextureCube { .. } => (
                vk::ImageType::TYPE_2D,
                vk::ImageViewType::CUBE,
                vk::ImageCreateFlags::CUBE_COMPATIBLE,
            ),
        };

        let image_ci = vk::ImageCreateInfo::default()
            .flags(create_flags)
            .image_type(image_type)
            .format(create_info.format.to_vk())
            .extent(map_extent(create_info.kind.extent()))
            .mip_levels(create_info.kind.num_mips())
            .array_layers(create_info.kind.num_layers())
            .samples(map_sample_count(create_info.kind.sample_count()))
            .tiling(match create_info.tiling {
                TextureTiling::Optimal => vk::ImageTiling::OPTIMAL,
                TextureTiling::Linear => vk::ImageTiling::LINEAR,
            })
            .usage(map_texture_usage(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.get_handle().create_image(&image_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkImage {:?}", image);

        let requirements =
            unsafe { device.get_handle().get_image_memory_requirements(image) };
        let allocation = allocator.allocate(
            &create_info.name,
            requirements,
            create_info.memory_type,
            create_info.tiling == TextureTiling::Linear,
        )?;
        unsafe {
            device.get_handle().bind_image_memory(
                image,
                allocation.memory(),
                allocation.offset(),
            )?;
        }

        let image_view_ci = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(view_type)
            .format(create_info.format.to_vk())
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(map_texture_aspect(create_info.format.desc().aspect))
                    .base_mip_level(0)
                    .level_count(create_info.kind.num_mips())
                    .base_array_layer(0)
                    .layer_count(create_info.kind.num_layers()),
            );
        let image_view =
            unsafe { device.get_handle().create_image_view(&image_view_ci, None)? };

        if !create_info.name.is_empty() {
            device.set_object_name(image, &create_info.name);
            device.set_object_name(
                image_view,
                &format!("{} | Default image view", create_info.name),
            );
        }

        Ok(Self {
            image,
            image_view,
            device,
            allocator,
            allocation: Some(allocation),
            kind: create_info.kind,
            format: create_info.format,
            usage,
            name: create_info.name.clone(),
        })
    }

    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Default view covering the full subresource range.
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn extent(&self) -> Extent {
        self.kind.extent()
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Usage after patching; the value every layout check runs against.
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn num_mips(&self) -> u32 {
        self.kind.num_mips()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkImage {:?}", self.image);

        unsafe {
            self.device
                .get_handle()
                .destroy_image_view(self.image_view, None);
            self.device.get_handle().destroy_image(self.image, None);
        }
        if let Some(allocation) = self.allocation.take() {
            self.allocator.free(allocation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_usage_implies_transfer_src() {
        let patched = patch_texture_usage(TextureUsage::PRESENT);
        assert!(patched.contains(TextureUsage::TRANSFER_SRC));
    }

    #[test]
    fn test_attachment_usage_implies_srv() {
        let patched = patch_texture_usage(TextureUsage::COLOR_ATTACHMENT);
        assert!(patched.contains(TextureUsage::SRV));
        let patched = patch_texture_usage(TextureUsage::DEPTH_ATTACHMENT);
        assert!(patched.contains(TextureUsage::SRV));
    }
}
