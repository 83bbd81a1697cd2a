use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;
use crate::format::{map_texture_aspect, TextureFormat};
use crate::handle::{HandleKind, HandleType, TextureHandle};
use crate::types::{TextureSubresourceRange, TextureUsage};

#[derive(Debug, Clone)]
pub struct TextureViewCreateInfo {
    pub name: String,
    pub texture: TextureHandle,
    pub subresource_range: TextureSubresourceRange,
}

/// A view over a subresource range of an existing texture. Carries its own
/// bindless slots; the parent texture must stay alive for as long as the
/// view is used (the tracker enforces this through per-frame references).
pub struct TextureView {
    image_view: vk::ImageView,
    device: LogicalDevice,
    usage: TextureUsage,
    format: TextureFormat,
    name: String,
}

unsafe impl Send for TextureView {}
unsafe impl Sync for TextureView {}

impl HandleKind for TextureView {
    const HANDLE_TYPE: HandleType = HandleType::TextureView;
}

impl TextureView {
    pub fn new(
        device: LogicalDevice,
        image: vk::Image,
        format: TextureFormat,
        usage: TextureUsage,
        layered: bool,
        create_info: &TextureViewCreateInfo,
    ) -> Result<Self> {
        let range = create_info.subresource_range;
        let image_view_ci = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(if layered || range.layer_count > 1 {
                vk::ImageViewType::TYPE_2D_ARRAY
            } else {
                vk::ImageViewType::TYPE_2D
            })
            .format(format.to_vk())
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(map_texture_aspect(format.desc().aspect))
                    .base_mip_level(range.first_mip_level)
                    .level_count(range.mip_count)
                    .base_array_layer(range.first_layer)
                    .layer_count(range.layer_count),
            );

        let image_view =
            unsafe { device.get_handle().create_image_view(&image_view_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkImageView {:?}", image_view);

        if !create_info.name.is_empty() {
            device.set_object_name(image_view, &create_info.name);
        }

        Ok(Self {
            image_view,
            device,
            usage,
            format,
            name: create_info.name.clone(),
        })
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TextureView {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkImageView {:?}", self.image_view);

        unsafe {
            self.device
                .get_handle()
                .destroy_image_view(self.image_view, None);
        }
    }
}
