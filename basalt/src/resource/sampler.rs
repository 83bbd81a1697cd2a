use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;
use crate::handle::{HandleKind, HandleType};
use crate::types::{SamplerAddressMode, SamplerFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerCreateInfo {
    pub name: String,
    pub mag_filter: SamplerFilter,
    pub min_filter: SamplerFilter,
    pub mip_filter: SamplerFilter,
    pub address_mode_u: SamplerAddressMode,
    pub address_mode_v: SamplerAddressMode,
    pub address_mode_w: SamplerAddressMode,
    pub max_anisotropy: Option<f32>,
}

fn map_filter(filter: SamplerFilter) -> vk::Filter {
    match filter {
        SamplerFilter::Nearest => vk::Filter::NEAREST,
        SamplerFilter::Linear => vk::Filter::LINEAR,
    }
}

fn map_address_mode(mode: SamplerAddressMode) -> vk::SamplerAddressMode {
    match mode {
        SamplerAddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        SamplerAddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        SamplerAddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        SamplerAddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        SamplerAddressMode::MirrorClampToEdge => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
    }
}

pub struct Sampler {
    handle: vk::Sampler,
    device: LogicalDevice,
}

unsafe impl Send for Sampler {}
unsafe impl Sync for Sampler {}

impl HandleKind for Sampler {
    const HANDLE_TYPE: HandleType = HandleType::Sampler;
}

impl Sampler {
    pub fn new(device: LogicalDevice, create_info: &SamplerCreateInfo) -> Result<Self> {
        let sampler_ci = vk::SamplerCreateInfo::default()
            .mag_filter(map_filter(create_info.mag_filter))
            .min_filter(map_filter(create_info.min_filter))
            .mipmap_mode(match create_info.mip_filter {
                SamplerFilter::Nearest => vk::SamplerMipmapMode::NEAREST,
                SamplerFilter::Linear => vk::SamplerMipmapMode::LINEAR,
            })
            .address_mode_u(map_address_mode(create_info.address_mode_u))
            .address_mode_v(map_address_mode(create_info.address_mode_v))
            .address_mode_w(map_address_mode(create_info.address_mode_w))
            .anisotropy_enable(create_info.max_anisotropy.is_some())
            .max_anisotropy(create_info.max_anisotropy.unwrap_or(1.0))
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        let handle = unsafe { device.get_handle().create_sampler(&sampler_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSampler {:?}", handle);

        if !create_info.name.is_empty() {
            device.set_object_name(handle, &create_info.name);
        }

        Ok(Self { handle, device })
    }

    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSampler {:?}", self.handle);

        unsafe {
            self.device.get_handle().destroy_sampler(self.handle, None);
        }
    }
}
