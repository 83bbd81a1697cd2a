use std::mem;

use anyhow::Result;
use ash::vk;

use crate::config::MAX_DESCRIPTOR_COUNT;
use crate::device::LogicalDevice;
use crate::types::PushConstants;

pub const NUM_BINDLESS_SETS: usize = 4;

pub const SET_BUFFERS: usize = 0;
pub const SET_TEXTURES: usize = 1;
pub const SET_RW_TEXTURES: usize = 2;
pub const SET_SAMPLERS: usize = 3;

const SET_DESCRIPTOR_TYPES: [vk::DescriptorType; NUM_BINDLESS_SETS] = [
    vk::DescriptorType::STORAGE_BUFFER,
    vk::DescriptorType::SAMPLED_IMAGE,
    vk::DescriptorType::STORAGE_IMAGE,
    vk::DescriptorType::SAMPLER,
];

/// The one pipeline layout every pipeline is built against: four bindless
/// set layouts (binding 0, a `MAX_DESCRIPTOR_COUNT` array each) and an
/// 8-byte push-constant range. Shaders receive all per-draw parameters
/// through the push constants indirectly.
pub struct BindlessPipelineLayout {
    pipeline_layout: vk::PipelineLayout,
    set_layouts: [vk::DescriptorSetLayout; NUM_BINDLESS_SETS],
    device: LogicalDevice,
}

impl BindlessPipelineLayout {
    pub fn new(device: LogicalDevice) -> Result<Self> {
        let mut set_layouts = [vk::DescriptorSetLayout::null(); NUM_BINDLESS_SETS];
        for (layout, descriptor_type) in set_layouts.iter_mut().zip(SET_DESCRIPTOR_TYPES) {
            let binding = vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(descriptor_type)
                .descriptor_count(MAX_DESCRIPTOR_COUNT)
                .stage_flags(vk::ShaderStageFlags::ALL);
            let binding_flags = [vk::DescriptorBindingFlags::PARTIALLY_BOUND
                | vk::DescriptorBindingFlags::UPDATE_AFTER_BIND];
            let mut flags_ci = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default()
                .binding_flags(&binding_flags);

            let bindings = [binding];
            let layout_ci = vk::DescriptorSetLayoutCreateInfo::default()
                .flags(vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL)
                .bindings(&bindings)
                .push_next(&mut flags_ci);

            *layout = unsafe {
                device
                    .get_handle()
                    .create_descriptor_set_layout(&layout_ci, None)?
            };
        }

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::ALL)
            .offset(0)
            .size(mem::size_of::<PushConstants>() as u32);

        let ranges = [push_constant_range];
        let pipeline_layout_ci = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&ranges);

        let pipeline_layout = unsafe {
            device
                .get_handle()
                .create_pipeline_layout(&pipeline_layout_ci, None)?
        };

        Ok(Self {
            pipeline_layout,
            set_layouts,
            device,
        })
    }

    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout; NUM_BINDLESS_SETS] {
        &self.set_layouts
    }
}

impl Drop for BindlessPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .get_handle()
                .destroy_pipeline_layout(self.pipeline_layout, None);
            for layout in self.set_layouts {
                self.device
                    .get_handle()
                    .destroy_descriptor_set_layout(layout, None);
            }
        }
    }
}
