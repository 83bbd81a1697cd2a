use std::ffi::CStr;

use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;
use crate::handle::{HandleKind, HandleType, ShaderHandle};

const SHADER_ENTRY: &CStr = c"main";

#[derive(Debug, Clone)]
pub struct ComputePipelineCreateInfo {
    pub name: String,
    pub compute_shader: ShaderHandle,
}

pub struct ComputePipeline {
    pipeline: vk::Pipeline,
    device: LogicalDevice,
}

unsafe impl Send for ComputePipeline {}
unsafe impl Sync for ComputePipeline {}

impl HandleKind for ComputePipeline {
    const HANDLE_TYPE: HandleType = HandleType::ComputePipeline;
}

impl ComputePipeline {
    pub fn new(
        device: LogicalDevice,
        pipeline_layout: vk::PipelineLayout,
        pipeline_cache: vk::PipelineCache,
        compute_module: vk::ShaderModule,
        create_info: &ComputePipelineCreateInfo,
    ) -> Result<Self> {
        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(compute_module)
            .name(SHADER_ENTRY);

        let pipeline_ci = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(pipeline_layout);

        let pipeline = unsafe {
            device
                .get_handle()
                .create_compute_pipelines(pipeline_cache, &[pipeline_ci], None)
                .map_err(|(_, error)| error)?[0]
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkPipeline {:?}", pipeline);

        if !create_info.name.is_empty() {
            device.set_object_name(pipeline, &create_info.name);
        }

        Ok(Self { pipeline, device })
    }

    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkPipeline {:?}", self.pipeline);

        unsafe {
            self.device
                .get_handle()
                .destroy_pipeline(self.pipeline, None);
        }
    }
}
