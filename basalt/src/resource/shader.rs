use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;
use crate::handle::{HandleKind, HandleType};
use crate::types::ShaderStage;

#[derive(Debug, Clone)]
pub struct ShaderCreateInfo {
    pub name: String,
    pub stage: ShaderStage,
    /// SPIR-V bytes. Length must be a multiple of 4; validation rejects
    /// anything else before this type is constructed.
    pub spirv: Vec<u8>,
}

pub struct Shader {
    module: vk::ShaderModule,
    stage: ShaderStage,
    device: LogicalDevice,
}

unsafe impl Send for Shader {}
unsafe impl Sync for Shader {}

impl HandleKind for Shader {
    const HANDLE_TYPE: HandleType = HandleType::Shader;
}

impl Shader {
    pub fn new(device: LogicalDevice, create_info: &ShaderCreateInfo) -> Result<Self> {
        assert!(
            create_info.spirv.len() % 4 == 0 && !create_info.spirv.is_empty(),
            "SPIR-V buffer must be non-empty and 4-byte aligned"
        );

        // The bytes may not be 4-byte aligned in memory; repack.
        let words: Vec<u32> = create_info
            .spirv
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let module = unsafe {
            device.get_handle().create_shader_module(
                &vk::ShaderModuleCreateInfo::default().code(&words),
                None,
            )?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkShaderModule {:?}", module);

        if !create_info.name.is_empty() {
            device.set_object_name(module, &create_info.name);
        }

        Ok(Self {
            module,
            stage: create_info.stage,
            device,
        })
    }

    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkShaderModule {:?}", self.module);

        unsafe {
            self.device
                .get_handle()
                .destroy_shader_module(self.module, None);
        }
    }
}
