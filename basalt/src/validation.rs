use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;

use crate::command::barrier::{is_layout_allowed, map_access_flags_to_image_layout};
use crate::command::encoder::Command;
use crate::command::{PresentInfo, SubmitInfo};
use crate::device::Device;
use crate::handle::{
    BufferHandle, ComputePipelineHandle, GraphicsPipelineHandle, SamplerHandle, ShaderHandle,
    SwapchainHandle, TextureHandle, TextureViewHandle,
};
use crate::pipeline::{ComputePipelineCreateInfo, GraphicsPipelineCreateInfo};
use crate::resource::{
    BufferCreateInfo, SamplerCreateInfo, ShaderCreateInfo, SwapchainCreateInfo,
    TextureCreateInfo, TextureViewCreateInfo,
};
use crate::resource::texture::patch_texture_usage;
use crate::types::{
    AccessFlags, AttachmentTexture, BufferUpdateRegion, ShaderStage, SwapchainStatus,
    TextureAspect, TextureUsage,
};

pub(crate) fn validate_buffer_create_info(create_info: &BufferCreateInfo) {
    assert!(create_info.size > 0, "`create_info.size` must be greater than `0`!");
}

pub(crate) fn validate_texture_create_info(create_info: &TextureCreateInfo) {
    let aspect = create_info.format.desc().aspect;
    assert!(
        !(aspect.intersects(TextureAspect::DEPTH | TextureAspect::STENCIL)
            && create_info.usage.intersects(TextureUsage::COLOR_ATTACHMENT)),
        "Depth/stencil formats cannot be used with `TextureUsage::COLOR_ATTACHMENT`!"
    );
    assert!(
        !(aspect.intersects(TextureAspect::COLOR)
            && create_info
                .usage
                .intersects(TextureUsage::DEPTH_ATTACHMENT | TextureUsage::STENCIL_ATTACHMENT)),
        "Color formats cannot be used with `TextureUsage::DEPTH_ATTACHMENT | TextureUsage::STENCIL_ATTACHMENT`!"
    );

    let extent = create_info.kind.extent();
    assert!(extent.width > 0, "Texture width must be bigger than 0.");
    assert!(extent.height > 0, "Texture height must be bigger than 0.");
}

pub(crate) fn validate_shader_create_info(create_info: &ShaderCreateInfo) {
    assert!(
        create_info.stage != ShaderStage::Invalid,
        "`create_info.stage` must not be equal to `ShaderStage::Invalid`!"
    );
    assert!(
        !create_info.spirv.is_empty(),
        "`create_info.spirv` must not be empty!"
    );
    assert!(
        create_info.spirv.len() % 4 == 0,
        "`create_info.spirv` must be aligned to 4 bytes!"
    );
}

/// Pre-submit, GPU-state-free invariant checks. Wraps a [`Device`] and
/// delegates after validating against shadow copies of the create infos.
/// Violations panic: they are caller bugs, not runtime conditions.
pub struct ValidationDevice {
    device: Device,
    buffers: RwLock<HashMap<u64, BufferCreateInfo>>,
    textures: RwLock<HashMap<u64, TextureCreateInfo>>,
    graphics_pipelines: RwLock<HashMap<u64, GraphicsPipelineCreateInfo>>,
    compute_pipelines: RwLock<HashMap<u64, ComputePipelineCreateInfo>>,
}

impl ValidationDevice {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            buffers: RwLock::new(HashMap::new()),
            textures: RwLock::new(HashMap::new()),
            graphics_pipelines: RwLock::new(HashMap::new()),
            compute_pipelines: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &Device {
        &self.device
    }

    pub fn into_inner(self) -> Device {
        self.device
    }

    fn attachment_usage(&self, attachment: &AttachmentTexture) -> Option<TextureUsage> {
        match attachment {
            AttachmentTexture::Texture(handle) => self
                .textures
                .read()
                .unwrap()
                .get(&handle.handle().id())
                .map(|create_info| patch_texture_usage(create_info.usage)),
            // Views inherit the parent texture's usage; the device checks
            // again at decode time.
            AttachmentTexture::TextureView(_) => None,
        }
    }

    fn check_attachment(&self, attachment: &AttachmentTexture, access: AccessFlags) {
        match attachment {
            AttachmentTexture::Texture(handle) => {
                assert!(!handle.is_null(), "render pass attachment is a null handle")
            }
            AttachmentTexture::TextureView(handle) => {
                assert!(!handle.is_null(), "render pass attachment is a null handle")
            }
        }
        if let Some(usage) = self.attachment_usage(attachment) {
            let layout = map_access_flags_to_image_layout(access);
            assert!(
                is_layout_allowed(layout, usage),
                "{layout:?} is not allowed with: {usage:?}."
            );
        }
    }

    fn validate_encoder(&self, encoder: &crate::command::CommandEncoder) {
        for command in encoder.commands() {
            match command {
                Command::PushConstants { ubo_buffer, .. } => {
                    assert!(!ubo_buffer.is_null(), "push constant buffer is null");
                }
                Command::BindGraphicsPipeline { pipeline } => {
                    assert!(!pipeline.is_null(), "bound graphics pipeline is null");
                }
                Command::BindIndexBuffer { buffer, .. } => {
                    assert!(!buffer.is_null(), "bound index buffer is null");
                }
                Command::BeginRenderPass { render_pass, .. } => {
                    for attachment in &render_pass.color_attachments {
                        self.check_attachment(&attachment.texture, attachment.texture_access);
                        if let Some(resolve) = &attachment.resolve_texture {
                            self.check_attachment(&resolve.texture, resolve.texture_access);
                        }
                    }
                    if let Some(depth_stencil) = &render_pass.depth_stencil_attachment {
                        self.check_attachment(
                            &depth_stencil.texture,
                            depth_stencil.texture_access,
                        );
                    }
                }
                Command::DrawIndexedIndirect { buffer, .. } => {
                    assert!(!buffer.is_null(), "indirect buffer is null");
                }
                Command::DrawIndexedIndirectCount {
                    buffer,
                    count_buffer,
                    ..
                } => {
                    assert!(!buffer.is_null(), "indirect buffer is null");
                    assert!(!count_buffer.is_null(), "indirect count buffer is null");
                }
                Command::Dispatch { pipeline, .. }
                | Command::DispatchIndirect { pipeline, .. } => {
                    assert!(!pipeline.is_null(), "dispatched compute pipeline is null");
                }
                Command::BufferCopy { src, dst, .. } => {
                    assert!(!src.is_null() && !dst.is_null(), "copy handle is null");
                }
                Command::TextureCopy { src, dst, .. } => {
                    assert!(!src.is_null() && !dst.is_null(), "copy handle is null");
                }
                Command::BufferTextureCopy { src, dst, .. } => {
                    assert!(!src.is_null() && !dst.is_null(), "copy handle is null");
                }
                Command::TextureBufferCopy { src, dst, .. } => {
                    assert!(!src.is_null() && !dst.is_null(), "copy handle is null");
                }
                Command::TextureBarrier { barriers } => {
                    for barrier in barriers {
                        assert!(!barrier.texture.is_null(), "barrier texture is null");
                    }
                }
                Command::BufferBarrier { barriers } => {
                    for barrier in barriers {
                        assert!(!barrier.buffer.is_null(), "barrier buffer is null");
                    }
                }
                _ => {}
            }
        }
    }

    pub fn submit(
        &self,
        submit_infos: Vec<SubmitInfo>,
        present_infos: Vec<PresentInfo>,
    ) -> SwapchainStatus {
        for submit_info in &submit_infos {
            for encoder in &submit_info.encoders {
                self.validate_encoder(encoder);
            }
        }
        for present_info in &present_infos {
            assert!(!present_info.swapchain.is_null(), "present swapchain is null");
            assert!(!present_info.texture.is_null(), "present texture is null");
        }

        self.device.submit(submit_infos, present_infos)
    }

    pub fn create_swapchain(&self, create_info: SwapchainCreateInfo) -> Result<SwapchainHandle> {
        self.device.create_swapchain(create_info)
    }

    pub fn destroy_swapchain(&self, handle: SwapchainHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.device.destroy_swapchain(handle);
    }

    pub fn create_buffer(&self, create_info: BufferCreateInfo) -> Result<BufferHandle> {
        validate_buffer_create_info(&create_info);

        let handle = self.device.create_buffer(create_info.clone())?;

        let mut buffers = self.buffers.write().unwrap();
        assert!(!buffers.contains_key(&handle.handle().id()));
        buffers.insert(handle.handle().id(), create_info);

        Ok(handle)
    }

    pub fn update_buffer(&self, handle: BufferHandle, regions: &[BufferUpdateRegion]) {
        self.device.update_buffer(handle, regions);
    }

    pub fn destroy_buffer(&self, handle: BufferHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");

        let mut buffers = self.buffers.write().unwrap();
        assert!(buffers.remove(&handle.handle().id()).is_some());

        self.device.destroy_buffer(handle);
    }

    pub fn create_texture(&self, create_info: TextureCreateInfo) -> Result<TextureHandle> {
        validate_texture_create_info(&create_info);

        let handle = self.device.create_texture(create_info.clone())?;

        let mut textures = self.textures.write().unwrap();
        assert!(!textures.contains_key(&handle.handle().id()));
        textures.insert(handle.handle().id(), create_info);

        Ok(handle)
    }

    pub fn destroy_texture(&self, handle: TextureHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");

        let mut textures = self.textures.write().unwrap();
        assert!(textures.remove(&handle.handle().id()).is_some());

        self.device.destroy_texture(handle);
    }

    pub fn create_texture_view(
        &self,
        create_info: TextureViewCreateInfo,
    ) -> Result<TextureViewHandle> {
        assert!(!create_info.texture.is_null(), "view parent texture is null");
        self.device.create_texture_view(create_info)
    }

    pub fn destroy_texture_view(&self, handle: TextureViewHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.device.destroy_texture_view(handle);
    }

    pub fn create_shader(&self, create_info: ShaderCreateInfo) -> Result<ShaderHandle> {
        validate_shader_create_info(&create_info);
        self.device.create_shader(create_info)
    }

    pub fn destroy_shader(&self, handle: ShaderHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.device.destroy_shader(handle);
    }

    pub fn create_graphics_pipeline(
        &self,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<GraphicsPipelineHandle> {
        assert!(!create_info.vertex_shader.is_null(), "vertex shader is null");
        assert!(
            !create_info.fragment_shader.is_null(),
            "fragment shader is null"
        );

        let handle = self.device.create_graphics_pipeline(create_info.clone())?;

        let mut graphics_pipelines = self.graphics_pipelines.write().unwrap();
        assert!(!graphics_pipelines.contains_key(&handle.id()));
        graphics_pipelines.insert(handle.id(), create_info);

        Ok(handle)
    }

    pub fn destroy_graphics_pipeline(&self, handle: GraphicsPipelineHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");

        let mut graphics_pipelines = self.graphics_pipelines.write().unwrap();
        assert!(graphics_pipelines.remove(&handle.id()).is_some());

        self.device.destroy_graphics_pipeline(handle);
    }

    pub fn create_compute_pipeline(
        &self,
        create_info: ComputePipelineCreateInfo,
    ) -> Result<ComputePipelineHandle> {
        assert!(
            !create_info.compute_shader.is_null(),
            "compute shader is null"
        );

        let handle = self.device.create_compute_pipeline(create_info.clone())?;

        let mut compute_pipelines = self.compute_pipelines.write().unwrap();
        assert!(!compute_pipelines.contains_key(&handle.id()));
        compute_pipelines.insert(handle.id(), create_info);

        Ok(handle)
    }

    pub fn destroy_compute_pipeline(&self, handle: ComputePipelineHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");

        let mut compute_pipelines = self.compute_pipelines.write().unwrap();
        assert!(compute_pipelines.remove(&handle.id()).is_some());

        self.device.destroy_compute_pipeline(handle);
    }

    pub fn create_sampler(&self, create_info: SamplerCreateInfo) -> Result<SamplerHandle> {
        self.device.create_sampler(create_info)
    }

    pub fn destroy_sampler(&self, handle: SamplerHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.device.destroy_sampler(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextureFormat;
    use crate::types::{MemoryType, SampleCount, TextureKind, TextureTiling};

    fn texture_info(format: TextureFormat, usage: TextureUsage) -> TextureCreateInfo {
        TextureCreateInfo {
            name: String::new(),
            kind: TextureKind::Texture2D {
                width: 4,
                height: 4,
                num_layers: 1,
                num_mips: 1,
                sample_count: SampleCount::Count1,
            },
            format,
            usage,
            tiling: TextureTiling::Optimal,
            memory_type: MemoryType::Gpu,
        }
    }

    #[test]
    #[should_panic]
    fn test_depth_format_rejected_as_color_attachment() {
        validate_texture_create_info(&texture_info(
            TextureFormat::D32Float,
            TextureUsage::COLOR_ATTACHMENT,
        ));
    }

    #[test]
    #[should_panic]
    fn test_color_format_rejected_as_depth_attachment() {
        validate_texture_create_info(&texture_info(
            TextureFormat::R8G8B8A8Unorm,
            TextureUsage::DEPTH_ATTACHMENT,
        ));
    }

    #[test]
    #[should_panic]
    fn test_zero_extent_rejected() {
        let mut create_info =
            texture_info(TextureFormat::R8G8B8A8Unorm, TextureUsage::SRV);
        create_info.kind = TextureKind::Texture2D {
            width: 0,
            height: 4,
            num_layers: 1,
            num_mips: 1,
            sample_count: SampleCount::Count1,
        };
        validate_texture_create_info(&create_info);
    }

    #[test]
    fn test_valid_texture_accepted() {
        validate_texture_create_info(&texture_info(
            TextureFormat::R8G8B8A8Unorm,
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::SRV,
        ));
        validate_texture_create_info(&texture_info(
            TextureFormat::D24UnormS8Uint,
            TextureUsage::DEPTH_ATTACHMENT | TextureUsage::STENCIL_ATTACHMENT,
        ));
    }

    #[test]
    #[should_panic]
    fn test_zero_sized_buffer_rejected() {
        validate_buffer_create_info(&BufferCreateInfo {
            name: String::new(),
            size: 0,
            usage: crate::types::BufferUsage::SRV,
            memory_type: MemoryType::Gpu,
        });
    }

    #[test]
    #[should_panic]
    fn test_misaligned_spirv_rejected() {
        validate_shader_create_info(&ShaderCreateInfo {
            name: String::new(),
            stage: ShaderStage::Vertex,
            spirv: vec![0u8; 7],
        });
    }

    #[test]
    #[should_panic]
    fn test_invalid_shader_stage_rejected() {
        validate_shader_create_info(&ShaderCreateInfo {
            name: String::new(),
            stage: ShaderStage::Invalid,
            spirv: vec![0u8; 8],
        });
    }

    #[test]
    fn test_valid_shader_accepted() {
        validate_shader_create_info(&ShaderCreateInfo {
            name: String::new(),
            stage: ShaderStage::Compute,
            spirv: vec![0u8; 16],
        });
    }
}
