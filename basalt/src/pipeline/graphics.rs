use std::ffi::CStr;

use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;
use crate::format::TextureFormat;
use crate::handle::{HandleKind, HandleType, ShaderHandle};
use crate::types::{
    ColorWriteMask, CompareOp, CullingMode, FrontFace, PolygonMode, PrimitiveType, SampleCount,
};

const SHADER_ENTRY: &CStr = c"main";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SourceColor,
    OneMinusSourceColor,
    DestinationColor,
    OneMinusDestinationColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlendDesc {
    pub color_op: BlendOp,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub alpha_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RasterizerDesc {
    pub polygon_mode: PolygonMode,
    pub front_face: FrontFace,
    /// Initial mode only; the decoder drives it dynamically.
    pub culling_mode: CullingMode,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DepthStencilDesc {
    pub format: TextureFormat,
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare_op: CompareOp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ColorBlendDesc {
    pub format: TextureFormat,
    pub blend: Option<BlendDesc>,
    pub write_mask: ColorWriteMask,
}

#[derive(Debug, Clone)]
pub struct GraphicsPipelineCreateInfo {
    pub name: String,
    pub vertex_shader: ShaderHandle,
    pub fragment_shader: ShaderHandle,
    pub primitive_type: PrimitiveType,
    pub rasterizer: RasterizerDesc,
    pub depth_stencil: Option<DepthStencilDesc>,
    pub color_attachments: Vec<ColorBlendDesc>,
    pub sample_count: SampleCount,
}

pub(crate) fn map_culling_mode(culling_mode: CullingMode) -> vk::CullModeFlags {
    match culling_mode {
        CullingMode::None => vk::CullModeFlags::NONE,
        CullingMode::Front => vk::CullModeFlags::FRONT,
        CullingMode::Back => vk::CullModeFlags::BACK,
        CullingMode::FrontBack => vk::CullModeFlags::FRONT_AND_BACK,
    }
}

pub(crate) fn map_compare_op(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

fn map_blend_factor(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SourceColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::OneMinusSourceColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::DestinationColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::OneMinusDestinationColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SourceAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSourceAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DestinationAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDestinationAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
    }
}

fn map_blend_op(op: BlendOp) -> vk::BlendOp {
    match op {
        BlendOp::Add => vk::BlendOp::ADD,
        BlendOp::Subtract => vk::BlendOp::SUBTRACT,
        BlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOp::Min => vk::BlendOp::MIN,
        BlendOp::Max => vk::BlendOp::MAX,
    }
}

fn map_color_write_mask(mask: ColorWriteMask) -> vk::ColorComponentFlags {
    let mut flags = vk::ColorComponentFlags::empty();
    if mask.contains(ColorWriteMask::RED) {
        flags |= vk::ColorComponentFlags::R;
    }
    if mask.contains(ColorWriteMask::GREEN) {
        flags |= vk::ColorComponentFlags::G;
    }
    if mask.contains(ColorWriteMask::BLUE) {
        flags |= vk::ColorComponentFlags::B;
    }
    if mask.contains(ColorWriteMask::ALPHA) {
        flags |= vk::ColorComponentFlags::A;
    }
    flags
}

pub struct GraphicsPipeline {
    pipeline: vk::Pipeline,
    device: LogicalDevice,
}

unsafe impl Send for GraphicsPipeline {}
unsafe impl Sync for GraphicsPipeline {}

impl HandleKind for GraphicsPipeline {
    const HANDLE_TYPE: HandleType = HandleType::GraphicsPipeline;
}

impl GraphicsPipeline {
    /// Builds a dynamic-rendering pipeline against the bindless layout.
    /// Viewport, scissor and cull mode are dynamic; the decoder sets them.
    pub fn new(
        device: LogicalDevice,
        pipeline_layout: vk::PipelineLayout,
        pipeline_cache: vk::PipelineCache,
        vertex_module: vk::ShaderModule,
        fragment_module: vk::ShaderModule,
        create_info: &GraphicsPipelineCreateInfo,
    ) -> Result<Self> {
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(SHADER_ENTRY),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(SHADER_ENTRY),
        ];

        // All geometry is pulled from bindless buffers; no vertex input
        // state exists.
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default().topology(
            match create_info.primitive_type {
                PrimitiveType::Point => vk::PrimitiveTopology::POINT_LIST,
                PrimitiveType::Lines => vk::PrimitiveTopology::LINE_LIST,
                PrimitiveType::Triangle => vk::PrimitiveTopology::TRIANGLE_LIST,
            },
        );

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(match create_info.rasterizer.polygon_mode {
                PolygonMode::Fill => vk::PolygonMode::FILL,
                PolygonMode::Line => vk::PolygonMode::LINE,
                PolygonMode::Point => vk::PolygonMode::POINT,
            })
            .cull_mode(map_culling_mode(create_info.rasterizer.culling_mode))
            .front_face(match create_info.rasterizer.front_face {
                FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
                FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            })
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(crate::resource::texture::map_sample_count(
                create_info.sample_count,
            ));

        let depth_stencil = match &create_info.depth_stencil {
            Some(desc) => vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(desc.depth_test)
                .depth_write_enable(desc.depth_write)
                .depth_compare_op(map_compare_op(desc.compare_op)),
            None => vk::PipelineDepthStencilStateCreateInfo::default(),
        };

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = create_info
            .color_attachments
            .iter()
            .map(|attachment| {
                let mut state = vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(map_color_write_mask(attachment.write_mask));
                if let Some(blend) = &attachment.blend {
                    state = state
                        .blend_enable(true)
                        .color_blend_op(map_blend_op(blend.color_op))
                        .src_color_blend_factor(map_blend_factor(blend.src_color))
                        .dst_color_blend_factor(map_blend_factor(blend.dst_color))
                        .alpha_blend_op(map_blend_op(blend.alpha_op))
                        .src_alpha_blend_factor(map_blend_factor(blend.src_alpha))
                        .dst_alpha_blend_factor(map_blend_factor(blend.dst_alpha));
                }
                state
            })
            .collect();
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::CULL_MODE,
        ];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let color_formats: Vec<vk::Format> = create_info
            .color_attachments
            .iter()
            .map(|attachment| attachment.format.to_vk())
            .collect();
        let mut rendering_info =
            vk::PipelineRenderingCreateInfo::default().color_attachment_formats(&color_formats);
        if let Some(desc) = &create_info.depth_stencil {
            rendering_info = rendering_info.depth_attachment_format(desc.format.to_vk());
        }

        let pipeline_ci = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .push_next(&mut rendering_info);

        let pipeline = unsafe {
            device
                .get_handle()
                .create_graphics_pipelines(pipeline_cache, &[pipeline_ci], None)
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

impl Drop for GraphicsPipeline {
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
