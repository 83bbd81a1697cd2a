pub mod cache;
pub mod compute;
pub mod graphics;
pub mod layout;

pub use cache::PipelineCache;
pub use compute::{ComputePipeline, ComputePipelineCreateInfo};
pub use graphics::{
    ColorBlendDesc, DepthStencilDesc, GraphicsPipeline, GraphicsPipelineCreateInfo,
    RasterizerDesc,
};
pub use layout::BindlessPipelineLayout;
