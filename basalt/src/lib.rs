pub mod allocator;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod format;
pub mod graph;
pub mod handle;
pub mod pipeline;
pub mod resource;
pub mod sync;
pub mod tracker;
pub mod types;
pub mod util;
pub mod validation;

pub use command::{CommandEncoder, PresentInfo, SubmitInfo};
pub use device::{Device, DeviceCreateInfo};
pub use error::{BasaltError, HandleError};
pub use graph::{FrameGraph, TransientResourcePool};
pub use handle::{
    BufferHandle, ComputePipelineHandle, GraphicsPipelineHandle, SamplerHandle, ShaderHandle,
    SwapchainHandle, TextureHandle, TextureViewHandle,
};
pub use validation::ValidationDevice;

// Re-exports
pub use ash;
pub use ash_window;
pub use glam;
pub use gpu_allocator;
pub use raw_window_handle;
