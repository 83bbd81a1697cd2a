pub mod buffer;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod texture;
pub mod texture_view;

pub use buffer::{Buffer, BufferCreateInfo};
pub use sampler::{Sampler, SamplerCreateInfo};
pub use shader::{Shader, ShaderCreateInfo};
pub use swapchain::{AcquiredImage, Swapchain, SwapchainCreateInfo};
pub use texture::{Texture, TextureCreateInfo};
pub use texture_view::{TextureView, TextureViewCreateInfo};
