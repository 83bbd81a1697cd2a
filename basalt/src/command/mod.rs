pub mod barrier;
pub mod decoder;
pub mod encoder;
pub mod pool;
pub mod scheduler;

pub use encoder::{Command, CommandEncoder};
pub use pool::{CommandBundle, CommandPoolManager};

use crate::handle::{SwapchainHandle, TextureHandle};
use crate::types::{AccessFlags, QueueType, SynchronizationStage};

/// One batch of encoders bound for a single queue. Submits in a `submit`
/// call execute in list order on the GPU; `synchronization_stage` is where
/// this batch waits on the previous one.
pub struct SubmitInfo {
    pub encoders: Vec<CommandEncoder>,
    pub synchronization_stage: SynchronizationStage,
    pub queue_type: QueueType,
}

/// Asks the scheduler to blit `texture` into `swapchain`'s next image and
/// present it after every submit of the frame.
#[derive(Debug, Copy, Clone)]
pub struct PresentInfo {
    pub swapchain: SwapchainHandle,
    pub texture: TextureHandle,
    pub texture_previous_access: AccessFlags,
}
