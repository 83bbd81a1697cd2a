pub mod fence;
pub mod semaphore;

pub use fence::Fence;
pub use semaphore::{BinarySemaphore, TimelineSemaphore};
