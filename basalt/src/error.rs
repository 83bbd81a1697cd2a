use std::sync::PoisonError;

/// Possible errors
use thiserror::Error;

/// Errors returned by handle lookups. Everything else in this crate either
/// succeeds or panics; see the crate-level error policy.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HandleError {
    #[error("Handle is the null handle")]
    NullHandle,

    #[error("Handle generation does not match a live slot")]
    InvalidHandle,
}

#[derive(Debug, Error)]
pub enum BasaltError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error("Poisoned lock")]
    PoisonError,

    #[error("No suitable physical device has been found")]
    NoPhysicalDevice,

    #[error("Requested queue family does not exist on this device")]
    NoQueueFamily,

    #[error("Vulkan resource does not have a mapped pointer")]
    NoMappedPointer,

    #[error("Insufficient space to upload the data")]
    InsufficientSpace,

    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    #[error("Allocation error: {0}")]
    Allocation(#[from] gpu_allocator::AllocationError),
}

impl<T> From<PoisonError<T>> for BasaltError {
    fn from(_: PoisonError<T>) -> Self {
        BasaltError::PoisonError
    }
}
