use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;

#[derive(Debug)]
pub struct BinarySemaphore {
    handle: vk::Semaphore,
    device: LogicalDevice,
}

impl BinarySemaphore {
    pub fn new(device: LogicalDevice) -> Result<Self> {
        let handle = unsafe {
            device
                .get_handle()
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSemaphore {:?}", handle);

        Ok(Self { handle, device })
    }

    pub fn handle(&self) -> vk::Semaphore {
        self.handle
    }
}

impl Drop for BinarySemaphore {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSemaphore {:?}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_semaphore(self.handle, None);
        }
    }
}

/// Timeline semaphore. Waiters name the counter value to wait on and
/// signalers the value to set; one of these chains every submit in a frame.
#[derive(Debug)]
pub struct TimelineSemaphore {
    handle: vk::Semaphore,
    device: LogicalDevice,
}

impl TimelineSemaphore {
    pub fn new(device: LogicalDevice, initial_value: u64) -> Result<Self> {
        let mut type_ci = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let handle = unsafe {
            device
                .get_handle()
                .create_semaphore(&vk::SemaphoreCreateInfo::default().push_next(&mut type_ci), None)?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating timeline VkSemaphore {:?}", handle);

        Ok(Self { handle, device })
    }

    pub fn handle(&self) -> vk::Semaphore {
        self.handle
    }

    pub fn current_value(&self) -> Result<u64> {
        Ok(unsafe {
            self.device
                .get_handle()
                .get_semaphore_counter_value(self.handle)?
        })
    }
}

impl Drop for TimelineSemaphore {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying timeline VkSemaphore {:?}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_semaphore(self.handle, None);
        }
    }
}
