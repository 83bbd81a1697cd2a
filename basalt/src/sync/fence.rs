use anyhow::Result;
use ash::vk;

use crate::device::LogicalDevice;

#[derive(Debug)]
pub struct Fence {
    handle: vk::Fence,
    device: LogicalDevice,
}

impl Fence {
    pub fn new(device: LogicalDevice, flags: vk::FenceCreateFlags) -> Result<Self> {
        let handle = unsafe {
            device
                .get_handle()
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkFence {:?}", handle);

        Ok(Self { handle, device })
    }

    pub fn handle(&self) -> vk::Fence {
        self.handle
    }

    /// Waits on the fence. A hung GPU is fatal; callers pass `u64::MAX`.
    pub fn wait(&self, timeout: u64) {
        unsafe {
            self.device
                .get_handle()
                .wait_for_fences(&[self.handle], true, timeout)
                .expect("`wait_for_fences` failed");
        }
    }

    pub fn reset(&self) {
        unsafe {
            self.device
                .get_handle()
                .reset_fences(&[self.handle])
                .expect("`reset_fences` failed");
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkFence {:?}", self.handle);

        unsafe {
            self.device.get_handle().destroy_fence(self.handle, None);
        }
    }
}
