use std::ffi::CString;
use std::sync::Arc;

use ash::vk;
use derivative::Derivative;

#[derive(Derivative)]
#[derivative(Debug)]
struct LogicalDeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    #[derivative(Debug = "ignore")]
    debug_utils: Option<ash::ext::debug_utils::Device>,
}

impl Drop for LogicalDeviceInner {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkDevice {:?}", self.handle.handle());

        unsafe {
            self.handle.destroy_device(None);
        }
    }
}

/// Clone-able wrapper over [`ash::Device`]. Every resource wrapper keeps a
/// clone, so the `VkDevice` is destroyed only after the last wrapper is
/// gone.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct LogicalDevice {
    #[derivative(Debug = "ignore")]
    inner: Arc<LogicalDeviceInner>,
}

impl PartialEq for LogicalDevice {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle.handle() == other.inner.handle.handle()
    }
}
impl Eq for LogicalDevice {}

impl LogicalDevice {
    pub fn new(
        instance: &ash::Instance,
        handle: ash::Device,
        enable_debug_utils: bool,
    ) -> Self {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkDevice {:?}", handle.handle());

        let debug_utils = enable_debug_utils
            .then(|| ash::ext::debug_utils::Device::new(instance, &handle));

        Self {
            inner: Arc::new(LogicalDeviceInner {
                handle,
                debug_utils,
            }),
        }
    }

    /// Get a reference to the underlying [`ash::Device`]
    pub fn get_handle(&self) -> &ash::Device {
        &self.inner.handle
    }

    pub fn get_debug_utils(&self) -> Option<&ash::ext::debug_utils::Device> {
        self.inner.debug_utils.as_ref()
    }

    /// Best-effort debug name. Failures are ignored; names are diagnostics
    /// only.
    pub fn set_object_name<T: vk::Handle>(&self, object: T, name: &str) {
        if let Some(debug_utils) = self.get_debug_utils() {
            if let Ok(name) = CString::new(name) {
                let info = vk::DebugUtilsObjectNameInfoEXT::default()
                    .object_handle(object)
                    .object_name(&name);
                unsafe {
                    let _ = debug_utils.set_debug_utils_object_name(&info);
                }
            }
        }
    }

    pub fn wait_until_idle(&self) {
        unsafe {
            self.inner
                .handle
                .device_wait_idle()
                .expect("`device_wait_idle` failed");
        }
    }
}
