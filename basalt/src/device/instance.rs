use std::ffi::{c_char, c_void, CStr, CString};

use anyhow::Result;
use ash::vk;
use raw_window_handle::RawDisplayHandle;

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() {
        String::new()
    } else {
        CStr::from_ptr((*callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!("{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!("{message}");
    } else {
        tracing::trace!("{message}");
    }

    vk::FALSE
}

/// Owns the `VkInstance` plus the debug messenger. The entry point is kept
/// alive here as well; `ash_window` needs it for surface creation.
pub struct Instance {
    entry: ash::Entry,
    handle: ash::Instance,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl Instance {
    pub fn new(
        app_name: &str,
        display_handle: Option<RawDisplayHandle>,
        enable_debug: bool,
    ) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        let app_name = CString::new(app_name)?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(&app_name)
            .api_version(vk::API_VERSION_1_3);

        let mut extensions: Vec<*const c_char> = Vec::new();
        if let Some(display_handle) = display_handle {
            extensions
                .extend_from_slice(ash_window::enumerate_required_extensions(display_handle)?);
        }
        if enable_debug {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let layers: Vec<*const c_char> = if enable_debug {
            vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
        } else {
            Vec::new()
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let handle = unsafe { entry.create_instance(&create_info, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkInstance {:?}", handle.handle());

        let debug_messenger = if enable_debug {
            let loader = ash::ext::debug_utils::Instance::new(&entry, &handle);
            let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(debug_callback));
            let messenger =
                unsafe { loader.create_debug_utils_messenger(&messenger_info, None)? };
            Some((loader, messenger))
        } else {
            None
        };

        Ok(Self {
            entry,
            handle,
            debug_messenger,
        })
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn get_handle(&self) -> &ash::Instance {
        &self.handle
    }

    pub fn has_debug_utils(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkInstance {:?}", self.handle.handle());

        unsafe {
            if let Some((loader, messenger)) = self.debug_messenger.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.handle.destroy_instance(None);
        }
    }
}
