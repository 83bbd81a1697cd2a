use anyhow::Result;
use ash::vk;

use crate::device::queue::QueueFamilies;
use crate::error::BasaltError;

/// Identity used to key the on-disk pipeline cache.
#[derive(Debug, Clone)]
pub struct DeviceProperties {
    pub vendor_id: u32,
    pub device_id: u32,
    pub pipeline_cache_uuid: [u8; 16],
    pub device_name: String,
    pub device_type: vk::PhysicalDeviceType,
}

#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    handle: vk::PhysicalDevice,
    properties: DeviceProperties,
    queue_families: QueueFamilies,
}

impl PhysicalDevice {
    /// Enumerates physical devices, resolves a queue family topology for
    /// each, and picks the first suitable one with discrete GPUs sorted to
    /// the front.
    pub fn select(instance: &ash::Instance) -> Result<Self> {
        let physical_devices = unsafe { instance.enumerate_physical_devices()? };

        let mut candidates: Vec<PhysicalDevice> = Vec::new();
        for physical_device in physical_devices {
            let properties =
                unsafe { instance.get_physical_device_properties(physical_device) };
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let queue_families = match Self::find_queue_families(instance, physical_device) {
                Some(queue_families) => queue_families,
                None => {
                    tracing::info!("Device {} does not support necessary queues.", device_name);
                    continue;
                }
            };

            candidates.push(PhysicalDevice {
                handle: physical_device,
                properties: DeviceProperties {
                    vendor_id: properties.vendor_id,
                    device_id: properties.device_id,
                    pipeline_cache_uuid: properties.pipeline_cache_uuid,
                    device_name,
                    device_type: properties.device_type,
                },
                queue_families,
            });
        }

        candidates.sort_by_key(|device| {
            match device.properties.device_type {
                vk::PhysicalDeviceType::DISCRETE_GPU => 0u32,
                _ => 1u32,
            }
        });

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| BasaltError::NoPhysicalDevice.into())
    }

    fn find_queue_families(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Option<QueueFamilies> {
        let queue_families = unsafe {
            instance.get_physical_device_queue_family_properties(physical_device)
        };

        let find = |wanted: vk::QueueFlags| -> Option<u32> {
            if wanted.contains(vk::QueueFlags::COMPUTE) {
                // Dedicated queue for compute: a family that supports
                // compute but not graphics.
                for (index, properties) in queue_families.iter().enumerate() {
                    if properties.queue_flags.contains(wanted)
                        && !properties.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    {
                        return Some(index as u32);
                    }
                }
            } else if wanted.contains(vk::QueueFlags::TRANSFER) {
                // Dedicated queue for transfer: a family supporting
                // transfer but neither graphics nor compute.
                for (index, properties) in queue_families.iter().enumerate() {
                    if properties.queue_flags.contains(wanted)
                        && !properties.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                        && !properties.queue_flags.contains(vk::QueueFlags::COMPUTE)
                    {
                        return Some(index as u32);
                    }
                }
            }

            // Otherwise the first family to support the requested flags.
            queue_families
                .iter()
                .position(|properties| properties.queue_flags.contains(wanted))
                .map(|index| index as u32)
        };

        let graphics = find(vk::QueueFlags::GRAPHICS)?;
        let compute = find(vk::QueueFlags::COMPUTE)?;
        let transfer = find(vk::QueueFlags::TRANSFER)?;

        Some(QueueFamilies {
            graphics,
            compute,
            transfer,
            present: graphics,
        })
    }

    pub fn get_handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.queue_families
    }
}
