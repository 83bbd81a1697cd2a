use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Mutex;

use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;

use crate::types::MemoryType;

impl From<MemoryType> for MemoryLocation {
    fn from(value: MemoryType) -> Self {
        match value {
            MemoryType::Gpu => MemoryLocation::GpuOnly,
            MemoryType::Upload => MemoryLocation::CpuToGpu,
            MemoryType::Readback => MemoryLocation::GpuToCpu,
            MemoryType::Dynamic => MemoryLocation::CpuToGpu,
        }
    }
}

/// Device-memory allocator. Thin lock around [`gpu_allocator`]; resource
/// wrappers hold an `Arc` of this so frees can happen from tracker
/// destructors on whichever thread releases the last reference.
pub struct DeviceAllocator {
    inner: Mutex<Option<Allocator>>,
}

/// A single device-memory block. Freed through
/// [`DeviceAllocator::free`] by the owning resource wrapper's drop.
pub struct DeviceAllocation {
    handle: Option<Allocation>,
}

impl DeviceAllocator {
    pub fn new(
        instance: &ash::Instance,
        device: &ash::Device,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;
        Ok(Self {
            inner: Mutex::new(Some(allocator)),
        })
    }

    pub fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        memory_type: MemoryType,
        linear: bool,
    ) -> Result<DeviceAllocation> {
        let mut guard = self.inner.lock().unwrap();
        let allocation = guard.as_mut().unwrap().allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: MemoryLocation::from(memory_type),
            linear,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        Ok(DeviceAllocation {
            handle: Some(allocation),
        })
    }

    pub fn free(&self, mut allocation: DeviceAllocation) {
        if let Some(handle) = allocation.handle.take() {
            let mut guard = self.inner.lock().unwrap();
            if let Some(allocator) = guard.as_mut() {
                if let Err(error) = allocator.free(handle) {
                    tracing::warn!("Failed to free device memory: {error}");
                }
            }
        }
    }

}

impl DeviceAllocation {
    pub fn memory(&self) -> vk::DeviceMemory {
        unsafe { self.handle.as_ref().unwrap().memory() }
    }

    pub fn offset(&self) -> vk::DeviceSize {
        self.handle.as_ref().unwrap().offset()
    }

    pub fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.handle.as_ref().and_then(|handle| handle.mapped_ptr())
    }
}
