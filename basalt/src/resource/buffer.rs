use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;
use derivative::Derivative;

use crate::allocator::{DeviceAllocation, DeviceAllocator};
use crate::device::LogicalDevice;
use crate::error::BasaltError;
use crate::handle::{HandleKind, HandleType};
use crate::types::{BufferUsage, MemoryType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferCreateInfo {
    pub name: String,
    pub size: u64,
    pub usage: BufferUsage,
    pub memory_type: MemoryType,
}

pub(crate) fn map_buffer_usage(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::TRANSFER_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsage::TRANSFER_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    // From the Vulkan perspective SRV and UAV are the same storage buffer;
    // the difference is the `readonly` qualifier on the shader side.
    if usage.intersects(BufferUsage::SRV | BufferUsage::UAV) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsage::CBV) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDIRECT) {
        flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    flags
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Buffer {
    handle: vk::Buffer,
    device: LogicalDevice,
    #[derivative(Debug = "ignore")]
    allocator: Arc<DeviceAllocator>,
    #[derivative(Debug = "ignore")]
    allocation: Option<DeviceAllocation>,
    size: u64,
    usage: BufferUsage,
    memory_type: MemoryType,
    name: String,
}

unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl HandleKind for Buffer {
    const HANDLE_TYPE: HandleType = HandleType::Buffer;
}

impl Buffer {
    pub fn new(
        device: LogicalDevice,
        allocator: Arc<DeviceAllocator>,
        queue_families: &[u32],
        create_info: &BufferCreateInfo,
    ) -> Result<Self> {
        let sharing_mode = if queue_families.len() <= 1 {
            vk::SharingMode::EXCLUSIVE
        } else {
            vk::SharingMode::CONCURRENT
        };
        let buffer_ci = vk::BufferCreateInfo::default()
            .size(create_info.size)
            .usage(map_buffer_usage(create_info.usage))
            .sharing_mode(sharing_mode)
            .queue_family_indices(if queue_families.len() <= 1 {
                &[]
            } else {
                queue_families
            });

        let handle = unsafe { device.get_handle().create_buffer(&buffer_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkBuffer {:?}", handle);

        let requirements =
            unsafe { device.get_handle().get_buffer_memory_requirements(handle) };
        let allocation = allocator.allocate(
            &create_info.name,
            requirements,
            create_info.memory_type,
            true,
        )?;
        unsafe {
            device.get_handle().bind_buffer_memory(
                handle,
                allocation.memory(),
                allocation.offset(),
            )?;
        }

        if !create_info.name.is_empty() {
            device.set_object_name(handle, &create_info.name);
        }

        Ok(Self {
            handle,
            device,
            allocator,
            allocation: Some(allocation),
            size: create_info.size,
            usage: create_info.usage,
            memory_type: create_info.memory_type,
            name: create_info.name.clone(),
        })
    }

    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapped_ptr(&self) -> Option<ptr::NonNull<c_void>> {
        self.allocation.as_ref().and_then(|a| a.mapped_ptr())
    }

    /// Writes `data` at `offset_bytes` through the mapped pointer. Only
    /// valid for host-visible memory types.
    pub fn write(&mut self, offset_bytes: u64, data: &[u8]) -> Result<()> {
        if offset_bytes + data.len() as u64 > self.size {
            return Err(BasaltError::InsufficientSpace.into());
        }
        let mapped_ptr = self.mapped_ptr().ok_or(BasaltError::NoMappedPointer)?;
        // SAFETY: offset + len bounds-checked against the buffer size above.
        unsafe {
            ptr::copy_nonoverlapping(
                data.as_ptr() as *const c_void,
                mapped_ptr.as_ptr().add(offset_bytes as usize),
                data.len(),
            );
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkBuffer {:?}", self.handle);

        unsafe {
            self.device.get_handle().destroy_buffer(self.handle, None);
        }
        if let Some(allocation) = self.allocation.take() {
            self.allocator.free(allocation);
        }
    }
}
