use std::sync::Mutex;

use anyhow::Result;
use ash::vk;

use crate::config::MAX_DESCRIPTOR_COUNT;
use crate::device::LogicalDevice;
use crate::handle::BindableResource;
use crate::pipeline::layout::{
    BindlessPipelineLayout, NUM_BINDLESS_SETS, SET_BUFFERS, SET_RW_TEXTURES, SET_SAMPLERS,
    SET_TEXTURES,
};
use crate::resource::{Buffer, Sampler};
use crate::types::{BufferUsage, TextureUsage};

/// Dense slot allocator for one descriptor kind: bump pointer plus a free
/// stack. Freed slots are reused immediately; the resource tracker
/// guarantees the previous occupant is no longer referenced by any
/// in-flight command buffer before its slots come back here.
pub(crate) struct SlotAllocator {
    first_free: u32,
    free_indices: Vec<u32>,
}

impl SlotAllocator {
    pub(crate) fn new() -> Self {
        Self {
            first_free: 0,
            free_indices: Vec::new(),
        }
    }

    pub(crate) fn allocate(&mut self) -> u32 {
        let index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                let index = self.first_free;
                self.first_free += 1;
                index
            }
        };
        assert!(index < MAX_DESCRIPTOR_COUNT);
        assert_ne!(index, BindableResource::INVALID_INDEX);
        index
    }

    pub(crate) fn release(&mut self, index: u32) {
        debug_assert!(index < self.first_free);
        self.free_indices.push(index);
    }
}

/// Owns the bindless descriptor pool and its four sets (storage buffers,
/// sampled images, storage images, samplers), binding 0 each. Descriptor
/// writes use update-after-bind semantics: different slots may be written
/// from different threads concurrently, the same slot never.
pub struct BindlessManager {
    device: LogicalDevice,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets: [vk::DescriptorSet; NUM_BINDLESS_SETS],
    pipeline_layout: vk::PipelineLayout,
    tables: [Mutex<SlotAllocator>; NUM_BINDLESS_SETS],
}

impl BindlessManager {
    pub fn new(device: LogicalDevice, layout: &BindlessPipelineLayout) -> Result<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::STORAGE_BUFFER)
                .descriptor_count(MAX_DESCRIPTOR_COUNT),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::SAMPLED_IMAGE)
                .descriptor_count(MAX_DESCRIPTOR_COUNT),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::STORAGE_IMAGE)
                .descriptor_count(MAX_DESCRIPTOR_COUNT),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::SAMPLER)
                .descriptor_count(MAX_DESCRIPTOR_COUNT),
        ];

        let pool_ci = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::UPDATE_AFTER_BIND)
            .max_sets(NUM_BINDLESS_SETS as u32)
            .pool_sizes(&pool_sizes);
        let descriptor_pool =
            unsafe { device.get_handle().create_descriptor_pool(&pool_ci, None)? };

        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(descriptor_pool)
            .set_layouts(layout.set_layouts());
        let sets = unsafe { device.get_handle().allocate_descriptor_sets(&allocate_info)? };

        let mut descriptor_sets = [vk::DescriptorSet::null(); NUM_BINDLESS_SETS];
        descriptor_sets.copy_from_slice(&sets);

        const NAMES: [&str; NUM_BINDLESS_SETS] = [
            "DescriptorSet: Buffers",
            "DescriptorSet: Textures",
            "DescriptorSet: RWTextures",
            "DescriptorSet: Samplers",
        ];
        for (set, name) in descriptor_sets.iter().zip(NAMES) {
            device.set_object_name(*set, name);
        }

        Ok(Self {
            device,
            descriptor_pool,
            descriptor_sets,
            pipeline_layout: layout.pipeline_layout(),
            tables: [
                Mutex::new(SlotAllocator::new()),
                Mutex::new(SlotAllocator::new()),
                Mutex::new(SlotAllocator::new()),
                Mutex::new(SlotAllocator::new()),
            ],
        })
    }

    fn allocate_slot(&self, set: usize) -> u32 {
        self.tables[set].lock().unwrap().allocate()
    }

    fn release_slot(&self, set: usize, index: u32) {
        self.tables[set].lock().unwrap().release(index);
    }

    /// A buffer occupies a single storage-buffer slot; the SRV and UAV
    /// flavours are the same descriptor from Vulkan's point of view.
    pub fn bind_buffer(&self, buffer: &Buffer) -> BindableResource {
        let usage = buffer.usage();
        if !usage.intersects(BufferUsage::SRV | BufferUsage::UAV) {
            return BindableResource::default();
        }

        let index = self.allocate_slot(SET_BUFFERS);

        let buffer_info = [vk::DescriptorBufferInfo::default()
            .buffer(buffer.handle())
            .offset(0)
            .range(vk::WHOLE_SIZE)];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.descriptor_sets[SET_BUFFERS])
            .dst_binding(0)
            .dst_array_element(index)
            .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
            .buffer_info(&buffer_info);

        unsafe {
            self.device
                .get_handle()
                .update_descriptor_sets(&[write], &[]);
        }

        BindableResource {
            srv: if usage.contains(BufferUsage::SRV) {
                index
            } else {
                BindableResource::INVALID_INDEX
            },
            uav: if usage.contains(BufferUsage::UAV) {
                index
            } else {
                BindableResource::INVALID_INDEX
            },
        }
    }

    pub fn unbind_buffer(&self, bindings: BindableResource) {
        let index = bindings.srv.min(bindings.uav);
        if index != BindableResource::INVALID_INDEX {
            self.release_slot(SET_BUFFERS, index);
        }
    }

    /// Shared by textures and texture views; both bind an image view.
    /// SRV and UAV slots are independent and either may be absent.
    pub fn bind_texture(
        &self,
        image_view: vk::ImageView,
        usage: TextureUsage,
    ) -> BindableResource {
        let mut bindings = BindableResource::default();

        if usage.contains(TextureUsage::SRV) {
            let index = self.allocate_slot(SET_TEXTURES);
            let image_info = [vk::DescriptorImageInfo::default()
                .image_view(image_view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_sets[SET_TEXTURES])
                .dst_binding(0)
                .dst_array_element(index)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(&image_info);
            unsafe {
                self.device
                    .get_handle()
                    .update_descriptor_sets(&[write], &[]);
            }
            bindings.srv = index;
        }

        if usage.contains(TextureUsage::UAV) {
            let index = self.allocate_slot(SET_RW_TEXTURES);
            let image_info = [vk::DescriptorImageInfo::default()
                .image_view(image_view)
                .image_layout(vk::ImageLayout::GENERAL)];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_sets[SET_RW_TEXTURES])
                .dst_binding(0)
                .dst_array_element(index)
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .image_info(&image_info);
            unsafe {
                self.device
                    .get_handle()
                    .update_descriptor_sets(&[write], &[]);
            }
            bindings.uav = index;
        }

        bindings
    }

    pub fn unbind_texture(&self, bindings: BindableResource) {
        if bindings.srv != BindableResource::INVALID_INDEX {
            self.release_slot(SET_TEXTURES, bindings.srv);
        }
        if bindings.uav != BindableResource::INVALID_INDEX {
            self.release_slot(SET_RW_TEXTURES, bindings.uav);
        }
    }

    /// Samplers get one slot mirrored into both fields.
    pub fn bind_sampler(&self, sampler: &Sampler) -> BindableResource {
        let index = self.allocate_slot(SET_SAMPLERS);

        let image_info = [vk::DescriptorImageInfo::default().sampler(sampler.handle())];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.descriptor_sets[SET_SAMPLERS])
            .dst_binding(0)
            .dst_array_element(index)
            .descriptor_type(vk::DescriptorType::SAMPLER)
            .image_info(&image_info);
        unsafe {
            self.device
                .get_handle()
                .update_descriptor_sets(&[write], &[]);
        }

        BindableResource {
            srv: index,
            uav: index,
        }
    }

    pub fn unbind_sampler(&self, bindings: BindableResource) {
        assert_eq!(bindings.srv, bindings.uav);
        if bindings.srv != BindableResource::INVALID_INDEX {
            self.release_slot(SET_SAMPLERS, bindings.srv);
        }
    }

    /// Binds all four sets once for the given bind point; done at the top
    /// of every command buffer for graphics and compute.
    pub fn bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
    ) {
        unsafe {
            self.device.get_handle().cmd_bind_descriptor_sets(
                command_buffer,
                bind_point,
                self.pipeline_layout,
                0,
                &self.descriptor_sets,
                &[],
            );
        }
    }
}

impl Drop for BindlessManager {
    fn drop(&mut self) {
        unsafe {
            self.device
                .get_handle()
                .destroy_descriptor_pool(self.descriptor_pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_dense_and_bounded() {
        let mut allocator = SlotAllocator::new();
        for expected in 0..128 {
            let index = allocator.allocate();
            assert_eq!(index, expected);
            assert!(index < MAX_DESCRIPTOR_COUNT);
        }
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut allocator = SlotAllocator::new();
        let indices: Vec<u32> = (0..16).map(|_| allocator.allocate()).collect();
        for index in &indices {
            allocator.release(*index);
        }
        // LIFO reuse, never growing past the high-water mark.
        let mut reused: Vec<u32> = (0..16).map(|_| allocator.allocate()).collect();
        reused.sort_unstable();
        assert_eq!(reused, indices);
        assert_eq!(allocator.allocate(), 16);
    }
}
