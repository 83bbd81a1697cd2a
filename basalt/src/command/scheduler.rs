use anyhow::Result;
use ash::vk;
use glam::Vec4;

use crate::command::barrier::{
    map_access_flags_to_image_layout, map_synchronization_stage, is_layout_allowed,
    BarrierBuilder,
};
use crate::command::decoder;
use crate::command::{PresentInfo, SubmitInfo};
use crate::config::MAX_FRAMES_IN_FLIGHT;
use crate::device::Device;
use crate::device::LogicalDevice;
use crate::sync::{BinarySemaphore, TimelineSemaphore};
use crate::types::{AccessFlags, QueueType, SwapchainStatus, SynchronizationStage};

fn full_color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

/// Chains every submit of a frame through one timeline semaphore, decodes
/// encoders into pooled command buffers, then copies textures to
/// swapchains and presents. The owning device serializes calls with a
/// lock; a hung GPU is fatal.
pub(crate) struct SubmitScheduler {
    timeline_semaphore: TimelineSemaphore,
    timeline_value: u64,
    present_semaphores: Vec<BinarySemaphore>,
    submit_counter: u64,
}

impl SubmitScheduler {
    pub(crate) fn new(device: LogicalDevice) -> Result<Self> {
        let present_semaphores = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| BinarySemaphore::new(device.clone()))
            .collect::<Result<Vec<_>>>()?;
        let timeline_semaphore = TimelineSemaphore::new(device, 0)?;

        Ok(Self {
            timeline_semaphore,
            timeline_value: 0,
            present_semaphores,
            submit_counter: 0,
        })
    }

    fn queue_submit(
        &self,
        device: &Device,
        queue_type: QueueType,
        submit_info: vk::SubmitInfo,
        fence: vk::Fence,
    ) {
        let queue = device.queues().get(queue_type);
        unsafe {
            device
                .logical()
                .get_handle()
                .queue_submit(queue, &[submit_info], fence)
                .expect("`queue_submit` failed");
        }
    }

    pub(crate) fn submit(
        &mut self,
        device: &Device,
        submit_infos: Vec<SubmitInfo>,
        present_infos: Vec<PresentInfo>,
    ) -> SwapchainStatus {
        let pool_manager = device.pool_manager();

        // Recycles the oldest frame slot and runs pending destructors.
        pool_manager.wait_for_free_pool();

        struct SubmitData {
            command_buffers: Vec<vk::CommandBuffer>,
            synchronization_stage: SynchronizationStage,
            queue_type: QueueType,
        }

        let mut submit_data = Vec::with_capacity(submit_infos.len());
        for submit_info in &submit_infos {
            let mut command_buffers = Vec::with_capacity(submit_info.encoders.len());
            for encoder in &submit_info.encoders {
                let bundle = pool_manager
                    .get_command_bundle(submit_info.queue_type)
                    .expect("failed to acquire command bundle");
                command_buffers.push(decoder::decode(device, &bundle, encoder));
            }
            submit_data.push(SubmitData {
                command_buffers,
                synchronization_stage: submit_info.synchronization_stage,
                queue_type: submit_info.queue_type,
            });
        }

        let synchronization_fence = pool_manager.get_fence();
        let num_present_infos = present_infos.len();
        let mut status = SwapchainStatus::Optimal;

        if submit_data.is_empty() && num_present_infos == 0 {
            // Nothing to run, but the frame-slot fence still has to signal
            // or the slot can never be recycled.
            self.queue_submit(
                device,
                QueueType::Graphics,
                vk::SubmitInfo::default(),
                synchronization_fence,
            );
            pool_manager.end_frame();
            self.submit_counter += 1;
            return status;
        }

        for (i, data) in submit_data.iter().enumerate() {
            let submit_with_fence = (i == submit_data.len() - 1) && (num_present_infos == 0);

            let value_wait = self.timeline_value;
            let value_signal = value_wait + 1;
            let wait_stage = map_synchronization_stage(data.synchronization_stage);

            let wait_values = [value_wait];
            let signal_values = [value_signal];
            let wait_semaphores = [self.timeline_semaphore.handle()];
            let signal_semaphores = [self.timeline_semaphore.handle()];
            let wait_stages = [wait_stage];

            let mut timeline_info = vk::TimelineSemaphoreSubmitInfo::default()
                .signal_semaphore_values(&signal_values);
            if i != 0 {
                timeline_info = timeline_info.wait_semaphore_values(&wait_values);
            }

            let mut submit_info = vk::SubmitInfo::default()
                .command_buffers(&data.command_buffers)
                .signal_semaphores(&signal_semaphores)
                .push_next(&mut timeline_info);
            if i != 0 {
                submit_info = submit_info
                    .wait_semaphores(&wait_semaphores)
                    .wait_dst_stage_mask(&wait_stages);
            }

            self.queue_submit(
                device,
                data.queue_type,
                submit_info,
                if submit_with_fence {
                    synchronization_fence
                } else {
                    vk::Fence::null()
                },
            );

            self.timeline_value += 1;
        }

        // Copy textures to swapchains. Queue ownership was already settled
        // by the frame graph; this path only blits and presents.
        if num_present_infos > 0 {
            status = self.present(device, &present_infos, synchronization_fence);
        }

        pool_manager.end_frame();
        self.submit_counter += 1;

        status
    }

    fn present(
        &mut self,
        device: &Device,
        present_infos: &[PresentInfo],
        synchronization_fence: vk::Fence,
    ) -> SwapchainStatus {
        let vk_device = device.logical().get_handle();
        let mut status = SwapchainStatus::Optimal;

        let mut swapchain_image_semaphores: Vec<vk::Semaphore> = Vec::new();
        let mut swapchain_image_indices: Vec<u32> = Vec::new();
        let mut swapchains: Vec<vk::SwapchainKHR> = Vec::new();

        let bundle = device
            .pool_manager()
            .get_command_bundle(QueueType::Present)
            .expect("failed to acquire command bundle");
        let command_buffer = bundle.command_buffer;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            vk_device
                .begin_command_buffer(command_buffer, &begin_info)
                .expect("`begin_command_buffer` failed");
        }

        decoder::begin_region(
            device,
            command_buffer,
            "copy_textures_to_swapchains",
            Vec4::new(1.0, 0.75, 0.05, 1.0),
        );

        let mut barrier = BarrierBuilder::new(device.queues().families);
        {
            let mut guard = bundle.thread_data.lock().unwrap();
            let resources = &mut guard.references;

            for present_info in present_infos {
                resources.add_reference(device.tracker(), present_info.swapchain.id());
                resources.add_reference(device.tracker(), present_info.texture.handle().id());

                let acquired = match device
                    .swapchains()
                    .with_mut(present_info.swapchain, |swapchain| swapchain.acquire_image())
                    .unwrap_or_else(|_| panic!("`PresentInfo::swapchain` is not alive."))
                {
                    Ok(acquired) => acquired,
                    Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                        status = SwapchainStatus::OutOfDate;
                        continue;
                    }
                    Err(error) => panic!("`acquire_next_image` failed: {error}"),
                };
                if acquired.suboptimal && status == SwapchainStatus::Optimal {
                    status = SwapchainStatus::Suboptimal;
                }

                let (texture_image, texture_extent, texture_usage) = device
                    .textures()
                    .with(present_info.texture.handle(), |texture| {
                        (texture.image(), texture.extent(), texture.usage())
                    })
                    .unwrap_or_else(|_| panic!("`PresentInfo::texture` is not alive."));

                let swapchain_handle = device
                    .swapchains()
                    .with(present_info.swapchain, |swapchain| swapchain.handle())
                    .unwrap();

                swapchain_image_indices.push(acquired.image_index);
                swapchain_image_semaphores.push(acquired.semaphore);
                swapchains.push(swapchain_handle);

                // Swapchain image: whatever the last present left -> TRANSFER_DST.
                barrier.image_layout_transition(
                    acquired.image,
                    acquired.old_layout,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    full_color_subresource_range(),
                );

                let texture_old_layout = map_access_flags_to_image_layout(
                    present_info.texture_previous_access,
                );
                if !is_layout_allowed(texture_old_layout, texture_usage) {
                    panic!("{texture_old_layout:?} is not allowed with: {texture_usage:?}.");
                }

                // Source texture: previous access -> TRANSFER_SRC, unless
                // it is already there.
                if present_info.texture_previous_access != AccessFlags::TRANSFER_READ {
                    barrier.image_layout_transition(
                        texture_image,
                        texture_old_layout,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        full_color_subresource_range(),
                    );
                }

                barrier.execute(vk_device, command_buffer);
                barrier.reset();

                // Blitting handles the format conversion; works on ~every
                // device as long as both formats are non-integer.
                let extent = texture_extent;
                let blit_region = vk::ImageBlit {
                    src_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    src_offsets: [
                        vk::Offset3D::default(),
                        vk::Offset3D {
                            x: extent.width as i32,
                            y: extent.height as i32,
                            z: 1,
                        },
                    ],
                    dst_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    dst_offsets: [
                        vk::Offset3D::default(),
                        vk::Offset3D {
                            x: extent.width as i32,
                            y: extent.height as i32,
                            z: 1,
                        },
                    ],
                };

                unsafe {
                    vk_device.cmd_blit_image(
                        command_buffer,
                        texture_image,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        acquired.image,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[blit_region],
                        vk::Filter::LINEAR,
                    );
                }

                // Swapchain image: TRANSFER_DST -> PRESENT_SRC.
                barrier.image_layout_transition(
                    acquired.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::PRESENT_SRC_KHR,
                    full_color_subresource_range(),
                );
                barrier.execute(vk_device, command_buffer);
                barrier.reset();
            }
        }

        decoder::end_region(device, command_buffer);

        unsafe {
            vk_device
                .end_command_buffer(command_buffer)
                .expect("`end_command_buffer` failed");
        }

        // Submit the copy work, signaling the frame fence and the present
        // semaphore.
        let present_semaphore = self.present_semaphores
            [(self.submit_counter % MAX_FRAMES_IN_FLIGHT as u64) as usize]
            .handle();
        swapchain_image_semaphores.push(present_semaphore);

        let value_wait = self.timeline_value;
        let wait_values = [value_wait];
        let signal_values = [value_wait + 1, 0];
        let wait_semaphores = [self.timeline_semaphore.handle()];
        let signal_semaphores = [self.timeline_semaphore.handle(), present_semaphore];
        let wait_stages = [map_synchronization_stage(SynchronizationStage::BOTTOM_OF_PIPE)];

        let mut timeline_info = vk::TimelineSemaphoreSubmitInfo::default()
            .wait_semaphore_values(&wait_values)
            .signal_semaphore_values(&signal_values);

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .push_next(&mut timeline_info);

        self.queue_submit(device, QueueType::Present, submit_info, synchronization_fence);
        self.timeline_value += 1;

        if swapchains.is_empty() {
            // Every swapchain was out of date; nothing left to present.
            return status;
        }

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&swapchain_image_semaphores)
            .swapchains(&swapchains)
            .image_indices(&swapchain_image_indices);

        let queue = device.queues().get(QueueType::Present);
        match unsafe { device.swapchain_ext().queue_present(queue, &present_info) } {
            Ok(suboptimal) => {
                if suboptimal && status == SwapchainStatus::Optimal {
                    status = SwapchainStatus::Suboptimal;
                }
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                status = SwapchainStatus::OutOfDate;
            }
            Err(error) => panic!("`queue_present` failed: {error}"),
        }

        status
    }
}
