use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use anyhow::Result;
use ash::vk;

use crate::config::MAX_FRAMES_IN_FLIGHT;
use crate::device::queue::QueueFamilies;
use crate::device::LogicalDevice;
use crate::sync::Fence;
use crate::tracker::{ReferenceSet, ResourceTracker};
use crate::types::QueueType;

/// Per-thread, per-queue, per-frame-slot command storage. Protected by its
/// own lock; the decoder holds it for the duration of one decode.
pub struct QueueThreadData {
    pub(crate) command_pool: vk::CommandPool,
    free_command_buffers: VecDeque<vk::CommandBuffer>,
    used_command_buffers: VecDeque<vk::CommandBuffer>,
    /// Resources referenced by command buffers recorded from this storage.
    pub references: ReferenceSet,
}

impl QueueThreadData {
    fn clear_used_commands(&mut self) {
        self.free_command_buffers
            .extend(self.used_command_buffers.drain(..));
    }
}

/// A primary command buffer plus the thread storage it was pulled from.
/// The decoder records tracker references into the storage's set.
pub struct CommandBundle {
    pub command_buffer: vk::CommandBuffer,
    pub thread_data: Arc<Mutex<QueueThreadData>>,
}

struct QueueData {
    queue_family_index: u32,
    thread_to_storage: Mutex<HashMap<ThreadId, Arc<Mutex<QueueThreadData>>>>,
}

struct FrameData {
    queues: [QueueData; 4],
    fence: Fence,
}

fn queue_slot(queue_type: QueueType) -> usize {
    match queue_type {
        QueueType::Graphics => 0,
        QueueType::Compute => 1,
        QueueType::Transfer => 2,
        QueueType::Present => 3,
    }
}

/// Recycles command pools across `MAX_FRAMES_IN_FLIGHT` frame slots. Each
/// recording thread lazily gets one pool per queue per slot; a slot is
/// reset only after its fence has signaled, which is also the moment the
/// slot's tracker references are released — the sole mechanism by which
/// resources become destroyable.
pub struct CommandPoolManager {
    device: LogicalDevice,
    tracker: Arc<ResourceTracker>,
    frame_counter: Mutex<u64>,
    frames: Vec<FrameData>,
}

impl CommandPoolManager {
    pub fn new(
        device: LogicalDevice,
        tracker: Arc<ResourceTracker>,
        families: QueueFamilies,
    ) -> Result<Self> {
        let frames = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| {
                // Created signaled so the first frame's wait falls through.
                let fence = Fence::new(device.clone(), vk::FenceCreateFlags::SIGNALED)?;
                Ok(FrameData {
                    queues: [
                        QueueData {
                            queue_family_index: families.graphics,
                            thread_to_storage: Mutex::new(HashMap::new()),
                        },
                        QueueData {
                            queue_family_index: families.compute,
                            thread_to_storage: Mutex::new(HashMap::new()),
                        },
                        QueueData {
                            queue_family_index: families.transfer,
                            thread_to_storage: Mutex::new(HashMap::new()),
                        },
                        QueueData {
                            queue_family_index: families.present,
                            thread_to_storage: Mutex::new(HashMap::new()),
                        },
                    ],
                    fence,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            device,
            tracker,
            frame_counter: Mutex::new(0),
            frames,
        })
    }

    fn current_frame(&self) -> &FrameData {
        let counter = *self.frame_counter.lock().unwrap();
        &self.frames[(counter % MAX_FRAMES_IN_FLIGHT as u64) as usize]
    }

    /// Hands out a primary command buffer for the current thread, queue
    /// and frame slot, creating the thread's pool on first use.
    pub fn get_command_bundle(&self, queue_type: QueueType) -> Result<CommandBundle> {
        let frame_data = self.current_frame();
        let queue_data = &frame_data.queues[queue_slot(queue_type)];
        let thread_id = thread::current().id();

        let thread_data = {
            let mut thread_to_storage = queue_data.thread_to_storage.lock().unwrap();
            match thread_to_storage.get(&thread_id) {
                Some(thread_data) => thread_data.clone(),
                None => {
                    let command_pool_ci = vk::CommandPoolCreateInfo::default()
                        .queue_family_index(queue_data.queue_family_index);
                    let command_pool = unsafe {
                        self.device
                            .get_handle()
                            .create_command_pool(&command_pool_ci, None)?
                    };
                    self.device.set_object_name(
                        command_pool,
                        &format!(
                            "Command Pool | Thread: {:?} | Queue: {}",
                            thread_id,
                            queue_type.name()
                        ),
                    );

                    let thread_data = Arc::new(Mutex::new(QueueThreadData {
                        command_pool,
                        free_command_buffers: VecDeque::new(),
                        used_command_buffers: VecDeque::new(),
                        references: ReferenceSet::default(),
                    }));
                    thread_to_storage.insert(thread_id, thread_data.clone());
                    thread_data
                }
            }
        };

        let command_buffer = {
            let mut guard = thread_data.lock().unwrap();
            match guard.free_command_buffers.pop_front() {
                Some(command_buffer) => {
                    guard.used_command_buffers.push_back(command_buffer);
                    command_buffer
                }
                None => {
                    let allocate_info = vk::CommandBufferAllocateInfo::default()
                        .command_pool(guard.command_pool)
                        .level(vk::CommandBufferLevel::PRIMARY)
                        .command_buffer_count(1);
                    let command_buffer = unsafe {
                        self.device
                            .get_handle()
                            .allocate_command_buffers(&allocate_info)?[0]
                    };
                    self.device.set_object_name(
                        command_buffer,
                        &format!(
                            "Command Buffer | Thread: {:?} | Queue: {}",
                            thread_id,
                            queue_type.name()
                        ),
                    );
                    guard.used_command_buffers.push_back(command_buffer);
                    command_buffer
                }
            }
        };

        Ok(CommandBundle {
            command_buffer,
            thread_data,
        })
    }

    /// Blocks until the current slot's fence signals, then resets every
    /// pool in the slot, returns used command buffers to the free lists,
    /// and releases the slot's tracker references.
    pub fn wait_for_free_pool(&self) {
        let frame_data = self.current_frame();

        frame_data.fence.wait(u64::MAX);
        frame_data.fence.reset();

        for queue_data in &frame_data.queues {
            let thread_to_storage = queue_data.thread_to_storage.lock().unwrap();
            for thread_data in thread_to_storage.values() {
                let mut guard = thread_data.lock().unwrap();

                unsafe {
                    self.device
                        .get_handle()
                        .reset_command_pool(
                            guard.command_pool,
                            vk::CommandPoolResetFlags::empty(),
                        )
                        .expect("`reset_command_pool` failed");
                }

                guard.clear_used_commands();
                self.tracker.remove_references(&mut guard.references);
            }
        }
    }

    pub fn end_frame(&self) {
        *self.frame_counter.lock().unwrap() += 1;
    }

    /// The fence the last submit of the current frame signals.
    pub fn get_fence(&self) -> vk::Fence {
        self.current_frame().fence.handle()
    }
}

impl Drop for CommandPoolManager {
    fn drop(&mut self) {
        // The device is idle by the time the manager is torn down; drain
        // every reference set before destroying the pools so tracked
        // resources still get their destructors.
        for frame_data in &self.frames {
            for queue_data in &frame_data.queues {
                let thread_to_storage = queue_data.thread_to_storage.lock().unwrap();
                for thread_data in thread_to_storage.values() {
                    let mut guard = thread_data.lock().unwrap();
                    self.tracker.remove_references(&mut guard.references);
                    unsafe {
                        self.device
                            .get_handle()
                            .destroy_command_pool(guard.command_pool, None);
                    }
                }
            }
        }
    }
}
