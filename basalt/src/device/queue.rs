use ash::vk;

use crate::types::QueueType;

/// Resolved queue family topology. Compute prefers a family without
/// graphics; transfer prefers a family without graphics and compute; the
/// present queue shares the graphics family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub compute: u32,
    pub transfer: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn family_index(&self, queue_type: QueueType) -> u32 {
        match queue_type {
            QueueType::Graphics => self.graphics,
            QueueType::Compute => self.compute,
            QueueType::Transfer => self.transfer,
            QueueType::Present => self.present,
        }
    }

    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = vec![self.graphics, self.compute, self.transfer, self.present];
        families.sort_unstable();
        families.dedup();
        families
    }
}

/// The four logical queues plus their family mapping.
#[derive(Debug, Copy, Clone)]
pub struct Queues {
    pub graphics: vk::Queue,
    pub compute: vk::Queue,
    pub transfer: vk::Queue,
    pub present: vk::Queue,
    pub families: QueueFamilies,
}

impl Queues {
    pub fn get(&self, queue_type: QueueType) -> vk::Queue {
        match queue_type {
            QueueType::Graphics => self.graphics,
            QueueType::Compute => self.compute,
            QueueType::Transfer => self.transfer,
            QueueType::Present => self.present,
        }
    }

    pub fn family_index(&self, queue_type: QueueType) -> u32 {
        self.families.family_index(queue_type)
    }
}
