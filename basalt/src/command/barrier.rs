use ash::vk;

use crate::device::queue::QueueFamilies;
use crate::resource::{Buffer, Texture};
use crate::types::{
    AccessFlags, BufferBarrier, GlobalBarrier, QueueType, SynchronizationStage, TextureBarrier,
    TextureUsage,
};

pub(crate) struct AccessInfo {
    pub access_flags: vk::AccessFlags,
    pub stage_flags: vk::PipelineStageFlags,
    pub image_layout: vk::ImageLayout,
}

/// Fixed translation table for a single access bit.
pub(crate) fn get_access_info(flag: AccessFlags) -> AccessInfo {
    match flag {
        f if f == AccessFlags::NONE => AccessInfo {
            access_flags: vk::AccessFlags::empty(),
            stage_flags: vk::PipelineStageFlags::empty(),
            image_layout: vk::ImageLayout::UNDEFINED,
        },
        f if f == AccessFlags::INDIRECT_BUFFER => AccessInfo {
            access_flags: vk::AccessFlags::INDIRECT_COMMAND_READ,
            stage_flags: vk::PipelineStageFlags::DRAW_INDIRECT,
            image_layout: vk::ImageLayout::UNDEFINED,
        },
        f if f == AccessFlags::INDEX_BUFFER => AccessInfo {
            access_flags: vk::AccessFlags::INDEX_READ,
            stage_flags: vk::PipelineStageFlags::VERTEX_INPUT,
            image_layout: vk::ImageLayout::UNDEFINED,
        },
        f if f == AccessFlags::VERTEX_BUFFER => AccessInfo {
            access_flags: vk::AccessFlags::VERTEX_ATTRIBUTE_READ,
            stage_flags: vk::PipelineStageFlags::VERTEX_INPUT,
            image_layout: vk::ImageLayout::UNDEFINED,
        },
        f if f == AccessFlags::SRV_GRAPHICS => AccessInfo {
            access_flags: vk::AccessFlags::UNIFORM_READ | vk::AccessFlags::SHADER_READ,
            stage_flags: vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::VERTEX_SHADER,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        },
        f if f == AccessFlags::SRV_COMPUTE => AccessInfo {
            access_flags: vk::AccessFlags::UNIFORM_READ | vk::AccessFlags::SHADER_READ,
            stage_flags: vk::PipelineStageFlags::COMPUTE_SHADER,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        },
        f if f == AccessFlags::TRANSFER_READ => AccessInfo {
            access_flags: vk::AccessFlags::TRANSFER_READ,
            stage_flags: vk::PipelineStageFlags::TRANSFER,
            image_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        },
        f if f == AccessFlags::HOST_READ => AccessInfo {
            access_flags: vk::AccessFlags::HOST_READ,
            stage_flags: vk::PipelineStageFlags::HOST,
            image_layout: vk::ImageLayout::GENERAL,
        },
        f if f == AccessFlags::COLOR_ATTACHMENT_READ => AccessInfo {
            access_flags: vk::AccessFlags::COLOR_ATTACHMENT_READ,
            stage_flags: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        },
        f if f == AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ => AccessInfo {
            access_flags: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            stage_flags: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            image_layout: vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        },
        f if f == AccessFlags::PRESENT => AccessInfo {
            access_flags: vk::AccessFlags::empty(),
            stage_flags: vk::PipelineStageFlags::empty(),
            image_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        },
        f if f == AccessFlags::UAV_GRAPHICS => AccessInfo {
            access_flags: vk::AccessFlags::SHADER_WRITE | vk::AccessFlags::SHADER_READ,
            stage_flags: vk::PipelineStageFlags::VERTEX_SHADER
                | vk::PipelineStageFlags::FRAGMENT_SHADER,
            image_layout: vk::ImageLayout::GENERAL,
        },
        f if f == AccessFlags::UAV_COMPUTE => AccessInfo {
            access_flags: vk::AccessFlags::SHADER_WRITE | vk::AccessFlags::SHADER_READ,
            stage_flags: vk::PipelineStageFlags::COMPUTE_SHADER,
            image_layout: vk::ImageLayout::GENERAL,
        },
        f if f == AccessFlags::TRANSFER_WRITE => AccessInfo {
            access_flags: vk::AccessFlags::TRANSFER_WRITE,
            stage_flags: vk::PipelineStageFlags::TRANSFER,
            image_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        },
        f if f == AccessFlags::HOST_WRITE => AccessInfo {
            access_flags: vk::AccessFlags::HOST_WRITE,
            stage_flags: vk::PipelineStageFlags::HOST,
            image_layout: vk::ImageLayout::GENERAL,
        },
        f if f == AccessFlags::COLOR_ATTACHMENT_WRITE => AccessInfo {
            access_flags: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            stage_flags: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        },
        f if f == AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE => AccessInfo {
            access_flags: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            stage_flags: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            image_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        },
        _ => panic!("`get_access_info` expects a single access bit"),
    }
}

/// Resolves a (possibly multi-bit) access mask to one image layout. The
/// mapping is many-to-one: when two bits disagree the most permissive
/// compatible layout wins, with GENERAL as the final fallback.
pub(crate) fn map_access_flags_to_image_layout(flags: AccessFlags) -> vk::ImageLayout {
    let mut image_layout: Option<vk::ImageLayout> = None;

    for flag in flags.iter() {
        let access_info = get_access_info(flag);
        image_layout = Some(match image_layout {
            None => access_info.image_layout,
            Some(old_layout) => {
                let new_layout = access_info.image_layout;
                if old_layout == vk::ImageLayout::UNDEFINED {
                    new_layout
                } else if new_layout == vk::ImageLayout::UNDEFINED {
                    old_layout
                } else if (old_layout == vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
                    && new_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    || (old_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
                        && new_layout == vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
                {
                    // ATTACHMENT_OPTIMAL covers both read and write access.
                    vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
                } else if old_layout == new_layout {
                    old_layout
                } else {
                    // No valid combination left; GENERAL always works.
                    vk::ImageLayout::GENERAL
                }
            }
        });
    }

    image_layout.unwrap_or(vk::ImageLayout::UNDEFINED)
}

/// Source side of a transition: stages always accumulate, access masks only
/// for write bits (reads need no availability operation).
pub(crate) fn translate_previous_access(
    flags: AccessFlags,
) -> (vk::AccessFlags, vk::PipelineStageFlags, vk::ImageLayout) {
    let mut access_flags = vk::AccessFlags::empty();
    let mut stage_flags = vk::PipelineStageFlags::empty();
    let image_layout = map_access_flags_to_image_layout(flags);

    for flag in flags.iter() {
        let access_info = get_access_info(flag);
        stage_flags |= access_info.stage_flags;
        if flag.is_write_access() {
            access_flags |= access_info.access_flags;
        }
    }

    (access_flags, stage_flags, image_layout)
}

/// Destination side: access masks only matter when something was made
/// available by the source side.
pub(crate) fn translate_next_access(
    flags: AccessFlags,
    src_access_mask: vk::AccessFlags,
) -> (vk::AccessFlags, vk::PipelineStageFlags, vk::ImageLayout) {
    let mut access_flags = vk::AccessFlags::empty();
    let mut stage_flags = vk::PipelineStageFlags::empty();
    let image_layout = map_access_flags_to_image_layout(flags);

    for flag in flags.iter() {
        let access_info = get_access_info(flag);
        stage_flags |= access_info.stage_flags;
        if !src_access_mask.is_empty() {
            access_flags |= access_info.access_flags;
        }
    }

    (access_flags, stage_flags, image_layout)
}

pub(crate) fn layout_to_access_flags(image_layout: vk::ImageLayout) -> vk::AccessFlags {
    match image_layout {
        vk::ImageLayout::UNDEFINED
        | vk::ImageLayout::GENERAL
        | vk::ImageLayout::PREINITIALIZED => vk::AccessFlags::empty(),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
        }
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL => {
            vk::AccessFlags::SHADER_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
        }
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
        vk::ImageLayout::PRESENT_SRC_KHR => vk::AccessFlags::MEMORY_READ,
        _ => panic!("Unsupported layout!"),
    }
}

pub(crate) fn layout_to_pipeline_stage(image_layout: vk::ImageLayout) -> vk::PipelineStageFlags {
    match image_layout {
        vk::ImageLayout::UNDEFINED
        | vk::ImageLayout::GENERAL
        | vk::ImageLayout::PREINITIALIZED => vk::PipelineStageFlags::empty(),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => {
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        }
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS
        }
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL => {
            vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS
        }
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::PipelineStageFlags::FRAGMENT_SHADER,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL | vk::ImageLayout::TRANSFER_DST_OPTIMAL => {
            vk::PipelineStageFlags::TRANSFER
        }
        vk::ImageLayout::PRESENT_SRC_KHR => vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        _ => panic!("Unsupported layout!"),
    }
}

pub(crate) fn map_synchronization_stage(stage_mask: SynchronizationStage) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();
    if stage_mask == SynchronizationStage::NONE {
        return flags;
    }

    if stage_mask.contains(SynchronizationStage::TOP_OF_PIPE) {
        flags |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    if stage_mask.contains(SynchronizationStage::BOTTOM_OF_PIPE) {
        flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }
    if stage_mask.contains(SynchronizationStage::EARLY_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    }
    if stage_mask.contains(SynchronizationStage::LATE_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }
    if stage_mask.contains(SynchronizationStage::VERTEX_SHADER) {
        flags |= vk::PipelineStageFlags::VERTEX_SHADER;
    }
    if stage_mask.contains(SynchronizationStage::FRAGMENT_SHADER) {
        flags |= vk::PipelineStageFlags::FRAGMENT_SHADER;
    }
    if stage_mask.contains(SynchronizationStage::COMPUTE_SHADER) {
        flags |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }
    if stage_mask.contains(SynchronizationStage::TRANSFER) {
        flags |= vk::PipelineStageFlags::TRANSFER;
    }
    if stage_mask.contains(SynchronizationStage::ALL_GRAPHICS) {
        flags |= vk::PipelineStageFlags::ALL_GRAPHICS;
    }

    flags
}

/// True when `image_layout` may be used with a texture of the given usage.
pub(crate) fn is_layout_allowed(image_layout: vk::ImageLayout, usage: TextureUsage) -> bool {
    match image_layout {
        // UNDEFINED and GENERAL are always supported.
        vk::ImageLayout::UNDEFINED | vk::ImageLayout::GENERAL => true,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => usage.contains(TextureUsage::SRV),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => {
            usage.contains(TextureUsage::COLOR_ATTACHMENT)
        }
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
        | vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
            usage.intersects(TextureUsage::DEPTH_ATTACHMENT | TextureUsage::STENCIL_ATTACHMENT)
        }
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => usage.contains(TextureUsage::TRANSFER_SRC),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => usage.contains(TextureUsage::TRANSFER_DST),
        vk::ImageLayout::PRESENT_SRC_KHR => usage.contains(TextureUsage::PRESENT),
        _ => panic!("Invalid texture layout!"),
    }
}

fn queue_family_indices(
    families: &QueueFamilies,
    source_queue: Option<QueueType>,
    destination_queue: Option<QueueType>,
) -> (u32, u32) {
    assert_eq!(
        source_queue.is_some(),
        destination_queue.is_some(),
        "Both `source_queue` and `destination_queue` must be set, or neither."
    );

    match (source_queue, destination_queue) {
        // Equal family indices behave exactly like QUEUE_FAMILY_IGNORED;
        // no ownership transfer happens.
        (Some(source), Some(destination)) => (
            families.family_index(source),
            families.family_index(destination),
        ),
        _ => (vk::QUEUE_FAMILY_IGNORED, vk::QUEUE_FAMILY_IGNORED),
    }
}

/// Accumulates memory, buffer, and image barriers, then flushes them in
/// one `cmd_pipeline_barrier` with unioned stage masks.
pub(crate) struct BarrierBuilder {
    families: QueueFamilies,
    memory_barriers: Vec<vk::MemoryBarrier<'static>>,
    buffer_barriers: Vec<vk::BufferMemoryBarrier<'static>>,
    image_barriers: Vec<vk::ImageMemoryBarrier<'static>>,
    src_stage_mask: vk::PipelineStageFlags,
    dst_stage_mask: vk::PipelineStageFlags,
}

impl BarrierBuilder {
    pub(crate) fn new(families: QueueFamilies) -> Self {
        Self {
            families,
            memory_barriers: Vec::with_capacity(16),
            buffer_barriers: Vec::with_capacity(16),
            image_barriers: Vec::with_capacity(16),
            src_stage_mask: vk::PipelineStageFlags::empty(),
            dst_stage_mask: vk::PipelineStageFlags::empty(),
        }
    }

    fn accumulate_stages(
        &mut self,
        mut src_stage_mask: vk::PipelineStageFlags,
        mut dst_stage_mask: vk::PipelineStageFlags,
    ) {
        if src_stage_mask.is_empty() {
            src_stage_mask = vk::PipelineStageFlags::TOP_OF_PIPE;
        }
        if dst_stage_mask.is_empty() {
            dst_stage_mask = vk::PipelineStageFlags::BOTTOM_OF_PIPE;
        }
        self.src_stage_mask |= src_stage_mask;
        self.dst_stage_mask |= dst_stage_mask;
    }

    /// Raw layout-to-layout transition; access and stage masks are derived
    /// from the layouts. Used by the swapchain copy path.
    pub(crate) fn image_layout_transition(
        &mut self,
        image: vk::Image,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
        subresource_range: vk::ImageSubresourceRange,
    ) {
        self.accumulate_stages(
            layout_to_pipeline_stage(old_layout),
            layout_to_pipeline_stage(new_layout),
        );

        self.image_barriers.push(
            vk::ImageMemoryBarrier::default()
                .src_access_mask(layout_to_access_flags(old_layout))
                .dst_access_mask(layout_to_access_flags(new_layout))
                .old_layout(old_layout)
                .new_layout(new_layout)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range),
        );
    }

    pub(crate) fn global_barrier(&mut self, barrier: &GlobalBarrier) {
        let (src_access_mask, src_stage_mask, _) =
            translate_previous_access(barrier.previous_access);
        let (dst_access_mask, dst_stage_mask, _) =
            translate_next_access(barrier.next_access, src_access_mask);

        self.accumulate_stages(src_stage_mask, dst_stage_mask);

        self.memory_barriers.push(
            vk::MemoryBarrier::default()
                .src_access_mask(src_access_mask)
                .dst_access_mask(dst_access_mask),
        );
    }

    pub(crate) fn texture_barrier(&mut self, texture: &Texture, barrier: &TextureBarrier) {
        let (src_access_mask, src_stage_mask, old_layout) =
            translate_previous_access(barrier.previous_access);
        let (dst_access_mask, dst_stage_mask, new_layout) =
            translate_next_access(barrier.next_access, src_access_mask);
        let (src_queue_family_index, dst_queue_family_index) = queue_family_indices(
            &self.families,
            barrier.source_queue,
            barrier.destination_queue,
        );

        let texture_usage = texture.usage();
        if !is_layout_allowed(old_layout, texture_usage) {
            panic!("{old_layout:?} is not allowed with: {texture_usage:?}.");
        }
        if !is_layout_allowed(new_layout, texture_usage) {
            panic!("{new_layout:?} is not allowed with: {texture_usage:?}.");
        }

        self.accumulate_stages(src_stage_mask, dst_stage_mask);

        let aspect_mask =
            crate::format::map_texture_aspect(texture.format().desc().aspect);
        self.image_barriers.push(
            vk::ImageMemoryBarrier::default()
                .src_access_mask(src_access_mask)
                .dst_access_mask(dst_access_mask)
                .old_layout(old_layout)
                .new_layout(new_layout)
                .src_queue_family_index(src_queue_family_index)
                .dst_queue_family_index(dst_queue_family_index)
                .image(texture.image())
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(aspect_mask)
                        .base_mip_level(barrier.subresource_range.first_mip_level)
                        .level_count(barrier.subresource_range.mip_count)
                        .base_array_layer(barrier.subresource_range.first_layer)
                        .layer_count(barrier.subresource_range.layer_count),
                ),
        );
    }

    pub(crate) fn buffer_barrier(&mut self, buffer: &Buffer, barrier: &BufferBarrier) {
        let (src_access_mask, src_stage_mask, _) =
            translate_previous_access(barrier.previous_access);
        let (dst_access_mask, dst_stage_mask, _) =
            translate_next_access(barrier.next_access, src_access_mask);
        let (src_queue_family_index, dst_queue_family_index) = queue_family_indices(
            &self.families,
            barrier.source_queue,
            barrier.destination_queue,
        );

        self.accumulate_stages(src_stage_mask, dst_stage_mask);

        self.buffer_barriers.push(
            vk::BufferMemoryBarrier::default()
                .src_access_mask(src_access_mask)
                .dst_access_mask(dst_access_mask)
                .src_queue_family_index(src_queue_family_index)
                .dst_queue_family_index(dst_queue_family_index)
                .buffer(buffer.handle())
                .offset(barrier.subresource_range.offset)
                .size(barrier.subresource_range.size),
        );
    }

    pub(crate) fn execute(&self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
        if self.memory_barriers.is_empty()
            && self.buffer_barriers.is_empty()
            && self.image_barriers.is_empty()
        {
            return;
        }

        unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                self.src_stage_mask,
                self.dst_stage_mask,
                vk::DependencyFlags::empty(),
                &self.memory_barriers,
                &self.buffer_barriers,
                &self.image_barriers,
            );
        }
    }

    pub(crate) fn reset(&mut self) {
        self.memory_barriers.clear();
        self.buffer_barriers.clear();
        self.image_barriers.clear();
        self.src_stage_mask = vk::PipelineStageFlags::empty();
        self.dst_stage_mask = vk::PipelineStageFlags::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_write_to_compute_read_transition() {
        let (src_access, src_stage, old_layout) =
            translate_previous_access(AccessFlags::COLOR_ATTACHMENT_WRITE);
        let (dst_access, dst_stage, new_layout) =
            translate_next_access(AccessFlags::SRV_COMPUTE, src_access);

        assert_eq!(src_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(src_access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
        assert_eq!(old_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(dst_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
        assert_eq!(
            dst_access,
            vk::AccessFlags::UNIFORM_READ | vk::AccessFlags::SHADER_READ
        );
        assert_eq!(new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    }

    #[test]
    fn test_read_only_source_publishes_nothing() {
        let (src_access, src_stage, _) = translate_previous_access(AccessFlags::SRV_GRAPHICS);
        assert!(src_access.is_empty());
        assert!(!src_stage.is_empty());

        // Nothing to make available means nothing to make visible either.
        let (dst_access, _, _) = translate_next_access(AccessFlags::SRV_COMPUTE, src_access);
        assert!(dst_access.is_empty());
    }

    #[test]
    fn test_depth_stencil_read_write_merges_to_attachment_optimal() {
        let layout = map_access_flags_to_image_layout(
            AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        );
        assert_eq!(layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn test_unrelated_layouts_fall_back_to_general() {
        let layout = map_access_flags_to_image_layout(
            AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::TRANSFER_READ,
        );
        assert_eq!(layout, vk::ImageLayout::GENERAL);
    }

    #[test]
    fn test_buffer_only_bits_leave_layout_undefined() {
        let layout = map_access_flags_to_image_layout(AccessFlags::INDEX_BUFFER);
        assert_eq!(layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(
            map_access_flags_to_image_layout(AccessFlags::NONE),
            vk::ImageLayout::UNDEFINED
        );
    }

    #[test]
    fn test_layout_usage_compatibility() {
        assert!(is_layout_allowed(
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            TextureUsage::COLOR_ATTACHMENT
        ));
        assert!(!is_layout_allowed(
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            TextureUsage::SRV
        ));
        assert!(is_layout_allowed(
            vk::ImageLayout::GENERAL,
            TextureUsage::empty()
        ));
        assert!(is_layout_allowed(
            vk::ImageLayout::PRESENT_SRC_KHR,
            TextureUsage::PRESENT
        ));
    }
}
