use std::ffi::CString;

use ash::vk;
use glam::Vec4;

use crate::command::barrier::{
    is_layout_allowed, map_access_flags_to_image_layout, BarrierBuilder,
};
use crate::command::encoder::{Command, CommandEncoder};
use crate::command::pool::CommandBundle;
use crate::device::Device;
use crate::format::map_texture_aspect;
use crate::handle::{
    BufferHandle, ComputePipelineHandle, GraphicsPipelineHandle, Handle,
};
use crate::resource::texture::map_extent;
use crate::tracker::ReferenceSet;
use crate::types::{
    AccessFlags, AttachmentLoadOp, AttachmentStoreOp, AttachmentTexture, ClearValue,
    IndexType, RenderPass, TextureUsage,
};

/// Cached bind state for one decode. Redundant pipeline and index-buffer
/// binds are elided.
struct DecodeCache {
    graphics_pipeline: GraphicsPipelineHandle,
    compute_pipeline: ComputePipelineHandle,
    index_buffer: Option<(BufferHandle, IndexType, u64)>,
}

impl Default for DecodeCache {
    fn default() -> Self {
        Self {
            graphics_pipeline: Handle::null(),
            compute_pipeline: Handle::null(),
            index_buffer: None,
        }
    }
}

pub(crate) fn begin_region(device: &Device, command_buffer: vk::CommandBuffer, name: &str, color: Vec4) {
    if let Some(debug_utils) = device.logical().get_debug_utils() {
        if let Ok(name) = CString::new(name) {
            let label = vk::DebugUtilsLabelEXT::default()
                .label_name(&name)
                .color(color.to_array());
            unsafe {
                debug_utils.cmd_begin_debug_utils_label(command_buffer, &label);
            }
        }
    }
}

pub(crate) fn end_region(device: &Device, command_buffer: vk::CommandBuffer) {
    if let Some(debug_utils) = device.logical().get_debug_utils() {
        unsafe {
            debug_utils.cmd_end_debug_utils_label(command_buffer);
        }
    }
}

fn check_layout_allowed(access_flags: AccessFlags, texture_usage: TextureUsage) {
    let layout = map_access_flags_to_image_layout(access_flags);
    if !is_layout_allowed(layout, texture_usage) {
        panic!("{layout:?} is not allowed with: {texture_usage:?}.");
    }
}

/// Resolves an attachment to its image view, checking layout/usage
/// compatibility and pinning the resource for this frame.
fn resolve_attachment(
    device: &Device,
    resources: &mut ReferenceSet,
    attachment: &AttachmentTexture,
    texture_access: AccessFlags,
) -> vk::ImageView {
    match attachment {
        AttachmentTexture::Texture(handle) => {
            resources.add_reference(device.tracker(), handle.handle().id());
            device
                .textures()
                .with(handle.handle(), |texture| {
                    check_layout_allowed(texture_access, texture.usage());
                    texture.image_view()
                })
                .unwrap_or_else(|_| panic!("Render pass attachment is not alive."))
        }
        AttachmentTexture::TextureView(handle) => {
            resources.add_reference(device.tracker(), handle.handle().id());
            device
                .texture_views()
                .with(handle.handle(), |texture_view| {
                    check_layout_allowed(texture_access, texture_view.usage());
                    texture_view.image_view()
                })
                .unwrap_or_else(|_| panic!("Render pass attachment is not alive."))
        }
    }
}

fn map_load_op(op: AttachmentLoadOp) -> vk::AttachmentLoadOp {
    match op {
        AttachmentLoadOp::Load => vk::AttachmentLoadOp::LOAD,
        AttachmentLoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        AttachmentLoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

fn map_store_op(op: AttachmentStoreOp) -> vk::AttachmentStoreOp {
    match op {
        AttachmentStoreOp::Store => vk::AttachmentStoreOp::STORE,
        AttachmentStoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

fn map_clear_value(clear_value: &ClearValue) -> vk::ClearValue {
    match clear_value {
        ClearValue::Color(v) => vk::ClearValue {
            color: vk::ClearColorValue {
                float32: v.to_array(),
            },
        },
        ClearValue::ColorInt(v) => vk::ClearValue {
            color: vk::ClearColorValue {
                int32: v.to_array(),
            },
        },
        ClearValue::ColorUint(v) => vk::ClearValue {
            color: vk::ClearColorValue {
                uint32: v.to_array(),
            },
        },
    }
}

fn map_index_type(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

fn begin_render_pass(
    device: &Device,
    resources: &mut ReferenceSet,
    command_buffer: vk::CommandBuffer,
    render_area: &crate::types::Rect,
    render_pass: &RenderPass,
) {
    let mut color_attachments: Vec<vk::RenderingAttachmentInfo> =
        Vec::with_capacity(render_pass.color_attachments.len());

    for color_attachment in &render_pass.color_attachments {
        let image_view = resolve_attachment(
            device,
            resources,
            &color_attachment.texture,
            color_attachment.texture_access,
        );

        let mut info = vk::RenderingAttachmentInfo::default()
            .image_view(image_view)
            .image_layout(map_access_flags_to_image_layout(
                color_attachment.texture_access,
            ))
            .load_op(map_load_op(color_attachment.ops.load))
            .store_op(map_store_op(color_attachment.ops.store))
            .clear_value(map_clear_value(&color_attachment.clear_value));

        if let Some(resolve_texture) = &color_attachment.resolve_texture {
            let resolve_view = resolve_attachment(
                device,
                resources,
                &resolve_texture.texture,
                resolve_texture.texture_access,
            );
            info = info
                .resolve_mode(vk::ResolveModeFlags::AVERAGE)
                .resolve_image_view(resolve_view)
                .resolve_image_layout(map_access_flags_to_image_layout(
                    resolve_texture.texture_access,
                ));
        }

        color_attachments.push(info);
    }

    let depth_stencil_attachment =
        render_pass
            .depth_stencil_attachment
            .as_ref()
            .map(|depth_stencil| {
                let image_view = resolve_attachment(
                    device,
                    resources,
                    &depth_stencil.texture,
                    depth_stencil.texture_access,
                );

                let mut info = vk::RenderingAttachmentInfo::default()
                    .image_view(image_view)
                    .image_layout(map_access_flags_to_image_layout(
                        depth_stencil.texture_access,
                    ))
                    .load_op(map_load_op(depth_stencil.ops.load))
                    .store_op(map_store_op(depth_stencil.ops.store))
                    .clear_value(vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue {
                            depth: depth_stencil.clear_value.depth,
                            stencil: depth_stencil.clear_value.stencil,
                        },
                    });

                if let Some(resolve_texture) = &depth_stencil.resolve_texture {
                    let resolve_view = resolve_attachment(
                        device,
                        resources,
                        &resolve_texture.texture,
                        resolve_texture.texture_access,
                    );
                    info = info
                        .resolve_mode(vk::ResolveModeFlags::AVERAGE)
                        .resolve_image_view(resolve_view)
                        .resolve_image_layout(map_access_flags_to_image_layout(
                            resolve_texture.texture_access,
                        ));
                }

                info
            });

    let mut rendering_info = vk::RenderingInfo::default()
        .render_area(vk::Rect2D {
            offset: vk::Offset2D {
                x: render_area.offset.x,
                y: render_area.offset.y,
            },
            extent: vk::Extent2D {
                width: render_area.extent.x,
                height: render_area.extent.y,
            },
        })
        .layer_count(1)
        .color_attachments(&color_attachments);
    if let Some(depth_stencil) = &depth_stencil_attachment {
        rendering_info = rendering_info
            .depth_attachment(depth_stencil)
            .stencil_attachment(depth_stencil);
    }

    unsafe {
        device
            .logical()
            .get_handle()
            .cmd_begin_rendering(command_buffer, &rendering_info);
    }
}

/// Replays a recorded command stream into the bundle's command buffer.
/// Every resource a command touches is pinned through the bundle's
/// reference set, so nothing the GPU may still read can be destroyed
/// before the frame's fence signals.
pub(crate) fn decode(
    device: &Device,
    bundle: &CommandBundle,
    encoder: &CommandEncoder,
) -> vk::CommandBuffer {
    let vk_device = device.logical().get_handle();
    let command_buffer = bundle.command_buffer;
    let mut guard = bundle.thread_data.lock().unwrap();
    let resources = &mut guard.references;

    let mut barrier = BarrierBuilder::new(device.queues().families);
    let mut cache = DecodeCache::default();

    for command in encoder.commands() {
        match command {
            Command::BeginCommandBuffer => {
                let begin_info = vk::CommandBufferBeginInfo::default()
                    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                unsafe {
                    vk_device
                        .begin_command_buffer(command_buffer, &begin_info)
                        .expect("`begin_command_buffer` failed");
                }

                let bindless = device.bindless();
                bindless.bind_descriptor_sets(command_buffer, vk::PipelineBindPoint::GRAPHICS);
                bindless.bind_descriptor_sets(command_buffer, vk::PipelineBindPoint::COMPUTE);

                begin_region(
                    device,
                    command_buffer,
                    "command_buffer",
                    Vec4::new(0.4, 0.4, 0.4, 1.0),
                );
            }
            Command::EndCommandBuffer => {
                end_region(device, command_buffer);
                unsafe {
                    vk_device
                        .end_command_buffer(command_buffer)
                        .expect("`end_command_buffer` failed");
                }
            }
            Command::BeginRegion { name, color } => {
                begin_region(device, command_buffer, name, *color);
            }
            Command::EndRegion => {
                end_region(device, command_buffer);
            }
            Command::BeginRenderPass {
                render_area,
                render_pass,
            } => {
                begin_render_pass(device, resources, command_buffer, render_area, render_pass);
            }
            Command::EndRenderPass => unsafe {
                vk_device.cmd_end_rendering(command_buffer);
            },
            Command::PushConstants { ubo_buffer, offset } => {
                resources.add_reference(device.tracker(), ubo_buffer.handle().id());

                let push_constants = crate::types::PushConstants {
                    buffer_index: ubo_buffer.srv(),
                    buffer_offset: *offset,
                };
                unsafe {
                    vk_device.cmd_push_constants(
                        command_buffer,
                        device.pipeline_layout(),
                        vk::ShaderStageFlags::ALL,
                        0,
                        bytemuck::bytes_of(&push_constants),
                    );
                }
            }
            Command::BindGraphicsPipeline { pipeline } => {
                if cache.graphics_pipeline != *pipeline {
                    resources.add_reference(device.tracker(), pipeline.id());
                    cache.graphics_pipeline = *pipeline;

                    let vk_pipeline = device
                        .graphics_pipelines()
                        .with(*pipeline, |p| p.pipeline())
                        .unwrap_or_else(|_| {
                            panic!("`BindGraphicsPipeline::pipeline` is not alive.")
                        });
                    unsafe {
                        vk_device.cmd_bind_pipeline(
                            command_buffer,
                            vk::PipelineBindPoint::GRAPHICS,
                            vk_pipeline,
                        );
                    }
                }
            }
            Command::SetViewport { viewport } => {
                let vk_viewport = vk::Viewport {
                    x: viewport.rect.offset.x as f32,
                    y: viewport.rect.offset.y as f32,
                    width: viewport.rect.extent.x as f32,
                    height: viewport.rect.extent.y as f32,
                    min_depth: viewport.depth_min,
                    max_depth: viewport.depth_max,
                };
                unsafe {
                    vk_device.cmd_set_viewport(command_buffer, 0, &[vk_viewport]);
                }
            }
            Command::SetScissor { scissor } => {
                let vk_scissor = vk::Rect2D {
                    offset: vk::Offset2D {
                        x: scissor.offset.x,
                        y: scissor.offset.y,
                    },
                    extent: vk::Extent2D {
                        width: scissor.extent.x,
                        height: scissor.extent.y,
                    },
                };
                unsafe {
                    vk_device.cmd_set_scissor(command_buffer, 0, &[vk_scissor]);
                }
            }
            Command::SetCullingMode { culling_mode } => unsafe {
                vk_device.cmd_set_cull_mode(
                    command_buffer,
                    crate::pipeline::graphics::map_culling_mode(*culling_mode),
                );
            },
            Command::BindIndexBuffer {
                buffer,
                offset,
                index_type,
            } => {
                let bind = (*buffer, *index_type, *offset);
                if cache.index_buffer != Some(bind) {
                    resources.add_reference(device.tracker(), buffer.handle().id());
                    cache.index_buffer = Some(bind);

                    let vk_buffer = device
                        .buffers()
                        .with(buffer.handle(), |b| b.handle())
                        .unwrap_or_else(|_| panic!("`BindIndexBuffer::buffer` is not alive."));
                    unsafe {
                        vk_device.cmd_bind_index_buffer(
                            command_buffer,
                            vk_buffer,
                            *offset,
                            map_index_type(*index_type),
                        );
                    }
                }
            }
            Command::Draw {
                vertex_count,
                first_vertex,
            } => unsafe {
                vk_device.cmd_draw(command_buffer, *vertex_count, 1, *first_vertex, 0);
            },
            Command::DrawIndexed {
                indices_count,
                first_index,
                vertex_offset,
            } => unsafe {
                vk_device.cmd_draw_indexed(
                    command_buffer,
                    *indices_count,
                    1,
                    *first_index,
                    *vertex_offset,
                    0,
                );
            },
            Command::DrawIndexedInstanced {
                indices_count,
                num_instances,
                first_index,
                vertex_offset,
                first_instance,
            } => unsafe {
                vk_device.cmd_draw_indexed(
                    command_buffer,
                    *indices_count,
                    *num_instances,
                    *first_index,
                    *vertex_offset,
                    *first_instance,
                );
            },
            Command::DrawIndexedIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                resources.add_reference(device.tracker(), buffer.handle().id());
                let indirect_buffer = device
                    .buffers()
                    .with(buffer.handle(), |b| b.handle())
                    .unwrap_or_else(|_| {
                        panic!("`DrawIndexedIndirect::buffer` is not alive.")
                    });
                unsafe {
                    vk_device.cmd_draw_indexed_indirect(
                        command_buffer,
                        indirect_buffer,
                        *offset,
                        *draw_count,
                        *stride,
                    );
                }
            }
            Command::DrawIndexedIndirectCount {
                buffer,
                offset,
                count_buffer,
                count_buffer_offset,
                max_draw_count,
                stride,
            } => {
                resources.add_reference(device.tracker(), buffer.handle().id());
                resources.add_reference(device.tracker(), count_buffer.handle().id());

                let indirect_buffer = device
                    .buffers()
                    .with(buffer.handle(), |b| b.handle())
                    .unwrap_or_else(|_| {
                        panic!("`DrawIndexedIndirectCount::buffer` is not alive.")
                    });
                let vk_count_buffer = device
                    .buffers()
                    .with(count_buffer.handle(), |b| b.handle())
                    .unwrap_or_else(|_| {
                        panic!("`DrawIndexedIndirectCount::count_buffer` is not alive.")
                    });
                unsafe {
                    vk_device.cmd_draw_indexed_indirect_count(
                        command_buffer,
                        indirect_buffer,
                        *offset,
                        vk_count_buffer,
                        *count_buffer_offset,
                        *max_draw_count,
                        *stride,
                    );
                }
            }
            Command::Dispatch {
                pipeline,
                group_count_x,
                group_count_y,
                group_count_z,
            } => {
                bind_compute_pipeline(device, resources, command_buffer, &mut cache, *pipeline);
                unsafe {
                    vk_device.cmd_dispatch(
                        command_buffer,
                        *group_count_x,
                        *group_count_y,
                        *group_count_z,
                    );
                }
            }
            Command::DispatchIndirect {
                pipeline,
                buffer,
                offset,
            } => {
                resources.add_reference(device.tracker(), buffer.handle().id());
                bind_compute_pipeline(device, resources, command_buffer, &mut cache, *pipeline);

                let indirect_buffer = device
                    .buffers()
                    .with(buffer.handle(), |b| b.handle())
                    .unwrap_or_else(|_| panic!("`DispatchIndirect::buffer` is not alive."));
                unsafe {
                    vk_device.cmd_dispatch_indirect(command_buffer, indirect_buffer, *offset);
                }
            }
            Command::BufferCopy { src, dst, regions } => {
                resources.add_reference(device.tracker(), src.handle().id());
                resources.add_reference(device.tracker(), dst.handle().id());

                let vk_src = device
                    .buffers()
                    .with(src.handle(), |b| b.handle())
                    .unwrap_or_else(|_| panic!("`BufferCopy::src` is not alive."));
                let vk_dst = device
                    .buffers()
                    .with(dst.handle(), |b| b.handle())
                    .unwrap_or_else(|_| panic!("`BufferCopy::dst` is not alive."));

                let vk_regions: Vec<vk::BufferCopy> = regions
                    .iter()
                    .map(|region| vk::BufferCopy {
                        src_offset: region.src_offset,
                        dst_offset: region.dst_offset,
                        size: region.size,
                    })
                    .collect();
                unsafe {
                    vk_device.cmd_copy_buffer(command_buffer, vk_src, vk_dst, &vk_regions);
                }
            }
            Command::TextureCopy {
                src,
                src_texture_access,
                dst,
                dst_texture_access,
                regions,
            } => {
                resources.add_reference(device.tracker(), src.handle().id());
                resources.add_reference(device.tracker(), dst.handle().id());

                let (src_image, src_aspect) = device
                    .textures()
                    .with(src.handle(), |texture| {
                        (
                            texture.image(),
                            map_texture_aspect(texture.format().desc().aspect),
                        )
                    })
                    .unwrap_or_else(|_| panic!("`TextureCopy::src` is not alive."));
                let (dst_image, dst_aspect) = device
                    .textures()
                    .with(dst.handle(), |texture| {
                        (
                            texture.image(),
                            map_texture_aspect(texture.format().desc().aspect),
                        )
                    })
                    .unwrap_or_else(|_| panic!("`TextureCopy::dst` is not alive."));

                let vk_regions: Vec<vk::ImageCopy> = regions
                    .iter()
                    .map(|region| vk::ImageCopy {
                        src_subresource: vk::ImageSubresourceLayers {
                            aspect_mask: src_aspect,
                            mip_level: region.src_subresource.mip_level,
                            base_array_layer: region.src_subresource.first_layer,
                            layer_count: region.src_subresource.layer_count,
                        },
                        src_offset: vk::Offset3D {
                            x: region.src_offset.x,
                            y: region.src_offset.y,
                            z: region.src_offset.z,
                        },
                        dst_subresource: vk::ImageSubresourceLayers {
                            aspect_mask: dst_aspect,
                            mip_level: region.dst_subresource.mip_level,
                            base_array_layer: region.dst_subresource.first_layer,
                            layer_count: region.dst_subresource.layer_count,
                        },
                        dst_offset: vk::Offset3D {
                            x: region.dst_offset.x,
                            y: region.dst_offset.y,
                            z: region.dst_offset.z,
                        },
                        extent: map_extent(region.extent),
                    })
                    .collect();

                unsafe {
                    vk_device.cmd_copy_image(
                        command_buffer,
                        src_image,
                        map_access_flags_to_image_layout(*src_texture_access),
                        dst_image,
                        map_access_flags_to_image_layout(*dst_texture_access),
                        &vk_regions,
                    );
                }
            }
            Command::BufferTextureCopy {
                src,
                dst,
                texture_access,
                regions,
            } => {
                resources.add_reference(device.tracker(), src.handle().id());
                resources.add_reference(device.tracker(), dst.handle().id());

                let src_buffer = device
                    .buffers()
                    .with(src.handle(), |b| b.handle())
                    .unwrap_or_else(|_| panic!("`BufferTextureCopy::src` is not alive."));
                let (dst_image, dst_aspect) = device
                    .textures()
                    .with(dst.handle(), |texture| {
                        (
                            texture.image(),
                            map_texture_aspect(texture.format().desc().aspect),
                        )
                    })
                    .unwrap_or_else(|_| panic!("`BufferTextureCopy::dst` is not alive."));

                let vk_regions =
                    map_buffer_image_regions(regions, dst_aspect);
                unsafe {
                    vk_device.cmd_copy_buffer_to_image(
                        command_buffer,
                        src_buffer,
                        dst_image,
                        map_access_flags_to_image_layout(*texture_access),
                        &vk_regions,
                    );
                }
            }
            Command::TextureBufferCopy {
                src,
                texture_access,
                dst,
                regions,
            } => {
                resources.add_reference(device.tracker(), src.handle().id());
                resources.add_reference(device.tracker(), dst.handle().id());

                let (src_image, src_aspect) = device
                    .textures()
                    .with(src.handle(), |texture| {
                        (
                            texture.image(),
                            map_texture_aspect(texture.format().desc().aspect),
                        )
                    })
                    .unwrap_or_else(|_| panic!("`TextureBufferCopy::src` is not alive."));
                let dst_buffer = device
                    .buffers()
                    .with(dst.handle(), |b| b.handle())
                    .unwrap_or_else(|_| panic!("`TextureBufferCopy::dst` is not alive."));

                let vk_regions =
                    map_buffer_image_regions(regions, src_aspect);
                unsafe {
                    vk_device.cmd_copy_image_to_buffer(
                        command_buffer,
                        src_image,
                        map_access_flags_to_image_layout(*texture_access),
                        dst_buffer,
                        &vk_regions,
                    );
                }
            }
            Command::GlobalBarrier { barrier: global } => {
                barrier.global_barrier(global);
                barrier.execute(vk_device, command_buffer);
                barrier.reset();
            }
            Command::TextureBarrier { barriers } => {
                for texture_barrier in barriers {
                    resources
                        .add_reference(device.tracker(), texture_barrier.texture.handle().id());
                    device
                        .textures()
                        .with(texture_barrier.texture.handle(), |texture| {
                            barrier.texture_barrier(texture, texture_barrier);
                        })
                        .unwrap_or_else(|_| {
                            panic!("`TextureBarrier::texture` is not alive.")
                        });
                }
                barrier.execute(vk_device, command_buffer);
                barrier.reset();
            }
            Command::BufferBarrier { barriers } => {
                for buffer_barrier in barriers {
                    resources
                        .add_reference(device.tracker(), buffer_barrier.buffer.handle().id());
                    device
                        .buffers()
                        .with(buffer_barrier.buffer.handle(), |buffer| {
                            barrier.buffer_barrier(buffer, buffer_barrier);
                        })
                        .unwrap_or_else(|_| panic!("`BufferBarrier::buffer` is not alive."));
                }
                barrier.execute(vk_device, command_buffer);
                barrier.reset();
            }
        }
    }

    command_buffer
}

fn bind_compute_pipeline(
    device: &Device,
    resources: &mut ReferenceSet,
    command_buffer: vk::CommandBuffer,
    cache: &mut DecodeCache,
    pipeline: ComputePipelineHandle,
) {
    if cache.compute_pipeline != pipeline {
        resources.add_reference(device.tracker(), pipeline.id());
        cache.compute_pipeline = pipeline;

        let vk_pipeline = device
            .compute_pipelines()
            .with(pipeline, |p| p.pipeline())
            .unwrap_or_else(|_| panic!("`ComputePipelineHandle` is not alive."));
        unsafe {
            device.logical().get_handle().cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::COMPUTE,
                vk_pipeline,
            );
        }
    }
}

fn map_buffer_image_regions(
    regions: &[crate::types::BufferTextureCopyRegion],
    aspect_mask: vk::ImageAspectFlags,
) -> Vec<vk::BufferImageCopy> {
    regions
        .iter()
        .map(|region| vk::BufferImageCopy {
            buffer_offset: region.buffer_offset,
            buffer_row_length: region.buffer_width,
            buffer_image_height: region.buffer_height,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask,
                mip_level: region.texture_subresource.mip_level,
                base_array_layer: region.texture_subresource.first_layer,
                layer_count: region.texture_subresource.layer_count,
            },
            image_offset: vk::Offset3D::default(),
            image_extent: map_extent(region.texture_extent),
        })
        .collect()
}
