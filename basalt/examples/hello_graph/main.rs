//! Frame-graph demo: three transfer/compute-style passes over transient
//! resources, one of which is dead and culled before any GPU work runs.

use basalt::graph::registry::Registry;
use basalt::types::{
    AccessFlags, BufferUsage, MemoryType, QueueType, SampleCount, TextureKind, TextureTiling,
    TextureUsage,
};
use basalt::{CommandEncoder, Device, DeviceCreateInfo, FrameGraph, TransientResourcePool};

fn main() -> anyhow::Result<()> {
    let device = Device::new(DeviceCreateInfo {
        app_name: "hello_graph".into(),
        display_handle: None,
        enable_debug: std::env::var("BASALT_DEBUG").is_ok(),
        cache_dir: std::env::temp_dir().join("basalt"),
    })?;
    let mut pool = TransientResourcePool::new();

    for frame in 0..3 {
        let mut graph = FrameGraph::new();

        let mut target = None;
        graph.add_pass("clear_target", QueueType::Graphics, |builder| {
            let texture = builder.create_texture(
                "target",
                basalt::resource::TextureCreateInfo {
                    name: String::new(),
                    kind: TextureKind::Texture2D {
                        width: 256,
                        height: 256,
                        num_layers: 1,
                        num_mips: 1,
                        sample_count: SampleCount::Count1,
                    },
                    format: basalt::format::TextureFormat::R16G16B16A16Float,
                    usage: TextureUsage::UAV | TextureUsage::TRANSFER_SRC,
                    tiling: TextureTiling::Optimal,
                    memory_type: MemoryType::Gpu,
                },
            );
            let texture = builder.write(texture, AccessFlags::TRANSFER_WRITE);
            target = Some(texture);
            move |_encoder: &mut CommandEncoder, _registry: &Registry| {
                // A real pass would clear or rasterize here.
            }
        });
        let target = target.unwrap();

        let mut staged = None;
        graph.add_pass("readback", QueueType::Transfer, |builder| {
            let input = builder.read(target, AccessFlags::TRANSFER_READ);
            let output = builder.create_buffer(
                "staging",
                basalt::resource::BufferCreateInfo {
                    name: String::new(),
                    size: 256 * 256 * 8,
                    usage: BufferUsage::TRANSFER_DST,
                    memory_type: MemoryType::Readback,
                },
            );
            let output = builder.write(output, AccessFlags::TRANSFER_WRITE);
            staged = Some(output);
            move |encoder: &mut CommandEncoder, registry: &Registry| {
                let texture = registry.texture(input);
                let buffer = registry.buffer(output);
                encoder.copy_texture_to_buffer(
                    texture,
                    AccessFlags::TRANSFER_READ,
                    buffer,
                    vec![basalt::types::BufferTextureCopyRegion {
                        buffer_offset: 0,
                        buffer_width: 0,
                        buffer_height: 0,
                        texture_subresource: Default::default(),
                        texture_extent: basalt::types::Extent::new(256, 256, 1),
                    }],
                );
            }
        });
        let staged = staged.unwrap();

        graph.add_pass("host_consume", QueueType::Transfer, |builder| {
            let _ = builder.read(staged, AccessFlags::HOST_READ);
            builder.side_effect();
            |_encoder: &mut CommandEncoder, _registry: &Registry| {}
        });

        // Never read, never side-effecting: culled before execution.
        graph.add_pass("debug_overlay", QueueType::Graphics, |builder| {
            let scratch = builder.create_texture(
                "overlay",
                basalt::resource::TextureCreateInfo {
                    name: String::new(),
                    kind: TextureKind::Texture2D {
                        width: 64,
                        height: 64,
                        num_layers: 1,
                        num_mips: 1,
                        sample_count: SampleCount::Count1,
                    },
                    format: basalt::format::TextureFormat::R8G8B8A8Unorm,
                    usage: TextureUsage::COLOR_ATTACHMENT,
                    tiling: TextureTiling::Optimal,
                    memory_type: MemoryType::Gpu,
                },
            );
            let _ = builder.write(scratch, AccessFlags::COLOR_ATTACHMENT_WRITE);
            |_encoder: &mut CommandEncoder, _registry: &Registry| {}
        });

        graph.compile();
        println!("frame {frame}: surviving passes {:?}", graph.alive_pass_names());

        let submits = graph.execute(&device, &mut pool);
        device.submit(submits, Vec::new());
    }

    device.wait_until_idle();
    pool.clear(&device);
    Ok(())
}
