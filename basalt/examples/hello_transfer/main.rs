//! Headless round trip: upload bytes, copy between GPU buffers with
//! explicit barriers, read them back. No window, no shaders.

use basalt::command::SubmitInfo;
use basalt::types::{
    AccessFlags, BufferBarrier, BufferCopyRegion, BufferSubresourceRange, BufferUpdateRegion,
    BufferUsage, MemoryType, QueueType, SynchronizationStage,
};
use basalt::{CommandEncoder, Device, DeviceCreateInfo};

const PAYLOAD: &[u8] = b"basalt transfer round trip";

fn main() -> anyhow::Result<()> {
    let device = Device::new(DeviceCreateInfo {
        app_name: "hello_transfer".into(),
        display_handle: None,
        enable_debug: std::env::var("BASALT_DEBUG").is_ok(),
        cache_dir: std::env::temp_dir().join("basalt"),
    })?;

    let upload = device.create_buffer(basalt::resource::BufferCreateInfo {
        name: "upload".into(),
        size: PAYLOAD.len() as u64,
        usage: BufferUsage::TRANSFER_SRC,
        memory_type: MemoryType::Upload,
    })?;
    let storage = device.create_buffer(basalt::resource::BufferCreateInfo {
        name: "storage".into(),
        size: PAYLOAD.len() as u64,
        usage: BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST | BufferUsage::UAV,
        memory_type: MemoryType::Gpu,
    })?;
    let readback = device.create_buffer(basalt::resource::BufferCreateInfo {
        name: "readback".into(),
        size: PAYLOAD.len() as u64,
        usage: BufferUsage::TRANSFER_DST,
        memory_type: MemoryType::Readback,
    })?;

    device.update_buffer(
        upload,
        &[BufferUpdateRegion {
            data: PAYLOAD.to_vec(),
            dst_offset: 0,
        }],
    );

    let mut encoder = CommandEncoder::new();
    encoder.begin_command_buffer();
    encoder.begin_region("transfer_round_trip", basalt::glam::Vec4::new(0.3, 0.9, 0.3, 1.0));
    encoder.buffer_copy(
        upload,
        storage,
        vec![BufferCopyRegion {
            src_offset: 0,
            dst_offset: 0,
            size: PAYLOAD.len() as u64,
        }],
    );
    encoder.buffer_barrier(vec![BufferBarrier {
        buffer: storage,
        previous_access: AccessFlags::TRANSFER_WRITE,
        next_access: AccessFlags::TRANSFER_READ,
        source_queue: None,
        destination_queue: None,
        subresource_range: BufferSubresourceRange {
            offset: 0,
            size: PAYLOAD.len() as u64,
        },
    }]);
    encoder.buffer_copy(
        storage,
        readback,
        vec![BufferCopyRegion {
            src_offset: 0,
            dst_offset: 0,
            size: PAYLOAD.len() as u64,
        }],
    );
    encoder.end_region();
    encoder.end_command_buffer();

    device.submit(
        vec![SubmitInfo {
            encoders: vec![encoder],
            synchronization_stage: SynchronizationStage::TOP_OF_PIPE,
            queue_type: QueueType::Transfer,
        }],
        Vec::new(),
    );
    device.wait_until_idle();

    device.destroy_buffer(upload);
    device.destroy_buffer(storage);
    device.destroy_buffer(readback);

    println!("transfer round trip submitted for {} bytes", PAYLOAD.len());
    Ok(())
}
