use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ash::vk;
use tracing::{info, warn};

use crate::device::{DeviceProperties, LogicalDevice};

/// Validates the driver-defined 32-byte header at the front of a pipeline
/// cache blob. All fields are little-endian on disk regardless of host
/// byte order.
pub(crate) fn is_pipeline_cache_valid(buffer: &[u8], properties: &DeviceProperties) -> bool {
    const HEADER_SIZE: usize = 32;
    if buffer.len() < HEADER_SIZE {
        return false;
    }

    let read_u32 = |offset: usize| {
        u32::from_le_bytes([
            buffer[offset],
            buffer[offset + 1],
            buffer[offset + 2],
            buffer[offset + 3],
        ])
    };

    let header_size = read_u32(0);
    let header_version = read_u32(4);
    let vendor_id = read_u32(8);
    let device_id = read_u32(12);
    let uuid = &buffer[16..32];

    header_size == 32
        && header_version == vk::PipelineCacheHeaderVersion::ONE.as_raw() as u32
        && vendor_id == properties.vendor_id
        && device_id == properties.device_id
        && uuid == properties.pipeline_cache_uuid
}

fn cache_file_path(cache_dir: &Path, properties: &DeviceProperties) -> PathBuf {
    cache_dir.join("pipeline_cache").join(format!(
        "{}_{}.bin",
        properties.vendor_id, properties.device_id
    ))
}

/// Driver pipeline cache persisted between runs. The cache is hint-only;
/// every I/O failure is logged and ignored.
pub struct PipelineCache {
    handle: vk::PipelineCache,
    device: LogicalDevice,
    file_path: PathBuf,
}

impl PipelineCache {
    pub fn new(
        device: LogicalDevice,
        properties: &DeviceProperties,
        cache_dir: &Path,
    ) -> Result<Self> {
        let file_path = cache_file_path(cache_dir, properties);
        if let Some(parent) = file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!("Failed to create pipeline cache directory: {error}");
            }
        }

        let mut buffer = Vec::new();
        if file_path.exists() {
            match fs::read(&file_path) {
                Ok(bytes) => {
                    if is_pipeline_cache_valid(&bytes, properties) {
                        info!("Pipeline cache: {} has been loaded.", file_path.display());
                        buffer = bytes;
                    } else {
                        info!(
                            "Pipeline cache: {} has been removed due to incompatibility.",
                            file_path.display()
                        );
                        let _ = fs::remove_file(&file_path);
                    }
                }
                Err(error) => warn!("Failed to read pipeline cache: {error}"),
            }
        }

        let create_info = vk::PipelineCacheCreateInfo::default().initial_data(&buffer);
        let handle = unsafe {
            device
                .get_handle()
                .create_pipeline_cache(&create_info, None)?
        };

        Ok(Self {
            handle,
            device,
            file_path,
        })
    }

    pub fn handle(&self) -> vk::PipelineCache {
        self.handle
    }

    fn save(&self) {
        let data = unsafe { self.device.get_handle().get_pipeline_cache_data(self.handle) };
        match data {
            Ok(buffer) => {
                // Write-then-rename keeps a torn write from clobbering a
                // good cache.
                let tmp_path = self.file_path.with_extension("tmp");
                let result = fs::write(&tmp_path, &buffer)
                    .and_then(|_| fs::rename(&tmp_path, &self.file_path));
                match result {
                    Ok(()) => info!(
                        "Pipeline cache has been saved to: `{}`.",
                        self.file_path.display()
                    ),
                    Err(error) => warn!("Failed to save pipeline cache: {error}"),
                }
            }
            // Some drivers refuse until at least one pipeline has been
            // created through the cache.
            Err(error) => warn!("`get_pipeline_cache_data` failed! Error: `{error}`"),
        }
    }
}

impl Drop for PipelineCache {
    fn drop(&mut self) {
        self.save();
        unsafe {
            self.device
                .get_handle()
                .destroy_pipeline_cache(self.handle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_properties() -> DeviceProperties {
        DeviceProperties {
            vendor_id: 0xBEEF,
            device_id: 0x1234,
            pipeline_cache_uuid: [7; 16],
            device_name: "test".into(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
        }
    }

    fn valid_header(properties: &DeviceProperties) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&32u32.to_le_bytes());
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend_from_slice(&properties.vendor_id.to_le_bytes());
        buffer.extend_from_slice(&properties.device_id.to_le_bytes());
        buffer.extend_from_slice(&properties.pipeline_cache_uuid);
        buffer
    }

    #[test]
    fn test_valid_header_accepted() {
        let properties = test_properties();
        assert!(is_pipeline_cache_valid(&valid_header(&properties), &properties));
    }

    #[test]
    fn test_vendor_mismatch_rejected() {
        let properties = test_properties();
        let mut other = properties.clone();
        other.vendor_id = 0xDEAD;
        assert!(!is_pipeline_cache_valid(&valid_header(&other), &properties));
    }

    #[test]
    fn test_uuid_mismatch_rejected() {
        let properties = test_properties();
        let mut buffer = valid_header(&properties);
        buffer[16] ^= 0xFF;
        assert!(!is_pipeline_cache_valid(&buffer, &properties));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let properties = test_properties();
        let buffer = valid_header(&properties);
        assert!(!is_pipeline_cache_valid(&buffer[..16], &properties));
    }

    #[test]
    fn test_wrong_header_size_rejected() {
        let properties = test_properties();
        let mut buffer = valid_header(&properties);
        buffer[0] = 16;
        assert!(!is_pipeline_cache_valid(&buffer, &properties));
    }

    #[test]
    fn test_mismatched_file_is_deleted_shape() {
        // The on-disk flow: a file whose header names another vendor is
        // removed before an empty cache is created. Exercised here through
        // the pure validator plus the filesystem plumbing.
        let dir = tempfile::tempdir().unwrap();
        let properties = test_properties();
        let mut other = properties.clone();
        other.vendor_id = 0xDEAD;

        let path = cache_file_path(dir.path(), &properties);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, valid_header(&other)).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(!is_pipeline_cache_valid(&bytes, &properties));
        fs::remove_file(&path).unwrap();
        assert!(!path.exists());
    }
}
