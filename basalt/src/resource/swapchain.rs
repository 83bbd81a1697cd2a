use anyhow::Result;
use ash::vk;
use derivative::Derivative;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::device::{Instance, LogicalDevice};
use crate::handle::{HandleKind, HandleType};
use crate::sync::BinarySemaphore;

#[derive(Debug, Clone)]
pub struct SwapchainCreateInfo {
    pub name: String,
    pub display_handle: RawDisplayHandle,
    pub window_handle: RawWindowHandle,
    /// Used when the surface reports no fixed extent.
    pub preferred_extent: (u32, u32),
}

/// Result of acquiring the next presentable image.
pub struct AcquiredImage {
    pub image_index: u32,
    pub image: vk::Image,
    /// Layout the image was left in by its previous present (UNDEFINED on
    /// first use).
    pub old_layout: vk::ImageLayout,
    /// Signaled when the image is actually available; present waits on it.
    pub semaphore: vk::Semaphore,
    pub suboptimal: bool,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Swapchain {
    handle: vk::SwapchainKHR,
    surface: vk::SurfaceKHR,
    #[derivative(Debug = "ignore")]
    surface_ext: ash::khr::surface::Instance,
    #[derivative(Debug = "ignore")]
    ext: ash::khr::swapchain::Device,
    device: LogicalDevice,
    format: vk::Format,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    image_layouts: Vec<vk::ImageLayout>,
    #[derivative(Debug = "ignore")]
    image_available_semaphores: Vec<BinarySemaphore>,
    acquire_counter: usize,
}

unsafe impl Send for Swapchain {}
unsafe impl Sync for Swapchain {}

impl HandleKind for Swapchain {
    const HANDLE_TYPE: HandleType = HandleType::Swapchain;
}

impl Swapchain {
    pub fn new(
        instance: &Instance,
        device: LogicalDevice,
        physical_device: vk::PhysicalDevice,
        create_info: &SwapchainCreateInfo,
    ) -> Result<Self> {
        let surface = unsafe {
            ash_window::create_surface(
                instance.entry(),
                instance.get_handle(),
                create_info.display_handle,
                create_info.window_handle,
                None,
            )?
        };
        let surface_ext =
            ash::khr::surface::Instance::new(instance.entry(), instance.get_handle());

        let capabilities = unsafe {
            surface_ext.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_ext.get_physical_device_surface_formats(physical_device, surface)?
        };

        let surface_format = formats
            .iter()
            .find(|format| {
                format.format == vk::Format::B8G8R8A8_UNORM
                    && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .copied()
            .unwrap_or(formats[0]);

        let extent = if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: create_info.preferred_extent.0.clamp(
                    capabilities.min_image_extent.width,
                    capabilities.max_image_extent.width,
                ),
                height: create_info.preferred_extent.1.clamp(
                    capabilities.min_image_extent.height,
                    capabilities.max_image_extent.height,
                ),
            }
        };

        let mut image_count = capabilities.min_image_count + 1;
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let swapchain_ci = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            // Presents are blits from renderer-owned textures.
            .image_usage(
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
            )
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true);

        let ext = ash::khr::swapchain::Device::new(instance.get_handle(), device.get_handle());
        let handle = unsafe { ext.create_swapchain(&swapchain_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSwapchainKHR {:?}", handle);

        let images = unsafe { ext.get_swapchain_images(handle)? };
        let image_layouts = vec![vk::ImageLayout::UNDEFINED; images.len()];
        let image_available_semaphores = images
            .iter()
            .map(|_| BinarySemaphore::new(device.clone()))
            .collect::<Result<Vec<_>>>()?;

        if !create_info.name.is_empty() {
            device.set_object_name(handle, &create_info.name);
        }

        Ok(Self {
            handle,
            surface,
            surface_ext,
            ext,
            device,
            format: surface_format.format,
            extent,
            images,
            image_layouts,
            image_available_semaphores,
            acquire_counter: 0,
        })
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Acquires the next image. The stored layout is advanced to
    /// PRESENT_SRC; the caller transitions the image through TRANSFER_DST
    /// and back before presenting. OUT_OF_DATE comes back as `Err` for the
    /// consumer to recreate on.
    pub fn acquire_image(&mut self) -> Result<AcquiredImage, vk::Result> {
        let semaphore = self.image_available_semaphores
            [self.acquire_counter % self.image_available_semaphores.len()]
        .handle();
        self.acquire_counter += 1;

        let (image_index, suboptimal) = unsafe {
            self.ext
                .acquire_next_image(self.handle, u64::MAX, semaphore, vk::Fence::null())?
        };

        let old_layout = self.image_layouts[image_index as usize];
        self.image_layouts[image_index as usize] = vk::ImageLayout::PRESENT_SRC_KHR;

        Ok(AcquiredImage {
            image_index,
            image: self.images[image_index as usize],
            old_layout,
            semaphore,
            suboptimal,
        })
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSwapchainKHR {:?}", self.handle);

        unsafe {
            self.ext.destroy_swapchain(self.handle, None);
            self.surface_ext.destroy_surface(self.surface, None);
        }
    }
}
