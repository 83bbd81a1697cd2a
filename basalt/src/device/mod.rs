pub mod instance;
pub mod logical;
pub mod physical;
pub mod queue;

pub use instance::Instance;
pub use logical::LogicalDevice;
pub use physical::{DeviceProperties, PhysicalDevice};
pub use queue::{QueueFamilies, Queues};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;
use raw_window_handle::RawDisplayHandle;

use crate::allocator::DeviceAllocator;
use crate::command::pool::CommandPoolManager;
use crate::command::scheduler::SubmitScheduler;
use crate::command::{PresentInfo, SubmitInfo};
use crate::descriptor::BindlessManager;
use crate::handle::{
    Bindable, BufferHandle, ComputePipelineHandle, GraphicsPipelineHandle, SamplerHandle,
    ShaderHandle, SwapchainHandle, TextureHandle, TextureViewHandle,
};
use crate::pipeline::{
    BindlessPipelineLayout, ComputePipeline, ComputePipelineCreateInfo, GraphicsPipeline,
    GraphicsPipelineCreateInfo, PipelineCache,
};
use crate::resource::{
    Buffer, BufferCreateInfo, Sampler, SamplerCreateInfo, Shader, ShaderCreateInfo, Swapchain,
    SwapchainCreateInfo, Texture, TextureCreateInfo, TextureView, TextureViewCreateInfo,
};
use crate::tracker::ResourceTracker;
use crate::types::{BufferUpdateRegion, ShaderStage, SwapchainStatus};
use crate::util::HandleTable;

pub struct DeviceCreateInfo {
    pub app_name: String,
    /// Required when swapchains will be created; enables the surface
    /// instance extensions.
    pub display_handle: Option<RawDisplayHandle>,
    pub enable_debug: bool,
    /// Root for persisted state; the pipeline cache lands under
    /// `<cache_dir>/pipeline_cache/`.
    pub cache_dir: PathBuf,
}

/// The device: owns every handle table, the allocator, the bindless
/// descriptor state, command pools, and the submission scheduler.
/// Create/destroy calls return synchronously; actual destruction is
/// deferred until the last in-flight reference is released, up to
/// `MAX_FRAMES_IN_FLIGHT` frames later.
///
/// Thread safe; encoders are the only single-threaded pieces.
pub struct Device {
    scheduler: Mutex<SubmitScheduler>,
    pool_manager: Arc<CommandPoolManager>,
    bindless: Arc<BindlessManager>,
    pipeline_cache: PipelineCache,
    layout: BindlessPipelineLayout,
    buffers: Arc<HandleTable<Buffer>>,
    textures: Arc<HandleTable<Texture>>,
    texture_views: Arc<HandleTable<TextureView>>,
    samplers: Arc<HandleTable<Sampler>>,
    shaders: Arc<HandleTable<Shader>>,
    graphics_pipelines: Arc<HandleTable<GraphicsPipeline>>,
    compute_pipelines: Arc<HandleTable<ComputePipeline>>,
    swapchains: Arc<HandleTable<Swapchain>>,
    tracker: Arc<ResourceTracker>,
    allocator: Arc<DeviceAllocator>,
    swapchain_ext: ash::khr::swapchain::Device,
    queues: Queues,
    device: LogicalDevice,
    physical: PhysicalDevice,
    instance: Instance,
}

impl Device {
    pub fn new(create_info: DeviceCreateInfo) -> Result<Self> {
        let instance = Instance::new(
            &create_info.app_name,
            create_info.display_handle,
            create_info.enable_debug,
        )?;
        let physical = PhysicalDevice::select(instance.get_handle())?;
        let families = physical.queue_families();

        tracing::info!(
            "Using device `{}` (graphics family {}, compute family {}, transfer family {})",
            physical.properties().device_name,
            families.graphics,
            families.compute,
            families.transfer,
        );

        let priorities = [1.0f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .unique_families()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
            })
            .collect();

        let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
            .timeline_semaphore(true)
            .runtime_descriptor_array(true)
            .descriptor_binding_partially_bound(true)
            .descriptor_binding_update_unused_while_pending(true)
            .descriptor_binding_sampled_image_update_after_bind(true)
            .descriptor_binding_storage_image_update_after_bind(true)
            .descriptor_binding_storage_buffer_update_after_bind(true)
            .shader_sampled_image_array_non_uniform_indexing(true)
            .shader_storage_buffer_array_non_uniform_indexing(true)
            .draw_indirect_count(true);
        let mut features13 =
            vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true);

        let extensions = [ash::khr::swapchain::NAME.as_ptr()];
        let device_ci = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extensions)
            .push_next(&mut features12)
            .push_next(&mut features13);

        let vk_device = unsafe {
            instance
                .get_handle()
                .create_device(physical.get_handle(), &device_ci, None)?
        };
        let device = LogicalDevice::new(
            instance.get_handle(),
            vk_device,
            instance.has_debug_utils(),
        );

        let get_queue = |family: u32| unsafe { device.get_handle().get_device_queue(family, 0) };
        let queues = Queues {
            graphics: get_queue(families.graphics),
            compute: get_queue(families.compute),
            transfer: get_queue(families.transfer),
            present: get_queue(families.present),
            families,
        };

        let allocator = Arc::new(DeviceAllocator::new(
            instance.get_handle(),
            device.get_handle(),
            physical.get_handle(),
        )?);
        let tracker = Arc::new(ResourceTracker::new());

        let layout = BindlessPipelineLayout::new(device.clone())?;
        let bindless = Arc::new(BindlessManager::new(device.clone(), &layout)?);
        let pipeline_cache = PipelineCache::new(
            device.clone(),
            physical.properties(),
            &create_info.cache_dir,
        )?;

        let pool_manager = Arc::new(CommandPoolManager::new(
            device.clone(),
            tracker.clone(),
            families,
        )?);
        let scheduler = Mutex::new(SubmitScheduler::new(device.clone())?);

        let swapchain_ext =
            ash::khr::swapchain::Device::new(instance.get_handle(), device.get_handle());

        Ok(Self {
            scheduler,
            pool_manager,
            bindless,
            pipeline_cache,
            layout,
            buffers: Arc::new(HandleTable::new("Buffer")),
            textures: Arc::new(HandleTable::new("Texture")),
            texture_views: Arc::new(HandleTable::new("TextureView")),
            samplers: Arc::new(HandleTable::new("Sampler")),
            shaders: Arc::new(HandleTable::new("Shader")),
            graphics_pipelines: Arc::new(HandleTable::new("GraphicsPipeline")),
            compute_pipelines: Arc::new(HandleTable::new("ComputePipeline")),
            swapchains: Arc::new(HandleTable::new("Swapchain")),
            tracker,
            allocator,
            swapchain_ext,
            queues,
            device,
            physical,
            instance,
        })
    }

    /// Decodes and submits every batch in list order, interleaves the
    /// swapchain copies, and presents. Blocks only while waiting for the
    /// oldest frame slot's fence. Serialized across threads.
    pub fn submit(
        &self,
        submit_infos: Vec<SubmitInfo>,
        present_infos: Vec<PresentInfo>,
    ) -> SwapchainStatus {
        let mut scheduler = self.scheduler.lock().unwrap();
        scheduler.submit(self, submit_infos, present_infos)
    }

    pub fn wait_until_idle(&self) {
        self.device.wait_until_idle();
    }

    pub fn create_swapchain(&self, create_info: SwapchainCreateInfo) -> Result<SwapchainHandle> {
        let swapchain = Swapchain::new(
            &self.instance,
            self.device.clone(),
            self.physical.get_handle(),
            &create_info,
        )?;
        let handle = self.swapchains.add(swapchain);

        let table = self.swapchains.clone();
        self.tracker.add_resource(handle.id(), move || {
            table.destroy(handle);
        });

        Ok(handle)
    }

    pub fn destroy_swapchain(&self, handle: SwapchainHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.id());
    }

    pub fn create_buffer(&self, create_info: BufferCreateInfo) -> Result<BufferHandle> {
        let buffer = Buffer::new(
            self.device.clone(),
            self.allocator.clone(),
            &self.queues.families.unique_families(),
            &create_info,
        )?;
        let bindings = self.bindless.bind_buffer(&buffer);
        let handle = self.buffers.add(buffer);

        let table = self.buffers.clone();
        let bindless = self.bindless.clone();
        self.tracker.add_resource(handle.id(), move || {
            if let Some(buffer) = table.destroy(handle) {
                drop(buffer);
                bindless.unbind_buffer(bindings);
            }
        });

        Ok(Bindable::new(handle, bindings))
    }

    /// Writes the given regions through the buffer's mapped pointer. The
    /// buffer must live in a host-visible memory type; GPU-only data goes
    /// through a staging buffer and `buffer_copy`.
    pub fn update_buffer(&self, handle: BufferHandle, regions: &[BufferUpdateRegion]) {
        self.buffers
            .with_mut(handle.handle(), |buffer| {
                for region in regions {
                    buffer
                        .write(region.dst_offset, &region.data)
                        .expect("buffer update failed");
                }
            })
            .expect("`update_buffer` called with a dead handle");
    }

    pub fn destroy_buffer(&self, handle: BufferHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.handle().id());
    }

    pub fn create_texture(&self, create_info: TextureCreateInfo) -> Result<TextureHandle> {
        let texture = Texture::new(self.device.clone(), self.allocator.clone(), &create_info)?;
        let bindings = self.bindless.bind_texture(texture.image_view(), texture.usage());
        let handle = self.textures.add(texture);

        let table = self.textures.clone();
        let bindless = self.bindless.clone();
        self.tracker.add_resource(handle.id(), move || {
            if let Some(texture) = table.destroy(handle) {
                drop(texture);
                bindless.unbind_texture(bindings);
            }
        });

        Ok(Bindable::new(handle, bindings))
    }

    pub fn destroy_texture(&self, handle: TextureHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.handle().id());
    }

    pub fn create_texture_view(
        &self,
        create_info: TextureViewCreateInfo,
    ) -> Result<TextureViewHandle> {
        let (image, format, usage, layered) =
            self.textures.with(create_info.texture.handle(), |texture| {
                (
                    texture.image(),
                    texture.format(),
                    texture.usage(),
                    texture.kind().num_layers() > 1,
                )
            })?;

        let texture_view = TextureView::new(
            self.device.clone(),
            image,
            format,
            usage,
            layered,
            &create_info,
        )?;
        let bindings = self
            .bindless
            .bind_texture(texture_view.image_view(), texture_view.usage());
        let handle = self.texture_views.add(texture_view);

        let table = self.texture_views.clone();
        let bindless = self.bindless.clone();
        self.tracker.add_resource(handle.id(), move || {
            if let Some(texture_view) = table.destroy(handle) {
                drop(texture_view);
                bindless.unbind_texture(bindings);
            }
        });

        Ok(Bindable::new(handle, bindings))
    }

    pub fn destroy_texture_view(&self, handle: TextureViewHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.handle().id());
    }

    pub fn create_sampler(&self, create_info: SamplerCreateInfo) -> Result<SamplerHandle> {
        let sampler = Sampler::new(self.device.clone(), &create_info)?;
        let bindings = self.bindless.bind_sampler(&sampler);
        let handle = self.samplers.add(sampler);

        let table = self.samplers.clone();
        let bindless = self.bindless.clone();
        self.tracker.add_resource(handle.id(), move || {
            if let Some(sampler) = table.destroy(handle) {
                drop(sampler);
                bindless.unbind_sampler(bindings);
            }
        });

        Ok(Bindable::new(handle, bindings))
    }

    pub fn destroy_sampler(&self, handle: SamplerHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.handle().id());
    }

    pub fn create_shader(&self, create_info: ShaderCreateInfo) -> Result<ShaderHandle> {
        let shader = Shader::new(self.device.clone(), &create_info)?;
        let handle = self.shaders.add(shader);

        let table = self.shaders.clone();
        self.tracker.add_resource(handle.id(), move || {
            table.destroy(handle);
        });

        Ok(handle)
    }

    pub fn destroy_shader(&self, handle: ShaderHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.id());
    }

    pub fn create_graphics_pipeline(
        &self,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<GraphicsPipelineHandle> {
        let vertex_module = self.shaders.with(create_info.vertex_shader, |shader| {
            assert_eq!(shader.stage(), ShaderStage::Vertex);
            shader.module()
        })?;
        let fragment_module = self.shaders.with(create_info.fragment_shader, |shader| {
            assert_eq!(shader.stage(), ShaderStage::Fragment);
            shader.module()
        })?;

        let pipeline = GraphicsPipeline::new(
            self.device.clone(),
            self.layout.pipeline_layout(),
            self.pipeline_cache.handle(),
            vertex_module,
            fragment_module,
            &create_info,
        )?;
        let handle = self.graphics_pipelines.add(pipeline);

        let table = self.graphics_pipelines.clone();
        self.tracker.add_resource(handle.id(), move || {
            table.destroy(handle);
        });

        Ok(handle)
    }

    pub fn destroy_graphics_pipeline(&self, handle: GraphicsPipelineHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.id());
    }

    pub fn create_compute_pipeline(
        &self,
        create_info: ComputePipelineCreateInfo,
    ) -> Result<ComputePipelineHandle> {
        let compute_module = self.shaders.with(create_info.compute_shader, |shader| {
            assert_eq!(shader.stage(), ShaderStage::Compute);
            shader.module()
        })?;

        let pipeline = ComputePipeline::new(
            self.device.clone(),
            self.layout.pipeline_layout(),
            self.pipeline_cache.handle(),
            compute_module,
            &create_info,
        )?;
        let handle = self.compute_pipelines.add(pipeline);

        let table = self.compute_pipelines.clone();
        self.tracker.add_resource(handle.id(), move || {
            table.destroy(handle);
        });

        Ok(handle)
    }

    pub fn destroy_compute_pipeline(&self, handle: ComputePipelineHandle) {
        assert!(!handle.is_null(), "`handle` must be a valid handle!");
        self.tracker.remove_reference(handle.id());
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.queues.families
    }

    pub fn properties(&self) -> &DeviceProperties {
        self.physical.properties()
    }

    pub(crate) fn logical(&self) -> &LogicalDevice {
        &self.device
    }

    pub(crate) fn queues(&self) -> &Queues {
        &self.queues
    }

    pub(crate) fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    pub(crate) fn bindless(&self) -> &BindlessManager {
        &self.bindless
    }

    pub(crate) fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.layout.pipeline_layout()
    }

    pub(crate) fn pool_manager(&self) -> &CommandPoolManager {
        &self.pool_manager
    }

    pub(crate) fn swapchain_ext(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_ext
    }

    pub(crate) fn buffers(&self) -> &HandleTable<Buffer> {
        &self.buffers
    }

    pub(crate) fn textures(&self) -> &HandleTable<Texture> {
        &self.textures
    }

    pub(crate) fn texture_views(&self) -> &HandleTable<TextureView> {
        &self.texture_views
    }

    pub(crate) fn graphics_pipelines(&self) -> &HandleTable<GraphicsPipeline> {
        &self.graphics_pipelines
    }

    pub(crate) fn compute_pipelines(&self) -> &HandleTable<ComputePipeline> {
        &self.compute_pipelines
    }

    pub(crate) fn swapchains(&self) -> &HandleTable<Swapchain> {
        &self.swapchains
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // Everything in flight must retire before the field drops run:
        // the pool manager drains its reference sets (running deferred
        // destructors), the pipeline cache saves itself, and the handle
        // tables report anything the consumer leaked.
        self.wait_until_idle();
    }
}
