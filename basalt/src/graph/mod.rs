pub mod builder;
pub mod dependency;
pub mod registry;
pub mod resource;

use std::collections::HashMap;

use glam::Vec4;

use builder::PassBuilder;
use dependency::{DependencyGraph, NodeId};
use registry::Registry;
use resource::{
    BufferHandle, ImportedResource, ResourceInfo, ResourceNode, TextureHandle,
};

use crate::command::{CommandEncoder, SubmitInfo};
use crate::config::MAX_FRAMES_IN_FLIGHT;
use crate::device::Device;
use crate::resource::{BufferCreateInfo, TextureCreateInfo};
use crate::types::{
    AccessFlags, BufferBarrier, BufferSubresourceRange, QueueType, SynchronizationStage,
    TextureBarrier, TextureSubresourceRange,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassHandle(pub(crate) usize);

type RecordFn = Box<dyn FnOnce(&mut CommandEncoder, &Registry)>;

struct PassNode {
    name: String,
    queue_type: QueueType,
    dep_node: NodeId,
    record: Option<RecordFn>,
    creates: Vec<usize>,
    reads: Vec<(usize, AccessFlags)>,
    writes: Vec<(usize, AccessFlags)>,
}

/// Per-frame dependency DAG over virtual resources and passes. Built fresh
/// every frame: declare passes, then `execute` culls unreferenced work,
/// realizes surviving transients, places barriers, and records every
/// surviving pass into command encoders ready for submission.
pub struct FrameGraph {
    dependency: DependencyGraph,
    resources: Vec<ResourceNode>,
    node_to_resource: HashMap<u16, usize>,
    passes: Vec<PassNode>,
    compiled: bool,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    pub fn new() -> Self {
        Self {
            dependency: DependencyGraph::new(),
            resources: Vec::new(),
            node_to_resource: HashMap::new(),
            passes: Vec::new(),
            compiled: false,
        }
    }

    /// Brings a pre-existing texture into the graph. `current_access` is
    /// the access it was left in outside the graph.
    pub fn import_texture(
        &mut self,
        name: impl Into<String>,
        handle: crate::handle::TextureHandle,
        current_access: AccessFlags,
    ) -> TextureHandle {
        let dep_node = self.dependency.add_node();
        let index = self.resources.len();
        self.resources.push(ResourceNode {
            name: name.into(),
            dep_node,
            // The create info is never used for imports; realization maps
            // straight to the physical handle.
            info: ResourceInfo::Texture(TextureCreateInfo {
                name: String::new(),
                kind: crate::types::TextureKind::Texture2D {
                    width: 1,
                    height: 1,
                    num_layers: 1,
                    num_mips: 1,
                    sample_count: crate::types::SampleCount::Count1,
                },
                format: crate::format::TextureFormat::R8G8B8A8Unorm,
                usage: crate::types::TextureUsage::empty(),
                tiling: crate::types::TextureTiling::Optimal,
                memory_type: crate::types::MemoryType::Gpu,
            }),
            imported: Some((ImportedResource::Texture(handle), current_access)),
            creator: None,
            writer: None,
            parent: None,
            version: 0,
            root: dep_node,
        });
        self.node_to_resource.insert(dep_node.0, index);
        TextureHandle::new(dep_node)
    }

    pub fn import_buffer(
        &mut self,
        name: impl Into<String>,
        handle: crate::handle::BufferHandle,
        current_access: AccessFlags,
    ) -> BufferHandle {
        let dep_node = self.dependency.add_node();
        let index = self.resources.len();
        self.resources.push(ResourceNode {
            name: name.into(),
            dep_node,
            info: ResourceInfo::Buffer(BufferCreateInfo {
                name: String::new(),
                size: 0,
                usage: crate::types::BufferUsage::empty(),
                memory_type: crate::types::MemoryType::Gpu,
            }),
            imported: Some((ImportedResource::Buffer(handle), current_access)),
            creator: None,
            writer: None,
            parent: None,
            version: 0,
            root: dep_node,
        });
        self.node_to_resource.insert(dep_node.0, index);
        BufferHandle::new(dep_node)
    }

    /// Adds a pass. `setup` declares the pass's resource usage through the
    /// builder and returns the closure that records the pass's commands at
    /// execution time.
    pub fn add_pass<F, R>(
        &mut self,
        name: impl Into<String>,
        queue_type: QueueType,
        setup: F,
    ) -> PassHandle
    where
        F: FnOnce(&mut PassBuilder) -> R,
        R: FnOnce(&mut CommandEncoder, &Registry) + 'static,
    {
        assert!(!self.compiled, "passes cannot be added after compilation");

        let dep_node = self.dependency.add_node();
        let pass = self.passes.len();
        self.passes.push(PassNode {
            name: name.into(),
            queue_type,
            dep_node,
            record: None,
            creates: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        });

        let record = {
            let mut builder = PassBuilder { graph: self, pass };
            setup(&mut builder)
        };
        self.passes[pass].record = Some(Box::new(record));

        PassHandle(pass)
    }

    pub(crate) fn create_texture_impl(
        &mut self,
        pass: usize,
        create_info: TextureCreateInfo,
    ) -> TextureHandle {
        let dep_node = self.dependency.add_node();
        let pass_node = self.passes[pass].dep_node;
        self.dependency.add_edge(pass_node, dep_node);

        let index = self.resources.len();
        self.resources.push(ResourceNode {
            name: create_info.name.clone(),
            dep_node,
            info: ResourceInfo::Texture(create_info),
            imported: None,
            creator: Some(pass),
            writer: Some(pass),
            parent: None,
            version: 0,
            root: dep_node,
        });
        self.node_to_resource.insert(dep_node.0, index);
        self.passes[pass].creates.push(index);
        TextureHandle::new(dep_node)
    }

    pub(crate) fn create_buffer_impl(
        &mut self,
        pass: usize,
        create_info: BufferCreateInfo,
    ) -> BufferHandle {
        let dep_node = self.dependency.add_node();
        let pass_node = self.passes[pass].dep_node;
        self.dependency.add_edge(pass_node, dep_node);

        let index = self.resources.len();
        self.resources.push(ResourceNode {
            name: create_info.name.clone(),
            dep_node,
            info: ResourceInfo::Buffer(create_info),
            imported: None,
            creator: Some(pass),
            writer: Some(pass),
            parent: None,
            version: 0,
            root: dep_node,
        });
        self.node_to_resource.insert(dep_node.0, index);
        self.passes[pass].creates.push(index);
        BufferHandle::new(dep_node)
    }

    pub(crate) fn read_impl(&mut self, pass: usize, node: NodeId, usage: AccessFlags) -> NodeId {
        let index = self.node_to_resource[&node.0];
        let pass_dep = self.passes[pass].dep_node;

        // The resource version feeds this pass.
        self.dependency.add_edge(node, pass_dep);

        let reads = &mut self.passes[pass].reads;
        if let Some(entry) = reads.iter_mut().find(|(read, _)| *read == index) {
            entry.1 |= usage;
        } else {
            reads.push((index, usage));
        }

        node
    }

    pub(crate) fn write_impl(&mut self, pass: usize, node: NodeId, usage: AccessFlags) -> NodeId {
        let old_index = self.node_to_resource[&node.0];
        let pass_dep = self.passes[pass].dep_node;

        // Writing consumes the previous version and produces the next one.
        self.dependency.add_edge(node, pass_dep);
        let dep_node = self.dependency.add_node();
        self.dependency.add_edge(pass_dep, dep_node);

        let old = &self.resources[old_index];
        let new_node = ResourceNode {
            name: old.name.clone(),
            dep_node,
            info: old.info.clone(),
            imported: old.imported,
            creator: old.creator,
            writer: Some(pass),
            parent: Some(node),
            version: old.version + 1,
            root: old.root,
        };

        let index = self.resources.len();
        self.resources.push(new_node);
        self.node_to_resource.insert(dep_node.0, index);

        let writes = &mut self.passes[pass].writes;
        if let Some(entry) = writes.iter_mut().find(|(write, _)| *write == index) {
            entry.1 |= usage;
        } else {
            writes.push((index, usage));
        }

        dep_node
    }

    pub(crate) fn side_effect_impl(&mut self, pass: usize) {
        let dep_node = self.passes[pass].dep_node;
        self.dependency.mark_uncullable(dep_node);
    }

    /// Culls passes and resource versions nothing observable depends on.
    pub fn compile(&mut self) {
        if !self.compiled {
            self.dependency.cull();
            self.compiled = true;
        }
    }

    pub fn is_pass_alive(&self, pass: PassHandle) -> bool {
        assert!(self.compiled, "compile() the graph before querying liveness");
        self.dependency.is_alive(self.passes[pass.0].dep_node)
    }

    pub fn alive_pass_names(&self) -> Vec<&str> {
        self.passes
            .iter()
            .filter(|pass| self.dependency.is_alive(pass.dep_node))
            .map(|pass| pass.name.as_str())
            .collect()
    }

    pub fn resource_name<T>(&self, handle: resource::GraphHandle<T>) -> &str {
        &self.resources[self.node_to_resource[&handle.node.0]].name
    }

    /// Version of the resource a handle refers to; writes bump it.
    pub fn resource_version<T>(&self, handle: resource::GraphHandle<T>) -> u32 {
        let resource = &self.resources[self.node_to_resource[&handle.node.0]];
        debug_assert_eq!(resource.version == 0, resource.parent.is_none());
        resource.version
    }

    /// Realizes surviving resources, places barriers, and records every
    /// surviving pass. Returns the submit batches in execution order; the
    /// caller forwards them (plus any present infos) to [`Device::submit`].
    pub fn execute(
        mut self,
        device: &Device,
        pool: &mut TransientResourcePool,
    ) -> Vec<SubmitInfo> {
        self.compile();

        let alive_passes: Vec<usize> = (0..self.passes.len())
            .filter(|&pass| self.dependency.is_alive(self.passes[pass].dep_node))
            .collect();
        if alive_passes.is_empty() {
            return Vec::new();
        }

        // Lifetimes of every surviving physical resource, in execution
        // order over the surviving passes.
        let mut root_first_use: HashMap<u16, usize> = HashMap::new();
        let mut root_last_use: HashMap<u16, usize> = HashMap::new();
        for (order, &pass) in alive_passes.iter().enumerate() {
            let pass_node = &self.passes[pass];
            let touched = pass_node
                .creates
                .iter()
                .copied()
                .chain(pass_node.reads.iter().map(|(index, _)| *index))
                .chain(pass_node.writes.iter().map(|(index, _)| *index));
            for index in touched {
                let root = self.resources[index].root;
                root_first_use.entry(root.0).or_insert(order);
                root_last_use.insert(root.0, order);
            }
        }

        // Realization: imported roots map straight through; transients come
        // from the aliasing pool.
        pool.begin_frame();

        let mut roots: Vec<u16> = root_first_use.keys().copied().collect();
        roots.sort_by_key(|root| root_first_use[root]);

        let mut registry = Registry::default();
        let mut initial_access: HashMap<u64, AccessFlags> = HashMap::new();
        let mut root_texture: HashMap<u16, crate::handle::TextureHandle> = HashMap::new();
        let mut root_buffer: HashMap<u16, crate::handle::BufferHandle> = HashMap::new();

        for root in &roots {
            let root_resource = &self.resources[self.node_to_resource[root]];
            let first_use = root_first_use[root];
            let last_use = root_last_use[root];

            debug_assert!(
                root_resource.creator.is_some() || root_resource.imported.is_some(),
                "transient resource has no creating pass"
            );

            match root_resource.imported {
                Some((ImportedResource::Texture(handle), access)) => {
                    initial_access.entry(handle.handle().id()).or_insert(access);
                    root_texture.insert(*root, handle);
                }
                Some((ImportedResource::Buffer(handle), access)) => {
                    initial_access.entry(handle.handle().id()).or_insert(access);
                    root_buffer.insert(*root, handle);
                }
                None => match &root_resource.info {
                    ResourceInfo::Texture(create_info) => {
                        let (handle, access) =
                            pool.acquire_texture(device, create_info, first_use, last_use);
                        initial_access.entry(handle.handle().id()).or_insert(access);
                        root_texture.insert(*root, handle);
                    }
                    ResourceInfo::Buffer(create_info) => {
                        let (handle, access) =
                            pool.acquire_buffer(device, create_info, first_use, last_use);
                        initial_access.entry(handle.handle().id()).or_insert(access);
                        root_buffer.insert(*root, handle);
                    }
                },
            }
        }

        // Every surviving version resolves to its root's physical handle.
        for resource in &self.resources {
            if let Some(handle) = root_texture.get(&resource.root.0) {
                registry.add_texture(resource.dep_node, *handle);
            } else if let Some(handle) = root_buffer.get(&resource.root.0) {
                registry.add_buffer(resource.dep_node, *handle);
            }
        }

        // Barrier placement. Access is tracked per physical resource so
        // aliased transients transition correctly between their users.
        #[derive(Default)]
        struct PlannedBarriers {
            texture_before: Vec<TextureBarrier>,
            buffer_before: Vec<BufferBarrier>,
            texture_after: Vec<TextureBarrier>,
            buffer_after: Vec<BufferBarrier>,
        }

        let mut planned: Vec<PlannedBarriers> = alive_passes
            .iter()
            .map(|_| PlannedBarriers::default())
            .collect();
        let mut current_access = initial_access;
        let mut current_queue: HashMap<u64, QueueType> = HashMap::new();
        let mut last_touch: HashMap<u64, usize> = HashMap::new();

        for (order, &pass) in alive_passes.iter().enumerate() {
            let queue_type = self.passes[pass].queue_type;
            let accesses: Vec<(usize, AccessFlags)> = self.passes[pass]
                .reads
                .iter()
                .chain(self.passes[pass].writes.iter())
                .copied()
                .collect();

            for (index, required) in accesses {
                // Declaration order is the execution order, so a read's
                // writer always precedes its readers.
                debug_assert!(self.resources[index]
                    .writer
                    .map_or(true, |writer| writer <= pass));
                let root = self.resources[index].root;

                if let Some(&texture) = root_texture.get(&root.0) {
                    let id = texture.handle().id();
                    let previous = current_access
                        .get(&id)
                        .copied()
                        .unwrap_or(AccessFlags::NONE);
                    let previous_queue = current_queue.get(&id).copied();
                    let cross_queue =
                        previous_queue.map_or(false, |queue| queue != queue_type);

                    if previous != required || cross_queue {
                        let subresource_range = device
                            .textures()
                            .with(texture.handle(), |t| TextureSubresourceRange {
                                first_mip_level: 0,
                                mip_count: t.num_mips(),
                                first_layer: 0,
                                layer_count: t.kind().num_layers(),
                            })
                            .unwrap_or_default();
                        let barrier = TextureBarrier {
                            texture,
                            previous_access: previous,
                            next_access: required,
                            source_queue: cross_queue.then(|| previous_queue.unwrap()),
                            destination_queue: cross_queue.then_some(queue_type),
                            subresource_range,
                        };
                        if cross_queue {
                            // Matched release on the queue that used the
                            // resource last.
                            planned[last_touch[&id]].texture_after.push(barrier);
                        }
                        planned[order].texture_before.push(barrier);
                    }

                    current_access.insert(id, required);
                    current_queue.insert(id, queue_type);
                    last_touch.insert(id, order);
                } else if let Some(&buffer) = root_buffer.get(&root.0) {
                    let id = buffer.handle().id();
                    let previous = current_access
                        .get(&id)
                        .copied()
                        .unwrap_or(AccessFlags::NONE);
                    let previous_queue = current_queue.get(&id).copied();
                    let cross_queue =
                        previous_queue.map_or(false, |queue| queue != queue_type);

                    if previous != required || cross_queue {
                        let size = device
                            .buffers()
                            .with(buffer.handle(), |b| b.size())
                            .unwrap_or(0);
                        let barrier = BufferBarrier {
                            buffer,
                            previous_access: previous,
                            next_access: required,
                            source_queue: cross_queue.then(|| previous_queue.unwrap()),
                            destination_queue: cross_queue.then_some(queue_type),
                            subresource_range: BufferSubresourceRange { offset: 0, size },
                        };
                        if cross_queue {
                            planned[last_touch[&id]].buffer_after.push(barrier);
                        }
                        planned[order].buffer_before.push(barrier);
                    }

                    current_access.insert(id, required);
                    current_queue.insert(id, queue_type);
                    last_touch.insert(id, order);
                }
            }
        }

        pool.finish(&current_access);

        // Record every surviving pass and batch consecutive same-queue
        // passes into one submit.
        let mut submits: Vec<SubmitInfo> = Vec::new();
        for (order, &pass) in alive_passes.iter().enumerate() {
            let barriers = std::mem::take(&mut planned[order]);
            let pass_node = &mut self.passes[pass];

            let mut encoder = CommandEncoder::new();
            encoder.begin_command_buffer();
            encoder.begin_region(pass_node.name.clone(), Vec4::new(0.2, 0.6, 0.9, 1.0));

            if !barriers.texture_before.is_empty() {
                encoder.texture_barrier(barriers.texture_before);
            }
            if !barriers.buffer_before.is_empty() {
                encoder.buffer_barrier(barriers.buffer_before);
            }

            let record = pass_node.record.take().expect("pass recorded twice");
            record(&mut encoder, &registry);

            if !barriers.texture_after.is_empty() {
                encoder.texture_barrier(barriers.texture_after);
            }
            if !barriers.buffer_after.is_empty() {
                encoder.buffer_barrier(barriers.buffer_after);
            }

            encoder.end_region();
            encoder.end_command_buffer();

            match submits.last_mut() {
                Some(submit) if submit.queue_type == pass_node.queue_type => {
                    submit.encoders.push(encoder);
                }
                _ => submits.push(SubmitInfo {
                    encoders: vec![encoder],
                    synchronization_stage: SynchronizationStage::TOP_OF_PIPE,
                    queue_type: pass_node.queue_type,
                }),
            }
        }

        submits
    }
}

struct PooledTexture {
    key: TextureCreateInfo,
    handle: crate::handle::TextureHandle,
    last_access: AccessFlags,
    frame_last_used: u64,
    /// Execution-order index after which the entry is free again this
    /// frame; `None` while untouched.
    available_after: Option<usize>,
}

struct PooledBuffer {
    key: BufferCreateInfo,
    handle: crate::handle::BufferHandle,
    last_access: AccessFlags,
    frame_last_used: u64,
    available_after: Option<usize>,
}

/// Aliasing pool for transient frame-graph resources. Two virtual
/// resources with identical create infos share one physical resource when
/// their lifetimes don't overlap within a frame; across frames an entry is
/// reused only once its last frame is `MAX_FRAMES_IN_FLIGHT` old, which
/// the frame fence guarantees has retired.
#[derive(Default)]
pub struct TransientResourcePool {
    textures: Vec<PooledTexture>,
    buffers: Vec<PooledBuffer>,
    frame: u64,
}

impl TransientResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_frame(&mut self) {
        self.frame += 1;
        for entry in &mut self.textures {
            entry.available_after = None;
        }
        for entry in &mut self.buffers {
            entry.available_after = None;
        }
    }

    fn acquire_texture(
        &mut self,
        device: &Device,
        create_info: &TextureCreateInfo,
        first_use: usize,
        last_use: usize,
    ) -> (crate::handle::TextureHandle, AccessFlags) {
        let mut key = create_info.clone();
        key.name.clear();

        let frame = self.frame;
        if let Some(entry) = self.textures.iter_mut().find(|entry| {
            entry.key == key
                && match entry.available_after {
                    Some(available_after) => {
                        entry.frame_last_used == frame && available_after < first_use
                    }
                    None => entry.frame_last_used + MAX_FRAMES_IN_FLIGHT as u64 <= frame,
                }
        }) {
            entry.frame_last_used = frame;
            entry.available_after = Some(last_use);
            return (entry.handle, entry.last_access);
        }

        let handle = device
            .create_texture(create_info.clone())
            .expect("failed to realize transient texture");
        self.textures.push(PooledTexture {
            key,
            handle,
            last_access: AccessFlags::NONE,
            frame_last_used: frame,
            available_after: Some(last_use),
        });
        (handle, AccessFlags::NONE)
    }

    fn acquire_buffer(
        &mut self,
        device: &Device,
        create_info: &BufferCreateInfo,
        first_use: usize,
        last_use: usize,
    ) -> (crate::handle::BufferHandle, AccessFlags) {
        let mut key = create_info.clone();
        key.name.clear();

        let frame = self.frame;
        if let Some(entry) = self.buffers.iter_mut().find(|entry| {
            entry.key == key
                && match entry.available_after {
                    Some(available_after) => {
                        entry.frame_last_used == frame && available_after < first_use
                    }
                    None => entry.frame_last_used + MAX_FRAMES_IN_FLIGHT as u64 <= frame,
                }
        }) {
            entry.frame_last_used = frame;
            entry.available_after = Some(last_use);
            return (entry.handle, entry.last_access);
        }

        let handle = device
            .create_buffer(create_info.clone())
            .expect("failed to realize transient buffer");
        self.buffers.push(PooledBuffer {
            key,
            handle,
            last_access: AccessFlags::NONE,
            frame_last_used: frame,
            available_after: Some(last_use),
        });
        (handle, AccessFlags::NONE)
    }

    /// Records the access every pooled resource was left in, so next
    /// frame's first barrier starts from the right state.
    fn finish(&mut self, final_access: &HashMap<u64, AccessFlags>) {
        for entry in &mut self.textures {
            if let Some(access) = final_access.get(&entry.handle.handle().id()) {
                entry.last_access = *access;
            }
        }
        for entry in &mut self.buffers {
            if let Some(access) = final_access.get(&entry.handle.handle().id()) {
                entry.last_access = *access;
            }
        }
    }

    /// Destroys every pooled resource. Call before tearing the device
    /// down.
    pub fn clear(&mut self, device: &Device) {
        for entry in self.textures.drain(..) {
            device.destroy_texture(entry.handle);
        }
        for entry in self.buffers.drain(..) {
            device.destroy_buffer(entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryType, SampleCount, TextureKind, TextureTiling, TextureUsage};

    fn color_target_info() -> TextureCreateInfo {
        TextureCreateInfo {
            name: String::new(),
            kind: TextureKind::Texture2D {
                width: 16,
                height: 16,
                num_layers: 1,
                num_mips: 1,
                sample_count: SampleCount::Count1,
            },
            format: crate::format::TextureFormat::R8G8B8A8Unorm,
            usage: TextureUsage::COLOR_ATTACHMENT,
            tiling: TextureTiling::Optimal,
            memory_type: MemoryType::Gpu,
        }
    }

    #[test]
    fn test_chain_with_side_effect_survives_and_dead_branch_dies() {
        let mut graph = FrameGraph::new();

        let mut produced = None;
        let pass_a = graph.add_pass("a", QueueType::Graphics, |builder| {
            let texture = builder.create_texture("gbuffer", color_target_info());
            let texture =
                builder.write(texture, AccessFlags::COLOR_ATTACHMENT_WRITE);
            produced = Some(texture);
            |_: &mut CommandEncoder, _: &Registry| {}
        });
        let texture_a = produced.unwrap();

        let mut produced = None;
        let pass_b = graph.add_pass("b", QueueType::Graphics, |builder| {
            let input = builder.read(texture_a, AccessFlags::SRV_COMPUTE);
            let output = builder.create_texture("lit", color_target_info());
            let output = builder.write(output, AccessFlags::UAV_COMPUTE);
            let _ = input;
            produced = Some(output);
            |_: &mut CommandEncoder, _: &Registry| {}
        });
        let texture_b = produced.unwrap();

        let pass_c = graph.add_pass("c", QueueType::Graphics, |builder| {
            let _ = builder.read(texture_b, AccessFlags::TRANSFER_READ);
            builder.side_effect();
            |_: &mut CommandEncoder, _: &Registry| {}
        });

        // Pass D writes a texture nobody reads and has no side effects.
        let pass_d = graph.add_pass("d", QueueType::Graphics, |builder| {
            let texture = builder.create_texture("orphan", color_target_info());
            let _ = builder.write(texture, AccessFlags::COLOR_ATTACHMENT_WRITE);
            |_: &mut CommandEncoder, _: &Registry| {}
        });

        graph.compile();
        assert!(graph.is_pass_alive(pass_a));
        assert!(graph.is_pass_alive(pass_b));
        assert!(graph.is_pass_alive(pass_c));
        assert!(!graph.is_pass_alive(pass_d));
        assert_eq!(graph.alive_pass_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_side_effect_culls_everything() {
        let mut graph = FrameGraph::new();

        let mut produced = None;
        let pass_a = graph.add_pass("a", QueueType::Graphics, |builder| {
            let texture = builder.create_texture("t", color_target_info());
            produced = Some(builder.write(texture, AccessFlags::COLOR_ATTACHMENT_WRITE));
            |_: &mut CommandEncoder, _: &Registry| {}
        });
        let texture = produced.unwrap();

        let pass_b = graph.add_pass("b", QueueType::Graphics, |builder| {
            let _ = builder.read(texture, AccessFlags::SRV_GRAPHICS);
            |_: &mut CommandEncoder, _: &Registry| {}
        });

        graph.compile();
        assert!(!graph.is_pass_alive(pass_a));
        assert!(!graph.is_pass_alive(pass_b));
        assert!(graph.alive_pass_names().is_empty());
    }

    #[test]
    fn test_reads_do_not_version_writes_do() {
        let mut graph = FrameGraph::new();

        let mut handles = None;
        graph.add_pass("a", QueueType::Graphics, |builder| {
            let v0 = builder.create_texture("t", color_target_info());
            let read = builder.read(v0, AccessFlags::SRV_GRAPHICS);
            let v1 = builder.write(v0, AccessFlags::COLOR_ATTACHMENT_WRITE);
            handles = Some((v0, read, v1));
            |_: &mut CommandEncoder, _: &Registry| {}
        });

        let (v0, read, v1) = handles.unwrap();
        assert_eq!(v0, read);
        assert_ne!(v0, v1);
        assert_eq!(graph.resource_version(v0), 0);
        assert_eq!(graph.resource_version(v1), 1);
        assert_eq!(graph.resource_name(v1), "t");
    }

    #[test]
    fn test_imported_read_without_side_effect_is_culled() {
        let mut graph = FrameGraph::new();
        let imported = graph.import_texture(
            "backbuffer",
            crate::handle::TextureHandle::default(),
            AccessFlags::NONE,
        );

        let pass = graph.add_pass("reader", QueueType::Graphics, |builder| {
            let _ = builder.read(imported, AccessFlags::SRV_GRAPHICS);
            |_: &mut CommandEncoder, _: &Registry| {}
        });

        graph.compile();
        assert!(!graph.is_pass_alive(pass));
    }
}
