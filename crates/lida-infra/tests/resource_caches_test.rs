// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use lida_core::renderer::{
    AttachmentInfo, AttachmentOp, DescriptorBinding, DescriptorType, Format, ImageLayout, LoadOp,
    ResourceKind, ShaderError, ShaderLoader, ShaderStageFlags, StoreOp,
};
use lida_data::spirv::assembler::ModuleBuilder;
use lida_data::spirv::opcodes::{execution_model, storage_class};
use lida_data::{Arena, ReflectError};
use lida_infra::graphics::headless::HeadlessObject;
use lida_infra::{CacheBudgets, CacheError, HeadlessDevice, ResourceCaches};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves modules from memory and counts every load and release.
#[derive(Default)]
struct MemoryLoader {
    modules: HashMap<String, Vec<u8>>,
    loads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl MemoryLoader {
    fn with(mut self, tag: &str, bytes: Vec<u8>) -> Self {
        self.modules.insert(tag.to_string(), bytes);
        self
    }
}

impl ShaderLoader for MemoryLoader {
    fn load(&self, tag: &str) -> Result<Vec<u8>, ShaderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.modules
            .get(tag)
            .cloned()
            .ok_or_else(|| ShaderError::NotFound {
                tag: tag.to_string(),
            })
    }

    fn release(&self, _tag: &str, _bytes: Vec<u8>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn vertex_shader() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    m.entry_point(execution_model::VERTEX, "main");
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    let mat4 = m.type_matrix(vec4, 4);
    m.uniform_block(&[mat4], 0, 0);
    m.push_constant_block(&[mat4]);
    m.build_bytes()
}

fn fragment_shader() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    m.entry_point(execution_model::FRAGMENT, "main");
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    m.uniform_block(&[vec4], 0, 0);
    let image = m.type_image(float);
    let sampled = m.type_sampled_image(image);
    let pointer = m.type_pointer(storage_class::UNIFORM_CONSTANT, sampled);
    let texture = m.variable(pointer, storage_class::UNIFORM_CONSTANT);
    m.bind(texture, 0, 1);
    m.push_constant_block(&[vec4, vec4, vec4, vec4, vec4]);
    m.build_bytes()
}

/// A uniform variable whose struct type lacks the `Block` decoration.
fn undecorated_uniform_shader() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    m.entry_point(execution_model::VERTEX, "main");
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    let plain = m.type_struct(&[vec4]);
    let pointer = m.type_pointer(storage_class::UNIFORM, plain);
    let variable = m.variable(pointer, storage_class::UNIFORM);
    m.bind(variable, 0, 0);
    m.build_bytes()
}

fn setup(loader: MemoryLoader) -> Result<(HeadlessDevice, ResourceCaches)> {
    let device = HeadlessDevice::new();
    let caches = ResourceCaches::new(
        Arc::new(device.clone()),
        Box::new(loader),
        Arena::new(64 * 1024),
        CacheBudgets::default(),
    )?;
    Ok((device, caches))
}

#[test]
fn test_render_pass_is_created_once() -> Result<()> {
    let (device, mut caches) = setup(MemoryLoader::default())?;
    let attachments = [
        AttachmentInfo::present(Format::Bgra8Srgb),
        AttachmentInfo::transient_depth(Format::D32Sfloat),
    ];

    let first = caches.render_pass(&attachments)?;
    let second = caches.render_pass(&attachments)?;
    assert_eq!(first, second);
    assert_eq!(device.created(ResourceKind::RenderPass), 1);

    match device.object(first) {
        Some(HeadlessObject::RenderPass {
            attachments,
            color_references,
            depth_reference,
        }) => {
            assert_eq!(attachments.len(), 2);
            assert_eq!(attachments[0].load_op, LoadOp::Clear);
            assert_eq!(attachments[0].store_op, StoreOp::Store);
            assert_eq!(attachments[1].store_op, StoreOp::DontCare);
            assert_eq!(color_references.len(), 1);
            assert_eq!(color_references[0].attachment, 0);
            let depth = depth_reference.expect("depth reference");
            assert_eq!(depth.attachment, 1);
            assert_eq!(depth.layout, ImageLayout::DepthStencilAttachmentOptimal);
        }
        other => panic!("unexpected record: {other:?}"),
    }
    Ok(())
}

fn distinct_attachments() -> Vec<AttachmentInfo> {
    let formats = [
        Format::R8Unorm,
        Format::R8Snorm,
        Format::R8Uscaled,
        Format::Rgba8Unorm,
        Format::Bgra8Srgb,
    ];
    let load_ops = [AttachmentOp::None, AttachmentOp::Load, AttachmentOp::Clear];
    formats
        .iter()
        .flat_map(|&format| {
            load_ops.iter().map(move |&load_op| AttachmentInfo {
                format,
                load_op,
                store_op: AttachmentOp::Store,
                initial_layout: ImageLayout::General,
                final_layout: ImageLayout::General,
                work_layout: ImageLayout::ColorAttachmentOptimal,
            })
        })
        .collect()
}

#[test]
fn test_eviction_destroys_least_recent_pass() -> Result<()> {
    let (device, mut caches) = setup(MemoryLoader::default())?;
    let capacity = caches.render_passes().stats().capacity;
    let attachments = distinct_attachments();
    assert!(capacity < attachments.len());

    let ids = attachments[..=capacity]
        .iter()
        .map(|a| caches.render_pass(std::slice::from_ref(a)))
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(device.created(ResourceKind::RenderPass), capacity + 1);
    assert_eq!(device.destroyed(ResourceKind::RenderPass), 1);
    assert!(!device.is_live(ids[0].into()));
    assert!(ids[1..].iter().all(|&id| device.is_live(id.into())));
    assert_eq!(caches.render_passes().len(), capacity);
    assert_eq!(caches.render_passes().stats().evictions, 1);
    Ok(())
}

#[test]
fn test_failed_creation_leaves_no_entry() -> Result<()> {
    let (device, mut caches) = setup(MemoryLoader::default())?;
    let bindings = [DescriptorBinding::new(
        0,
        DescriptorType::UniformBuffer,
        ShaderStageFlags::VERTEX,
    )];

    device.fail_next(ResourceKind::DescriptorSetLayout);
    assert!(matches!(
        caches.descriptor_set_layout(&bindings),
        Err(CacheError::Resource(_))
    ));
    assert!(caches.descriptor_set_layouts().is_empty());

    let id = caches.descriptor_set_layout(&bindings)?;
    assert_eq!(caches.descriptor_set_layouts().len(), 1);
    assert_eq!(caches.descriptor_set_layout(&bindings)?, id);
    assert_eq!(device.created(ResourceKind::DescriptorSetLayout), 1);
    Ok(())
}

#[test]
fn test_shader_is_loaded_and_released_once_per_miss() -> Result<()> {
    let loader = MemoryLoader::default().with("mesh.vert", vertex_shader());
    let (loads, releases) = (Arc::clone(&loader.loads), Arc::clone(&loader.releases));
    let (device, mut caches) = setup(loader)?;

    let first = caches.shader("mesh.vert")?;
    let second = caches.shader("mesh.vert")?;
    assert_eq!(first, second);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(first.stages(), ShaderStageFlags::VERTEX);
    assert_eq!(device.created(ResourceKind::ShaderModule), 1);

    assert!(caches.shader("missing.frag").is_err());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(caches.shaders().len(), 1);
    Ok(())
}

#[test]
fn test_shader_without_magic_is_cached_unreflected() -> Result<()> {
    let loader = MemoryLoader::default().with("blob", vec![0xAB; 64]);
    let (device, mut caches) = setup(loader)?;

    let entry = caches.shader("blob")?;
    assert!(entry.reflection.is_none());
    assert!(device.is_live(entry.module.into()));
    Ok(())
}

#[test]
fn test_unaligned_shader_is_rejected() -> Result<()> {
    let loader = MemoryLoader::default().with("odd", vec![0; 7]);
    let releases = Arc::clone(&loader.releases);
    let (device, mut caches) = setup(loader)?;

    assert!(matches!(
        caches.shader("odd"),
        Err(CacheError::Shader(ShaderError::UnalignedBytecode { len: 7, .. }))
    ));
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(device.created(ResourceKind::ShaderModule), 0);
    assert!(caches.shaders().is_empty());
    Ok(())
}

#[test]
fn test_reflection_failure_creates_nothing() -> Result<()> {
    let loader = MemoryLoader::default().with("bad.vert", undecorated_uniform_shader());
    let (loads, releases) = (Arc::clone(&loader.loads), Arc::clone(&loader.releases));
    let (device, mut caches) = setup(loader)?;

    let err = caches.shader("bad.vert").unwrap_err();
    let CacheError::Reflect { tag, source } = &err else {
        panic!("expected a reflection error, got {err:?}");
    };
    assert_eq!(tag, "bad.vert");
    assert!(matches!(source, ReflectError::UnsupportedType { .. }));
    assert!(!source.is_soft());

    assert!(caches.shaders().is_empty());
    assert!(caches.cached_shader("bad.vert").is_none());
    assert_eq!(device.created(ResourceKind::ShaderModule), 0);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(caches.arena_stats().front_bytes, 0);

    // A retry goes back to the loader instead of hitting a stale slot.
    assert!(caches.shader("bad.vert").is_err());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_cached_objects_are_read_back_from_the_arena() -> Result<()> {
    let loader = MemoryLoader::default().with("mesh.vert", vertex_shader());
    let (_device, mut caches) = setup(loader)?;

    let pass = caches.render_pass(&[AttachmentInfo::present(Format::Bgra8Srgb)])?;
    let shader = caches.shader("mesh.vert")?;

    let budgets = CacheBudgets::default();
    assert_eq!(caches.arena_stats().back_bytes, budgets.total());
    let passes: Vec<_> = caches
        .render_passes()
        .entries(caches.arena())
        .map(|(key, id)| (key.len(), *id))
        .collect();
    assert_eq!(passes, vec![(1, pass)]);
    assert_eq!(caches.cached_shader("mesh.vert"), Some(shader));
    let (key, entry) = caches
        .shaders()
        .entries(caches.arena())
        .next()
        .expect("one shader entry");
    assert_eq!(key.as_str(), "mesh.vert");
    assert_eq!(entry.reflection, shader.reflection);
    Ok(())
}

#[test]
fn test_pipeline_layout_merges_shader_stages() -> Result<()> {
    let loader = MemoryLoader::default()
        .with("mesh.vert", vertex_shader())
        .with("mesh.frag", fragment_shader());
    let (device, mut caches) = setup(loader)?;

    let layout = caches.pipeline_layout_for_shaders(&["mesh.vert", "mesh.frag"])?;
    let again = caches.pipeline_layout_for_shaders(&["mesh.vert", "mesh.frag"])?;
    assert_eq!(layout, again);
    assert_eq!(device.created(ResourceKind::PipelineLayout), 1);
    assert_eq!(device.created(ResourceKind::DescriptorSetLayout), 1);

    let Some(HeadlessObject::PipelineLayout {
        set_layouts,
        push_constant_ranges,
    }) = device.object(layout)
    else {
        panic!("pipeline layout not recorded");
    };
    assert_eq!(set_layouts.len(), 1);
    assert_eq!(push_constant_ranges.len(), 1);
    assert_eq!(push_constant_ranges[0].size, 80);
    assert_eq!(
        push_constant_ranges[0].stages,
        ShaderStageFlags::VERTEX_FRAGMENT
    );

    let Some(HeadlessObject::DescriptorSetLayout { bindings }) = device.object(set_layouts[0])
    else {
        panic!("set layout not recorded");
    };
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].binding, 0);
    assert_eq!(bindings[0].descriptor_type, DescriptorType::UniformBuffer);
    assert_eq!(bindings[0].stages, ShaderStageFlags::VERTEX_FRAGMENT);
    assert_eq!(bindings[1].descriptor_type, DescriptorType::CombinedImageSampler);
    assert_eq!(bindings[1].stages, ShaderStageFlags::FRAGMENT);
    Ok(())
}

#[test]
fn test_destroy_all_releases_every_object() -> Result<()> {
    let loader = MemoryLoader::default()
        .with("mesh.vert", vertex_shader())
        .with("mesh.frag", fragment_shader());
    let (device, mut caches) = setup(loader)?;

    caches.render_pass(&[AttachmentInfo::present(Format::Bgra8Srgb)])?;
    caches.pipeline_layout_for_shaders(&["mesh.vert", "mesh.frag"])?;
    assert!(device.live_count() > 0);

    caches.destroy_all();
    assert_eq!(device.live_count(), 0);
    for kind in ResourceKind::ALL {
        assert_eq!(device.created(kind), device.destroyed(kind), "{kind}");
    }
    assert!(caches.shaders().is_empty());

    // The caches stay usable after teardown.
    caches.render_pass(&[AttachmentInfo::present(Format::Bgra8Srgb)])?;
    assert_eq!(device.live_count(), 1);
    Ok(())
}

#[test]
fn test_budgets_larger_than_arena_are_rejected() {
    let result = ResourceCaches::new(
        Arc::new(HeadlessDevice::new()),
        Box::new(MemoryLoader::default()),
        Arena::new(1024),
        CacheBudgets::default(),
    );
    assert!(matches!(result, Err(CacheError::Lru(_))));
}
