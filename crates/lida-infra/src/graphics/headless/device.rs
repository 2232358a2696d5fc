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

use lida_core::renderer::{
    AttachmentDescription, AttachmentReference, DescriptorBinding, DescriptorSetLayoutId,
    DriverHandle, GraphicsDevice, PipelineLayoutDescriptor, PipelineLayoutId, PushConstantRange,
    RenderPassDescriptor, RenderPassId, ResourceError, ResourceKind, ShaderModuleDescriptor,
    ShaderModuleId, ShaderStageFlags,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the headless device recorded about a live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessObject {
    /// A render pass and its translated attachments.
    RenderPass {
        /// Attachment descriptions in declaration order.
        attachments: Vec<AttachmentDescription>,
        /// References to the color attachments.
        color_references: Vec<AttachmentReference>,
        /// Reference to the depth attachment, if any.
        depth_reference: Option<AttachmentReference>,
    },
    /// A shader module.
    ShaderModule {
        /// The debug label.
        label: Option<String>,
        /// Bytecode length in words.
        words: usize,
        /// Stages the module was created for.
        stages: ShaderStageFlags,
    },
    /// A descriptor-set layout.
    DescriptorSetLayout {
        /// The bindings of the layout.
        bindings: Vec<DescriptorBinding>,
    },
    /// A pipeline layout.
    PipelineLayout {
        /// The set layouts, by set index.
        set_layouts: Vec<DescriptorSetLayoutId>,
        /// The push-constant ranges.
        push_constant_ranges: Vec<PushConstantRange>,
    },
}

#[derive(Debug, Default)]
struct HeadlessDeviceInternal {
    next_handle: AtomicU64,
    objects: Mutex<HashMap<DriverHandle, HeadlessObject>>,
    created: [AtomicUsize; 4],
    destroyed: [AtomicUsize; 4],
    fail_next: Mutex<HashSet<ResourceKind>>,
}

/// A clonable software [`GraphicsDevice`].
///
/// Handles are allocated from a single counter starting at 1 and never reused.
/// The device keeps a record of every live object and counts creations and
/// destructions per [`ResourceKind`], which makes it the collaborator of
/// choice for tests and for running without a GPU.
#[derive(Clone, Debug, Default)]
pub struct HeadlessDevice {
    internal: Arc<HeadlessDeviceInternal>,
}

const fn kind_index(kind: ResourceKind) -> usize {
    match kind {
        ResourceKind::RenderPass => 0,
        ResourceKind::ShaderModule => 1,
        ResourceKind::DescriptorSetLayout => 2,
        ResourceKind::PipelineLayout => 3,
    }
}

impl HeadlessDevice {
    /// Creates a device with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next creation of `kind` fail with
    /// [`ResourceError::CreationFailed`].
    pub fn fail_next(&self, kind: ResourceKind) {
        match self.internal.fail_next.lock() {
            Ok(mut pending) => {
                pending.insert(kind);
            }
            Err(e) => log::error!("HeadlessDevice: Mutex poisoned (fail_next): {e}"),
        }
    }

    /// Number of objects of `kind` created so far.
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.internal.created[kind_index(kind)].load(Ordering::Relaxed)
    }

    /// Number of `destroy` calls made for objects of `kind`.
    pub fn destroyed(&self, kind: ResourceKind) -> usize {
        self.internal.destroyed[kind_index(kind)].load(Ordering::Relaxed)
    }

    /// Number of objects currently alive.
    pub fn live_count(&self) -> usize {
        self.internal
            .objects
            .lock()
            .map(|objects| objects.len())
            .unwrap_or(0)
    }

    /// Whether `handle` names a live object.
    pub fn is_live(&self, handle: DriverHandle) -> bool {
        self.object(handle).is_some()
    }

    /// The record of a live object.
    pub fn object(&self, handle: impl Into<DriverHandle>) -> Option<HeadlessObject> {
        let handle = handle.into();
        self.internal
            .objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(&handle).cloned())
    }

    fn check_failure(&self, kind: ResourceKind) -> Result<(), ResourceError> {
        let mut pending = self.internal.fail_next.lock().map_err(|e| {
            ResourceError::Backend(format!("Mutex poisoned (fail_next): {e}"))
        })?;
        if pending.remove(&kind) {
            log::warn!("HeadlessDevice: Failing {kind} creation on request");
            return Err(ResourceError::CreationFailed {
                kind,
                details: "failure requested by the caller".to_string(),
            });
        }
        Ok(())
    }

    fn insert<H>(&self, make: impl FnOnce(u64) -> H, object: HeadlessObject) -> Result<H, ResourceError>
    where
        H: Copy + Into<DriverHandle>,
    {
        let raw = self.internal.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        let id = make(raw);
        let handle: DriverHandle = id.into();
        let mut objects = self
            .internal
            .objects
            .lock()
            .map_err(|e| ResourceError::Backend(format!("Mutex poisoned (objects): {e}")))?;
        objects.insert(handle, object);
        self.internal.created[kind_index(handle.kind())].fetch_add(1, Ordering::Relaxed);
        log::trace!("HeadlessDevice: Created {} {}", handle.kind(), raw);
        Ok(id)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPassId, ResourceError> {
        self.check_failure(ResourceKind::RenderPass)?;
        let count = descriptor.attachments.len() as u32;
        let references = descriptor
            .color_references
            .iter()
            .chain(descriptor.depth_reference.iter());
        for reference in references {
            if reference.attachment >= count {
                return Err(ResourceError::CreationFailed {
                    kind: ResourceKind::RenderPass,
                    details: format!(
                        "reference to attachment {} of {}",
                        reference.attachment, count
                    ),
                });
            }
        }
        self.insert(
            RenderPassId,
            HeadlessObject::RenderPass {
                attachments: descriptor.attachments.to_vec(),
                color_references: descriptor.color_references.to_vec(),
                depth_reference: descriptor.depth_reference,
            },
        )
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        self.check_failure(ResourceKind::ShaderModule)?;
        if descriptor.code.is_empty() {
            return Err(ResourceError::CreationFailed {
                kind: ResourceKind::ShaderModule,
                details: "empty bytecode".to_string(),
            });
        }
        self.insert(
            ShaderModuleId,
            HeadlessObject::ShaderModule {
                label: descriptor.label.map(str::to_owned),
                words: descriptor.code.len(),
                stages: descriptor.stages,
            },
        )
    }

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorSetLayoutId, ResourceError> {
        self.check_failure(ResourceKind::DescriptorSetLayout)?;
        self.insert(
            DescriptorSetLayoutId,
            HeadlessObject::DescriptorSetLayout {
                bindings: bindings.to_vec(),
            },
        )
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        self.check_failure(ResourceKind::PipelineLayout)?;
        self.insert(
            PipelineLayoutId,
            HeadlessObject::PipelineLayout {
                set_layouts: descriptor.set_layouts.to_vec(),
                push_constant_ranges: descriptor.push_constant_ranges.to_vec(),
            },
        )
    }

    fn destroy(&self, handle: DriverHandle) {
        self.internal.destroyed[kind_index(handle.kind())].fetch_add(1, Ordering::Relaxed);
        match self.internal.objects.lock() {
            Ok(mut objects) => {
                if objects.remove(&handle).is_none() {
                    log::error!(
                        "HeadlessDevice: Destroy of unknown {} {}",
                        handle.kind(),
                        handle.raw()
                    );
                }
            }
            Err(e) => log::error!("HeadlessDevice: Mutex poisoned (objects): {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lida_core::renderer::DescriptorType;

    #[test]
    fn handles_are_unique_across_kinds() {
        let device = HeadlessDevice::new();
        let layout = device.create_descriptor_set_layout(&[]).unwrap();
        let pipeline = device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                set_layouts: &[layout],
                push_constant_ranges: &[],
            })
            .unwrap();
        assert_eq!(layout.0, 1);
        assert_eq!(pipeline.0, 2);
        assert_eq!(device.live_count(), 2);
    }

    #[test]
    fn destroy_removes_and_counts() {
        let device = HeadlessDevice::new();
        let binding = DescriptorBinding::new(0, DescriptorType::UniformBuffer, ShaderStageFlags::VERTEX);
        let id = device.create_descriptor_set_layout(&[binding]).unwrap();
        assert_eq!(
            device.object(id),
            Some(HeadlessObject::DescriptorSetLayout {
                bindings: vec![binding]
            })
        );
        device.destroy(id.into());
        assert!(!device.is_live(id.into()));
        assert_eq!(device.created(ResourceKind::DescriptorSetLayout), 1);
        assert_eq!(device.destroyed(ResourceKind::DescriptorSetLayout), 1);
    }

    #[test]
    fn requested_failure_applies_once() {
        let device = HeadlessDevice::new();
        device.fail_next(ResourceKind::DescriptorSetLayout);
        let err = device.create_descriptor_set_layout(&[]).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::CreationFailed {
                kind: ResourceKind::DescriptorSetLayout,
                ..
            }
        ));
        assert!(device.create_descriptor_set_layout(&[]).is_ok());
        assert_eq!(device.created(ResourceKind::DescriptorSetLayout), 1);
    }

    #[test]
    fn dangling_attachment_reference_is_rejected() {
        let device = HeadlessDevice::new();
        let descriptor = RenderPassDescriptor {
            attachments: &[],
            color_references: &[AttachmentReference {
                attachment: 0,
                layout: lida_core::renderer::ImageLayout::ColorAttachmentOptimal,
            }],
            depth_reference: None,
        };
        assert!(device.create_render_pass(&descriptor).is_err());
        assert_eq!(device.live_count(), 0);
    }
}
