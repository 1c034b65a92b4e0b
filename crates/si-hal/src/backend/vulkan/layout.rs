//! Descriptor-set layout translation and the shared layout cache.
//!
//! One descriptor set per update frequency: set 0 holds the least
//! frequently updated slots. Abstract slots live in per-kind namespaces
//! while native binding numbers are unique per set, so each set assigns
//! binding numbers sequentially in sorted (kind, slot) order. The sort
//! also makes the assignment independent of declaration order, matching
//! the layout signature.

use std::sync::Arc;

use ash::vk;

use crate::binding::{BindingLayoutDesc, BindingSlotDesc, LayoutCache, ResourceKind};
use crate::error::Result;
use crate::shader::StageFlags;

pub fn descriptor_type(kind: ResourceKind) -> vk::DescriptorType {
    match kind {
        ResourceKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ResourceKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        ResourceKind::Sampler => vk::DescriptorType::SAMPLER,
        ResourceKind::Texture => vk::DescriptorType::SAMPLED_IMAGE,
        ResourceKind::StorageTexture => vk::DescriptorType::STORAGE_IMAGE,
        ResourceKind::CombinedTextureSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub fn shader_stage_flags(stages: StageFlags) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(StageFlags::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(StageFlags::TESS_CONTROL) {
        flags |= vk::ShaderStageFlags::TESSELLATION_CONTROL;
    }
    if stages.contains(StageFlags::TESS_EVAL) {
        flags |= vk::ShaderStageFlags::TESSELLATION_EVALUATION;
    }
    if stages.contains(StageFlags::GEOMETRY) {
        flags |= vk::ShaderStageFlags::GEOMETRY;
    }
    if stages.contains(StageFlags::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(StageFlags::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}

/// Where an abstract slot landed inside one descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingAssignment {
    pub kind: ResourceKind,
    pub slot: u32,
    /// Native binding number within the set.
    pub binding: u32,
}

/// Assign native binding numbers to a set's slots, sequential in sorted
/// (kind, slot) order.
pub fn assign_bindings(entries: &[BindingSlotDesc]) -> Vec<BindingAssignment> {
    let mut order: Vec<&BindingSlotDesc> = entries.iter().collect();
    order.sort_by_key(|e| (e.kind, e.slot));
    order
        .iter()
        .enumerate()
        .map(|(binding, e)| BindingAssignment {
            kind: e.kind,
            slot: e.slot,
            binding: binding as u32,
        })
        .collect()
}

fn build_vk_bindings(entries: &[BindingSlotDesc]) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    let mut order: Vec<&BindingSlotDesc> = entries.iter().collect();
    order.sort_by_key(|e| (e.kind, e.slot));
    order
        .iter()
        .enumerate()
        .map(|(binding, e)| {
            vk::DescriptorSetLayoutBinding::default()
                .binding(binding as u32)
                .descriptor_type(descriptor_type(e.kind))
                .descriptor_count(e.array_size)
                .stage_flags(shader_stage_flags(e.stages))
        })
        .collect()
}

/// An immutable descriptor-set layout plus the slot-to-binding table that
/// produced it.
pub struct DescriptorSetLayoutObject {
    raw: vk::DescriptorSetLayout,
    assignments: Vec<BindingAssignment>,
}

impl DescriptorSetLayoutObject {
    pub fn raw(&self) -> vk::DescriptorSetLayout {
        self.raw
    }

    /// Native binding number for an abstract slot, `None` when the slot is
    /// not part of this set.
    pub fn binding_of(&self, kind: ResourceKind, slot: u32) -> Option<u32> {
        self.assignments
            .iter()
            .find(|a| a.kind == kind && a.slot == slot)
            .map(|a| a.binding)
    }

    pub fn assignments(&self) -> &[BindingAssignment] {
        &self.assignments
    }
}

/// Signature-keyed cache of descriptor-set layouts.
///
/// Owns every layout it hands out; pipelines hold `Arc` references but
/// never destroy them. Tear down with [`destroy_all`](Self::destroy_all)
/// after the last pipeline is gone.
pub struct DescriptorLayoutCache {
    cache: LayoutCache<DescriptorSetLayoutObject>,
}

impl DescriptorLayoutCache {
    pub fn new() -> Self {
        Self {
            cache: LayoutCache::new(),
        }
    }

    /// Resolve the per-frequency set layouts for a binding description,
    /// creating the ones not yet cached.
    pub fn layouts_for(
        &self,
        device: &ash::Device,
        desc: &BindingLayoutDesc,
    ) -> Result<Vec<Arc<DescriptorSetLayoutObject>>> {
        desc.partition()
            .into_iter()
            .map(|group| {
                self.cache.get_or_create(group.signature(), || {
                    create_layout(device, &group.entries)
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Destroy every cached layout.
    ///
    /// # Safety
    ///
    /// No pipeline may still use the layouts and `device` must be the one
    /// they were created on.
    pub unsafe fn destroy_all(&self, device: &ash::Device) {
        for layout in self.cache.drain() {
            device.destroy_descriptor_set_layout(layout.raw, None);
        }
    }
}

impl Default for DescriptorLayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

fn create_layout(
    device: &ash::Device,
    entries: &[BindingSlotDesc],
) -> Result<DescriptorSetLayoutObject> {
    let bindings = build_vk_bindings(entries);
    let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    let raw = unsafe { device.create_descriptor_set_layout(&info, None) }?;

    si_core::binding_trace!(bindings = bindings.len(), "descriptor set layout created");
    Ok(DescriptorSetLayoutObject {
        raw,
        assignments: assign_bindings(entries),
    })
}
