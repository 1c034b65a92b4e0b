//! Abstract resource-binding model.
//!
//! Callers describe how abstract resource slots map to binding points with
//! a [`BindingLayoutDesc`]; each backend interprets it its own way. The
//! immediate-mode backend keeps a lazy lookup table, the explicit backend
//! turns frequency groups into immutable descriptor-set layouts. Layout
//! objects are comparatively expensive to create and many pipelines share
//! identical signatures, so both backends share them structurally through
//! a [`LayoutCache`] keyed by [`LayoutSignature`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{HalError, Result};
use crate::shader::StageFlags;

/// Kind of resource bound at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    UniformBuffer,
    StorageBuffer,
    Sampler,
    Texture,
    StorageTexture,
    CombinedTextureSampler,
}

impl ResourceKind {
    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::UniformBuffer => "uniform buffer",
            ResourceKind::StorageBuffer => "storage buffer",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Texture => "texture",
            ResourceKind::StorageTexture => "storage texture",
            ResourceKind::CombinedTextureSampler => "combined texture-sampler",
        }
    }
}

/// How often the resources in a slot are expected to be rebound.
///
/// The explicit backend partitions slots into one descriptor-set layout
/// per frequency; slot order inside a group does not affect the layout
/// signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum UpdateFrequency {
    /// Bound once, reused for many frames.
    Static,
    /// Rebound about once per frame.
    PerFrame,
    /// Rebound per draw or dispatch.
    #[default]
    PerDraw,
}

/// One abstract slot in a binding layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSlotDesc {
    /// Resource name as declared in the shader. Cosmetic for matching
    /// diagnostics only; identity is (kind, slot).
    pub name: String,
    pub slot: u32,
    pub kind: ResourceKind,
    pub stages: StageFlags,
    pub frequency: UpdateFrequency,
    pub array_size: u32,
}

impl BindingSlotDesc {
    pub fn new(name: impl Into<String>, slot: u32, kind: ResourceKind, stages: StageFlags) -> Self {
        Self {
            name: name.into(),
            slot,
            kind,
            stages,
            frequency: UpdateFrequency::default(),
            array_size: 1,
        }
    }

    pub fn with_frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }
}

/// Ordered description of every slot a pipeline binds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingLayoutDesc {
    entries: Vec<BindingSlotDesc>,
}

impl BindingLayoutDesc {
    /// Build a layout description, rejecting duplicate (kind, slot) pairs.
    pub fn new(entries: Vec<BindingSlotDesc>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            let clash = entries[..i]
                .iter()
                .any(|e| e.kind == entry.kind && e.slot == entry.slot);
            if clash {
                return Err(HalError::DuplicateBindingSlot {
                    kind: entry.kind.name(),
                    slot: entry.slot,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BindingSlotDesc] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a slot by kind and index.
    pub fn find(&self, kind: ResourceKind, slot: u32) -> Option<&BindingSlotDesc> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.slot == slot)
    }

    /// Partition the slots into per-frequency groups, ordered from least
    /// to most frequently updated. Empty frequencies produce no group.
    pub fn partition(&self) -> Vec<BindingGroup> {
        let mut groups: Vec<BindingGroup> = Vec::new();
        for frequency in [
            UpdateFrequency::Static,
            UpdateFrequency::PerFrame,
            UpdateFrequency::PerDraw,
        ] {
            let entries: Vec<BindingSlotDesc> = self
                .entries
                .iter()
                .filter(|e| e.frequency == frequency)
                .cloned()
                .collect();
            if !entries.is_empty() {
                groups.push(BindingGroup { frequency, entries });
            }
        }
        groups
    }

    /// Signature over the whole description, ignoring declaration order
    /// and names.
    pub fn signature(&self) -> LayoutSignature {
        LayoutSignature::from_entries(self.entries.iter())
    }
}

/// One frequency partition of a [`BindingLayoutDesc`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGroup {
    pub frequency: UpdateFrequency,
    pub entries: Vec<BindingSlotDesc>,
}

impl BindingGroup {
    /// Signature of this group alone.
    pub fn signature(&self) -> LayoutSignature {
        LayoutSignature::from_entries(self.entries.iter())
    }
}

/// Structural identity of a binding layout: the sorted (kind, slot,
/// stages, count) tuples. Names and declaration order are excluded, so
/// renaming a resource cannot defeat layout sharing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutSignature {
    entries: Vec<SignatureEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct SignatureEntry {
    kind: ResourceKind,
    slot: u32,
    stage_bits: u8,
    count: u32,
}

impl LayoutSignature {
    fn from_entries<'a>(entries: impl Iterator<Item = &'a BindingSlotDesc>) -> Self {
        let mut entries: Vec<SignatureEntry> = entries
            .map(|e| SignatureEntry {
                kind: e.kind,
                slot: e.slot,
                stage_bits: e.stages.bits(),
                count: e.array_size,
            })
            .collect();
        entries.sort();
        Self { entries }
    }
}

/// Signature-keyed cache of shared, immutable layout objects.
///
/// Once created, a layout object never changes; every pipeline with the
/// same signature references the same `Arc`. The mutex only guards the
/// map itself; all calls happen on the thread owning the native context.
pub struct LayoutCache<T> {
    entries: Mutex<HashMap<LayoutSignature, Arc<T>>>,
}

impl<T> LayoutCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the shared object for `signature`, building it on first use.
    pub fn get_or_insert_with(
        &self,
        signature: LayoutSignature,
        build: impl FnOnce() -> T,
    ) -> Arc<T> {
        let mut entries = self.entries.lock();
        entries
            .entry(signature)
            .or_insert_with(|| Arc::new(build()))
            .clone()
    }

    /// Fallible variant: the builder's error passes through and nothing is
    /// cached on failure.
    pub fn get_or_create<E>(
        &self,
        signature: LayoutSignature,
        build: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<Arc<T>, E> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&signature) {
            return Ok(existing.clone());
        }
        let object = Arc::new(build()?);
        entries.insert(signature, object.clone());
        Ok(object)
    }

    /// Remove and return every cached object, for backend teardown.
    pub fn drain(&self) -> Vec<Arc<T>> {
        self.entries.lock().drain().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> Default for LayoutCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
