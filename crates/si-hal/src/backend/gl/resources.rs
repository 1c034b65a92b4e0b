//! Buffer and sampler objects plus their flattened array forms.
//!
//! Resource arrays exist so a draw loop can bind N resources with one
//! multi-bind call instead of N singles. The native id list is collected
//! once at construction and never re-walked per draw.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::binding::ResourceKind;

static NEXT_BUFFER_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_SAMPLER_ID: AtomicU32 = AtomicU32::new(1);

/// A buffer object and the bind-point namespace it targets.
#[derive(Debug)]
pub struct GlBuffer {
    id: u32,
    kind: ResourceKind,
    size: u64,
}

impl GlBuffer {
    /// Create a buffer of `size` bytes for the given binding namespace.
    /// `kind` must be one of the buffer kinds.
    pub fn new(kind: ResourceKind, size: u64) -> Self {
        debug_assert!(matches!(
            kind,
            ResourceKind::UniformBuffer | ResourceKind::StorageBuffer
        ));
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            size,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A sampler object.
#[derive(Debug)]
pub struct GlSampler {
    id: u32,
}

impl GlSampler {
    pub fn new() -> Self {
        Self {
            id: NEXT_SAMPLER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Default for GlSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Contiguous native ids for a set of buffers sharing one namespace.
#[derive(Debug)]
pub struct GlBufferArray {
    kind: ResourceKind,
    ids: Vec<u32>,
}

impl GlBufferArray {
    /// Flatten `buffers` into one id list. All members must target the
    /// same binding namespace; `None` when they do not, or when the set
    /// is empty.
    pub fn build(buffers: &[Arc<GlBuffer>]) -> Option<Self> {
        let first = buffers.first()?;
        let kind = first.kind();
        if buffers.iter().any(|b| b.kind() != kind) {
            return None;
        }
        Some(Self {
            kind,
            ids: buffers.iter().map(|b| b.id()).collect(),
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The native ids, in the order the array was built.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Contiguous native ids for a set of samplers.
#[derive(Debug)]
pub struct GlSamplerArray {
    ids: Vec<u32>,
}

impl GlSamplerArray {
    pub fn build(samplers: &[Arc<GlSampler>]) -> Self {
        Self {
            ids: samplers.iter().map(|s| s.id()).collect(),
        }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_array_preserves_order() {
        let buffers: Vec<_> = (0..3)
            .map(|_| Arc::new(GlBuffer::new(ResourceKind::UniformBuffer, 256)))
            .collect();
        let array = GlBufferArray::build(&buffers).unwrap();

        let expected: Vec<u32> = buffers.iter().map(|b| b.id()).collect();
        assert_eq!(array.ids(), expected.as_slice());
        assert_eq!(array.kind(), ResourceKind::UniformBuffer);
    }

    #[test]
    fn test_buffer_array_rejects_mixed_kinds() {
        let buffers = vec![
            Arc::new(GlBuffer::new(ResourceKind::UniformBuffer, 64)),
            Arc::new(GlBuffer::new(ResourceKind::StorageBuffer, 64)),
        ];
        assert!(GlBufferArray::build(&buffers).is_none());
        assert!(GlBufferArray::build(&[]).is_none());
    }

    #[test]
    fn test_sampler_ids_are_unique() {
        let a = GlSampler::new();
        let b = GlSampler::new();
        assert_ne!(a.id(), b.id());

        let array = GlSamplerArray::build(&[Arc::new(a), Arc::new(b)]);
        assert_eq!(array.len(), 2);
    }
}
