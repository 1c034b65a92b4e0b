//! Binding-layout translation for the immediate-mode model.
//!
//! This API has no binding-layout object to create: abstract slots map
//! 1:1 onto native bind points, each resource kind in its own namespace
//! (texture units, uniform-buffer points, storage-buffer points). The
//! layout is just a cached table consulted at bind time. Tables are still
//! shared through a [`LayoutCache`](crate::binding::LayoutCache) since
//! many pipelines use identical binding signatures.

use crate::binding::{BindingLayoutDesc, ResourceKind};

/// One resolved slot in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlBindingSlot {
    pub kind: ResourceKind,
    pub slot: u32,
    /// Native bind point; identical to `slot` in this model.
    pub location: u32,
}

/// Lazily consulted slot-to-bind-point table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlBindingLayout {
    slots: Vec<GlBindingSlot>,
}

impl GlBindingLayout {
    /// Build the table from an abstract binding description.
    pub fn build(desc: &BindingLayoutDesc) -> Self {
        let slots = desc
            .entries()
            .iter()
            .map(|entry| GlBindingSlot {
                kind: entry.kind,
                slot: entry.slot,
                location: entry.slot,
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[GlBindingSlot] {
        &self.slots
    }

    /// Bind-point lookup used at draw time; `None` for a slot the caller
    /// never described.
    pub fn location_of(&self, kind: ResourceKind, slot: u32) -> Option<u32> {
        self.slots
            .iter()
            .find(|s| s.kind == kind && s.slot == slot)
            .map(|s| s.location)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingSlotDesc;
    use crate::shader::StageFlags;

    #[test]
    fn test_slots_map_one_to_one() {
        let desc = BindingLayoutDesc::new(vec![
            BindingSlotDesc::new("camera", 0, ResourceKind::UniformBuffer, StageFlags::VERTEX),
            BindingSlotDesc::new("albedo", 2, ResourceKind::Texture, StageFlags::FRAGMENT),
        ])
        .unwrap();

        let layout = GlBindingLayout::build(&desc);
        assert_eq!(layout.location_of(ResourceKind::UniformBuffer, 0), Some(0));
        assert_eq!(layout.location_of(ResourceKind::Texture, 2), Some(2));
        assert_eq!(layout.location_of(ResourceKind::Texture, 0), None);
    }

    #[test]
    fn test_empty_layout() {
        let layout = GlBindingLayout::build(&BindingLayoutDesc::empty());
        assert!(layout.is_empty());
    }
}
