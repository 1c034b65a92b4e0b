//! Reflection metadata extracted from a linked program.
//!
//! Written once per link, read many times by the binding translator.

use crate::binding::ResourceKind;
use crate::shader::{StageFlags, VarType};

/// A vertex attribute or fragment output with its final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeReflection {
    pub name: String,
    pub ty: VarType,
    pub location: u32,
}

/// A resource binding as the linked program sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReflection {
    pub name: String,
    pub slot: u32,
    pub kind: ResourceKind,
    pub array_size: u32,
    /// Every stage that declared this resource.
    pub stages: StageFlags,
}

/// Reflection info for a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderReflection {
    pub attributes: Vec<AttributeReflection>,
    pub fragment_outputs: Vec<AttributeReflection>,
    pub resources: Vec<ResourceReflection>,
}

impl ShaderReflection {
    /// Look up a resource by kind and slot.
    pub fn resource(&self, kind: ResourceKind, slot: u32) -> Option<&ResourceReflection> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.slot == slot)
    }
}
