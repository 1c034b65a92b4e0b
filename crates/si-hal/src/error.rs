//! Hard-failure taxonomy for the translation layer.
//!
//! Only failures that leave no partially valid object behind surface as
//! `Err`: exhausted memory types, no supported format, malformed binding
//! descriptions, failed native calls. Link and compile diagnostics attach
//! to the affected object as a [`si_core::Report`] instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("No memory type matches type bits 0x{type_bits:08x} with the requested properties")]
    NoCompatibleMemoryType { type_bits: u32 },
    #[error("None of the {candidates} candidate formats supports the requested features")]
    NoSupportedFormat { candidates: usize },
    #[error("Binding slot {slot} declared twice for resource kind '{kind}'")]
    DuplicateBindingSlot { kind: &'static str, slot: u32 },
    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] ash::vk::Result),
}

pub type Result<T> = std::result::Result<T, HalError>;
