//! Explicit-API backend on `ash`.
//!
//! The selection and translation logic is kept in pure functions over
//! plain `vk` structs wherever the API allows, with thin unsafe wrappers
//! doing the actual instance and device calls. Descriptor-set layouts are
//! immutable once created and shared through the signature-keyed cache.

pub mod device;
pub mod layout;
pub mod pipeline;
pub mod query;

pub use device::{QueueFamilyIndices, SurfaceSupportDetails, INVALID_INDEX};
pub use layout::{DescriptorLayoutCache, DescriptorSetLayoutObject};
pub use pipeline::VkPipelineState;
