//! Rendering backends.
//!
//! Each backend translates the same abstract pipeline and binding
//! descriptions into its native binding mechanism: cached bind-point
//! tables for the immediate-mode GL model, descriptor-set layouts for
//! Vulkan, and plain descriptor storage for the null backend.

pub mod gl;
pub mod null;
pub mod vulkan;

pub use si_core::BackendKind;
