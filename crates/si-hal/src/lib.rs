//! Pipeline-state and resource-binding translation layer.
//!
//! si-hal presents one rendering contract over structurally incompatible
//! native APIs: an immediate-mode, globally-stateful binding model
//! ([`backend::gl`]), an explicit object model with descriptor-set layouts
//! ([`backend::vulkan`]), and a no-op stand-in for headless testing
//! ([`backend::null`]).
//!
//! The flow through the layer:
//!
//! 1. capability queries and device/queue selection gate device creation
//!    (`backend::vulkan::{query, device}`),
//! 2. per-stage shader objects from an external compiler link into one
//!    program with reflection metadata (`backend::gl::program`),
//! 3. the abstract binding description translates into the native binding
//!    mechanism, shared structurally between pipelines ([`binding`]),
//! 4. a pipeline state object aggregates program, layout, and
//!    fixed-function state, carrying a diagnostic report instead of
//!    throwing ([`pipeline`]).
//!
//! Native objects are single-thread-affine: create and bind them on the
//! thread that owns the native context or queue. Capability queries are
//! read-only and callable from anywhere, but must be re-issued after any
//! surface-affecting event.

pub mod backend;
pub mod binding;
pub mod error;
pub mod pipeline;
pub mod reflection;
pub mod shader;

pub use error::{HalError, Result};
pub use pipeline::{
    ComputePipelineDesc, GraphicsPipelineDesc, PipelineDesc, PipelineRole, PipelineState,
};
pub use reflection::ShaderReflection;
pub use shader::{Permutation, ShaderModule, ShaderStage, StageFlags};
