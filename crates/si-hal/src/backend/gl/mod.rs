//! Immediate-mode backend (GL-style legacy binding model).
//!
//! This backend has no first-class binding-layout object and no
//! deterministic location assignment of its own, so the translation layer
//! does both: locations are bound explicitly before linking, and resource
//! slots resolve through a lazily consulted table at bind time. All state
//! lives in one globally-stateful [`state::GlStateManager`].

pub mod binding;
pub mod pipeline;
pub mod program;
pub mod resources;
pub mod state;

pub use binding::GlBindingLayout;
pub use pipeline::GlPipelineState;
pub use program::{GlProfile, GlProgram};
pub use resources::{GlBuffer, GlBufferArray, GlSampler, GlSamplerArray};
pub use state::GlStateManager;
