//! Program-object linkage and reflection.
//!
//! The immediate-mode model links per-stage shader objects into one
//! executable program. Because the native API assigns attribute and
//! fragment-output locations nondeterministically unless told otherwise,
//! every location is bound *before* the link; transform-feedback varyings
//! register in the same atomic link step. A failed link still yields a
//! program object; callers must consult [`GlProgram::link_status`] and
//! the info log, not the handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use si_core::Report;

use crate::binding::ResourceKind;
use crate::reflection::{AttributeReflection, ResourceReflection, ShaderReflection};
use crate::shader::{
    collect_compile_errors, validate_stage_set, InterfaceVar, Permutation, ShaderModule,
    ShaderStage,
};

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

/// Program object name in the backend's id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlProgramId(u32);

impl GlProgramId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Driver-profile quirks the linker has to work around.
#[derive(Debug, Clone, Copy)]
pub struct GlProfile {
    /// The platform's driver rejects programs without a fragment stage;
    /// the linker substitutes a stub stage transparently.
    pub requires_fragment_stage: bool,
}

impl GlProfile {
    /// Profile of the host platform.
    pub fn native() -> Self {
        Self {
            requires_fragment_stage: cfg!(target_os = "macos"),
        }
    }
}

impl Default for GlProfile {
    fn default() -> Self {
        Self::native()
    }
}

/// Interface tables recorded at link time, read by reflection queries.
#[derive(Debug, Clone, Default)]
struct LinkedInterface {
    attributes: Vec<AttributeReflection>,
    fragment_outputs: Vec<AttributeReflection>,
    resources: Vec<ResourceReflection>,
    varyings: Vec<String>,
}

/// A linked (or link-failed) program object.
#[derive(Debug)]
pub struct GlProgram {
    id: GlProgramId,
    linked: bool,
    info_log: String,
    has_stub_fragment: bool,
    interface: LinkedInterface,
}

impl GlProgram {
    /// Attach `stages` to a fresh program object and link it.
    ///
    /// Pre-existing compile errors, incompatible stage sets, location
    /// collisions, interface mismatches, and unknown transform-feedback
    /// varyings all fail the link; the diagnostic lands verbatim in the
    /// info log and the program is returned anyway.
    pub fn link(profile: &GlProfile, stages: &[Arc<ShaderModule>], permutation: &Permutation) -> Self {
        let id = GlProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed));
        si_core::link_trace!("linking program {} from {} stage(s)", id.raw(), stages.len());

        let failed = |log: String| GlProgram {
            id,
            linked: false,
            info_log: log,
            has_stub_fragment: false,
            interface: LinkedInterface::default(),
        };

        // Compilation failures are pre-existing; surface them through the
        // same log, not distinguished from link errors.
        let compile_errors = collect_compile_errors(stages);
        if !compile_errors.is_empty() {
            return failed(compile_errors.join("\n"));
        }

        if let Err(log) = validate_stage_set(stages) {
            return failed(format!("error: {log}"));
        }

        let is_compute = stages
            .iter()
            .any(|module| module.stage == ShaderStage::Compute);
        let fragment = stages
            .iter()
            .find(|module| module.stage == ShaderStage::Fragment);

        // Pre-link hook: substitute a stub fragment stage where the
        // driver rejects fragment-free programs. The flag keeps later
        // reflection from reporting outputs the caller never declared.
        let has_stub_fragment =
            !is_compute && fragment.is_none() && profile.requires_fragment_stage;
        if has_stub_fragment {
            si_core::link_trace!("program {}: substituting stub fragment stage", id.raw());
        }

        let mut interface = LinkedInterface::default();

        // Bind vertex-attribute locations before the link.
        let vertex = stages
            .iter()
            .find(|module| module.stage == ShaderStage::Vertex);
        if let Some(vertex) = vertex {
            match assign_locations(&vertex.io.inputs, "attribute") {
                Ok(attributes) => interface.attributes = attributes,
                Err(log) => return failed(log),
            }
        }

        // Bind fragment-output locations before the link. A stub stage
        // has no outputs.
        if let Some(fragment) = fragment {
            match assign_locations(&fragment.io.outputs, "fragment output") {
                Ok(outputs) => interface.fragment_outputs = outputs,
                Err(log) => return failed(log),
            }
        }

        // Merge resource declarations across stages; the linked program
        // exposes one record per (kind, slot) with the union stage mask.
        match merge_resources(stages) {
            Ok(resources) => interface.resources = resources,
            Err(log) => return failed(log),
        }

        // Transform-feedback varyings register within this same link call;
        // the driver re-validates them only here.
        if let Permutation::TransformFeedback(varyings) = permutation {
            let outputs = vertex.map(|v| v.io.outputs.as_slice()).unwrap_or(&[]);
            for varying in varyings {
                if !outputs.iter().any(|out| &out.name == varying) {
                    return failed(format!(
                        "error: transform feedback varying '{varying}' is not an output of the vertex stage"
                    ));
                }
            }
            interface.varyings = varyings.clone();
        }

        si_core::link_debug!("program {} linked", id.raw());
        GlProgram {
            id,
            linked: true,
            info_log: String::new(),
            has_stub_fragment,
            interface,
        }
    }

    pub fn id(&self) -> GlProgramId {
        self.id
    }

    /// Returns true if the program was linked successfully.
    pub fn link_status(&self) -> bool {
        self.linked
    }

    /// The native diagnostic log, verbatim; empty on success.
    pub fn info_log(&self) -> &str {
        &self.info_log
    }

    /// Whether a stub fragment stage was substituted at link time.
    pub fn has_stub_fragment(&self) -> bool {
        self.has_stub_fragment
    }

    /// Copy the link diagnostics into `report`.
    pub fn query_info_log(&self, report: &mut Report) {
        if !self.linked {
            report.errorf(self.info_log.clone());
        }
    }

    /// Query reflection for the linked program.
    ///
    /// A read-only pass: calling it any number of times yields identical
    /// records. A program that failed to link reflects as empty.
    pub fn query_reflection(&self) -> ShaderReflection {
        if !self.linked {
            return ShaderReflection::default();
        }
        ShaderReflection {
            attributes: self.interface.attributes.clone(),
            fragment_outputs: self.interface.fragment_outputs.clone(),
            resources: self.interface.resources.clone(),
        }
    }

    /// Varyings registered for transform feedback, in registration order.
    pub fn transform_feedback_varyings(&self) -> &[String] {
        &self.interface.varyings
    }
}

/// Resolve explicit locations first, then fill the gaps in declaration
/// order. Explicit collisions fail the link.
fn assign_locations(
    vars: &[InterfaceVar],
    what: &str,
) -> std::result::Result<Vec<AttributeReflection>, String> {
    let mut taken: HashMap<u32, &str> = HashMap::new();
    for var in vars {
        if let Some(location) = var.location {
            if let Some(previous) = taken.insert(location, &var.name) {
                return Err(format!(
                    "error: {what} location {location} bound to both '{previous}' and '{}'",
                    var.name
                ));
            }
        }
    }

    let mut next_free = 0u32;
    let mut assigned = Vec::with_capacity(vars.len());
    for var in vars {
        let location = match var.location {
            Some(location) => location,
            None => {
                while taken.contains_key(&next_free) {
                    next_free += 1;
                }
                taken.insert(next_free, &var.name);
                next_free
            }
        };
        assigned.push(AttributeReflection {
            name: var.name.clone(),
            ty: var.ty,
            location,
        });
    }
    Ok(assigned)
}

fn merge_resources(
    stages: &[Arc<ShaderModule>],
) -> std::result::Result<Vec<ResourceReflection>, String> {
    let mut merged: Vec<ResourceReflection> = Vec::new();
    let mut by_key: HashMap<(ResourceKind, u32), usize> = HashMap::new();

    for module in stages {
        let stage_flag = module.stage.flags();
        for decl in &module.io.resources {
            match by_key.get(&(decl.kind, decl.slot)) {
                Some(&index) => {
                    let existing = &mut merged[index];
                    if existing.name != decl.name {
                        return Err(format!(
                            "error: {} binding {} declared as both '{}' and '{}'",
                            decl.kind.name(),
                            decl.slot,
                            existing.name,
                            decl.name
                        ));
                    }
                    if existing.array_size != decl.array_size {
                        return Err(format!(
                            "error: resource '{}' declared with conflicting array sizes {} and {}",
                            decl.name, existing.array_size, decl.array_size
                        ));
                    }
                    existing.stages |= stage_flag;
                }
                None => {
                    by_key.insert((decl.kind, decl.slot), merged.len());
                    merged.push(ResourceReflection {
                        name: decl.name.clone(),
                        slot: decl.slot,
                        kind: decl.kind,
                        array_size: decl.array_size,
                        stages: stage_flag,
                    });
                }
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ResourceDecl, ShaderIo, StageFlags, VarType};

    fn lenient() -> GlProfile {
        GlProfile {
            requires_fragment_stage: false,
        }
    }

    fn strict() -> GlProfile {
        GlProfile {
            requires_fragment_stage: true,
        }
    }

    fn vertex_with_io(io: ShaderIo) -> Arc<ShaderModule> {
        Arc::new(ShaderModule::new(ShaderStage::Vertex, "main").with_io(io))
    }

    fn fragment_with_io(io: ShaderIo) -> Arc<ShaderModule> {
        Arc::new(ShaderModule::new(ShaderStage::Fragment, "main").with_io(io))
    }

    fn basic_stages() -> Vec<Arc<ShaderModule>> {
        vec![
            vertex_with_io(ShaderIo {
                inputs: vec![
                    InterfaceVar::new("position", VarType::Vec3),
                    InterfaceVar::new("normal", VarType::Vec3),
                ],
                outputs: vec![InterfaceVar::new("v_normal", VarType::Vec3)],
                resources: vec![ResourceDecl::new("camera", 0, ResourceKind::UniformBuffer)],
            }),
            fragment_with_io(ShaderIo {
                inputs: vec![InterfaceVar::new("v_normal", VarType::Vec3)],
                outputs: vec![InterfaceVar::new("color", VarType::Vec4)],
                resources: vec![
                    ResourceDecl::new("camera", 0, ResourceKind::UniformBuffer),
                    ResourceDecl::new("albedo", 0, ResourceKind::Texture),
                ],
            }),
        ]
    }

    #[test]
    fn test_link_success() {
        let program = GlProgram::link(&lenient(), &basic_stages(), &Permutation::Standard);
        assert!(program.link_status());
        assert!(program.info_log().is_empty());
        assert!(!program.has_stub_fragment());
    }

    #[test]
    fn test_sequential_attribute_locations() {
        let program = GlProgram::link(&lenient(), &basic_stages(), &Permutation::Standard);
        let reflection = program.query_reflection();
        assert_eq!(reflection.attributes[0].location, 0);
        assert_eq!(reflection.attributes[1].location, 1);
        assert_eq!(reflection.fragment_outputs[0].location, 0);
    }

    #[test]
    fn test_explicit_locations_respected() {
        let stages = vec![
            vertex_with_io(ShaderIo {
                inputs: vec![
                    InterfaceVar::new("position", VarType::Vec3).at_location(3),
                    InterfaceVar::new("uv", VarType::Vec2),
                ],
                ..ShaderIo::default()
            }),
            fragment_with_io(ShaderIo::default()),
        ];
        let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
        let reflection = program.query_reflection();
        assert_eq!(reflection.attributes[0].location, 3);
        // Unlocated attributes take the lowest free location.
        assert_eq!(reflection.attributes[1].location, 0);
    }

    #[test]
    fn test_explicit_location_collision_fails_link() {
        let stages = vec![vertex_with_io(ShaderIo {
            inputs: vec![
                InterfaceVar::new("a", VarType::Vec3).at_location(0),
                InterfaceVar::new("b", VarType::Vec3).at_location(0),
            ],
            ..ShaderIo::default()
        })];
        let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
        assert!(!program.link_status());
        assert!(program.info_log().contains("location 0"));
    }

    #[test]
    fn test_malformed_stage_always_fails_with_log() {
        let stages = vec![
            vertex_with_io(ShaderIo::default()),
            Arc::new(
                ShaderModule::new(ShaderStage::Fragment, "main")
                    .with_compile_error("0:12: syntax error"),
            ),
        ];
        // Deterministic: every link attempt of the same pair fails the
        // same way.
        for _ in 0..2 {
            let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
            assert!(!program.link_status());
            assert!(program.info_log().contains("syntax error"));

            let mut report = Report::new();
            program.query_info_log(&mut report);
            assert!(report.has_errors());
        }
    }

    #[test]
    fn test_stub_fragment_substitution() {
        let stages = vec![vertex_with_io(ShaderIo {
            inputs: vec![InterfaceVar::new("position", VarType::Vec3)],
            outputs: vec![InterfaceVar::new("v_out", VarType::Vec4)],
            ..ShaderIo::default()
        })];
        let program = GlProgram::link(&strict(), &stages, &Permutation::Standard);
        assert!(program.link_status());
        assert!(program.has_stub_fragment());
        // The stub stage must not leak into reflection.
        assert!(program.query_reflection().fragment_outputs.is_empty());
    }

    #[test]
    fn test_no_stub_on_lenient_profile() {
        let stages = vec![vertex_with_io(ShaderIo::default())];
        let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
        assert!(program.link_status());
        assert!(!program.has_stub_fragment());
    }

    #[test]
    fn test_resource_stage_masks_merged() {
        let program = GlProgram::link(&lenient(), &basic_stages(), &Permutation::Standard);
        let reflection = program.query_reflection();

        let camera = reflection
            .resource(ResourceKind::UniformBuffer, 0)
            .unwrap();
        assert_eq!(camera.stages, StageFlags::VERTEX | StageFlags::FRAGMENT);

        let albedo = reflection.resource(ResourceKind::Texture, 0).unwrap();
        assert_eq!(albedo.stages, StageFlags::FRAGMENT);
    }

    #[test]
    fn test_conflicting_resource_names_fail_link() {
        let stages = vec![
            vertex_with_io(ShaderIo {
                resources: vec![ResourceDecl::new("camera", 0, ResourceKind::UniformBuffer)],
                ..ShaderIo::default()
            }),
            fragment_with_io(ShaderIo {
                resources: vec![ResourceDecl::new("lights", 0, ResourceKind::UniformBuffer)],
                ..ShaderIo::default()
            }),
        ];
        let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
        assert!(!program.link_status());
        assert!(program.info_log().contains("camera"));
        assert!(program.info_log().contains("lights"));
    }

    #[test]
    fn test_reflection_is_idempotent() {
        let program = GlProgram::link(&lenient(), &basic_stages(), &Permutation::Standard);
        assert_eq!(program.query_reflection(), program.query_reflection());
    }

    #[test]
    fn test_transform_feedback_varyings_validated_at_link() {
        let stages = vec![vertex_with_io(ShaderIo {
            outputs: vec![InterfaceVar::new("v_position", VarType::Vec4)],
            ..ShaderIo::default()
        })];

        let ok = GlProgram::link(
            &lenient(),
            &stages,
            &Permutation::TransformFeedback(vec!["v_position".into()]),
        );
        assert!(ok.link_status());
        assert_eq!(ok.transform_feedback_varyings(), ["v_position"]);

        let bad = GlProgram::link(
            &lenient(),
            &stages,
            &Permutation::TransformFeedback(vec!["missing".into()]),
        );
        assert!(!bad.link_status());
        assert!(bad.info_log().contains("missing"));
    }

    #[test]
    fn test_failed_program_reflects_empty() {
        let stages = vec![Arc::new(
            ShaderModule::new(ShaderStage::Fragment, "main"),
        )];
        let program = GlProgram::link(&lenient(), &stages, &Permutation::Standard);
        assert!(!program.link_status());
        assert_eq!(program.query_reflection(), ShaderReflection::default());
    }
}
