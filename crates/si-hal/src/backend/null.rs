//! Null backend: validates descriptors without any native API.
//!
//! Used headless and in tests. The descriptor is stored verbatim so
//! callers can read back exactly what they built. Pipeline construction
//! runs the same stage-set validation as the real backends and simulates
//! a link failure when any stage carries a compile error, so failure-path
//! behavior is observable without a device.

use si_core::Report;

use crate::pipeline::{PipelineDesc, PipelineRole, PipelineState};
use crate::shader::{collect_compile_errors, validate_stage_set};

/// Pipeline state object with no native resources behind it.
pub struct NullPipelineState {
    desc: PipelineDesc,
    name: Option<String>,
    report: Option<Report>,
}

impl NullPipelineState {
    pub fn new(desc: &PipelineDesc) -> Self {
        let stages = desc.stages();

        let mut report = Report::new();
        if let Err(msg) = validate_stage_set(&stages) {
            report.errorf(msg);
        }
        for log in collect_compile_errors(&stages) {
            report.errorf(log);
        }
        if report.has_errors() {
            si_core::link_debug!("null pipeline rejected: {}", report.text());
        }

        Self {
            desc: desc.clone(),
            name: None,
            report: report.has_errors().then_some(report),
        }
    }

    /// The descriptor this pipeline was built from, unchanged.
    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }
}

impl PipelineState for NullPipelineState {
    fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_owned);
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    fn role(&self) -> PipelineRole {
        self.desc.role()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::binding::{BindingLayoutDesc, BindingSlotDesc, ResourceKind};
    use crate::pipeline::{ComputePipelineDesc, GraphicsPipelineDesc, PrimitiveTopology};
    use crate::shader::{ShaderModule, ShaderStage, StageFlags};

    #[test]
    fn test_valid_desc_has_null_report() {
        let desc = PipelineDesc::Graphics(GraphicsPipelineDesc::new(vec![
            Arc::new(ShaderModule::new(ShaderStage::Vertex, "main")),
            Arc::new(ShaderModule::new(ShaderStage::Fragment, "main")),
        ]));
        let pso = NullPipelineState::new(&desc);
        assert!(pso.report().is_none());
        assert_eq!(pso.role(), PipelineRole::Graphics);
    }

    #[test]
    fn test_descriptor_stored_verbatim() {
        let bindings = BindingLayoutDesc::new(vec![BindingSlotDesc::new(
            "camera",
            2,
            ResourceKind::UniformBuffer,
            StageFlags::VERTEX,
        )])
        .unwrap();
        let mut graphics = GraphicsPipelineDesc::new(vec![
            Arc::new(ShaderModule::new(ShaderStage::Vertex, "main")),
            Arc::new(ShaderModule::new(ShaderStage::Fragment, "main")),
        ])
        .with_bindings(bindings);
        graphics.topology = PrimitiveTopology::LineStrip;

        let pso = NullPipelineState::new(&PipelineDesc::Graphics(graphics));
        let PipelineDesc::Graphics(stored) = pso.desc() else {
            panic!("graphics descriptor expected");
        };
        assert_eq!(stored.topology, PrimitiveTopology::LineStrip);
        assert_eq!(stored.stages.len(), 2);
        assert!(stored
            .bindings
            .find(ResourceKind::UniformBuffer, 2)
            .is_some());
    }

    #[test]
    fn test_compile_error_surfaces_as_link_failure() {
        let desc = PipelineDesc::Compute(ComputePipelineDesc::new(Arc::new(
            ShaderModule::new(ShaderStage::Compute, "main").with_compile_error("0:3: bad swizzle"),
        )));
        let pso = NullPipelineState::new(&desc);
        let report = pso.report().expect("compile error must fail the link");
        assert!(report.text().contains("bad swizzle"));
        // The offending descriptor is still retained for inspection.
        assert_eq!(pso.desc().role(), PipelineRole::Compute);
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let desc = PipelineDesc::Graphics(GraphicsPipelineDesc::new(vec![
            Arc::new(ShaderModule::new(ShaderStage::Vertex, "main")),
            Arc::new(ShaderModule::new(ShaderStage::Vertex, "other")),
        ]));
        let pso = NullPipelineState::new(&desc);
        assert!(pso.report().is_some());
    }
}
