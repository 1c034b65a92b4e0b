//! Pipeline state objects for the explicit backend.

use std::sync::Arc;

use ash::vk;

use si_core::Report;

use crate::binding::BindingLayoutDesc;
use crate::error::Result;
use crate::pipeline::{PipelineDesc, PipelineRole, PipelineState};
use crate::shader::{collect_compile_errors, validate_stage_set, ShaderModule};

use super::layout::{DescriptorLayoutCache, DescriptorSetLayoutObject};

pub fn bind_point_for(role: PipelineRole) -> vk::PipelineBindPoint {
    match role {
        PipelineRole::Graphics => vk::PipelineBindPoint::GRAPHICS,
        PipelineRole::Compute => vk::PipelineBindPoint::COMPUTE,
    }
}

/// Validate a descriptor before any native object is created. `Some`
/// carries the failure report.
pub fn preflight(desc: &PipelineDesc) -> Option<Report> {
    let stages = desc.stages();

    let mut report = Report::new();
    if let Err(msg) = validate_stage_set(&stages) {
        report.errorf(msg);
    }
    for log in collect_compile_errors(&stages) {
        report.errorf(log);
    }
    report.has_errors().then_some(report)
}

/// Notes for resources the stages declare but the binding layout never
/// describes. A dead slot on the shader side is advisory only, never an
/// error.
pub fn collect_advisories(
    stages: &[Arc<ShaderModule>],
    bindings: &BindingLayoutDesc,
) -> Vec<String> {
    let mut seen = Vec::new();
    let mut advisories = Vec::new();
    for stage in stages {
        for decl in &stage.io.resources {
            let key = (decl.kind, decl.slot);
            if seen.contains(&key) || bindings.find(decl.kind, decl.slot).is_some() {
                continue;
            }
            seen.push(key);
            let note = format!(
                "{} '{}' (slot {}) is declared by the shader stages but not present in the binding layout",
                decl.kind.name(),
                decl.name,
                decl.slot
            );
            tracing::warn!(target: "binding", "{note}");
            advisories.push(note);
        }
    }
    advisories
}

/// Explicit-API pipeline state object.
///
/// Descriptor failures (bad stage set, upstream compile errors) produce
/// an object with null handles and a report, mirroring drivers that hand
/// back a program handle on link failure. Native API errors are hard
/// errors and construct nothing.
pub struct VkPipelineState {
    role: PipelineRole,
    shader_modules: Vec<vk::ShaderModule>,
    set_layouts: Vec<Arc<DescriptorSetLayoutObject>>,
    pipeline_layout: vk::PipelineLayout,
    bind_point: vk::PipelineBindPoint,
    name: Option<String>,
    report: Option<Report>,
    advisories: Vec<String>,
}

impl VkPipelineState {
    pub fn new(
        device: &ash::Device,
        layouts: &DescriptorLayoutCache,
        desc: &PipelineDesc,
    ) -> Result<Self> {
        let role = desc.role();

        if let Some(report) = preflight(desc) {
            si_core::link_debug!("pipeline rejected: {}", report.text());
            return Ok(Self {
                role,
                shader_modules: Vec::new(),
                set_layouts: Vec::new(),
                pipeline_layout: vk::PipelineLayout::null(),
                bind_point: bind_point_for(role),
                name: None,
                report: Some(report),
                advisories: Vec::new(),
            });
        }

        let stages = desc.stages();
        let advisories = collect_advisories(&stages, desc.bindings());

        let set_layouts = layouts.layouts_for(device, desc.bindings())?;
        let raw_layouts: Vec<vk::DescriptorSetLayout> =
            set_layouts.iter().map(|l| l.raw()).collect();

        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&raw_layouts);
        let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info, None) }?;

        let mut shader_modules = Vec::with_capacity(stages.len());
        for stage in &stages {
            let module_info = vk::ShaderModuleCreateInfo::default().code(&stage.code);
            match unsafe { device.create_shader_module(&module_info, None) } {
                Ok(module) => shader_modules.push(module),
                Err(err) => {
                    unsafe {
                        for module in shader_modules.drain(..) {
                            device.destroy_shader_module(module, None);
                        }
                        device.destroy_pipeline_layout(pipeline_layout, None);
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(Self {
            role,
            shader_modules,
            set_layouts,
            pipeline_layout,
            bind_point: bind_point_for(role),
            name: None,
            report: None,
            advisories,
        })
    }

    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Per-frequency set layouts, set index 0 first. Shared with every
    /// pipeline of the same signature.
    pub fn set_layouts(&self) -> &[Arc<DescriptorSetLayoutObject>] {
        &self.set_layouts
    }

    pub fn shader_modules(&self) -> &[vk::ShaderModule] {
        &self.shader_modules
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.bind_point
    }

    /// Non-fatal notes from binding translation.
    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }

    /// Destroy the native objects this pipeline owns. Set layouts stay
    /// alive; the cache owns them.
    ///
    /// # Safety
    ///
    /// `device` must be the device the pipeline was created on and the
    /// pipeline must not be in use.
    pub unsafe fn destroy(&mut self, device: &ash::Device) {
        for module in self.shader_modules.drain(..) {
            device.destroy_shader_module(module, None);
        }
        if self.pipeline_layout != vk::PipelineLayout::null() {
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            self.pipeline_layout = vk::PipelineLayout::null();
        }
        self.set_layouts.clear();
    }
}

impl PipelineState for VkPipelineState {
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
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingSlotDesc, ResourceKind};
    use crate::pipeline::{ComputePipelineDesc, GraphicsPipelineDesc};
    use crate::shader::{ResourceDecl, ShaderIo, ShaderStage, StageFlags};

    #[test]
    fn test_bind_point_follows_role() {
        assert_eq!(
            bind_point_for(PipelineRole::Graphics),
            vk::PipelineBindPoint::GRAPHICS
        );
        assert_eq!(
            bind_point_for(PipelineRole::Compute),
            vk::PipelineBindPoint::COMPUTE
        );
    }

    #[test]
    fn test_preflight_accepts_valid_desc() {
        let desc = PipelineDesc::Graphics(GraphicsPipelineDesc::new(vec![
            Arc::new(ShaderModule::new(ShaderStage::Vertex, "main")),
            Arc::new(ShaderModule::new(ShaderStage::Fragment, "main")),
        ]));
        assert!(preflight(&desc).is_none());
    }

    #[test]
    fn test_preflight_collects_all_failures() {
        let desc = PipelineDesc::Graphics(GraphicsPipelineDesc::new(vec![Arc::new(
            ShaderModule::new(ShaderStage::Fragment, "main").with_compile_error("0:1: error"),
        )]));
        let report = preflight(&desc).unwrap();
        // Both the missing vertex stage and the compile error are reported.
        assert!(report.text().contains("vertex"));
        assert!(report.text().contains("0:1: error"));
    }

    #[test]
    fn test_preflight_single_compute_stage() {
        let desc = PipelineDesc::Compute(ComputePipelineDesc::new(Arc::new(ShaderModule::new(
            ShaderStage::Compute,
            "main",
        ))));
        assert!(preflight(&desc).is_none());
    }

    #[test]
    fn test_unbound_declared_slot_is_advisory() {
        let stages = vec![
            Arc::new(
                ShaderModule::new(ShaderStage::Vertex, "main").with_io(ShaderIo {
                    resources: vec![ResourceDecl::new("camera", 0, ResourceKind::UniformBuffer)],
                    ..ShaderIo::default()
                }),
            ),
            Arc::new(ShaderModule::new(ShaderStage::Fragment, "main")),
        ];

        let advisories = collect_advisories(&stages, &BindingLayoutDesc::empty());
        assert_eq!(advisories.len(), 1);
        assert!(advisories[0].contains("camera"));
        assert!(advisories[0].contains("slot 0"));
    }

    #[test]
    fn test_bound_slot_produces_no_advisory() {
        let stages = vec![Arc::new(
            ShaderModule::new(ShaderStage::Vertex, "main").with_io(ShaderIo {
                resources: vec![ResourceDecl::new("camera", 0, ResourceKind::UniformBuffer)],
                ..ShaderIo::default()
            }),
        )];
        let bindings = BindingLayoutDesc::new(vec![BindingSlotDesc::new(
            "camera",
            0,
            ResourceKind::UniformBuffer,
            StageFlags::VERTEX,
        )])
        .unwrap();

        assert!(collect_advisories(&stages, &bindings).is_empty());
    }

    #[test]
    fn test_slot_shared_across_stages_noted_once() {
        let decl = ResourceDecl::new("albedo", 1, ResourceKind::Texture);
        let stages = vec![
            Arc::new(
                ShaderModule::new(ShaderStage::Vertex, "main").with_io(ShaderIo {
                    resources: vec![decl.clone()],
                    ..ShaderIo::default()
                }),
            ),
            Arc::new(
                ShaderModule::new(ShaderStage::Fragment, "main").with_io(ShaderIo {
                    resources: vec![decl],
                    ..ShaderIo::default()
                }),
            ),
        ];

        let advisories = collect_advisories(&stages, &BindingLayoutDesc::empty());
        assert_eq!(advisories.len(), 1);
    }
}
