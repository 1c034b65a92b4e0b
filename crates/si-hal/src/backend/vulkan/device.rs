//! Physical-device and queue-family selection.
//!
//! Selection runs as a single pass over the queue-family list with
//! first-match-wins semantics, so the chosen indices are stable across
//! runs on the same device. The core is pure over the property slices;
//! the wrappers only fetch them.

use ash::khr::surface;
use ash::vk;

use crate::error::{HalError, Result};

/// Sentinel for a queue family that has not been found.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Queue family indices chosen for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: u32,
    pub present_family: u32,
}

impl Default for QueueFamilyIndices {
    fn default() -> Self {
        Self {
            graphics_family: INVALID_INDEX,
            present_family: INVALID_INDEX,
        }
    }
}

impl QueueFamilyIndices {
    /// Whether every required family was found.
    pub fn complete(&self) -> bool {
        self.graphics_family != INVALID_INDEX && self.present_family != INVALID_INDEX
    }
}

/// Select queue families from a property list.
///
/// Families with zero queues are skipped. When `present_check` is `None`
/// the selection is headless and the present family mirrors the graphics
/// family.
pub fn find_queue_families_in(
    families: &[vk::QueueFamilyProperties],
    required: vk::QueueFlags,
    mut present_check: Option<&mut dyn FnMut(u32) -> bool>,
) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        if family.queue_count == 0 {
            continue;
        }
        if indices.graphics_family == INVALID_INDEX && family.queue_flags.contains(required) {
            indices.graphics_family = index;
        }
        if let Some(check) = present_check.as_deref_mut() {
            if indices.present_family == INVALID_INDEX && check(index) {
                indices.present_family = index;
            }
        }
    }

    if present_check.is_none() {
        indices.present_family = indices.graphics_family;
    }

    si_core::device_trace!(
        graphics = indices.graphics_family,
        present = indices.present_family,
        "queue family selection"
    );
    indices
}

/// Select graphics and present queue families for `physical_device`.
///
/// Pass the surface pair to require presentation support; `None` selects
/// headless.
pub fn find_queue_families(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    required: vk::QueueFlags,
    surface: Option<(&surface::Instance, vk::SurfaceKHR)>,
) -> Result<QueueFamilyIndices> {
    let families =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    match surface {
        Some((loader, surface)) => {
            let mut present = Vec::with_capacity(families.len());
            for index in 0..families.len() as u32 {
                let supported = unsafe {
                    loader.get_physical_device_surface_support(physical_device, index, surface)
                }?;
                present.push(supported);
            }
            let mut check = |index: u32| present[index as usize];
            Ok(find_queue_families_in(&families, required, Some(&mut check)))
        }
        None => Ok(find_queue_families_in(&families, required, None)),
    }
}

/// What a surface supports on a given device.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupportDetails {
    /// A surface is usable only with at least one format and one present
    /// mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Query everything needed to judge surface compatibility in one call.
pub fn query_surface_support(
    loader: &surface::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<SurfaceSupportDetails> {
    let capabilities =
        unsafe { loader.get_physical_device_surface_capabilities(physical_device, surface) }?;
    let formats = unsafe { loader.get_physical_device_surface_formats(physical_device, surface) }?;
    let present_modes =
        unsafe { loader.get_physical_device_surface_present_modes(physical_device, surface) }?;

    Ok(SurfaceSupportDetails {
        capabilities,
        formats,
        present_modes,
    })
}

/// Pick the lowest memory type index matching both the resource's type
/// bits and the requested property flags.
pub fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Result<u32> {
    for index in 0..properties.memory_type_count {
        let supported = type_bits & (1 << index) != 0;
        let flags = properties.memory_types[index as usize].property_flags;
        if supported && flags.contains(required) {
            return Ok(index);
        }
    }
    Err(HalError::NoCompatibleMemoryType { type_bits })
}

/// Whether format properties satisfy the requested tiling features.
pub fn supports_format(
    properties: vk::FormatProperties,
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> bool {
    match tiling {
        vk::ImageTiling::LINEAR => properties.linear_tiling_features.contains(features),
        vk::ImageTiling::OPTIMAL => properties.optimal_tiling_features.contains(features),
        _ => false,
    }
}

/// First candidate format supporting `features` under `tiling`.
pub fn find_supported_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> Result<vk::Format> {
    for &format in candidates {
        let properties =
            unsafe { instance.get_physical_device_format_properties(physical_device, format) };
        if supports_format(properties, tiling, features) {
            return Ok(format);
        }
    }
    Err(HalError::NoSupportedFormat {
        candidates: candidates.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_graphics_and_present_in_separate_families() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 1),
            family(vk::QueueFlags::TRANSFER, 1),
        ];
        // Only family 1 can present.
        let mut check = |index: u32| index == 1;
        let indices =
            find_queue_families_in(&families, vk::QueueFlags::GRAPHICS, Some(&mut check));

        assert_eq!(indices.graphics_family, 0);
        assert_eq!(indices.present_family, 1);
        assert!(indices.complete());
    }

    #[test]
    fn test_empty_family_list_never_completes() {
        let indices = find_queue_families_in(&[], vk::QueueFlags::GRAPHICS, None);
        assert!(!indices.complete());
        assert_eq!(indices.graphics_family, INVALID_INDEX);
    }

    #[test]
    fn test_zero_queue_family_skipped() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 0),
            family(vk::QueueFlags::GRAPHICS, 2),
        ];
        let indices = find_queue_families_in(&families, vk::QueueFlags::GRAPHICS, None);
        assert_eq!(indices.graphics_family, 1);
    }

    #[test]
    fn test_headless_present_mirrors_graphics() {
        let families = [family(vk::QueueFlags::GRAPHICS, 1)];
        let indices = find_queue_families_in(&families, vk::QueueFlags::GRAPHICS, None);
        assert_eq!(indices.present_family, indices.graphics_family);
        assert!(indices.complete());
    }

    #[test]
    fn test_first_match_wins() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS, 8),
        ];
        let mut check = |_: u32| true;
        let indices =
            find_queue_families_in(&families, vk::QueueFlags::GRAPHICS, Some(&mut check));
        assert_eq!(indices.graphics_family, 0);
        assert_eq!(indices.present_family, 0);
    }

    #[test]
    fn test_find_memory_type_respects_type_bits() {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 2,
            ..Default::default()
        };
        properties.memory_types[0] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            heap_index: 0,
        };
        properties.memory_types[1] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
                | vk::MemoryPropertyFlags::HOST_COHERENT,
            heap_index: 1,
        };

        // Resource only accepts type 1.
        let index =
            find_memory_type(&properties, 0b10, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap();
        assert_eq!(index, 1);

        // Type 0 matches the bits but not the flags.
        let missing = find_memory_type(&properties, 0b01, vk::MemoryPropertyFlags::HOST_VISIBLE);
        assert!(matches!(
            missing,
            Err(HalError::NoCompatibleMemoryType { type_bits: 0b01 })
        ));
    }

    #[test]
    fn test_supports_format_checks_requested_tiling() {
        let properties = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        };
        assert!(supports_format(
            properties,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        ));
        assert!(!supports_format(
            properties,
            vk::ImageTiling::LINEAR,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        ));
    }

    #[test]
    fn test_surface_details_adequacy() {
        let mut details = SurfaceSupportDetails::default();
        assert!(!details.is_adequate());

        details.formats.push(vk::SurfaceFormatKHR::default());
        details.present_modes.push(vk::PresentModeKHR::FIFO);
        assert!(details.is_adequate());
    }
}
