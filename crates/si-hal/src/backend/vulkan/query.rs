//! Read-only capability queries against instance and device.

use std::ffi::CStr;

use ash::vk;

use crate::error::Result;

fn fixed_name(name: std::result::Result<&CStr, std::ffi::FromBytesUntilNulError>) -> String {
    name.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Names of every instance layer the loader knows.
pub fn query_instance_layers(entry: &ash::Entry) -> Result<Vec<String>> {
    let layers = unsafe { entry.enumerate_instance_layer_properties() }?;
    Ok(layers
        .iter()
        .map(|layer| fixed_name(layer.layer_name_as_c_str()))
        .collect())
}

/// Names of every instance extension the loader knows.
pub fn query_instance_extensions(entry: &ash::Entry) -> Result<Vec<String>> {
    let extensions = unsafe { entry.enumerate_instance_extension_properties(None) }?;
    Ok(extensions
        .iter()
        .map(|ext| fixed_name(ext.extension_name_as_c_str()))
        .collect())
}

pub fn query_physical_devices(instance: &ash::Instance) -> Result<Vec<vk::PhysicalDevice>> {
    let devices = unsafe { instance.enumerate_physical_devices() }?;
    si_core::device_debug!(count = devices.len(), "physical devices");
    Ok(devices)
}

/// Names of every device extension `physical_device` supports.
pub fn query_device_extensions(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<Vec<String>> {
    let extensions =
        unsafe { instance.enumerate_device_extension_properties(physical_device) }?;
    Ok(extensions
        .iter()
        .map(|ext| fixed_name(ext.extension_name_as_c_str()))
        .collect())
}

pub fn query_queue_families(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Vec<vk::QueueFamilyProperties> {
    unsafe { instance.get_physical_device_queue_family_properties(physical_device) }
}

/// Marketing name of the device.
pub fn device_name(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> String {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    fixed_name(properties.device_name_as_c_str())
}

/// Render a packed API version as "major.minor.patch".
pub fn api_version_to_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    )
}
