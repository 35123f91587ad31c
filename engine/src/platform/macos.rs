//! macOS platform-specific implementation.
//!
//! `MoltenVK` is a non-conformant implementation and is only enumerated when the instance
//! explicitly opts into portability enumeration.

use ash::{extensions::khr, vk};
use std::ffi::CStr;

/// Set of [`vk::InstanceCreateFlags`] for macOS.
pub const INSTANCE_CREATE_FLAGS: vk::InstanceCreateFlags =
    vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;

/// Instance extensions required to enumerate portability drivers on macOS.
pub const PORTABILITY_EXTENSIONS: [&CStr; 2] = [
    vk::KhrPortabilityEnumerationFn::name(),
    vk::KhrGetPhysicalDeviceProperties2Fn::name(),
];

/// List of required [`vk::PhysicalDevice`] extensions for macOS.
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 2] =
    [khr::Swapchain::name(), vk::KhrPortabilitySubsetFn::name()];
