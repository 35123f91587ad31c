//! Vulkan instance creation.

use crate::{
    config::Config,
    lifecycle::{Resource, TeardownStack},
    platform,
    render::{capability::CapabilityProbe, debug, Driver},
    Error, Result,
};
use anyhow::Context;
use ash::{extensions::ext, vk};
use semver::Version;
use std::{
    collections::HashSet,
    ffi::{CStr, CString},
};

/// Instance extensions to enable: the window's surface extensions, then the diagnostics extension
/// when enabled, then any portability extensions this platform requires. Each name is listed once,
/// at its first position.
pub(crate) fn required_extensions(surface_extensions: &[CString], diagnostics: bool) -> Vec<&CStr> {
    let mut extensions: Vec<&CStr> = surface_extensions.iter().map(CString::as_c_str).collect();
    if diagnostics {
        extensions.push(ext::DebugUtils::name());
    }
    extensions.extend(platform::PORTABILITY_EXTENSIONS);
    let mut seen = HashSet::new();
    extensions.retain(|&name| seen.insert(name));
    extensions
}

/// Pack `version` into a Vulkan version number. Fails if a component does not fit its bit field.
fn api_version(version: &Version) -> anyhow::Result<u32> {
    let component = |value: u64, bits: u32, name: &str| {
        u32::try_from(value)
            .ok()
            .filter(|&value| value < 1 << bits)
            .with_context(|| format!("{name} version {value} of {version} does not fit in {bits} bits"))
    };
    Ok(vk::make_api_version(
        0,
        component(version.major, 7, "major")?,
        component(version.minor, 10, "minor")?,
        component(version.patch, 12, "patch")?,
    ))
}

/// Create the [`vk::Instance`] every other object is owned by.
pub(crate) fn create_instance<D: Driver + ?Sized>(
    driver: &mut D,
    config: &Config,
    surface_extensions: &[CString],
    teardown: &mut TeardownStack,
) -> Result<vk::Instance> {
    tracing::debug!("creating vulkan instance");

    let probe = CapabilityProbe::query(driver)?;

    // Validate debug layer is supported
    let enabled_layers = if config.diagnostics {
        if !probe.layers_available(&[config.validation_layer]) {
            return Err(Error::ValidationUnavailable(
                config.validation_layer.to_string_lossy().into_owned(),
            ));
        }
        vec![config.validation_layer]
    } else {
        vec![]
    };

    // Validate required instance extensions
    let extensions = required_extensions(surface_extensions, config.diagnostics);
    if !probe.extensions_available(&extensions) {
        return Err(Error::ExtensionMissing(
            probe
                .missing_extensions(&extensions)
                .iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
        ));
    }

    // Application Info
    let application_name = CString::new(config.application_name.as_ref())
        .with_context(|| format!("failed to convert `{}` to CString", config.application_name))
        .map_err(Error::InstanceCreation)?;
    let engine_name = CString::new(config.engine_name.as_ref())
        .with_context(|| format!("failed to convert `{}` to CString", config.engine_name))
        .map_err(Error::InstanceCreation)?;
    let application_version =
        api_version(&config.application_version).map_err(Error::InstanceCreation)?;
    let engine_version = api_version(&config.engine_version).map_err(Error::InstanceCreation)?;
    let application_info = vk::ApplicationInfo::builder()
        .application_name(&application_name)
        .application_version(application_version)
        .engine_name(&engine_name)
        .engine_version(engine_version)
        .api_version(vk::API_VERSION_1_0);

    // Instance Creation
    let enabled_extension_names = extensions
        .iter()
        .map(|name| name.as_ptr())
        .collect::<Vec<_>>();
    let enabled_layer_names = enabled_layers
        .iter()
        .map(|name| name.as_ptr())
        .collect::<Vec<_>>();
    let create_info = vk::InstanceCreateInfo::builder()
        .application_info(&application_info)
        .enabled_extension_names(&enabled_extension_names)
        .enabled_layer_names(&enabled_layer_names)
        .flags(platform::INSTANCE_CREATE_FLAGS);

    // Capture messages from instance creation and destruction as well
    let mut debug_create_info = debug::messenger_create_info();
    let create_info = if config.diagnostics {
        create_info.push_next(&mut debug_create_info)
    } else {
        create_info
    };

    let instance = driver
        .create_instance(&create_info)
        .map_err(Error::InstanceCreation)?;
    teardown.push(Resource::Instance(instance));

    tracing::debug!("created vulkan instance successfully");

    Ok(instance)
}
