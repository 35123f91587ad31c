//! Window surface binding.

use crate::{
    lifecycle::{Resource, TeardownStack},
    render::Driver,
    window::WindowSystem,
    Error, Result,
};
use anyhow::anyhow;
use ash::vk;

/// Create a [`vk::SurfaceKHR`] presenting to the window.
pub(crate) fn create_surface<D, W>(
    driver: &mut D,
    window: &W,
    instance: vk::Instance,
    teardown: &mut TeardownStack,
) -> Result<vk::SurfaceKHR>
where
    D: Driver + ?Sized,
    W: WindowSystem + ?Sized,
{
    tracing::debug!("creating surface");

    let (display_handle, window_handle) = window
        .raw_handles()
        .ok_or_else(|| Error::SurfaceCreation(anyhow!("window has already been destroyed")))?;
    let surface = driver
        .create_surface(instance, display_handle, window_handle)
        .map_err(Error::SurfaceCreation)?;
    teardown.push(Resource::Surface(instance, surface));

    tracing::debug!("created surface successfully");

    Ok(surface)
}
