//! Reverse-order release of created resources.

use crate::{
    render::{debug, Driver},
    window::WindowSystem,
};
use ash::vk;

/// An object created during bootstrap, along with the parent needed to release it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub(crate) enum Resource {
    Window,
    Instance(vk::Instance),
    Diagnostics(vk::Instance, debug::DiagnosticsHandle),
    Surface(vk::Instance, vk::SurfaceKHR),
    Device(vk::Device),
    Swapchain(vk::Device, vk::SwapchainKHR),
    ImageView(vk::Device, vk::ImageView),
    ShaderModule(vk::Device, vk::ShaderModule),
    RenderPass(vk::Device, vk::RenderPass),
    PipelineLayout(vk::Device, vk::PipelineLayout),
    Pipeline(vk::Device, vk::Pipeline),
}

impl Resource {
    fn release<D, W>(self, driver: &mut D, window: &mut W)
    where
        D: Driver + ?Sized,
        W: WindowSystem + ?Sized,
    {
        tracing::debug!("releasing {self:?}");
        match self {
            Self::Window => window.destroy_window(),
            Self::Instance(instance) => driver.destroy_instance(instance),
            Self::Diagnostics(instance, handle) => debug::uninstall(driver, instance, handle),
            Self::Surface(instance, surface) => driver.destroy_surface(instance, surface),
            Self::Device(device) => driver.destroy_device(device),
            Self::Swapchain(device, swapchain) => driver.destroy_swapchain(device, swapchain),
            Self::ImageView(device, view) => driver.destroy_image_view(device, view),
            Self::ShaderModule(device, module) => driver.destroy_shader_module(device, module),
            Self::RenderPass(device, render_pass) => driver.destroy_render_pass(device, render_pass),
            Self::PipelineLayout(device, layout) => driver.destroy_pipeline_layout(device, layout),
            Self::Pipeline(device, pipeline) => driver.destroy_pipeline(device, pipeline),
        }
    }
}

/// Resources in creation order. Unwinding releases them last-created first.
#[derive(Debug, Default)]
#[must_use]
pub(crate) struct TeardownStack {
    resources: Vec<Resource>,
}

impl TeardownStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a resource immediately after it was successfully created.
    #[inline]
    pub(crate) fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.resources.len()
    }

    /// Release every recorded resource in reverse creation order.
    pub(crate) fn unwind<D, W>(&mut self, driver: &mut D, window: &mut W)
    where
        D: Driver + ?Sized,
        W: WindowSystem + ?Sized,
    {
        tracing::debug!("releasing {} resources", self.len());
        while let Some(resource) = self.resources.pop() {
            resource.release(driver, window);
        }
    }
}
