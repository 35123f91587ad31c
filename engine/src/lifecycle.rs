//! Ordered bring-up and reverse teardown of the rendering context.
//!
//! [`LifecycleManager::initialize`] walks the bootstrap chain one stage at a time. Every object a
//! stage creates is pushed onto a teardown stack as soon as it exists, so a failure at any point
//! releases exactly what was created, last-created first.

use crate::{
    config::Config,
    render::{
        debug::{self, DiagnosticsHandle},
        device::{self, LogicalDevice, PhysicalDeviceDescriptor},
        instance,
        pipeline::{self, PipelineDescriptor, RenderPassDescriptor},
        shader::ShaderModulePair,
        surface,
        swapchain::{self, SwapchainDescriptor},
        Driver,
    },
    window::WindowSystem,
    Error, Result,
};
use anyhow::anyhow;
use ash::vk;
use std::fmt;

pub(crate) use teardown::{Resource, TeardownStack};

mod teardown;

/// Bootstrap progress, in the order states are reached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub enum LifecycleState {
    Uninitialized,
    WindowBound,
    InstanceCreated,
    DiagnosticsInstalled,
    SurfaceBound,
    DeviceSelected,
    LogicalDeviceCreated,
    SwapchainCreated,
    ImageViewsCreated,
    RenderPassCreated,
    PipelineCreated,
    Running,
    TearingDown,
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handles negotiated so far. Everything is `None` until its stage succeeds.
#[derive(Default, Debug, Clone)]
#[must_use]
pub struct RenderContext {
    instance: Option<vk::Instance>,
    diagnostics: DiagnosticsHandle,
    surface: Option<vk::SurfaceKHR>,
    physical_device: Option<PhysicalDeviceDescriptor>,
    device: Option<LogicalDevice>,
    swapchain: Option<SwapchainDescriptor>,
    shaders: Option<ShaderModulePair>,
    render_pass: Option<RenderPassDescriptor>,
    pipeline: Option<PipelineDescriptor>,
}

impl RenderContext {
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<vk::Instance> {
        self.instance
    }

    #[inline]
    pub fn diagnostics(&self) -> DiagnosticsHandle {
        self.diagnostics
    }

    #[inline]
    #[must_use]
    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }

    #[inline]
    #[must_use]
    pub fn physical_device(&self) -> Option<&PhysicalDeviceDescriptor> {
        self.physical_device.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> Option<&LogicalDevice> {
        self.device.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn swapchain(&self) -> Option<&SwapchainDescriptor> {
        self.swapchain.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn shaders(&self) -> Option<&ShaderModulePair> {
        self.shaders.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn render_pass(&self) -> Option<&RenderPassDescriptor> {
        self.render_pass.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> Option<&PipelineDescriptor> {
        self.pipeline.as_ref()
    }
}

/// Sole owner of every object created while bootstrapping a rendering context.
#[must_use]
pub struct LifecycleManager<D: Driver, W: WindowSystem> {
    config: Config,
    driver: D,
    window: W,
    state: LifecycleState,
    context: RenderContext,
    teardown: TeardownStack,
}

impl<D: Driver + fmt::Debug, W: WindowSystem + fmt::Debug> fmt::Debug for LifecycleManager<D, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("config", &self.config)
            .field("driver", &self.driver)
            .field("window", &self.window)
            .field("state", &self.state)
            .field("context", &self.context)
            .field("teardown", &self.teardown)
            .finish()
    }
}

impl<D: Driver, W: WindowSystem> LifecycleManager<D, W> {
    pub fn new(config: Config, driver: D, window: W) -> Self {
        Self {
            config,
            driver,
            window,
            state: LifecycleState::Uninitialized,
            context: RenderContext::default(),
            teardown: TeardownStack::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn window(&self) -> &W {
        &self.window
    }

    /// Bring up every stage from the window to the graphics pipeline.
    ///
    /// # Errors
    ///
    /// If any stage fails, everything created so far is torn down before the error is returned.
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_state(LifecycleState::Uninitialized)?;

        tracing::info!("initializing rendering context");

        if let Err(err) = self.bootstrap() {
            tracing::error!("failed to initialize rendering context: {err}");
            self.shutdown();
            return Err(err);
        }

        tracing::info!("initialized rendering context successfully");

        Ok(())
    }

    /// Process window events until a quit is requested, then tear everything down.
    ///
    /// # Errors
    ///
    /// If the context has not been fully initialized.
    pub fn run(&mut self) -> Result<()> {
        self.expect_state(LifecycleState::PipelineCreated)?;
        self.transition(LifecycleState::Running);

        loop {
            match self.window.poll_event() {
                Some(event) if event.is_quit() => {
                    tracing::info!("quit requested");
                    break;
                }
                Some(event) => tracing::trace!("ignoring event: {event:?}"),
                None => (),
            }
        }

        self.shutdown();

        Ok(())
    }

    /// Release every created object in reverse creation order. Does nothing if there is
    /// nothing to release.
    pub fn shutdown(&mut self) {
        if self.teardown.is_empty()
            && matches!(
                self.state,
                LifecycleState::Uninitialized | LifecycleState::Destroyed
            )
        {
            return;
        }

        self.transition(LifecycleState::TearingDown);
        self.teardown.unwind(&mut self.driver, &mut self.window);
        self.context = RenderContext::default();
        self.transition(LifecycleState::Destroyed);
    }

    fn bootstrap(&mut self) -> Result<()> {
        // Window
        self.window
            .create_window(&self.config.window)
            .map_err(Error::PlatformInit)?;
        self.teardown.push(Resource::Window);
        self.transition(LifecycleState::WindowBound);

        // Instance
        let surface_extensions = self
            .window
            .required_surface_extensions()
            .map_err(Error::PlatformInit)?;
        let instance = instance::create_instance(
            &mut self.driver,
            &self.config,
            &surface_extensions,
            &mut self.teardown,
        )?;
        self.context.instance = Some(instance);
        self.transition(LifecycleState::InstanceCreated);

        // Diagnostics
        self.context.diagnostics = debug::install(
            &mut self.driver,
            instance,
            self.config.diagnostics,
            &mut self.teardown,
        )?;
        if self.context.diagnostics.is_installed() {
            self.transition(LifecycleState::DiagnosticsInstalled);
        }

        // Surface
        let surface =
            surface::create_surface(&mut self.driver, &self.window, instance, &mut self.teardown)?;
        self.context.surface = Some(surface);
        self.transition(LifecycleState::SurfaceBound);

        // Physical Device
        let physical_device = device::pick_physical_device(
            &self.driver,
            instance,
            surface,
            &self.config.device_extensions,
        )?;
        let queue_families = physical_device
            .queue_families()
            .ok_or_else(|| Error::DeviceCreation(anyhow!("selected device has no queues")))?;
        let physical_device_handle = physical_device.handle;
        self.context.physical_device = Some(physical_device);
        self.transition(LifecycleState::DeviceSelected);

        // Logical Device
        let device = device::create_logical_device(
            &mut self.driver,
            physical_device_handle,
            queue_families,
            &self.config.device_extensions,
            self.config.diagnostics.then_some(self.config.validation_layer),
            &mut self.teardown,
        )?;
        self.context.device = Some(device);
        self.transition(LifecycleState::LogicalDeviceCreated);

        // Swapchain
        let mut swapchain = swapchain::create_swapchain(
            &mut self.driver,
            &device,
            physical_device_handle,
            surface,
            self.window.drawable_size(),
            &mut self.teardown,
        )?;
        self.transition(LifecycleState::SwapchainCreated);

        // Shader Modules
        let shaders = ShaderModulePair::load(
            &mut self.driver,
            device.handle,
            &self.config.shaders,
            &mut self.teardown,
        )?;
        self.context.shaders = Some(shaders);

        // Image Views
        let swapchain_result = swapchain::create_image_views(
            &mut self.driver,
            device.handle,
            &mut swapchain,
            &mut self.teardown,
        );
        let format = swapchain.format.format;
        let extent = swapchain.extent;
        self.context.swapchain = Some(swapchain);
        swapchain_result?;
        self.transition(LifecycleState::ImageViewsCreated);

        // Render Pass
        let render_pass =
            pipeline::create_render_pass(&mut self.driver, device.handle, format, &mut self.teardown)?;
        self.context.render_pass = Some(render_pass);
        self.transition(LifecycleState::RenderPassCreated);

        // Pipeline
        let pipeline = pipeline::create_pipeline(
            &mut self.driver,
            device.handle,
            &shaders,
            &render_pass,
            extent,
            &mut self.teardown,
        )?;
        self.context.pipeline = Some(pipeline);
        self.transition(LifecycleState::PipelineCreated);

        Ok(())
    }

    fn expect_state(&self, expected: LifecycleState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!("lifecycle state: {} -> {next}", self.state);
        self.state = next;
    }
}

impl<D: Driver, W: WindowSystem> Drop for LifecycleManager<D, W> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
