//! Bootstrap configuration.

use crate::{platform, window::PhysicalSize};
use semver::Version;
use std::{
    borrow::Cow,
    ffi::CStr,
    path::{Path, PathBuf},
};

// SAFETY: This static string has been verified as a valid CStr.
pub const VALIDATION_LAYER_NAME: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

/// Immutable startup configuration handed to a [`LifecycleManager`](crate::lifecycle::LifecycleManager).
#[derive(Debug, Clone)]
#[must_use]
pub struct Config {
    pub(crate) window: WindowConfig,
    pub(crate) application_name: Cow<'static, str>,
    pub(crate) application_version: Version,
    pub(crate) engine_name: Cow<'static, str>,
    pub(crate) engine_version: Version,
    pub(crate) device_extensions: Vec<&'static CStr>,
    pub(crate) validation_layer: &'static CStr,
    pub(crate) diagnostics: bool,
    pub(crate) shaders: ShaderPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            application_name: "Vulkan Quake".into(),
            application_version: Version::new(1, 0, 0),
            engine_name: "Vulkan Quake".into(),
            engine_version: Version::new(1, 0, 0),
            device_extensions: platform::REQUIRED_DEVICE_EXTENSIONS.to_vec(),
            validation_layer: VALIDATION_LAYER_NAME,
            diagnostics: cfg!(debug_assertions),
            shaders: ShaderPaths::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_application(
        mut self,
        name: impl Into<Cow<'static, str>>,
        version: Version,
    ) -> Self {
        self.application_name = name.into();
        self.application_version = version;
        self
    }

    pub fn with_engine(mut self, name: impl Into<Cow<'static, str>>, version: Version) -> Self {
        self.engine_name = name.into();
        self.engine_version = version;
        self
    }

    pub fn with_device_extensions(mut self, extensions: Vec<&'static CStr>) -> Self {
        self.device_extensions = extensions;
        self
    }

    pub fn with_validation_layer(mut self, layer: &'static CStr) -> Self {
        self.validation_layer = layer;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn with_shaders(mut self, shaders: ShaderPaths) -> Self {
        self.shaders = shaders;
        self
    }

    #[inline]
    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    #[inline]
    pub fn shaders(&self) -> &ShaderPaths {
        &self.shaders
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct WindowConfig {
    pub title: Cow<'static, str>,
    pub size: PhysicalSize<u32>,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Quake".into(),
            size: PhysicalSize::new(1280, 720),
            // NOTE: The swapchain is never re-created, so the window size must stay fixed.
            resizable: false,
        }
    }
}

/// Paths to the pre-compiled vertex and fragment shader bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self::new("shaders/shader.vert.spv", "shaders/shader.frag.spv")
    }
}

impl ShaderPaths {
    pub fn new(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Self {
        Self {
            vertex: vertex.as_ref().to_path_buf(),
            fragment: fragment.as_ref().to_path_buf(),
        }
    }
}
