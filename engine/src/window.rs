//! Traits and types for window backends.

use crate::{config::WindowConfig, event::Event};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CString;

mod winit;

pub use self::winit::WinitWindow;

/// The native windowing layer the rendering context is bootstrapped against.
pub trait WindowSystem {
    /// Create the native window.
    fn create_window(&mut self, config: &WindowConfig) -> anyhow::Result<()>;

    /// Instance extensions required to create a presentable surface for this window.
    fn required_surface_extensions(&self) -> anyhow::Result<Vec<CString>>;

    /// Size of the drawable area of the window in pixels.
    fn drawable_size(&self) -> PhysicalSize<u32>;

    /// Native display and window handles, or `None` if no window is currently alive.
    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)>;

    /// Process pending OS events and return the next one, if any.
    fn poll_event(&mut self) -> Option<Event>;

    /// Destroy the native window.
    fn destroy_window(&mut self);
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct PhysicalSize<T> {
    pub width: T,
    pub height: T,
}

impl PhysicalSize<u32> {
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<::winit::dpi::PhysicalSize<u32>> for PhysicalSize<u32> {
    fn from(size: ::winit::dpi::PhysicalSize<u32>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl From<PhysicalSize<u32>> for ::winit::dpi::PhysicalSize<u32> {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}
