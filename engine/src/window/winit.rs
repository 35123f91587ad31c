//! Winit window backend.

use super::{PhysicalSize, WindowSystem};
use crate::{config::WindowConfig, event::Event};
use anyhow::Context;
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle,
};
use std::{
    collections::VecDeque,
    ffi::{CStr, CString},
    fmt,
};
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

/// A single native window driven by a polled [`EventLoop`].
#[must_use]
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    window: Option<Window>,
    pending: VecDeque<Event>,
}

impl fmt::Debug for WinitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinitWindow")
            .field("window", &self.window.as_ref().map(Window::id))
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for WinitWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitWindow {
    /// Create the event loop. Must be called from the main thread.
    pub fn new() -> Self {
        Self {
            event_loop: EventLoop::new(),
            window: None,
            pending: VecDeque::new(),
        }
    }

    /// Run the event loop until at least one window event has been queued.
    fn pump_events(&mut self) {
        let Self {
            event_loop,
            pending,
            ..
        } = self;
        event_loop.run_return(|event, _window_target, control_flow| {
            control_flow.set_wait();

            tracing::trace!("received event: {event:?}");
            match event {
                WinitEvent::WindowEvent { event, .. } => pending.push_back(Event::from(event)),
                WinitEvent::MainEventsCleared if !pending.is_empty() => control_flow.set_exit(),
                WinitEvent::LoopDestroyed => {
                    if pending.is_empty() {
                        pending.push_back(Event::Quit);
                    }
                }
                _ => (),
            }
        });
    }
}

impl WindowSystem for WinitWindow {
    fn create_window(&mut self, config: &WindowConfig) -> anyhow::Result<()> {
        tracing::debug!("creating window");

        let window = WindowBuilder::new()
            .with_title(config.title.as_ref())
            .with_inner_size(::winit::dpi::PhysicalSize::from(config.size))
            .with_resizable(config.resizable)
            .build(&self.event_loop)
            .context("failed to create window")?;
        self.window = Some(window);

        tracing::debug!("created window successfully");

        Ok(())
    }

    fn required_surface_extensions(&self) -> anyhow::Result<Vec<CString>> {
        let display_handle = self.window.as_ref().map_or_else(
            || self.event_loop.raw_display_handle(),
            HasRawDisplayHandle::raw_display_handle,
        );
        let extensions = ash_window::enumerate_required_extensions(display_handle)
            .context("failed to enumerate required surface extensions")?;
        Ok(extensions
            .iter()
            // SAFETY: ash-window returns pointers to static, nul-terminated extension names.
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_owned())
            .collect())
    }

    fn drawable_size(&self) -> PhysicalSize<u32> {
        self.window
            .as_ref()
            .map(|window| window.inner_size().into())
            .unwrap_or_default()
    }

    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)> {
        self.window
            .as_ref()
            .map(|window| (window.raw_display_handle(), window.raw_window_handle()))
    }

    fn poll_event(&mut self) -> Option<Event> {
        if self.window.is_none() {
            return None;
        }
        if self.pending.is_empty() {
            self.pump_events();
        }
        self.pending.pop_front()
    }

    fn destroy_window(&mut self) {
        if self.window.take().is_some() {
            tracing::debug!("destroyed window");
        }
    }
}

impl From<WindowEvent<'_>> for Event {
    fn from(event: WindowEvent<'_>) -> Self {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => Self::Quit,
            #[cfg(debug_assertions)]
            WindowEvent::KeyboardInput { input, .. }
                if matches!(
                    (input.virtual_keycode, input.state),
                    (
                        Some(winit::event::VirtualKeyCode::Escape),
                        winit::event::ElementState::Pressed
                    )
                ) =>
            {
                Self::Quit
            }
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::winit::event::{DeviceId, ElementState, KeyboardInput, ModifiersState, VirtualKeyCode};

    #[allow(deprecated)]
    fn key(virtual_keycode: VirtualKeyCode, state: ElementState) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            // SAFETY: The dummy id is only compared, never passed to the platform.
            device_id: unsafe { DeviceId::dummy() },
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: Some(virtual_keycode),
                modifiers: ModifiersState::empty(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn close_and_destroy_quit() {
        assert_eq!(Event::from(WindowEvent::CloseRequested), Event::Quit);
        assert_eq!(Event::from(WindowEvent::Destroyed), Event::Quit);
    }

    #[test]
    fn escape_press_quits_in_debug_builds() {
        let expected = if cfg!(debug_assertions) {
            Event::Quit
        } else {
            Event::Other
        };
        assert_eq!(
            Event::from(key(VirtualKeyCode::Escape, ElementState::Pressed)),
            expected
        );
        assert_eq!(
            Event::from(key(VirtualKeyCode::Escape, ElementState::Released)),
            Event::Other
        );
    }

    #[test]
    fn other_events_pass_through() {
        assert_eq!(
            Event::from(key(VirtualKeyCode::Space, ElementState::Pressed)),
            Event::Other
        );
        assert_eq!(Event::from(WindowEvent::Focused(true)), Event::Other);
        assert_eq!(
            Event::from(WindowEvent::Resized(::winit::dpi::PhysicalSize::new(1280, 720))),
            Event::Other
        );
    }
}
