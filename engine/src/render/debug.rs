//! Driver diagnostics routed to `tracing`.

use crate::{
    lifecycle::{Resource, TeardownStack},
    render::Driver,
    Error, Result,
};
use ash::vk;
use std::{
    borrow::Cow,
    ffi::{c_void, CStr},
    panic,
};

/// An installed diagnostics messenger, or nothing when diagnostics are disabled.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct DiagnosticsHandle {
    messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl DiagnosticsHandle {
    #[inline]
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.messenger.is_some()
    }

    #[inline]
    #[must_use]
    pub fn messenger(&self) -> Option<vk::DebugUtilsMessengerEXT> {
        self.messenger
    }
}

/// Build [`vk::DebugUtilsMessengerCreateInfoEXT`] with desired message severity and message types.
pub(crate) fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .build()
}

/// Install the diagnostics messenger on `instance` if `enabled`.
pub(crate) fn install<D: Driver + ?Sized>(
    driver: &mut D,
    instance: vk::Instance,
    enabled: bool,
    teardown: &mut TeardownStack,
) -> Result<DiagnosticsHandle> {
    if !enabled {
        tracing::debug!("diagnostics are disabled");
        return Ok(DiagnosticsHandle::default());
    }

    tracing::debug!("installing diagnostics messenger");

    let create_info = messenger_create_info();
    let messenger = driver
        .create_debug_messenger(instance, &create_info)
        .map_err(Error::ValidationSetup)?;
    let handle = DiagnosticsHandle {
        messenger: Some(messenger),
    };
    teardown.push(Resource::Diagnostics(instance, handle));

    tracing::debug!("installed diagnostics messenger successfully");

    Ok(handle)
}

/// Remove a messenger previously returned by [`install`]. Empty handles are ignored.
pub(crate) fn uninstall<D: Driver + ?Sized>(
    driver: &mut D,
    instance: vk::Instance,
    handle: DiagnosticsHandle,
) {
    if let Some(messenger) = handle.messenger {
        driver.destroy_debug_messenger(instance, messenger);
    }
}

/// Log a driver message at the level matching `severity`.
///
/// Always returns [`vk::FALSE`] so the call that triggered the message is not aborted.
pub(crate) fn on_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message: &str,
) -> vk::Bool32 {
    let category = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "[Unknown]",
    };
    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        tracing::error!("{category} {message}");
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        tracing::warn!("{category} {message}");
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        tracing::debug!("{category} {message}");
    } else {
        tracing::trace!("{category} {message}");
    }
    vk::FALSE
}

/// Callback function used by the diagnostics messenger.
///
/// Panics must not unwind into the driver, so they are caught and the message dropped.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let message = match data.as_ref() {
        // SAFETY: This message is provided by Vulkan and is a valid CStr.
        Some(data) if !data.p_message.is_null() => CStr::from_ptr(data.p_message).to_string_lossy(),
        _ => Cow::Borrowed("<empty message>"),
    };
    panic::catch_unwind(|| on_message(severity, message_type, &message)).unwrap_or(vk::FALSE)
}
