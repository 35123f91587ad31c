//! Instance extension and layer availability.

use crate::{render::Driver, Error, Result};
use std::ffi::{CStr, CString};

/// A snapshot of the instance extensions and layers installed on this platform.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[must_use]
pub struct CapabilityProbe {
    extensions: Vec<CString>,
    layers: Vec<CString>,
}

impl CapabilityProbe {
    pub fn new(extensions: Vec<CString>, layers: Vec<CString>) -> Self {
        Self { extensions, layers }
    }

    /// Enumerate the installed instance extensions and layers.
    pub fn query<D: Driver + ?Sized>(driver: &D) -> Result<Self> {
        let extensions = driver
            .instance_extensions()
            .map_err(Error::CapabilityQuery)?;
        let layers = driver.instance_layers().map_err(Error::CapabilityQuery)?;
        tracing::trace!("available instance extensions: {extensions:?}");
        tracing::trace!("available instance layers: {layers:?}");
        Ok(Self { extensions, layers })
    }

    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &[CString] {
        &self.extensions
    }

    #[inline]
    #[must_use]
    pub fn layers(&self) -> &[CString] {
        &self.layers
    }

    /// Whether every requested extension is installed. Logs each one that is not.
    #[must_use]
    pub fn extensions_available(&self, requested: &[&CStr]) -> bool {
        log_missing("extension", &self.missing_extensions(requested))
    }

    /// Whether every requested layer is installed. Logs each one that is not.
    #[must_use]
    pub fn layers_available(&self, requested: &[&CStr]) -> bool {
        log_missing("layer", &self.missing_layers(requested))
    }

    /// Requested extensions that are not installed, in request order.
    #[must_use]
    pub fn missing_extensions<'a>(&self, requested: &[&'a CStr]) -> Vec<&'a CStr> {
        missing(&self.extensions, requested)
    }

    /// Requested layers that are not installed, in request order.
    #[must_use]
    pub fn missing_layers<'a>(&self, requested: &[&'a CStr]) -> Vec<&'a CStr> {
        missing(&self.layers, requested)
    }
}

/// `requested` minus `installed`, compared by exact name.
pub(crate) fn missing<'a>(installed: &[CString], requested: &[&'a CStr]) -> Vec<&'a CStr> {
    let mut missing: Vec<&CStr> = Vec::new();
    for &name in requested {
        if !installed.iter().any(|installed| installed.as_c_str() == name)
            && !missing.contains(&name)
        {
            missing.push(name);
        }
    }
    missing
}

fn log_missing(kind: &str, missing: &[&CStr]) -> bool {
    for name in missing {
        tracing::warn!("requested {kind} {name:?} is not available");
    }
    missing.is_empty()
}
