//! Linker configuration.
//!
//! One `LinkConfig` per deployment. It decodes from JSON with every field
//! optional:
//!
//! ```json
//! {
//!   "probe_radius": 0.82,
//!   "mode": { "kind": "attribute_copy", "target": "Host Level" },
//!   "host_attribute": "Base Constraint"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::propagate::PropagationMode;
use crate::{Error, Result};

/// Default probe radius, in document length units.
pub const DEFAULT_PROBE_RADIUS: f64 = 3.0;

/// Default undo-history label for `Linker::execute()`.
pub const DEFAULT_TRANSACTION_NAME: &str = "Link linear elements to hosts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Radius of the probe ball built around each linear element.
    pub probe_radius: f64,
    /// What gets written onto a resolved linear element.
    pub mode: PropagationMode,
    /// Host parameter cached as the derived attribute (e.g. a level id).
    pub host_attribute: Option<String>,
    /// Skip exact booleans for host solids whose bounds miss the probe's.
    pub bbox_prefilter: bool,
    pub transaction_name: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            probe_radius: DEFAULT_PROBE_RADIUS,
            mode: PropagationMode::HostLink,
            host_attribute: None,
            bbox_prefilter: true,
            transaction_name: DEFAULT_TRANSACTION_NAME.to_owned(),
        }
    }
}

impl LinkConfig {
    /// Decode and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LinkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, decode and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_probe_radius(mut self, radius: f64) -> Self {
        self.probe_radius = radius;
        self
    }

    pub fn with_mode(mut self, mode: PropagationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_host_attribute(mut self, name: impl Into<String>) -> Self {
        self.host_attribute = Some(name.into());
        self
    }

    pub fn with_bbox_prefilter(mut self, enabled: bool) -> Self {
        self.bbox_prefilter = enabled;
        self
    }

    /// Shorthand for attribute-copy mode reading `host_attribute` from hosts
    /// and writing `target` on linear elements.
    pub fn attribute_copy(host_attribute: impl Into<String>, target: impl Into<String>) -> Self {
        Self::default()
            .with_host_attribute(host_attribute)
            .with_mode(PropagationMode::AttributeCopy { target: target.into() })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.probe_radius.is_finite() || self.probe_radius <= 0.0 {
            return Err(Error::Config(format!(
                "probe_radius must be positive and finite, got {}",
                self.probe_radius
            )));
        }
        if let PropagationMode::AttributeCopy { target } = &self.mode {
            if target.trim().is_empty() {
                return Err(Error::Config("attribute_copy target must not be empty".into()));
            }
            match &self.host_attribute {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(Error::Config(
                        "attribute_copy mode requires a host_attribute".into(),
                    ))
                }
            }
        }
        if self.transaction_name.trim().is_empty() {
            return Err(Error::Config("transaction_name must not be empty".into()));
        }
        Ok(())
    }
}
