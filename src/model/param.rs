//! Typed element parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ElementId;

/// Storage kind of a parameter, independent of whether it holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    ElementId,
    Integer,
    Double,
    String,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::ElementId => "ELEMENT_ID",
            StorageType::Integer => "INTEGER",
            StorageType::Double => "DOUBLE",
            StorageType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParamValue {
    ElementId(ElementId),
    Integer(i64),
    Double(f64),
    String(String),
}

impl ParamValue {
    pub fn storage_type(&self) -> StorageType {
        match self {
            ParamValue::ElementId(_) => StorageType::ElementId,
            ParamValue::Integer(_) => StorageType::Integer,
            ParamValue::Double(_) => StorageType::Double,
            ParamValue::String(_) => StorageType::String,
        }
    }

    pub fn as_element_id(&self) -> Option<ElementId> {
        match self {
            ParamValue::ElementId(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<ElementId> for ParamValue {
    fn from(id: ElementId) -> Self { ParamValue::ElementId(id) }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self { ParamValue::Integer(i) }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self { ParamValue::Double(f) }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self { ParamValue::String(s.to_owned()) }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self { ParamValue::String(s) }
}

/// A named parameter as exposed by the document.
///
/// A parameter can exist with no value yet (`value: None`); its storage
/// kind is fixed regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub storage_type: StorageType,
    pub value: Option<ParamValue>,
    pub read_only: bool,
}

impl Parameter {
    /// An empty, writable parameter of the given kind.
    pub fn new(name: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            name: name.into(),
            storage_type,
            value: None,
            read_only: false,
        }
    }

    /// A writable parameter holding `value`; the kind follows the value.
    pub fn with_value(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            storage_type: value.storage_type(),
            value: Some(value),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The value, if this parameter stores an element id.
    pub fn element_id(&self) -> Option<ElementId> {
        if self.storage_type != StorageType::ElementId {
            return None;
        }
        self.value.as_ref().and_then(ParamValue::as_element_id)
    }
}
