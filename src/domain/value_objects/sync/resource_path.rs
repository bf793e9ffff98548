use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Target resource path of a request, relative to the backend base address
/// (e.g. `/wallet/topup`). Absolute URLs are rejected so every replay goes
/// through the configured backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        Self::validate(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Resource path cannot be empty".to_string());
        }
        if !value.starts_with('/') {
            return Err(format!("Resource path must start with '/': {value}"));
        }
        if value.contains("://") {
            return Err(format!("Resource path must be relative: {value}"));
        }
        Ok(())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}

impl FromStr for ResourcePath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
