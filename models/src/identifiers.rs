
use core::{hash::Hash, ops::Deref};
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use internment::Intern;
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult, GraphError, GraphResult};

#[derive(Clone, Debug, Default, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializableUuid(pub Uuid);

impl SerializableUuid {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn from(s: &str) -> GraphResult<Self> {
        Uuid::parse_str(s)
            .map(SerializableUuid)
            .map_err(|e| GraphError::Uuid(e.to_string()))
    }
}

impl FromStr for SerializableUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(SerializableUuid)
    }
}

impl fmt::Display for SerializableUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SerializableUuid {
    fn from(uuid: Uuid) -> Self {
        SerializableUuid(uuid)
    }
}

impl From<SerializableUuid> for Uuid {
    fn from(s_uuid: SerializableUuid) -> Self {
        s_uuid.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializableInternString(pub Intern<String>);

impl From<Intern<String>> for SerializableInternString {
    fn from(intern_str: Intern<String>) -> Self {
        SerializableInternString(intern_str)
    }
}

impl AsRef<str> for SerializableInternString {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl Deref for SerializableInternString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl fmt::Display for SerializableInternString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Identifier(pub SerializableInternString);

impl Identifier {
    pub fn new(value: String) -> ValidationResult<Self> {
        if value.is_empty() || value.len() > u8::MAX as usize {
            return Err(ValidationError::InvalidIdentifierLength);
        }
        Ok(Self(SerializableInternString(Intern::new(value))))
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl Deref for Identifier {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl FromStr for Identifier {
    type Err = ValidationError;
    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
