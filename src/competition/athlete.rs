use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque athlete identifier, as issued by the ingestion side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(String);

impl AthleteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AthleteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
}

impl Athlete {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AthleteId::new(id),
            name: name.into(),
        }
    }
}

/// Look up an athlete's display name, falling back to the raw id.
pub fn display_name<'a>(athletes: &'a [Athlete], id: &'a AthleteId) -> &'a str {
    athletes
        .iter()
        .find(|a| &a.id == id)
        .map(|a| a.name.as_str())
        .unwrap_or_else(|| id.as_str())
}
