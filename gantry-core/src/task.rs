//! Task data model.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A named unit of work with declared dependencies.
///
/// The action is an optional shell command. A task without a command is an
/// aggregate: it completes as soon as all of its dependencies complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub command: Option<String>,
    #[serde(
        deserialize_with = "deserialize_deps",
        serialize_with = "serialize_deps"
    )]
    pub deps: SmallVec<[String; 4]>,
    pub description: Option<String>,
}

fn deserialize_deps<'de, D>(deserializer: D) -> Result<SmallVec<[String; 4]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let vec: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(SmallVec::from_vec(vec))
}

fn serialize_deps<S>(deps: &SmallVec<[String; 4]>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::Serialize;
    let vec: Vec<&String> = deps.iter().collect();
    vec.serialize(serializer)
}

impl Task {
    pub fn new(name: impl Into<String>, command: impl Into<String>, deps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: Some(command.into()),
            deps: SmallVec::from_vec(deps),
            description: None,
        }
    }

    /// Creates a task with dependencies but no action of its own.
    pub fn aggregate(name: impl Into<String>, deps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
            deps: SmallVec::from_vec(deps),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn has_action(&self) -> bool {
        self.command.is_some()
    }
}
