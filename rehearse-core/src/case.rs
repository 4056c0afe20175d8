//! Case documents: skeleton of canon events, personas and scene context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// Rubric score levels, highest first.
pub const RUBRIC_LEVELS: [u8; 5] = [5, 4, 3, 2, 1];

/// One success criterion of a canon event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    #[serde(default)]
    pub description: String,
    /// Descriptor of what each rubric score means for this criterion.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub levels: BTreeMap<u8, String>,
}

impl SuccessCriterion {
    /// Descriptor for a rubric level, if the case defines one.
    pub fn level(&self, score: u8) -> Option<&str> {
        self.levels.get(&score).map(String::as_str)
    }
}

/// One scripted beat of a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        alias = "successCriteria",
        deserialize_with = "lenient::or_default"
    )]
    pub success_criteria: Vec<SuccessCriterion>,
    /// Next canon event id per rubric score. Empty targets are terminal.
    #[serde(
        default,
        alias = "scoreBranches",
        deserialize_with = "lenient::or_default"
    )]
    pub score_branches: BTreeMap<u8, Option<String>>,
}

impl CanonEvent {
    /// Create an event carrying only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set a score branch target.
    pub fn with_branch(mut self, score: u8, next: impl Into<String>) -> Self {
        self.score_branches.insert(score, Some(next.into()));
        self
    }

    /// Resolve the event a given rubric score leads to.
    ///
    /// Returns `None` when the branch is absent or empty (terminal).
    pub fn next_event(&self, score: u8) -> Option<&str> {
        self.score_branches
            .get(&score)
            .and_then(|target| target.as_deref())
            .filter(|target| !target.trim().is_empty())
    }

    /// Returns true if no rubric score leads anywhere.
    pub fn is_terminal(&self) -> bool {
        RUBRIC_LEVELS.iter().all(|s| self.next_event(*s).is_none())
    }
}

/// Entry of a skeleton's `canon_events` array.
///
/// Older case documents list bare event ids instead of full objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonEventEntry {
    Id(String),
    Event(CanonEvent),
}

impl CanonEventEntry {
    /// The event id, or `None` when it is empty.
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            Self::Id(id) => id.as_str(),
            Self::Event(event) => event.id.as_str(),
        };
        if id.trim().is_empty() { None } else { Some(id) }
    }

    /// The full event, when the entry carries one.
    pub fn as_event(&self) -> Option<&CanonEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Id(_) => None,
        }
    }
}

impl From<CanonEvent> for CanonEventEntry {
    fn from(event: CanonEvent) -> Self {
        Self::Event(event)
    }
}

/// Ordered list of canon events for a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub canon_events: Vec<CanonEventEntry>,
}

impl Skeleton {
    /// Create a skeleton from full canon events.
    pub fn new(
        case_id: impl Into<String>,
        title: impl Into<String>,
        events: impl IntoIterator<Item = CanonEvent>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            title: title.into(),
            canon_events: events.into_iter().map(CanonEventEntry::from).collect(),
        }
    }

    /// Id of the last canon event by array position.
    ///
    /// This event acts as the completion sentinel for the case.
    pub fn last_event_id(&self) -> Option<&str> {
        self.canon_events.last().and_then(CanonEventEntry::id)
    }

    /// Look up a full canon event by id.
    pub fn event(&self, id: &str) -> Option<&CanonEvent> {
        self.canon_events
            .iter()
            .filter_map(CanonEventEntry::as_event)
            .find(|event| event.id == id)
    }

    /// Array position of an event id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.canon_events
            .iter()
            .position(|entry| entry.id() == Some(id))
    }

    /// Number of canon events.
    pub fn len(&self) -> usize {
        self.canon_events.len()
    }

    /// Returns true if the skeleton has no canon events.
    pub fn is_empty(&self) -> bool {
        self.canon_events.is_empty()
    }
}

/// Persona display metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Persona {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A complete scenario bundle as served by the case store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseBundle {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub skeleton: Skeleton,
    #[serde(default)]
    pub personas: Value,
    #[serde(default)]
    pub context: Value,
}

/// Case listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case_id: String,
    #[serde(default)]
    pub topic: Option<String>,
}
