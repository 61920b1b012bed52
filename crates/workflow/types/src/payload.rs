//! Activity payloads: the type-specific data carried by each activity
//!
//! Payloads are kept as an ordered JSON object rather than a typed struct
//! per activity type. Editing may leave a payload temporarily out of range
//! (a negative timer, a malformed function list); the registry reports such
//! problems at validation time instead of rejecting the edit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key reserved for the activity label in the editor's node data
pub const LABEL_KEY: &str = "label";

/// Payload key for a timer's pause, in minutes
pub const PAUSE_DURATION_KEY: &str = "pauseDuration";

/// Payload key for the ordered function list of User and System activities
pub const FUNCTIONS_KEY: &str = "functions";

/// Payload key for the form presented by a User activity
pub const FORM_ID_KEY: &str = "form_id";

/// Payload key for the role assigned to a User activity
pub const ROLE_ID_KEY: &str = "role_id";

/// Type-specific payload of an activity
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ActivityData(Map<String, Value>);

impl ActivityData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from a JSON object, dropping the reserved label key
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        map.remove(LABEL_KEY);
        Self(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Shallow-merge a patch: every top-level key of the patch replaces the
    /// existing value, nested objects are not merged
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Timer pause in minutes, if present and integral
    pub fn pause_duration(&self) -> Option<i64> {
        self.get(PAUSE_DURATION_KEY).and_then(Value::as_i64)
    }

    pub fn form_id(&self) -> Option<&str> {
        self.get(FORM_ID_KEY).and_then(Value::as_str)
    }

    pub fn role_id(&self) -> Option<&str> {
        self.get(ROLE_ID_KEY).and_then(Value::as_str)
    }

    /// Function references in execution order; entries that do not parse
    /// are skipped
    pub fn functions(&self) -> Vec<FunctionRef> {
        let mut refs: Vec<FunctionRef> = self
            .get(FUNCTIONS_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        refs.sort_by_key(|f| f.order);
        refs
    }
}

impl From<Map<String, Value>> for ActivityData {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl From<ActivityData> for Map<String, Value> {
    fn from(data: ActivityData) -> Self {
        data.0
    }
}

/// A reference to a serverless function, run in `order` by User and System
/// activities
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRef {
    pub function_id: String,
    pub order: u32,
}

impl FunctionRef {
    pub fn new(function_id: impl Into<String>, order: u32) -> Self {
        Self {
            function_id: function_id.into(),
            order,
        }
    }
}
