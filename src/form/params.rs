//! Notebook parameter rows addressed by stable ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Parameters;

pub const PARAMETER_NAME_ERROR: &str = "No name specified for this parameter";

/// Identifies a parameter row for its whole lifetime, independent of its
/// position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(u64);

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parameter-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameter {
    pub id: ParamId,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    rows: Vec<JobParameter>,
    errors: BTreeMap<ParamId, String>,
    next_id: u64,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for an existing name→value map, in key order. Non-string values
    /// are shown in their JSON form.
    pub fn from_parameters(parameters: &Parameters) -> Self {
        let mut list = Self::new();
        for (name, value) in parameters {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            list.push(name.clone(), text);
        }
        list
    }

    /// Append an empty row.
    pub fn add(&mut self) -> ParamId {
        self.push(String::new(), String::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> ParamId {
        let id = ParamId(self.next_id);
        self.next_id += 1;
        self.rows.push(JobParameter {
            id,
            name: name.into(),
            value: value.into(),
        });
        id
    }

    /// Remove a row and its error. Other rows keep their ids and errors.
    pub fn remove(&mut self, id: ParamId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.errors.remove(&id);
        self.rows.len() != before
    }

    pub fn set_name(&mut self, id: ParamId, name: impl Into<String>) -> bool {
        let Some(row) = self.rows.iter_mut().find(|row| row.id == id) else {
            return false;
        };
        row.name = name.into();
        let blank = row.name.trim().is_empty();
        self.set_error(id, blank);
        true
    }

    pub fn set_value(&mut self, id: ParamId, value: impl Into<String>) -> bool {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.value = value.into();
                true
            }
            None => false,
        }
    }

    fn set_error(&mut self, id: ParamId, blank: bool) {
        if blank {
            self.errors.insert(id, PARAMETER_NAME_ERROR.to_string());
        } else {
            self.errors.remove(&id);
        }
    }

    /// Check every row, e.g. before submitting.
    pub fn validate(&mut self) {
        let blank: Vec<(ParamId, bool)> = self
            .rows
            .iter()
            .map(|row| (row.id, row.name.trim().is_empty()))
            .collect();
        for (id, blank) in blank {
            self.set_error(id, blank);
        }
    }

    /// Error for a row; empty when it has none.
    pub fn error(&self, id: ParamId) -> &str {
        self.errors.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn errors(&self) -> impl Iterator<Item = (ParamId, &str)> {
        self.errors.iter().map(|(id, message)| (*id, message.as_str()))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn get(&self, id: ParamId) -> Option<&JobParameter> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobParameter> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to a name→value map. A repeated name keeps its first value.
    pub fn to_parameters(&self) -> Parameters {
        let mut parameters = Parameters::new();
        for row in &self.rows {
            match parameters.get(&row.name) {
                Some(existing) => warn!(
                    name = %row.name,
                    kept = %existing,
                    ignored = %row.value,
                    "Duplicate parameter name"
                ),
                None => {
                    parameters.insert(row.name.clone(), row.value.clone().into());
                }
            }
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_keeps_errors_attached() {
        let mut params = ParameterList::new();
        let a = params.add();
        let b = params.add();
        let c = params.add();

        params.set_name(a, "alpha");
        params.set_name(c, "");
        assert_eq!(params.error(c), PARAMETER_NAME_ERROR);
        assert_eq!(params.error(a), "");

        assert!(params.remove(b));
        assert_eq!(params.len(), 2);
        assert_eq!(params.error(c), PARAMETER_NAME_ERROR);
        assert_eq!(params.error(a), "");
        assert!(!params.remove(b));

        assert!(params.remove(c));
        assert!(!params.has_errors());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut params = ParameterList::new();
        let a = params.add();
        params.remove(a);
        let b = params.add();
        assert_ne!(a, b);
        assert!(params.get(a).is_none());
    }

    #[test]
    fn validate_flags_blank_names() {
        let mut params = ParameterList::new();
        let blank = params.add();
        let named = params.push("x", "1");
        assert!(!params.has_errors());

        params.validate();
        assert_eq!(params.error(blank), PARAMETER_NAME_ERROR);
        assert_eq!(params.error(named), "");
    }

    #[test]
    fn duplicate_names_keep_first_value() {
        let mut params = ParameterList::new();
        params.push("alpha", "1");
        params.push("beta", "2");
        params.push("alpha", "3");
        let map = params.to_parameters();
        assert_eq!(map.len(), 2);
        assert_eq!(map["alpha"], "1");
        assert_eq!(map["beta"], "2");
    }

    #[test]
    fn edits_address_rows_by_id() {
        let mut params = ParameterList::new();
        let a = params.push("a", "1");
        let b = params.push("b", "2");
        params.remove(a);
        assert!(params.set_value(b, "20"));
        assert!(!params.set_value(a, "10"));
        assert_eq!(params.get(b).unwrap().value, "20");
        assert_eq!(b.to_string(), "parameter-1");
    }

    #[test]
    fn from_parameters_round_trips() {
        let mut map = Parameters::new();
        map.insert("x".into(), "1".into());
        map.insert("y".into(), "2".into());
        assert_eq!(ParameterList::from_parameters(&map).to_parameters(), map);
    }

    #[test]
    fn scalar_values_become_editable_text() {
        let map: Parameters =
            serde_json::from_value(serde_json::json!({ "n": 5, "flag": true, "rate": 0.5 })).unwrap();
        let params = ParameterList::from_parameters(&map);
        let values: Vec<(&str, &str)> = params
            .iter()
            .map(|row| (row.name.as_str(), row.value.as_str()))
            .collect();
        assert_eq!(values, [("flag", "true"), ("n", "5"), ("rate", "0.5")]);
        assert_eq!(params.to_parameters()["n"], "5");
    }
}
