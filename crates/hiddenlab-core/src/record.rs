use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::EditError;
use crate::types::{Mark, RecordKind};

/// Element categories a reviewer saw at the interaction target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSelection {
    #[serde(rename = "selectedOptions", default)]
    pub selected_options: Vec<String>,
    #[serde(
        rename = "othersText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub others_text: Option<String>,
}

impl ElementSelection {
    /// No options selected and no other-text worth keeping.
    pub fn is_empty(&self) -> bool {
        self.selected_options.is_empty()
            && self
                .others_text
                .as_deref()
                .map_or(true, |t| t.trim().is_empty())
    }

    pub fn contains(&self, option: &str) -> bool {
        self.selected_options.iter().any(|o| o == option)
    }

    /// Selected options with duplicates removed, in first-seen order.
    pub fn distinct_options(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for option in &self.selected_options {
            if !seen.contains(&option.as_str()) {
                seen.push(option);
            }
        }
        seen
    }

    fn toggle(&mut self, option: &str) {
        if self.contains(option) {
            self.selected_options.retain(|o| o != option);
        } else {
            self.selected_options.push(option.to_string());
        }
    }
}

/// One persisted entry of an instance's decision file.
///
/// The decision is kept as raw JSON so records written by older tools or by
/// hand survive a read/write cycle; typed accessors return `None` when the
/// shape does not match the record's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub decision: Value,
}

impl DecisionRecord {
    pub fn mark(kind: RecordKind, mark: Mark) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            decision: Value::String(mark.as_str().to_string()),
        }
    }

    pub fn element(selection: &ElementSelection) -> Self {
        Self {
            kind: RecordKind::ElementType.as_str().to_string(),
            decision: serde_json::to_value(selection).unwrap_or(Value::Null),
        }
    }

    pub fn frames(frames: &[String]) -> Self {
        Self {
            kind: RecordKind::DuringAfter.as_str().to_string(),
            decision: Value::Array(frames.iter().cloned().map(Value::String).collect()),
        }
    }

    /// The record's type, if it is one of the known tags.
    pub fn record_kind(&self) -> Option<RecordKind> {
        self.kind.parse().ok()
    }

    pub fn is(&self, kind: RecordKind) -> bool {
        self.kind == kind.as_str()
    }

    pub fn as_mark(&self) -> Option<Mark> {
        self.decision.as_str().and_then(|s| s.parse().ok())
    }

    pub fn as_element_selection(&self) -> Option<ElementSelection> {
        if !self.decision.is_object() {
            return None;
        }
        serde_json::from_value(self.decision.clone()).ok()
    }

    pub fn as_frames(&self) -> Option<Vec<String>> {
        self.decision
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

/// The complete decision state of one instance.
///
/// Lookups use the first record of a given type in list order. Edits remove
/// every record of the edited type and append the replacement, so a list that
/// went through an edit never holds duplicates of that type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordList(Vec<DecisionRecord>);

impl<'de> Deserialize<'de> for RecordList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Entries without a string `type` cannot be addressed; drop them.
        let raw = Vec::<Value>::deserialize(deserializer)?;
        let records = raw
            .into_iter()
            .filter_map(|v| serde_json::from_value::<DecisionRecord>(v).ok())
            .collect();
        Ok(Self(records))
    }
}

impl RecordList {
    pub fn new(records: Vec<DecisionRecord>) -> Self {
        Self(records)
    }

    /// Parse decision file content. Blank content is an empty list.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content)
    }

    /// Pretty JSON with 2-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecisionRecord> {
        self.0.iter()
    }

    /// First record of the given type.
    pub fn find(&self, kind: RecordKind) -> Option<&DecisionRecord> {
        self.0.iter().find(|r| r.is(kind))
    }

    pub fn mark(&self, kind: RecordKind) -> Option<Mark> {
        self.find(kind).and_then(DecisionRecord::as_mark)
    }

    pub fn element_selection(&self) -> Option<ElementSelection> {
        self.find(RecordKind::ElementType)
            .and_then(DecisionRecord::as_element_selection)
    }

    pub fn frames(&self) -> Option<Vec<String>> {
        self.find(RecordKind::DuringAfter)
            .and_then(DecisionRecord::as_frames)
    }

    /// Records keyed by type, first occurrence winning.
    pub fn by_kind(&self) -> BTreeMap<&str, &Value> {
        let mut map = BTreeMap::new();
        for record in &self.0 {
            map.entry(record.kind.as_str()).or_insert(&record.decision);
        }
        map
    }

    /// Equality that ignores record order.
    pub fn same_decisions(&self, other: &RecordList) -> bool {
        self.by_kind() == other.by_kind()
    }

    /// Yes/no button semantics: pressing the current answer clears it.
    pub fn toggle_mark(&mut self, kind: RecordKind, mark: Mark) -> Result<Mark, EditError> {
        let next = if self.mark(kind) == Some(mark) {
            Mark::Unset
        } else {
            mark
        };
        self.set_mark(kind, next)?;
        Ok(next)
    }

    pub fn set_mark(&mut self, kind: RecordKind, mark: Mark) -> Result<(), EditError> {
        if !kind.is_mark() {
            return Err(EditError::NotAMark(kind));
        }
        self.replace(kind, Some(DecisionRecord::mark(kind, mark)));
        Ok(())
    }

    /// Flip one element category. The record is dropped once nothing is left.
    pub fn toggle_element_option(&mut self, option: &str) -> ElementSelection {
        let mut selection = self.element_selection().unwrap_or_default();
        selection.toggle(option);
        self.put_selection(&selection);
        selection
    }

    pub fn set_others_text(&mut self, text: &str) -> ElementSelection {
        let mut selection = self.element_selection().unwrap_or_default();
        selection.others_text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        self.put_selection(&selection);
        selection
    }

    /// Flip one during/after frame. An emptied selection stays as `[]`.
    pub fn toggle_frame(&mut self, stem: &str) -> Vec<String> {
        let mut frames = self.frames().unwrap_or_default();
        if frames.iter().any(|f| f == stem) {
            frames.retain(|f| f != stem);
        } else {
            frames.push(stem.to_string());
        }
        self.replace(
            RecordKind::DuringAfter,
            Some(DecisionRecord::frames(&frames)),
        );
        frames
    }

    fn put_selection(&mut self, selection: &ElementSelection) {
        let record = (!selection.is_empty()).then(|| DecisionRecord::element(selection));
        self.replace(RecordKind::ElementType, record);
    }

    fn replace(&mut self, kind: RecordKind, record: Option<DecisionRecord>) {
        self.0.retain(|r| !r.is(kind));
        if let Some(record) = record {
            self.0.push(record);
        }
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a DecisionRecord;
    type IntoIter = std::slice::Iter<'a, DecisionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<DecisionRecord>> for RecordList {
    fn from(records: Vec<DecisionRecord>) -> Self {
        Self(records)
    }
}
