//! Field vocabularies for `-F` queries and parsing of the tab-delimited rows tmux prints back.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Delimiter between fields in a query row. tmux never emits it inside a format value.
pub const FIELD_DELIMITER: char = '\t';

/// Fields describing a session (`format_session()` in tmux)
pub static SESSION_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    FieldSet::new(&[
        "session_name",
        "session_windows",
        "session_width",
        "session_height",
        "session_id",
        "session_created",
        "session_created_string",
        "session_attached",
        "session_grouped",
        "session_group",
    ])
});

/// Fields describing a window and its winlink
pub static WINDOW_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    FieldSet::new(&[
        "window_id",
        "window_name",
        "window_width",
        "window_height",
        "window_layout",
        "window_panes",
        "window_index",
        "window_flags",
        "window_active",
        "window_bell_flag",
        "window_activity_flag",
        "window_silence_flag",
    ])
});

/// Fields describing a pane and the terminal state inside it
pub static PANE_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    FieldSet::new(&[
        "history_size",
        "history_limit",
        "history_bytes",
        "pane_index",
        "pane_width",
        "pane_height",
        "pane_title",
        "pane_id",
        "pane_active",
        "pane_dead",
        "pane_in_mode",
        "pane_synchronized",
        "pane_tty",
        "pane_pid",
        "pane_start_command",
        "pane_start_path",
        "pane_current_path",
        "pane_current_command",
        "cursor_x",
        "cursor_y",
        "scroll_region_upper",
        "scroll_region_lower",
        "saved_cursor_x",
        "saved_cursor_y",
        "alternate_on",
        "alternate_saved_x",
        "alternate_saved_y",
        "cursor_flag",
        "insert_flag",
        "keypad_cursor_flag",
        "keypad_flag",
        "wrap_flag",
        "mouse_standard_flag",
        "mouse_button_flag",
        "mouse_any_flag",
        "mouse_utf8_flag",
    ])
});

/// Pane listings carry the window fields too, so rows can be joined on `window_index`
pub static PANE_LISTING_FIELDS: Lazy<FieldSet> = Lazy::new(|| PANE_FIELDS.chain(&WINDOW_FIELDS));

/// Ordered, deduplicated field names for one entity kind.
///
/// The order is the positional contract with each response row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<&'static str>,
}

impl FieldSet {
    /// Build a field set, keeping the first occurrence of any repeated name
    pub fn new(fields: &[&'static str]) -> Self {
        let mut deduped: Vec<&'static str> = Vec::with_capacity(fields.len());
        for &field in fields {
            if !deduped.contains(&field) {
                deduped.push(field);
            }
        }
        Self { fields: deduped }
    }

    /// This set followed by the fields of `other` it does not already hold
    pub fn chain(&self, other: &FieldSet) -> FieldSet {
        let mut fields = self.fields.clone();
        fields.extend_from_slice(&other.fields);
        FieldSet::new(&fields)
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| *f == field)
    }

    /// Render the `-F` argument: `#{a}\t#{b}\t...`
    pub fn query(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("#{{{}}}", field))
            .collect::<Vec<_>>()
            .join(&FIELD_DELIMITER.to_string())
    }

    /// Zip one response row with the field names.
    ///
    /// Empty values are dropped. A short row yields a partial map; extra
    /// trailing tokens are ignored.
    pub fn parse_row(&self, row: &str) -> AttributeMap {
        self.fields
            .iter()
            .zip(row.split(FIELD_DELIMITER))
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect()
    }

    /// Parse every non-blank line of a command's stdout
    pub fn parse_output(&self, stdout: &str) -> Vec<AttributeMap> {
        stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_row(line))
            .collect()
    }
}

/// Sparse field-name to value map for one entity, as reported by tmux.
///
/// Never holds an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, String>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Store a value; an empty value removes the field instead
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&field);
        } else {
            self.0.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}
