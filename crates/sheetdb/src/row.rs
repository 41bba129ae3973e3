//! Plain row records.

use std::collections::BTreeMap;
use std::collections::btree_map;

use sheetdb_common::Value;

static EMPTY: Value = Value::Empty;

/// A decoded row: a plain mapping from column name to typed value.
///
/// Rows are ownership-free value records. The table's dataset is an
/// ordered `Vec<Row>` that gets replaced wholesale on load and save,
/// never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder-style insertion, handy when assembling datasets by hand.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// The value for a column; missing columns read as [`Value::Empty`].
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
