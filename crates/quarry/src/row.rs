//! Untyped result rows

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};

/// An ordered set of `column -> value` pairs as returned by the connection.
///
/// Rows are the result type of an untyped builder (`db.table("users").get()`)
/// and the raw material entity hydration works from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column and value lists.
    ///
    /// Extra values beyond the column list are dropped.
    pub fn new(columns: Vec<String>, mut values: Vec<Value>) -> Self {
        values.truncate(columns.len());
        values.resize(columns.len(), Value::Null);
        Self { columns, values }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|i| &self.values[i])
    }

    /// Typed value of `column`.
    pub fn get_as<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::hydration(column, "column not present in row"))?;
        T::from_value(value.clone()).map_err(|e| OrmError::hydration(column, e.to_string()))
    }

    /// Remove `column` from the row and return its value.
    pub fn take(&mut self, column: &str) -> Option<Value> {
        let i = self.position(column)?;
        self.columns.remove(i);
        Some(self.values.remove(i))
    }

    /// Set `column`, replacing an existing value or appending a new column.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.position(&column) {
            Some(i) => self.values[i] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<String>, std::vec::IntoIter<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter().zip(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::from_pairs([
            ("id", Value::Integer(1)),
            ("name", Value::Text("alice".into())),
        ])
    }

    #[test]
    fn get_and_get_as() {
        let row = row();
        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get_as::<String>("name").unwrap(), "alice");
        assert!(row.get("missing").is_none());
        assert!(matches!(
            row.get_as::<i64>("missing"),
            Err(OrmError::Hydration { .. })
        ));
    }

    #[test]
    fn take_removes_column() {
        let mut row = row();
        assert_eq!(row.take("id"), Some(Value::Integer(1)));
        assert_eq!(row.columns(), &["name".to_string()]);
        assert_eq!(row.take("id"), None);
    }

    #[test]
    fn set_replaces_or_appends() {
        let mut row = row();
        row.set("id", Value::Integer(9));
        row.set("email", Value::Null);
        assert_eq!(row.get("id"), Some(&Value::Integer(9)));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn new_pads_missing_values() {
        let row = Row::new(vec!["a".into(), "b".into()], vec![Value::Integer(1)]);
        assert_eq!(row.get("b"), Some(&Value::Null));
    }
}
