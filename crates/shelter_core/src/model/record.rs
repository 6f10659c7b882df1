//! Record domain model.
//!
//! # Responsibility
//! - Define the typed column set, classifier enum and field values.
//! - Provide the payload map used by insert/update and the row shape
//!   returned by queries.
//!
//! # Invariants
//! - `Record::id` is assigned by the store and never chosen by callers.
//! - A decoded `Record` always has a valid classifier and `measure >= 0`.

use crate::model::contract::{
    CLASSIFIER_A, CLASSIFIER_B, CLASSIFIER_UNKNOWN, COLUMN_CATEGORY, COLUMN_CLASSIFIER,
    COLUMN_ID, COLUMN_MEASURE, COLUMN_NAME,
};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Physical columns of the `records` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Name,
    Category,
    Classifier,
    Measure,
}

impl Column {
    /// All columns in physical table order.
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Name,
        Column::Category,
        Column::Classifier,
        Column::Measure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => COLUMN_ID,
            Self::Name => COLUMN_NAME,
            Self::Category => COLUMN_CATEGORY,
            Self::Classifier => COLUMN_CLASSIFIER,
            Self::Measure => COLUMN_MEASURE,
        }
    }

    /// Resolves a physical column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == name)
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small enumerated attribute stored in `classifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    Unknown,
    A,
    B,
}

impl Classifier {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Unknown => CLASSIFIER_UNKNOWN,
            Self::A => CLASSIFIER_A,
            Self::B => CLASSIFIER_B,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            CLASSIFIER_UNKNOWN => Some(Self::Unknown),
            CLASSIFIER_A => Some(Self::A),
            CLASSIFIER_B => Some(Self::B),
            _ => None,
        }
    }
}

/// Loosely-typed cell value carried by payloads and query rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Classifier> for FieldValue {
    fn from(value: Classifier) -> Self {
        Self::Integer(value.as_i64())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

impl FromSql for FieldValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::Null),
            ValueRef::Integer(value) => Ok(Self::Integer(value)),
            ValueRef::Text(_) => value.as_str().map(|text| Self::Text(text.to_string())),
            ValueRef::Real(_) | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Column-keyed payload for insert and update requests.
///
/// Only present keys are written; absent keys are left to store defaults
/// (insert) or untouched (update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValues {
    values: BTreeMap<Column, FieldValue>,
}

impl RecordValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `put`.
    pub fn with(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.put(column, value);
        self
    }

    pub fn put(&mut self, column: Column, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(column, value.into())
    }

    pub fn remove(&mut self, column: Column) -> Option<FieldValue> {
        self.values.remove(&column)
    }

    pub fn get(&self, column: Column) -> Option<&FieldValue> {
        self.values.get(&column)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.values.contains_key(&column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, &FieldValue)> {
        self.values.iter().map(|(column, value)| (*column, value))
    }
}

/// Fully decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned key.
    pub id: i64,
    pub name: String,
    /// `None` and empty are both legal; consumers pick a display default.
    pub category: Option<String>,
    pub classifier: Classifier,
    /// Non-negative, defaults to 0 when omitted on insert.
    pub measure: i64,
}

impl Record {
    /// Returns the writable fields of this record as a payload.
    ///
    /// `id` is never included because it is immutable once assigned.
    pub fn to_values(&self) -> RecordValues {
        RecordValues::new()
            .with(Column::Name, self.name.as_str())
            .with(Column::Category, self.category.clone())
            .with(Column::Classifier, self.classifier)
            .with(Column::Measure, self.measure)
    }
}

/// Persisted row data that cannot be decoded into a `Record`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDataError {
    pub column: Column,
    pub message: String,
}

impl Display for RecordDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid persisted record data in records.{}: {}",
            self.column, self.message
        )
    }
}

impl Error for RecordDataError {}

/// One query result row restricted to the projected columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRow {
    cells: BTreeMap<Column, FieldValue>,
}

impl RecordRow {
    pub(crate) fn from_cells(cells: BTreeMap<Column, FieldValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: Column) -> Option<&FieldValue> {
        self.cells.get(&column)
    }

    pub fn id(&self) -> Option<i64> {
        self.get(Column::Id).and_then(FieldValue::as_i64)
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.cells.keys().copied()
    }

    /// Decodes a row that was queried with every column projected.
    pub fn to_record(&self) -> Result<Record, RecordDataError> {
        let id = self.required_integer(Column::Id)?;
        let name = match self.get(Column::Name) {
            Some(FieldValue::Text(value)) => value.clone(),
            other => return Err(unexpected(Column::Name, other)),
        };
        let category = match self.get(Column::Category) {
            Some(FieldValue::Text(value)) => Some(value.clone()),
            Some(FieldValue::Null) => None,
            other => return Err(unexpected(Column::Category, other)),
        };
        let raw_classifier = self.required_integer(Column::Classifier)?;
        let classifier = Classifier::from_i64(raw_classifier).ok_or_else(|| RecordDataError {
            column: Column::Classifier,
            message: format!("unknown classifier `{raw_classifier}`"),
        })?;
        let measure = self.required_integer(Column::Measure)?;
        if measure < 0 {
            return Err(RecordDataError {
                column: Column::Measure,
                message: format!("negative measure `{measure}`"),
            });
        }

        Ok(Record {
            id,
            name,
            category,
            classifier,
            measure,
        })
    }

    fn required_integer(&self, column: Column) -> Result<i64, RecordDataError> {
        match self.get(column) {
            Some(FieldValue::Integer(value)) => Ok(*value),
            other => Err(unexpected(column, other)),
        }
    }
}

fn unexpected(column: Column, value: Option<&FieldValue>) -> RecordDataError {
    let message = match value {
        None => "column was not projected".to_string(),
        Some(FieldValue::Null) => "unexpected null".to_string(),
        Some(FieldValue::Integer(value)) => format!("unexpected integer `{value}`"),
        Some(FieldValue::Text(_)) => "unexpected text".to_string(),
    };
    RecordDataError { column, message }
}

#[cfg(test)]
mod tests {
    use super::{Classifier, Column, FieldValue, Record, RecordRow, RecordValues};
    use std::collections::BTreeMap;

    fn full_row(classifier: i64, measure: i64) -> RecordRow {
        let mut cells = BTreeMap::new();
        cells.insert(Column::Id, FieldValue::Integer(4));
        cells.insert(Column::Name, FieldValue::Text("Toto".to_string()));
        cells.insert(Column::Category, FieldValue::Null);
        cells.insert(Column::Classifier, FieldValue::Integer(classifier));
        cells.insert(Column::Measure, FieldValue::Integer(measure));
        RecordRow::from_cells(cells)
    }

    #[test]
    fn column_names_roundtrip() {
        for column in Column::ALL {
            assert_eq!(Column::from_name(column.as_str()), Some(column));
        }
        assert_eq!(Column::from_name("weight"), None);
    }

    #[test]
    fn classifier_maps_to_contract_values() {
        assert_eq!(Classifier::from_i64(1), Some(Classifier::A));
        assert_eq!(Classifier::B.as_i64(), 2);
        assert_eq!(Classifier::from_i64(7), None);
    }

    #[test]
    fn option_values_become_null() {
        let values = RecordValues::new().with(Column::Category, None::<String>);
        assert_eq!(values.get(Column::Category), Some(&FieldValue::Null));
        assert!(values.contains(Column::Category));
        assert!(!values.contains(Column::Name));
    }

    #[test]
    fn to_values_never_includes_id() {
        let record = Record {
            id: 9,
            name: "Rex".to_string(),
            category: None,
            classifier: Classifier::B,
            measure: 3,
        };
        let values = record.to_values();
        assert!(!values.contains(Column::Id));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn row_decodes_into_record() {
        let record = full_row(1, 7).to_record().expect("row should decode");
        assert_eq!(record.id, 4);
        assert_eq!(record.classifier, Classifier::A);
        assert_eq!(record.category, None);
    }

    #[test]
    fn row_decode_rejects_invalid_persisted_state() {
        let err = full_row(5, 0).to_record().unwrap_err();
        assert_eq!(err.column, Column::Classifier);

        let err = full_row(0, -1).to_record().unwrap_err();
        assert_eq!(err.column, Column::Measure);
    }

    #[test]
    fn partial_row_cannot_decode() {
        let mut cells = BTreeMap::new();
        cells.insert(Column::Id, FieldValue::Integer(1));
        let err = RecordRow::from_cells(cells).to_record().unwrap_err();
        assert_eq!(err.column, Column::Name);
        assert!(err.message.contains("not projected"));
    }
}
