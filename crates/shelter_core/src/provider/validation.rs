//! Payload validation for insert and update requests.
//!
//! # Invariants
//! - Checks run in a fixed order: `id`, `name`, `classifier`, `measure`.
//! - `category` accepts any value.
//! - Validation never touches the store.

use crate::model::contract::is_valid_classifier;
use crate::model::record::{Column, FieldValue, RecordValues};

/// Validates a full insert payload. Returns the first offending column.
pub(crate) fn validate_insert(values: &RecordValues) -> Result<(), Column> {
    if values.contains(Column::Id) {
        return Err(Column::Id);
    }
    check_name(values.get(Column::Name))?;
    check_classifier(values.get(Column::Classifier))?;
    if let Some(measure) = values.get(Column::Measure) {
        check_measure(measure)?;
    }
    Ok(())
}

/// Validates a partial update payload; only present fields are checked.
pub(crate) fn validate_update(values: &RecordValues) -> Result<(), Column> {
    if values.contains(Column::Id) {
        return Err(Column::Id);
    }
    if let Some(name) = values.get(Column::Name) {
        check_name(Some(name))?;
    }
    if let Some(classifier) = values.get(Column::Classifier) {
        check_classifier(Some(classifier))?;
    }
    if let Some(measure) = values.get(Column::Measure) {
        check_measure(measure)?;
    }
    Ok(())
}

fn check_name(value: Option<&FieldValue>) -> Result<(), Column> {
    match value {
        Some(FieldValue::Text(name)) if !name.trim().is_empty() => Ok(()),
        _ => Err(Column::Name),
    }
}

fn check_classifier(value: Option<&FieldValue>) -> Result<(), Column> {
    match value {
        Some(FieldValue::Integer(classifier)) if is_valid_classifier(*classifier) => Ok(()),
        _ => Err(Column::Classifier),
    }
}

fn check_measure(value: &FieldValue) -> Result<(), Column> {
    match value {
        FieldValue::Integer(measure) if *measure >= 0 => Ok(()),
        _ => Err(Column::Measure),
    }
}
