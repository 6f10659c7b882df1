//! Fixed naming contract for the single `records` table.
//!
//! # Responsibility
//! - Own every constant shared by storage, routing and collaborators.
//! - Keep the classifier domain check in one pure predicate.
//!
//! # Invariants
//! - Column names here are the physical column names in SQLite.
//! - `CLASSIFIER_*` values are the only legal persisted classifier values.

/// Content authority prefix accepted on fully-qualified identifiers.
pub const CONTENT_AUTHORITY: &str = "com.example.shelter";

/// Identifier path segment addressing the whole collection.
pub const PATH_RECORDS: &str = "records";

/// Default database file name used by file-backed stores.
pub const DATABASE_NAME: &str = "shelter.db";

/// Physical table name.
pub const TABLE_NAME: &str = "records";

pub const COLUMN_ID: &str = "id";
pub const COLUMN_NAME: &str = "name";
pub const COLUMN_CATEGORY: &str = "category";
pub const COLUMN_CLASSIFIER: &str = "classifier";
pub const COLUMN_MEASURE: &str = "measure";

pub const CLASSIFIER_UNKNOWN: i64 = 0;
pub const CLASSIFIER_A: i64 = 1;
pub const CLASSIFIER_B: i64 = 2;

/// Type token for identifiers addressing the whole collection.
pub const CONTENT_LIST_TYPE: &str = "vnd.cursor.dir/com.example.shelter/records";

/// Type token for identifiers addressing a single record.
pub const CONTENT_ITEM_TYPE: &str = "vnd.cursor.item/com.example.shelter/records";

/// Returns whether `value` is one of the defined classifier constants.
pub fn is_valid_classifier(value: i64) -> bool {
    matches!(value, CLASSIFIER_UNKNOWN | CLASSIFIER_A | CLASSIFIER_B)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_classifier, CONTENT_AUTHORITY, CONTENT_ITEM_TYPE, CONTENT_LIST_TYPE};

    #[test]
    fn classifier_predicate_accepts_only_defined_values() {
        assert!(is_valid_classifier(0));
        assert!(is_valid_classifier(1));
        assert!(is_valid_classifier(2));
        assert!(!is_valid_classifier(-1));
        assert!(!is_valid_classifier(3));
        assert!(!is_valid_classifier(i64::MAX));
    }

    #[test]
    fn type_tokens_carry_authority() {
        assert!(CONTENT_LIST_TYPE.contains(CONTENT_AUTHORITY));
        assert!(CONTENT_ITEM_TYPE.contains(CONTENT_AUTHORITY));
        assert_ne!(CONTENT_LIST_TYPE, CONTENT_ITEM_TYPE);
    }
}
