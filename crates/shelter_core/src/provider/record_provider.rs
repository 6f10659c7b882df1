//! Record router/validator: the single CRUD entry point.
//!
//! # Responsibility
//! - Classify identifiers and map them onto storage primitives.
//! - Validate payloads before any store access.
//! - Emit change notifications after successful writes.
//!
//! # Invariants
//! - Routing and validation errors never reach the store.
//! - Store failures surface as `ProviderError::Persistence`, never as a
//!   zero-effect success. The only silent no-op is an empty update.
//! - Notifications fire after the write handle is released, and only when
//!   at least one row changed.

use crate::db::{DbError, Projection, RecordStore, Selection, SortOrder};
use crate::model::contract::{CONTENT_ITEM_TYPE, CONTENT_LIST_TYPE};
use crate::model::record::{Column, Record, RecordDataError, RecordRow, RecordValues};
use crate::provider::notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
use crate::provider::uri::{ResourceId, UriMatcher};
use crate::provider::validation::{validate_insert, validate_update};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error kinds surfaced to provider callers.
#[derive(Debug)]
pub enum ProviderError {
    /// Identifier matches neither the collection nor the item shape.
    UnsupportedIdentifier(String),
    /// Operation is not defined for this identifier shape.
    UnsupportedOperation {
        operation: &'static str,
        identifier: ResourceId,
    },
    /// Payload failed the validation rule for this column.
    InvalidField(Column),
    /// Store refused or failed a request that passed validation.
    Persistence(DbError),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedIdentifier(raw) => write!(f, "unsupported identifier `{raw}`"),
            Self::UnsupportedOperation {
                operation,
                identifier,
            } => write!(f, "{operation} is not supported for `{identifier}`"),
            Self::InvalidField(column) => write!(f, "invalid value for field `{column}`"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::UnsupportedIdentifier(_)
            | Self::UnsupportedOperation { .. }
            | Self::InvalidField(_) => None,
        }
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

/// Anything that can name a provider resource.
pub trait Identifier {
    fn resolve(&self, matcher: &UriMatcher) -> Option<ResourceId>;
    fn raw(&self) -> String;
}

impl Identifier for str {
    fn resolve(&self, matcher: &UriMatcher) -> Option<ResourceId> {
        matcher.classify(self)
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

impl Identifier for String {
    fn resolve(&self, matcher: &UriMatcher) -> Option<ResourceId> {
        matcher.classify(self)
    }

    fn raw(&self) -> String {
        self.clone()
    }
}

impl Identifier for ResourceId {
    fn resolve(&self, _matcher: &UriMatcher) -> Option<ResourceId> {
        Some(*self)
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

/// Query result tagged with the identifier it was produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCursor {
    notification_id: ResourceId,
    rows: Vec<RecordRow>,
}

impl RecordCursor {
    /// Identifier to watch for changes affecting this result.
    pub fn notification_id(&self) -> ResourceId {
        self.notification_id
    }

    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RecordRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decodes every row; requires a full projection.
    pub fn records(&self) -> Result<Vec<Record>, RecordDataError> {
        self.rows.iter().map(RecordRow::to_record).collect()
    }
}

/// CRUD router over one `RecordStore`.
pub struct RecordProvider {
    store: RecordStore,
    matcher: UriMatcher,
    notifier: ChangeNotifier,
}

impl RecordProvider {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            matcher: UriMatcher::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Mutable store access, e.g. for `RecordStore::upgrade`.
    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    /// Classifies `identifier` without touching the store.
    pub fn resolve(&self, identifier: &(impl Identifier + ?Sized)) -> ProviderResult<ResourceId> {
        identifier.resolve(&self.matcher).ok_or_else(|| {
            let raw = identifier.raw();
            warn!("event=identifier_resolve module=provider status=rejected error_code=unsupported_identifier");
            ProviderError::UnsupportedIdentifier(raw)
        })
    }

    /// Returns the rows at `identifier`.
    ///
    /// For an item identifier the caller `selection` is replaced by
    /// `id = <item id>`. An empty result is not an error.
    pub fn query(
        &self,
        identifier: &(impl Identifier + ?Sized),
        projection: &Projection,
        selection: &Selection,
        sort: &SortOrder,
    ) -> ProviderResult<RecordCursor> {
        let target = self.resolve(identifier)?;
        let selection = effective_selection(target, selection);

        let rows = {
            let handle = self.store.open_for_read()?;
            handle
                .query_rows(projection, &selection, sort)
                .map_err(|err| persistence_failure("record_query", err))?
        };

        debug!(
            "event=record_query module=provider status=ok target={} rows={}",
            target,
            rows.len()
        );
        Ok(RecordCursor {
            notification_id: target,
            rows,
        })
    }

    /// Inserts one record into the collection and returns its item id.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for item identifiers.
    /// - `InvalidField` for the first payload field breaking a rule.
    /// - `Persistence` when the store refuses the row.
    pub fn insert(
        &self,
        identifier: &(impl Identifier + ?Sized),
        values: &RecordValues,
    ) -> ProviderResult<ResourceId> {
        let target = self.resolve(identifier)?;
        if target != ResourceId::Collection {
            return Err(unsupported_operation("insert", target));
        }
        validate_insert(values).map_err(|column| invalid_field("record_insert", column))?;

        let new_id = {
            let handle = self.store.open_for_write()?;
            handle
                .insert_row(values)
                .map_err(|err| persistence_failure("record_insert", err))?
        };

        debug!("event=record_insert module=provider status=ok id={new_id}");
        self.notifier.notify_change(ResourceId::Collection);
        Ok(ResourceId::Item(new_id))
    }

    /// Applies a partial update and returns the number of rows changed.
    ///
    /// An empty payload returns 0 without store access or notification.
    pub fn update(
        &self,
        identifier: &(impl Identifier + ?Sized),
        values: &RecordValues,
        selection: &Selection,
    ) -> ProviderResult<usize> {
        let target = self.resolve(identifier)?;
        if values.is_empty() {
            return Ok(0);
        }
        validate_update(values).map_err(|column| invalid_field("record_update", column))?;
        let selection = effective_selection(target, selection);

        let changed = {
            let handle = self.store.open_for_write()?;
            handle
                .update_rows(values, &selection)
                .map_err(|err| persistence_failure("record_update", err))?
        };

        debug!("event=record_update module=provider status=ok target={target} rows={changed}");
        if changed > 0 {
            self.notifier.notify_change(target);
        }
        Ok(changed)
    }

    /// Deletes the rows at `identifier` and returns how many were removed.
    pub fn delete(
        &self,
        identifier: &(impl Identifier + ?Sized),
        selection: &Selection,
    ) -> ProviderResult<usize> {
        let target = self.resolve(identifier)?;
        let selection = effective_selection(target, selection);

        let deleted = {
            let handle = self.store.open_for_write()?;
            handle
                .delete_rows(&selection)
                .map_err(|err| persistence_failure("record_delete", err))?
        };

        debug!("event=record_delete module=provider status=ok target={target} rows={deleted}");
        if deleted > 0 {
            self.notifier.notify_change(target);
        }
        Ok(deleted)
    }

    /// Returns the list or item type token for `identifier`.
    pub fn type_of(&self, identifier: &(impl Identifier + ?Sized)) -> ProviderResult<&'static str> {
        Ok(match self.resolve(identifier)? {
            ResourceId::Collection => CONTENT_LIST_TYPE,
            ResourceId::Item(_) => CONTENT_ITEM_TYPE,
        })
    }

    /// Registers `observer` for changes at `identifier`.
    pub fn subscribe(
        &self,
        identifier: &(impl Identifier + ?Sized),
        descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> ProviderResult<SubscriptionHandle> {
        let target = self.resolve(identifier)?;
        Ok(self.notifier.subscribe(target, descendants, observer))
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.notifier.unsubscribe(handle)
    }
}

fn effective_selection(target: ResourceId, selection: &Selection) -> Selection {
    match target {
        ResourceId::Collection => selection.clone(),
        ResourceId::Item(id) => {
            if !selection.is_empty() {
                debug!("event=selection_override module=provider status=ok target={target}");
            }
            Selection::by_id(id)
        }
    }
}

fn unsupported_operation(operation: &'static str, identifier: ResourceId) -> ProviderError {
    warn!(
        "event=record_{} module=provider status=rejected error_code=unsupported_operation target={}",
        operation, identifier
    );
    ProviderError::UnsupportedOperation {
        operation,
        identifier,
    }
}

fn invalid_field(event: &str, column: Column) -> ProviderError {
    warn!("event={event} module=provider status=rejected error_code=invalid_field field={column}");
    ProviderError::InvalidField(column)
}

fn persistence_failure(event: &str, err: DbError) -> ProviderError {
    error!("event={event} module=provider status=error error_code=persistence_failed error={err}");
    ProviderError::Persistence(err)
}

#[cfg(test)]
mod tests {
    use super::{effective_selection, Identifier, ProviderError, RecordProvider};
    use crate::db::{RecordStore, Selection};
    use crate::model::record::Column;
    use crate::provider::uri::{ResourceId, UriMatcher};

    #[test]
    fn item_selection_replaces_caller_selection() {
        let caller = Selection::all().and_eq(Column::Name, "x");
        assert_eq!(
            effective_selection(ResourceId::Item(4), &caller),
            Selection::by_id(4)
        );
        assert_eq!(effective_selection(ResourceId::Collection, &caller), caller);
    }

    #[test]
    fn identifiers_resolve_from_text_and_variants() {
        let matcher = UriMatcher::new();
        assert_eq!("records/2".resolve(&matcher), Some(ResourceId::Item(2)));
        assert_eq!(
            String::from("records").resolve(&matcher),
            Some(ResourceId::Collection)
        );
        assert_eq!(
            ResourceId::Item(8).resolve(&matcher),
            Some(ResourceId::Item(8))
        );
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = ProviderError::InvalidField(Column::Measure);
        assert_eq!(err.to_string(), "invalid value for field `measure`");

        let err = ProviderError::UnsupportedOperation {
            operation: "insert",
            identifier: ResourceId::Item(3),
        };
        assert_eq!(err.to_string(), "insert is not supported for `records/3`");
    }

    #[test]
    fn resolve_keeps_raw_text_of_rejected_identifier() {
        let provider = RecordProvider::new(RecordStore::open_in_memory().unwrap());
        match provider.resolve("records/abc") {
            Err(ProviderError::UnsupportedIdentifier(raw)) => assert_eq!(raw, "records/abc"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
