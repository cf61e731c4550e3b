use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::{HistoryIter, KeyModification, KeyValue, QueryIter, TransactionContext};

/// In-memory ledger standing in for the host state database.
///
/// Intended for unit tests, demos and embedding. Keeps current state plus
/// the full version history of every key, and evaluates rich-query
/// selectors by field equality over stored JSON objects, in key order so
/// results are deterministic. The `RwLock` only makes the double safe to
/// share across test threads; it adds no ordering semantics of its own, and
/// every call takes effect immediately, mirroring the atomic-per-call
/// contract of the real host.
pub struct MemoryLedger {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    state: BTreeMap<String, String>,
    history: BTreeMap<String, Vec<KeyModification>>,
    pinned_time: Option<DateTime<Utc>>,
}

impl Tables {
    fn tx_time(&self) -> DateTime<Utc> {
        self.pinned_time.unwrap_or_else(Utc::now)
    }
}

/// Serializable image of a [`MemoryLedger`]'s tables.
///
/// Lets embedders (the demo CLI) carry ledger contents across process runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub state: BTreeMap<String, String>,
    pub history: BTreeMap<String, Vec<KeyModification>>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables::default()),
        }
    }

    /// Pin the transaction timestamp observed by subsequent calls.
    ///
    /// Unpinned, [`tx_timestamp`](TransactionContext::tx_timestamp) and the
    /// version stamps follow the wall clock. Tests pin a time per
    /// transaction to make history output literal.
    pub fn set_tx_timestamp(&self, time: DateTime<Utc>) {
        self.inner.write().expect("lock poisoned").pinned_time = Some(time);
    }

    /// Number of keys currently present in state.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").state.len()
    }

    /// Returns `true` if no key currently holds state.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").state.is_empty()
    }

    /// Remove all state and history.
    pub fn clear(&self) {
        let mut tables = self.inner.write().expect("lock poisoned");
        tables.state.clear();
        tables.history.clear();
    }

    /// Keys currently present in state, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .expect("lock poisoned")
            .state
            .keys()
            .cloned()
            .collect()
    }

    /// Copy the current tables out for persistence.
    pub fn to_snapshot(&self) -> LedgerSnapshot {
        let tables = self.inner.read().expect("lock poisoned");
        LedgerSnapshot {
            state: tables.state.clone(),
            history: tables.history.clone(),
        }
    }

    /// Rebuild a ledger from persisted tables. The timestamp pin is not
    /// part of a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            inner: RwLock::new(Tables {
                state: snapshot.state,
                history: snapshot.history,
                pinned_time: None,
            }),
        }
    }

    fn tables(&self) -> Result<RwLockReadGuard<'_, Tables>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Backend("ledger lock poisoned".into()))
    }

    fn tables_mut(&self) -> Result<RwLockWriteGuard<'_, Tables>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Backend("ledger lock poisoned".into()))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionContext for MemoryLedger {
    fn put_state(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let mut tables = self.tables_mut()?;
        let timestamp = tables.tx_time();
        tables.state.insert(key.to_string(), value.to_string());
        tables
            .history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                value: value.to_string(),
                timestamp,
                is_delete: false,
            });
        debug!(key, bytes = value.len(), "put state");
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.tables()?.state.get(key).cloned())
    }

    fn delete_state(&self, key: &str) -> Result<(), LedgerError> {
        let mut tables = self.tables_mut()?;
        let timestamp = tables.tx_time();
        // Idempotent: deleting an absent key succeeds and leaves no marker.
        if tables.state.remove(key).is_some() {
            tables
                .history
                .entry(key.to_string())
                .or_default()
                .push(KeyModification {
                    value: String::new(),
                    timestamp,
                    is_delete: true,
                });
            debug!(key, "deleted state");
        }
        Ok(())
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryIter, LedgerError> {
        let versions = self
            .tables()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(versions.into_iter().map(Ok)))
    }

    fn query_result(&self, selector: &str) -> Result<QueryIter, LedgerError> {
        let equalities = parse_selector(selector)?;
        let tables = self.tables()?;
        let hits: Vec<KeyValue> = tables
            .state
            .iter()
            .filter(|(_, stored)| selector_matches(&equalities, stored))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        debug!(count = hits.len(), "rich query evaluated");
        Ok(Box::new(hits.into_iter().map(Ok)))
    }

    fn tx_timestamp(&self) -> Result<DateTime<Utc>, LedgerError> {
        Ok(self.tables()?.tx_time())
    }
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.inner.read().expect("lock poisoned");
        f.debug_struct("MemoryLedger")
            .field("key_count", &tables.state.len())
            .field("tracked_histories", &tables.history.len())
            .finish()
    }
}

/// Extract the equality map from a CouchDB-style selector document,
/// `{"selector": {field: value, ...}}`. Other top-level fields (limit,
/// sort) are accepted and ignored.
fn parse_selector(selector: &str) -> Result<serde_json::Map<String, Value>, LedgerError> {
    let root: Value =
        serde_json::from_str(selector).map_err(|e| LedgerError::InvalidSelector(e.to_string()))?;
    let Some(document) = root.as_object() else {
        return Err(LedgerError::InvalidSelector(
            "selector document must be a JSON object".into(),
        ));
    };
    match document.get("selector").and_then(Value::as_object) {
        Some(equalities) => Ok(equalities.clone()),
        None => Err(LedgerError::InvalidSelector(
            "missing top-level \"selector\" object".into(),
        )),
    }
}

/// A stored value matches when it parses as a JSON object and every
/// selector field equals the stored field. Values that are not JSON
/// objects can never match.
fn selector_matches(equalities: &serde_json::Map<String, Value>, stored: &str) -> bool {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(stored) else {
        return false;
    };
    equalities
        .iter()
        .all(|(field, want)| fields.get(field) == Some(want))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // State CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_then_get_returns_value() {
        let ledger = MemoryLedger::new();
        ledger.put_state("k1", r#"{"type":"pub","topic":"news"}"#).unwrap();
        assert_eq!(
            ledger.get_state("k1").unwrap().as_deref(),
            Some(r#"{"type":"pub","topic":"news"}"#)
        );
    }

    #[test]
    fn get_missing_key_is_none() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.get_state("ghost").unwrap(), None);
    }

    #[test]
    fn put_overwrites_in_place() {
        let ledger = MemoryLedger::new();
        ledger.put_state("k1", "first").unwrap();
        ledger.put_state("k1", "second").unwrap();
        assert_eq!(ledger.get_state("k1").unwrap().as_deref(), Some("second"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn delete_removes_key() {
        let ledger = MemoryLedger::new();
        ledger.put_state("k1", "value").unwrap();
        ledger.delete_state("k1").unwrap();
        assert_eq!(ledger.get_state("k1").unwrap(), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let ledger = MemoryLedger::new();
        ledger.put_state("k1", "value").unwrap();
        ledger.delete_state("k1").unwrap();
        ledger.delete_state("k1").unwrap();
        ledger.delete_state("never-written").unwrap();
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    #[test]
    fn history_yields_versions_in_write_order() {
        let ledger = MemoryLedger::new();
        ledger.set_tx_timestamp(time(100));
        ledger.put_state("k1", "v1").unwrap();
        ledger.set_tx_timestamp(time(200));
        ledger.put_state("k1", "v2").unwrap();

        let versions: Vec<_> = ledger
            .history_for_key("k1")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].value, "v1");
        assert_eq!(versions[0].timestamp, time(100));
        assert_eq!(versions[1].value, "v2");
        assert_eq!(versions[1].timestamp, time(200));
        assert!(!versions[0].is_delete);
    }

    #[test]
    fn history_survives_delete_and_records_marker() {
        let ledger = MemoryLedger::new();
        ledger.set_tx_timestamp(time(10));
        ledger.put_state("k1", "v1").unwrap();
        ledger.set_tx_timestamp(time(20));
        ledger.delete_state("k1").unwrap();

        let versions: Vec<_> = ledger
            .history_for_key("k1")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].value, "v1");
        assert!(versions[1].is_delete);
        assert_eq!(versions[1].value, "");
        assert_eq!(versions[1].timestamp, time(20));
    }

    #[test]
    fn history_of_unknown_key_is_empty() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.history_for_key("ghost").unwrap().count(), 0);
    }

    // -----------------------------------------------------------------------
    // Rich query
    // -----------------------------------------------------------------------

    #[test]
    fn query_matches_field_equality_in_key_order() {
        let ledger = MemoryLedger::new();
        ledger.put_state("b", r#"{"topic":"news","role":"sub"}"#).unwrap();
        ledger.put_state("a", r#"{"topic":"news","role":"pub"}"#).unwrap();
        ledger.put_state("c", r#"{"topic":"sports","role":"pub"}"#).unwrap();

        let hits: Vec<_> = ledger
            .query_result(r#"{"selector":{"topic":"news"}}"#)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].key, "a");
        assert_eq!(hits[1].key, "b");
    }

    #[test]
    fn query_requires_every_selector_field_to_match() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", r#"{"topic":"news","role":"pub"}"#).unwrap();
        ledger.put_state("b", r#"{"topic":"news","role":"sub"}"#).unwrap();

        let hits: Vec<_> = ledger
            .query_result(r#"{"selector":{"topic":"news","role":"sub"}}"#)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "b");
    }

    #[test]
    fn query_skips_values_that_are_not_json_objects() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", "not json at all").unwrap();
        ledger.put_state("b", r#""a bare string""#).unwrap();
        ledger.put_state("c", r#"{"topic":"news"}"#).unwrap();

        let hits: Vec<_> = ledger
            .query_result(r#"{"selector":{"topic":"news"}}"#)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "c");
    }

    #[test]
    fn query_with_no_matches_is_empty() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", r#"{"topic":"news"}"#).unwrap();
        assert_eq!(
            ledger
                .query_result(r#"{"selector":{"topic":"weather"}}"#)
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        let ledger = MemoryLedger::new();

        assert!(matches!(
            ledger.query_result("not json"),
            Err(LedgerError::InvalidSelector(_))
        ));
        assert!(matches!(
            ledger.query_result(r#"["array"]"#),
            Err(LedgerError::InvalidSelector(_))
        ));
        assert!(matches!(
            ledger.query_result(r#"{"topic":"news"}"#),
            Err(LedgerError::InvalidSelector(_))
        ));
    }

    #[test]
    fn selector_extra_top_level_fields_are_ignored() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", r#"{"topic":"news"}"#).unwrap();
        let hits = ledger
            .query_result(r#"{"selector":{"topic":"news"},"limit":10}"#)
            .unwrap()
            .count();
        assert_eq!(hits, 1);
    }

    // -----------------------------------------------------------------------
    // Transaction timestamp
    // -----------------------------------------------------------------------

    #[test]
    fn pinned_timestamp_is_observed() {
        let ledger = MemoryLedger::new();
        ledger.set_tx_timestamp(time(1_700_000_000));
        assert_eq!(ledger.tx_timestamp().unwrap(), time(1_700_000_000));
    }

    #[test]
    fn unpinned_timestamp_tracks_the_clock() {
        let ledger = MemoryLedger::new();
        // After 2020-01-01.
        assert!(ledger.tx_timestamp().unwrap() > time(1_577_836_800));
    }

    // -----------------------------------------------------------------------
    // Utilities and snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn len_is_empty_and_keys() {
        let ledger = MemoryLedger::new();
        assert!(ledger.is_empty());
        ledger.put_state("b", "2").unwrap();
        ledger.put_state("a", "1").unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn clear_removes_state_and_history() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", "1").unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.history_for_key("a").unwrap().count(), 0);
    }

    #[test]
    fn snapshot_round_trips_state_and_history() {
        let ledger = MemoryLedger::new();
        ledger.set_tx_timestamp(time(42));
        ledger.put_state("k1", "v1").unwrap();
        ledger.put_state("k1", "v2").unwrap();
        ledger.delete_state("k1").unwrap();

        let json = serde_json::to_string(&ledger.to_snapshot()).unwrap();
        let restored: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let revived = MemoryLedger::from_snapshot(restored);

        assert_eq!(revived.get_state("k1").unwrap(), None);
        let versions: Vec<_> = revived
            .history_for_key("k1")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(versions.len(), 3);
        assert!(versions[2].is_delete);
        assert_eq!(versions[0].timestamp, time(42));
    }

    #[test]
    fn debug_format_reports_counts() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", "1").unwrap();
        let rendered = format!("{ledger:?}");
        assert!(rendered.contains("MemoryLedger"));
        assert!(rendered.contains("key_count"));
    }
}
