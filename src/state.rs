//! # Entity State
//!
//! The in-memory state of one federation entity: its identity and signing
//! key, its declared superiors, its registered subordinates, and the Trust
//! Marks it has issued and received.
//!
//! One process hosts one entity. Rather than process-wide singletons, the
//! state is carried by an explicit [`EntityContext`] value threaded through
//! every handler. All state lives behind a single lock held only for O(1)
//! critical sections, so writes are linearizable and readers receive
//! snapshots that later mutations cannot disturb.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jose::{Jwks, KeyManager};

/// A subordinate registered with this entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SubordinateRecord {
    /// Entity identifier of the subordinate.
    pub entity_id: String,

    /// The subordinate's public key set, as provided at registration.
    pub jwks: Jwks,

    /// Declarative metadata to include in Subordinate Statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// The superiors the subordinate declares. Always contains the
    /// registering entity's identifier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,

    /// Registration time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

/// A Trust Mark held by this entity, either minted by it or issued to it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TrustMarkRecord {
    /// The Trust Mark type identifier (a namespace URL).
    pub id: String,

    /// Entity identifier of the issuer.
    pub issuer: String,

    /// Entity identifier the mark is about.
    pub subject: String,

    /// Issued-at time, seconds since the Unix epoch.
    pub issued_at: i64,

    /// Expiry time, if the mark expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    /// The authoritative serialized form: the signed compact JWT.
    pub signed_jwt: String,
}

#[derive(Debug, Default)]
struct StateInner {
    authority_hints: Vec<String>,
    subordinates: HashMap<String, SubordinateRecord>,
    issued_trust_marks: Vec<TrustMarkRecord>,
    received_trust_marks: Vec<TrustMarkRecord>,
    metadata: Map<String, Value>,
}

/// Thread-safe mutable state of a federation entity.
///
/// Accessors return owned snapshots; mutators are serialized so that
/// read-modify-write operations on the subordinate map and Trust Mark
/// sequences are atomic from the caller's viewpoint.
#[derive(Debug, Default)]
pub struct EntityState {
    inner: RwLock<StateInner>,
}

impl EntityState {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The entity's declared superiors, in declaration order.
    #[must_use]
    pub fn authority_hints(&self) -> Vec<String> {
        self.read().authority_hints.clone()
    }

    /// Append a superior unless already declared.
    pub fn add_authority_hint(&self, url: impl Into<String>) {
        let url = url.into();
        let mut state = self.write();
        if !state.authority_hints.contains(&url) {
            state.authority_hints.push(url);
        }
    }

    /// Replace the declared superiors.
    pub fn set_authority_hints(&self, hints: Vec<String>) {
        self.write().authority_hints = hints;
    }

    /// Insert or replace a subordinate record, keyed by its entity
    /// identifier. Returns `true` when an existing record was replaced.
    pub fn add_subordinate(&self, record: SubordinateRecord) -> bool {
        tracing::debug!("registering subordinate {}", record.entity_id);
        self.write().subordinates.insert(record.entity_id.clone(), record).is_some()
    }

    /// Replace an existing subordinate record. Returns `false`, leaving the
    /// map untouched, when no record with that entity identifier exists.
    pub fn replace_subordinate(&self, record: SubordinateRecord) -> bool {
        let mut state = self.write();
        match state.subordinates.entry(record.entity_id.clone()) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                entry.insert(record);
                true
            }
            std::collections::hash_map::Entry::Vacant(_) => false,
        }
    }

    /// Remove a subordinate. Returns `true` when a record was removed.
    pub fn remove_subordinate(&self, entity_id: &str) -> bool {
        self.write().subordinates.remove(entity_id).is_some()
    }

    /// The record for the named subordinate, if registered.
    #[must_use]
    pub fn subordinate(&self, entity_id: &str) -> Option<SubordinateRecord> {
        self.read().subordinates.get(entity_id).cloned()
    }

    /// A snapshot of all subordinate records, ordered by entity identifier.
    #[must_use]
    pub fn subordinates(&self) -> Vec<SubordinateRecord> {
        let mut records: Vec<_> = self.read().subordinates.values().cloned().collect();
        records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        records
    }

    /// The entity identifiers of all registered subordinates, ordered.
    #[must_use]
    pub fn subordinate_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.read().subordinates.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Record a Trust Mark minted by this entity.
    pub fn add_issued_trust_mark(&self, record: TrustMarkRecord) {
        self.write().issued_trust_marks.push(record);
    }

    /// Remove all issued Trust Marks with the given type identifier.
    /// Returns `true` when at least one record was removed.
    pub fn remove_issued_trust_mark(&self, trust_mark_id: &str) -> bool {
        let mut state = self.write();
        let before = state.issued_trust_marks.len();
        state.issued_trust_marks.retain(|record| record.id != trust_mark_id);
        state.issued_trust_marks.len() < before
    }

    /// The first issued Trust Mark with the given type identifier.
    #[must_use]
    pub fn issued_trust_mark(&self, trust_mark_id: &str) -> Option<TrustMarkRecord> {
        self.read().issued_trust_marks.iter().find(|r| r.id == trust_mark_id).cloned()
    }

    /// A snapshot of all issued Trust Marks, in issuance order.
    #[must_use]
    pub fn issued_trust_marks(&self) -> Vec<TrustMarkRecord> {
        self.read().issued_trust_marks.clone()
    }

    /// Record a Trust Mark issued to this entity.
    pub fn add_received_trust_mark(&self, record: TrustMarkRecord) {
        self.write().received_trust_marks.push(record);
    }

    /// A snapshot of all received Trust Marks, in arrival order.
    #[must_use]
    pub fn received_trust_marks(&self) -> Vec<TrustMarkRecord> {
        self.read().received_trust_marks.clone()
    }

    /// The entity's declared metadata.
    #[must_use]
    pub fn metadata(&self) -> Map<String, Value> {
        self.read().metadata.clone()
    }

    /// Replace the entity's declared metadata.
    pub fn set_metadata(&self, metadata: Map<String, Value>) {
        self.write().metadata = metadata;
    }
}

/// The context of one federation entity: identity, signing key, and mutable
/// state. One process hosts exactly one context, created at startup and
/// threaded through every handler.
#[derive(Debug)]
pub struct EntityContext {
    entity_id: String,
    keys: KeyManager,
    state: EntityState,
}

impl EntityContext {
    /// Create the context for an entity with the given identifier and signing
    /// key.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, keys: KeyManager) -> Self {
        Self {
            entity_id: entity_id.into(),
            keys,
            state: EntityState::default(),
        }
    }

    /// The entity identifier (an absolute URL), immutable for the life of the
    /// process.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The entity's signing key custody.
    #[must_use]
    pub const fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// The entity's mutable state.
    #[must_use]
    pub const fn state(&self) -> &EntityState {
        &self.state
    }

    /// The URL subordinates' statements are fetched from.
    #[must_use]
    pub fn fetch_endpoint(&self) -> String {
        format!("{}/fetch", self.entity_id)
    }

    /// The URL the subordinate listing is served from.
    #[must_use]
    pub fn list_endpoint(&self) -> String {
        format!("{}/list", self.entity_id)
    }
}
