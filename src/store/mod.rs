//! Ordered snapshot of the watched dataset.
//!
//! Keys are the hierarchical paths carried by `Set`/`Delete` operations.
//! Ascending key order places every endpoint right after its service, which
//! is what the grouper relies on.


use std::collections::BTreeMap;

use prost::Message;
use tracing::trace;

use crate::proto::Endpoint;
use crate::proto::Service;
use crate::proto::Set;
use crate::DecodeError;

/// Decoded payload of a `Set` operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Service(Service),
    Endpoint(Endpoint),
}

impl StoreValue {
    /// Decodes `bytes` as the payload kind named by `set`.
    ///
    /// Returns `Ok(None)` for kinds this client does not track; those are
    /// skipped without looking at the payload.
    pub fn decode(
        set: i32,
        path: &str,
        bytes: &[u8],
    ) -> std::result::Result<Option<Self>, DecodeError> {
        let decoded = match Set::try_from(set) {
            Ok(Set::ServicesSet) => Service::decode(bytes)
                .map(StoreValue::Service)
                .map_err(|source| DecodeError {
                    kind: "service",
                    path: path.to_string(),
                    source,
                })?,
            Ok(Set::EndpointsSet) => Endpoint::decode(bytes)
                .map(StoreValue::Endpoint)
                .map_err(|source| DecodeError {
                    kind: "endpoint",
                    path: path.to_string(),
                    source,
                })?,
            Ok(Set::GlobalEndpointInfos) | Err(_) => {
                trace!("ignoring set {} at {:?}", set, path);
                return Ok(None);
            }
        };

        Ok(Some(decoded))
    }
}

/// Sorted map from path to decoded value.
///
/// Not synchronized: only the protocol loop mutates it. Handing a finished
/// round to the grouper is done by sharing it behind an `Arc`, and the next
/// round's first mutation copies it if the grouper still holds it.
#[derive(Debug, Clone, Default)]
pub struct OrderedStore {
    entries: BTreeMap<String, StoreValue>,
}

impl OrderedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace-or-insert
    pub fn upsert(
        &mut self,
        path: String,
        value: StoreValue,
    ) {
        self.entries.insert(path, value);
    }

    /// Remove-if-present, returns whether an entry was removed
    pub fn delete(
        &mut self,
        path: &str,
    ) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Visits every entry in ascending path order until `visit` returns
    /// false.
    pub fn ascend<F>(
        &self,
        mut visit: F,
    ) where
        F: FnMut(&str, &StoreValue) -> bool,
    {
        for (path, value) in self.iter() {
            if !visit(path, value) {
                break;
            }
        }
    }

    /// Entries in ascending path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreValue)> {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn get(
        &self,
        path: &str,
    ) -> Option<&StoreValue> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
