/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Observed cluster resources, label filters and change batches.

use crate::transport::WireMessage;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A cluster resource as observed from the backing watch source.
///
/// Owned by the resource database and mutated only by watch-event
/// application; subscribers only ever see clones.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, String>,
    pub payload: Value,
}

impl ResourceRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeMap::new(),
            attributes: BTreeMap::new(),
            payload: Value::Null,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Exact-match label selector: every listed key must be present with the
/// listed value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn from_map(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type RecordPredicate = Arc<dyn Fn(&ResourceRecord) -> bool + Send + Sync>;

/// Subscription filter: a label selector plus an optional record predicate.
/// Immutable for the life of its subscription.
#[derive(Clone)]
pub struct Filter {
    selector: LabelSelector,
    predicate: Option<RecordPredicate>,
}

impl Filter {
    pub fn labels(selector: LabelSelector) -> Self {
        Self {
            selector,
            predicate: None,
        }
    }

    pub fn with_predicate<P>(selector: LabelSelector, predicate: P) -> Self
    where
        P: Fn(&ResourceRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            selector,
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.selector.matches(&record.labels)
            && self
                .predicate
                .as_ref()
                .map(|predicate| predicate(record))
                .unwrap_or(true)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("selector", &self.selector)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// One batch of changes reported by the watch source.
#[derive(Clone, Debug, Default)]
pub struct ResourceChangeSet {
    pub added: Vec<ResourceRecord>,
    pub updated: Vec<ResourceRecord>,
    pub removed: Vec<String>,
}

impl ResourceChangeSet {
    pub fn added(records: Vec<ResourceRecord>) -> Self {
        Self {
            added: records,
            ..Default::default()
        }
    }

    pub fn removed(names: Vec<String>) -> Self {
        Self {
            removed: names,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Turns a matching record set into one wire message.
///
/// The body layout is the encoder's concern; the engine only promises to
/// call it with the records sorted by name.
pub trait SnapshotEncoder: Send + Sync {
    fn encode(&self, records: &[&ResourceRecord]) -> WireMessage;
}
