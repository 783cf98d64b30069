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

//! Per-address resource database with filtered push subscriptions.

use crate::observability::events;
use crate::resources::record::{Filter, ResourceChangeSet, ResourceRecord, SnapshotEncoder};
use crate::transport::{ConnectionId, LinkId, SenderHandle};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "resource_database";

/// Handle for one registered subscription.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SubscriptionState {
    filter: Filter,
    sender: SenderHandle,
    encoder: Arc<dyn SnapshotEncoder>,
    last_sent: Vec<ResourceRecord>,
}

struct DatabaseState {
    populated: bool,
    records: BTreeMap<String, ResourceRecord>,
    subscriptions: HashMap<SubscriptionId, SubscriptionState>,
}

/// Current filtered view of one logical resource-type address.
///
/// The database outlives individual subscriptions: it starts empty, becomes
/// populated on the first applied watch batch and stays populated.
pub struct ResourceDatabase {
    address: String,
    state: Mutex<DatabaseState>,
}

impl ResourceDatabase {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            state: Mutex::new(DatabaseState {
                populated: false,
                records: BTreeMap::new(),
                subscriptions: HashMap::new(),
            }),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Registers a subscription and immediately pushes the current matching
    /// subset — an empty set included — so a new subscriber is never left
    /// without a first snapshot.
    ///
    /// When the initial push already fails the link is treated as closed and
    /// the subscription is not registered; the returned handle is then inert
    /// and safe to pass to [`unsubscribe`](Self::unsubscribe).
    pub async fn subscribe(
        &self,
        filter: Filter,
        sender: SenderHandle,
        encoder: Arc<dyn SnapshotEncoder>,
    ) -> SubscriptionId {
        let id = SubscriptionId::mint();
        let mut state = self.state.lock().await;

        let snapshot = Self::matching(&state.records, &filter);
        let message = encoder.encode(&snapshot.iter().collect::<Vec<_>>());
        if sender.send(message).await.is_err() {
            warn!(
                event = events::SNAPSHOT_PUSH_FAILED,
                component = COMPONENT,
                address = %self.address,
                subscription_id = %id,
                reason = "initial_push",
                "sender broken at subscribe time; subscription not registered"
            );
            return id;
        }

        debug!(
            event = events::SUBSCRIBE_OK,
            component = COMPONENT,
            address = %self.address,
            subscription_id = %id,
            matched = snapshot.len(),
            "registered subscription with initial snapshot"
        );

        state.subscriptions.insert(
            id,
            SubscriptionState {
                filter,
                sender,
                encoder,
                last_sent: snapshot,
            },
        );
        id
    }

    /// Removes one subscription. Idempotent; removing has no failure mode.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.lock().await;
        if state.subscriptions.remove(&id).is_some() {
            debug!(
                event = events::SUBSCRIPTION_REMOVED,
                component = COMPONENT,
                address = %self.address,
                subscription_id = %id,
                reason = "unsubscribe",
                "removed subscription"
            );
        }
    }

    /// Removes every subscription owned by a connection; part of connection
    /// teardown. Returns how many were dropped.
    pub async fn remove_connection(&self, connection: ConnectionId) -> usize {
        let mut state = self.state.lock().await;
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|_, subscription| subscription.sender.connection_id() != connection);
        before - state.subscriptions.len()
    }

    /// Removes the subscription bound to one sender link, if any.
    pub async fn remove_link(&self, connection: ConnectionId, link: LinkId) {
        let mut state = self.state.lock().await;
        state.subscriptions.retain(|_, subscription| {
            subscription.sender.connection_id() != connection
                || subscription.sender.link_id() != link
        });
    }

    /// Applies one watch batch, then re-evaluates every live subscription:
    /// a subscription is pushed to exactly when its matching subset changed
    /// by value. A broken sender drops its subscription, nothing else.
    pub async fn apply_change(&self, change: ResourceChangeSet) {
        if change.is_empty() {
            return;
        }

        let mut state = self.state.lock().await;
        state.populated = true;
        for record in change.added.into_iter().chain(change.updated) {
            state.records.insert(record.name.clone(), record);
        }
        for name in &change.removed {
            state.records.remove(name);
        }

        debug!(
            event = events::WATCH_BATCH_APPLIED,
            component = COMPONENT,
            address = %self.address,
            records = state.records.len(),
            subscriptions = state.subscriptions.len(),
            "applied watch batch"
        );

        let DatabaseState {
            records,
            subscriptions,
            ..
        } = &mut *state;

        let mut broken: Vec<SubscriptionId> = Vec::new();
        for (id, subscription) in subscriptions.iter_mut() {
            let subset = Self::matching(records, &subscription.filter);
            if subset == subscription.last_sent {
                continue;
            }

            let message = subscription
                .encoder
                .encode(&subset.iter().collect::<Vec<_>>());
            match subscription.sender.send(message).await {
                Ok(()) => {
                    debug!(
                        event = events::SNAPSHOT_PUSH_OK,
                        component = COMPONENT,
                        address = %self.address,
                        subscription_id = %id,
                        matched = subset.len(),
                        "pushed changed snapshot"
                    );
                    subscription.last_sent = subset;
                }
                Err(_) => {
                    warn!(
                        event = events::SNAPSHOT_PUSH_FAILED,
                        component = COMPONENT,
                        address = %self.address,
                        subscription_id = %id,
                        reason = "link_broken",
                        "push failed; dropping subscription"
                    );
                    broken.push(*id);
                }
            }
        }

        for id in broken {
            subscriptions.remove(&id);
            info!(
                event = events::SUBSCRIPTION_REMOVED,
                component = COMPONENT,
                address = %self.address,
                subscription_id = %id,
                reason = "link_broken",
                "removed subscription after failed push"
            );
        }
    }

    pub async fn is_populated(&self) -> bool {
        self.state.lock().await.populated
    }

    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }

    fn matching(
        records: &BTreeMap<String, ResourceRecord>,
        filter: &Filter,
    ) -> Vec<ResourceRecord> {
        records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }
}

/// The requested address has no backing database.
#[derive(Debug)]
pub struct UnknownAddress(pub String);

impl Display for UnknownAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "no resource database backs address '{}'", self.0)
    }
}

impl Error for UnknownAddress {}

/// Static mapping from logical address to resource database, resolved once
/// at startup.
pub struct DatabaseMap {
    databases: HashMap<String, Arc<ResourceDatabase>>,
}

impl DatabaseMap {
    pub fn new<I>(databases: I) -> Self
    where
        I: IntoIterator<Item = Arc<ResourceDatabase>>,
    {
        Self {
            databases: databases
                .into_iter()
                .map(|database| (database.address().to_string(), database))
                .collect(),
        }
    }

    pub fn database(&self, address: &str) -> Option<Arc<ResourceDatabase>> {
        self.databases.get(address).cloned()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    pub async fn subscribe(
        &self,
        address: &str,
        filter: Filter,
        sender: SenderHandle,
        encoder: Arc<dyn SnapshotEncoder>,
    ) -> Result<SubscriptionId, UnknownAddress> {
        let Some(database) = self.database(address) else {
            return Err(UnknownAddress(address.to_string()));
        };
        Ok(database.subscribe(filter, sender, encoder).await)
    }

    /// Cascades connection teardown into every database.
    pub async fn remove_connection(&self, connection: ConnectionId) {
        for database in self.databases.values() {
            database.remove_connection(connection).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DatabaseMap, ResourceDatabase};
    use crate::resources::record::{
        Filter, LabelSelector, ResourceChangeSet, ResourceRecord, SnapshotEncoder,
    };
    use crate::transport::{
        ActionSender, ConnectionId, DriverAction, LinkId, SenderHandle, WireMessage,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct NameListEncoder;

    impl SnapshotEncoder for NameListEncoder {
        fn encode(&self, records: &[&ResourceRecord]) -> WireMessage {
            let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
            WireMessage {
                body: names.join(",").into_bytes(),
                ..Default::default()
            }
        }
    }

    fn selector(pairs: &[(&str, &str)]) -> LabelSelector {
        LabelSelector::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn subscriber(
        connection: ConnectionId,
        link: u64,
    ) -> (SenderHandle, mpsc::Receiver<DriverAction>) {
        let (tx, rx) = mpsc::channel(16);
        (
            SenderHandle::new(LinkId(link), ActionSender::new(connection, tx)),
            rx,
        )
    }

    fn pushed_body(action: DriverAction) -> String {
        match action {
            DriverAction::Transfer { message, .. } => {
                String::from_utf8(message.body).expect("utf8 body")
            }
            other => panic!("expected transfer, got {other:?}"),
        }
    }

    fn record(name: &str, kind: &str) -> ResourceRecord {
        ResourceRecord::new(name).with_label("type", kind)
    }

    #[tokio::test]
    async fn subscribe_pushes_exactly_one_initial_snapshot_even_when_empty() {
        let database = ResourceDatabase::new("addresses");
        let (sender, mut rx) = subscriber(ConnectionId::new(), 1);

        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;

        let first = rx.recv().await.expect("initial push");
        assert_eq!(pushed_body(first), "");
        assert!(rx.try_recv().is_err(), "exactly one initial push");
        assert!(!database.is_populated().await);
    }

    #[tokio::test]
    async fn subscribe_snapshot_reflects_database_state_and_filter() {
        let database = ResourceDatabase::new("addresses");
        database
            .apply_change(ResourceChangeSet::added(vec![
                record("queue-a", "queue"),
                record("topic-a", "topic"),
            ]))
            .await;
        assert!(database.is_populated().await);

        let (sender, mut rx) = subscriber(ConnectionId::new(), 1);
        database
            .subscribe(
                Filter::labels(selector(&[("type", "queue")])),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;

        let first = rx.recv().await.expect("initial push");
        assert_eq!(pushed_body(first), "queue-a");
    }

    #[tokio::test]
    async fn change_that_alters_subset_pushes_once_and_unchanged_subset_stays_silent() {
        let database = ResourceDatabase::new("addresses");
        let (sender, mut rx) = subscriber(ConnectionId::new(), 1);
        database
            .subscribe(
                Filter::labels(selector(&[("type", "queue")])),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = rx.recv().await.expect("initial push");

        // Alters the matching subset: one push with the new subset.
        database
            .apply_change(ResourceChangeSet::added(vec![record("queue-a", "queue")]))
            .await;
        assert_eq!(pushed_body(rx.recv().await.expect("change push")), "queue-a");

        // Matching subset unchanged (a topic joined): no push.
        database
            .apply_change(ResourceChangeSet::added(vec![record("topic-a", "topic")]))
            .await;
        assert!(rx.try_recv().is_err(), "unchanged subset must not push");

        // Removal alters the subset again: empty push.
        database
            .apply_change(ResourceChangeSet::removed(vec!["queue-a".to_string()]))
            .await;
        assert_eq!(pushed_body(rx.recv().await.expect("removal push")), "");
    }

    #[tokio::test]
    async fn update_with_same_value_does_not_push() {
        let database = ResourceDatabase::new("addresses");
        database
            .apply_change(ResourceChangeSet::added(vec![record("queue-a", "queue")]))
            .await;

        let (sender, mut rx) = subscriber(ConnectionId::new(), 1);
        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = rx.recv().await.expect("initial push");

        // Same record value applied as an update: subsets compare equal.
        let mut change = ResourceChangeSet::default();
        change.updated.push(record("queue-a", "queue"));
        database.apply_change(change).await;

        assert!(rx.try_recv().is_err(), "value-identical update is silent");
    }

    #[tokio::test]
    async fn broken_subscriber_is_dropped_and_others_keep_receiving() {
        let database = ResourceDatabase::new("addresses");

        let (healthy, mut healthy_rx) = subscriber(ConnectionId::new(), 1);
        let (broken, broken_rx) = subscriber(ConnectionId::new(), 2);
        drop(broken_rx);

        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                healthy,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = healthy_rx.recv().await.expect("initial push");

        // The broken link fails its initial push and is never registered.
        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                broken,
                Arc::new(NameListEncoder),
            )
            .await;
        assert_eq!(database.subscription_count().await, 1);

        database
            .apply_change(ResourceChangeSet::added(vec![record("queue-a", "queue")]))
            .await;
        assert_eq!(
            pushed_body(healthy_rx.recv().await.expect("push to healthy")),
            "queue-a"
        );
    }

    #[tokio::test]
    async fn push_failure_mid_stream_removes_only_that_subscription() {
        let database = ResourceDatabase::new("addresses");

        let (healthy, mut healthy_rx) = subscriber(ConnectionId::new(), 1);
        let (doomed, mut doomed_rx) = subscriber(ConnectionId::new(), 2);

        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                healthy,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = healthy_rx.recv().await.expect("initial push");
        database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                doomed,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = doomed_rx.recv().await.expect("initial push");
        assert_eq!(database.subscription_count().await, 2);

        drop(doomed_rx);
        database
            .apply_change(ResourceChangeSet::added(vec![record("queue-a", "queue")]))
            .await;

        assert_eq!(database.subscription_count().await, 1);
        assert_eq!(
            pushed_body(healthy_rx.recv().await.expect("push to healthy")),
            "queue-a"
        );
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let database = ResourceDatabase::new("addresses");
        let (sender, mut rx) = subscriber(ConnectionId::new(), 1);
        let id = database
            .subscribe(
                Filter::labels(LabelSelector::default()),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;
        let _ = rx.recv().await.expect("initial push");

        database.unsubscribe(id).await;
        database.unsubscribe(id).await;
        assert_eq!(database.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn remove_connection_drops_all_subscriptions_of_that_connection() {
        let database = ResourceDatabase::new("addresses");
        let doomed_connection = ConnectionId::new();

        let (first, mut first_rx) = subscriber(doomed_connection, 1);
        let (second, mut second_rx) = subscriber(doomed_connection, 2);
        let (survivor, mut survivor_rx) = subscriber(ConnectionId::new(), 1);

        for sender in [first, second, survivor] {
            database
                .subscribe(
                    Filter::labels(LabelSelector::default()),
                    sender,
                    Arc::new(NameListEncoder),
                )
                .await;
        }
        for rx in [&mut first_rx, &mut second_rx, &mut survivor_rx] {
            let _ = rx.recv().await.expect("initial push");
        }

        let removed = database.remove_connection(doomed_connection).await;
        assert_eq!(removed, 2);
        assert_eq!(database.subscription_count().await, 1);
    }

    #[tokio::test]
    async fn database_map_rejects_unknown_address() {
        let map = DatabaseMap::new([Arc::new(ResourceDatabase::new("addresses"))]);
        let (sender, _rx) = subscriber(ConnectionId::new(), 1);

        let result = map
            .subscribe(
                "unknown",
                Filter::labels(LabelSelector::default()),
                sender,
                Arc::new(NameListEncoder),
            )
            .await;

        assert!(result.is_err());
        assert!(map.database("addresses").is_some());
    }
}
