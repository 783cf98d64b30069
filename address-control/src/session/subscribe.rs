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

//! Subscription-endpoint behavior: sender links become filtered snapshot
//! subscriptions.

use crate::observability::events;
use crate::resources::{
    DatabaseMap, Filter, LabelSelector, ResourceDatabase, SnapshotEncoder, SubscriptionId,
};
use crate::session::{ConnectionContext, EndpointBehavior};
use crate::transport::{
    ConnectionId, DeliveryId, Disposition, DriverAction, LinkId, SenderHandle, SourceSpec,
    TargetSpec, WireMessage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "subscribe_endpoint";
const CONTAINER_ID: &str = "configuration-service";

/// Configuration endpoint: a sender link open against a known resource-type
/// address registers a subscription filtered by the link's source filter.
pub struct SubscribeBehavior {
    databases: Arc<DatabaseMap>,
    encoder: Arc<dyn SnapshotEncoder>,
    subscriptions:
        Mutex<HashMap<(ConnectionId, LinkId), (Arc<ResourceDatabase>, SubscriptionId)>>,
}

impl SubscribeBehavior {
    pub fn new(databases: Arc<DatabaseMap>, encoder: Arc<dyn SnapshotEncoder>) -> Self {
        Self {
            databases,
            encoder,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EndpointBehavior for SubscribeBehavior {
    fn container_id(&self) -> &'static str {
        CONTAINER_ID
    }

    async fn on_sender_open(&self, ctx: &ConnectionContext, link: LinkId, source: SourceSpec) {
        let database = source
            .address
            .as_deref()
            .filter(|_| !source.dynamic)
            .and_then(|address| self.databases.database(address));

        let Some(database) = database else {
            warn!(
                event = events::SUBSCRIBE_UNKNOWN_ADDRESS,
                component = COMPONENT,
                connection_id = %ctx.connection,
                link_id = %link,
                address = source.address.as_deref().unwrap_or("<dynamic>"),
                "closing subscriber link for unknown address"
            );
            let _ = ctx.actions.submit(DriverAction::CloseLink { link }).await;
            return;
        };

        // Open first so the initial snapshot lands on an open link.
        let _ = ctx
            .actions
            .submit(DriverAction::OpenSender {
                link,
                address: None,
            })
            .await;

        let filter = Filter::labels(LabelSelector::from_map(source.filter));
        let sender = SenderHandle::new(link, ctx.actions.clone());
        let id = database.subscribe(filter, sender, self.encoder.clone()).await;
        self.subscriptions
            .lock()
            .await
            .insert((ctx.connection, link), (database.clone(), id));

        debug!(
            component = COMPONENT,
            connection_id = %ctx.connection,
            link_id = %link,
            address = %database.address(),
            remote_container = %ctx.remote_container,
            "added subscriber"
        );
    }

    async fn on_receiver_open(&self, ctx: &ConnectionContext, link: LinkId, target: TargetSpec) {
        // This endpoint only pushes; inbound links have nowhere to go.
        warn!(
            event = events::LINK_REJECT_UNKNOWN_ADDRESS,
            component = COMPONENT,
            connection_id = %ctx.connection,
            link_id = %link,
            address = target.address.as_deref().unwrap_or("<none>"),
            "closing receiver on push-only endpoint"
        );
        let _ = ctx.actions.submit(DriverAction::CloseLink { link }).await;
    }

    async fn on_delivery(
        &self,
        ctx: &ConnectionContext,
        _link: LinkId,
        delivery: DeliveryId,
        _message: WireMessage,
    ) {
        let _ = ctx
            .actions
            .submit(DriverAction::Disposition {
                delivery,
                outcome: Disposition::Rejected,
            })
            .await;
    }

    async fn on_link_closed(&self, ctx: &ConnectionContext, link: LinkId) {
        let removed = self
            .subscriptions
            .lock()
            .await
            .remove(&(ctx.connection, link));
        if let Some((database, id)) = removed {
            database.unsubscribe(id).await;
        }
    }

    async fn on_teardown(&self, connection: ConnectionId) {
        let removed: Vec<(Arc<ResourceDatabase>, SubscriptionId)> = {
            let mut subscriptions = self.subscriptions.lock().await;
            let keys: Vec<(ConnectionId, LinkId)> = subscriptions
                .keys()
                .filter(|(owner, _)| *owner == connection)
                .copied()
                .collect();
            keys.into_iter()
                .filter_map(|key| subscriptions.remove(&key))
                .collect()
        };

        for (database, id) in removed {
            database.unsubscribe(id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SubscribeBehavior;
    use crate::resources::{
        DatabaseMap, JsonSnapshotEncoder, ResourceChangeSet, ResourceDatabase, ResourceRecord,
    };
    use crate::session::{ConnectionContext, EndpointBehavior};
    use crate::transport::{
        ActionSender, ConnectionId, DriverAction, LinkId, SourceSpec,
    };
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn behavior_with(
        database: Arc<ResourceDatabase>,
    ) -> (Arc<ResourceDatabase>, SubscribeBehavior) {
        let behavior = SubscribeBehavior::new(
            Arc::new(DatabaseMap::new([database.clone()])),
            Arc::new(JsonSnapshotEncoder),
        );
        (database, behavior)
    }

    fn context() -> (ConnectionContext, mpsc::Receiver<DriverAction>) {
        let (action_tx, action_rx) = mpsc::channel(16);
        let connection = ConnectionId::new();
        (
            ConnectionContext {
                connection,
                remote_container: "subscriber".to_string(),
                actions: ActionSender::new(connection, action_tx),
            },
            action_rx,
        )
    }

    fn subscribe_source(address: &str, filter: &[(&str, &str)]) -> SourceSpec {
        SourceSpec {
            address: Some(address.to_string()),
            dynamic: false,
            filter: filter
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn sender_open_on_known_address_opens_then_pushes_initial_snapshot() {
        let (database, behavior) = behavior_with(Arc::new(ResourceDatabase::new("addresses")));
        let (ctx, mut actions) = context();

        behavior
            .on_sender_open(&ctx, LinkId(1), subscribe_source("addresses", &[]))
            .await;

        assert!(matches!(
            actions.recv().await,
            Some(DriverAction::OpenSender { link, address: None }) if link == LinkId(1)
        ));
        assert!(matches!(
            actions.recv().await,
            Some(DriverAction::Transfer { link, .. }) if link == LinkId(1)
        ));
        assert_eq!(database.subscription_count().await, 1);
    }

    #[tokio::test]
    async fn sender_open_on_unknown_address_closes_the_link() {
        let (_database, behavior) = behavior_with(Arc::new(ResourceDatabase::new("addresses")));
        let (ctx, mut actions) = context();

        behavior
            .on_sender_open(&ctx, LinkId(2), subscribe_source("pods", &[]))
            .await;

        assert!(matches!(
            actions.recv().await,
            Some(DriverAction::CloseLink { link }) if link == LinkId(2)
        ));
    }

    #[tokio::test]
    async fn source_filter_becomes_the_subscription_label_selector() {
        let database = Arc::new(ResourceDatabase::new("addresses"));
        database
            .apply_change(ResourceChangeSet::added(vec![
                ResourceRecord::new("queue-a").with_label("type", "queue"),
                ResourceRecord::new("topic-a").with_label("type", "topic"),
            ]))
            .await;
        let (_database, behavior) = behavior_with(database);
        let (ctx, mut actions) = context();

        behavior
            .on_sender_open(
                &ctx,
                LinkId(1),
                subscribe_source("addresses", &[("type", "queue")]),
            )
            .await;

        let _open = actions.recv().await.expect("open action");
        match actions.recv().await.expect("initial snapshot") {
            DriverAction::Transfer { message, .. } => {
                let body: serde_json::Value =
                    serde_json::from_slice(&message.body).expect("JSON snapshot body");
                assert!(body.get("queue-a").is_some());
                assert!(body.get("topic-a").is_none());
            }
            other => panic!("expected snapshot transfer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn link_close_and_teardown_remove_subscriptions() {
        let (database, behavior) = behavior_with(Arc::new(ResourceDatabase::new("addresses")));
        let (ctx, mut actions) = context();

        behavior
            .on_sender_open(&ctx, LinkId(1), subscribe_source("addresses", &[]))
            .await;
        behavior
            .on_sender_open(&ctx, LinkId(2), subscribe_source("addresses", &[]))
            .await;
        for _ in 0..4 {
            let _ = actions.recv().await.expect("open/push actions");
        }
        assert_eq!(database.subscription_count().await, 2);

        behavior.on_link_closed(&ctx, LinkId(1)).await;
        assert_eq!(database.subscription_count().await, 1);

        behavior.on_teardown(ctx.connection).await;
        assert_eq!(database.subscription_count().await, 0);
    }
}
