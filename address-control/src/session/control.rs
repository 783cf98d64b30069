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

//! Control-endpoint behavior: request receivers and dynamic reply links.

use crate::broker::{ControlAddress, ReplyRegistry, RequestBroker};
use crate::observability::events;
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

const COMPONENT: &str = "control_endpoint";
const CONTAINER_ID: &str = "address-control";

enum ControlLink {
    /// Dynamic reply link; holds the minted reply address.
    Reply { address: String },
    /// Request receiver bound to a well-known control address.
    Receiver { target: ControlAddress },
}

/// Request/reply endpoint: receivers on the well-known control addresses,
/// dynamic reply links registered in the reply registry.
pub struct ControlBehavior {
    registry: Arc<ReplyRegistry>,
    broker: Arc<RequestBroker>,
    links: Mutex<HashMap<(ConnectionId, LinkId), ControlLink>>,
}

impl ControlBehavior {
    pub fn new(registry: Arc<ReplyRegistry>, broker: Arc<RequestBroker>) -> Self {
        Self {
            registry,
            broker,
            links: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EndpointBehavior for ControlBehavior {
    fn container_id(&self) -> &'static str {
        CONTAINER_ID
    }

    async fn on_sender_open(&self, ctx: &ConnectionContext, link: LinkId, source: SourceSpec) {
        if source.dynamic {
            let sender = SenderHandle::new(link, ctx.actions.clone());
            let address = self.registry.register_dynamic(sender);
            self.links.lock().await.insert(
                (ctx.connection, link),
                ControlLink::Reply {
                    address: address.clone(),
                },
            );
            let _ = ctx
                .actions
                .submit(DriverAction::OpenSender {
                    link,
                    address: Some(address),
                })
                .await;
        } else {
            // Non-dynamic sender: open with whatever the remote asked for.
            let _ = ctx
                .actions
                .submit(DriverAction::OpenSender {
                    link,
                    address: None,
                })
                .await;
        }
    }

    async fn on_receiver_open(&self, ctx: &ConnectionContext, link: LinkId, target: TargetSpec) {
        let resolved = target
            .address
            .as_deref()
            .and_then(ControlAddress::resolve);

        match resolved {
            Some(control_address) => {
                self.links.lock().await.insert(
                    (ctx.connection, link),
                    ControlLink::Receiver {
                        target: control_address,
                    },
                );
                let _ = ctx
                    .actions
                    .submit(DriverAction::OpenReceiver { link })
                    .await;
                debug!(
                    component = COMPONENT,
                    connection_id = %ctx.connection,
                    link_id = %link,
                    address = %control_address,
                    "opened request receiver"
                );
            }
            None => {
                warn!(
                    event = events::LINK_REJECT_UNKNOWN_ADDRESS,
                    component = COMPONENT,
                    connection_id = %ctx.connection,
                    link_id = %link,
                    address = target.address.as_deref().unwrap_or("<none>"),
                    "closing receiver for unknown control address"
                );
                let _ = ctx.actions.submit(DriverAction::CloseLink { link }).await;
            }
        }
    }

    async fn on_delivery(
        &self,
        ctx: &ConnectionContext,
        link: LinkId,
        delivery: DeliveryId,
        message: WireMessage,
    ) {
        let target = {
            let links = self.links.lock().await;
            match links.get(&(ctx.connection, link)) {
                Some(ControlLink::Receiver { target }) => Some(*target),
                _ => None,
            }
        };

        match target {
            Some(target) => {
                self.broker
                    .dispatch(target, delivery, message, ctx.actions.clone())
                    .await;
            }
            None => {
                // Delivery on a link we never opened as a receiver.
                let _ = ctx
                    .actions
                    .submit(DriverAction::Disposition {
                        delivery,
                        outcome: Disposition::Rejected,
                    })
                    .await;
            }
        }
    }

    async fn on_link_closed(&self, ctx: &ConnectionContext, link: LinkId) {
        let removed = self.links.lock().await.remove(&(ctx.connection, link));
        if let Some(ControlLink::Reply { address }) = removed {
            self.registry.remove_address(&address);
        }
    }

    async fn on_teardown(&self, connection: ConnectionId) {
        self.links
            .lock()
            .await
            .retain(|(owner, _), _| *owner != connection);

        for sender in self.registry.remove_connection(connection) {
            sender.close().await;
        }
    }
}
