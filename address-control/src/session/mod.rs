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

//! Connection session management: accept loop, per-connection actor and the
//! endpoint behavior seam.

mod control;
mod subscribe;

pub use control::ControlBehavior;
pub use subscribe::SubscribeBehavior;

use crate::observability::events;
use crate::transport::{
    ActionSender, AmqpListener, ConnectionEvent, ConnectionId, DeliveryId, DriverAction, LinkId,
    SourceSpec, TargetSpec, WireMessage,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const COMPONENT: &str = "session";

/// Per-connection context handed to behavior callbacks.
pub struct ConnectionContext {
    pub connection: ConnectionId,
    pub remote_container: String,
    pub actions: ActionSender,
}

/// Endpoint-specific handling of link opens and deliveries.
///
/// Callbacks run on the connection's actor task, one event at a time, so an
/// implementation never sees two events for the same connection
/// concurrently.
#[async_trait]
pub trait EndpointBehavior: Send + Sync + 'static {
    /// Fixed container identity presented on every connection.
    fn container_id(&self) -> &'static str;

    async fn on_sender_open(&self, ctx: &ConnectionContext, link: LinkId, source: SourceSpec);

    async fn on_receiver_open(&self, ctx: &ConnectionContext, link: LinkId, target: TargetSpec);

    async fn on_delivery(
        &self,
        ctx: &ConnectionContext,
        link: LinkId,
        delivery: DeliveryId,
        message: WireMessage,
    );

    async fn on_link_closed(&self, ctx: &ConnectionContext, link: LinkId);

    /// Removes every registration and subscription the connection owns.
    /// Must be complete when it returns; it runs exactly once per
    /// connection.
    async fn on_teardown(&self, connection: ConnectionId);
}

#[derive(Debug, Eq, PartialEq)]
enum ConnectionPhase {
    Opening,
    Open,
    Closing,
    Closed,
}

/// Drives one connection's event stream through its lifecycle.
///
/// Teardown is a single idempotent transition reachable from both the
/// remote-close and the disconnect edge.
struct ConnectionActor<B: EndpointBehavior> {
    ctx: ConnectionContext,
    behavior: Arc<B>,
    phase: ConnectionPhase,
}

impl<B: EndpointBehavior> ConnectionActor<B> {
    fn new(ctx: ConnectionContext, behavior: Arc<B>) -> Self {
        Self {
            ctx,
            behavior,
            phase: ConnectionPhase::Opening,
        }
    }

    async fn run(mut self, mut events: Receiver<ConnectionEvent>) {
        self.phase = ConnectionPhase::Open;
        debug!(
            event = events::CONNECTION_OPEN,
            component = COMPONENT,
            connection_id = %self.ctx.connection,
            remote_container = %self.ctx.remote_container,
            "connection open"
        );

        loop {
            let Some(event) = events.recv().await else {
                // Driver dropped its end without an explicit event: same as
                // a disconnect.
                self.teardown(false).await;
                break;
            };

            match event {
                ConnectionEvent::SenderOpen { link, source } => {
                    self.behavior
                        .on_sender_open(&self.ctx, link, source)
                        .await;
                }
                ConnectionEvent::ReceiverOpen { link, target } => {
                    self.behavior
                        .on_receiver_open(&self.ctx, link, target)
                        .await;
                }
                ConnectionEvent::Delivery {
                    link,
                    delivery,
                    message,
                } => {
                    self.behavior
                        .on_delivery(&self.ctx, link, delivery, message)
                        .await;
                }
                ConnectionEvent::LinkClosed { link } => {
                    self.behavior.on_link_closed(&self.ctx, link).await;
                }
                ConnectionEvent::Closed => {
                    debug!(
                        event = events::CONNECTION_CLOSE,
                        component = COMPONENT,
                        connection_id = %self.ctx.connection,
                        "remote closed connection"
                    );
                    self.teardown(true).await;
                    break;
                }
                ConnectionEvent::Disconnected => {
                    debug!(
                        event = events::CONNECTION_DISCONNECT,
                        component = COMPONENT,
                        connection_id = %self.ctx.connection,
                        "transport disconnected"
                    );
                    self.teardown(false).await;
                    break;
                }
            }
        }
    }

    async fn teardown(&mut self, answer_with_close: bool) {
        if self.phase == ConnectionPhase::Closed {
            return;
        }
        self.phase = ConnectionPhase::Closing;

        self.behavior.on_teardown(self.ctx.connection).await;

        if answer_with_close {
            let _ = self.ctx.actions.submit(DriverAction::Close).await;
        }
        self.phase = ConnectionPhase::Closed;

        info!(
            event = events::CONNECTION_TEARDOWN,
            component = COMPONENT,
            connection_id = %self.ctx.connection,
            reason = if answer_with_close { "close" } else { "disconnect" },
            "connection torn down"
        );
    }
}

/// Accept loop binding one endpoint behavior to one listener.
pub struct EndpointServer;

impl EndpointServer {
    /// Serves connections until the listener ends. Each accepted connection
    /// runs on its own actor task.
    pub fn serve<B, L>(behavior: Arc<B>, mut listener: L) -> JoinHandle<()>
    where
        B: EndpointBehavior,
        L: AmqpListener + 'static,
    {
        tokio::spawn(async move {
            while let Some(accepted) = listener.accept().await {
                let connection = ConnectionId::new();
                let ctx = ConnectionContext {
                    connection,
                    remote_container: accepted.remote_container,
                    actions: ActionSender::new(connection, accepted.actions),
                };
                debug!(
                    event = events::CONNECTION_OPEN,
                    component = COMPONENT,
                    connection_id = %connection,
                    container_id = behavior.container_id(),
                    "accepted connection"
                );
                tokio::spawn(ConnectionActor::new(ctx, behavior.clone()).run(accepted.events));
            }
        })
    }
}
