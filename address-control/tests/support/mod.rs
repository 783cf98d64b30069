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

//! In-memory AMQP driver double: the client side of the transport seam.

#![allow(dead_code)]

use address_control::transport::{
    AcceptedConnection, AmqpListener, ConnectionEvent, DeliveryId, Disposition, DriverAction,
    LinkId, SourceSpec, TargetSpec, WireMessage,
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const ACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Server-side listener fed by [`ListenerHandle::connect`].
pub struct InMemoryListener {
    incoming: mpsc::Receiver<AcceptedConnection>,
}

#[async_trait]
impl AmqpListener for InMemoryListener {
    async fn accept(&mut self) -> Option<AcceptedConnection> {
        self.incoming.recv().await
    }
}

/// Test-side handle minting new connections against the listener.
#[derive(Clone)]
pub struct ListenerHandle {
    connections: mpsc::Sender<AcceptedConnection>,
}

pub fn listener() -> (ListenerHandle, InMemoryListener) {
    let (connections, incoming) = mpsc::channel(16);
    (ListenerHandle { connections }, InMemoryListener { incoming })
}

impl ListenerHandle {
    pub async fn connect(&self, remote_container: &str) -> TestConnection {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (action_tx, action_rx) = mpsc::channel(64);
        self.connections
            .send(AcceptedConnection {
                remote_container: remote_container.to_string(),
                events: event_rx,
                actions: action_tx,
            })
            .await
            .expect("listener accepts connections");
        TestConnection {
            events: event_tx,
            actions: action_rx,
            next_link: 0,
            next_delivery: 0,
        }
    }
}

/// One fake client connection: feeds events in, observes driver actions out.
pub struct TestConnection {
    events: mpsc::Sender<ConnectionEvent>,
    actions: mpsc::Receiver<DriverAction>,
    next_link: u64,
    next_delivery: u64,
}

impl TestConnection {
    fn mint_link(&mut self) -> LinkId {
        self.next_link += 1;
        LinkId(self.next_link)
    }

    async fn send_event(&self, event: ConnectionEvent) {
        self.events
            .send(event)
            .await
            .expect("connection actor is alive");
    }

    /// Attaches a sending link towards the endpoint (we deliver, it
    /// receives).
    pub async fn open_receiver(&mut self, address: &str) -> LinkId {
        let link = self.mint_link();
        self.send_event(ConnectionEvent::ReceiverOpen {
            link,
            target: TargetSpec {
                address: Some(address.to_string()),
            },
        })
        .await;
        link
    }

    /// Attaches a receiving link with a dynamic source (a reply link).
    pub async fn open_dynamic_sender(&mut self) -> LinkId {
        let link = self.mint_link();
        self.send_event(ConnectionEvent::SenderOpen {
            link,
            source: SourceSpec {
                dynamic: true,
                ..Default::default()
            },
        })
        .await;
        link
    }

    /// Attaches a receiving link against a resource-type address with a
    /// label filter (a subscription).
    pub async fn open_subscriber(&mut self, address: &str, filter: &[(&str, &str)]) -> LinkId {
        let link = self.mint_link();
        self.send_event(ConnectionEvent::SenderOpen {
            link,
            source: SourceSpec {
                address: Some(address.to_string()),
                dynamic: false,
                filter: filter
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        })
        .await;
        link
    }

    pub async fn deliver(&mut self, link: LinkId, message: WireMessage) -> DeliveryId {
        self.next_delivery += 1;
        let delivery = DeliveryId(self.next_delivery);
        self.send_event(ConnectionEvent::Delivery {
            link,
            delivery,
            message,
        })
        .await;
        delivery
    }

    pub async fn close_link(&self, link: LinkId) {
        self.send_event(ConnectionEvent::LinkClosed { link }).await;
    }

    pub async fn close(&self) {
        self.send_event(ConnectionEvent::Closed).await;
    }

    pub async fn disconnect(&self) {
        self.send_event(ConnectionEvent::Disconnected).await;
    }

    pub async fn next_action(&mut self) -> DriverAction {
        timeout(ACTION_TIMEOUT, self.actions.recv())
            .await
            .expect("driver action within timeout")
            .expect("action channel open")
    }

    pub fn try_next_action(&mut self) -> Option<DriverAction> {
        self.actions.try_recv().ok()
    }

    /// Waits for the next `OpenSender` and returns its assigned address.
    pub async fn expect_sender_open(&mut self) -> (LinkId, Option<String>) {
        match self.next_action().await {
            DriverAction::OpenSender { link, address } => (link, address),
            other => panic!("expected sender open, got {other:?}"),
        }
    }

    pub async fn expect_receiver_open(&mut self) -> LinkId {
        match self.next_action().await {
            DriverAction::OpenReceiver { link } => link,
            other => panic!("expected receiver open, got {other:?}"),
        }
    }

    pub async fn expect_link_close(&mut self) -> LinkId {
        match self.next_action().await {
            DriverAction::CloseLink { link } => link,
            other => panic!("expected link close, got {other:?}"),
        }
    }

    pub async fn expect_transfer(&mut self) -> (LinkId, WireMessage) {
        match self.next_action().await {
            DriverAction::Transfer { link, message } => (link, message),
            other => panic!("expected transfer, got {other:?}"),
        }
    }

    pub async fn expect_disposition(&mut self) -> (DeliveryId, Disposition) {
        match self.next_action().await {
            DriverAction::Disposition { delivery, outcome } => (delivery, outcome),
            other => panic!("expected disposition, got {other:?}"),
        }
    }

    pub async fn expect_close_frame(&mut self) {
        match self.next_action().await {
            DriverAction::Close => {}
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}
