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

//! Wire-surface types and the AMQP driver seam.
//!
//! The framing layer is a collaborator: per accepted connection a driver
//! delivers [`ConnectionEvent`]s and consumes [`DriverAction`]s over bounded
//! channels. Everything above this seam — session lifecycle, reply routing,
//! subscriptions — is owned by this crate. A driver must never deliver two
//! events for the same connection concurrently; the channel pair makes that
//! the natural shape.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::{Receiver, Sender};
use uuid::Uuid;

/// Process-unique identity of one accepted connection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driver-assigned identity of one link within its connection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LinkId(pub u64);

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driver-assigned identity of one inbound delivery.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DeliveryId(pub u64);

/// Transport message as seen above the framing layer.
///
/// The body stays opaque here; each handler or encoder owns its own body
/// encoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WireMessage {
    pub subject: Option<String>,
    pub reply_to: Option<String>,
    pub correlation_id: Option<String>,
    pub body: Vec<u8>,
}

/// Remote source requested on a sender-link open.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceSpec {
    pub address: Option<String>,
    pub dynamic: bool,
    pub filter: BTreeMap<String, String>,
}

/// Remote target requested on a receiver-link open.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetSpec {
    pub address: Option<String>,
}

/// Events a driver delivers for one connection, in order.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// Remote attached a receiving link; we are the sender side.
    SenderOpen { link: LinkId, source: SourceSpec },
    /// Remote attached a sending link; we are the receiver side.
    ReceiverOpen { link: LinkId, target: TargetSpec },
    /// Inbound transfer on an open receiver link.
    Delivery {
        link: LinkId,
        delivery: DeliveryId,
        message: WireMessage,
    },
    /// Remote detached a link.
    LinkClosed { link: LinkId },
    /// Remote sent a close frame.
    Closed,
    /// Transport dropped without a close frame.
    Disconnected,
}

/// Delivery outcome reported back to the remote sender.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    Accepted,
    Rejected,
}

/// Actions the session layer issues back to the driver.
#[derive(Debug)]
pub enum DriverAction {
    /// Open a sender link; `address` carries the assigned dynamic source
    /// address when one was minted.
    OpenSender {
        link: LinkId,
        address: Option<String>,
    },
    OpenReceiver {
        link: LinkId,
    },
    CloseLink {
        link: LinkId,
    },
    Transfer {
        link: LinkId,
        message: WireMessage,
    },
    Disposition {
        delivery: DeliveryId,
        outcome: Disposition,
    },
    /// Send a close frame and stop.
    Close,
}

/// One connection as handed over by a driver.
pub struct AcceptedConnection {
    pub remote_container: String,
    pub events: Receiver<ConnectionEvent>,
    pub actions: Sender<DriverAction>,
}

/// Listener seam: yields accepted connections until the driver shuts down.
#[async_trait]
pub trait AmqpListener: Send {
    async fn accept(&mut self) -> Option<AcceptedConnection>;
}

/// The peer link or its connection is gone; the write was not delivered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LinkBroken;

impl Display for LinkBroken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "link or connection no longer accepts writes")
    }
}

impl Error for LinkBroken {}

/// Cloneable handle submitting actions onto one connection's driver channel.
///
/// Every write through this handle is serialized by the driver end of the
/// channel, which is what marshals cross-thread sends onto the connection's
/// writer.
#[derive(Clone)]
pub struct ActionSender {
    connection: ConnectionId,
    tx: Sender<DriverAction>,
}

impl ActionSender {
    pub fn new(connection: ConnectionId, tx: Sender<DriverAction>) -> Self {
        Self { connection, tx }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    pub async fn submit(&self, action: DriverAction) -> Result<(), LinkBroken> {
        self.tx.send(action).await.map_err(|_| LinkBroken)
    }

    /// Blocking submit for handler-pool threads outside any runtime.
    pub fn submit_blocking(&self, action: DriverAction) -> Result<(), LinkBroken> {
        self.tx.blocking_send(action).map_err(|_| LinkBroken)
    }
}

/// Cloneable handle for writing to one open sender link.
#[derive(Clone)]
pub struct SenderHandle {
    link: LinkId,
    actions: ActionSender,
}

impl SenderHandle {
    pub fn new(link: LinkId, actions: ActionSender) -> Self {
        Self { link, actions }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.actions.connection_id()
    }

    pub fn link_id(&self) -> LinkId {
        self.link
    }

    pub async fn send(&self, message: WireMessage) -> Result<(), LinkBroken> {
        self.actions
            .submit(DriverAction::Transfer {
                link: self.link,
                message,
            })
            .await
    }

    /// Blocking variant for handler-pool threads.
    pub fn send_blocking(&self, message: WireMessage) -> Result<(), LinkBroken> {
        self.actions.submit_blocking(DriverAction::Transfer {
            link: self.link,
            message,
        })
    }

    /// Asks the driver to detach the link. Best effort; a dead connection
    /// already implies the link is gone.
    pub async fn close(&self) {
        let _ = self
            .actions
            .submit(DriverAction::CloseLink { link: self.link })
            .await;
    }
}
