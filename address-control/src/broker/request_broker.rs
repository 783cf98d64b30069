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

//! Request/reply broker: handler dispatch, reply routing, dispositions.

use crate::broker::handler_pool::HandlerPool;
use crate::broker::reply_registry::ReplyRegistry;
use crate::observability::{events, fields};
use crate::transport::{ActionSender, DeliveryId, Disposition, DriverAction, WireMessage};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "request_broker";

/// The fixed set of control addresses served by the request/reply endpoint.
///
/// Routing is a static mapping resolved once per link open; there is no
/// runtime handler discovery by address string beyond this.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ControlAddress {
    AddressManagement,
    FlavorListing,
}

impl ControlAddress {
    pub fn resolve(address: &str) -> Option<Self> {
        match address {
            "$address" => Some(ControlAddress::AddressManagement),
            "$flavor" => Some(ControlAddress::FlavorListing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAddress::AddressManagement => "$address",
            ControlAddress::FlavorListing => "$flavor",
        }
    }
}

impl Display for ControlAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound control request, immutable once received.
#[derive(Clone, Debug)]
pub struct RequestMessage {
    pub target: ControlAddress,
    pub message: WireMessage,
}

impl RequestMessage {
    pub fn reply_to(&self) -> Option<&str> {
        self.message.reply_to.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.message.subject.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.message.body
    }
}

/// Failure computing a response; the original delivery is rejected.
#[derive(Debug)]
pub enum HandlerError {
    Malformed(String),
    Backend(String),
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Malformed(detail) => write!(f, "malformed request: {detail}"),
            HandlerError::Backend(detail) => write!(f, "backend failure: {detail}"),
        }
    }
}

impl Error for HandlerError {}

/// Computes a response for one control address.
///
/// Handlers run on the handler pool and may block.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: &RequestMessage) -> Result<WireMessage, HandlerError>;
}

/// Routes inbound deliveries to registered handlers and delivers responses
/// onto registered reply links.
pub struct RequestBroker {
    handlers: HashMap<ControlAddress, Arc<dyn RequestHandler>>,
    registry: Arc<ReplyRegistry>,
    pool: HandlerPool,
}

impl RequestBroker {
    pub fn new(registry: Arc<ReplyRegistry>, pool: HandlerPool) -> Self {
        Self {
            handlers: HashMap::new(),
            registry,
            pool,
        }
    }

    /// Binds a handler to a control address. Later registrations replace
    /// earlier ones; binding happens once at startup.
    pub fn register_handler(&mut self, address: ControlAddress, handler: Arc<dyn RequestHandler>) {
        self.handlers.insert(address, handler);
    }

    pub fn has_handler(&self, address: ControlAddress) -> bool {
        self.handlers.contains_key(&address)
    }

    /// Dispatches one delivery: resolves the reply route now, then hands the
    /// handler invocation to the worker pool. The pool worker sends the
    /// reply (when routed) and settles the delivery, both marshalled through
    /// the connection's action channel.
    pub async fn dispatch(
        &self,
        target: ControlAddress,
        delivery: DeliveryId,
        message: WireMessage,
        actions: ActionSender,
    ) {
        let Some(handler) = self.handlers.get(&target).cloned() else {
            // No handler bound: the request is silently dropped, the
            // delivery rejected.
            warn!(
                event = events::REQUEST_REJECTED,
                component = COMPONENT,
                address = %target,
                reason = "no_registered_handler",
                "rejecting delivery for unhandled control address"
            );
            let _ = actions
                .submit(DriverAction::Disposition {
                    delivery,
                    outcome: Disposition::Rejected,
                })
                .await;
            return;
        };

        let reply_sender = message
            .reply_to
            .as_deref()
            .and_then(|reply_to| self.registry.lookup(reply_to));

        debug!(
            event = events::REQUEST_DISPATCH,
            component = COMPONENT,
            address = %target,
            reply_to = %fields::format_reply_to(&message),
            subject = %fields::format_subject(&message),
            "dispatching request to handler pool"
        );

        let registry = self.registry.clone();
        let job_actions = actions.clone();
        let submitted = self.pool.try_submit(move || {
            let request = RequestMessage { target, message };
            match handler.handle(&request) {
                Ok(response) => {
                    match reply_sender {
                        Some(sender) => {
                            if sender.send_blocking(response).is_ok() {
                                debug!(
                                    event = events::REPLY_SENT,
                                    component = COMPONENT,
                                    address = %target,
                                    "reply delivered to registered sender"
                                );
                            } else {
                                // The reply link died mid-flight; treat the
                                // registration as gone.
                                if let Some(reply_to) = request.reply_to() {
                                    registry.remove_address(reply_to);
                                }
                                warn!(
                                    event = events::REPLY_SEND_FAILED,
                                    component = COMPONENT,
                                    address = %target,
                                    reply_to = %fields::format_optional(request.reply_to()),
                                    "reply link broken; deregistered reply address"
                                );
                            }
                        }
                        None => {
                            debug!(
                                event = events::REPLY_DROPPED_NO_ROUTE,
                                component = COMPONENT,
                                address = %target,
                                reply_to = %fields::format_optional(request.reply_to()),
                                "response computed but no reply route registered"
                            );
                        }
                    }
                    let _ = job_actions.submit_blocking(DriverAction::Disposition {
                        delivery,
                        outcome: Disposition::Accepted,
                    });
                    debug!(
                        event = events::REQUEST_ACCEPTED,
                        component = COMPONENT,
                        address = %target,
                        "accepted delivery"
                    );
                }
                Err(err) => {
                    warn!(
                        event = events::REQUEST_REJECTED,
                        component = COMPONENT,
                        address = %target,
                        err = %err,
                        "handler failed; rejecting delivery"
                    );
                    let _ = job_actions.submit_blocking(DriverAction::Disposition {
                        delivery,
                        outcome: Disposition::Rejected,
                    });
                }
            }
        });

        if submitted.is_err() {
            warn!(
                event = events::HANDLER_POOL_SATURATED,
                component = COMPONENT,
                address = %target,
                "handler pool saturated; rejecting delivery"
            );
            let _ = actions
                .submit(DriverAction::Disposition {
                    delivery,
                    outcome: Disposition::Rejected,
                })
                .await;
        }
    }
}
