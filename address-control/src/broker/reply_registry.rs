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

//! Process-wide registry of dynamically-assigned reply addresses.

use crate::observability::events;
use crate::transport::{ConnectionId, SenderHandle};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const COMPONENT: &str = "reply_registry";

struct ReplyRegistration {
    connection: ConnectionId,
    sender: SenderHandle,
}

/// Maps minted reply addresses to the sender link that should receive the
/// reply. Shared across connection actors and the handler pool; the short
/// critical sections make a plain mutex-guarded map sufficient.
pub struct ReplyRegistry {
    entries: Mutex<HashMap<String, ReplyRegistration>>,
}

impl ReplyRegistry {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mints a fresh reply address and binds it to the given sender link.
    ///
    /// Addresses are random tokens, so no two registrations ever share one
    /// for the registry's lifetime.
    pub fn register_dynamic(&self, sender: SenderHandle) -> String {
        let reply_address = Uuid::new_v4().to_string();
        let connection = sender.connection_id();

        let mut entries = self.entries.lock().expect("reply registry lock poisoned");
        entries.insert(
            reply_address.clone(),
            ReplyRegistration { connection, sender },
        );

        debug!(
            event = events::REPLY_LINK_ASSIGNED,
            component = COMPONENT,
            connection_id = %connection,
            address = %reply_address,
            "assigned dynamic reply address"
        );
        reply_address
    }

    /// Returns the sender bound to a reply address, if registered.
    pub fn lookup(&self, reply_address: &str) -> Option<SenderHandle> {
        self.entries
            .lock()
            .expect("reply registry lock poisoned")
            .get(reply_address)
            .map(|registration| registration.sender.clone())
    }

    /// Removes one reply address. Idempotent.
    pub fn remove_address(&self, reply_address: &str) -> Option<SenderHandle> {
        let removed = self
            .entries
            .lock()
            .expect("reply registry lock poisoned")
            .remove(reply_address);

        if let Some(registration) = removed {
            debug!(
                event = events::REPLY_LINK_REMOVED,
                component = COMPONENT,
                connection_id = %registration.connection,
                address = %reply_address,
                "removed reply address"
            );
            Some(registration.sender)
        } else {
            None
        }
    }

    /// Removes every registration owned by a connection and returns the
    /// affected senders so the caller can close them.
    pub fn remove_connection(&self, connection: ConnectionId) -> Vec<SenderHandle> {
        let mut entries = self.entries.lock().expect("reply registry lock poisoned");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(_, registration)| registration.connection == connection)
            .map(|(address, _)| address.clone())
            .collect();

        doomed
            .into_iter()
            .filter_map(|address| entries.remove(&address))
            .map(|registration| registration.sender)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("reply registry lock poisoned")
            .len()
    }
}
