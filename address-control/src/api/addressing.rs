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

//! Address-management handler bound to the `$address` control address.

use crate::broker::{HandlerError, RequestHandler, RequestMessage};
use crate::model::{Destination, DestinationGroup};
use crate::transport::WireMessage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Backend failure from the address-management collaborator.
#[derive(Debug)]
pub struct ManagerError {
    message: String,
}

impl ManagerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "address manager failure: {}", self.message)
    }
}

impl Error for ManagerError {}

impl From<ManagerError> for HandlerError {
    fn from(err: ManagerError) -> Self {
        HandlerError::Backend(err.to_string())
    }
}

/// Address-management collaborator: owns the deployed destination groups.
///
/// Calls may block (they reach the orchestrator); handlers invoke them from
/// the worker pool only.
pub trait AddressManager: Send + Sync {
    fn list_groups(&self) -> Result<Vec<DestinationGroup>, ManagerError>;

    /// Replaces the deployed destination set with the given groups.
    fn deploy_groups(&self, groups: Vec<DestinationGroup>) -> Result<(), ManagerError>;

    /// Removes the listed addresses from their groups.
    fn delete_addresses(&self, addresses: &[String]) -> Result<(), ManagerError>;
}

/// One destination as carried on the wire.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressEntry {
    pub address: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub flavor: Option<String>,
    pub store_and_forward: bool,
    pub multicast: bool,
}

impl AddressEntry {
    fn group_key(&self) -> String {
        self.group.clone().unwrap_or_else(|| self.address.clone())
    }

    fn from_group(group: &DestinationGroup) -> Vec<AddressEntry> {
        group
            .destinations()
            .iter()
            .map(|destination| AddressEntry {
                address: destination.address.clone(),
                group: Some(group.group_id().to_string()),
                flavor: destination.flavor.clone(),
                store_and_forward: destination.store_and_forward,
                multicast: destination.multicast,
            })
            .collect()
    }
}

/// Handles `list`, `put` and `delete` requests for the deployed address set.
pub struct AddressingHandler<M: AddressManager> {
    manager: M,
}

impl<M: AddressManager> AddressingHandler<M> {
    pub fn new(manager: M) -> Self {
        Self { manager }
    }

    fn list_response(&self) -> Result<Vec<AddressEntry>, HandlerError> {
        let groups = self.manager.list_groups()?;
        Ok(groups.iter().flat_map(AddressEntry::from_group).collect())
    }

    fn group_entries(entries: Vec<AddressEntry>) -> Vec<DestinationGroup> {
        let mut grouped: BTreeMap<String, Vec<Destination>> = BTreeMap::new();
        for entry in entries {
            grouped.entry(entry.group_key()).or_default().push(
                Destination::new(
                    &entry.address,
                    entry.flavor.as_deref(),
                    entry.store_and_forward,
                    entry.multicast,
                ),
            );
        }
        grouped
            .into_iter()
            .map(|(group_id, destinations)| DestinationGroup::new(&group_id, destinations))
            .collect()
    }

    fn respond(request: &RequestMessage, entries: &[AddressEntry]) -> WireMessage {
        let body = serde_json::to_vec(entries).unwrap_or_default();
        WireMessage {
            subject: request.message.subject.clone(),
            correlation_id: request.message.correlation_id.clone(),
            body,
            ..Default::default()
        }
    }
}

impl<M: AddressManager> RequestHandler for AddressingHandler<M> {
    fn handle(&self, request: &RequestMessage) -> Result<WireMessage, HandlerError> {
        match request.subject() {
            Some("list") => {
                let entries = self.list_response()?;
                Ok(Self::respond(request, &entries))
            }
            Some("put") => {
                let entries: Vec<AddressEntry> = serde_json::from_slice(request.body())
                    .map_err(|err| HandlerError::Malformed(err.to_string()))?;
                self.manager.deploy_groups(Self::group_entries(entries))?;
                let deployed = self.list_response()?;
                Ok(Self::respond(request, &deployed))
            }
            Some("delete") => {
                let addresses: Vec<String> = serde_json::from_slice(request.body())
                    .map_err(|err| HandlerError::Malformed(err.to_string()))?;
                self.manager.delete_addresses(&addresses)?;
                let remaining = self.list_response()?;
                Ok(Self::respond(request, &remaining))
            }
            other => Err(HandlerError::Malformed(format!(
                "unsupported addressing method: {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressEntry, AddressManager, AddressingHandler, ManagerError};
    use crate::broker::{ControlAddress, RequestHandler, RequestMessage};
    use crate::model::DestinationGroup;
    use crate::transport::WireMessage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryManager {
        groups: Mutex<Vec<DestinationGroup>>,
        fail: bool,
    }

    impl AddressManager for InMemoryManager {
        fn list_groups(&self) -> Result<Vec<DestinationGroup>, ManagerError> {
            if self.fail {
                return Err(ManagerError::new("listing unavailable"));
            }
            Ok(self.groups.lock().expect("lock groups").clone())
        }

        fn deploy_groups(&self, groups: Vec<DestinationGroup>) -> Result<(), ManagerError> {
            if self.fail {
                return Err(ManagerError::new("deploy unavailable"));
            }
            *self.groups.lock().expect("lock groups") = groups;
            Ok(())
        }

        fn delete_addresses(&self, addresses: &[String]) -> Result<(), ManagerError> {
            let mut groups = self.groups.lock().expect("lock groups");
            *groups = groups
                .iter()
                .filter_map(|group| {
                    let kept: Vec<_> = group
                        .destinations()
                        .iter()
                        .filter(|destination| !addresses.contains(&destination.address))
                        .cloned()
                        .collect();
                    (!kept.is_empty()).then(|| DestinationGroup::new(group.group_id(), kept))
                })
                .collect();
            Ok(())
        }
    }

    fn request(subject: &str, body: &str) -> RequestMessage {
        RequestMessage {
            target: ControlAddress::AddressManagement,
            message: WireMessage {
                subject: Some(subject.to_string()),
                correlation_id: Some("corr-1".to_string()),
                body: body.as_bytes().to_vec(),
                ..Default::default()
            },
        }
    }

    fn entries_of(response: &WireMessage) -> Vec<AddressEntry> {
        serde_json::from_slice(&response.body).expect("response body is an entry array")
    }

    #[test]
    fn put_then_list_round_trips_the_address_set() {
        let handler = AddressingHandler::new(InMemoryManager::default());

        let put_body = r#"[
            {"address": "orders", "flavor": "small-queue", "storeAndForward": true, "multicast": false},
            {"address": "events", "group": "event-bus", "storeAndForward": false, "multicast": true}
        ]"#;
        let put_response = handler
            .handle(&request("put", put_body))
            .expect("put succeeds");
        assert_eq!(put_response.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(entries_of(&put_response).len(), 2);

        let list_response = handler
            .handle(&request("list", ""))
            .expect("list succeeds");
        let entries = entries_of(&list_response);
        assert_eq!(entries.len(), 2);
        // Ungrouped entries fall into a group named after their address.
        assert!(entries
            .iter()
            .any(|entry| entry.address == "orders" && entry.group.as_deref() == Some("orders")));
        assert!(entries
            .iter()
            .any(|entry| entry.address == "events" && entry.group.as_deref() == Some("event-bus")));
    }

    #[test]
    fn delete_removes_listed_addresses() {
        let handler = AddressingHandler::new(InMemoryManager::default());
        let put_body = r#"[
            {"address": "orders", "storeAndForward": true, "multicast": false},
            {"address": "invoices", "storeAndForward": true, "multicast": false}
        ]"#;
        handler
            .handle(&request("put", put_body))
            .expect("put succeeds");

        let delete_response = handler
            .handle(&request("delete", r#"["orders"]"#))
            .expect("delete succeeds");
        let remaining = entries_of(&delete_response);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].address, "invoices");
    }

    #[test]
    fn malformed_body_and_unknown_subject_are_rejected() {
        let handler = AddressingHandler::new(InMemoryManager::default());

        assert!(handler.handle(&request("put", "not json")).is_err());
        assert!(handler.handle(&request("upsert", "[]")).is_err());
    }

    #[test]
    fn backend_failure_surfaces_as_handler_error() {
        let handler = AddressingHandler::new(InMemoryManager {
            fail: true,
            ..Default::default()
        });

        assert!(handler.handle(&request("list", "")).is_err());
    }
}
