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

//! Flavor-listing handler bound to the `$flavor` control address.

use crate::broker::{HandlerError, RequestHandler, RequestMessage};
use crate::cluster::FlavorRepository;
use crate::transport::WireMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One flavor as carried on the wire.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorEntry {
    pub name: String,
    pub template_name: String,
}

/// Handles `list` requests against the flavor repository snapshot.
pub struct FlavorsHandler {
    repository: Arc<dyn FlavorRepository>,
}

impl FlavorsHandler {
    pub fn new(repository: Arc<dyn FlavorRepository>) -> Self {
        Self { repository }
    }
}

impl RequestHandler for FlavorsHandler {
    fn handle(&self, request: &RequestMessage) -> Result<WireMessage, HandlerError> {
        match request.subject() {
            Some("list") => {
                let entries: Vec<FlavorEntry> = self
                    .repository
                    .snapshot()
                    .values()
                    .map(|flavor| FlavorEntry {
                        name: flavor.name().to_string(),
                        template_name: flavor.template_name().to_string(),
                    })
                    .collect();
                let body = serde_json::to_vec(&entries).unwrap_or_default();
                Ok(WireMessage {
                    subject: request.message.subject.clone(),
                    correlation_id: request.message.correlation_id.clone(),
                    body,
                    ..Default::default()
                })
            }
            other => Err(HandlerError::Malformed(format!(
                "unsupported flavors method: {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FlavorEntry, FlavorsHandler};
    use crate::broker::{ControlAddress, RequestHandler, RequestMessage};
    use crate::cluster::FlavorRegistry;
    use crate::model::Flavor;
    use crate::transport::WireMessage;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn request(subject: &str) -> RequestMessage {
        RequestMessage {
            target: ControlAddress::FlavorListing,
            message: WireMessage {
                subject: Some(subject.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn list_returns_the_current_flavor_snapshot() {
        let registry = Arc::new(FlavorRegistry::new());
        registry.replace_all(BTreeMap::from([
            (
                "small-queue".to_string(),
                Flavor::new("small-queue", "queue-template", BTreeMap::new()),
            ),
            (
                "large-topic".to_string(),
                Flavor::new("large-topic", "topic-template", BTreeMap::new()),
            ),
        ]));
        let handler = FlavorsHandler::new(registry);

        let response = handler.handle(&request("list")).expect("list succeeds");
        let entries: Vec<FlavorEntry> =
            serde_json::from_slice(&response.body).expect("entry array body");

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|entry| entry.name == "small-queue" && entry.template_name == "queue-template"));
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let handler = FlavorsHandler::new(Arc::new(FlavorRegistry::new()));
        assert!(handler.handle(&request("purge")).is_err());
    }
}
