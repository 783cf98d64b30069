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

//! Default JSON snapshot encoding used by the server wiring.

use crate::resources::record::{ResourceRecord, SnapshotEncoder};
use crate::transport::WireMessage;
use serde_json::{json, Value};

/// Encodes a snapshot as a JSON object keyed by record name.
pub struct JsonSnapshotEncoder;

impl SnapshotEncoder for JsonSnapshotEncoder {
    fn encode(&self, records: &[&ResourceRecord]) -> WireMessage {
        let body: Value = records
            .iter()
            .map(|record| {
                (
                    record.name.clone(),
                    json!({
                        "labels": record.labels,
                        "attributes": record.attributes,
                        "payload": record.payload,
                    }),
                )
            })
            .collect::<serde_json::Map<String, Value>>()
            .into();

        WireMessage {
            subject: Some("snapshot".to_string()),
            body: body.to_string().into_bytes(),
            ..Default::default()
        }
    }
}
