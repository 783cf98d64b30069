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

//! Canonical structured field keys and value-format helpers.

use crate::transport::WireMessage;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const CONNECTION_ID: &str = "connection_id";
pub const LINK_ID: &str = "link_id";
pub const ADDRESS: &str = "address";
pub const REPLY_TO: &str = "reply_to";
pub const SUBJECT: &str = "subject";
pub const GROUP_ID: &str = "group_id";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";

pub fn format_reply_to(message: &WireMessage) -> String {
    message
        .reply_to
        .clone()
        .unwrap_or_else(|| NONE.to_string())
}

pub fn format_subject(message: &WireMessage) -> String {
    message.subject.clone().unwrap_or_else(|| NONE.to_string())
}

pub fn format_optional(value: Option<&str>) -> String {
    value.unwrap_or(NONE).to_string()
}
