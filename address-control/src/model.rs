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

//! Domain model for messaging destinations, destination groups and flavors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Identity of the platform instance that owns a set of destinations.
///
/// The id doubles as the orchestrator namespace for single-instance
/// deployments, so both halves are kept explicit.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct InstanceId {
    id: String,
    namespace: String,
}

impl InstanceId {
    pub fn with_id_and_namespace(id: &str, namespace: &str) -> Self {
        Self {
            id: id.to_string(),
            namespace: namespace.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A single addressable messaging endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Destination {
    pub address: String,
    pub flavor: Option<String>,
    pub store_and_forward: bool,
    pub multicast: bool,
}

impl Destination {
    pub fn new(
        address: &str,
        flavor: Option<&str>,
        store_and_forward: bool,
        multicast: bool,
    ) -> Self {
        Self {
            address: address.to_string(),
            flavor: flavor.map(str::to_string),
            store_and_forward,
            multicast,
        }
    }

    /// Shorthand for the common queue case: store-and-forward, unicast.
    pub fn queue(address: &str, flavor: &str) -> Self {
        Self::new(address, Some(flavor), true, false)
    }
}

/// Destinations co-deployed as one backing cluster.
///
/// Members are expected to share flavor and store/multicast semantics;
/// `generate_cluster` validates this rather than assuming it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DestinationGroup {
    group_id: String,
    destinations: Vec<Destination>,
}

impl DestinationGroup {
    pub fn new(group_id: &str, destinations: Vec<Destination>) -> Self {
        Self {
            group_id: group_id.to_string(),
            destinations,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }
}

/// Named, reusable template-parameter bundle describing how a class of
/// destinations is deployed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Flavor {
    name: String,
    template_name: String,
    #[serde(default)]
    template_parameters: BTreeMap<String, String>,
}

impl Flavor {
    pub fn new(
        name: &str,
        template_name: &str,
        template_parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            template_name: template_name.to_string(),
            template_parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn template_parameters(&self) -> &BTreeMap<String, String> {
        &self.template_parameters
    }
}

/// How a generated cluster binds to a messaging address.
///
/// `Literal` is the scalable single-address case; `Reserved` signals that
/// the cluster backs multiple addresses and must not expose any one of them
/// as its identity. Carrying this as a tagged value keeps the generator and
/// the template renderer from sharing a magic string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressBinding {
    Literal(String),
    Reserved,
}

/// Maps a free-form identifier onto the charset accepted for orchestrator
/// object names and label values: lower-case, `[a-z0-9.-]`, everything else
/// replaced with `-`.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' | '.' | '-' => ch,
            _ => '-',
        })
        .collect()
}
