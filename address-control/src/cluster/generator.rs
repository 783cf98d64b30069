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

//! Turns a destination group into the orchestrator objects that back it.

use crate::cluster::flavor::{FlavorError, FlavorRepository, DEFAULT_FLAVOR_TIMEOUT};
use crate::model::{
    sanitize_name, AddressBinding, Destination, DestinationGroup, Flavor, InstanceId,
};
use crate::observability::events;
use crate::orchestrator::{
    label_keys, OrchestratorClient, OrchestratorError, ResourceObject, TemplateParameters,
};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "cluster_generator";

/// Destination-cluster generation failure; aborts that single group.
#[derive(Debug)]
pub enum ClusterError {
    EmptyGroup(String),
    MixedGroup(String),
    FlavorResolution { group: String, source: FlavorError },
    Orchestrator(OrchestratorError),
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::EmptyGroup(group) => {
                write!(f, "destination group '{group}' has no members")
            }
            ClusterError::MixedGroup(group) => write!(
                f,
                "destination group '{group}' mixes flavors or delivery semantics"
            ),
            ClusterError::FlavorResolution { group, source } => {
                write!(f, "flavor resolution failed for group '{group}': {source}")
            }
            ClusterError::Orchestrator(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClusterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClusterError::FlavorResolution { source, .. } => Some(source),
            ClusterError::Orchestrator(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrchestratorError> for ClusterError {
    fn from(err: OrchestratorError) -> Self {
        ClusterError::Orchestrator(err)
    }
}

/// The materialized backing cluster for one destination group.
///
/// Ownership of the expanded objects passes to the caller; `create` and
/// `delete` submit or remove them through the orchestration client.
pub struct DestinationCluster {
    group: DestinationGroup,
    objects: Vec<ResourceObject>,
    client: Arc<dyn OrchestratorClient>,
}

impl DestinationCluster {
    pub fn group(&self) -> &DestinationGroup {
        &self.group
    }

    pub fn objects(&self) -> &[ResourceObject] {
        &self.objects
    }

    pub fn create(&self) -> Result<(), OrchestratorError> {
        for object in &self.objects {
            self.client.create_object(object)?;
        }
        Ok(())
    }

    pub fn delete(&self) -> Result<(), OrchestratorError> {
        for object in &self.objects {
            self.client.delete_object(object)?;
        }
        Ok(())
    }
}

/// Generates destination clusters by expanding flavor templates.
pub struct DestinationClusterGenerator {
    instance: InstanceId,
    client: Arc<dyn OrchestratorClient>,
    flavors: Arc<dyn FlavorRepository>,
    flavor_timeout: Duration,
}

impl DestinationClusterGenerator {
    pub fn new(
        instance: InstanceId,
        client: Arc<dyn OrchestratorClient>,
        flavors: Arc<dyn FlavorRepository>,
    ) -> Self {
        Self {
            instance,
            client,
            flavors,
            flavor_timeout: DEFAULT_FLAVOR_TIMEOUT,
        }
    }

    pub fn with_flavor_timeout(mut self, timeout: Duration) -> Self {
        self.flavor_timeout = timeout;
        self
    }

    /// Generates the backing cluster for one destination group.
    ///
    /// The group must be homogeneous; a representative member then drives
    /// flavor resolution and template expansion. The address-configuration
    /// object describing the group itself is always appended, so the result
    /// is never empty.
    pub fn generate_cluster(
        &self,
        group: &DestinationGroup,
    ) -> Result<DestinationCluster, ClusterError> {
        let representative = Self::validate_homogeneous(group)?;

        let mut objects = match representative.flavor.as_deref() {
            Some(flavor_name) => {
                let flavor = self
                    .flavors
                    .lookup(flavor_name, self.flavor_timeout)
                    .map_err(|source| {
                        warn!(
                            event = events::FLAVOR_WAIT_TIMEOUT,
                            component = COMPONENT,
                            group_id = group.group_id(),
                            flavor = flavor_name,
                            err = %source,
                            "flavor did not resolve"
                        );
                        ClusterError::FlavorResolution {
                            group: group.group_id().to_string(),
                            source,
                        }
                    })?;
                self.expand_template(group, representative, &flavor)?
            }
            None => Vec::new(),
        };

        objects.push(self.client.create_address_config(group)?);

        debug!(
            event = events::CLUSTER_GENERATE_OK,
            component = COMPONENT,
            group_id = group.group_id(),
            objects = objects.len(),
            "generated destination cluster"
        );

        Ok(DestinationCluster {
            group: group.clone(),
            objects,
            client: self.client.clone(),
        })
    }

    /// Every member must agree on flavor and delivery semantics; the first
    /// member then stands in for the group.
    fn validate_homogeneous(group: &DestinationGroup) -> Result<&Destination, ClusterError> {
        let mut members = group.destinations().iter();
        let Some(first) = members.next() else {
            return Err(ClusterError::EmptyGroup(group.group_id().to_string()));
        };

        for member in members {
            if member.flavor != first.flavor
                || member.store_and_forward != first.store_and_forward
                || member.multicast != first.multicast
            {
                return Err(ClusterError::MixedGroup(group.group_id().to_string()));
            }
        }
        Ok(first)
    }

    fn expand_template(
        &self,
        group: &DestinationGroup,
        representative: &Destination,
        flavor: &Flavor,
    ) -> Result<Vec<ResourceObject>, ClusterError> {
        // A group of one whose id equals its address is a scalable
        // single-address queue; only then may the cluster carry the literal
        // address as its identity.
        let address = if group.group_id() == representative.address
            && group.destinations().len() == 1
        {
            AddressBinding::Literal(representative.address.clone())
        } else {
            AddressBinding::Reserved
        };

        let parameters = TemplateParameters {
            name: sanitize_name(group.group_id()),
            instance: sanitize_name(self.instance.id()),
            address,
            extra: flavor.template_parameters().clone(),
        };

        let mut objects = self
            .client
            .process_template(flavor.template_name(), &parameters)?;

        let group_label = sanitize_name(group.group_id());
        let config_label = sanitize_name(&format!(
            "address-config-{}-{}",
            self.instance.id(),
            group.group_id()
        ));
        for object in &mut objects {
            object.set_label(label_keys::GROUP_ID, &group_label);
            object.set_label(label_keys::ADDRESS_CONFIG, &config_label);
        }
        Ok(objects)
    }
}
