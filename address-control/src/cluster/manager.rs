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

//! Address manager that materializes destination groups as clusters.

use crate::api::{AddressManager, ManagerError};
use crate::cluster::generator::{DestinationCluster, DestinationClusterGenerator};
use crate::model::DestinationGroup;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::info;

const COMPONENT: &str = "address_manager";

/// Owns the deployed destination groups and their backing clusters.
///
/// Deploying a new set is a reconcile: groups that appeared are generated
/// and created, groups that disappeared are torn down, unchanged groups are
/// left alone. All orchestrator traffic goes through the clusters produced
/// by the generator.
pub struct DeployedAddressManager {
    generator: DestinationClusterGenerator,
    deployed: Mutex<BTreeMap<String, DestinationCluster>>,
}

impl DeployedAddressManager {
    pub fn new(generator: DestinationClusterGenerator) -> Self {
        Self {
            generator,
            deployed: Mutex::new(BTreeMap::new()),
        }
    }
}

impl AddressManager for DeployedAddressManager {
    fn list_groups(&self) -> Result<Vec<DestinationGroup>, ManagerError> {
        let deployed = self.deployed.lock().expect("deployed set lock poisoned");
        Ok(deployed
            .values()
            .map(|cluster| cluster.group().clone())
            .collect())
    }

    fn deploy_groups(&self, groups: Vec<DestinationGroup>) -> Result<(), ManagerError> {
        let mut deployed = self.deployed.lock().expect("deployed set lock poisoned");

        let wanted: BTreeMap<String, DestinationGroup> = groups
            .into_iter()
            .map(|group| (group.group_id().to_string(), group))
            .collect();

        // Tear down groups that are no longer wanted.
        let gone: Vec<String> = deployed
            .keys()
            .filter(|group_id| !wanted.contains_key(*group_id))
            .cloned()
            .collect();
        for group_id in gone {
            if let Some(cluster) = deployed.remove(&group_id) {
                cluster
                    .delete()
                    .map_err(|err| ManagerError::new(err.to_string()))?;
                info!(
                    component = COMPONENT,
                    group_id = %group_id,
                    "deleted destination cluster"
                );
            }
        }

        // Bring up groups that appeared or changed.
        for (group_id, group) in wanted {
            let changed = match deployed.get(&group_id) {
                Some(cluster) => cluster.group() != &group,
                None => true,
            };
            if !changed {
                continue;
            }

            if let Some(previous) = deployed.remove(&group_id) {
                previous
                    .delete()
                    .map_err(|err| ManagerError::new(err.to_string()))?;
            }
            let cluster = self
                .generator
                .generate_cluster(&group)
                .map_err(|err| ManagerError::new(err.to_string()))?;
            cluster
                .create()
                .map_err(|err| ManagerError::new(err.to_string()))?;
            info!(
                component = COMPONENT,
                group_id = %group_id,
                objects = cluster.objects().len(),
                "created destination cluster"
            );
            deployed.insert(group_id, cluster);
        }
        Ok(())
    }

    fn delete_addresses(&self, addresses: &[String]) -> Result<(), ManagerError> {
        let remaining: Vec<DestinationGroup> = {
            let deployed = self.deployed.lock().expect("deployed set lock poisoned");
            deployed
                .values()
                .filter_map(|cluster| {
                    let group = cluster.group();
                    let kept: Vec<_> = group
                        .destinations()
                        .iter()
                        .filter(|destination| !addresses.contains(&destination.address))
                        .cloned()
                        .collect();
                    (!kept.is_empty())
                        .then(|| DestinationGroup::new(group.group_id(), kept))
                })
                .collect()
        };
        self.deploy_groups(remaining)
    }
}
