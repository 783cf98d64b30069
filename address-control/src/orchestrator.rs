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

//! Orchestration-API client seam: templates in, labeled objects out.

use crate::model::{AddressBinding, DestinationGroup};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Label keys stamped onto every generated object.
pub mod label_keys {
    /// Ownership label: which destination group an object belongs to.
    pub const GROUP_ID: &str = "group-id";
    /// Reverse-lookup label from config objects back to instance + group.
    pub const ADDRESS_CONFIG: &str = "address-config";
}

/// Well-known template parameter names.
pub mod template_parameter {
    pub const NAME: &str = "NAME";
    pub const INSTANCE: &str = "INSTANCE";
    pub const ADDRESS: &str = "ADDRESS";
}

/// Parameter set handed to template expansion.
///
/// The address binding stays tagged until it crosses this boundary; how a
/// reserved binding renders inside a template is the client's concern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateParameters {
    pub name: String,
    pub instance: String,
    pub address: AddressBinding,
    pub extra: BTreeMap<String, String>,
}

/// One orchestrator object produced by template expansion or by the
/// address-config factory.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceObject {
    pub kind: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub spec: Value,
}

impl ResourceObject {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            labels: BTreeMap::new(),
            spec: Value::Null,
        }
    }

    pub fn set_label(&mut self, key: &str, value: &str) {
        self.labels.insert(key.to_string(), value.to_string());
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Failure reported by the orchestration client.
#[derive(Debug)]
pub struct OrchestratorError {
    message: String,
}

impl OrchestratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for OrchestratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "orchestrator request failed: {}", self.message)
    }
}

impl Error for OrchestratorError {}

/// Client for the cluster orchestration API.
///
/// Calls are synchronous and potentially blocking; they are only ever made
/// from the handler worker pool, never from a connection actor.
pub trait OrchestratorClient: Send + Sync {
    /// Expands the named template with the given parameter set.
    fn process_template(
        &self,
        template_name: &str,
        parameters: &TemplateParameters,
    ) -> Result<Vec<ResourceObject>, OrchestratorError>;

    /// Builds the address-configuration object describing a group.
    fn create_address_config(
        &self,
        group: &DestinationGroup,
    ) -> Result<ResourceObject, OrchestratorError>;

    /// Submits one object to the orchestrator.
    fn create_object(&self, object: &ResourceObject) -> Result<(), OrchestratorError>;

    /// Removes one object from the orchestrator.
    fn delete_object(&self, object: &ResourceObject) -> Result<(), OrchestratorError>;
}
