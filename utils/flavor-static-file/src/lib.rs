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

//! Flavor repository backed by a static JSON file.
//!
//! Intended for development deployments where the flavor set is fixed at
//! startup instead of being fed by a live flavor watch.

use address_control::cluster::{FlavorError, FlavorRepository};
use address_control::model::Flavor;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FlavorFileEntry {
    template_name: String,
    #[serde(default)]
    template_parameters: BTreeMap<String, String>,
}

/// Failure loading the flavor file.
#[derive(Debug)]
pub enum FlavorFileError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for FlavorFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FlavorFileError::Io(err) => write!(f, "unable to read flavor file: {err}"),
            FlavorFileError::Parse(err) => write!(f, "unable to parse flavor file: {err}"),
        }
    }
}

impl Error for FlavorFileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FlavorFileError::Io(err) => Some(err),
            FlavorFileError::Parse(err) => Some(err),
        }
    }
}

/// Read-only flavor set loaded once from a JSON file.
pub struct FlavorStaticFile {
    flavors: Arc<BTreeMap<String, Flavor>>,
}

impl FlavorStaticFile {
    /// Loads the flavor set from a JSON file mapping flavor names to their
    /// template reference.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlavorFileError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(FlavorFileError::Io)?;
        let loaded = Self::parse(&contents)?;
        info!(
            path = %path.as_ref().display(),
            count = loaded.flavors.len(),
            "loaded static flavor set"
        );
        Ok(loaded)
    }

    pub fn parse(contents: &str) -> Result<Self, FlavorFileError> {
        let entries: BTreeMap<String, FlavorFileEntry> =
            serde_json::from_str(contents).map_err(FlavorFileError::Parse)?;
        let flavors = entries
            .into_iter()
            .map(|(name, entry)| {
                let flavor = Flavor::new(&name, &entry.template_name, entry.template_parameters);
                (name, flavor)
            })
            .collect();
        Ok(Self {
            flavors: Arc::new(flavors),
        })
    }
}

impl FlavorRepository for FlavorStaticFile {
    /// The set is fixed, so there is nothing to wait for: a missing flavor
    /// fails immediately regardless of the allowed timeout.
    fn lookup(&self, name: &str, _timeout: Duration) -> Result<Flavor, FlavorError> {
        self.flavors
            .get(name)
            .cloned()
            .ok_or_else(|| FlavorError::NotFound(name.to_string()))
    }

    fn snapshot(&self) -> Arc<BTreeMap<String, Flavor>> {
        self.flavors.clone()
    }
}
