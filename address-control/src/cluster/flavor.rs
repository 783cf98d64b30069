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

//! Flavor resolution: repository seam and the in-memory registry.

use crate::model::Flavor;
use crate::observability::events;
use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

const COMPONENT: &str = "flavor_registry";

/// Default bound on how long a flavor lookup may wait for the flavor to
/// appear.
pub const DEFAULT_FLAVOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Flavor resolution failure.
#[derive(Debug)]
pub enum FlavorError {
    NotFound(String),
    Timeout(String),
}

impl Display for FlavorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FlavorError::NotFound(name) => write!(f, "no flavor named '{name}'"),
            FlavorError::Timeout(name) => {
                write!(f, "flavor '{name}' did not resolve within the timeout")
            }
        }
    }
}

impl Error for FlavorError {}

/// Read-only flavor reference data, resolved by name with a bounded wait.
///
/// `lookup` may block; it is only ever called from the handler worker pool.
pub trait FlavorRepository: Send + Sync {
    fn lookup(&self, name: &str, timeout: Duration) -> Result<Flavor, FlavorError>;

    fn snapshot(&self) -> Arc<BTreeMap<String, Flavor>>;
}

/// In-memory flavor store fed by an external flavor watch.
///
/// Reads go through an atomically swapped snapshot; the lock/condvar pair
/// exists only so bounded lookups can wait for a set replacement.
pub struct FlavorRegistry {
    snapshot: ArcSwap<BTreeMap<String, Flavor>>,
    wait_lock: Mutex<()>,
    changed: Condvar,
}

impl FlavorRegistry {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(BTreeMap::new()),
            wait_lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    /// Replaces the whole flavor set and wakes every pending lookup.
    pub fn replace_all(&self, flavors: BTreeMap<String, Flavor>) {
        let count = flavors.len();
        // Swapping under the wait lock keeps a concurrent lookup from
        // missing the wakeup between its snapshot read and its wait.
        let _guard = self.wait_lock.lock().expect("flavor wait lock poisoned");
        self.snapshot.store(Arc::new(flavors));
        self.changed.notify_all();

        info!(
            event = events::FLAVOR_SET_REPLACED,
            component = COMPONENT,
            count,
            "replaced flavor set"
        );
    }
}

impl FlavorRepository for FlavorRegistry {
    fn lookup(&self, name: &str, timeout: Duration) -> Result<Flavor, FlavorError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(flavor) = self.snapshot.load().get(name) {
                return Ok(flavor.clone());
            }

            let guard = self.wait_lock.lock().expect("flavor wait lock poisoned");
            if let Some(flavor) = self.snapshot.load().get(name) {
                return Ok(flavor.clone());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FlavorError::Timeout(name.to_string()));
            }
            let (_guard, _outcome) = self
                .changed
                .wait_timeout(guard, deadline - now)
                .expect("flavor wait lock poisoned");
        }
    }

    fn snapshot(&self) -> Arc<BTreeMap<String, Flavor>> {
        self.snapshot.load_full()
    }
}
