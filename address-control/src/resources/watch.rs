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

//! Watch-source seam and the pump feeding change batches into a database.

use crate::observability::events;
use crate::resources::database::ResourceDatabase;
use crate::resources::record::ResourceChangeSet;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const COMPONENT: &str = "watch_pump";

/// Backing store change feed. Assumed infinite; when it ends, reconnection
/// is the collaborator's problem, not this crate's.
#[async_trait]
pub trait WatchSource: Send + 'static {
    async fn next_change(&mut self) -> Option<ResourceChangeSet>;
}

/// Drives one watch source into one resource database until the source
/// ends. The pump runs on its own task, so pushes originating here are
/// marshalled to each link via the connection action channels like any
/// other write.
pub fn spawn_watch_pump<S>(database: Arc<ResourceDatabase>, mut source: S) -> JoinHandle<()>
where
    S: WatchSource,
{
    tokio::spawn(async move {
        while let Some(change) = source.next_change().await {
            database.apply_change(change).await;
        }
        info!(
            event = events::WATCH_SOURCE_ENDED,
            component = COMPONENT,
            address = %database.address(),
            "watch source ended; database frozen at last applied state"
        );
    })
}
