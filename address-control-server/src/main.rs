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

mod config;

use crate::config::{AmqpDriver, Config};
use address_control::api::FlavorsHandler;
use address_control::broker::{ControlAddress, HandlerPool, ReplyRegistry, RequestBroker};
use address_control::cluster::FlavorRepository;
use address_control::resources::{DatabaseMap, JsonSnapshotEncoder, ResourceDatabase};
use address_control::session::{ControlBehavior, EndpointBehavior, SubscribeBehavior};
use clap::Parser;
use flavor_static_file::FlavorStaticFile;
use std::error::Error;
use std::fs;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command()]
struct ServerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = ServerArgs::parse();

    let contents = fs::read_to_string(&args.config)
        .map_err(|err| format!("unable to read config file '{}': {err}", args.config))?;
    let config: Config = json5::from_str(&contents)
        .map_err(|err| format!("unable to parse config file '{}': {err}", args.config))?;

    let flavors: Arc<dyn FlavorRepository> = Arc::new(
        FlavorStaticFile::from_file(&config.flavor_config.file_path)
            .map_err(|err| format!("unable to load flavor file: {err}"))?,
    );

    let registry = Arc::new(ReplyRegistry::new());
    let mut broker = RequestBroker::new(
        registry.clone(),
        HandlerPool::new(
            config.control_endpoint_config.handler_workers,
            config.control_endpoint_config.handler_queue_size,
        ),
    );
    broker.register_handler(
        ControlAddress::FlavorListing,
        Arc::new(FlavorsHandler::new(flavors.clone())),
    );
    // The address-management handler needs an orchestration-API client
    // behind it (DeployedAddressManager); it is registered by the client
    // integration once one is configured.
    let control_behavior = Arc::new(ControlBehavior::new(registry, Arc::new(broker)));

    let databases = Arc::new(DatabaseMap::new(
        config
            .config_endpoint_config
            .resource_addresses
            .iter()
            .map(|address| Arc::new(ResourceDatabase::new(address))),
    ));
    let subscribe_behavior = Arc::new(SubscribeBehavior::new(
        databases,
        Arc::new(JsonSnapshotEncoder),
    ));

    info!(
        instance = %config.instance_config.id,
        namespace = %config.instance_config.namespace,
        control_container = control_behavior.container_id(),
        config_container = subscribe_behavior.container_id(),
        flavors = flavors.snapshot().len(),
        "control plane assembled"
    );

    match config.transport_config.driver {
        AmqpDriver::NativeAmqp => {
            // Reserved mode for this integration phase: fail fast instead of
            // pretending to listen.
            Err(format!(
                "transport driver 'NativeAmqp' is reserved: the native AMQP 1.0 listener \
                 integration is deferred, so ports {} and {} were not bound. Plug an \
                 AmqpListener driver into EndpointServer::serve to go live.",
                config.control_endpoint_config.port, config.config_endpoint_config.port
            )
            .into())
        }
    }
}
