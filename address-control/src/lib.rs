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

//! # address-control
//!
//! `address-control` is the control plane of a multi-tenant messaging
//! platform running atop a cluster orchestration API. It serves two AMQP
//! endpoints:
//!
//! - the **control endpoint** routes address/flavor management requests to
//!   registered handlers and delivers responses over dynamically-addressed
//!   reply links ([`session::ControlBehavior`], [`broker`]);
//! - the **configuration endpoint** streams filtered snapshots of watched
//!   cluster resources to subscribers and re-pushes whenever the matching
//!   set changes ([`session::SubscribeBehavior`], [`resources`]).
//!
//! Address creation materializes orchestrator objects through the
//! template-driven [`cluster::DestinationClusterGenerator`].
//!
//! ## Transport seam
//!
//! AMQP framing is a collaborator. A driver hands each accepted connection
//! over as a channel pair ([`transport::AcceptedConnection`]); the session
//! layer owns everything above that: lifecycle, reply routing, filtered
//! subscription pushes. Binaries plug a concrete driver in through
//! [`transport::AmqpListener`].
//!
//! ## Generating a destination cluster
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use address_control::cluster::{DestinationClusterGenerator, FlavorRegistry};
//! use address_control::model::{Destination, DestinationGroup, Flavor, InstanceId};
//!
//! # mod mock_orchestrator {
//! #     use address_control::model::DestinationGroup;
//! #     use address_control::orchestrator::{
//! #         OrchestratorClient, OrchestratorError, ResourceObject, TemplateParameters,
//! #     };
//! #     pub struct MockClient;
//! #     impl OrchestratorClient for MockClient {
//! #         fn process_template(
//! #             &self,
//! #             _template_name: &str,
//! #             parameters: &TemplateParameters,
//! #         ) -> Result<Vec<ResourceObject>, OrchestratorError> {
//! #             Ok(vec![ResourceObject::new(
//! #                 "Deployment",
//! #                 &format!("{}-broker", parameters.name),
//! #             )])
//! #         }
//! #         fn create_address_config(
//! #             &self,
//! #             group: &DestinationGroup,
//! #         ) -> Result<ResourceObject, OrchestratorError> {
//! #             Ok(ResourceObject::new(
//! #                 "ConfigMap",
//! #                 &format!("address-config-{}", group.group_id()),
//! #             ))
//! #         }
//! #         fn create_object(&self, _object: &ResourceObject) -> Result<(), OrchestratorError> {
//! #             Ok(())
//! #         }
//! #         fn delete_object(&self, _object: &ResourceObject) -> Result<(), OrchestratorError> {
//! #             Ok(())
//! #         }
//! #     }
//! # }
//!
//! let flavors = Arc::new(FlavorRegistry::new());
//! flavors.replace_all(BTreeMap::from([(
//!     "small-queue".to_string(),
//!     Flavor::new("small-queue", "queue-template", BTreeMap::new()),
//! )]));
//!
//! let generator = DestinationClusterGenerator::new(
//!     InstanceId::with_id_and_namespace("default", "default"),
//!     Arc::new(mock_orchestrator::MockClient),
//!     flavors,
//! );
//!
//! let group = DestinationGroup::new(
//!     "orders",
//!     vec![Destination::queue("orders", "small-queue")],
//! );
//! let cluster = generator.generate_cluster(&group).unwrap();
//!
//! // Template objects plus the address-config object describing the group.
//! assert_eq!(cluster.objects().len(), 2);
//! ```
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global
//! subscriber. Binaries are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

pub mod api;
pub mod broker;
pub mod cluster;
pub mod model;
#[doc(hidden)]
pub mod observability;
pub mod orchestrator;
pub mod resources;
pub mod session;
pub mod transport;

pub use broker::{ControlAddress, ReplyRegistry, RequestBroker};
pub use cluster::DestinationClusterGenerator;
pub use resources::{DatabaseMap, ResourceDatabase};
pub use session::{ControlBehavior, EndpointServer, SubscribeBehavior};
