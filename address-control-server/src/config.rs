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

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) instance_config: InstanceConfig,
    pub(crate) control_endpoint_config: ControlEndpointConfig,
    pub(crate) config_endpoint_config: ConfigEndpointConfig,
    pub(crate) flavor_config: FlavorConfig,
    pub(crate) transport_config: TransportConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    pub(crate) id: String,
    pub(crate) namespace: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ControlEndpointConfig {
    pub(crate) port: u16,
    pub(crate) handler_workers: usize,
    pub(crate) handler_queue_size: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigEndpointConfig {
    pub(crate) port: u16,
    pub(crate) resource_addresses: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FlavorConfig {
    pub(crate) file_path: PathBuf,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    pub(crate) driver: AmqpDriver,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum AmqpDriver {
    NativeAmqp,
}

#[cfg(test)]
mod tests {
    use super::{AmqpDriver, Config};

    const SAMPLE: &str = r#"{
        instance_config: { id: "default", namespace: "default" },
        control_endpoint_config: { port: 5672, handler_workers: 4, handler_queue_size: 64 },
        config_endpoint_config: { port: 5673, resource_addresses: ["addresses", "pods"] },
        flavor_config: { file_path: "flavors.json" },
        transport_config: { driver: "NativeAmqp" },
    }"#;

    #[test]
    fn parses_the_sample_config() {
        let config: Config = json5::from_str(SAMPLE).expect("sample config parses");

        assert_eq!(config.instance_config.id, "default");
        assert_eq!(config.control_endpoint_config.port, 5672);
        assert_eq!(
            config.config_endpoint_config.resource_addresses,
            vec!["addresses".to_string(), "pods".to_string()]
        );
        assert!(matches!(
            config.transport_config.driver,
            AmqpDriver::NativeAmqp
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let with_extra = SAMPLE.replacen(
            "instance_config: {",
            "instance_config: { surprise: true,",
            1,
        );
        assert!(json5::from_str::<Config>(&with_extra).is_err());
    }
}
