// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared fixtures for reconciler unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use kube::api::ObjectMeta;

use crate::client::{LoadBalancerClient, SecretStore, SecurityListClient};
use crate::config::{LoadBalancerConfig, ProviderConfig};
use crate::constants::{RESOURCE_CERTIFICATE, RESOURCE_LOAD_BALANCER, RESOURCE_SECRET};
use crate::context::Context;
use crate::lb_errors::{LoadBalancerError, Result};
use crate::model::{BackendSet, Certificate, IpAddress, Listener, LoadBalancer};
use crate::security_rules::SecurityRuleBatch;
use crate::reconcilers::desired::{backend_sets, listeners, ssl_config};
use crate::reconcilers::spec::LoadBalancerSpec;

pub const TEST_UID: &str = "8b0f1e4c-3c6e-4d39-9a7f-2f1e5d6c7b8a";

pub fn create_provider_config() -> ProviderConfig {
    ProviderConfig {
        load_balancer: LoadBalancerConfig {
            subnet1: "ocid1.subnet.default1".to_string(),
            subnet2: "ocid1.subnet.default2".to_string(),
        },
    }
}

pub fn create_service_port(protocol: &str, port: i32, node_port: i32) -> ServicePort {
    ServicePort {
        protocol: Some(protocol.to_string()),
        port,
        node_port: Some(node_port),
        ..Default::default()
    }
}

/// A `LoadBalancer` service named `frontend` in namespace `web`.
pub fn create_service(ports: Vec<ServicePort>, annotations: &[(&str, &str)]) -> Service {
    let annotations: BTreeMap<String, String> = annotations
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some("frontend".to_string()),
            namespace: Some("web".to_string()),
            uid: Some(TEST_UID.to_string()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            ports: Some(ports),
            session_affinity: Some("None".to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn create_spec(service: &Service, node_ips: &[&str]) -> LoadBalancerSpec {
    LoadBalancerSpec::new(
        &create_provider_config(),
        service,
        node_ips.iter().map(|ip| (*ip).to_string()).collect(),
    )
    .unwrap()
}

/// A remote load balancer already converged onto `spec`.
pub fn create_converged_load_balancer(spec: &LoadBalancerSpec) -> LoadBalancer {
    let ssl = ssl_config(spec, &spec.name).unwrap();
    LoadBalancer {
        id: "ocid1.loadbalancer.test".to_string(),
        display_name: spec.name.clone(),
        shape_name: spec.shape.clone(),
        subnet_ids: spec.subnets.to_vec(),
        ip_addresses: vec![IpAddress {
            ip_address: "129.146.0.1".to_string(),
            is_public: true,
        }],
        backend_sets: backend_sets(spec),
        listeners: listeners(spec, &ssl),
    }
}

/// Remote API that records every call in order.
///
/// Only load balancers and certificates are stored; sub-resource calls are
/// recorded without changing the stored load balancer. Multi-pass scenarios
/// live in the integration tests. Work request ids are `"wr/<call>"`, so
/// awaits show up in the log as `"await wr/<call>"`.
#[derive(Default)]
pub struct FakeCloud {
    pub load_balancers: Mutex<BTreeMap<String, LoadBalancer>>,
    pub certificates: Mutex<BTreeSet<String>>,
    pub calls: Mutex<Vec<String>>,
    /// Calls starting with this prefix fail
    pub fail_on: Mutex<Option<String>>,
}

impl FakeCloud {
    pub fn with_load_balancer(lb: LoadBalancer) -> Self {
        let cloud = Self::default();
        cloud
            .load_balancers
            .lock()
            .unwrap()
            .insert(lb.display_name.clone(), lb);
        cloud
    }

    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that changed remote state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("get_") && !call.starts_with("await "))
            .collect()
    }

    pub fn load_balancer(&self, name: &str) -> Option<LoadBalancer> {
        self.load_balancers.lock().unwrap().get(name).cloned()
    }

    fn record(&self, call: String) -> Result<String> {
        self.calls.lock().unwrap().push(call.clone());
        match self.fail_on.lock().unwrap().as_deref() {
            Some(prefix) if call.starts_with(prefix) => {
                Err(LoadBalancerError::remote(call, "503 Service Unavailable"))
            }
            _ => Ok(format!("wr/{call}")),
        }
    }
}

#[async_trait::async_trait]
impl LoadBalancerClient for FakeCloud {
    async fn get_load_balancer_by_name(&self, name: &str) -> Result<LoadBalancer> {
        self.record(format!("get_load_balancer {name}"))?;
        self.load_balancer(name)
            .ok_or_else(|| LoadBalancerError::not_found(RESOURCE_LOAD_BALANCER, name))
    }

    async fn create_and_await_load_balancer(
        &self,
        name: &str,
        shape: &str,
        subnets: &[String],
    ) -> Result<LoadBalancer> {
        self.record(format!("create_load_balancer {name}"))?;
        let lb = LoadBalancer {
            id: format!("ocid1.loadbalancer.{name}"),
            display_name: name.to_string(),
            shape_name: shape.to_string(),
            subnet_ids: subnets.to_vec(),
            ip_addresses: vec![IpAddress {
                ip_address: "129.146.0.1".to_string(),
                is_public: true,
            }],
            ..Default::default()
        };
        self.load_balancers
            .lock()
            .unwrap()
            .insert(name.to_string(), lb.clone());
        Ok(lb)
    }

    async fn delete_load_balancer(&self, id: &str) -> Result<String> {
        let work_request = self.record(format!("delete_load_balancer {id}"))?;
        self.load_balancers.lock().unwrap().retain(|_, lb| lb.id != id);
        Ok(work_request)
    }

    async fn await_work_request(&self, id: &str) -> Result<()> {
        self.record(format!("await {id}")).map(|_| ())
    }

    async fn create_and_await_backend_set(
        &self,
        _lb: &LoadBalancer,
        backend_set: &BackendSet,
    ) -> Result<BackendSet> {
        self.record(format!("create_backend_set {}", backend_set.name))?;
        Ok(backend_set.clone())
    }

    async fn delete_backend_set(&self, _lb_id: &str, name: &str) -> Result<String> {
        self.record(format!("delete_backend_set {name}"))
    }

    async fn create_and_await_listener(&self, _lb: &LoadBalancer, listener: &Listener) -> Result<()> {
        self.record(format!("create_listener {}", listener.name))
            .map(|_| ())
    }

    async fn delete_listener(&self, _lb_id: &str, name: &str) -> Result<String> {
        self.record(format!("delete_listener {name}"))
    }

    async fn create_backend(
        &self,
        _lb_id: &str,
        backend_set_name: &str,
        ip_address: &str,
        port: i32,
    ) -> Result<String> {
        self.record(format!("create_backend {backend_set_name} {ip_address}:{port}"))
    }

    async fn delete_backend(&self, _lb_id: &str, backend_set_name: &str, target: &str) -> Result<String> {
        self.record(format!("delete_backend {backend_set_name} {target}"))
    }

    async fn get_certificate_by_name(&self, lb_id: &str, name: &str) -> Result<Certificate> {
        self.record(format!("get_certificate {name}"))?;
        if self
            .certificates
            .lock()
            .unwrap()
            .contains(&format!("{lb_id}/{name}"))
        {
            Ok(Certificate {
                certificate_name: name.to_string(),
                public_certificate: String::new(),
            })
        } else {
            Err(LoadBalancerError::not_found(RESOURCE_CERTIFICATE, name))
        }
    }

    async fn create_and_await_certificate(
        &self,
        lb: &LoadBalancer,
        name: &str,
        _certificate: &str,
        _private_key: &str,
    ) -> Result<()> {
        self.record(format!("create_certificate {name}"))?;
        self.certificates
            .lock()
            .unwrap()
            .insert(format!("{}/{}", lb.id, name));
        Ok(())
    }
}

/// Secrets keyed by `"namespace/name"`; every lookup is recorded.
#[derive(Default)]
pub struct FakeSecrets {
    pub secrets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeSecrets {
    pub fn with_tls_secret(namespace: &str, name: &str, fields: &[&str]) -> Self {
        let data = fields
            .iter()
            .map(|field| ((*field).to_string(), format!("pem for {field}").into_bytes()))
            .collect();
        Self {
            secrets: BTreeMap::from([(format!("{namespace}/{name}"), data)]),
            lookups: Mutex::default(),
        }
    }
}

#[async_trait::async_trait]
impl SecretStore for FakeSecrets {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, Vec<u8>>> {
        let key = format!("{namespace}/{name}");
        self.lookups.lock().unwrap().push(key.clone());
        self.secrets
            .get(&key)
            .cloned()
            .ok_or_else(|| LoadBalancerError::not_found(RESOURCE_SECRET, key))
    }
}

/// Records `(ports opened, ports closed)` of every save.
#[derive(Default)]
pub struct FakeSecurityLists {
    pub saves: Mutex<Vec<(Vec<i32>, Vec<i32>)>>,
}

#[async_trait::async_trait]
impl SecurityListClient for FakeSecurityLists {
    async fn save(&self, batch: &SecurityRuleBatch) -> Result<()> {
        self.saves.lock().unwrap().push((
            batch.ports_to_open().collect(),
            batch.ports_to_close().collect(),
        ));
        Ok(())
    }
}

pub fn create_context(
    cloud: &Arc<FakeCloud>,
    secrets: FakeSecrets,
    security_lists: &Arc<FakeSecurityLists>,
) -> Context {
    Context::new(
        create_provider_config(),
        Arc::clone(cloud) as Arc<dyn LoadBalancerClient>,
        Arc::new(secrets),
        Arc::clone(security_lists) as Arc<dyn SecurityListClient>,
    )
}
