// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idempotent TLS certificate provisioning on a remote load balancer.
//!
//! Key material comes from a Kubernetes TLS secret named by the
//! `bmcs-load-balancer-tls-secret` service annotation.

use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::annotations::LOAD_BALANCER_TLS_SECRET;
use crate::client::{LoadBalancerClient, SecretStore};
use crate::constants::{RESOURCE_CERTIFICATE, SSL_CERTIFICATE_FILE_NAME, SSL_PRIVATE_KEY_FILE_NAME};
use crate::lb_errors::{LoadBalancerError, Result};
use crate::metrics;
use crate::model::LoadBalancer;

/// Make sure a certificate called `name` exists on `lb`.
///
/// Returns immediately when the certificate is already installed. Otherwise
/// reads `tls.crt` and `tls.key` from the secret referenced by the service's
/// TLS secret annotation and uploads them.
///
/// # Arguments
///
/// * `client` - Remote load balancer API
/// * `secrets` - Source of the TLS secret
/// * `name` - Certificate name
/// * `service` - Service carrying the TLS secret annotation
/// * `lb` - Remote load balancer to install the certificate on
///
/// # Errors
///
/// - [`LoadBalancerError::MissingAnnotation`] if the annotation is absent
/// - [`LoadBalancerError::MissingSecretField`] if either key is missing from the secret
/// - any non-`NotFound` lookup error, secret error or create error as returned
pub async fn ensure_ssl_certificate(
    client: &dyn LoadBalancerClient,
    secrets: &dyn SecretStore,
    name: &str,
    service: &Service,
    lb: &LoadBalancer,
) -> Result<()> {
    match client.get_certificate_by_name(&lb.id, name).await {
        Ok(_) => {
            debug!(
                "Certificate {} already exists on load balancer {}",
                name, lb.display_name
            );
            return Ok(());
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let secret_ref = service
        .annotations()
        .get(LOAD_BALANCER_TLS_SECRET)
        .ok_or_else(|| LoadBalancerError::MissingAnnotation {
            annotation: LOAD_BALANCER_TLS_SECRET.to_string(),
        })?;

    let service_namespace = service.namespace().unwrap_or_default();
    let (namespace, secret_name) = parse_secret_reference(secret_ref, &service_namespace);

    let (certificate, private_key) = read_tls_secret(secrets, namespace, secret_name).await?;

    client
        .create_and_await_certificate(lb, name, &certificate, &private_key)
        .await?;
    metrics::record_remote_created(RESOURCE_CERTIFICATE);

    info!(
        "Created certificate {} on load balancer {}",
        name, lb.display_name
    );
    Ok(())
}

/// Split a `[namespace/]name` secret reference.
///
/// A bare name or an empty namespace resolves in `default_namespace`.
/// Segments after the second `/` are ignored.
#[must_use]
pub fn parse_secret_reference<'a>(
    reference: &'a str,
    default_namespace: &'a str,
) -> (&'a str, &'a str) {
    let mut fields = reference.split('/');
    let (namespace, name) = match (fields.next(), fields.next()) {
        (Some(namespace), Some(name)) => (namespace, name),
        _ => ("", reference),
    };

    if namespace.is_empty() {
        (default_namespace, name)
    } else {
        (namespace, name)
    }
}

/// Fetch the PEM certificate and private key from a TLS secret.
async fn read_tls_secret(
    secrets: &dyn SecretStore,
    namespace: &str,
    name: &str,
) -> Result<(String, String)> {
    let data = secrets.get_secret(namespace, name).await?;

    let field = |key: &str| -> Result<String> {
        let bytes = data
            .get(key)
            .ok_or_else(|| LoadBalancerError::MissingSecretField {
                field: key.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        String::from_utf8(bytes.clone()).map_err(|e| LoadBalancerError::SecretLookup {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: format!("{key} is not valid UTF-8: {e}"),
        })
    };

    Ok((
        field(SSL_CERTIFICATE_FILE_NAME)?,
        field(SSL_PRIVATE_KEY_FILE_NAME)?,
    ))
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
