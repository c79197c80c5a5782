//! Deterministic names and labels for generated objects.

use crate::options::ConversionOptions;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use nic2gw_api::constants::{MANAGED_BY_LABEL, SOURCE_LABEL_SUFFIX};
use nic2gw_api::gateway::ListenerProtocol;
use std::collections::BTreeMap;

pub fn gateway_name(namespace: &str) -> String {
    format!("{namespace}-gateway")
}

pub fn http_route_name(owner: &str) -> String {
    format!("{owner}-httproute")
}

pub fn grpc_route_name(owner: &str) -> String {
    format!("{owner}-grpcroute")
}

pub fn redirect_route_name(owner: &str) -> String {
    format!("{owner}-redirect")
}

pub fn transport_route_name(owner: &str, protocol: ListenerProtocol) -> String {
    format!("{owner}-{protocol}route")
}

pub fn backend_tls_policy_name(service: &str, upstream: &str) -> String {
    format!("{service}-{upstream}-backend-tls")
}

/// Lowercases a hostname and makes it usable inside a listener name.
pub fn sanitize_hostname(host: &str) -> String {
    host.to_ascii_lowercase()
        .replace('*', "wildcard")
        .replace('.', "-")
}

/// `<protocol>-<port>[-<host>]`, shared by the gateway synthesizer and the
/// route parent references so both always agree.
pub fn listener_name(protocol: ListenerProtocol, port: u16, host: Option<&str>) -> String {
    match host.filter(|h| !h.is_empty()) {
        Some(host) => format!("{protocol}-{port}-{}", sanitize_hostname(host)),
        None => format!("{protocol}-{port}"),
    }
}

pub fn base_labels(options: &ConversionOptions, source: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), options.tool_name().clone()),
        (options.label_key(SOURCE_LABEL_SUFFIX), source.to_string()),
    ])
}

/// Base labels plus `<tool>.io/<owner_label_suffix>=<owner>`.
pub fn labels(
    options: &ConversionOptions,
    source: &str,
    owner_label_suffix: &str,
    owner: &str,
) -> BTreeMap<String, String> {
    let mut labels = base_labels(options, source);
    labels.insert(options.label_key(owner_label_suffix), owner.to_string());
    labels
}

pub fn object_meta(
    namespace: &str,
    name: impl Into<String>,
    labels: BTreeMap<String, String>,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}
