//! `k8s.nginx.org/v1` resources consumed by the converter.
//!
//! Field names follow the NGINX Ingress Controller CRDs, including the
//! hyphenated legacy spellings (`lb-method`, `http-snippets`, ...).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Default, CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "VirtualServer",
    group = "k8s.nginx.org",
    version = "v1",
    namespaced,
    shortname = "vs"
)]
#[kube(derive = "Default")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(default)]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener: Option<VirtualServerListener>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,

    #[serde(default)]
    pub gunzip: bool,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "externalDNS")]
    pub external_dns: Option<ExternalDns>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dos: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Upstream>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,

    #[serde(default, rename = "http-snippets", skip_serializing_if = "String::is_empty")]
    pub http_snippets: String,

    #[serde(default, rename = "server-snippets", skip_serializing_if = "String::is_empty")]
    pub server_snippets: String,

    #[serde(default)]
    pub internal_route: bool,
}

#[derive(Default, CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "VirtualServerRoute",
    group = "k8s.nginx.org",
    version = "v1",
    namespaced,
    shortname = "vsr"
)]
#[kube(derive = "Default")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerRouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(default)]
    pub host: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Upstream>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subroutes: Vec<Route>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct VirtualServerListener {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<TlsRedirect>,

    #[serde(default, rename = "cert-manager", skip_serializing_if = "Option::is_none")]
    pub cert_manager: Option<serde_json::Value>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsRedirect {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDns {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<i64>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct PolicyReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub path: String,

    /// Reference to a VirtualServerRoute, either `name` or `namespace/name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<Split>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Match>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_pages: Vec<ErrorPage>,

    #[serde(default, rename = "location-snippets", skip_serializing_if = "String::is_empty")]
    pub location_snippets: String,
}

impl Route {
    /// The VirtualServerRoute reference, when one is set and non-empty.
    pub fn reference(&self) -> Option<&str> {
        self.route.as_deref().filter(|r| !r.is_empty())
    }
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Match {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<Split>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    #[serde(default)]
    pub value: String,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Split {
    #[serde(default)]
    pub weight: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<ActionRedirect>,

    #[serde(default, rename = "return", skip_serializing_if = "Option::is_none")]
    pub return_: Option<ActionReturn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ActionProxy>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct ActionRedirect {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct ActionReturn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionProxy {
    #[serde(default)]
    pub upstream: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<ProxyRequestHeaders>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<ProxyResponseHeaders>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_path: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct ProxyRequestHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<Header>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct ProxyResponseHeaders {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pass: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<AddHeader>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Header {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct AddHeader {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub always: bool,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct ErrorPage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<ActionRedirect>,

    #[serde(default, rename = "return", skip_serializing_if = "Option::is_none")]
    pub return_: Option<ActionReturn>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub port: u16,

    /// Protocol hint, `http` (default) or `grpc`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subselector: BTreeMap<String, String>,

    #[serde(default, rename = "use-cluster-ip")]
    pub use_cluster_ip: bool,

    #[serde(default, rename = "lb-method", skip_serializing_if = "Option::is_none")]
    pub lb_method: Option<String>,

    #[serde(default, rename = "fail-timeout", skip_serializing_if = "Option::is_none")]
    pub fail_timeout: Option<String>,

    #[serde(default, rename = "max-fails", skip_serializing_if = "Option::is_none")]
    pub max_fails: Option<i32>,

    #[serde(default, rename = "max-conns", skip_serializing_if = "Option::is_none")]
    pub max_conns: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<i32>,

    #[serde(default, rename = "connect-timeout", skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,

    #[serde(default, rename = "read-timeout", skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<String>,

    #[serde(default, rename = "send-timeout", skip_serializing_if = "Option::is_none")]
    pub send_timeout: Option<String>,

    #[serde(default, rename = "next-upstream", skip_serializing_if = "Option::is_none")]
    pub next_upstream: Option<String>,

    #[serde(default, rename = "next-upstream-timeout", skip_serializing_if = "Option::is_none")]
    pub next_upstream_timeout: Option<String>,

    #[serde(default, rename = "next-upstream-tries", skip_serializing_if = "Option::is_none")]
    pub next_upstream_tries: Option<i32>,

    #[serde(default, rename = "client-max-body-size", skip_serializing_if = "Option::is_none")]
    pub client_max_body_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<UpstreamTls>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,

    #[serde(default, rename = "slow-start", skip_serializing_if = "Option::is_none")]
    pub slow_start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<UpstreamQueue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffering: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffers: Option<UpstreamBuffers>,

    #[serde(default, rename = "buffer-size", skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<String>,

    #[serde(default)]
    pub ntlm: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<SessionCookie>,
}

impl Upstream {
    pub fn is_grpc(&self) -> bool {
        self.protocol
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("grpc"))
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.as_ref().is_some_and(|tls| tls.enable)
    }
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct UpstreamTls {
    #[serde(default)]
    pub enable: bool,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fails: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes: Option<i32>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct UpstreamQueue {
    #[serde(default)]
    pub size: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct UpstreamBuffers {
    #[serde(default)]
    pub number: i32,

    #[serde(default)]
    pub size: String,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub secure: bool,
}

#[derive(Default, CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "TransportServer",
    group = "k8s.nginx.org",
    version = "v1",
    namespaced,
    shortname = "ts"
)]
#[kube(derive = "Default")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct TransportServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TransportServerTls>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener: Option<TransportServerListener>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<TransportServerUpstream>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_parameters: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_parameters: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_snippets: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stream_snippets: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<TransportServerAction>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct TransportServerTls {
    #[serde(default)]
    pub secret: String,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct TransportServerListener {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub protocol: String,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransportServerUpstream {
    pub name: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fails: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_conns: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_method: Option<String>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct TransportServerAction {
    #[serde(default)]
    pub pass: String,
}

#[derive(Default, CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "GlobalConfiguration",
    group = "k8s.nginx.org",
    version = "v1",
    namespaced,
    shortname = "gc"
)]
#[kube(derive = "Default")]
#[kube(derive = "PartialEq")]
pub struct GlobalConfigurationSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<Listener>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Listener {
    pub name: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,

    #[serde(default)]
    pub ssl: bool,
}
