//! Output of a conversion run: Gateway API objects keyed by namespaced name,
//! plus NGINX-only data that has no Gateway API field to live in.

use crate::objects::NamespacedName;
use getset::Getters;
use kube::ResourceExt;
use nic2gw_api::gateway::{BackendTlsPolicy, Gateway, GrpcRoute, HttpRoute, TcpRoute, TlsRoute, UdpRoute};
use nic2gw_api::nginx::{HealthCheck, SessionCookie, Upstream, UpstreamQueue};
use serde::Serialize;
use std::collections::BTreeMap;

/// Each key appears once; inserting an existing key replaces the old object.
#[derive(Debug, Default, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Ir {
    gateways: BTreeMap<NamespacedName, Gateway>,
    http_routes: BTreeMap<NamespacedName, HttpRoute>,
    grpc_routes: BTreeMap<NamespacedName, GrpcRoute>,
    tcp_routes: BTreeMap<NamespacedName, TcpRoute>,
    tls_routes: BTreeMap<NamespacedName, TlsRoute>,
    udp_routes: BTreeMap<NamespacedName, UdpRoute>,
    backend_tls_policies: BTreeMap<NamespacedName, BackendTlsPolicy>,
    extensions: BTreeMap<NamespacedName, ProviderExtension>,
}

fn key_of<K: ResourceExt>(object: &K) -> NamespacedName {
    NamespacedName::for_object(object, "default")
}

impl Ir {
    pub fn insert_gateway(&mut self, gateway: Gateway) {
        self.gateways.insert(key_of(&gateway), gateway);
    }

    pub fn insert_http_route(&mut self, route: HttpRoute) {
        self.http_routes.insert(key_of(&route), route);
    }

    pub fn remove_http_route(&mut self, key: &NamespacedName) -> Option<HttpRoute> {
        self.http_routes.remove(key)
    }

    pub fn insert_grpc_route(&mut self, route: GrpcRoute) {
        self.grpc_routes.insert(key_of(&route), route);
    }

    pub fn insert_tcp_route(&mut self, route: TcpRoute) {
        self.tcp_routes.insert(key_of(&route), route);
    }

    pub fn insert_tls_route(&mut self, route: TlsRoute) {
        self.tls_routes.insert(key_of(&route), route);
    }

    pub fn insert_udp_route(&mut self, route: UdpRoute) {
        self.udp_routes.insert(key_of(&route), route);
    }

    pub fn insert_backend_tls_policy(&mut self, policy: BackendTlsPolicy) {
        self.backend_tls_policies.insert(key_of(&policy), policy);
    }

    pub fn insert_extension(&mut self, key: NamespacedName, extension: ProviderExtension) {
        if !extension.is_empty() {
            self.extensions.insert(key, extension);
        }
    }

    /// Total number of Gateway API objects, extensions excluded.
    pub fn object_count(&self) -> usize {
        self.gateways.len()
            + self.http_routes.len()
            + self.grpc_routes.len()
            + self.tcp_routes.len()
            + self.tls_routes.len()
            + self.udp_routes.len()
            + self.backend_tls_policies.len()
    }
}

/// Side data attached to a generated route.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ProviderExtension {
    pub upstreams: BTreeMap<String, UpstreamExtension>,
}

impl ProviderExtension {
    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamExtension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lb_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<SessionCookie>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<UpstreamQueue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fails: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conns: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffering: Option<bool>,
}

impl UpstreamExtension {
    /// `None` when the upstream carries none of the recorded tuning fields.
    pub fn from_upstream(upstream: &Upstream) -> Option<Self> {
        let extension = Self {
            lb_method: upstream.lb_method.clone().filter(|m| !m.is_empty()),
            session_cookie: upstream.session_cookie.clone().filter(|c| c.enable),
            slow_start: upstream.slow_start.clone().filter(|s| !s.is_empty()),
            queue: upstream.queue.clone(),
            keepalive: upstream.keepalive,
            max_fails: upstream.max_fails,
            max_conns: upstream.max_conns,
            fail_timeout: upstream.fail_timeout.clone().filter(|t| !t.is_empty()),
            health_check: upstream.health_check.clone().filter(|h| h.enable),
            buffering: upstream.buffering,
        };

        (extension != Self::default()).then_some(extension)
    }
}
