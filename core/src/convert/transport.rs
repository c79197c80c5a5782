use crate::convert::gateway::ListenerMap;
use crate::naming::{gateway_name, labels, listener_name, object_meta, transport_route_name};
use crate::notifications::{Notifications, Severity};
use crate::objects::ObjectRef;
use crate::options::ConversionOptions;
use kube::ResourceExt;
use nic2gw_api::constants::{SOURCE_TRANSPORT_SERVER, TS_NAME_LABEL_SUFFIX};
use nic2gw_api::gateway::{
    BackendRef, L4RouteRule, ListenerProtocol, ParentReference, TcpRoute, TcpRouteSpec, TlsRoute,
    TlsRouteSpec, UdpRoute, UdpRouteSpec,
};
use nic2gw_api::nginx::{TransportServer, TransportServerUpstream};
use std::str::FromStr;
use strum::EnumString;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum TransportProtocol {
    #[strum(serialize = "TCP")]
    Tcp,
    #[strum(serialize = "UDP")]
    Udp,
    #[strum(serialize = "TLS_PASSTHROUGH")]
    TlsPassthrough,
}

impl TransportProtocol {
    pub fn listener_protocol(self) -> ListenerProtocol {
        match self {
            TransportProtocol::Tcp => ListenerProtocol::Tcp,
            TransportProtocol::Udp => ListenerProtocol::Udp,
            TransportProtocol::TlsPassthrough => ListenerProtocol::Tls,
        }
    }
}

/// Why a TransportServer contributes nothing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransportSkip {
    #[error("TransportServer '{0}' skipped: listener field is required but not specified")]
    MissingListener(String),
    #[error("TransportServer '{0}' skipped: listener '{1}' not found in GlobalConfiguration")]
    UnknownListener(String, String),
    #[error("Unsupported protocol '{1}' in TransportServer '{0}'")]
    UnsupportedProtocol(String, String),
}

impl TransportSkip {
    pub fn severity(&self) -> Severity {
        match self {
            TransportSkip::MissingListener(..) | TransportSkip::UnknownListener(..) => {
                Severity::Warning
            }
            TransportSkip::UnsupportedProtocol(..) => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportListener {
    pub protocol: TransportProtocol,
    pub port: u16,
    pub host: Option<String>,
    pub section_name: String,
}

/// Resolves the Gateway listener a TransportServer attaches to.
pub fn transport_listener(
    ts: &TransportServer,
    listeners: &ListenerMap,
) -> Result<TransportListener, TransportSkip> {
    let name = ts.name_any();
    let declared = ts
        .spec
        .listener
        .as_ref()
        .filter(|l| !l.name.is_empty() && !l.protocol.is_empty())
        .ok_or_else(|| TransportSkip::MissingListener(name.clone()))?;

    let global = listeners
        .get(&declared.name)
        .ok_or_else(|| TransportSkip::UnknownListener(name.clone(), declared.name.clone()))?;

    let protocol = TransportProtocol::from_str(&declared.protocol)
        .map_err(|_| TransportSkip::UnsupportedProtocol(name, declared.protocol.clone()))?;

    let host = ts.spec.host.clone().filter(|h| !h.is_empty());
    Ok(TransportListener {
        protocol,
        port: global.port,
        section_name: listener_name(protocol.listener_protocol(), global.port, host.as_deref()),
        host,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportRoute {
    Tcp(TcpRoute),
    Tls(TlsRoute),
    Udp(UdpRoute),
}

fn check_unsupported_fields(ts: &TransportServer, source: &ObjectRef, notifications: &mut Notifications) {
    let spec = &ts.spec;
    let fields = [
        ("upstreamParameters", spec.upstream_parameters.is_some()),
        ("sessionParameters", spec.session_parameters.is_some()),
        ("serverSnippets", !spec.server_snippets.is_empty()),
        ("streamSnippets", !spec.stream_snippets.is_empty()),
    ];
    for (field, _) in fields.iter().filter(|(_, set)| *set) {
        notifications.warning(
            source,
            format!("TransportServer field '{field}' is not supported in Gateway API and was not converted"),
        );
    }
}

fn report_upstream_fields(
    upstream: &TransportServerUpstream,
    source: &ObjectRef,
    notifications: &mut Notifications,
) {
    let fields = [
        ("failTimeout", upstream.fail_timeout.is_some()),
        ("maxFails", upstream.max_fails.is_some()),
        ("maxConns", upstream.max_conns.is_some()),
        ("loadBalancingMethod", upstream.load_balancing_method.is_some()),
    ];
    for (field, _) in fields.iter().filter(|(_, set)| *set) {
        notifications.info(
            source,
            format!(
                "Upstream '{}': {field} field is not currently converted to Gateway API",
                upstream.name
            ),
        );
    }
}

fn backend_refs(
    ts: &TransportServer,
    namespace: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Vec<BackendRef> {
    let name = ts.name_any();
    let Some(pass) = ts
        .spec
        .action
        .as_ref()
        .map(|a| a.pass.as_str())
        .filter(|p| !p.is_empty())
    else {
        notifications.warning(
            source,
            format!("TransportServer '{name}' has no action.pass configured"),
        );
        return Vec::new();
    };

    let Some(upstream) = ts.spec.upstreams.iter().find(|u| u.name == pass) else {
        notifications.error(
            source,
            format!("Upstream '{pass}' not found in TransportServer '{name}'"),
        );
        return Vec::new();
    };

    if upstream.service.is_empty() || upstream.port == 0 {
        notifications.error(
            source,
            format!("Upstream '{pass}' in TransportServer '{name}' has no service or port specified"),
        );
        return Vec::new();
    }

    report_upstream_fields(upstream, source, notifications);

    vec![BackendRef {
        group: Some(String::new()),
        kind: Some("Service".to_string()),
        name: upstream.service.clone(),
        namespace: Some(namespace.to_string()),
        port: Some(upstream.port),
        weight: None,
    }]
}

pub fn assemble_transport_route(
    ts: &TransportServer,
    source: &ObjectRef,
    listeners: &ListenerMap,
    options: &ConversionOptions,
    notifications: &mut Notifications,
) -> Option<TransportRoute> {
    let listener = match transport_listener(ts, listeners) {
        Ok(listener) => listener,
        Err(skip) => {
            notifications.push(skip.severity(), source, skip.to_string());
            return None;
        }
    };

    let ts_name = ts.name_any();
    let namespace = ts.namespace().unwrap_or_else(|| "default".to_string());

    check_unsupported_fields(ts, source, notifications);
    if listener.protocol == TransportProtocol::Tcp
        && ts.spec.tls.as_ref().is_some_and(|tls| !tls.secret.is_empty())
    {
        notifications.info(
            source,
            format!("TLS termination for TransportServer '{ts_name}' is not converted; the TCPRoute forwards raw TCP"),
        );
    }

    let protocol = listener.protocol.listener_protocol();
    let route_name = transport_route_name(&ts_name, protocol);
    let metadata = object_meta(
        &namespace,
        route_name.clone(),
        labels(options, SOURCE_TRANSPORT_SERVER, TS_NAME_LABEL_SUFFIX, &ts_name),
    );
    let parent_refs = vec![ParentReference {
        name: gateway_name(&namespace),
        section_name: Some(listener.section_name),
        ..Default::default()
    }];
    let rules = vec![L4RouteRule {
        backend_refs: backend_refs(ts, &namespace, source, notifications),
    }];

    let (kind, route) = match listener.protocol {
        TransportProtocol::Tcp => (
            "TCPRoute",
            TransportRoute::Tcp(TcpRoute {
                metadata,
                spec: TcpRouteSpec { parent_refs, rules },
            }),
        ),
        TransportProtocol::TlsPassthrough => (
            "TLSRoute",
            TransportRoute::Tls(TlsRoute {
                metadata,
                spec: TlsRouteSpec {
                    parent_refs,
                    hostnames: listener.host.into_iter().collect(),
                    rules,
                },
            }),
        ),
        TransportProtocol::Udp => (
            "UDPRoute",
            TransportRoute::Udp(UdpRoute {
                metadata,
                spec: UdpRouteSpec { parent_refs, rules },
            }),
        ),
    };

    notifications.info(
        source,
        format!("Created {kind} '{route_name}' for TransportServer '{ts_name}'"),
    );
    Some(route)
}
