use crate::convert::transport::{TransportProtocol, transport_listener};
use crate::naming::{base_labels, gateway_name, listener_name, object_meta};
use crate::notifications::Notifications;
use crate::objects::ObjectRef;
use crate::options::ConversionOptions;
use kube::ResourceExt;
use nic2gw_api::constants::{
    BUILTIN_TLS_PASSTHROUGH_LISTENER, BUILTIN_TLS_PASSTHROUGH_PORT, PROTOCOL_HTTP,
    PROTOCOL_TLS_PASSTHROUGH, SOURCE_TRANSPORT_SERVER, SOURCE_VIRTUAL_SERVER,
};
use nic2gw_api::gateway::{
    Gateway, GatewaySpec, GatewayTlsConfig, Listener, ListenerProtocol, SecretObjectReference,
    TlsMode,
};
use nic2gw_api::nginx::{GlobalConfiguration, TransportServer, VirtualServer};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalListener {
    pub port: u16,
    pub protocol: String,
}

/// Named listeners from the GlobalConfiguration, seeded with the built-in
/// `tls-passthrough` listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerMap {
    listeners: BTreeMap<String, GlobalListener>,
}

impl Default for ListenerMap {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ListenerMap {
    pub fn new(global: Option<&GlobalConfiguration>) -> Self {
        let mut listeners = BTreeMap::from([(
            BUILTIN_TLS_PASSTHROUGH_LISTENER.to_string(),
            GlobalListener {
                port: BUILTIN_TLS_PASSTHROUGH_PORT,
                protocol: PROTOCOL_TLS_PASSTHROUGH.to_string(),
            },
        )]);

        for listener in global.iter().flat_map(|g| &g.spec.listeners) {
            listeners.insert(
                listener.name.clone(),
                GlobalListener {
                    port: listener.port,
                    protocol: listener.protocol.clone(),
                },
            );
        }

        Self { listeners }
    }

    pub fn get(&self, name: &str) -> Option<&GlobalListener> {
        self.listeners.get(name)
    }
}

/// Listener section names a VirtualServer's routes attach to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualServerSections {
    pub http: Option<String>,
    pub https: Option<String>,
    pub https_port: u16,
}

impl VirtualServerSections {
    /// HTTPS when TLS terminates on the Gateway, plain HTTP otherwise.
    pub fn primary(&self) -> Option<&str> {
        self.https.as_deref().or(self.http.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesizedGateway {
    pub gateway: Option<Gateway>,
    pub virtual_servers: BTreeMap<String, VirtualServerSections>,
}

struct GatewayBuilder<'o> {
    namespace: String,
    options: &'o ConversionOptions,
    class: Option<(String, String)>,
    listeners: BTreeMap<String, Listener>,
}

impl<'o> GatewayBuilder<'o> {
    fn new(namespace: &str, options: &'o ConversionOptions) -> Self {
        Self {
            namespace: namespace.to_string(),
            options,
            class: None,
            listeners: BTreeMap::new(),
        }
    }

    fn add_listener(&mut self, listener: Listener, source: &ObjectRef, notifications: &mut Notifications) {
        match self.listeners.get(&listener.name) {
            None => {
                self.listeners.insert(listener.name.clone(), listener);
            }
            Some(existing) if *existing == listener => {}
            Some(_) => notifications.warning(
                source,
                format!(
                    "Listener '{}' is already defined with different settings, keeping the first definition",
                    listener.name
                ),
            ),
        }
    }

    fn observe_class(&mut self, vs: &VirtualServer, source: &ObjectRef, notifications: &mut Notifications) {
        let Some(class) = vs.spec.ingress_class_name.as_deref().filter(|c| !c.is_empty()) else {
            return;
        };
        match &self.class {
            None => self.class = Some((class.to_string(), vs.name_any())),
            Some((existing, owner)) if existing != class => notifications.warning(
                source,
                format!(
                    "Ingress class '{class}' differs from '{existing}' chosen from VirtualServer '{owner}'; \
                     the shared Gateway uses '{existing}'"
                ),
            ),
            Some(_) => {}
        }
    }

    fn listener_port(
        &self,
        listener: Option<&str>,
        default_port: u16,
        listeners: &ListenerMap,
        source: &ObjectRef,
        notifications: &mut Notifications,
    ) -> u16 {
        let Some(name) = listener.filter(|l| !l.is_empty()) else {
            return default_port;
        };
        match listeners.get(name) {
            Some(global) if global.protocol.eq_ignore_ascii_case(PROTOCOL_HTTP) => global.port,
            Some(global) => {
                notifications.warning(
                    source,
                    format!(
                        "Listener '{name}' has protocol '{}' and cannot serve HTTP, using port {default_port}",
                        global.protocol
                    ),
                );
                default_port
            }
            None => {
                notifications.warning(
                    source,
                    format!("Listener '{name}' not found in GlobalConfiguration, using port {default_port}"),
                );
                default_port
            }
        }
    }

    fn add_virtual_server(
        &mut self,
        vs: &VirtualServer,
        source: &ObjectRef,
        listeners: &ListenerMap,
        notifications: &mut Notifications,
    ) -> VirtualServerSections {
        self.observe_class(vs, source, notifications);

        let host = vs.spec.host.as_str();
        let custom = vs.spec.listener.as_ref();
        let http_port = self.listener_port(
            custom.and_then(|l| l.http.as_deref()),
            self.options.http_port(),
            listeners,
            source,
            notifications,
        );
        let https_port = self.listener_port(
            custom.and_then(|l| l.https.as_deref()),
            self.options.https_port(),
            listeners,
            source,
            notifications,
        );

        let tls = vs.spec.tls.as_ref();
        let secret = tls.and_then(|t| t.secret.as_deref()).filter(|s| !s.is_empty());
        let redirect = tls
            .and_then(|t| t.redirect.as_ref())
            .is_some_and(|r| r.enable);

        if tls.is_some() && secret.is_none() {
            notifications.warning(
                source,
                "TLS is configured without a secret; the host is served over plain HTTP",
            );
        }
        if redirect && secret.is_none() {
            notifications.warning(
                source,
                "TLS redirect is enabled without a TLS secret and was not converted",
            );
        }

        let mut sections = VirtualServerSections {
            https_port,
            ..Default::default()
        };

        if let Some(secret) = secret {
            let name = listener_name(ListenerProtocol::Https, https_port, Some(host));
            self.add_listener(
                Listener {
                    name: name.clone(),
                    hostname: Some(host.to_string()),
                    port: https_port,
                    protocol: ListenerProtocol::Https,
                    tls: Some(GatewayTlsConfig {
                        mode: Some(TlsMode::Terminate),
                        certificate_refs: vec![SecretObjectReference {
                            name: secret.to_string(),
                            ..Default::default()
                        }],
                    }),
                },
                source,
                notifications,
            );
            sections.https = Some(name);
        }

        if secret.is_none() || redirect {
            let name = listener_name(ListenerProtocol::Http, http_port, Some(host));
            self.add_listener(
                Listener {
                    name: name.clone(),
                    hostname: Some(host.to_string()),
                    port: http_port,
                    protocol: ListenerProtocol::Http,
                    tls: None,
                },
                source,
                notifications,
            );
            sections.http = Some(name);
        }

        sections
    }

    fn add_transport_server(
        &mut self,
        ts: &TransportServer,
        source: &ObjectRef,
        listeners: &ListenerMap,
        notifications: &mut Notifications,
    ) {
        // Skipped transports are reported by the transport assembler.
        let Ok(listener) = transport_listener(ts, listeners) else {
            return;
        };

        let protocol = listener.protocol.listener_protocol();
        let passthrough = listener.protocol == TransportProtocol::TlsPassthrough;
        self.add_listener(
            Listener {
                name: listener.section_name,
                hostname: if passthrough { listener.host } else { None },
                port: listener.port,
                protocol,
                tls: passthrough.then(|| GatewayTlsConfig {
                    mode: Some(TlsMode::Passthrough),
                    certificate_refs: Vec::new(),
                }),
            },
            source,
            notifications,
        );
    }

    fn build(self, source_label: &str) -> Option<Gateway> {
        if self.listeners.is_empty() {
            return None;
        }

        let class = self
            .class
            .map_or_else(|| self.options.gateway_class().clone(), |(class, _)| class);
        debug!(
            "Synthesized gateway with {} listeners object.ref={}",
            self.listeners.len(),
            gateway_name(&self.namespace)
        );

        Some(Gateway {
            metadata: object_meta(
                &self.namespace,
                gateway_name(&self.namespace),
                base_labels(self.options, source_label),
            ),
            spec: GatewaySpec {
                gateway_class_name: class,
                listeners: self.listeners.into_values().collect(),
            },
        })
    }
}

/// Builds the namespace's shared Gateway from every VirtualServer and
/// TransportServer in it. Inputs must already be sorted.
pub fn synthesize_gateway(
    namespace: &str,
    virtual_servers: &[(ObjectRef, &VirtualServer)],
    transport_servers: &[(ObjectRef, &TransportServer)],
    listeners: &ListenerMap,
    options: &ConversionOptions,
    notifications: &mut Notifications,
) -> SynthesizedGateway {
    let mut builder = GatewayBuilder::new(namespace, options);
    let source_label = if virtual_servers.is_empty() && !transport_servers.is_empty() {
        SOURCE_TRANSPORT_SERVER
    } else {
        SOURCE_VIRTUAL_SERVER
    };

    let virtual_servers = virtual_servers
        .iter()
        .map(|(source, vs)| {
            let sections = builder.add_virtual_server(vs, source, listeners, notifications);
            (vs.name_any(), sections)
        })
        .collect();

    for (source, ts) in transport_servers {
        builder.add_transport_server(ts, source, listeners, notifications);
    }

    SynthesizedGateway {
        gateway: builder.build(source_label),
        virtual_servers,
    }
}
