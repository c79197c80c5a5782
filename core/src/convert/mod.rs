//! The VirtualServer/TransportServer conversion engine.
//!
//! [`convert`] groups its input by namespace, synthesizes one Gateway per
//! namespace and then converts every VirtualServer and TransportServer in
//! sorted order, so repeated runs produce identical output.

pub mod actions;
pub mod conditions;
pub mod gateway;
pub mod resolver;
pub mod routes;
pub mod transport;
pub mod upstreams;

use crate::convert::gateway::{ListenerMap, synthesize_gateway};
use crate::convert::resolver::{RouteIndex, resolve_routes};
use crate::convert::routes::assemble_routes;
use crate::convert::transport::{TransportRoute, assemble_transport_route};
use crate::convert::upstreams::UpstreamCatalog;
use crate::ir::Ir;
use crate::notifications::Notifications;
use crate::objects::{NamespacedName, ObjectRef};
use crate::options::ConversionOptions;
use getset::Getters;
use kube::{Resource, ResourceExt};
use nic2gw_api::nginx::{GlobalConfiguration, TransportServer, VirtualServer, VirtualServerRoute};
use std::collections::BTreeMap;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

const UNNAMED: &str = "<unnamed>";

/// A snapshot of the NGINX resources to convert.
#[derive(TypedBuilder, Getters, Debug, Default, Clone, PartialEq)]
#[getset(get = "pub")]
pub struct ConversionInput {
    #[builder(default)]
    virtual_servers: Vec<VirtualServer>,

    #[builder(default)]
    virtual_server_routes: Vec<VirtualServerRoute>,

    #[builder(default)]
    transport_servers: Vec<TransportServer>,

    #[builder(default, setter(strip_option))]
    global_configuration: Option<GlobalConfiguration>,
}

#[derive(Getters, Debug, Default, Clone, PartialEq)]
#[getset(get = "pub")]
pub struct ConversionOutput {
    ir: Ir,
    notifications: Notifications,
}

impl ConversionOutput {
    pub fn into_parts(self) -> (Ir, Notifications) {
        (self.ir, self.notifications)
    }
}

#[derive(Default)]
struct NamespaceInput<'a> {
    virtual_servers: Vec<(ObjectRef, &'a VirtualServer)>,
    transport_servers: Vec<(ObjectRef, &'a TransportServer)>,
}

fn namespace_of<K: ResourceExt>(object: &K) -> String {
    object.namespace().unwrap_or_else(|| "default".to_string())
}

/// The object's reference, with a missing namespace filled in as `default`.
fn source_of<K>(object: &K) -> Option<ObjectRef>
where
    K: Resource + ResourceExt,
    K::DynamicType: Default,
{
    let source = ObjectRef::for_object(object).ok()?;
    Some(ObjectRef::of_kind::<K>(Some(namespace_of(object)), source.name().clone()))
}

fn group_by_namespace<'a>(
    input: &'a ConversionInput,
    notifications: &mut Notifications,
) -> BTreeMap<String, NamespaceInput<'a>> {
    let mut namespaces: BTreeMap<String, NamespaceInput<'a>> = BTreeMap::new();

    for vs in &input.virtual_servers {
        let Some(source) = source_of(vs) else {
            notifications.warning(
                &ObjectRef::of_kind::<VirtualServer>(vs.namespace(), UNNAMED),
                "VirtualServer has no name, skipping",
            );
            continue;
        };
        if vs.spec.host.is_empty() {
            notifications.warning(&source, "VirtualServer has no host specified, skipping");
            continue;
        }
        namespaces
            .entry(namespace_of(vs))
            .or_default()
            .virtual_servers
            .push((source, vs));
    }

    for ts in &input.transport_servers {
        let Some(source) = source_of(ts) else {
            notifications.warning(
                &ObjectRef::of_kind::<TransportServer>(ts.namespace(), UNNAMED),
                "TransportServer has no name, skipping",
            );
            continue;
        };
        namespaces
            .entry(namespace_of(ts))
            .or_default()
            .transport_servers
            .push((source, ts));
    }

    for namespace in namespaces.values_mut() {
        namespace.virtual_servers.sort_by(|a, b| a.0.cmp(&b.0));
        namespace.transport_servers.sort_by(|a, b| a.0.cmp(&b.0));
    }

    namespaces
}

/// Fields with no Gateway API counterpart. Each one set yields a warning.
fn check_unsupported_fields(vs: &VirtualServer, source: &ObjectRef, notifications: &mut Notifications) {
    let spec = &vs.spec;
    let fields = [
        ("gunzip", spec.gunzip),
        ("externalDNS", spec.external_dns.as_ref().is_some_and(|dns| dns.enable)),
        ("dos", !spec.dos.is_empty()),
        ("policies", !spec.policies.is_empty()),
        ("internalRoute", spec.internal_route),
        ("http-snippets", !spec.http_snippets.is_empty()),
        ("server-snippets", !spec.server_snippets.is_empty()),
    ];

    for (field, _) in fields.iter().filter(|(_, set)| *set) {
        let detail = if *field == "policies" {
            format!(" ({} policies)", spec.policies.len())
        } else {
            String::new()
        };
        notifications.warning(
            source,
            format!("VirtualServer field '{field}'{detail} is not supported in Gateway API conversion"),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_virtual_server(
    vs: &VirtualServer,
    source: &ObjectRef,
    namespace: &str,
    sections: &gateway::VirtualServerSections,
    index: &RouteIndex<'_>,
    options: &ConversionOptions,
    ir: &mut Ir,
    notifications: &mut Notifications,
) {
    check_unsupported_fields(vs, source, notifications);

    let catalog = UpstreamCatalog::build(&vs.spec.upstreams, namespace, source, notifications);
    let resolved = match resolve_routes(&vs.spec.routes, index, source, notifications) {
        Ok(resolved) => resolved,
        Err(error) => {
            notifications.error(source, format!("Failed to resolve routes: {error}"));
            return;
        }
    };

    let assembled = assemble_routes(
        vs,
        source,
        &resolved,
        &catalog,
        sections,
        options,
        notifications,
    );

    let extension_key = assembled
        .http_route
        .as_ref()
        .map(|route| NamespacedName::for_object(route, namespace))
        .or_else(|| {
            assembled
                .grpc_route
                .as_ref()
                .map(|route| NamespacedName::for_object(route, namespace))
        });
    if let Some(key) = extension_key {
        ir.insert_extension(key, assembled.extension);
    }

    if let Some(route) = assembled.redirect_route {
        ir.insert_http_route(route);
    }
    if let Some(route) = assembled.http_route {
        ir.insert_http_route(route);
    }
    if let Some(route) = assembled.grpc_route {
        ir.insert_grpc_route(route);
    }
    for policy in assembled.backend_tls_policies {
        ir.insert_backend_tls_policy(policy);
    }
}

/// Converts the whole snapshot. Never fails: anything that cannot be
/// converted is reported in the returned notifications.
pub fn convert(input: &ConversionInput, options: &ConversionOptions) -> ConversionOutput {
    let mut notifications = Notifications::new();
    let mut ir = Ir::default();

    let listeners = ListenerMap::new(input.global_configuration.as_ref());
    let index = RouteIndex::new(&input.virtual_server_routes);
    debug!("Indexed {} VirtualServerRoutes", index.len());

    for (namespace, resources) in group_by_namespace(input, &mut notifications) {
        info!(
            "Converting namespace {} with {} VirtualServers and {} TransportServers",
            namespace,
            resources.virtual_servers.len(),
            resources.transport_servers.len()
        );

        let synthesized = synthesize_gateway(
            &namespace,
            &resources.virtual_servers,
            &resources.transport_servers,
            &listeners,
            options,
            &mut notifications,
        );
        if let Some(gateway) = synthesized.gateway {
            ir.insert_gateway(gateway);
        }

        for (source, vs) in &resources.virtual_servers {
            let sections = synthesized
                .virtual_servers
                .get(&vs.name_any())
                .cloned()
                .unwrap_or_default();
            convert_virtual_server(
                vs,
                source,
                &namespace,
                &sections,
                &index,
                options,
                &mut ir,
                &mut notifications,
            );
        }

        for (source, ts) in &resources.transport_servers {
            match assemble_transport_route(ts, source, &listeners, options, &mut notifications) {
                Some(TransportRoute::Tcp(route)) => ir.insert_tcp_route(route),
                Some(TransportRoute::Tls(route)) => ir.insert_tls_route(route),
                Some(TransportRoute::Udp(route)) => ir.insert_udp_route(route),
                None => {}
            }
        }
    }

    info!(
        "Converted {} objects with {} notifications",
        ir.object_count(),
        notifications.len()
    );

    ConversionOutput { ir, notifications }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Severity;
    use nic2gw_api::nginx::{ExternalDns, PolicyReference, VirtualServerSpec};
    use rstest::rstest;

    fn virtual_server(namespace: Option<&str>, name: &str, host: &str) -> VirtualServer {
        let mut vs = VirtualServer::new(
            name,
            VirtualServerSpec {
                host: host.to_string(),
                ..Default::default()
            },
        );
        vs.metadata.namespace = namespace.map(str::to_string);
        vs
    }

    #[test]
    fn test_empty_input() {
        let output = convert(&ConversionInput::default(), &ConversionOptions::default());
        assert_eq!(output.ir().object_count(), 0);
        assert!(output.notifications().is_empty());
    }

    #[test]
    fn test_unnamed_virtual_server_is_skipped() {
        let mut vs = virtual_server(Some("default"), "cafe", "cafe.example.com");
        vs.metadata.name = None;
        let input = ConversionInput::builder().virtual_servers(vec![vs]).build();

        let output = convert(&input, &ConversionOptions::default());
        assert_eq!(output.ir().object_count(), 0);
        assert_eq!(output.notifications().count(Severity::Warning), 1);
        assert_eq!(
            output.notifications().as_slice()[0].source().name(),
            "<unnamed>"
        );
    }

    #[test]
    fn test_missing_namespace_defaults() {
        let input = ConversionInput::builder()
            .virtual_servers(vec![virtual_server(None, "cafe", "cafe.example.com")])
            .build();

        let output = convert(&input, &ConversionOptions::default());
        assert!(
            output
                .ir()
                .gateways()
                .contains_key(&NamespacedName::new("default", "default-gateway"))
        );
        assert_eq!(output.notifications().count(Severity::Error), 0);
    }

    #[rstest]
    #[case("gunzip")]
    #[case("externalDNS")]
    #[case("dos")]
    #[case("policies")]
    #[case("internalRoute")]
    #[case("http-snippets")]
    #[case("server-snippets")]
    fn test_unsupported_field_names_the_field(#[case] field: &str) {
        let mut vs = virtual_server(Some("default"), "cafe", "cafe.example.com");
        match field {
            "gunzip" => vs.spec.gunzip = true,
            "externalDNS" => {
                vs.spec.external_dns = Some(ExternalDns {
                    enable: true,
                    ..Default::default()
                });
            }
            "dos" => vs.spec.dos = "default/dos-protected".to_string(),
            "policies" => {
                vs.spec.policies = vec![PolicyReference {
                    name: "rate-limit".to_string(),
                    namespace: None,
                }];
            }
            "internalRoute" => vs.spec.internal_route = true,
            "http-snippets" => vs.spec.http_snippets = "map $a $b {}".to_string(),
            _ => vs.spec.server_snippets = "add_header X-Server 1;".to_string(),
        }
        let mut notifications = Notifications::new();
        let source = ObjectRef::builder().kind("VirtualServer").name("cafe").build();

        check_unsupported_fields(&vs, &source, &mut notifications);

        assert_eq!(notifications.len(), 1);
        assert!(
            notifications.as_slice()[0]
                .message()
                .starts_with(&format!("VirtualServer field '{field}'"))
        );
    }
}
