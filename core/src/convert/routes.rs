use crate::convert::actions::{BackendTarget, redirect_status_code, translate_action, translate_splits};
use crate::convert::conditions::translate_conditions;
use crate::convert::gateway::VirtualServerSections;
use crate::convert::resolver::{ResolvedRoute, SourceKind};
use crate::convert::upstreams::UpstreamCatalog;
use crate::ir::ProviderExtension;
use crate::naming::{gateway_name, grpc_route_name, http_route_name, labels, object_meta, redirect_route_name};
use crate::notifications::Notifications;
use crate::objects::ObjectRef;
use crate::options::ConversionOptions;
use gateway_api::apis::standard::httproutes::{
    HTTPRouteRulesFiltersRequestRedirect, HTTPRouteRulesFiltersRequestRedirectScheme,
    HTTPRouteRulesMatches, HTTPRouteRulesMatchesHeadersType, HTTPRouteRulesMatchesPath,
    HTTPRouteRulesMatchesPathType,
};
use kube::ResourceExt;
use nic2gw_api::constants::{DEFAULT_HTTPS_PORT, SOURCE_VIRTUAL_SERVER, VS_NAME_LABEL_SUFFIX};
use nic2gw_api::gateway::{
    BackendRef, BackendTlsPolicy, GrpcBackendRef, GrpcHeaderMatch, GrpcMethodMatch, GrpcRoute,
    GrpcRouteFilter, GrpcRouteMatch, GrpcRouteRule, GrpcRouteSpec, HttpBackendRef, HttpRoute,
    HttpRouteFilter, HttpRouteRule, HttpRouteSpec, MatchType, ParentReference,
};
use nic2gw_api::nginx::{Route, VirtualServer};
use std::collections::BTreeMap;
use tracing::debug;

/// One flattened rule before it is split into HTTP and gRPC rules.
/// Backends still carry their upstream names.
#[derive(Debug, Clone, PartialEq)]
struct RuleDraft {
    matches: HTTPRouteRulesMatches,
    filters: Vec<HttpRouteFilter>,
    backends: Vec<BackendTarget>,
}

impl RuleDraft {
    fn is_grpc(&self) -> bool {
        self.backends.iter().any(|backend| backend.grpc)
    }
}

/// Everything one VirtualServer contributes besides its Gateway listeners.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssembledRoutes {
    pub http_route: Option<HttpRoute>,
    pub grpc_route: Option<GrpcRoute>,
    pub redirect_route: Option<HttpRoute>,
    pub backend_tls_policies: Vec<BackendTlsPolicy>,
    pub extension: ProviderExtension,
}

/// Converts the NGINX location modifier into a Gateway API path match.
pub fn path_match(
    path: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> HTTPRouteRulesMatchesPath {
    let (match_type, value) = if let Some(pattern) = path.strip_prefix("~*") {
        notifications.info(
            source,
            format!("Case-insensitive regex path '{path}' converted with an inline (?i) flag"),
        );
        (
            HTTPRouteRulesMatchesPathType::RegularExpression,
            format!("(?i){}", pattern.trim_start()),
        )
    } else if let Some(pattern) = path.strip_prefix('~') {
        (
            HTTPRouteRulesMatchesPathType::RegularExpression,
            pattern.trim_start().to_string(),
        )
    } else if let Some(exact) = path.strip_prefix('=') {
        (HTTPRouteRulesMatchesPathType::Exact, exact.trim_start().to_string())
    } else if path.is_empty() {
        (HTTPRouteRulesMatchesPathType::PathPrefix, "/".to_string())
    } else {
        (HTTPRouteRulesMatchesPathType::PathPrefix, path.to_string())
    };

    HTTPRouteRulesMatchesPath {
        r#type: Some(match_type),
        value: Some(value),
    }
}

fn check_route_fields(route: &Route, source: &ObjectRef, notifications: &mut Notifications) {
    let fields = [
        ("location-snippets", !route.location_snippets.is_empty()),
        ("errorPages", !route.error_pages.is_empty()),
        ("policies", !route.policies.is_empty()),
    ];
    for (field, _) in fields.iter().filter(|(_, set)| *set) {
        notifications.warning(
            source,
            format!(
                "Route field '{field}' on path '{}' is not supported in Gateway API and was not converted",
                route.path
            ),
        );
    }
}

/// Rules in declaration order: one per convertible match, then the
/// route's own action as a catch-all.
fn route_rules(
    route: &Route,
    catalog: &UpstreamCatalog<'_>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Vec<RuleDraft> {
    check_route_fields(route, source, notifications);

    let path = path_match(&route.path, source, notifications);
    let mut rules = Vec::with_capacity(route.matches.len() + 1);

    for (index, matched) in route.matches.iter().enumerate() {
        if matched.action.is_none() && matched.splits.is_empty() {
            debug!(
                "Match {} on path {} has no action or splits object.ref={}",
                index, route.path, source
            );
            continue;
        }

        let predicates = translate_conditions(&matched.conditions, source, notifications);
        if predicates.is_empty() {
            notifications.warning(
                source,
                format!(
                    "Match {index} on path '{}' has no convertible conditions and would shadow the route, skipping",
                    route.path
                ),
            );
            continue;
        }

        let translated = matched
            .action
            .as_ref()
            .map(|action| translate_action(action, catalog, source, notifications))
            .unwrap_or_default();
        let mut backends: Vec<_> = translated.backend.into_iter().collect();
        backends.extend(translate_splits(&matched.splits, catalog, source, notifications));

        rules.push(RuleDraft {
            matches: HTTPRouteRulesMatches {
                path: Some(path.clone()),
                headers: Some(predicates.headers).filter(|h| !h.is_empty()),
                query_params: Some(predicates.query_params).filter(|q| !q.is_empty()),
                ..Default::default()
            },
            filters: translated.filters,
            backends,
        });
    }

    if route.action.is_some() || !route.splits.is_empty() {
        let translated = route
            .action
            .as_ref()
            .map(|action| translate_action(action, catalog, source, notifications))
            .unwrap_or_default();
        let mut backends: Vec<_> = translated.backend.into_iter().collect();
        backends.extend(translate_splits(&route.splits, catalog, source, notifications));

        rules.push(RuleDraft {
            matches: HTTPRouteRulesMatches {
                path: Some(path),
                ..Default::default()
            },
            filters: translated.filters,
            backends,
        });
    }

    rules
}

fn backend_ref(
    target: BackendTarget,
    route_namespace: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> (BackendRef, Vec<HttpRouteFilter>) {
    let namespace = (target.namespace != route_namespace).then(|| {
        notifications.info(
            source,
            format!(
                "Backend '{}' is in namespace '{}'; a ReferenceGrant is required there",
                target.service, target.namespace
            ),
        );
        target.namespace
    });

    let backend = BackendRef {
        name: target.service,
        namespace,
        port: target.port,
        weight: target.weight,
        ..Default::default()
    };
    (backend, target.filters)
}

fn http_rule(
    draft: RuleDraft,
    route_namespace: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> HttpRouteRule {
    HttpRouteRule {
        matches: vec![draft.matches],
        filters: draft.filters,
        backend_refs: draft
            .backends
            .into_iter()
            .map(|target| {
                let (backend, filters) = backend_ref(target, route_namespace, source, notifications);
                HttpBackendRef { backend, filters }
            })
            .collect(),
    }
}

/// `/package.Service/Method` on exact or prefix paths; regex paths have no
/// structured equivalent.
fn grpc_method_match(
    path: Option<&HTTPRouteRulesMatchesPath>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<GrpcMethodMatch> {
    let path = path?;
    let value = path.value.as_deref()?;

    if path.r#type == Some(HTTPRouteRulesMatchesPathType::RegularExpression) {
        notifications.info(
            source,
            format!("Regex path '{value}' cannot be expressed as a gRPC method match and matches all methods"),
        );
        return None;
    }

    let trimmed = value.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let (service, method) = match trimmed.rsplit_once('/') {
        Some((service, method)) => (service, Some(method).filter(|m| !m.is_empty())),
        None => (trimmed, None),
    };

    Some(GrpcMethodMatch {
        match_type: Some(MatchType::Exact),
        service: Some(service.to_string()),
        method: method.map(str::to_string),
    })
}

fn grpc_filter(
    filter: HttpRouteFilter,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<GrpcRouteFilter> {
    match filter {
        HttpRouteFilter::RequestHeaderModifier {
            request_header_modifier,
        } => Some(GrpcRouteFilter::RequestHeaderModifier {
            request_header_modifier,
        }),
        HttpRouteFilter::ResponseHeaderModifier {
            response_header_modifier,
        } => Some(GrpcRouteFilter::ResponseHeaderModifier {
            response_header_modifier,
        }),
        HttpRouteFilter::RequestRedirect { .. } => {
            notifications.info(source, "HTTP redirect filter not applicable to gRPC, skipping");
            None
        }
        HttpRouteFilter::UrlRewrite { .. } => {
            notifications.info(source, "URL rewrite filter not applicable to gRPC, skipping");
            None
        }
    }
}

fn grpc_filters(
    filters: Vec<HttpRouteFilter>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Vec<GrpcRouteFilter> {
    filters
        .into_iter()
        .filter_map(|filter| grpc_filter(filter, source, notifications))
        .collect()
}

fn grpc_rule(
    draft: RuleDraft,
    route_namespace: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> GrpcRouteRule {
    let method = grpc_method_match(draft.matches.path.as_ref(), source, notifications);
    let headers: Vec<_> = draft
        .matches
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|header| GrpcHeaderMatch {
            match_type: Some(match header.r#type {
                Some(HTTPRouteRulesMatchesHeadersType::RegularExpression) => MatchType::RegularExpression,
                _ => MatchType::Exact,
            }),
            name: header.name,
            value: header.value,
        })
        .collect();
    if draft.matches.query_params.as_ref().is_some_and(|q| !q.is_empty()) {
        notifications.info(
            source,
            "Query parameter matches are not supported on GRPCRoute and were dropped",
        );
    }

    let matches = if method.is_some() || !headers.is_empty() {
        vec![GrpcRouteMatch { method, headers }]
    } else {
        Vec::new()
    };

    GrpcRouteRule {
        matches,
        filters: grpc_filters(draft.filters, source, notifications),
        backend_refs: draft
            .backends
            .into_iter()
            .map(|target| {
                let (backend, filters) = backend_ref(target, route_namespace, source, notifications);
                GrpcBackendRef {
                    backend,
                    filters: grpc_filters(filters, source, notifications),
                }
            })
            .collect(),
    }
}

fn parent_refs(namespace: &str, section: Option<&str>) -> Vec<ParentReference> {
    vec![ParentReference {
        name: gateway_name(namespace),
        section_name: section.map(str::to_string),
        ..Default::default()
    }]
}

/// Builds the HTTPRoute, GRPCRoute and BackendTLSPolicies of one
/// VirtualServer from its resolved routes.
pub fn assemble_routes<'a>(
    vs: &VirtualServer,
    source: &ObjectRef,
    resolved: &[ResolvedRoute<'a>],
    catalog: &UpstreamCatalog<'a>,
    sections: &VirtualServerSections,
    options: &ConversionOptions,
    notifications: &mut Notifications,
) -> AssembledRoutes {
    let vs_name = vs.name_any();
    let namespace = catalog.namespace().to_string();
    let host = vs.spec.host.clone();

    let mut referenced: BTreeMap<ObjectRef, UpstreamCatalog<'a>> = BTreeMap::new();
    for route in resolved.iter().filter(|r| r.kind == SourceKind::Referenced) {
        let upstreams = route.upstreams.unwrap_or_default();
        if !referenced.contains_key(&route.owner) {
            let owner_namespace = route.owner.namespace().clone().unwrap_or_else(|| namespace.clone());
            let built = UpstreamCatalog::build(upstreams, &owner_namespace, &route.owner, notifications);
            referenced.insert(route.owner.clone(), built);
        }
    }

    let mut drafts = Vec::new();
    for route in resolved {
        let route_catalog = match route.kind {
            SourceKind::Inline => Some(catalog),
            SourceKind::Referenced => referenced.get(&route.owner),
        };
        let Some(route_catalog) = route_catalog else {
            continue;
        };
        drafts.extend(route_rules(route.route, route_catalog, &route.owner, notifications));
    }

    let (grpc_drafts, http_drafts): (Vec<_>, Vec<_>) = drafts.into_iter().partition(RuleDraft::is_grpc);

    let http_rules: Vec<_> = http_drafts
        .into_iter()
        .map(|draft| http_rule(draft, &namespace, source, notifications))
        .collect();
    let grpc_rules: Vec<_> = grpc_drafts
        .into_iter()
        .map(|draft| grpc_rule(draft, &namespace, source, notifications))
        .collect();

    let route_labels = labels(options, SOURCE_VIRTUAL_SERVER, VS_NAME_LABEL_SUFFIX, &vs_name);

    let http_route = (!http_rules.is_empty()).then(|| {
        let name = http_route_name(&vs_name);
        notifications.info(
            source,
            format!(
                "Created HTTPRoute '{name}' with {} HTTP rules for host '{host}'",
                http_rules.len()
            ),
        );
        HttpRoute {
            metadata: object_meta(&namespace, name, route_labels.clone()),
            spec: HttpRouteSpec {
                parent_refs: parent_refs(&namespace, sections.primary()),
                hostnames: vec![host.clone()],
                rules: http_rules,
            },
        }
    });

    let grpc_route = (!grpc_rules.is_empty()).then(|| {
        let name = grpc_route_name(&vs_name);
        notifications.info(
            source,
            format!(
                "Created GRPCRoute '{name}' with {} gRPC rules for host '{host}'",
                grpc_rules.len()
            ),
        );
        GrpcRoute {
            metadata: object_meta(&namespace, name, route_labels.clone()),
            spec: GrpcRouteSpec {
                parent_refs: parent_refs(&namespace, sections.primary()),
                hostnames: vec![host.clone()],
                rules: grpc_rules,
            },
        }
    });

    let mut extension = catalog.extension();
    for owned in referenced.values() {
        for (name, upstream) in owned.extension().upstreams {
            extension.upstreams.entry(name).or_insert(upstream);
        }
    }

    let mut backend_tls_policies = catalog.backend_tls_policies(&vs_name, options, notifications);
    for owned in referenced.values() {
        backend_tls_policies.extend(owned.backend_tls_policies(&vs_name, options, notifications));
    }

    AssembledRoutes {
        http_route,
        grpc_route,
        redirect_route: redirect_route(vs, source, sections, options, notifications),
        backend_tls_policies,
        extension,
    }
}

/// Catch-all HTTPS redirect on the plain HTTP listener, when TLS redirect
/// is enabled and the Gateway terminates TLS for the host.
pub fn redirect_route(
    vs: &VirtualServer,
    source: &ObjectRef,
    sections: &VirtualServerSections,
    options: &ConversionOptions,
    notifications: &mut Notifications,
) -> Option<HttpRoute> {
    let redirect = vs
        .spec
        .tls
        .as_ref()
        .and_then(|tls| tls.redirect.as_ref())
        .filter(|redirect| redirect.enable)?;
    let http_section = sections.http.as_deref()?;
    sections.https.as_ref()?;

    if redirect.based_on.as_deref().is_some_and(|b| !b.is_empty()) {
        notifications.info(
            source,
            "TLS redirect 'basedOn' is not converted; the redirect applies to every plain HTTP request",
        );
    }

    let vs_name = vs.name_any();
    let namespace = vs.namespace().unwrap_or_else(|| "default".to_string());
    let code = redirect_status_code(redirect.code);

    Some(HttpRoute {
        metadata: object_meta(
            &namespace,
            redirect_route_name(&vs_name),
            labels(options, SOURCE_VIRTUAL_SERVER, VS_NAME_LABEL_SUFFIX, &vs_name),
        ),
        spec: HttpRouteSpec {
            parent_refs: parent_refs(&namespace, Some(http_section)),
            hostnames: vec![vs.spec.host.clone()],
            rules: vec![HttpRouteRule {
                matches: vec![HTTPRouteRulesMatches {
                    path: Some(HTTPRouteRulesMatchesPath {
                        r#type: Some(HTTPRouteRulesMatchesPathType::PathPrefix),
                        value: Some("/".to_string()),
                    }),
                    ..Default::default()
                }],
                filters: vec![HttpRouteFilter::RequestRedirect {
                    request_redirect: HTTPRouteRulesFiltersRequestRedirect {
                        scheme: Some(HTTPRouteRulesFiltersRequestRedirectScheme::Https),
                        port: (sections.https_port != DEFAULT_HTTPS_PORT)
                            .then(|| sections.https_port.into()),
                        status_code: Some(code.into()),
                        ..Default::default()
                    },
                }],
                backend_refs: Vec::new(),
            }],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::resolver::{RouteIndex, resolve_routes};
    use crate::notifications::Severity;
    use nic2gw_api::nginx::{
        Action, ActionProxy, Condition, Match, ProxyRequestHeaders, Header, Split, Tls, TlsRedirect,
        Upstream, VirtualServerRoute, VirtualServerRouteSpec, VirtualServerSpec,
    };
    use rstest::{fixture, rstest};

    fn upstream(name: &str, service: &str, port: u16, grpc: bool) -> Upstream {
        Upstream {
            name: name.to_string(),
            service: service.to_string(),
            port,
            protocol: grpc.then(|| "grpc".to_string()),
            ..Default::default()
        }
    }

    fn pass(name: &str) -> Option<Action> {
        Some(Action {
            pass: Some(name.to_string()),
            ..Default::default()
        })
    }

    fn header(name: &str, value: &str) -> Condition {
        Condition {
            header: Some(name.to_string()),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[fixture]
    fn cafe() -> VirtualServer {
        let mut vs = VirtualServer::new(
            "cafe",
            VirtualServerSpec {
                host: "cafe.example.com".to_string(),
                upstreams: vec![
                    upstream("tea", "tea-svc", 80, false),
                    upstream("tea-v2", "tea-v2-svc", 80, false),
                    upstream("greeter", "greeter-svc", 50051, true),
                ],
                ..Default::default()
            },
        );
        vs.metadata.namespace = Some("default".to_string());
        vs
    }

    fn sections() -> VirtualServerSections {
        VirtualServerSections {
            http: Some("http-80-cafe-example-com".to_string()),
            https: None,
            https_port: 443,
        }
    }

    fn assemble(vs: &VirtualServer, vsrs: &[VirtualServerRoute]) -> (AssembledRoutes, Notifications) {
        let mut notifications = Notifications::new();
        let source = ObjectRef::for_object(vs).unwrap_or_else(|_| panic!("unnamed"));
        let catalog = UpstreamCatalog::build(&vs.spec.upstreams, "default", &source, &mut notifications);
        let index = RouteIndex::new(vsrs);
        let resolved = resolve_routes(&vs.spec.routes, &index, &source, &mut notifications)
            .unwrap_or_default();
        let assembled = assemble_routes(
            vs,
            &source,
            &resolved,
            &catalog,
            &sections(),
            &ConversionOptions::default(),
            &mut notifications,
        );
        (assembled, notifications)
    }

    fn rule_paths(route: &HttpRoute) -> Vec<(Option<HTTPRouteRulesMatchesPathType>, String)> {
        route
            .spec
            .rules
            .iter()
            .flat_map(|rule| &rule.matches)
            .filter_map(|m| m.path.as_ref())
            .map(|p| (p.r#type.clone(), p.value.clone().unwrap_or_default()))
            .collect()
    }

    #[rstest]
    #[case("/tea", HTTPRouteRulesMatchesPathType::PathPrefix, "/tea", 0)]
    #[case("", HTTPRouteRulesMatchesPathType::PathPrefix, "/", 0)]
    #[case("=/exact", HTTPRouteRulesMatchesPathType::Exact, "/exact", 0)]
    #[case("~ ^/v[0-9]+/", HTTPRouteRulesMatchesPathType::RegularExpression, "^/v[0-9]+/", 0)]
    #[case("~* \\.png$", HTTPRouteRulesMatchesPathType::RegularExpression, "(?i)\\.png$", 1)]
    fn test_path_match(
        #[case] path: &str,
        #[case] expected_type: HTTPRouteRulesMatchesPathType,
        #[case] expected_value: &str,
        #[case] infos: usize,
    ) {
        let source = ObjectRef::builder().kind("VirtualServer").name("cafe").build();
        let mut notifications = Notifications::new();
        let matched = path_match(path, &source, &mut notifications);

        assert_eq!(matched.r#type, Some(expected_type));
        assert_eq!(matched.value.as_deref(), Some(expected_value));
        assert_eq!(notifications.count(Severity::Info), infos);
    }

    #[rstest]
    fn test_matches_precede_catch_all(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![Route {
            path: "/tea".to_string(),
            action: pass("tea"),
            matches: vec![
                Match {
                    conditions: vec![header("x-version", "v2")],
                    action: pass("tea-v2"),
                    ..Default::default()
                },
                Match {
                    conditions: vec![header("x-canary", "true")],
                    splits: vec![
                        Split { weight: 90, action: pass("tea") },
                        Split { weight: 10, action: pass("tea-v2") },
                    ],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }];

        let (assembled, notifications) = assemble(&cafe, &[]);
        let Some(route) = assembled.http_route else {
            panic!("expected an HTTPRoute");
        };

        assert_eq!(route.metadata.name.as_deref(), Some("cafe-httproute"));
        assert_eq!(route.spec.hostnames, vec!["cafe.example.com".to_string()]);
        assert_eq!(
            route.spec.parent_refs[0].section_name.as_deref(),
            Some("http-80-cafe-example-com")
        );
        assert_eq!(route.spec.rules.len(), 3);

        let first = &route.spec.rules[0];
        assert_eq!(first.matches[0].headers.as_ref().map(Vec::len), Some(1));
        assert_eq!(first.backend_refs[0].backend.name, "tea-v2-svc");

        let weights: Vec<_> = route.spec.rules[1]
            .backend_refs
            .iter()
            .map(|b| (b.backend.name.as_str(), b.backend.weight))
            .collect();
        assert_eq!(weights, vec![("tea-svc", Some(90)), ("tea-v2-svc", Some(10))]);

        let last = &route.spec.rules[2];
        assert!(last.matches[0].headers.is_none());
        assert_eq!(last.backend_refs[0].backend.name, "tea-svc");
        assert_eq!(last.backend_refs[0].backend.port, Some(80));
        assert!(last.backend_refs[0].backend.namespace.is_none());

        assert_eq!(notifications.count(Severity::Warning), 0);
        assert!(assembled.grpc_route.is_none());
    }

    #[rstest]
    fn test_match_without_predicates_is_skipped(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![Route {
            path: "/tea".to_string(),
            action: pass("tea"),
            matches: vec![Match {
                conditions: vec![Condition {
                    variable: Some("$request_method".to_string()),
                    value: "POST".to_string(),
                    ..Default::default()
                }],
                action: pass("tea-v2"),
                ..Default::default()
            }],
            ..Default::default()
        }];

        let (assembled, notifications) = assemble(&cafe, &[]);
        assert_eq!(assembled.http_route.map(|r| r.spec.rules.len()), Some(1));
        assert_eq!(notifications.count(Severity::Warning), 1);
    }

    #[rstest]
    fn test_unresolved_pass_keeps_empty_rule(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![
            Route {
                path: "/milk".to_string(),
                action: pass("milk"),
                ..Default::default()
            },
            Route {
                path: "/tea".to_string(),
                action: pass("tea"),
                ..Default::default()
            },
        ];

        let (assembled, notifications) = assemble(&cafe, &[]);
        let Some(route) = assembled.http_route else {
            panic!("expected an HTTPRoute");
        };
        assert_eq!(route.spec.rules.len(), 2);
        assert!(route.spec.rules[0].backend_refs.is_empty());
        assert_eq!(
            rule_paths(&route)[1],
            (Some(HTTPRouteRulesMatchesPathType::PathPrefix), "/tea".to_string())
        );
        assert_eq!(notifications.count(Severity::Warning), 1);
    }

    #[rstest]
    fn test_grpc_rules_are_split_out(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![
            Route {
                path: "/helloworld.Greeter/SayHello".to_string(),
                action: Some(Action {
                    proxy: Some(ActionProxy {
                        upstream: "greeter".to_string(),
                        rewrite_path: Some("/v2".to_string()),
                        request_headers: Some(ProxyRequestHeaders {
                            pass: None,
                            set: vec![Header {
                                name: "x-client".to_string(),
                                value: "nginx".to_string(),
                            }],
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                matches: vec![Match {
                    conditions: vec![header("x-tenant", "acme")],
                    action: pass("greeter"),
                    ..Default::default()
                }],
                ..Default::default()
            },
            Route {
                path: "/tea".to_string(),
                action: pass("tea"),
                ..Default::default()
            },
        ];

        let (assembled, notifications) = assemble(&cafe, &[]);
        assert_eq!(assembled.http_route.map(|r| r.spec.rules.len()), Some(1));
        let Some(grpc) = assembled.grpc_route else {
            panic!("expected a GRPCRoute");
        };

        assert_eq!(grpc.metadata.name.as_deref(), Some("cafe-grpcroute"));
        assert_eq!(grpc.spec.rules.len(), 2);

        let header_rule = &grpc.spec.rules[0];
        let method = header_rule.matches[0].method.as_ref();
        assert_eq!(method.and_then(|m| m.service.as_deref()), Some("helloworld.Greeter"));
        assert_eq!(method.and_then(|m| m.method.as_deref()), Some("SayHello"));
        assert_eq!(header_rule.matches[0].headers[0].name, "x-tenant");
        assert_eq!(
            header_rule.matches[0].headers[0].match_type,
            Some(MatchType::RegularExpression)
        );

        let proxy_rule = &grpc.spec.rules[1];
        assert_eq!(proxy_rule.backend_refs[0].backend.name, "greeter-svc");
        assert_eq!(proxy_rule.filters.len(), 1);
        assert!(matches!(
            proxy_rule.filters[0],
            GrpcRouteFilter::RequestHeaderModifier { .. }
        ));
        assert!(
            notifications
                .iter()
                .any(|n| n.message() == "URL rewrite filter not applicable to gRPC, skipping")
        );
    }

    #[rstest]
    #[case("/helloworld.Greeter/SayHello", Some("helloworld.Greeter"), Some("SayHello"))]
    #[case("/api/v1.UserService/GetUser", Some("api/v1.UserService"), Some("GetUser"))]
    #[case("/helloworld.Greeter", Some("helloworld.Greeter"), None)]
    #[case("/helloworld.Greeter/", Some("helloworld.Greeter"), None)]
    #[case("/", None, None)]
    fn test_grpc_method_match(
        #[case] value: &str,
        #[case] service: Option<&str>,
        #[case] method: Option<&str>,
    ) {
        let source = ObjectRef::builder().kind("VirtualServer").name("cafe").build();
        let mut notifications = Notifications::new();
        let path = HTTPRouteRulesMatchesPath {
            r#type: Some(HTTPRouteRulesMatchesPathType::Exact),
            value: Some(value.to_string()),
        };

        let matched = grpc_method_match(Some(&path), &source, &mut notifications);

        assert_eq!(matched.as_ref().and_then(|m| m.service.as_deref()), service);
        assert_eq!(matched.as_ref().and_then(|m| m.method.as_deref()), method);
        assert!(notifications.is_empty());
    }

    #[rstest]
    fn test_referenced_routes_use_own_upstreams(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![Route {
            path: "/auth".to_string(),
            route: Some("auth/shared-routes".to_string()),
            ..Default::default()
        }];
        let mut shared = VirtualServerRoute::new(
            "shared-routes",
            VirtualServerRouteSpec {
                host: "cafe.example.com".to_string(),
                upstreams: vec![upstream("login", "login-svc", 8080, false)],
                subroutes: vec![Route {
                    path: "/auth/login".to_string(),
                    action: pass("login"),
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        shared.metadata.namespace = Some("auth".to_string());

        let (assembled, notifications) = assemble(&cafe, &[shared]);
        let Some(route) = assembled.http_route else {
            panic!("expected an HTTPRoute");
        };
        let backend = &route.spec.rules[0].backend_refs[0].backend;
        assert_eq!(backend.name, "login-svc");
        assert_eq!(backend.namespace.as_deref(), Some("auth"));
        assert!(notifications.iter().any(|n| n.message().contains("ReferenceGrant")));
    }

    #[rstest]
    fn test_route_level_unsupported_fields(mut cafe: VirtualServer) {
        cafe.spec.routes = vec![Route {
            path: "/tea".to_string(),
            action: pass("tea"),
            location_snippets: "add_header X-Tea 1;".to_string(),
            ..Default::default()
        }];

        let (_, notifications) = assemble(&cafe, &[]);
        assert_eq!(notifications.count(Severity::Warning), 1);
        assert!(notifications.as_slice()[0].message().contains("location-snippets"));
    }

    #[rstest]
    #[case(None, 443, Some(301), None)]
    #[case(Some(307), 443, Some(302), None)]
    #[case(Some(302), 8443, Some(302), Some(8443))]
    fn test_redirect_route(
        mut cafe: VirtualServer,
        #[case] code: Option<u16>,
        #[case] https_port: u16,
        #[case] expected_code: Option<i64>,
        #[case] expected_port: Option<i32>,
    ) {
        cafe.spec.tls = Some(Tls {
            secret: Some("cafe-secret".to_string()),
            redirect: Some(TlsRedirect {
                enable: true,
                code,
                ..Default::default()
            }),
            ..Default::default()
        });
        let sections = VirtualServerSections {
            http: Some("http-80-cafe-example-com".to_string()),
            https: Some(format!("https-{https_port}-cafe-example-com")),
            https_port,
        };
        let source = ObjectRef::builder().kind("VirtualServer").name("cafe").build();
        let mut notifications = Notifications::new();

        let route = redirect_route(
            &cafe,
            &source,
            &sections,
            &ConversionOptions::default(),
            &mut notifications,
        );
        let Some(route) = route else {
            panic!("expected a redirect route");
        };

        assert_eq!(route.metadata.name.as_deref(), Some("cafe-redirect"));
        assert_eq!(
            route.spec.parent_refs[0].section_name.as_deref(),
            Some("http-80-cafe-example-com")
        );
        let HttpRouteFilter::RequestRedirect { request_redirect } = &route.spec.rules[0].filters[0]
        else {
            panic!("expected a redirect filter");
        };
        assert_eq!(
            request_redirect.scheme,
            Some(HTTPRouteRulesFiltersRequestRedirectScheme::Https)
        );
        assert_eq!(request_redirect.status_code, expected_code);
        assert_eq!(request_redirect.port, expected_port);
    }

    #[rstest]
    fn test_no_redirect_without_https_listener(mut cafe: VirtualServer) {
        cafe.spec.tls = Some(Tls {
            redirect: Some(TlsRedirect {
                enable: true,
                ..Default::default()
            }),
            ..Default::default()
        });
        let source = ObjectRef::builder().kind("VirtualServer").name("cafe").build();
        let mut notifications = Notifications::new();

        let route = redirect_route(
            &cafe,
            &source,
            &sections(),
            &ConversionOptions::default(),
            &mut notifications,
        );
        assert!(route.is_none());
    }
}
