use crate::notifications::Notifications;
use crate::objects::{NamespacedName, ObjectRef};
use kube::ResourceExt;
use nic2gw_api::nginx::{Route, Upstream, VirtualServerRoute};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("route owner {0} has no namespace")]
    OwnerWithoutNamespace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Inline,
    Referenced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute<'a> {
    pub route: &'a Route,
    pub kind: SourceKind,
    /// The VirtualServer for inline routes, the VirtualServerRoute otherwise.
    pub owner: ObjectRef,
    /// Set for referenced routes: upstream names resolve against the
    /// VirtualServerRoute's own upstream list.
    pub upstreams: Option<&'a [Upstream]>,
}

#[derive(Debug, Default, Clone)]
pub struct RouteIndex<'a> {
    routes: BTreeMap<NamespacedName, (ObjectRef, &'a VirtualServerRoute)>,
}

impl<'a> RouteIndex<'a> {
    pub fn new(routes: &'a [VirtualServerRoute]) -> Self {
        let routes = routes
            .iter()
            .filter_map(|vsr| {
                let owner = ObjectRef::for_object(vsr).ok()?;
                Some((NamespacedName::for_object(vsr, "default"), (owner, vsr)))
            })
            .collect();
        Self { routes }
    }

    pub fn get(&self, key: &NamespacedName) -> Option<(&ObjectRef, &'a VirtualServerRoute)> {
        self.routes.get(key).map(|(owner, vsr)| (owner, *vsr))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// `name` resolves in the owner's namespace, `namespace/name` anywhere.
pub fn parse_reference(reference: &str, owner_namespace: &str) -> Option<NamespacedName> {
    match reference.split('/').collect::<Vec<_>>().as_slice() {
        [name] if !name.is_empty() => Some(NamespacedName::new(owner_namespace, *name)),
        [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
            Some(NamespacedName::new(*namespace, *name))
        }
        _ => None,
    }
}

/// Expands referenced VirtualServerRoutes one level deep.
pub fn resolve_routes<'a>(
    routes: &'a [Route],
    index: &RouteIndex<'a>,
    owner: &ObjectRef,
    notifications: &mut Notifications,
) -> Result<Vec<ResolvedRoute<'a>>, ResolveError> {
    let owner_namespace = owner
        .namespace()
        .as_deref()
        .ok_or_else(|| ResolveError::OwnerWithoutNamespace(owner.to_string()))?;

    let mut resolved = Vec::with_capacity(routes.len());

    for route in routes {
        let Some(reference) = route.reference() else {
            resolved.push(ResolvedRoute {
                route,
                kind: SourceKind::Inline,
                owner: owner.clone(),
                upstreams: None,
            });
            continue;
        };

        let Some(key) = parse_reference(reference, owner_namespace) else {
            notifications.warning(
                owner,
                format!("VirtualServerRoute reference '{reference}' is malformed, skipping route"),
            );
            continue;
        };

        let Some((vsr_ref, vsr)) = index.get(&key) else {
            notifications.warning(
                owner,
                format!("VirtualServerRoute {key} not found, skipping route"),
            );
            continue;
        };

        let before = resolved.len();
        for subroute in &vsr.spec.subroutes {
            if let Some(nested) = subroute.reference() {
                notifications.warning(
                    vsr_ref,
                    format!(
                        "Subroute '{}' references VirtualServerRoute '{nested}'; nested references are not supported, skipping subroute",
                        subroute.path
                    ),
                );
                continue;
            }
            resolved.push(ResolvedRoute {
                route: subroute,
                kind: SourceKind::Referenced,
                owner: vsr_ref.clone(),
                upstreams: Some(&vsr.spec.upstreams),
            });
        }

        let count = resolved.len() - before;
        debug!("Resolved {} subroutes object.ref={}", count, vsr.name_any());
        if count > 0 {
            notifications.info(
                owner,
                format!("Resolved {count} routes from VirtualServerRoute {key}"),
            );
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Severity;
    use nic2gw_api::nginx::{Action, VirtualServerRouteSpec};
    use rstest::{fixture, rstest};

    fn vsr(namespace: &str, name: &str, paths: &[&str]) -> VirtualServerRoute {
        let mut vsr = VirtualServerRoute::new(
            name,
            VirtualServerRouteSpec {
                host: "cafe.example.com".to_string(),
                upstreams: vec![Upstream {
                    name: "auth".to_string(),
                    service: "auth-svc".to_string(),
                    port: 8080,
                    ..Default::default()
                }],
                subroutes: paths
                    .iter()
                    .map(|path| Route {
                        path: (*path).to_string(),
                        action: Some(Action {
                            pass: Some("auth".to_string()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            },
        );
        vsr.metadata.namespace = Some(namespace.to_string());
        vsr
    }

    fn reference(path: &str, reference: &str) -> Route {
        Route {
            path: path.to_string(),
            route: Some(reference.to_string()),
            ..Default::default()
        }
    }

    #[fixture]
    fn owner() -> ObjectRef {
        ObjectRef::builder()
            .kind("VirtualServer")
            .namespace(Some("default".to_string()))
            .name("cafe")
            .build()
    }

    #[rstest]
    #[case("shared", "default", Some(("default", "shared")))]
    #[case("auth/shared", "default", Some(("auth", "shared")))]
    #[case("a/b/c", "default", None)]
    #[case("/shared", "default", None)]
    #[case("", "default", None)]
    fn test_parse_reference(
        #[case] reference: &str,
        #[case] namespace: &str,
        #[case] expected: Option<(&str, &str)>,
    ) {
        assert_eq!(
            parse_reference(reference, namespace),
            expected.map(|(ns, name)| NamespacedName::new(ns, name))
        );
    }

    #[rstest]
    fn test_inline_routes_pass_through(owner: ObjectRef) {
        let routes = vec![Route {
            path: "/".to_string(),
            ..Default::default()
        }];
        let index = RouteIndex::default();
        let mut notifications = Notifications::new();

        let resolved = resolve_routes(&routes, &index, &owner, &mut notifications)
            .unwrap_or_default();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].kind, SourceKind::Inline);
        assert!(resolved[0].upstreams.is_none());
        assert!(notifications.is_empty());
    }

    #[rstest]
    fn test_cross_namespace_reference(owner: ObjectRef) {
        let vsrs = vec![vsr("auth", "shared-routes", &["/auth/login", "/auth/logout"])];
        let index = RouteIndex::new(&vsrs);
        let routes = vec![reference("/auth", "auth/shared-routes")];
        let mut notifications = Notifications::new();

        let resolved = resolve_routes(&routes, &index, &owner, &mut notifications)
            .unwrap_or_default();

        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|r| r.kind == SourceKind::Referenced));
        assert!(resolved.iter().all(|r| r.upstreams.is_some_and(|u| u.len() == 1)));
        assert_eq!(resolved[0].owner.name(), "shared-routes");
        assert_eq!(resolved[0].owner.namespace().as_deref(), Some("auth"));
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications.count(Severity::Info), 1);
        assert!(
            notifications.as_slice()[0]
                .message()
                .to_lowercase()
                .contains("resolved 2 routes")
        );
    }

    #[rstest]
    fn test_missing_reference_warns(owner: ObjectRef) {
        let index = RouteIndex::default();
        let routes = vec![reference("/auth", "shared-routes")];
        let mut notifications = Notifications::new();

        let resolved = resolve_routes(&routes, &index, &owner, &mut notifications)
            .unwrap_or_default();
        assert!(resolved.is_empty());
        assert_eq!(notifications.count(Severity::Warning), 1);
        assert_eq!(
            notifications.as_slice()[0].message(),
            "VirtualServerRoute default/shared-routes not found, skipping route"
        );
    }

    #[rstest]
    fn test_nested_reference_rejected(owner: ObjectRef) {
        let mut shared = vsr("default", "shared", &["/a"]);
        shared.spec.subroutes.push(reference("/a/b", "deeper"));
        let vsrs = vec![shared];
        let index = RouteIndex::new(&vsrs);
        let routes = vec![reference("/a", "shared")];
        let mut notifications = Notifications::new();

        let resolved = resolve_routes(&routes, &index, &owner, &mut notifications)
            .unwrap_or_default();
        assert_eq!(resolved.len(), 1);
        assert_eq!(notifications.count(Severity::Warning), 1);
        assert_eq!(notifications.count(Severity::Info), 1);
    }

    #[test]
    fn test_owner_without_namespace_is_error() {
        let owner = ObjectRef::builder().kind("VirtualServer").name("cafe").build();
        let mut notifications = Notifications::new();
        let result = resolve_routes(&[], &RouteIndex::default(), &owner, &mut notifications);
        assert_eq!(
            result,
            Err(ResolveError::OwnerWithoutNamespace("VirtualServer/cafe".to_string()))
        );
    }
}
