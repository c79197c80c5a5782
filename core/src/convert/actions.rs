use crate::convert::upstreams::UpstreamCatalog;
use crate::model::RouteAction;
use crate::notifications::Notifications;
use crate::objects::ObjectRef;
use gateway_api::apis::standard::httproutes::{
    HTTPRouteRulesFiltersRequestHeaderModifier, HTTPRouteRulesFiltersRequestHeaderModifierSet,
    HTTPRouteRulesFiltersRequestRedirect, HTTPRouteRulesFiltersRequestRedirectPath,
    HTTPRouteRulesFiltersRequestRedirectPathType, HTTPRouteRulesFiltersRequestRedirectScheme,
    HTTPRouteRulesFiltersResponseHeaderModifier, HTTPRouteRulesFiltersResponseHeaderModifierSet,
    HTTPRouteRulesFiltersUrlRewrite, HTTPRouteRulesFiltersUrlRewritePath,
    HTTPRouteRulesFiltersUrlRewritePathType,
};
use nic2gw_api::gateway::HttpRouteFilter;
use nic2gw_api::nginx::{Action, ActionProxy, ProxyRequestHeaders, ProxyResponseHeaders, Split};
use url::Url;

pub const DEFAULT_REDIRECT_CODE: u16 = 301;

/// A backend reference that still knows which upstream it came from, so
/// gRPC detection can run before names are rewritten to services.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendTarget {
    pub upstream: String,
    pub service: String,
    pub namespace: String,
    pub port: Option<u16>,
    pub grpc: bool,
    pub weight: Option<i32>,
    pub filters: Vec<HttpRouteFilter>,
}

impl BackendTarget {
    fn for_upstream(catalog: &UpstreamCatalog<'_>, name: &str) -> Option<Self> {
        catalog.get(name).map(|upstream| Self {
            upstream: upstream.name.clone(),
            service: upstream.service.clone(),
            namespace: catalog.namespace().to_string(),
            port: Some(upstream.port),
            grpc: upstream.is_grpc(),
            weight: None,
            filters: Vec::new(),
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TranslatedAction {
    pub backend: Option<BackendTarget>,
    pub filters: Vec<HttpRouteFilter>,
}

/// 307 and 308 are folded onto the codes Gateway API guarantees.
pub fn redirect_status_code(code: Option<u16>) -> u16 {
    match code {
        None | Some(0 | 308) => DEFAULT_REDIRECT_CODE,
        Some(307) => 302,
        Some(code) => code,
    }
}

fn full_path(path: String) -> HTTPRouteRulesFiltersRequestRedirectPath {
    HTTPRouteRulesFiltersRequestRedirectPath {
        r#type: HTTPRouteRulesFiltersRequestRedirectPathType::ReplaceFullPath,
        replace_full_path: Some(path),
        replace_prefix_match: None,
    }
}

/// True when the URL spells out a path after its authority; `Url` reports
/// `/` for both `http://a` and `http://a/`.
fn has_explicit_path(raw: &str) -> bool {
    raw.split_once("://")
        .is_some_and(|(_, rest)| rest.contains(['/', '?', '#']))
}

pub fn redirect_filter(
    raw_url: &str,
    code: Option<u16>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> HttpRouteFilter {
    let mut redirect = HTTPRouteRulesFiltersRequestRedirect {
        status_code: Some(redirect_status_code(code).into()),
        ..Default::default()
    };

    if raw_url.contains('$') {
        notifications.warning(
            source,
            format!("Redirect URL '{raw_url}' uses NGINX variables, which are not expanded by Gateway API"),
        );
    }

    match Url::parse(raw_url) {
        Ok(url) if url.has_host() => {
            match url.scheme() {
                "http" => redirect.scheme = Some(HTTPRouteRulesFiltersRequestRedirectScheme::Http),
                "https" => {
                    redirect.scheme = Some(HTTPRouteRulesFiltersRequestRedirectScheme::Https);
                }
                other => notifications.warning(
                    source,
                    format!("Redirect scheme '{other}' is not supported in Gateway API, dropping it"),
                ),
            }
            redirect.hostname = url.host_str().map(ToString::to_string);
            redirect.port = url.port().map(Into::into);

            if has_explicit_path(raw_url) {
                let mut path = url.path().to_string();
                if let Some(query) = url.query() {
                    path.push('?');
                    path.push_str(query);
                }
                if let Some(fragment) = url.fragment() {
                    path.push('#');
                    path.push_str(fragment);
                }
                redirect.path = Some(full_path(path));
            }
        }
        _ => redirect.path = Some(full_path(raw_url.to_string())),
    }

    HttpRouteFilter::RequestRedirect {
        request_redirect: redirect,
    }
}

fn lookup_backend(
    name: &str,
    upstreams: &UpstreamCatalog<'_>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<BackendTarget> {
    let backend = BackendTarget::for_upstream(upstreams, name);
    if backend.is_none() {
        notifications.warning(source, format!("Upstream '{name}' not found for route"));
    }
    backend
}

fn rewrite_filter(
    rewrite: &str,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<HttpRouteFilter> {
    if rewrite.contains('$') {
        notifications.warning(
            source,
            format!(
                "Rewrite path '{rewrite}' uses NGINX variables or capture groups, which Gateway API cannot express"
            ),
        );
        return None;
    }

    let path = if rewrite.starts_with('/') {
        notifications.info(
            source,
            format!("Path rewrite '{rewrite}' converted to URLRewrite filter with ReplaceFullPath"),
        );
        HTTPRouteRulesFiltersUrlRewritePath {
            r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplaceFullPath,
            replace_full_path: Some(rewrite.to_string()),
            replace_prefix_match: None,
        }
    } else if rewrite.is_empty() {
        notifications.info(
            source,
            "Empty path rewrite converted to URLRewrite filter with ReplacePrefixMatch '/'",
        );
        HTTPRouteRulesFiltersUrlRewritePath {
            r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch,
            replace_full_path: None,
            replace_prefix_match: Some("/".to_string()),
        }
    } else {
        notifications.info(
            source,
            format!("Path rewrite '{rewrite}' converted to URLRewrite filter with ReplacePrefixMatch"),
        );
        HTTPRouteRulesFiltersUrlRewritePath {
            r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch,
            replace_full_path: None,
            replace_prefix_match: Some(rewrite.to_string()),
        }
    };

    Some(HttpRouteFilter::UrlRewrite {
        url_rewrite: HTTPRouteRulesFiltersUrlRewrite {
            path: Some(path),
            ..Default::default()
        },
    })
}

fn request_header_filter(
    headers: &ProxyRequestHeaders,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<HttpRouteFilter> {
    if headers.pass == Some(false) {
        notifications.warning(
            source,
            "Request header 'pass: false' has no Gateway API equivalent, client headers are still forwarded",
        );
    }
    if headers.set.is_empty() {
        return None;
    }

    notifications.info(
        source,
        format!(
            "{} request header(s) converted to RequestHeaderModifier filter",
            headers.set.len()
        ),
    );
    Some(HttpRouteFilter::RequestHeaderModifier {
        request_header_modifier: HTTPRouteRulesFiltersRequestHeaderModifier {
            set: Some(
                headers
                    .set
                    .iter()
                    .map(|h| HTTPRouteRulesFiltersRequestHeaderModifierSet {
                        name: h.name.clone(),
                        value: h.value.clone(),
                    })
                    .collect(),
            ),
            ..Default::default()
        },
    })
}

fn response_header_filter(
    headers: &ProxyResponseHeaders,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Option<HttpRouteFilter> {
    if !headers.pass.is_empty() {
        notifications.warning(
            source,
            format!(
                "Response header 'pass' list ({}) has no Gateway API equivalent",
                headers.pass.join(", ")
            ),
        );
    }
    if !headers.ignore.is_empty() {
        notifications.warning(
            source,
            format!(
                "Response header 'ignore' list ({}) has no Gateway API equivalent",
                headers.ignore.join(", ")
            ),
        );
    }
    for header in headers.add.iter().filter(|h| !h.always) {
        notifications.warning(
            source,
            format!(
                "Response header '{}' without the always flag will be added to every response, \
                 Gateway API does not distinguish by status code",
                header.name
            ),
        );
    }

    if headers.add.is_empty() && headers.hide.is_empty() {
        return None;
    }

    let set = headers
        .add
        .iter()
        .map(|h| HTTPRouteRulesFiltersResponseHeaderModifierSet {
            name: h.name.clone(),
            value: h.value.clone(),
        })
        .collect::<Vec<_>>();

    notifications.info(source, "Response headers converted to ResponseHeaderModifier filter");
    Some(HttpRouteFilter::ResponseHeaderModifier {
        response_header_modifier: HTTPRouteRulesFiltersResponseHeaderModifier {
            set: (!set.is_empty()).then_some(set),
            remove: (!headers.hide.is_empty()).then(|| headers.hide.clone()),
            ..Default::default()
        },
    })
}

fn translate_proxy(
    proxy: &ActionProxy,
    upstreams: &UpstreamCatalog<'_>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> TranslatedAction {
    let backend = if proxy.upstream.is_empty() {
        notifications.warning(source, "Proxy action missing upstream reference");
        None
    } else {
        lookup_backend(&proxy.upstream, upstreams, source, notifications)
    };

    let filters = [
        proxy
            .rewrite_path
            .as_deref()
            .and_then(|rewrite| rewrite_filter(rewrite, source, notifications)),
        proxy
            .request_headers
            .as_ref()
            .and_then(|headers| request_header_filter(headers, source, notifications)),
        proxy
            .response_headers
            .as_ref()
            .and_then(|headers| response_header_filter(headers, source, notifications)),
    ]
    .into_iter()
    .flatten()
    .collect();

    TranslatedAction { backend, filters }
}

pub fn translate_action(
    action: &Action,
    upstreams: &UpstreamCatalog<'_>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> TranslatedAction {
    let action = match RouteAction::try_from(action) {
        Ok(action) => action,
        Err(error) => {
            notifications.warning(source, format!("Skipping route action: {error}"));
            return TranslatedAction::default();
        }
    };

    match action {
        RouteAction::Pass(name) => TranslatedAction {
            backend: lookup_backend(name, upstreams, source, notifications),
            filters: Vec::new(),
        },
        RouteAction::Redirect { url, code } => TranslatedAction {
            backend: None,
            filters: vec![redirect_filter(url, code, source, notifications)],
        },
        RouteAction::Return { code, .. } => {
            notifications.warning(
                source,
                format!(
                    "Return action with code {} not directly supported in Gateway API",
                    code.unwrap_or(200)
                ),
            );
            TranslatedAction::default()
        }
        RouteAction::Proxy(proxy) => translate_proxy(proxy, upstreams, source, notifications),
    }
}

/// Weighted backend refs for a split group. Proxy filters move onto the
/// backend ref; a redirect split becomes a filter-only backend ref.
pub fn translate_splits(
    splits: &[Split],
    upstreams: &UpstreamCatalog<'_>,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> Vec<BackendTarget> {
    if splits.is_empty() {
        return Vec::new();
    }

    let backends = splits
        .iter()
        .filter(|split| split.weight > 0)
        .filter_map(|split| split.action.as_ref().map(|action| (split.weight, action)))
        .filter_map(|(weight, action)| {
            let translated = translate_action(action, upstreams, source, notifications);
            match translated.backend {
                Some(backend) => Some(BackendTarget {
                    weight: Some(weight),
                    filters: translated.filters,
                    ..backend
                }),
                None if !translated.filters.is_empty() => Some(BackendTarget {
                    upstream: String::new(),
                    service: String::new(),
                    namespace: upstreams.namespace().to_string(),
                    port: None,
                    grpc: false,
                    weight: Some(weight),
                    filters: translated.filters,
                }),
                None => None,
            }
        })
        .collect();

    notifications.info(
        source,
        "Traffic splitting configuration converted to weighted backend refs",
    );
    backends
}
