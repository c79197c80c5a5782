use crate::ir::{ProviderExtension, UpstreamExtension};
use crate::naming::{backend_tls_policy_name, labels, object_meta};
use crate::notifications::Notifications;
use crate::objects::ObjectRef;
use crate::options::ConversionOptions;
use nic2gw_api::constants::{SOURCE_VIRTUAL_SERVER_TLS, VS_NAME_LABEL_SUFFIX};
use nic2gw_api::gateway::{
    BackendTlsPolicy, BackendTlsPolicySpec, BackendTlsPolicyValidation, PolicyTargetReference,
};
use nic2gw_api::nginx::Upstream;
use std::collections::BTreeMap;

/// Returns false, with a warning, when the upstream cannot back a route.
pub fn validate_upstream(
    upstream: &Upstream,
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> bool {
    if upstream.service.is_empty() {
        notifications.warning(
            source,
            format!("Upstream '{}' has no service specified", upstream.name),
        );
        return false;
    }
    if upstream.port == 0 {
        notifications.warning(
            source,
            format!("Upstream '{}' has no port specified", upstream.name),
        );
        return false;
    }
    true
}

/// Load-balancing method a Gateway API implementation already applies.
const DEFAULT_LB_METHOD: &str = "least_conn";

/// Names of tuning fields set on the upstream that Gateway API cannot express.
pub fn unsupported_fields(upstream: &Upstream) -> Vec<&'static str> {
    let set = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    [
        (
            "lb-method",
            upstream
                .lb_method
                .as_deref()
                .is_some_and(|method| !method.is_empty() && method != DEFAULT_LB_METHOD),
        ),
        ("subselector", !upstream.subselector.is_empty()),
        ("use-cluster-ip", upstream.use_cluster_ip),
        ("fail-timeout", set(&upstream.fail_timeout)),
        ("max-fails", upstream.max_fails.is_some()),
        ("max-conns", upstream.max_conns.is_some()),
        ("keepalive", upstream.keepalive.is_some()),
        ("connect-timeout", set(&upstream.connect_timeout)),
        ("read-timeout", set(&upstream.read_timeout)),
        ("send-timeout", set(&upstream.send_timeout)),
        ("next-upstream", set(&upstream.next_upstream)),
        ("next-upstream-timeout", set(&upstream.next_upstream_timeout)),
        ("next-upstream-tries", upstream.next_upstream_tries.is_some()),
        ("client-max-body-size", set(&upstream.client_max_body_size)),
        ("healthCheck", upstream.health_check.as_ref().is_some_and(|h| h.enable)),
        ("slow-start", set(&upstream.slow_start)),
        ("queue", upstream.queue.is_some()),
        ("buffering", upstream.buffering.is_some()),
        ("buffers", upstream.buffers.is_some()),
        ("buffer-size", set(&upstream.buffer_size)),
        ("ntlm", upstream.ntlm),
        ("backup", set(&upstream.backup)),
        ("backupPort", upstream.backup_port.is_some()),
        (
            "sessionCookie",
            upstream.session_cookie.as_ref().is_some_and(|c| c.enable),
        ),
    ]
    .into_iter()
    .filter_map(|(field, is_set)| is_set.then_some(field))
    .collect()
}

/// Valid upstreams of one owner (VirtualServer or VirtualServerRoute),
/// looked up by upstream name.
#[derive(Debug, Clone)]
pub struct UpstreamCatalog<'a> {
    namespace: String,
    owner: ObjectRef,
    upstreams: BTreeMap<&'a str, &'a Upstream>,
}

impl<'a> UpstreamCatalog<'a> {
    /// Validates every upstream and reports unconverted tuning fields once.
    pub fn build(
        upstreams: &'a [Upstream],
        namespace: &str,
        owner: &ObjectRef,
        notifications: &mut Notifications,
    ) -> Self {
        let mut catalog = BTreeMap::new();

        for upstream in upstreams {
            if !validate_upstream(upstream, owner, notifications) {
                continue;
            }
            if catalog.contains_key(upstream.name.as_str()) {
                notifications.warning(
                    owner,
                    format!(
                        "Upstream '{}' is defined more than once, keeping the first definition",
                        upstream.name
                    ),
                );
                continue;
            }
            for field in unsupported_fields(upstream) {
                notifications.info(
                    owner,
                    format!(
                        "Upstream '{}': {field} field is not currently converted to Gateway API",
                        upstream.name
                    ),
                );
            }
            catalog.insert(upstream.name.as_str(), upstream);
        }

        Self {
            namespace: namespace.to_string(),
            owner: owner.clone(),
            upstreams: catalog,
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Upstream> {
        self.upstreams.get(name).copied()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn owner(&self) -> &ObjectRef {
        &self.owner
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Upstream> + '_ {
        self.upstreams.values().copied()
    }

    pub fn extension(&self) -> ProviderExtension {
        ProviderExtension {
            upstreams: self
                .iter()
                .filter_map(|u| UpstreamExtension::from_upstream(u).map(|e| (u.name.clone(), e)))
                .collect(),
        }
    }

    /// One policy per TLS-enabled upstream. Validation is left blank and
    /// flagged for manual configuration.
    pub fn backend_tls_policies(
        &self,
        vs_name: &str,
        options: &ConversionOptions,
        notifications: &mut Notifications,
    ) -> Vec<BackendTlsPolicy> {
        self.iter()
            .filter(|upstream| upstream.tls_enabled())
            .map(|upstream| {
                let name = backend_tls_policy_name(&upstream.service, &upstream.name);
                notifications.warning(
                    &self.owner,
                    format!(
                        "BackendTLSPolicy '{name}' created but requires manual configuration. \
                         You must set the 'validation.hostname' field to match the backend \
                         certificate and configure CA certificates (caCertificateRefs or \
                         wellKnownCACertificates)"
                    ),
                );

                BackendTlsPolicy {
                    metadata: object_meta(
                        &self.namespace,
                        name,
                        labels(options, SOURCE_VIRTUAL_SERVER_TLS, VS_NAME_LABEL_SUFFIX, vs_name),
                    ),
                    spec: BackendTlsPolicySpec {
                        target_refs: vec![PolicyTargetReference {
                            group: String::new(),
                            kind: "Service".to_string(),
                            name: upstream.service.clone(),
                            section_name: None,
                        }],
                        validation: BackendTlsPolicyValidation::default(),
                    },
                }
            })
            .collect()
    }
}
