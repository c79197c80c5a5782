pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const TOOL_NAME: &str = "nic2gw";

pub const NGINX_GROUP: &str = "k8s.nginx.org";
pub const NGINX_API_VERSION: &str = "k8s.nginx.org/v1";

pub const SOURCE_LABEL_SUFFIX: &str = "source";
pub const VS_NAME_LABEL_SUFFIX: &str = "vs-name";
pub const TS_NAME_LABEL_SUFFIX: &str = "ts-name";

pub const SOURCE_VIRTUAL_SERVER: &str = "nginx-virtualserver";
pub const SOURCE_VIRTUAL_SERVER_TLS: &str = "nginx-virtualserver-tls";
pub const SOURCE_TRANSPORT_SERVER: &str = "nginx-transportserver";

pub const DEFAULT_GATEWAY_CLASS: &str = "nginx";
pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;

pub const BUILTIN_TLS_PASSTHROUGH_LISTENER: &str = "tls-passthrough";
pub const BUILTIN_TLS_PASSTHROUGH_PORT: u16 = 443;

pub const PROTOCOL_TCP: &str = "TCP";
pub const PROTOCOL_UDP: &str = "UDP";
pub const PROTOCOL_TLS_PASSTHROUGH: &str = "TLS_PASSTHROUGH";
pub const PROTOCOL_HTTP: &str = "HTTP";
