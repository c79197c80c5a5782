use assertables::{assert_contains, assert_ge, assert_ok, assert_some};
use nic2gw_api::gateway::{HttpRouteFilter, ListenerProtocol};
use nic2gw_api::nginx::{GlobalConfiguration, TransportServer, VirtualServer, VirtualServerRoute};
use nic2gw_core::notifications::Severity;
use nic2gw_core::objects::NamespacedName;
use nic2gw_core::{ConversionInput, ConversionOptions, convert};

fn parse<T: serde::de::DeserializeOwned + std::fmt::Debug>(yaml: &str) -> T {
    assert_ok!(serde_yaml::from_str(yaml))
}

const SHOP: &str = r#"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: shop
  namespace: ecommerce
spec:
  host: shop.example.com
  tls:
    secret: shop-tls
    redirect:
      enable: true
      code: 301
  upstreams:
    - name: web-frontend
      service: web-frontend-svc
      port: 3000
    - name: api-backend
      service: api-backend-svc
      port: 8080
      tls:
        enable: true
  routes:
    - path: /
      action:
        pass: web-frontend
    - path: /api
      matches:
        - conditions:
            - header: X-API-Version
              value: v2
          action:
            proxy:
              upstream: api-backend
              rewritePath: /v2/api
              requestHeaders:
                set:
                  - name: X-Forwarded-Proto
                    value: https
      action:
        pass: api-backend
"#;

#[test_log::test]
fn ecommerce_with_tls_redirect() {
    let input = ConversionInput::builder()
        .virtual_servers(vec![parse::<VirtualServer>(SHOP)])
        .build();

    let output = convert(&input, &ConversionOptions::default());
    let ir = output.ir();
    let notifications = output.notifications();

    assert_eq!(ir.gateways().len(), 1);
    assert_eq!(ir.http_routes().len(), 2);
    assert_ge!(ir.backend_tls_policies().len(), 1);
    assert_eq!(notifications.count(Severity::Warning), 1);
    assert_ge!(notifications.count(Severity::Info), 1);
    assert_eq!(notifications.count(Severity::Error), 0);

    let gateway = assert_some!(
        ir.gateways()
            .get(&NamespacedName::new("ecommerce", "ecommerce-gateway"))
    );
    let protocols: Vec<_> = gateway.spec.listeners.iter().map(|l| l.protocol).collect();
    assert_eq!(protocols, vec![ListenerProtocol::Http, ListenerProtocol::Https]);

    let main = assert_some!(
        ir.http_routes()
            .get(&NamespacedName::new("ecommerce", "shop-httproute"))
    );
    assert_eq!(
        main.spec.parent_refs[0].section_name.as_deref(),
        Some("https-443-shop-example-com")
    );
    assert_eq!(main.spec.rules.len(), 3);
    assert_eq!(main.spec.rules[1].filters.len(), 2);

    let redirect = assert_some!(
        ir.http_routes()
            .get(&NamespacedName::new("ecommerce", "shop-redirect"))
    );
    assert!(matches!(
        redirect.spec.rules[0].filters[0],
        HttpRouteFilter::RequestRedirect { .. }
    ));

    let policy = assert_some!(ir.backend_tls_policies().get(&NamespacedName::new(
        "ecommerce",
        "api-backend-svc-api-backend-backend-tls"
    )));
    assert_eq!(policy.spec.target_refs[0].name, "api-backend-svc");
}

#[test_log::test]
fn missing_host_is_skipped() {
    let vs = parse::<VirtualServer>(
        r"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: nohost
  namespace: default
spec:
  upstreams:
    - name: tea
      service: tea-svc
      port: 80
  routes:
    - path: /tea
      action:
        pass: tea
",
    );
    let input = ConversionInput::builder().virtual_servers(vec![vs]).build();

    let output = convert(&input, &ConversionOptions::default());

    assert!(output.ir().gateways().is_empty());
    assert!(output.ir().http_routes().is_empty());
    assert_eq!(output.notifications().len(), 1);
    assert_eq!(output.notifications().count(Severity::Warning), 1);
    assert_contains!(
        output.notifications().as_slice()[0].message().as_str(),
        "no host specified, skipping"
    );
}

#[test_log::test]
fn cross_namespace_route_reference() {
    let vs = parse::<VirtualServer>(
        r"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: portal
  namespace: web
spec:
  host: portal.example.com
  routes:
    - path: /auth
      route: auth/shared-routes
",
    );
    let vsr = parse::<VirtualServerRoute>(
        r"
apiVersion: k8s.nginx.org/v1
kind: VirtualServerRoute
metadata:
  name: shared-routes
  namespace: auth
spec:
  host: portal.example.com
  upstreams:
    - name: auth
      service: auth-svc
      port: 8080
  subroutes:
    - path: /auth/login
      action:
        pass: auth
    - path: /auth/logout
      action:
        pass: auth
",
    );
    let input = ConversionInput::builder()
        .virtual_servers(vec![vs])
        .virtual_server_routes(vec![vsr])
        .build();

    let output = convert(&input, &ConversionOptions::default());

    let route = assert_some!(
        output
            .ir()
            .http_routes()
            .get(&NamespacedName::new("web", "portal-httproute"))
    );
    assert_eq!(route.spec.rules.len(), 2);
    assert!(
        route
            .spec
            .rules
            .iter()
            .all(|rule| rule.backend_refs[0].backend.namespace.as_deref() == Some("auth"))
    );
    assert_eq!(
        output
            .notifications()
            .iter()
            .filter(|n| n.message().to_lowercase().contains("resolved 2 routes"))
            .count(),
        1
    );
    assert_eq!(output.notifications().count(Severity::Warning), 0);
}

#[test_log::test]
fn unsupported_virtual_server_fields() {
    let vs = parse::<VirtualServer>(
        r#"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: legacy
  namespace: default
spec:
  host: legacy.example.com
  gunzip: true
  externalDNS:
    enable: true
  dos: default/dos-protected
  internalRoute: true
  http-snippets: "limit_req_zone $binary_remote_addr zone=one:10m rate=1r/s;"
  server-snippets: "add_header X-Legacy 1;"
  policies:
    - name: rate-limit
"#,
    );
    let input = ConversionInput::builder().virtual_servers(vec![vs]).build();

    let output = convert(&input, &ConversionOptions::default());
    let warnings: Vec<_> = output
        .notifications()
        .of_severity(Severity::Warning)
        .map(|n| n.message().clone())
        .collect();

    assert_eq!(warnings.len(), 7);
    for field in [
        "gunzip",
        "externalDNS",
        "dos",
        "policies",
        "internalRoute",
        "http-snippets",
        "server-snippets",
    ] {
        assert!(
            warnings.iter().any(|w| w.contains(&format!("'{field}'"))),
            "no warning names {field}"
        );
    }
}

#[test_log::test]
fn grpc_upstreams_produce_grpc_route() {
    let vs = parse::<VirtualServer>(
        r"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: greeter
  namespace: default
spec:
  host: grpc.example.com
  upstreams:
    - name: greeter-v1
      service: greeter-v1-svc
      port: 50051
      type: grpc
    - name: greeter-v2
      service: greeter-v2-svc
      port: 50051
      type: grpc
    - name: web
      service: web-svc
      port: 80
  routes:
    - path: /helloworld.Greeter
      splits:
        - weight: 80
          action:
            pass: greeter-v1
        - weight: 20
          action:
            pass: greeter-v2
    - path: /
      action:
        pass: web
",
    );
    let input = ConversionInput::builder().virtual_servers(vec![vs]).build();

    let output = convert(&input, &ConversionOptions::default());
    let ir = output.ir();

    let grpc = assert_some!(
        ir.grpc_routes()
            .get(&NamespacedName::new("default", "greeter-grpcroute"))
    );
    let rule = &grpc.spec.rules[0];
    let method = assert_some!(rule.matches[0].method.as_ref());
    assert_eq!(method.service.as_deref(), Some("helloworld.Greeter"));
    assert_eq!(method.method, None);
    let weights: Vec<_> = rule
        .backend_refs
        .iter()
        .map(|b| (b.backend.name.as_str(), b.backend.weight))
        .collect();
    assert_eq!(
        weights,
        vec![("greeter-v1-svc", Some(80)), ("greeter-v2-svc", Some(20))]
    );

    let http = assert_some!(
        ir.http_routes()
            .get(&NamespacedName::new("default", "greeter-httproute"))
    );
    assert_eq!(http.spec.rules.len(), 1);
    assert_eq!(http.spec.rules[0].backend_refs[0].backend.name, "web-svc");
}

#[test_log::test]
fn transport_servers_share_the_gateway() {
    let global = parse::<GlobalConfiguration>(
        r"
apiVersion: k8s.nginx.org/v1
kind: GlobalConfiguration
metadata:
  name: nginx-configuration
  namespace: nginx-ingress
spec:
  listeners:
    - name: postgres-tcp
      port: 5432
      protocol: TCP
    - name: dns-udp
      port: 5353
      protocol: UDP
",
    );
    let transport = |name: &str, listener: &str, protocol: &str| {
        parse::<TransportServer>(&format!(
            r"
apiVersion: k8s.nginx.org/v1
kind: TransportServer
metadata:
  name: {name}
  namespace: data
spec:
  listener:
    name: {listener}
    protocol: {protocol}
  upstreams:
    - name: backend
      service: {name}-svc
      port: 5432
  action:
    pass: backend
"
        ))
    };
    let input = ConversionInput::builder()
        .transport_servers(vec![
            transport("postgres", "postgres-tcp", "TCP"),
            transport("dns", "dns-udp", "UDP"),
            transport("broken", "postgres-tcp", "SCTP"),
        ])
        .global_configuration(global)
        .build();

    let output = convert(&input, &ConversionOptions::default());
    let ir = output.ir();

    let gateway = assert_some!(ir.gateways().get(&NamespacedName::new("data", "data-gateway")));
    let listeners: Vec<_> = gateway
        .spec
        .listeners
        .iter()
        .map(|l| (l.name.as_str(), l.port))
        .collect();
    assert_eq!(listeners, vec![("tcp-5432", 5432), ("udp-5353", 5353)]);

    assert_eq!(ir.tcp_routes().len(), 1);
    assert_eq!(ir.udp_routes().len(), 1);
    assert!(ir.tls_routes().is_empty());
    assert_eq!(output.notifications().count(Severity::Error), 1);
}

#[test_log::test]
fn conversion_is_idempotent() {
    let mut second = parse::<VirtualServer>(SHOP);
    second.metadata.name = Some("outlet".to_string());
    second.spec.host = "outlet.example.com".to_string();
    let input = ConversionInput::builder()
        .virtual_servers(vec![second, parse::<VirtualServer>(SHOP)])
        .build();

    let first_run = convert(&input, &ConversionOptions::default());
    let second_run = convert(&input, &ConversionOptions::default());

    assert_eq!(first_run, second_run);
    let first_yaml = assert_ok!(serde_yaml::to_string(
        &first_run.ir().http_routes().values().collect::<Vec<_>>()
    ));
    let second_yaml = assert_ok!(serde_yaml::to_string(
        &second_run.ir().http_routes().values().collect::<Vec<_>>()
    ));
    assert_eq!(first_yaml, second_yaml);
}
