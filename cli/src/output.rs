use crate::cli::OutputFormat;
use nic2gw_core::ir::Ir;
use nic2gw_core::notifications::Notifications;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to serialize output as JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to serialize output as YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

fn push_all<'a, T: Serialize + 'a>(
    objects: &mut Vec<serde_json::Value>,
    items: impl IntoIterator<Item = &'a T>,
) -> Result<(), OutputError> {
    for item in items {
        objects.push(serde_json::to_value(item)?);
    }
    Ok(())
}

/// Every generated object, Gateways first and policies last.
pub fn collect_objects(ir: &Ir) -> Result<Vec<serde_json::Value>, OutputError> {
    let mut objects = Vec::with_capacity(ir.object_count());
    push_all(&mut objects, ir.gateways().values())?;
    push_all(&mut objects, ir.http_routes().values())?;
    push_all(&mut objects, ir.grpc_routes().values())?;
    push_all(&mut objects, ir.tcp_routes().values())?;
    push_all(&mut objects, ir.tls_routes().values())?;
    push_all(&mut objects, ir.udp_routes().values())?;
    push_all(&mut objects, ir.backend_tls_policies().values())?;
    Ok(objects)
}

pub fn render(ir: &Ir, format: OutputFormat) -> Result<String, OutputError> {
    let objects = collect_objects(ir)?;

    match format {
        OutputFormat::Json => {
            let list = serde_json::json!({
                "apiVersion": "v1",
                "kind": "List",
                "items": objects,
            });
            let mut rendered = serde_json::to_string_pretty(&list)?;
            rendered.push('\n');
            Ok(rendered)
        }
        OutputFormat::Yaml => {
            let mut rendered = String::new();
            for (i, object) in objects.iter().enumerate() {
                if i > 0 {
                    rendered.push_str("---\n");
                }
                rendered.push_str(&serde_yaml::to_string(object)?);
            }
            Ok(rendered)
        }
    }
}

/// One line per notification: `[SEVERITY] Kind/namespace/name: message`.
pub fn format_report(notifications: &Notifications) -> String {
    let mut report = String::new();
    for notification in notifications {
        let _ = writeln!(
            report,
            "[{}] {}: {}",
            notification.severity(),
            notification.source(),
            notification.message()
        );
    }
    report
}

pub fn write_report(notifications: &Notifications, writer: &mut impl Write) -> Result<(), OutputError> {
    writer.write_all(format_report(notifications).as_bytes())?;
    Ok(())
}
