//! Display summary of a media server configuration.

use serde::Serialize;

use crate::document::model::{Document, Element};
use crate::document::path::get_path;

/// Version reported when the root carries no `version` attribute.
pub const UNKNOWN_VERSION: &str = "unknown";
/// Server name reported when `<Name>` is absent.
pub const DEFAULT_SERVER_NAME: &str = "OvenMediaEngine";
/// Bind address reported when `<IP>` is absent.
pub const WILDCARD_IP: &str = "*";

/// Well-known fields pulled from the root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub version: String,
    pub name: String,
    pub ip: String,
    pub stun_server: Option<String>,
    /// Every `*Port` leaf under `<Bind>`, keyed by its path relative to `Bind`.
    pub bind_ports: Vec<BindPort>,
    pub virtual_host_count: usize,
}

/// A listening port declared in the `<Bind>` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindPort {
    pub path: String,
    pub value: String,
}

/// Extract the display summary from a document.
pub fn extract_summary(doc: &Document) -> ServerSummary {
    let root = &doc.root;
    let prefix = root.name.as_str();

    let mut bind_ports = Vec::new();
    if let Some(bind) = root.child("Bind") {
        collect_ports(bind, "", &mut bind_ports);
    }

    let virtual_host_count = root
        .child("VirtualHosts")
        .map(|v| v.children_named("VirtualHost").count())
        .unwrap_or(0);

    ServerSummary {
        version: get_path(doc, &format!("{prefix}.@version"), UNKNOWN_VERSION),
        name: get_path(doc, &format!("{prefix}.Name"), DEFAULT_SERVER_NAME),
        ip: get_path(doc, &format!("{prefix}.IP"), WILDCARD_IP),
        stun_server: root.child_text("StunServer"),
        bind_ports,
        virtual_host_count,
    }
}

fn collect_ports(element: &Element, path: &str, out: &mut Vec<BindPort>) {
    for child in element.elements() {
        let child_path = if path.is_empty() {
            child.name.clone()
        } else {
            format!("{}.{}", path, child.name)
        };
        if child.has_elements() {
            collect_ports(child, &child_path, out);
        } else if child.name.ends_with("Port") {
            out.push(BindPort {
                path: child_path,
                value: child.text(),
            });
        }
    }
}
