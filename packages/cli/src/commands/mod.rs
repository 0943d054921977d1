pub mod add;
pub mod init;
pub mod inspect;
pub mod remove;
pub mod set;

pub use add::{add, AddArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use remove::{remove, RemoveArgs};
pub use set::{set, SetArgs};

use anyhow::{anyhow, Result};
use animgraph_document::{ChangeKind, Document, MutationInfo, Project};
use animgraph_model::{Node, NodeId, Registry};
use colored::{ColoredString, Colorize};
use std::fmt::Write;
use std::sync::Arc;

/// Find a node by full id or by a unique id prefix
pub(crate) fn resolve_node(doc: &Document, text: &str) -> Result<Arc<Node>> {
    if let Ok(id) = text.parse::<NodeId>() {
        return doc
            .node(id)
            .cloned()
            .ok_or_else(|| anyhow!("No node with id {}", id));
    }

    let matches: Vec<_> = doc
        .nodes()
        .iter()
        .filter(|n| n.id().to_string().starts_with(text))
        .collect();
    match matches.as_slice() {
        [node] => Ok((*node).clone()),
        [] => Err(anyhow!("No node with id {}", text)),
        _ => Err(anyhow!("Id prefix {} matches {} nodes", text, matches.len())),
    }
}

/// Short label for a node: type title, node title and id prefix
pub(crate) fn describe(registry: &Registry, node: &Node) -> String {
    let kind = if node.is_root() {
        "Root".to_string()
    } else {
        registry
            .get(node.type_hash())
            .map(|t| t.title.clone())
            .unwrap_or_else(|| format!("#{}", node.type_hash()))
    };
    let id = node.id().to_string();
    match node.title() {
        Some(title) => format!("{} {:?} [{}]", kind, title, &id[..8]),
        None => format!("{} [{}]", kind, &id[..8]),
    }
}

/// Install a callback printing every change a mutation reports
pub(crate) fn print_changes_on_commit(project: &mut Project, registry: Arc<Registry>) {
    project.set_callback(move |info| print_changes(&registry, info));
}

fn print_changes(registry: &Registry, info: &MutationInfo) {
    print!("{}", render_changes(registry, info));
    println!("{}", info.to_string().dimmed());
}

/// One line per node, property, connector and connection change
pub(crate) fn render_changes(registry: &Registry, info: &MutationInfo) -> String {
    let mut out = String::new();
    for change in &info.nodes {
        let Some(node) = change.item() else { continue };
        let _ = writeln!(out, "  {} {}", marker(change.kind), describe(registry, node));
    }
    for change in &info.properties {
        let parent = change.cur_parent.as_ref().or(change.prev_parent.as_ref());
        if let (Some(property), Some(parent)) = (change.item(), parent) {
            let _ = writeln!(
                out,
                "    {} {}.{}",
                marker(change.kind),
                describe(registry, parent),
                property.title()
            );
        }
    }
    for change in &info.connectors {
        let parent = change.cur_parent.as_ref().or(change.prev_parent.as_ref());
        if let (Some(connector), Some(parent)) = (change.item(), parent) {
            let _ = writeln!(
                out,
                "    {} {}.{} ({})",
                marker(change.kind),
                describe(registry, parent),
                connector.title,
                connector.role
            );
        }
    }
    for change in &info.connections {
        let Some(connection) = change.item() else { continue };
        let _ = writeln!(
            out,
            "  {} {}.{} -> {}.{}",
            marker(change.kind),
            describe(registry, connection.output_node()),
            connection.output_connector().title,
            describe(registry, connection.input_node()),
            connection.input_connector().title
        );
    }
    out
}

fn marker(kind: ChangeKind) -> ColoredString {
    match kind {
        ChangeKind::Added => "+".green(),
        ChangeKind::Mutated => "~".yellow(),
        ChangeKind::Removed => "-".red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use animgraph_document::DocumentBuilder;
    use animgraph_model::{ConnectorMetadata, ConnectorRole, ContentHash};

    #[test]
    fn test_render_changes_lists_connectors() {
        colored::control::set_override(false);
        let registry = Config::default().registry();
        let shape = Arc::new(Node::new(&registry, ContentHash::of("Shape")).unwrap());
        let mut project = Project::new();
        project
            .mutate("Add shape", |doc: &mut DocumentBuilder| doc.append(None, [shape.clone()]))
            .unwrap();

        let info = project
            .mutate("Add connector", |doc: &mut DocumentBuilder| {
                doc.mutate(&shape, |n| {
                    n.add_connector(ConnectorMetadata::local("glow", ConnectorRole::Output))
                        .map(|_| ())
                })
                .map(|_| ())
            })
            .unwrap();
        let text = render_changes(&registry, &info);
        assert!(text.contains(".glow (output)"), "{}", text);
        assert!(text.contains("+ Shape \"shape\""), "{}", text);

        let info = project.undo().unwrap();
        let text = render_changes(&registry, &info);
        assert!(text.contains("- Shape \"shape\""), "{}", text);
        assert!(text.contains(".glow (output)"), "{}", text);
    }
}
