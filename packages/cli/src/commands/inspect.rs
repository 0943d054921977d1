use super::describe;
use crate::config::Config;
use animgraph_document::{walk_node, Document, Project, Visitor};
use animgraph_model::{Connection, ConnectorMetadata, ConnectorRole, Frame, Node, Property, Registry};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fmt::Write;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Project file (defaults to the configured project)
    pub project: Option<String>,

    /// Frame at which property values are sampled
    #[arg(short, long, default_value = "0")]
    pub frame: Frame,
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = config.registry();
    let path = config.project_path(cwd, args.project.as_deref());
    let project = Project::load(&path, &registry)?;

    println!(
        "{} {} at frame {}",
        "🔍".bright_blue(),
        path.display().to_string().bright_white(),
        args.frame
    );
    print!("{}", render(&registry, project.current(), args.frame));
    Ok(())
}

/// Tree listing with property values sampled at `frame`
pub(crate) fn render(registry: &Registry, doc: &Document, frame: Frame) -> String {
    let mut printer = TreePrinter {
        registry,
        frame,
        depth: 0,
        out: String::new(),
    };
    printer.visit_document(doc);
    printer.out
}

struct TreePrinter<'a> {
    registry: &'a Registry,
    frame: Frame,
    depth: usize,
    out: String,
}

impl TreePrinter<'_> {
    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }
}

impl Visitor for TreePrinter<'_> {
    fn visit_node(&mut self, doc: &Document, node: &Node, depth: usize) {
        self.depth = depth;
        let _ = writeln!(self.out, "{}{}", self.indent(), describe(self.registry, node).bold());
        walk_node(self, doc, node, depth);
    }

    fn visit_property(&mut self, _node: &Node, property: &Property) {
        let keys = match property.len() {
            0 => String::new(),
            1 => " (1 key)".to_string(),
            n => format!(" ({} keys)", n),
        };
        let _ = writeln!(
            self.out,
            "{}  {} = {}{}",
            self.indent(),
            property.title().cyan(),
            property.get(self.frame),
            keys.dimmed()
        );
    }

    fn visit_connector(&mut self, _node: &Node, connector: &ConnectorMetadata) {
        let arrow = match connector.role {
            ConnectorRole::Input => "◀",
            ConnectorRole::Output => "▶",
        };
        let local = if connector.is_local { " (local)" } else { "" };
        let _ = writeln!(
            self.out,
            "{}  {} {}{}",
            self.indent(),
            arrow,
            connector.title,
            local.dimmed()
        );
    }

    fn visit_connection(&mut self, connection: &Connection) {
        let _ = writeln!(
            self.out,
            "{}.{} -> {}.{}",
            describe(self.registry, connection.output_node()),
            connection.output_connector().title,
            describe(self.registry, connection.input_node()),
            connection.input_connector().title
        );
    }
}
