use super::{print_changes_on_commit, resolve_node};
use crate::config::Config;
use animgraph_document::Project;
use animgraph_model::{ContentHash, Node, TITLE_PROPERTY};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Project file (defaults to the configured project)
    pub project: Option<String>,

    /// Node type title, as listed in the config
    #[arg(short = 't', long = "type")]
    pub node_type: String,

    /// Parent node id or unique id prefix (defaults to the root)
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Value for the node's title property
    #[arg(long)]
    pub title: Option<String>,
}

pub fn add(args: AddArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = config.registry();
    let path = config.project_path(cwd, args.project.as_deref());
    let mut project = Project::load(&path, &registry)?;

    let node_type = registry
        .by_title(&args.node_type)
        .ok_or_else(|| anyhow!("Unknown node type: {}", args.node_type))?;
    let parent = args
        .parent
        .as_deref()
        .map(|text| resolve_node(project.current(), text))
        .transpose()?;

    let mut node = Node::new(&registry, node_type.hash)?;
    if let Some(title) = &args.title {
        let mut builder = node.builder();
        builder.set_property(ContentHash::of(TITLE_PROPERTY), 0.0, title.as_str())?;
        node = builder.build();
    }
    let node = Arc::new(node);
    let id = node.id();

    println!("{} Adding {}", "➕".green(), args.node_type.bright_white());
    print_changes_on_commit(&mut project, registry.clone());
    project.mutate(format!("Add {}", args.node_type), |doc| {
        doc.append(parent.as_deref(), [node])
    })?;
    project.save(&path)?;

    println!("  {} {}", "✓".green(), id);
    Ok(())
}
