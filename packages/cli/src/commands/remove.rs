use super::{describe, print_changes_on_commit, resolve_node};
use crate::config::Config;
use animgraph_document::Project;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Project file (defaults to the configured project)
    pub project: Option<String>,

    /// Node id or unique id prefix; its descendants are removed too
    #[arg(short, long)]
    pub node: String,
}

pub fn remove(args: RemoveArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = config.registry();
    let path = config.project_path(cwd, args.project.as_deref());
    let mut project = Project::load(&path, &registry)?;

    let node = resolve_node(project.current(), &args.node)?;
    if node.is_root() {
        bail!("The root node cannot be removed");
    }

    println!("{} Removing {}", "🗑".red(), describe(&registry, &node));
    print_changes_on_commit(&mut project, registry.clone());
    project.mutate("Remove node", |doc| doc.erase([&node]))?;
    project.save(&path)?;

    Ok(())
}
