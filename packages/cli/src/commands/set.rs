use super::{print_changes_on_commit, resolve_node};
use crate::config::Config;
use animgraph_document::Project;
use animgraph_model::{ContentHash, Frame, PropertyValue};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Project file (defaults to the configured project)
    pub project: Option<String>,

    /// Node id or unique id prefix
    #[arg(short, long)]
    pub node: String,

    /// Property title
    #[arg(short, long)]
    pub property: String,

    /// Frame of the keyframe
    #[arg(short, long, default_value = "0")]
    pub frame: Frame,

    /// New value; vectors are comma separated ("1.5,-2")
    #[arg(short, long, allow_hyphen_values = true)]
    pub value: String,
}

pub fn set(args: SetArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = config.registry();
    let path = config.project_path(cwd, args.project.as_deref());
    let mut project = Project::load(&path, &registry)?;

    let node = resolve_node(project.current(), &args.node)?;
    let hash = ContentHash::of(&args.property);
    let property = node
        .property(hash)
        .ok_or_else(|| anyhow!("Node {} has no property {}", node.id(), args.property))?;
    let value = PropertyValue::parse_as(property.value_type(), &args.value)?;

    println!(
        "{} Setting {} = {} at frame {}",
        "✏️".bright_blue(),
        args.property.bright_white(),
        value,
        args.frame
    );
    print_changes_on_commit(&mut project, registry.clone());
    project.mutate(format!("Set {}", args.property), |doc| {
        doc.mutate(&node, |n| n.set_property(hash, args.frame, value).map(|_| ()))
            .map(|_| ())
    })?;
    project.save(&path)?;

    Ok(())
}
