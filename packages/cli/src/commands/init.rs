use crate::config::{Config, DEFAULT_CONFIG_NAME};
use animgraph_document::Project;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project file to create
    #[arg(short, long)]
    pub project: Option<String>,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing animgraph project...".bright_blue().bold());

    let mut config = Config::default();
    if let Some(project) = &args.project {
        config.project = project.clone();
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let project_path = config.project_path(cwd, None);
    if !project_path.exists() || args.force {
        Project::new().save(&project_path)?;
        println!("  {} Created {}", "✓".green(), config.project);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: animgraph add --type Shape --title box");
    println!("  2. Run: animgraph inspect");

    Ok(())
}
