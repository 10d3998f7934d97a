use anyhow::{Result, bail};
use console::style;
use quill_core::{AssistantConfig, ConfigStore, FileConfigStore};

/// Handle the config command
pub fn handle_config_command(store: &FileConfigStore, init: bool) -> Result<()> {
    let path = store.path();
    println!("{} {}", style("Configuration:").blue().bold(), path.display());

    if init {
        if path.exists() {
            println!("{}", style("Already exists, left unchanged").dim());
        } else if store.save(&AssistantConfig::default()) {
            println!("{}", style("Default configuration written").green());
        } else {
            bail!("Failed to write {}", path.display());
        }
    } else if !path.exists() {
        println!(
            "{}",
            style("Not created yet; built-in defaults are in use (quill config --init)").dim()
        );
    }

    let config = store.load();
    println!();
    println!("{}", config.manager_summary());
    match config.allowed_root() {
        Some(root) => println!("Edits restricted to: {root}"),
        None => println!("Edits unrestricted (allowedProjectDir not set)"),
    }
    println!(
        "Context caching: {}",
        if config.use_caching { "on" } else { "off" }
    );
    Ok(())
}
