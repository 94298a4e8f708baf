//! Config command - show or initialise the configuration file.

use anyhow::{bail, Result};
use campusctl_core::{ConfigStore, Settings};

use super::Context;

pub async fn show(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    println!("Config file: {}", ctx.store.config_path().display());
    println!();
    println!("Project root:    {}", settings.project_root.display());
    println!("Manifests:       {}", settings.manifests_path().display());
    println!("Image prefix:    {}", settings.image_prefix);
    println!("Image tag:       {}", settings.image_tag);
    println!("Cluster driver:  {}", settings.cluster_driver);
    println!(
        "Ingress:         {} ({}, {})",
        settings.ingress.addon, settings.ingress.namespace, settings.ingress.selector
    );
    println!(
        "Readiness:       timeout {}s, poll every {}s, settle {}s",
        settings.ingress.timeout_secs,
        settings.ingress.poll_interval_secs,
        settings.ingress.settle_secs
    );
    println!("Tunnel grace:    {}s", settings.tunnel_grace_secs);

    let tools = [
        ("docker", &settings.tools.docker),
        ("kubectl", &settings.tools.kubectl),
        ("minikube", &settings.tools.minikube),
    ];
    for (name, path) in tools {
        if let Some(path) = path {
            println!("Tool {name:<10} {}", path.display());
        }
    }

    Ok(())
}

/// Writes the default settings. Never reads the existing file, so a broken
/// one can be replaced with `--force`.
pub async fn init(store: &ConfigStore, force: bool) -> Result<()> {
    let path = store.config_path();
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    store.save(&Settings::default()).await?;
    println!("Wrote {}", path.display());
    Ok(())
}
