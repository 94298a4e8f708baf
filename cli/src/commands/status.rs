//! Status command - show cluster, tunnel and ingress state.

use anyhow::Result;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let status = ctx.orchestrator().status().await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let tunnel = status
        .tunnel_pid
        .map_or_else(|| "not running".to_string(), |pid| format!("running (pid {pid})"));
    let ingress = if status.ingress_ready { "ready" } else { "not ready" };

    println!("{:<10} {}", "CLUSTER", status.cluster);
    println!("{:<10} {}", "TUNNEL", tunnel);
    println!("{:<10} {}", "INGRESS", ingress);
    println!("{:<10} {}", "STATE", status.state);
    Ok(())
}
