//! Bring-up and teardown commands.

use anyhow::Result;
use campusctl_core::ServiceName;

use super::{print_report, Context};

fn describe(target: Option<ServiceName>) -> String {
    target.map_or_else(|| "all services".to_string(), |s| s.to_string())
}

pub async fn build(ctx: &Context, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
    let mut orchestrator = ctx.orchestrator();
    orchestrator.build(target, no_cache).await?;
    println!("Built and deployed {}.", describe(target));
    Ok(())
}

pub async fn deploy(ctx: &Context, target: Option<ServiceName>) -> Result<()> {
    let mut orchestrator = ctx.orchestrator();
    orchestrator.deploy(target).await?;
    println!("Deployed {}.", describe(target));
    Ok(())
}

/// Never fails: incomplete teardowns are reported, not raised.
pub async fn shutdown(
    ctx: &Context,
    target: Option<ServiceName>,
    force: bool,
    all_pods: bool,
) -> Result<()> {
    let mut orchestrator = ctx.orchestrator();
    let report = orchestrator.shutdown(target, force, all_pods).await;
    print_report("Shutdown", &report);
    Ok(())
}

pub async fn restart(ctx: &Context, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
    let mut orchestrator = ctx.orchestrator();
    orchestrator.restart(target, no_cache).await?;
    println!("Restarted {}.", describe(target));
    Ok(())
}

pub async fn rebuild(ctx: &Context, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
    let mut orchestrator = ctx.orchestrator();
    orchestrator.rebuild(target, no_cache).await?;
    println!("Rebuilt and rolled out {}.", describe(target));
    Ok(())
}
