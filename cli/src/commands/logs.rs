//! Logs command - follow a service's deployment logs.

use anyhow::Result;
use campusctl_core::ServiceName;

use super::Context;

pub async fn run(ctx: &Context, service: ServiceName) -> Result<()> {
    ctx.orchestrator().logs(service).await?;
    Ok(())
}
