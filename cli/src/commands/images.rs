//! Clear-builds command - remove locally built images.

use anyhow::Result;

use super::{print_report, Context};

pub async fn clear(ctx: &Context) -> Result<()> {
    let report = ctx.orchestrator().clear_builds().await;
    print_report("Image cleanup", &report);
    Ok(())
}
