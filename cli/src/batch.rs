//! Block boundaries and batch execution

use anyhow::Result;
use colored::Colorize;
use liquidity::{BatchSummary, MemKeeper, ParamStore};

use crate::request::print_request;

/// Advance `blocks` blocks, running a batch at every boundary crossed
pub fn end_block(keeper: &mut MemKeeper, blocks: u64) -> Result<()> {
    println!("{}", "=== End Block ===".bright_green().bold());
    println!(
        "{} {} (batch every {} blocks)",
        "From height:".bright_cyan(),
        keeper.height,
        keeper.params.batch_size()
    );

    let mut batches = 0;
    for _ in 0..blocks {
        if let Some(summary) = keeper.end_block() {
            print_summary(&summary);
            batches += 1;
        }
    }

    println!("{} {}", "Height:".bright_cyan(), keeper.height);
    if batches == 0 {
        println!("{}", "No batch boundary reached".dimmed());
    }
    Ok(())
}

/// Run a batch at the current height without advancing it
pub fn process_batch(keeper: &mut MemKeeper) -> Result<()> {
    println!("{}", "=== Process Batch ===".bright_green().bold());
    let summary = keeper.process_batch();
    print_summary(&summary);
    Ok(())
}

/// Settle one pending request ahead of its batch
pub fn execute(keeper: &mut MemKeeper, pool_id: u64, id: u64) -> Result<()> {
    let is_deposit = match keeper.store.request(pool_id, id) {
        Some(request) => request.is_deposit(),
        None => anyhow::bail!("Request {}/{} not found", pool_id, id),
    };
    if is_deposit {
        keeper.execute_deposit_request(pool_id, id)?;
    } else {
        keeper.execute_withdraw_request(pool_id, id)?;
    }

    println!("{}", "=== Execute Request ===".bright_green().bold());
    if let Some(request) = keeper.store.request(pool_id, id) {
        print_request(request);
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!("\n{} {}", "Batch at height".bright_yellow(), summary.height);
    println!("  {} {}", "Succeeded:".bright_cyan(), summary.succeeded);
    println!("  {} {}", "Failed:".bright_cyan(), summary.failed);
    if summary.short_refunds > 0 {
        let short = summary.short_refunds.to_string();
        println!("  {} {}", "Short refunds:".bright_cyan(), short.yellow());
    }
    println!("  {} {}", "Purged:".bright_cyan(), summary.purged);
    for pool_id in &summary.disabled_pools {
        println!("  {} {}", "Disabled pool:".bright_red(), pool_id);
    }
}
