//! Batch deposit and withdraw requests

use anyhow::Result;
use colored::{ColoredString, Colorize};
use liquidity::{Address, Amount, Coins, MemKeeper, Request, RequestKind, RequestStatus};

pub fn deposit(keeper: &mut MemKeeper, depositor: &str, pool_id: u64, coins: &str) -> Result<()> {
    let coins: Coins = coins.parse()?;
    let request = keeper.deposit_batch(&Address::from(depositor), pool_id, &coins)?;

    println!("{}", "=== Deposit ===".bright_green().bold());
    print_request(&request);
    println!("\n{}", "Settles at the next batch boundary".dimmed());
    Ok(())
}

pub fn withdraw(
    keeper: &mut MemKeeper,
    withdrawer: &str,
    pool_id: u64,
    amount: Amount,
) -> Result<()> {
    let request = keeper.withdraw_batch(&Address::from(withdrawer), pool_id, amount)?;

    println!("{}", "=== Withdraw ===".bright_green().bold());
    print_request(&request);
    println!("\n{}", "Settles at the next batch boundary".dimmed());
    Ok(())
}

pub fn show_request(keeper: &MemKeeper, pool_id: u64, id: u64, json: bool) -> Result<()> {
    let request = keeper.store.request(pool_id, id).ok_or_else(|| {
        anyhow::anyhow!("Request {}/{} not found (purged or never accepted)", pool_id, id)
    })?;
    if json {
        println!("{}", serde_json::to_string_pretty(request)?);
        return Ok(());
    }

    println!("{}", "=== Request ===".bright_green().bold());
    print_request(request);
    Ok(())
}

pub fn list_requests(keeper: &MemKeeper, pool_id: u64, json: bool) -> Result<()> {
    keeper.get_pool(pool_id)?;
    let requests: Vec<_> = keeper.store.requests(pool_id).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }

    let title = format!("=== Requests for pool {pool_id} ===");
    println!("{}", title.bright_green().bold());
    if requests.is_empty() {
        println!("{}", "No requests found".dimmed());
    }
    for request in requests {
        let what = match &request.kind {
            RequestKind::Deposit { deposit_coins, .. } => format!("deposit {deposit_coins}"),
            RequestKind::Withdraw { pool_share_amount, .. } => {
                format!("withdraw {pool_share_amount} shares")
            }
        };
        println!(
            "  {:>4}  {:<10} {}  by {}",
            request.id,
            status_label(request.status),
            what,
            request.requester
        );
    }
    Ok(())
}

fn status_label(status: RequestStatus) -> ColoredString {
    match status {
        RequestStatus::Pending => "pending".yellow(),
        RequestStatus::Succeeded => "succeeded".green(),
        RequestStatus::Failed => "failed".red(),
    }
}

pub fn print_request(request: &Request) {
    println!("{} {}/{}", "Request:".bright_cyan(), request.pool_id, request.id);
    println!("{} {}", "Requester:".bright_cyan(), request.requester);
    println!("{} {}", "Accepted at:".bright_cyan(), request.accepted_at);
    println!("{} {}", "Status:".bright_cyan(), status_label(request.status));
    if let Some(reason) = request.failure {
        println!("{} {:?}", "Failure:".bright_cyan(), reason);
    }
    if !request.refund_shortfall.is_empty() {
        let shortfall = request.refund_shortfall.to_string();
        println!("{} {}", "Not refunded:".bright_cyan(), shortfall.yellow());
    }

    match &request.kind {
        RequestKind::Deposit {
            deposit_coins,
            accepted_coins,
            minted_pool_shares,
        } => {
            println!("{} {}", "Deposit:".bright_cyan(), deposit_coins);
            if request.status == RequestStatus::Succeeded {
                println!("{} {}", "Accepted:".bright_cyan(), accepted_coins);
                println!("{} {}", "Minted shares:".bright_cyan(), minted_pool_shares);
            }
        }
        RequestKind::Withdraw {
            pool_share_amount,
            withdrawn_coins,
        } => {
            println!("{} {}", "Shares:".bright_cyan(), pool_share_amount);
            if request.status == RequestStatus::Succeeded {
                println!("{} {}", "Withdrawn:".bright_cyan(), withdrawn_coins);
            }
        }
    }
}
