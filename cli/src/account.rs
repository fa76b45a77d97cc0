//! Bank accounts: faucet, external transfers and balance queries

use anyhow::Result;
use colored::Colorize;
use liquidity::{Address, Coins, MemKeeper, ReserveLedger};

/// Mint coins straight into an account
pub fn fund(keeper: &mut MemKeeper, address: &str, coins: &str) -> Result<()> {
    let coins: Coins = coins.parse()?;
    let address = Address::from(address);
    keeper.bank.fund(&address, &coins)?;

    println!("{}", "=== Fund ===".bright_green().bold());
    println!("{} {}", "Address:".bright_cyan(), address);
    println!("{} {}", "Minted:".bright_cyan(), coins);
    Ok(())
}

/// Move coins between any two accounts, module accounts included.
/// Sending out of a pool reserve simulates an external drain.
pub fn send(keeper: &mut MemKeeper, from: &str, to: &str, coins: &str) -> Result<()> {
    let coins: Coins = coins.parse()?;
    let (from, to) = (Address::from(from), Address::from(to));
    keeper.bank.transfer(&from, &to, &coins)?;

    println!("{}", "=== Send ===".bright_green().bold());
    println!("{} {}", "From:".bright_cyan(), from);
    println!("{} {}", "To:".bright_cyan(), to);
    println!("{} {}", "Coins:".bright_cyan(), coins);
    Ok(())
}

pub fn show_balances(keeper: &MemKeeper, address: Option<String>, json: bool) -> Result<()> {
    if let Some(address) = address {
        let address = Address::new(address);
        let balances = keeper.bank.balances(&address);
        if json {
            println!("{}", serde_json::to_string_pretty(&balances)?);
            return Ok(());
        }
        println!("{}", "=== Balances ===".bright_green().bold());
        println!("{} {}", "Address:".bright_cyan(), address);
        if balances.is_empty() {
            println!("{}", "No balances".dimmed());
        }
        for coin in balances.iter() {
            println!("  {:>24}  {}", coin.amount, coin.denom);
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&keeper.bank)?);
        return Ok(());
    }
    println!("{}", "=== Balances ===".bright_green().bold());
    for (address, coins) in keeper.bank.accounts() {
        println!("  {:<40}  {}", address.to_string(), coins);
    }
    println!("{} {}", "Total supply:".bright_cyan(), keeper.bank.total_supply());
    Ok(())
}
