//! Pair and pool commands

use anyhow::Result;
use colored::Colorize;
use liquidity::{Address, Coins, MemKeeper, Pool};
use serde::Serialize;

/// Pool as shown to users, with balances read from the bank
#[derive(Serialize)]
pub struct PoolView {
    pub id: u64,
    pub pair_id: u64,
    pub base_coin_denom: String,
    pub quote_coin_denom: String,
    pub reserve_address: String,
    pub pool_share_denom: String,
    pub reserve_base: String,
    pub reserve_quote: String,
    pub pool_share_supply: String,
    pub pending_requests: usize,
    pub disabled: bool,
}

impl PoolView {
    pub fn new(keeper: &MemKeeper, pool: &Pool) -> Result<Self> {
        let pair = keeper.get_pair(pool.pair_id)?;
        let (x, y) = keeper.pool_reserves(pool.id)?;
        Ok(Self {
            id: pool.id,
            pair_id: pool.pair_id,
            base_coin_denom: pair.base_coin_denom.clone(),
            quote_coin_denom: pair.quote_coin_denom.clone(),
            reserve_address: pool.reserve_address.to_string(),
            pool_share_denom: pool.pool_share_denom.clone(),
            // Strings keep u128 amounts exact in JSON output
            reserve_base: x.to_string(),
            reserve_quote: y.to_string(),
            pool_share_supply: keeper.pool_share_supply(pool.id)?.to_string(),
            pending_requests: keeper
                .store
                .requests(pool.id)
                .filter(|r| !r.status.is_terminal())
                .count(),
            disabled: pool.disabled,
        })
    }

    fn print(&self) {
        let status = if self.disabled {
            "disabled".red()
        } else {
            "enabled".green()
        };
        println!("{} {}", "Pool:".bright_cyan(), self.id);
        println!(
            "{} {} ({}/{})",
            "Pair:".bright_cyan(),
            self.pair_id,
            self.base_coin_denom,
            self.quote_coin_denom
        );
        println!("{} {}", "Status:".bright_cyan(), status);
        println!("{} {}", "Reserve:".bright_cyan(), self.reserve_address);
        println!(
            "{} {}{} / {}{}",
            "Reserves:".bright_cyan(),
            self.reserve_base,
            self.base_coin_denom,
            self.reserve_quote,
            self.quote_coin_denom
        );
        println!(
            "{} {}{}",
            "Share supply:".bright_cyan(),
            self.pool_share_supply,
            self.pool_share_denom
        );
        println!("{} {}", "Pending requests:".bright_cyan(), self.pending_requests);
    }
}

pub fn create_pair(keeper: &mut MemKeeper, creator: &str, base: &str, quote: &str) -> Result<()> {
    let pair = keeper.create_pair(&Address::from(creator), base, quote)?;

    println!("{}", "=== Create Pair ===".bright_green().bold());
    println!("{} {}", "Pair:".bright_cyan(), pair.id);
    println!("{} {}", "Base:".bright_cyan(), pair.base_coin_denom);
    println!("{} {}", "Quote:".bright_cyan(), pair.quote_coin_denom);
    Ok(())
}

pub fn show_pair(keeper: &MemKeeper, pair_id: u64, json: bool) -> Result<()> {
    let pair = keeper.get_pair(pair_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(pair)?);
        return Ok(());
    }

    println!("{}", "=== Pair ===".bright_green().bold());
    println!("{} {}", "Pair:".bright_cyan(), pair.id);
    println!("{} {}", "Base:".bright_cyan(), pair.base_coin_denom);
    println!("{} {}", "Quote:".bright_cyan(), pair.quote_coin_denom);
    match keeper.store.active_pool_id(pair.id) {
        Some(pool_id) => println!("{} {}", "Active pool:".bright_cyan(), pool_id),
        None => println!("{} {}", "Active pool:".bright_cyan(), "none".dimmed()),
    }
    Ok(())
}

pub fn list_pairs(keeper: &MemKeeper, json: bool) -> Result<()> {
    let pairs: Vec<_> = keeper.pairs().collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    println!("{}", "=== Pairs ===".bright_green().bold());
    if pairs.is_empty() {
        println!("{}", "No pairs found".dimmed());
    }
    for pair in pairs {
        println!("  {:>4}  {}/{}", pair.id, pair.base_coin_denom, pair.quote_coin_denom);
    }
    Ok(())
}

pub fn create_pool(keeper: &mut MemKeeper, creator: &str, pair_id: u64, coins: &str) -> Result<()> {
    let deposit: Coins = coins.parse()?;
    let pool = keeper.create_pool(&Address::from(creator), pair_id, &deposit)?;

    println!("{}", "=== Create Pool ===".bright_green().bold());
    PoolView::new(keeper, &pool)?.print();
    Ok(())
}

pub fn show_pool(keeper: &MemKeeper, pool_id: u64, json: bool) -> Result<()> {
    let view = PoolView::new(keeper, keeper.get_pool(pool_id)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "=== Pool ===".bright_green().bold());
    view.print();
    Ok(())
}

/// Look up the enabled pool for an ordered denom pair
pub fn find_pool(keeper: &MemKeeper, base: &str, quote: &str, json: bool) -> Result<()> {
    match keeper.get_pool_by_reserve_pair(base, quote) {
        Some(pool) => show_pool(keeper, pool.id, json),
        None => anyhow::bail!("No enabled pool for {}/{}", base, quote),
    }
}

pub fn list_pools(keeper: &MemKeeper, json: bool) -> Result<()> {
    let views = keeper
        .pools()
        .map(|pool| PoolView::new(keeper, pool))
        .collect::<Result<Vec<_>>>()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    println!("{}", "=== Pools ===".bright_green().bold());
    if views.is_empty() {
        println!("{}", "No pools found".dimmed());
    }
    for view in &views {
        let status = if view.disabled {
            "disabled".red()
        } else {
            "enabled".green()
        };
        println!(
            "  {:>4}  {}/{}  {}{} / {}{}  [{}]",
            view.id,
            view.base_coin_denom,
            view.quote_coin_denom,
            view.reserve_base,
            view.base_coin_denom,
            view.reserve_quote,
            view.quote_coin_denom,
            status
        );
    }
    Ok(())
}
