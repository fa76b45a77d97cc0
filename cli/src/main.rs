//! Liquidity CLI - local simulator for batch-settled liquidity pools
//!
//! Every invocation loads the keeper from a JSON state file, applies one
//! command and writes the state back. Blocks only advance on `end-block`,
//! so whole scenarios can be scripted from a shell.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use liquidity::{Amount, MemKeeper};
use std::path::PathBuf;

mod account;
mod batch;
mod config;
mod pool;
mod request;

use config::SimConfig;

#[derive(Parser)]
#[command(name = "liquidity")]
#[command(about = "Liquidity CLI - simulate batch-settled liquidity pools", long_about = None)]
#[command(version)]
struct Cli {
    /// State file (created on first use)
    #[arg(short, long, default_value = config::DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Params file (TOML), read only when a new state file is created
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Print queries as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an ordered denom pair
    CreatePair {
        /// Account registering the pair
        creator: String,

        /// Base coin denom
        base: String,

        /// Quote coin denom
        quote: String,
    },

    /// Pair queries
    Pair {
        #[command(subcommand)]
        command: PairCommands,
    },

    /// Create a pool on a pair, seeded from the creator's balance
    CreatePool {
        /// Pool creator (pays the creation fee)
        creator: String,

        /// Pair id
        pair_id: u64,

        /// Initial reserves, e.g. 1000000denom1,1000000denom2
        coins: String,
    },

    /// Pool queries
    Pool {
        #[command(subcommand)]
        command: PoolCommands,
    },

    /// Queue a deposit for the next batch
    Deposit {
        /// Depositor address
        depositor: String,

        /// Pool id
        pool_id: u64,

        /// Coins to deposit, one per reserve denom
        coins: String,
    },

    /// Queue a withdrawal for the next batch
    Withdraw {
        /// Withdrawer address
        withdrawer: String,

        /// Pool id
        pool_id: u64,

        /// Pool shares to redeem
        amount: Amount,
    },

    /// Batch request queries
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },

    /// Advance block height, running a batch at each boundary
    EndBlock {
        /// Number of blocks to advance
        #[arg(short = 'n', long, default_value = "1")]
        blocks: u64,
    },

    /// Run a batch now without advancing the height
    ProcessBatch,

    /// Settle one pending request ahead of its batch
    Execute {
        /// Pool id
        pool_id: u64,

        /// Request id
        id: u64,
    },

    /// Mint coins into an account
    Fund {
        /// Account to credit
        address: String,

        /// Coins to mint, e.g. 100denom1,200denom2
        coins: String,
    },

    /// Transfer coins between accounts outside the module
    Send {
        /// Sender (may be a pool reserve)
        from: String,

        /// Recipient
        to: String,

        /// Coins to transfer
        coins: String,
    },

    /// Show account balances
    Balances {
        /// Account (all accounts when omitted)
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum PairCommands {
    /// Show a pair by id
    Show { pair_id: u64 },

    /// List all pairs
    List,
}

#[derive(Subcommand)]
enum PoolCommands {
    /// Show a pool by id
    Show { pool_id: u64 },

    /// Show the enabled pool for an ordered denom pair
    Find { base: String, quote: String },

    /// List all pools
    List,
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Show one request
    Show { pool_id: u64, id: u64 },

    /// List a pool's requests that have not been purged
    List { pool_id: u64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.verbose {
        println!("{} {}", "State:".bright_cyan(), cli.state.display());
        if let Some(params) = &cli.params {
            println!("{} {}", "Params:".bright_cyan(), params.display());
        }
    }

    execute(cli)
}

/// Load state, run one command, and persist the result if it changed anything
fn execute(cli: Cli) -> Result<()> {
    let config = SimConfig::new(cli.state, cli.params);
    let mut keeper = config.load_keeper()?;

    if run(&mut keeper, cli.command, cli.json)? {
        config.save_keeper(&keeper)?;
    }
    Ok(())
}

/// Returns whether the command mutated the keeper
fn run(keeper: &mut MemKeeper, command: Commands, json: bool) -> Result<bool> {
    match command {
        Commands::CreatePair { creator, base, quote } => {
            pool::create_pair(keeper, &creator, &base, &quote)?;
        }
        Commands::Pair { command } => {
            match command {
                PairCommands::Show { pair_id } => pool::show_pair(keeper, pair_id, json)?,
                PairCommands::List => pool::list_pairs(keeper, json)?,
            }
            return Ok(false);
        }
        Commands::CreatePool { creator, pair_id, coins } => {
            pool::create_pool(keeper, &creator, pair_id, &coins)?;
        }
        Commands::Pool { command } => {
            match command {
                PoolCommands::Show { pool_id } => pool::show_pool(keeper, pool_id, json)?,
                PoolCommands::Find { base, quote } => pool::find_pool(keeper, &base, &quote, json)?,
                PoolCommands::List => pool::list_pools(keeper, json)?,
            }
            return Ok(false);
        }
        Commands::Deposit { depositor, pool_id, coins } => {
            request::deposit(keeper, &depositor, pool_id, &coins)?;
        }
        Commands::Withdraw { withdrawer, pool_id, amount } => {
            request::withdraw(keeper, &withdrawer, pool_id, amount)?;
        }
        Commands::Request { command } => {
            match command {
                RequestCommands::Show { pool_id, id } => {
                    request::show_request(keeper, pool_id, id, json)?
                }
                RequestCommands::List { pool_id } => request::list_requests(keeper, pool_id, json)?,
            }
            return Ok(false);
        }
        Commands::EndBlock { blocks } => {
            batch::end_block(keeper, blocks)?;
        }
        Commands::ProcessBatch => {
            batch::process_batch(keeper)?;
        }
        Commands::Execute { pool_id, id } => {
            batch::execute(keeper, pool_id, id)?;
        }
        Commands::Fund { address, coins } => {
            account::fund(keeper, &address, &coins)?;
        }
        Commands::Send { from, to, coins } => {
            account::send(keeper, &from, &to, &coins)?;
        }
        Commands::Balances { address } => {
            account::show_balances(keeper, address, json)?;
            return Ok(false);
        }
    }

    Ok(true)
}
