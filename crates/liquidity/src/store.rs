//! Persisted state layout
//!
//! Tables are plain ordered maps so every iteration is deterministic:
//! - pairs by id, plus (base, quote) -> pair id
//! - pools by id, plus pair id -> the one enabled pool
//! - requests by pool id then request id
//! - per-pool request id counter

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LiquidityError, Result};
use crate::types::{Pair, Pool, Request};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    last_pair_id: u64,
    last_pool_id: u64,
    pairs: BTreeMap<u64, Pair>,
    pair_index: BTreeMap<String, BTreeMap<String, u64>>,
    pools: BTreeMap<u64, Pool>,
    active_pool_by_pair: BTreeMap<u64, u64>,
    requests: BTreeMap<u64, BTreeMap<u64, Request>>,
    last_request_id: BTreeMap<u64, u64>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- pairs ----

    pub fn last_pair_id(&self) -> u64 {
        self.last_pair_id
    }

    /// Insert a pair; the id counter never moves backwards
    pub fn set_pair(&mut self, pair: Pair) {
        self.last_pair_id = self.last_pair_id.max(pair.id);
        self.pair_index
            .entry(pair.base_coin_denom.clone())
            .or_default()
            .insert(pair.quote_coin_denom.clone(), pair.id);
        self.pairs.insert(pair.id, pair);
    }

    pub fn pair(&self, id: u64) -> Option<&Pair> {
        self.pairs.get(&id)
    }

    pub fn pair_id_by_denoms(&self, base: &str, quote: &str) -> Option<u64> {
        self.pair_index.get(base)?.get(quote).copied()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.values()
    }

    // ---- pools ----

    pub fn last_pool_id(&self) -> u64 {
        self.last_pool_id
    }

    /// Insert or overwrite a pool, keeping the active-pool index in step
    pub fn set_pool(&mut self, pool: Pool) {
        self.last_pool_id = self.last_pool_id.max(pool.id);
        if pool.disabled {
            if self.active_pool_by_pair.get(&pool.pair_id) == Some(&pool.id) {
                self.active_pool_by_pair.remove(&pool.pair_id);
            }
        } else {
            self.active_pool_by_pair.insert(pool.pair_id, pool.id);
        }
        self.pools.insert(pool.id, pool);
    }

    pub fn pool(&self, id: u64) -> Option<&Pool> {
        self.pools.get(&id)
    }

    pub fn active_pool_id(&self, pair_id: u64) -> Option<u64> {
        self.active_pool_by_pair.get(&pair_id).copied()
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    // ---- requests ----

    pub fn next_request_id(&mut self, pool_id: u64) -> u64 {
        let counter = self.last_request_id.entry(pool_id).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn set_request(&mut self, request: Request) {
        self.requests
            .entry(request.pool_id)
            .or_default()
            .insert(request.id, request);
    }

    pub fn request(&self, pool_id: u64, id: u64) -> Option<&Request> {
        self.requests.get(&pool_id)?.get(&id)
    }

    pub fn requests(&self, pool_id: u64) -> impl Iterator<Item = &Request> {
        self.requests.get(&pool_id).into_iter().flat_map(|t| t.values())
    }

    pub fn all_requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.values().flat_map(|t| t.values())
    }

    /// Ids of pending requests in ascending order
    pub fn pending_request_ids(&self, pool_id: u64) -> Vec<u64> {
        self.requests(pool_id)
            .filter(|r| !r.status.is_terminal())
            .map(|r| r.id)
            .collect()
    }

    /// Pools with at least one pending request, ascending
    pub fn pools_with_pending_requests(&self) -> Vec<u64> {
        self.requests
            .iter()
            .filter(|(_, table)| table.values().any(|r| !r.status.is_terminal()))
            .map(|(pool_id, _)| *pool_id)
            .collect()
    }

    /// Remove every terminal request, returning how many were dropped
    pub fn delete_terminal_requests(&mut self) -> usize {
        let mut deleted = 0;
        for table in self.requests.values_mut() {
            let before = table.len();
            table.retain(|_, r| !r.status.is_terminal());
            deleted += before - table.len();
        }
        self.requests.retain(|_, table| !table.is_empty());
        deleted
    }

    /// Check index and counter consistency after loading persisted state
    pub fn validate(&self) -> Result<()> {
        let corrupted = |msg: String| -> Result<()> { Err(LiquidityError::Corrupted(msg)) };

        for (id, pair) in &self.pairs {
            if *id != pair.id || *id > self.last_pair_id {
                return corrupted(format!("pair {id} out of sequence"));
            }
            if self.pair_id_by_denoms(&pair.base_coin_denom, &pair.quote_coin_denom) != Some(*id) {
                return corrupted(format!("pair {id} missing from denom index"));
            }
        }

        let mut enabled_per_pair: BTreeMap<u64, u64> = BTreeMap::new();
        for (id, pool) in &self.pools {
            if *id != pool.id || *id > self.last_pool_id {
                return corrupted(format!("pool {id} out of sequence"));
            }
            if !self.pairs.contains_key(&pool.pair_id) {
                return corrupted(format!("pool {id} references unknown pair {}", pool.pair_id));
            }
            if !pool.disabled {
                *enabled_per_pair.entry(pool.pair_id).or_insert(0) += 1;
                if self.active_pool_by_pair.get(&pool.pair_id) != Some(id) {
                    return corrupted(format!("enabled pool {id} missing from pair index"));
                }
            }
        }
        if let Some((pair_id, _)) = enabled_per_pair.iter().find(|(_, n)| **n > 1) {
            return corrupted(format!("pair {pair_id} has more than one enabled pool"));
        }
        if self.active_pool_by_pair.len() != enabled_per_pair.len() {
            return corrupted("stale entries in active pool index".to_string());
        }

        for (pool_id, table) in &self.requests {
            let last = self.last_request_id.get(pool_id).copied().unwrap_or(0);
            for (id, request) in table {
                if *id != request.id || request.pool_id != *pool_id || *id > last {
                    return corrupted(format!("request {pool_id}/{id} out of sequence"));
                }
            }
        }
        Ok(())
    }
}
