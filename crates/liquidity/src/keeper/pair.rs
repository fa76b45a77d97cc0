//! Pair registry

use log::info;

use crate::bank::ReserveLedger;
use crate::coin::validate_denom;
use crate::error::{LiquidityError, Result};
use crate::params::ParamStore;
use crate::types::{Address, Pair};

use super::Keeper;

impl<B, P> Keeper<B, P>
where
    B: ReserveLedger,
    P: ParamStore,
{
    /// Register an ordered denom pair
    pub fn create_pair(&mut self, creator: &Address, base: &str, quote: &str) -> Result<Pair> {
        validate_denom(base)?;
        validate_denom(quote)?;
        if base == quote {
            return Err(LiquidityError::SameDenoms(base.to_string()));
        }
        if self.store.pair_id_by_denoms(base, quote).is_some() {
            return Err(LiquidityError::PairAlreadyExists {
                base: base.to_string(),
                quote: quote.to_string(),
            });
        }

        let pair = Pair {
            id: self.store.last_pair_id() + 1,
            base_coin_denom: base.to_string(),
            quote_coin_denom: quote.to_string(),
        };
        self.store.set_pair(pair.clone());

        info!("pair {} created by {}: {}/{}", pair.id, creator, base, quote);
        Ok(pair)
    }

    pub fn get_pair(&self, id: u64) -> Result<&Pair> {
        self.store.pair(id).ok_or(LiquidityError::PairNotFound(id))
    }

    pub fn get_pair_by_denoms(&self, base: &str, quote: &str) -> Option<&Pair> {
        self.store
            .pair_id_by_denoms(base, quote)
            .and_then(|id| self.store.pair(id))
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.store.pairs()
    }
}
