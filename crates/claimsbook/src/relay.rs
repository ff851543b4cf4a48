//! Relayed token events.
//!
//! The relay holds no state. It checks the caller and the arguments and hands
//! back the event to append.

use claimsbook_core::validation::{require_address, require_positive};
use claimsbook_core::{Address, RegistryEvent, Result};
use claimsbook_perms::{AccessControl, Role};

/// Validates and re-emits token events for event reporters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRelay;

impl EventRelay {
    pub fn fungible_transfer(
        acl: &AccessControl,
        caller: &Address,
        from: Address,
        to: Address,
        fungible_token: Address,
        nft_base: Address,
        amount: u128,
    ) -> Result<RegistryEvent> {
        acl.require_role(caller, Role::EventReporter)?;
        require_address(&from, "from")?;
        require_address(&to, "to")?;
        require_address(&fungible_token, "fungible token")?;
        require_address(&nft_base, "nft base")?;
        require_positive(amount, "amount")?;

        Ok(RegistryEvent::FungibleTransfer {
            from,
            to,
            fungible_token,
            nft_base,
            amount,
        })
    }

    pub fn non_fungible_split(
        acl: &AccessControl,
        caller: &Address,
        token_owner: Address,
        nft_base: Address,
        obligature_id: u64,
        marketplace_id: u64,
    ) -> Result<RegistryEvent> {
        acl.require_role(caller, Role::EventReporter)?;
        require_address(&token_owner, "token owner")?;
        require_address(&nft_base, "nft base")?;

        Ok(RegistryEvent::ObligatureSplit {
            token_owner,
            nft_base,
            obligature_id,
            marketplace_id,
        })
    }
}
