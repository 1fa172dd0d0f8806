//! # Escrow Ledger
//!
//! Tracks the value held on behalf of all live games and the withdrawable
//! balance of every payout recipient. Per-game amounts live on the game
//! record; the ledger only sees totals and recipients.
//!
//! All arithmetic is checked. A failed call leaves the ledger untouched.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
struct LedgerInner {
    /// Sum of escrow across every game that hasn't been paid out.
    held: U256,
    /// Withdrawable balance per recipient.
    balances: HashMap<Address, U256>,
    /// Total ever paid out.
    paid_out: U256,
}

/// Escrow and payout accounting.
///
/// Lock order: callers may hold a game lock while calling in here; the
/// ledger never calls back out.
#[derive(Debug, Default)]
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a deposit into escrow.
    ///
    /// # Errors
    ///
    /// [`EngineError::ArithmeticOverflow`] if the held total would overflow.
    pub fn lock(&self, amount: U256) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        inner.held = inner
            .held
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Releases `amount` from escrow to `recipient`.
    ///
    /// Returns the recipient's new balance.
    ///
    /// # Errors
    ///
    /// [`EngineError::ArithmeticOverflow`] if escrow is short or the
    /// recipient's balance would overflow.
    pub fn release(&self, recipient: Address, amount: U256) -> EngineResult<U256> {
        let mut inner = self.inner.lock();
        let held = inner
            .held
            .checked_sub(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        let current = inner.balances.get(&recipient).copied().unwrap_or_default();
        let balance = current
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        let paid_out = inner
            .paid_out
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;

        inner.held = held;
        inner.balances.insert(recipient, balance);
        inner.paid_out = paid_out;
        Ok(balance)
    }

    /// Value currently held in escrow across all games.
    #[must_use]
    pub fn held(&self) -> U256 {
        self.inner.lock().held
    }

    /// Total value released to recipients so far.
    #[must_use]
    pub fn paid_out(&self) -> U256 {
        self.inner.lock().paid_out
    }

    /// Withdrawable balance of `address`.
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> U256 {
        self.inner
            .lock()
            .balances
            .get(address)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_and_release() {
        let ledger = Ledger::new();
        let recipient = Address::repeat_byte(7);

        ledger.lock(U256::from(3)).unwrap();
        ledger.lock(U256::from(3)).unwrap();
        assert_eq!(ledger.held(), U256::from(6));

        let balance = ledger.release(recipient, U256::from(6)).unwrap();
        assert_eq!(balance, U256::from(6));
        assert_eq!(ledger.held(), U256::ZERO);
        assert_eq!(ledger.paid_out(), U256::from(6));
        assert_eq!(ledger.balance_of(&recipient), U256::from(6));
    }

    #[test]
    fn test_release_more_than_held_is_atomic() {
        let ledger = Ledger::new();
        let recipient = Address::repeat_byte(1);
        ledger.lock(U256::from(2)).unwrap();

        assert_eq!(
            ledger.release(recipient, U256::from(5)),
            Err(EngineError::ArithmeticOverflow)
        );
        assert_eq!(ledger.held(), U256::from(2));
        assert_eq!(ledger.balance_of(&recipient), U256::ZERO);
    }

    #[test]
    fn test_lock_overflow() {
        let ledger = Ledger::new();
        ledger.lock(U256::MAX).unwrap();
        assert_eq!(ledger.lock(U256::from(1)), Err(EngineError::ArithmeticOverflow));
        assert_eq!(ledger.held(), U256::MAX);
    }

    #[test]
    fn test_balances_accumulate() {
        let ledger = Ledger::new();
        let recipient = Address::repeat_byte(9);
        ledger.lock(U256::from(10)).unwrap();
        ledger.release(recipient, U256::from(4)).unwrap();
        let balance = ledger.release(recipient, U256::from(6)).unwrap();
        assert_eq!(balance, U256::from(10));
    }
}
