use crate::errors::GovernanceError;

/// The DAO's pooled balance, in lamports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Treasury {
    balance: u64,
}

impl Treasury {
    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn can_cover(&self, amount: u64) -> bool {
        amount <= self.balance
    }

    pub(crate) fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    pub(crate) fn debit(&mut self, amount: u64) -> Result<(), GovernanceError> {
        if !self.can_cover(amount) {
            return Err(GovernanceError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}
