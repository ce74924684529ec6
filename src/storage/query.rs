use crate::models::Transaction;
use crate::types::Timestamp;

pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Optional criteria for listing persisted transactions. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub payer: Option<String>,
    pub payee: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>
}

impl TransactionFilter {
    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    pub fn with_range(mut self, from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.payer.as_deref().is_none_or(|payer| transaction.payer == payer)
            && self.payee.as_deref().is_none_or(|payee| transaction.payee == payee)
            && self.from.is_none_or(|from| transaction.timestamp >= from)
            && self.to.is_none_or(|to| transaction.timestamp <= to)
    }
}

/// One page of a filtered listing along with the total number of matches.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub data: Vec<Transaction>,
    pub total: usize,
    pub limit: usize
}
