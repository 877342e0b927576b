use thiserror::Error;

/// Typed outcome of a rejected or failed ledger operation.
///
/// The first five variants are business rejections: the operation was
/// refused and the portfolio state is guaranteed untouched. They are normal
/// control flow for the caller, never faults.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("an open position already exists for this trader and symbol")]
    DuplicatePosition,

    #[error("insufficient funds: required ${required:.2}, available ${available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("trade amount ${amount:.2} is below the ${minimum:.2} minimum")]
    BelowMinimumSize { amount: f64, minimum: f64 },

    #[error("no open position for this trader and symbol")]
    NoPosition,

    #[error("invalid price: {price}")]
    InvalidPrice { price: f64 },

    /// A persisted row failed schema validation. Malformed records are
    /// rejected at the boundary, never silently defaulted.
    #[error("malformed persisted record: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl LedgerError {
    /// True for business rejections that leave state unchanged by contract.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::DuplicatePosition
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::BelowMinimumSize { .. }
                | LedgerError::NoPosition
                | LedgerError::InvalidPrice { .. }
        )
    }
}
