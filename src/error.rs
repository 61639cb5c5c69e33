use std::{error::Error, fmt};

/// The four error kinds the core can raise.
///
/// `TransactionAborted` signals that the caller must invoke
/// `transaction_complete(tid, false)`; the others are programming or
/// resource errors that do not imply any particular recovery action.
#[derive(Debug)]
pub enum SmallError {
    TransactionAborted(String),
    DbError(String),
    NoSuchElement(String),
    IllegalArgument(String),
}

impl SmallError {
    pub fn transaction_aborted(msg: &str) -> SmallError {
        SmallError::TransactionAborted(msg.to_string())
    }

    pub fn db_error(msg: &str) -> SmallError {
        SmallError::DbError(msg.to_string())
    }

    pub fn no_such_element(msg: &str) -> SmallError {
        SmallError::NoSuchElement(msg.to_string())
    }

    pub fn illegal_argument(msg: &str) -> SmallError {
        SmallError::IllegalArgument(msg.to_string())
    }

    /// True for the one error kind that carries a required recovery
    /// action (the caller must abort the transaction).
    pub fn is_transaction_aborted(&self) -> bool {
        matches!(self, SmallError::TransactionAborted(_))
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SmallError::TransactionAborted(msg) => write!(f, "transaction aborted: {}", msg),
            SmallError::DbError(msg) => write!(f, "db error: {}", msg),
            SmallError::NoSuchElement(msg) => write!(f, "no such element: {}", msg),
            SmallError::IllegalArgument(msg) => write!(f, "illegal argument: {}", msg),
        }
    }
}

impl Error for SmallError {}
