use std::path::PathBuf;
use thiserror::Error;

/// Why a command was refused. All of these print the same `Invalid` line;
/// the variant only reaches the log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("privilege too low")]
    PrivilegeTooLow,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("no such account")]
    UnknownAccount,
    #[error("account already exists")]
    DuplicateAccount,
    #[error("password mismatch")]
    WrongPassword,
    #[error("account has an active session")]
    SessionActive,
    #[error("login stack is empty")]
    EmptyLoginStack,
    #[error("no book selected")]
    NoSelection,
    #[error("no such book")]
    UnknownBook,
    #[error("ISBN already used by another book")]
    DuplicateIsbn,
    #[error("not enough stock")]
    InsufficientStock,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("cost must be positive")]
    NonPositiveCost,
    #[error("stock would overflow")]
    StockOverflow,
    #[error("window larger than the ledger")]
    WindowTooLarge,
    #[error("value exceeds field capacity")]
    FieldTooLong,
    #[error("malformed argument")]
    Malformed,
    #[error("unknown command")]
    UnknownCommand,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation: {0}")]
    Invalid(#[from] Rejection),

    #[error("could not access {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("could not write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("could not write listing: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Error::Invalid(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
