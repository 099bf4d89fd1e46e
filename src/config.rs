use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

const ACCOUNTS_FILE: &str = "accounts.dat";
const BOOKS_FILE: &str = "books.dat";
const TRANSACTIONS_FILE: &str = "transactions.dat";

/// Bookstore manager: reads one command per line and keeps its accounts,
/// books and ledger in flat record files.
#[derive(Debug, Parser)]
#[command(name = "bookstore")]
#[command(version)]
pub struct Cli {
    /// Directory holding accounts.dat, books.dat and transactions.dat
    #[arg(long, env = "BOOKSTORE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Read commands from this file instead of stdin
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_path(ACCOUNTS_FILE)
    }

    pub fn books_path(&self) -> PathBuf {
        self.data_path(BOOKS_FILE)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_path(TRANSACTIONS_FILE)
    }

    fn data_path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(file)
    }
}
