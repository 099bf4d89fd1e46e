use bookstore::account::AccountsRepository;
use bookstore::book::Catalog;
use bookstore::config::Cli;
use bookstore::engine::Engine;
use bookstore::transaction::TransactionLedger;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

fn run(cli: &Cli) -> bookstore::Result<()> {
    std::fs::create_dir_all(&cli.data_dir).map_err(|source| bookstore::Error::Storage {
        path: cli.data_dir.clone(),
        source,
    })?;

    let mut accounts = AccountsRepository::open(cli.accounts_path())?;
    let mut catalog = Catalog::open(cli.books_path())?;
    let mut tx_ledger = TransactionLedger::open(cli.transactions_path())?;
    let mut engine = Engine::new(&mut accounts, &mut catalog, &mut tx_ledger);

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => {
            let file = File::open(path).map_err(|source| bookstore::Error::Storage {
                path: path.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };
    engine.process(input, &mut io::stdout().lock())
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    run(&cli).unwrap_or_else(|err| {
        eprintln!("bookstore: {}", err);
        process::exit(1);
    });
}
