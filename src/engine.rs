use crate::account::AccountsRepository;
use crate::book::Catalog;
use crate::error::{Error, Rejection, Result};
use crate::field::Privilege;
use crate::parser::{Command, Parser};
use crate::transaction::TransactionLedger;
use std::io::{BufRead, Write};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn required_privilege(command: &Command) -> Privilege {
    match command {
        Command::Quit | Command::Su { .. } | Command::Register { .. } => Privilege::ANONYMOUS,
        Command::Logout
        | Command::Passwd { .. }
        | Command::Show(_)
        | Command::Buy { .. } => Privilege::CUSTOMER,
        Command::UserAdd { .. }
        | Command::Select { .. }
        | Command::Modify(_)
        | Command::Import { .. } => Privilege::STAFF,
        Command::Delete { .. }
        | Command::ShowFinance(_)
        | Command::Log
        | Command::Report => Privilege::ROOT,
    }
}

pub struct Engine<'a> {
    pub accounts: &'a mut AccountsRepository,
    pub catalog: &'a mut Catalog,
    pub tx_ledger: &'a mut TransactionLedger,
}

impl Engine<'_> {
    pub fn new<'a>(
        accounts: &'a mut AccountsRepository,
        catalog: &'a mut Catalog,
        tx_ledger: &'a mut TransactionLedger,
    ) -> Engine<'a> {
        Engine {
            accounts,
            catalog,
            tx_ledger,
        }
    }

    fn authorize(&self, command: &Command) -> Result<()> {
        if self.accounts.current_privilege() < required_privilege(command) {
            return Err(Rejection::PrivilegeTooLow.into());
        }

        Ok(())
    }

    fn selection(&self) -> Result<usize> {
        self.accounts
            .selection()
            .ok_or_else(|| Rejection::NoSelection.into())
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        self.authorize(&command)?;

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Su { user_id, password } => {
                self.accounts.su(&user_id, password.as_ref())?;
            }
            Command::Logout => {
                self.accounts.logout()?;
            }
            Command::Register {
                user_id,
                password,
                user_name,
            } => self.accounts.register(user_id, password, user_name)?,
            Command::Passwd {
                user_id,
                current,
                new,
            } => self
                .accounts
                .change_password(&user_id, current.as_ref(), new)?,
            Command::UserAdd {
                user_id,
                password,
                privilege,
                user_name,
            } => self
                .accounts
                .add_account(user_id, password, privilege, user_name)?,
            Command::Delete { user_id } => self.accounts.delete_account(&user_id)?,
            Command::Show(filter) => self.catalog.display(&filter, out)?,
            Command::ShowFinance(window) => match self.tx_ledger.summarize(window)? {
                Some(summary) => writeln!(out, "{}", summary)?,
                None => writeln!(out)?,
            },
            Command::Buy { isbn, quantity } => {
                let total = self.catalog.buy(&isbn, quantity)?;
                self.tx_ledger.record(total)?;
                writeln!(out, "{:.2}", total)?;
            }
            Command::Select { isbn } => {
                let index = self.catalog.select(&isbn)?;
                self.accounts.select(index)?;
            }
            Command::Modify(changes) => {
                let index = self.selection()?;
                self.catalog.modify(index, changes)?;
            }
            Command::Import {
                quantity,
                total_cost,
            } => {
                let index = self.selection()?;
                self.catalog.import(index, quantity, total_cost)?;
                self.tx_ledger.record(-total_cost)?;
            }
            Command::Log | Command::Report => {}
        }

        Ok(Flow::Continue)
    }

    /// Runs one input line. Rejected commands print `Invalid`; only storage
    /// and output failures come back as errors.
    pub fn run_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let command = match Parser::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(rejection) => {
                log::debug!("could not parse {:?}: {}", line.trim(), rejection);
                writeln!(out, "Invalid")?;
                return Ok(Flow::Continue);
            }
        };

        log::debug!("executing {:?}", command);
        match self.execute(command, out) {
            Err(Error::Invalid(rejection)) => {
                log::warn!("rejected {:?}: {}", line.trim(), rejection);
                writeln!(out, "Invalid")?;
                Ok(Flow::Continue)
            }
            other => other,
        }
    }

    /// Reads commands until end of input or `quit`. A line that is not
    /// UTF-8 is rejected like any other malformed command.
    pub fn process<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }

            let flow = match std::str::from_utf8(&buf) {
                Ok(line) => self.run_line(line, out)?,
                Err(err) => {
                    log::warn!("rejected {:?}: {}", String::from_utf8_lossy(&buf), err);
                    writeln!(out, "Invalid")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }
        out.flush()?;

        Ok(())
    }
}
