use crate::error::{Rejection, Result};
use crate::field::{Password, Privilege, UserId, UserName};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const ROOT_ID: &str = "root";
const ROOT_PASSWORD: &str = "sjtu";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    user_id: UserId,
    password: Password,
    user_name: UserName,
    privilege: Privilege,
}

impl Account {
    pub fn new(
        user_id: UserId,
        password: Password,
        user_name: UserName,
        privilege: Privilege,
    ) -> Account {
        Account {
            user_id,
            password,
            user_name,
            privilege,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn user_name(&self) -> &UserName {
        &self.user_name
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    fn check_password(&self, password: &Password) -> Result<()> {
        if self.password != *password {
            return Err(Rejection::WrongPassword.into());
        }

        Ok(())
    }
}

/// Accounts plus the login stack of the one terminal.
///
/// The top of the stack is the current user. Each logged-in identifier may
/// own a selected book index, dropped when that identifier is popped.
pub struct AccountsRepository {
    accounts: RecordStore<Account>,
    login_stack: Vec<UserId>,
    selections: HashMap<UserId, usize>,
}

impl AccountsRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<AccountsRepository> {
        let mut accounts: RecordStore<Account> = RecordStore::open(path)?;
        if accounts.is_empty() {
            let root = Account::new(
                UserId::new(ROOT_ID)?,
                Password::new(ROOT_PASSWORD)?,
                UserName::new(ROOT_ID)?,
                Privilege::ROOT,
            );
            accounts.push(root);
            accounts.save()?;
            log::info!("created superuser account {}", ROOT_ID);
        }

        Ok(AccountsRepository {
            accounts,
            login_stack: Vec::new(),
            selections: HashMap::new(),
        })
    }

    fn position(&self, user_id: &UserId) -> Option<usize> {
        self.accounts
            .records()
            .iter()
            .position(|acc| acc.user_id == *user_id)
    }

    pub fn get(&self, user_id: &UserId) -> Option<&Account> {
        self.position(user_id).and_then(|idx| self.accounts.get(idx))
    }

    fn get_known(&self, user_id: &UserId) -> Result<&Account> {
        self.get(user_id)
            .ok_or_else(|| Rejection::UnknownAccount.into())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.login_stack.last()
    }

    /// Privilege of the top of the login stack, looked up on every call.
    pub fn current_privilege(&self) -> Privilege {
        self.current_user()
            .and_then(|id| self.get(id))
            .map_or(Privilege::ANONYMOUS, Account::privilege)
    }

    pub fn login_depth(&self) -> usize {
        self.login_stack.len()
    }

    pub fn su(&mut self, user_id: &UserId, password: Option<&Password>) -> Result<()> {
        let target = self.get_known(user_id)?;
        match password {
            Some(password) => target.check_password(password)?,
            None => {
                if self.current_privilege() <= target.privilege() {
                    return Err(Rejection::PrivilegeTooLow.into());
                }
            }
        }

        self.login_stack.push(user_id.clone());
        log::info!("{} logged in (depth {})", user_id, self.login_stack.len());
        Ok(())
    }

    pub fn logout(&mut self) -> Result<UserId> {
        let user_id = self
            .login_stack
            .pop()
            .ok_or(Rejection::EmptyLoginStack)?;
        self.selections.remove(&user_id);
        log::info!("{} logged out", user_id);
        Ok(user_id)
    }

    pub fn register(
        &mut self,
        user_id: UserId,
        password: Password,
        user_name: UserName,
    ) -> Result<()> {
        if self.position(&user_id).is_some() {
            return Err(Rejection::DuplicateAccount.into());
        }

        self.accounts.push(Account::new(
            user_id,
            password,
            user_name,
            Privilege::CUSTOMER,
        ));
        self.accounts.save()
    }

    pub fn change_password(
        &mut self,
        user_id: &UserId,
        current: Option<&Password>,
        new: Password,
    ) -> Result<()> {
        let caller = self.current_privilege();
        if caller == Privilege::ANONYMOUS {
            return Err(Rejection::NotLoggedIn.into());
        }
        let idx = self
            .position(user_id)
            .ok_or(Rejection::UnknownAccount)?;
        match current {
            Some(current) => self.get_known(user_id)?.check_password(current)?,
            None => {
                if caller != Privilege::ROOT {
                    return Err(Rejection::PrivilegeTooLow.into());
                }
            }
        }

        if let Some(account) = self.accounts.get_mut(idx) {
            account.password = new;
        }
        self.accounts.save()
    }

    pub fn add_account(
        &mut self,
        user_id: UserId,
        password: Password,
        privilege: Privilege,
        user_name: UserName,
    ) -> Result<()> {
        let caller = self.current_privilege();
        if caller < Privilege::STAFF {
            return Err(Rejection::PrivilegeTooLow.into());
        }
        if self.position(&user_id).is_some() {
            return Err(Rejection::DuplicateAccount.into());
        }
        if privilege >= caller {
            return Err(Rejection::PrivilegeTooLow.into());
        }

        self.accounts
            .push(Account::new(user_id, password, user_name, privilege));
        self.accounts.save()
    }

    pub fn delete_account(&mut self, user_id: &UserId) -> Result<()> {
        if self.current_privilege() != Privilege::ROOT {
            return Err(Rejection::PrivilegeTooLow.into());
        }
        let idx = self
            .position(user_id)
            .ok_or(Rejection::UnknownAccount)?;
        if self.login_stack.contains(user_id) {
            return Err(Rejection::SessionActive.into());
        }

        self.accounts.remove(idx);
        self.accounts.save()
    }

    pub fn select(&mut self, book: usize) -> Result<()> {
        let user_id = self
            .current_user()
            .cloned()
            .ok_or(Rejection::NotLoggedIn)?;
        self.selections.insert(user_id, book);
        Ok(())
    }

    pub fn selection(&self) -> Option<usize> {
        self.current_user()
            .and_then(|id| self.selections.get(id))
            .copied()
    }
}
