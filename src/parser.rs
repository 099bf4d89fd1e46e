use crate::book::{Changes, Filter};
use crate::error::Rejection;
use crate::field::{FixedStr, Isbn, Keywords, Password, Privilege, UserId, UserName};
use crate::transaction::Window;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Quit,
    Su {
        user_id: UserId,
        password: Option<Password>,
    },
    Logout,
    Register {
        user_id: UserId,
        password: Password,
        user_name: UserName,
    },
    Passwd {
        user_id: UserId,
        current: Option<Password>,
        new: Password,
    },
    UserAdd {
        user_id: UserId,
        password: Password,
        privilege: Privilege,
        user_name: UserName,
    },
    Delete {
        user_id: UserId,
    },
    Show(Filter),
    ShowFinance(Window),
    Buy {
        isbn: Isbn,
        quantity: u32,
    },
    Select {
        isbn: Isbn,
    },
    Modify(Changes),
    Import {
        quantity: u32,
        total_cost: f64,
    },
    Log,
    Report,
}

pub struct Parser {}

impl Parser {
    pub fn parse(line: &str) -> Result<Option<Command>, Rejection> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match (name, args) {
            ("quit" | "exit", []) => Command::Quit,
            ("su", [user_id]) => Command::Su {
                user_id: field(user_id)?,
                password: None,
            },
            ("su", [user_id, password]) => Command::Su {
                user_id: field(user_id)?,
                password: Some(field(password)?),
            },
            ("logout", []) => Command::Logout,
            ("register", [user_id, password, user_name]) => Command::Register {
                user_id: field(user_id)?,
                password: field(password)?,
                user_name: field(user_name)?,
            },
            ("passwd", [user_id, new]) => Command::Passwd {
                user_id: field(user_id)?,
                current: None,
                new: field(new)?,
            },
            ("passwd", [user_id, current, new]) => Command::Passwd {
                user_id: field(user_id)?,
                current: Some(field(current)?),
                new: field(new)?,
            },
            ("useradd", [user_id, password, privilege, user_name]) => Command::UserAdd {
                user_id: field(user_id)?,
                password: field(password)?,
                privilege: Privilege::try_from(number::<i64>(privilege)?)?,
                user_name: field(user_name)?,
            },
            ("delete", [user_id]) => Command::Delete {
                user_id: field(user_id)?,
            },
            ("show", ["finance"]) => Command::ShowFinance(Window::All),
            ("show", ["finance", count]) => {
                Command::ShowFinance(Window::from(number::<i64>(count)?))
            }
            ("show", []) => Command::Show(Filter::All),
            ("show", [param]) => Command::Show(filter(param)?),
            ("buy", [isbn, quantity]) => Command::Buy {
                isbn: field(isbn)?,
                quantity: number(quantity)?,
            },
            ("select", [isbn]) => Command::Select {
                isbn: field(isbn)?,
            },
            ("modify", params) => Command::Modify(changes(params)?),
            ("import", [quantity, total_cost]) => Command::Import {
                quantity: number(quantity)?,
                total_cost: amount(total_cost)?,
            },
            ("log", _) => Command::Log,
            ("report", _) => Command::Report,
            ("quit" | "exit" | "su" | "logout" | "register" | "passwd" | "useradd", _)
            | ("delete" | "show" | "buy" | "select" | "import", _) => {
                return Err(Rejection::Malformed)
            }
            _ => return Err(Rejection::UnknownCommand),
        };

        Ok(Some(command))
    }
}

fn field<const N: usize>(token: &str) -> Result<FixedStr<N>, Rejection> {
    FixedStr::new(token)
}

fn number<T: FromStr>(token: &str) -> Result<T, Rejection> {
    token.parse().map_err(|_| Rejection::Malformed)
}

fn amount(token: &str) -> Result<f64, Rejection> {
    let value: f64 = number(token)?;
    if !value.is_finite() {
        return Err(Rejection::Malformed);
    }

    Ok(value)
}

fn param(token: &str) -> Result<(&str, &str), Rejection> {
    token
        .strip_prefix('-')
        .and_then(|rest| rest.split_once('='))
        .ok_or(Rejection::Malformed)
}

fn quoted(value: &str) -> Result<&str, Rejection> {
    let inner = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(Rejection::Malformed)?;
    if inner.is_empty() || inner.contains('"') {
        return Err(Rejection::Malformed);
    }

    Ok(inner)
}

fn bare(value: &str) -> Result<&str, Rejection> {
    if value.is_empty() || value.contains('"') {
        return Err(Rejection::Malformed);
    }

    Ok(value)
}

fn filter(token: &str) -> Result<Filter, Rejection> {
    let filter = match param(token)? {
        ("ISBN", value) => Filter::Isbn(field(bare(value)?)?),
        ("name", value) => Filter::Name(field(quoted(value)?)?),
        ("author", value) => Filter::Author(field(quoted(value)?)?),
        ("keyword", value) => {
            let keyword = quoted(value)?;
            if keyword.contains('|') {
                return Err(Rejection::Malformed);
            }
            Filter::Keyword(field(keyword)?)
        }
        _ => return Err(Rejection::Malformed),
    };

    Ok(filter)
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), Rejection> {
    if slot.replace(value).is_some() {
        return Err(Rejection::Malformed);
    }

    Ok(())
}

fn changes(tokens: &[&str]) -> Result<Changes, Rejection> {
    let mut changes = Changes::default();
    for token in tokens {
        match param(token)? {
            ("ISBN", value) => set_once(&mut changes.isbn, field(bare(value)?)?)?,
            ("name", value) => set_once(&mut changes.name, field(quoted(value)?)?)?,
            ("author", value) => set_once(&mut changes.author, field(quoted(value)?)?)?,
            ("keyword", value) => {
                set_once(&mut changes.keywords, Keywords::new(quoted(value)?)?)?
            }
            ("price", value) => {
                let price = amount(bare(value)?)?;
                if price < 0.0 {
                    return Err(Rejection::Malformed);
                }
                set_once(&mut changes.price, price)?
            }
            _ => return Err(Rejection::Malformed),
        }
    }

    Ok(changes)
}
