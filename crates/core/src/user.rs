use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a trial an account sits on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Site,
    Sponsor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Sponsor => "sponsor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" => Ok(Self::Site),
            "sponsor" => Ok(Self::Sponsor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The `{id, name, number}` triple shared by sites, sponsors and users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub number: u32,
}

/// The authenticated actor.
///
/// The role travels with the record, so a persisted user can be restored
/// without remembering which login call produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum User {
    Site(Account),
    Sponsor(Account),
}

impl User {
    pub fn role(&self) -> Role {
        match self {
            Self::Site(_) => Role::Site,
            Self::Sponsor(_) => Role::Sponsor,
        }
    }

    pub fn account(&self) -> &Account {
        match self {
            Self::Site(account) | Self::Sponsor(account) => account,
        }
    }

    pub fn id(&self) -> &str {
        &self.account().id
    }

    pub fn name(&self) -> &str {
        &self.account().name
    }

    pub fn number(&self) -> u32 {
        self.account().number
    }

    pub fn identity(&self) -> Identity {
        Identity {
            role: self.role(),
            number: self.number(),
        }
    }
}

/// What a caller asks to log in as: a role plus the account number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Identity {
    pub role: Role,
    pub number: u32,
}

impl Identity {
    pub fn site(number: u32) -> Self {
        Self {
            role: Role::Site,
            number,
        }
    }

    pub fn sponsor(number: u32) -> Self {
        Self {
            role: Role::Sponsor,
            number,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.role, self.number)
    }
}
