#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account type. Only `Admin` passes the administrative gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ADMIN"))]
    Admin,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TESTER"))]
    Tester,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEVELOPER"))]
    Developer,
}

impl Role {
    pub const ALL: &'static [Role] = &[Self::Admin, Self::Tester, Self::Developer];

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Tester => "TESTER",
            Self::Developer => "DEVELOPER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: Vec<&'static str>,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, invalid: &str, valid: Vec<&'static str>) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid,
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.invalid,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "TESTER" => Ok(Self::Tester),
            "DEVELOPER" => Ok(Self::Developer),
            _ => Err(ParseEnumError::new(
                "role",
                s,
                Self::ALL.iter().map(Role::as_str).collect(),
            )),
        }
    }
}
