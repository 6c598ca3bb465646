#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::role::ParseEnumError;

/// Triage state of a non-conformity.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Just reported, nobody picked it up yet.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NEW"))]
    New,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ASSIGNED"))]
    Assigned,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IN_PROGRESS"))]
    InProgress,
    /// Fixed, waiting for a tester to verify.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING_QA"))]
    PendingQa,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CLOSED"))]
    Closed,
    /// Closed once, then found again.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REOPENED"))]
    Reopened,
}

impl Status {
    pub const ALL: &'static [Status] = &[
        Self::New,
        Self::Assigned,
        Self::InProgress,
        Self::PendingQa,
        Self::Closed,
        Self::Reopened,
    ];

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::PendingQa => "PENDING_QA",
            Self::Closed => "CLOSED",
            Self::Reopened => "REOPENED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new("status", s, Self::ALL.iter().map(Status::as_str).collect())
            })
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "LOW"))]
    Low,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MEDIUM"))]
    Medium,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "HIGH"))]
    High,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CRITICAL"))]
    Critical,
}

impl Priority {
    pub const ALL: &'static [Priority] = &[Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "priority",
                    s,
                    Self::ALL.iter().map(Priority::as_str).collect(),
                )
            })
    }
}
