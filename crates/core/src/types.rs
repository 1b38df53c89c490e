use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Who may read a wiki besides its author.
///
/// Stored as a SMALLINT: `0` private, `1` unlisted, `2` public. Unlisted wikis
/// are readable by anyone holding the link but are left out of the public
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Unlisted,
    Public,
}

impl Visibility {
    pub fn as_i16(self) -> i16 {
        match self {
            Visibility::Private => 0,
            Visibility::Unlisted => 1,
            Visibility::Public => 2,
        }
    }

    pub fn from_i16(value: i16) -> Result<Self, CoreError> {
        match value {
            0 => Ok(Visibility::Private),
            1 => Ok(Visibility::Unlisted),
            2 => Ok(Visibility::Public),
            other => Err(CoreError::Integrity(format!(
                "Unknown visibility level {other}"
            ))),
        }
    }

    /// Parse the settings-form spelling. `hidden` is accepted as an alias of
    /// `unlisted`.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "private" => Ok(Visibility::Private),
            "unlisted" | "hidden" => Ok(Visibility::Unlisted),
            "public" => Ok(Visibility::Public),
            other => Err(CoreError::Validation(format!(
                "Invalid visibility '{other}'. Valid values: private, unlisted, public"
            ))),
        }
    }
}
