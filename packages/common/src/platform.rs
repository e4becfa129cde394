#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Social network a tenant's account lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "instagram"))]
    Instagram,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "facebook"))]
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Instagram, Platform::Facebook];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instagram" => Ok(Self::Instagram),
            "facebook" => Ok(Self::Facebook),
            other => Err(format!("unsupported platform: {other}")),
        }
    }
}
