#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages accepted for submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
pub enum Language {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Go"))]
    Go,
    #[serde(rename = "C++")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "C++"))]
    Cpp,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Java"))]
    Java,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Python"))]
    Python,
}

impl Language {
    pub const ALL: &'static [Language] = &[Self::Go, Self::Cpp, Self::Java, Self::Python];

    /// Language id understood by the judge engine.
    pub fn judge_id(&self) -> i32 {
        match self {
            Self::Go => 60,
            Self::Cpp => 54,
            Self::Java => 62,
            Self::Python => 71,
        }
    }

    /// Returns the tag used by clients and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Cpp => "C++",
            Self::Java => "Java",
            Self::Python => "Python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when a language tag is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLanguage {
    pub tag: String,
}

impl fmt::Display for UnsupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported language '{}'", self.tag)
    }
}

impl std::error::Error for UnsupportedLanguage {}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| UnsupportedLanguage { tag: s.to_string() })
    }
}
