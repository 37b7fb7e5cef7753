use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(RiskText {
    VeryHigh => "Very High Risk",
    High => "High Risk",
    Moderate => "Moderate Risk",
    Low => "Low Risk",
    ModelNotLoaded => "Model Not Loaded",
    InputError => "Input Error",
});

impl RiskText {
    /// Band a 0-100 risk level.
    pub fn from_level(risk_level: i64) -> Self {
        if risk_level > 75 {
            Self::VeryHigh
        } else if risk_level > 50 {
            Self::High
        } else if risk_level > 25 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}
