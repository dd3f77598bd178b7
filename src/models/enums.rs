use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse failure for any of the string-backed enums below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
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

str_enum!(Persona {
    Sarah => "sarah",
    Aaron => "aaron",
});

str_enum!(QuestionOrigin {
    Fixed => "fixed",
    Generated => "generated",
    Closing => "closing",
});

str_enum!(ReportSource {
    Interview => "interview",
    Document => "document",
});

impl Persona {
    /// Name the interviewer introduces themselves with.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sarah => "Sarah",
            Self::Aaron => "Aaron",
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::Sarah
    }
}
