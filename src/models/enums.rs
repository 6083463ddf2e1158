use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored or wire string does not map to an enum variant.
#[derive(Debug, Clone, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Frequency {
    Daily => "daily",
    Weekly => "weekly",
});

str_enum!(ReminderStatus {
    Active => "active",
    Inactive => "inactive",
});

// Pending is never stored; it is the absence of an intake log.
str_enum!(IntakeStatus {
    Taken => "taken",
});

/// Derived display status of a single agenda slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Taken,
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn frequency_round_trips() {
        assert_eq!(Frequency::from_str("daily").unwrap(), Frequency::Daily);
        assert_eq!(Frequency::from_str("weekly").unwrap(), Frequency::Weekly);
        assert_eq!(Frequency::Weekly.as_str(), "weekly");
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = Frequency::from_str("hourly").unwrap_err();
        assert_eq!(err.value, "hourly");
    }

    #[test]
    fn slot_status_serializes_snake_case() {
        let json = serde_json::to_string(&SlotStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
