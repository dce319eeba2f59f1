//! Core data types: the decision context and its closed vocabularies.
//!
//! Every field of a [`DecisionContext`] is drawn from a closed enumeration
//! of canonical lowercase tokens. Absence of a signal is always `None`,
//! never an empty string.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Declares a closed vocabulary of canonical tokens.
///
/// Generates the enum, `ALL` in declaration order, `as_str`, `Display`,
/// case-insensitive `FromStr`, and string-based serde impls.
macro_rules! canonical_tokens {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every token, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// The canonical lowercase token.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let token = s.trim().to_lowercase();
                match token.as_str() {
                    $( $token => Ok($name::$variant), )+
                    _ => Err($crate::CoreError::UnknownToken {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use canonical_tokens;

canonical_tokens! {
    /// Crops recognised by the extractor.
    pub enum Crop ("crop") {
        Rice => "rice",
        Wheat => "wheat",
        Maize => "maize",
        Sugarcane => "sugarcane",
        Cotton => "cotton",
        Groundnut => "groundnut",
        Soybean => "soybean",
        Tomato => "tomato",
        Onion => "onion",
        Banana => "banana",
        Mango => "mango",
        Turmeric => "turmeric",
        Chilli => "chilli",
        Pulses => "pulses",
        Vegetables => "vegetables",
    }
}

canonical_tokens! {
    /// Calendar months.
    pub enum Month ("month") {
        January => "january",
        February => "february",
        March => "march",
        April => "april",
        May => "may",
        June => "june",
        July => "july",
        August => "august",
        September => "september",
        October => "october",
        November => "november",
        December => "december",
    }
}

canonical_tokens! {
    /// Indian states and territories recognised by the extractor.
    pub enum Location ("location") {
        TamilNadu => "tamil_nadu",
        AndhraPradesh => "andhra_pradesh",
        Telangana => "telangana",
        Karnataka => "karnataka",
        Kerala => "kerala",
        Maharashtra => "maharashtra",
        Gujarat => "gujarat",
        Rajasthan => "rajasthan",
        Punjab => "punjab",
        Haryana => "haryana",
        UttarPradesh => "uttar_pradesh",
        MadhyaPradesh => "madhya_pradesh",
        WestBengal => "west_bengal",
        Odisha => "odisha",
        Bihar => "bihar",
        Assam => "assam",
        Delhi => "delhi",
    }
}

canonical_tokens! {
    /// Water source of the farm.
    pub enum Irrigation ("irrigation") {
        Irrigated => "irrigated",
        Rainfed => "rainfed",
        PartiallyIrrigated => "partially_irrigated",
        /// Explicitly reported as having no water source. The extractor never
        /// produces this; it arrives from callers building a context by hand.
        NoSource => "none",
    }
}

canonical_tokens! {
    /// How much of the harvest is sold into markets.
    pub enum MarketDependency ("market_dependency") {
        High => "high",
        Low => "low",
        Medium => "medium",
    }
}

canonical_tokens! {
    /// Primary financial arrangement behind the plan.
    pub enum FinancialDependency ("financial_dependency") {
        Loan => "loan",
        Subsidy => "subsidy",
        SelfFunded => "self_funded",
        Insurance => "insurance",
    }
}

/// The structured record extracted from a farm-plan description.
///
/// Always carries all six keys when serialized; unset fields serialize as
/// `null`. Blank strings deserialize to `None`, unknown tokens are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub crop: Option<Crop>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub month: Option<Month>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<Location>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub irrigation: Option<Irrigation>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub market_dependency: Option<MarketDependency>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub financial_dependency: Option<FinancialDependency>,
}

impl DecisionContext {
    /// A context with every field unset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a context from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidContext(e.to_string()))
    }

    /// The field as its canonical token, for display.
    pub fn field_token(&self, field: ContextField) -> Option<&'static str> {
        match field {
            ContextField::Crop => self.crop.map(|v| v.as_str()),
            ContextField::Month => self.month.map(|v| v.as_str()),
            ContextField::Location => self.location.map(|v| v.as_str()),
            ContextField::Irrigation => self.irrigation.map(|v| v.as_str()),
            ContextField::MarketDependency => self.market_dependency.map(|v| v.as_str()),
            ContextField::FinancialDependency => self.financial_dependency.map(|v| v.as_str()),
        }
    }

    /// Whether a field carries a value.
    pub fn is_set(&self, field: ContextField) -> bool {
        self.field_token(field).is_some()
    }
}

/// Names of the six context fields, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    Crop,
    Month,
    Location,
    Irrigation,
    MarketDependency,
    FinancialDependency,
}

impl ContextField {
    pub const ALL: [ContextField; 6] = [
        ContextField::Crop,
        ContextField::Month,
        ContextField::Location,
        ContextField::Irrigation,
        ContextField::MarketDependency,
        ContextField::FinancialDependency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::Crop => "crop",
            ContextField::Month => "month",
            ContextField::Location => "location",
            ContextField::Irrigation => "irrigation",
            ContextField::MarketDependency => "market_dependency",
            ContextField::FinancialDependency => "financial_dependency",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => value.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}
