//! Keyword registries for entity extraction.
//!
//! Each registry is an ordered table mapping a canonical token to the
//! phrases that trigger it. Declaration order is the match priority: the
//! first entry with any matching keyword wins, regardless of where in the
//! text the keywords occur.
//!
//! ## Matching
//!
//! | Keyword shape | Rule |
//! |---------------|------|
//! | contains a space | plain substring containment |
//! | single word | whole-word match (`\bword\b`) |

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Crop, FinancialDependency, Irrigation, Location, MarketDependency, Month};

/// An ordered keyword table.
pub type KeywordTable<T> = &'static [(T, &'static [&'static str])];

pub const CROP_KEYWORDS: KeywordTable<Crop> = &[
    (Crop::Rice, &["rice", "paddy", "samba", "kuruvai", "thaladi"]),
    (Crop::Wheat, &["wheat"]),
    (Crop::Maize, &["maize", "corn"]),
    (Crop::Sugarcane, &["sugarcane", "sugar cane"]),
    (Crop::Cotton, &["cotton"]),
    (Crop::Groundnut, &["groundnut", "peanut"]),
    (Crop::Soybean, &["soybean", "soya"]),
    (Crop::Tomato, &["tomato"]),
    (Crop::Onion, &["onion"]),
    (Crop::Banana, &["banana"]),
    (Crop::Mango, &["mango"]),
    (Crop::Turmeric, &["turmeric"]),
    (Crop::Chilli, &["chilli", "chili", "red pepper"]),
    (Crop::Pulses, &["pulses", "dal", "lentil", "moong", "urad", "toor", "arhar"]),
    (Crop::Vegetables, &["vegetables", "greens", "leafy"]),
];

pub const MONTH_KEYWORDS: KeywordTable<Month> = &[
    (Month::January, &["january", "jan"]),
    (Month::February, &["february", "feb"]),
    (Month::March, &["march", "mar"]),
    (Month::April, &["april", "apr"]),
    (Month::May, &["may"]),
    (Month::June, &["june", "jun"]),
    (Month::July, &["july", "jul"]),
    (Month::August, &["august", "aug"]),
    (Month::September, &["september", "sep", "sept"]),
    (Month::October, &["october", "oct"]),
    (Month::November, &["november", "nov"]),
    (Month::December, &["december", "dec"]),
];

pub const LOCATION_KEYWORDS: KeywordTable<Location> = &[
    (Location::TamilNadu, &["tamil nadu", "tamilnadu"]),
    (Location::AndhraPradesh, &["andhra pradesh", "andhra", "ap"]),
    (Location::Telangana, &["telangana"]),
    (Location::Karnataka, &["karnataka"]),
    (Location::Kerala, &["kerala"]),
    (Location::Maharashtra, &["maharashtra"]),
    (Location::Gujarat, &["gujarat"]),
    (Location::Rajasthan, &["rajasthan"]),
    (Location::Punjab, &["punjab"]),
    (Location::Haryana, &["haryana"]),
    (Location::UttarPradesh, &["uttar pradesh", "up"]),
    (Location::MadhyaPradesh, &["madhya pradesh", "mp"]),
    (Location::WestBengal, &["west bengal"]),
    (Location::Odisha, &["odisha", "orissa"]),
    (Location::Bihar, &["bihar"]),
    (Location::Assam, &["assam"]),
    (Location::Delhi, &["delhi"]),
];

pub const IRRIGATION_KEYWORDS: KeywordTable<Irrigation> = &[
    (
        Irrigation::Irrigated,
        &[
            "irrigated", "irrigation", "canal", "borewell", "bore well", "well water", "drip",
            "sprinkler", "pump", "tank fed", "river fed",
        ],
    ),
    (
        Irrigation::Rainfed,
        &[
            "rainfed", "rain fed", "rain-fed", "depends on rain", "dependent on rain", "monsoon",
            "no irrigation",
        ],
    ),
    (
        Irrigation::PartiallyIrrigated,
        &[
            "partially irrigated", "partial irrigation", "supplemental irrigation",
            "mixed irrigation",
        ],
    ),
];

pub const MARKET_DEPENDENCY_KEYWORDS: KeywordTable<MarketDependency> = &[
    (
        MarketDependency::High,
        &[
            "market dependent", "sells in market", "market price", "price fluctuation", "mandi",
            "wholesale market", "export", "price risk", "market risk", "dependent on market",
        ],
    ),
    (
        MarketDependency::Low,
        &[
            "self consumption", "self-consumption", "own use", "subsistence",
            "not market dependent", "local use",
        ],
    ),
    (
        MarketDependency::Medium,
        &["partly sells", "partial market", "some market", "local market", "village market"],
    ),
];

pub const FINANCIAL_DEPENDENCY_KEYWORDS: KeywordTable<FinancialDependency> = &[
    (
        FinancialDependency::Loan,
        &[
            "loan", "credit", "borrowed", "debt", "kcc", "kisan credit", "bank loan",
            "microfinance", "moneylender", "money lender", "owe", "repay", "installment",
        ],
    ),
    (
        FinancialDependency::Subsidy,
        &["subsidy", "government support", "pm kisan", "scheme", "grant", "free input", "aided"],
    ),
    (
        FinancialDependency::SelfFunded,
        &["self funded", "self-funded", "own funds", "no loan", "no credit", "savings", "own investment"],
    ),
    (
        FinancialDependency::Insurance,
        &["insurance", "pmfby", "crop insurance", "insured"],
    ),
];

/// A single compiled trigger.
#[derive(Debug)]
enum Keyword {
    Phrase(&'static str),
    Word(&'static str, Regex),
}

impl Keyword {
    fn compile(keyword: &'static str) -> Self {
        if keyword.contains(' ') {
            Keyword::Phrase(keyword)
        } else {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            Keyword::Word(keyword, Regex::new(&pattern).unwrap())
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Keyword::Phrase(phrase) => *phrase,
            Keyword::Word(word, _) => *word,
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            Keyword::Phrase(phrase) => text.contains(*phrase),
            Keyword::Word(_, regex) => regex.is_match(text),
        }
    }
}

/// A compiled, ordered registry.
#[derive(Debug)]
pub struct KeywordRegistry<T: 'static> {
    name: &'static str,
    entries: Vec<(T, Vec<Keyword>)>,
}

impl<T: Copy + 'static> KeywordRegistry<T> {
    /// Compile a keyword table, keeping its declaration order.
    pub fn compile(name: &'static str, table: KeywordTable<T>) -> Self {
        let entries = table
            .iter()
            .map(|(token, keywords)| (*token, keywords.iter().copied().map(Keyword::compile).collect()))
            .collect();

        Self { name, entries }
    }

    /// Registry name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First registry entry with a matching keyword, plus the keyword that hit.
    pub fn first_match_with_keyword(&self, text: &str) -> Option<(T, &'static str)> {
        self.entries.iter().find_map(|(token, keywords)| {
            keywords
                .iter()
                .find(|keyword| keyword.is_match(text))
                .map(|keyword| (*token, keyword.text()))
        })
    }

    /// First registry entry with a matching keyword.
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.first_match_with_keyword(text).map(|(token, _)| token)
    }
}

lazy_static! {
    pub static ref CROP_REGISTRY: KeywordRegistry<Crop> =
        KeywordRegistry::compile("crop", CROP_KEYWORDS);
    pub static ref MONTH_REGISTRY: KeywordRegistry<Month> =
        KeywordRegistry::compile("month", MONTH_KEYWORDS);
    pub static ref LOCATION_REGISTRY: KeywordRegistry<Location> =
        KeywordRegistry::compile("location", LOCATION_KEYWORDS);
    pub static ref IRRIGATION_REGISTRY: KeywordRegistry<Irrigation> =
        KeywordRegistry::compile("irrigation", IRRIGATION_KEYWORDS);
    pub static ref MARKET_DEPENDENCY_REGISTRY: KeywordRegistry<MarketDependency> =
        KeywordRegistry::compile("market_dependency", MARKET_DEPENDENCY_KEYWORDS);
    pub static ref FINANCIAL_DEPENDENCY_REGISTRY: KeywordRegistry<FinancialDependency> =
        KeywordRegistry::compile("financial_dependency", FINANCIAL_DEPENDENCY_KEYWORDS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_needs_word_boundary() {
        assert_eq!(CROP_REGISTRY.first_match("my cornfield is small"), None);
        assert_eq!(CROP_REGISTRY.first_match("i grow corn here"), Some(Crop::Maize));
    }

    #[test]
    fn test_phrase_uses_substring() {
        assert_eq!(
            CROP_REGISTRY.first_match("we grow sugar canes"),
            Some(Crop::Sugarcane)
        );
    }

    #[test]
    fn test_hyphenated_single_word() {
        assert_eq!(
            IRRIGATION_REGISTRY.first_match("a rain-fed plot"),
            Some(Irrigation::Rainfed)
        );
    }

    #[test]
    fn test_short_aliases_match_whole_words_only() {
        assert_eq!(LOCATION_REGISTRY.first_match("farm in up"), Some(Location::UttarPradesh));
        assert_eq!(LOCATION_REGISTRY.first_match("set up a farm"), Some(Location::UttarPradesh));
        assert_eq!(LOCATION_REGISTRY.first_match("happy farmer"), None);
    }

    #[test]
    fn test_registry_order_beats_text_order() {
        // "irrigation" appears in "no irrigation" and belongs to the earlier entry
        assert_eq!(
            IRRIGATION_REGISTRY.first_match("no irrigation at all"),
            Some(Irrigation::Irrigated)
        );
    }

    #[test]
    fn test_matched_keyword_reported() {
        let hit = FINANCIAL_DEPENDENCY_REGISTRY.first_match_with_keyword("took a kcc");
        assert_eq!(hit, Some((FinancialDependency::Loan, "kcc")));
    }

    #[test]
    fn test_every_table_covers_every_token() {
        assert_eq!(CROP_KEYWORDS.len(), Crop::ALL.len());
        assert_eq!(MONTH_KEYWORDS.len(), Month::ALL.len());
        assert_eq!(LOCATION_KEYWORDS.len(), Location::ALL.len());
        assert_eq!(MARKET_DEPENDENCY_KEYWORDS.len(), MarketDependency::ALL.len());
        assert_eq!(FINANCIAL_DEPENDENCY_KEYWORDS.len(), FinancialDependency::ALL.len());
    }
}
