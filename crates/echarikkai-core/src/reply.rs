//! Reasoning-reply parsing.
//!
//! The reasoning step is asked to answer in a fixed six-header layout:
//!
//! ```text
//! HIGH_RISKS:
//! * ...
//! MEDIUM_RISKS:
//! * ...
//! ASSUMPTIONS:
//! * ...
//! MITIGATION:
//! * ...
//! RISK_SCORE: <1-10>
//! CONFIDENCE_LEVEL: <low|medium|high>
//! ```
//!
//! It does not always comply. [`parse_reply`] is total: missing or garbled
//! sections become empty lists or unset scalars, never an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest valid risk score.
pub const MIN_RISK_SCORE: u8 = 1;

/// Highest valid risk score.
pub const MAX_RISK_SCORE: u8 = 10;

/// A risk score in `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    /// A score if `value` is in range.
    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(MIN_RISK_SCORE)..=i64::from(MAX_RISK_SCORE)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// A score with `value` clamped into range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_RISK_SCORE), i64::from(MAX_RISK_SCORE)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RiskScore {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("risk score {value} outside {MIN_RISK_SCORE}..={MAX_RISK_SCORE}")
        })
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How sure the reasoning step claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }

    /// Parse an already-lowercased word.
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "low" => Some(ConfidenceLevel::Low),
            "medium" => Some(ConfidenceLevel::Medium),
            "high" => Some(ConfidenceLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured form of a reasoning reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningReply {
    pub high_risks: Vec<String>,
    pub medium_risks: Vec<String>,
    pub assumptions: Vec<String>,
    pub mitigation: Vec<String>,
    pub risk_score: Option<RiskScore>,
    pub confidence_level: Option<ConfidenceLevel>,
}

impl ReasoningReply {
    /// A reply with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Section headers, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    HighRisks,
    MediumRisks,
    Assumptions,
    Mitigation,
    RiskScore,
    ConfidenceLevel,
}

impl Section {
    const ALL: [Section; 6] = [
        Section::HighRisks,
        Section::MediumRisks,
        Section::Assumptions,
        Section::Mitigation,
        Section::RiskScore,
        Section::ConfidenceLevel,
    ];

    fn marker(&self) -> &'static str {
        match self {
            Section::HighRisks => "HIGH_RISKS:",
            Section::MediumRisks => "MEDIUM_RISKS:",
            Section::Assumptions => "ASSUMPTIONS:",
            Section::Mitigation => "MITIGATION:",
            Section::RiskScore => "RISK_SCORE:",
            Section::ConfidenceLevel => "CONFIDENCE_LEVEL:",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Match a trimmed line against the markers, returning the inline remainder.
    fn detect(line: &str) -> Option<(Section, &str)> {
        Section::ALL.iter().find_map(|section| {
            line.strip_prefix(section.marker())
                .map(|rest| (*section, rest.trim()))
        })
    }
}

/// Placeholder items dropped from list sections.
const PLACEHOLDERS: [&str; 3] = ["none", "-", "n/a"];

/// Parse a reasoning reply. Never fails.
///
/// # Example
///
/// ```rust,ignore
/// let reply = parse_reply("RISK_SCORE: 7\nCONFIDENCE_LEVEL: medium");
/// assert_eq!(reply.risk_score.map(|s| s.value()), Some(7));
/// assert_eq!(reply.confidence_level, Some(ConfidenceLevel::Medium));
/// ```
pub fn parse_reply(text: &str) -> ReasoningReply {
    if text.trim().is_empty() {
        return ReasoningReply::empty();
    }

    let sections = split_sections(text);
    let [high, medium, assumptions, mitigation, score, confidence] = &sections;

    let reply = ReasoningReply {
        high_risks: parse_items(high),
        medium_risks: parse_items(medium),
        assumptions: parse_items(assumptions),
        mitigation: parse_items(mitigation),
        risk_score: parse_risk_score(score),
        confidence_level: parse_confidence(confidence),
    };

    tracing::debug!(
        high = reply.high_risks.len(),
        medium = reply.medium_risks.len(),
        risk_score = ?reply.risk_score,
        confidence = ?reply.confidence_level,
        "Parsed reasoning reply"
    );

    reply
}

/// Collect trimmed lines under each header. Text before the first header is dropped.
fn split_sections(text: &str) -> [Vec<&str>; 6] {
    let mut sections: [Vec<&str>; 6] = Default::default();
    let mut current: Option<Section> = None;

    for raw_line in split_lines(text) {
        let line = raw_line.trim();

        if let Some((section, remainder)) = Section::detect(line) {
            current = Some(section);
            if !remainder.is_empty() {
                sections[section.index()].push(remainder);
            }
        } else if let Some(section) = current {
            sections[section.index()].push(line);
        }
    }

    sections
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c'..='\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every Unicode line boundary; `\r\n` counts as one.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|chunk| chunk.split(is_line_break))
}

fn strip_bullet(line: &str) -> &str {
    for marker in ["* ", "- ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim();
        }
    }
    for marker in ['*', '-', '•'] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim();
        }
    }
    line
}

fn parse_items(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(strip_bullet)
        .filter(|item| !item.is_empty())
        .filter(|item| !PLACEHOLDERS.contains(&item.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Value part of a possible `key: value` line.
fn after_colon(line: &str) -> &str {
    match line.split_once(':') {
        Some((_, value)) => value.trim(),
        None => line,
    }
}

fn parse_risk_score(lines: &[&str]) -> Option<RiskScore> {
    lines.iter().find_map(|line| {
        let token = after_colon(line.trim());
        let digits: String = token
            .chars()
            .skip_while(|c| decimal_value(*c).is_none())
            .map_while(decimal_value)
            .filter_map(|d| char::from_digit(d, 10))
            .collect();
        digits.parse::<i64>().ok().and_then(RiskScore::new)
    })
}

/// Code points of every Unicode decimal digit zero (general category Nd).
/// Each is followed by the digits one through nine.
const DECIMAL_ZEROS: [u32; 66] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140,
    0x1E2F0, 0x1E950, 0x1FBF0,
];

/// Value of a decimal digit in any script, such as `७` (Devanagari seven).
fn decimal_value(c: char) -> Option<u32> {
    let code = u32::from(c);
    let next = DECIMAL_ZEROS.partition_point(|&zero| zero <= code);
    let zero = *DECIMAL_ZEROS.get(next.checked_sub(1)?)?;
    let value = code - zero;
    (value < 10).then_some(value)
}

fn parse_confidence(lines: &[&str]) -> Option<ConfidenceLevel> {
    lines.iter().find_map(|line| {
        let lowered = line.trim().to_lowercase();
        let token = after_colon(&lowered);
        token
            .split_whitespace()
            .next()
            .and_then(ConfidenceLevel::from_word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "
HIGH_RISKS:
* Drought risk due to rainfed irrigation during low-rainfall month
* KCC loan repayment pressure if harvest fails

MEDIUM_RISKS:
* Price volatility for rice in local mandi

ASSUMPTIONS:
* Normal monsoon conditions assumed for June

MITIGATION:
* Adopt drip irrigation to reduce water dependency
* Explore crop insurance schemes such as PMFBY

RISK_SCORE: 7
CONFIDENCE_LEVEL: medium
";

    #[test]
    fn test_well_formed_reply() {
        let reply = parse_reply(WELL_FORMED);

        assert_eq!(reply.high_risks.len(), 2);
        assert_eq!(
            reply.high_risks[0],
            "Drought risk due to rainfed irrigation during low-rainfall month"
        );
        assert_eq!(reply.medium_risks, vec!["Price volatility for rice in local mandi"]);
        assert_eq!(reply.assumptions.len(), 1);
        assert_eq!(reply.mitigation.len(), 2);
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(7));
        assert_eq!(reply.confidence_level, Some(ConfidenceLevel::Medium));
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(parse_reply(""), ReasoningReply::empty());
        assert_eq!(parse_reply("  \n\t "), ReasoningReply::empty());
    }

    #[test]
    fn test_unstructured_text_yields_nothing() {
        let reply = parse_reply("I think this farm will probably be fine, 8 out of 10.");
        assert_eq!(reply, ReasoningReply::empty());
    }

    #[test]
    fn test_out_of_range_score_is_unset() {
        assert_eq!(parse_reply("RISK_SCORE: 15").risk_score, None);
        assert_eq!(parse_reply("RISK_SCORE: 0").risk_score, None);
        assert_eq!(parse_reply("RISK_SCORE: 99999999999999999999999").risk_score, None);
    }

    #[test]
    fn test_score_takes_leading_digit_run() {
        assert_eq!(parse_reply("RISK_SCORE: 8/10").risk_score.map(|s| s.value()), Some(8));
        assert_eq!(
            parse_reply("RISK_SCORE: about 6 overall").risk_score.map(|s| s.value()),
            Some(6)
        );
    }

    #[test]
    fn test_score_on_following_line() {
        let reply = parse_reply("RISK_SCORE:\nnot sure\nScore: 4");
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(4));
    }

    #[test]
    fn test_first_valid_score_wins() {
        let reply = parse_reply("RISK_SCORE: 12\n3\n9");
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(3));
    }

    #[test]
    fn test_confidence_is_case_insensitive_first_word() {
        assert_eq!(
            parse_reply("CONFIDENCE_LEVEL: HIGH because data is good").confidence_level,
            Some(ConfidenceLevel::High)
        );
        assert_eq!(parse_reply("CONFIDENCE_LEVEL: moderate").confidence_level, None);
        assert_eq!(parse_reply("CONFIDENCE_LEVEL:").confidence_level, None);
    }

    #[test]
    fn test_placeholders_and_bullets() {
        let reply = parse_reply(
            "HIGH_RISKS:\n* None\n- n/a\n•   \n-\n- Pest attack\n•Flooding\nplain line\n*Heat stress",
        );
        assert_eq!(
            reply.high_risks,
            vec!["Pest attack", "Flooding", "plain line", "Heat stress"]
        );
    }

    #[test]
    fn test_bare_carriage_return_separates_lines() {
        let reply = parse_reply("HIGH_RISKS:\r* Drought\rRISK_SCORE: 7\rCONFIDENCE_LEVEL: medium");
        assert_eq!(reply.high_risks, vec!["Drought"]);
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(7));
        assert_eq!(reply.confidence_level, Some(ConfidenceLevel::Medium));
    }

    #[test]
    fn test_unicode_line_separators() {
        let reply = parse_reply(
            "HIGH_RISKS:\u{2028}* Drought\u{2029}* Pests\u{85}MEDIUM_RISKS:\x0b* Prices\x0cRISK_SCORE: 7\x1eCONFIDENCE_LEVEL: high",
        );
        assert_eq!(reply.high_risks, vec!["Drought", "Pests"]);
        assert_eq!(reply.medium_risks, vec!["Prices"]);
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(7));
        assert_eq!(reply.confidence_level, Some(ConfidenceLevel::High));
    }

    #[test]
    fn test_crlf_is_a_single_break() {
        let reply = parse_reply("HIGH_RISKS:\r\n* Drought\r\n\r\nRISK_SCORE: 6\r\n");
        assert_eq!(reply.high_risks, vec!["Drought"]);
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(6));
    }

    #[test]
    fn test_score_in_other_scripts() {
        assert_eq!(parse_reply("RISK_SCORE: ७").risk_score.map(|s| s.value()), Some(7));
        assert_eq!(parse_reply("RISK_SCORE: ௫/10").risk_score.map(|s| s.value()), Some(5));
        assert_eq!(parse_reply("RISK_SCORE: １０").risk_score.map(|s| s.value()), Some(10));
        assert_eq!(parse_reply("RISK_SCORE: ५५").risk_score, None);
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value('0'), Some(0));
        assert_eq!(decimal_value('9'), Some(9));
        assert_eq!(decimal_value('९'), Some(9));
        assert_eq!(decimal_value('a'), None);
        assert_eq!(decimal_value('²'), None);
        assert_eq!(decimal_value('\u{1FBF9}'), Some(9));
        assert_eq!(decimal_value('\u{1FBFA}'), None);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let reply = parse_reply("Sure! Here is my analysis.\n* not a risk\nHIGH_RISKS:\n* Real risk");
        assert_eq!(reply.high_risks, vec!["Real risk"]);
    }

    #[test]
    fn test_inline_header_content_and_indentation() {
        let reply = parse_reply("   HIGH_RISKS: * Hailstorm\n     * Locusts\nMITIGATION: Buy insurance");
        assert_eq!(reply.high_risks, vec!["Hailstorm", "Locusts"]);
        assert_eq!(reply.mitigation, vec!["Buy insurance"]);
    }

    #[test]
    fn test_repeated_header_continues_section() {
        let reply = parse_reply("ASSUMPTIONS:\n* One\nMITIGATION:\n* Fix\nASSUMPTIONS:\n* Two");
        assert_eq!(reply.assumptions, vec!["One", "Two"]);
        assert_eq!(reply.mitigation, vec!["Fix"]);
    }

    #[test]
    fn test_headers_are_case_sensitive() {
        let reply = parse_reply("high_risks:\n* Drought");
        assert!(reply.high_risks.is_empty());
    }

    #[test]
    fn test_fallback_payload() {
        let reply = parse_reply(
            "HIGH_RISKS:\n* None\n\nMEDIUM_RISKS:\n* None\n\nASSUMPTIONS:\n* LLM unavailable\n\n\
             MITIGATION:\n* Manual review required\n\nRISK_SCORE: 5\nCONFIDENCE_LEVEL: low",
        );

        assert!(reply.high_risks.is_empty());
        assert!(reply.medium_risks.is_empty());
        assert_eq!(reply.assumptions, vec!["LLM unavailable"]);
        assert_eq!(reply.mitigation, vec!["Manual review required"]);
        assert_eq!(reply.risk_score.map(|s| s.value()), Some(5));
        assert_eq!(reply.confidence_level, Some(ConfidenceLevel::Low));
    }

    #[test]
    fn test_risk_score_bounds() {
        assert!(RiskScore::new(0).is_none());
        assert_eq!(RiskScore::new(10).map(|s| s.value()), Some(10));
        assert_eq!(RiskScore::clamped(-4).value(), 1);
        assert_eq!(RiskScore::clamped(42).value(), 10);
        assert!(serde_json::from_str::<RiskScore>("11").is_err());
        assert_eq!(serde_json::to_string(&RiskScore::clamped(3)).unwrap(), "3");
    }
}
