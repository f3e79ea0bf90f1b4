//! Feature inference from free-text detail blocks
//!
//! Detail blocks list equipment as loose text ("Personenaufzug", "Loggia",
//! "Zustand: Erstbezug"). Flags are inferred from keyword sets and a few
//! labeled values are pulled out line by line.

use crate::extract::fold_case;
use regex::Regex;
use std::sync::LazyLock;

/// Keyword sets per inferred flag, matched case-insensitively as substrings
pub const FEATURE_KEYWORDS: [(&str, &[&str]); 9] = [
    ("balkon", &["balkon", "loggia"]),
    ("terrasse", &["terrasse"]),
    ("fahrstuhl", &["personenaufzug", "aufzug", "lift"]),
    ("einbauküche", &["einbauküche"]),
    ("keller", &["keller"]),
    ("haustiere_erlaubt", &["haustiere erlaubt"]),
    (
        "teilmöbliert_/_möbliert",
        &["möbliert", "teilweise möbliert", "teilmöbliert"],
    ),
    ("garage", &["garage", "tiefgarage"]),
    ("parkplatz", &["stellplatz", "parkplatz", "carport"]),
];

/// Construction-era tokens that may show up under the condition label
const ERA_TOKENS: [&str; 2] = ["altbau", "neubau"];

static FLOORING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)böden:\s*([^\n\r]+)").expect("hardcoded regex pattern is valid")
});

static CONDITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)zustand:\s*([^\n\r]+)").expect("hardcoded regex pattern is valid")
});

static YEAR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)baujahr:\s*(\d{4})").expect("hardcoded regex pattern is valid")
});

/// Values pulled out of a details block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFacts {
    /// Inferred flags in `FEATURE_KEYWORDS` order
    pub flags: Vec<(&'static str, bool)>,
    pub boeden: Option<String>,
    pub baujahr: Option<i64>,
    pub zustand: Option<String>,
    pub bautyp: Option<String>,
}

/// Runs keyword inference and labeled-line extraction over a details block
pub fn analyze_details(text: &str) -> DetailFacts {
    let lowered = fold_case(text);

    let flags = FEATURE_KEYWORDS
        .iter()
        .map(|(flag, needles)| (*flag, needles.iter().any(|n| lowered.contains(n))))
        .collect();

    let boeden = FLOORING_LINE
        .captures(text)
        .map(|c| c[1].trim().to_string());

    let baujahr = YEAR_LINE
        .captures(text)
        .and_then(|c| c[1].parse::<i64>().ok());

    let conditions: Vec<&str> = CONDITION_LINE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect();
    let (zustand, bautyp) = resolve_condition(&conditions);

    DetailFacts {
        flags,
        boeden,
        baujahr,
        zustand,
        bautyp,
    }
}

/// Splits values found under the "Zustand" label into condition and
/// construction type
///
/// A value that is exactly an era token (`Altbau`/`Neubau`, any case) is the
/// construction type; the last such value wins. Any other value is the
/// condition; only the first one is kept.
///
/// Returns `(zustand, bautyp)`.
pub fn resolve_condition(values: &[&str]) -> (Option<String>, Option<String>) {
    let mut zustand = None;
    let mut bautyp = None;

    for value in values {
        if value.is_empty() {
            continue;
        }
        if ERA_TOKENS.contains(&fold_case(value).as_str()) {
            bautyp = Some(value.to_string());
        } else if zustand.is_none() {
            zustand = Some(value.to_string());
        }
    }

    (zustand, bautyp)
}
