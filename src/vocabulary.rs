/// ZEV export vocabulary
///
/// Immutable lookup tables shared by the structure evaluator and the meter
/// hierarchy parser. Keyword lists are lowercase; callers lowercase the text
/// they match against.
use once_cell::sync::Lazy;
use regex::Regex;

/// Localized month names, one entry per calendar month (January first).
///
/// ZEV backends export German labels by default, but French and Italian
/// installations in Switzerland (and English exports) show up as well.
pub const MONTH_NAMES: [&[&str]; 12] = [
    &["januar", "january", "janvier", "gennaio"],
    &["februar", "february", "février", "febbraio"],
    &["märz", "march", "mars", "marzo"],
    &["april", "avril", "aprile"],
    &["mai", "may", "maggio"],
    &["juni", "june", "juin", "giugno"],
    &["juli", "july", "juillet", "luglio"],
    &["august", "août", "agosto"],
    &["september", "septembre", "settembre"],
    &["oktober", "october", "octobre", "ottobre"],
    &["november", "novembre"],
    &["dezember", "december", "décembre", "dicembre"],
];

/// Site, city and invoicing vocabulary found in ZEV header lines
pub const HEADER_KEYWORDS: &[&str] = &[
    "zwischenbächen",
    "zürich",
    "leistungsberechnung",
    "standard",
    "chinv",
    "zev",
    "bilanz",
    "messung",
    "zähler",
];

/// Meter, point, apartment and consumption vocabulary
pub const DATA_KEYWORDS: &[&str] = &[
    "chinv",
    "zähler",
    "messpunkt",
    "wohnung",
    "einheit",
    "verbrauch",
    "kwh",
    "stand",
    "zählerstand",
];

pub const METER_POINT_KEYWORDS: &[&str] = &["zähler", "messpunkt", "chinv"];
pub const APARTMENT_KEYWORDS: &[&str] = &["wohnung", "einheit", "apt"];
pub const CONSUMPTION_KEYWORDS: &[&str] = &["verbrauch", "kwh", "stand"];
pub const COST_KEYWORDS: &[&str] = &["kosten", "betrag", "eur", "chf"];

/// Row marker opening the sub-meter section of a meter block
pub const SUB_METER_MARKER: &str = "untermessungen";

static METER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^XX|CHINV").expect("meter id pattern is valid"));

static VENDOR_METER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CHINV|^XX\d").expect("vendor id pattern is valid"));

/// Text that opens a meter block ("XX…" codes or "CHINV…" vendor ids)
pub fn is_meter_id(text: &str) -> bool {
    !text.is_empty() && METER_ID.is_match(text)
}

/// Physical meters carry a CHINV id or a numbered "XX001"-style code;
/// other "XX…" codes name virtual aggregation meters
pub fn is_vendor_meter_id(text: &str) -> bool {
    VENDOR_METER_ID.is_match(text)
}

/// Index (0 = January) of the month whose localized name equals `token`
pub fn month_index(token: &str) -> Option<usize> {
    let lower = token.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|names| names.iter().any(|name| *name == lower))
}

/// Number of distinct months mentioned anywhere in `labels` (substring match)
pub fn count_months_mentioned<S: AsRef<str>>(labels: &[S]) -> usize {
    let lowered: Vec<String> = labels.iter().map(|l| l.as_ref().to_lowercase()).collect();
    MONTH_NAMES
        .iter()
        .filter(|names| {
            names
                .iter()
                .any(|name| lowered.iter().any(|label| label.contains(name)))
        })
        .count()
}

/// Whether `label` mentions any month name
pub fn mentions_month(label: &str) -> bool {
    let lower = label.to_lowercase();
    MONTH_NAMES
        .iter()
        .flat_map(|names| names.iter())
        .any(|name| lower.contains(name))
}

/// Whether any of `labels` contains any of `keywords`
pub fn any_contains<S: AsRef<str>>(labels: &[S], keywords: &[&str]) -> bool {
    labels.iter().any(|label| contains_any(label.as_ref(), keywords))
}

/// Case-insensitive substring match of `text` against a keyword list
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}
