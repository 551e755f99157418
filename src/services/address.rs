//! Structured address parsing
//!
//! Recognizes the common Brazilian postal shape
//! `<street>, <city> - <UF>, Brasil` so the resolver can issue a structured
//! street/city/state query when free-text search fails.

/// Street, city and state extracted from a normalized address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAddress {
    /// Everything before the city segment. May be empty.
    pub street: String,
    pub city: String,
    /// Two-letter state code (UF), uppercase
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAddress {
    Matched(StructuredAddress),
    Unmatched,
}

const COUNTRY_SUFFIX: &str = "brasil";

/// Parse a normalized address of the form `<street>, <city> - <UF>, Brasil`.
///
/// Matching is case-insensitive and anchored at the end of the text.
pub fn parse_structured(normalized: &str) -> ParsedAddress {
    match try_parse(normalized) {
        Some(address) => ParsedAddress::Matched(address),
        None => ParsedAddress::Unmatched,
    }
}

fn try_parse(text: &str) -> Option<StructuredAddress> {
    let text = text.trim_end();

    // ", Brasil" at the very end
    let split = text.len().checked_sub(COUNTRY_SUFFIX.len())?;
    let (rest, country) = (text.get(..split)?, text.get(split..)?);
    if !country.eq_ignore_ascii_case(COUNTRY_SUFFIX) {
        return None;
    }
    let rest = rest.trim_end().strip_suffix(',')?;

    // "<street>, <city> - <UF>"
    let (street, city_state) = rest.rsplit_once(',')?;
    let (city, state) = city_state.rsplit_once('-')?;

    let state = state.trim();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let city = city.trim();
    if city.is_empty() {
        return None;
    }

    Some(StructuredAddress {
        street: street.trim().to_string(),
        city: city.to_string(),
        state: state.to_ascii_uppercase(),
    })
}

/// Remove standalone numeric tokens (house numbers) from a street.
///
/// A digit run counts as standalone when it is not glued to a letter, digit
/// or underscore on either side, so `"Rua 7, 120"` → `"Rua ,"` while
/// `"Rua 7A"` is kept as is. Leftover double spaces are collapsed.
pub fn strip_house_numbers(street: &str) -> String {
    let chars: Vec<char> = street.chars().collect();
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let mut out = String::with_capacity(street.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let glued_before = start > 0 && is_word(chars[start - 1]);
            let glued_after = i < chars.len() && is_word(chars[i]);
            if glued_before || glued_after {
                out.extend(&chars[start..i]);
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    let mut prev_space = false;
    for c in out.chars() {
        let is_space = c.is_whitespace();
        if is_space && prev_space {
            continue;
        }
        prev_space = is_space;
        collapsed.push(c);
    }
    collapsed.trim().to_string()
}
