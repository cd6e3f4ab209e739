// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;
use std::hash::Hash;

use reqwest::header::HeaderValue;
use std::sync::LazyLock;
use thiserror::Error;

pub static USER_AGENT_VALUE: LazyLock<HeaderValue> =
    LazyLock::new(|| HeaderValue::from_static("tld-scraper github.com/iop-alliance/tld-scraper"));

/// Prefix of an A-label, see RFC 5890, section 2.3.2.1.
pub const ACE_PREFIX: &str = "xn--";

/// Unicode bidirectional-text control characters,
/// which IANA sprinkles around right-to-left labels.
const BIDI_MARKS: &[char] = &[
    '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}',
];

#[derive(Error, Debug)]
pub enum IdnaError {
    #[error("Failed to decode punycode label '{0}'")]
    Decode(String),
    #[error("Failed to encode label '{0}' as punycode")]
    Encode(String),
}

/// Returns the elements of `items` with all later duplicates removed,
/// keeping the order of first appearance.
///
/// ```
/// # use tld_scraper::tools::unique_in_order;
/// assert_eq!(unique_in_order(vec!["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
/// ```
#[must_use]
pub fn unique_in_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Whether this label starts with the ACE prefix `xn--` (case-insensitive).
#[must_use]
pub fn has_ace_prefix(label: &str) -> bool {
    label
        .get(..ACE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ACE_PREFIX))
}

/// Decodes a single DNS label into its Unicode form.
/// Labels without the ACE prefix are returned lower-cased,
/// but otherwise unchanged.
///
/// ```
/// # use tld_scraper::tools::label_to_unicode;
/// assert_eq!(label_to_unicode("xn--p1ai").unwrap(), "рф");
/// assert_eq!(label_to_unicode("COM").unwrap(), "com");
/// ```
pub fn label_to_unicode(label: &str) -> Result<String, IdnaError> {
    if !has_ace_prefix(label) {
        return Ok(label.to_lowercase());
    }
    let (decoded, res) = idna::domain_to_unicode(label);
    res.map_err(|_| IdnaError::Decode(label.to_owned()))?;
    if has_ace_prefix(&decoded) {
        // `idna` leaves undecodable labels as they are
        return Err(IdnaError::Decode(label.to_owned()));
    }
    Ok(decoded)
}

/// Encodes a single DNS label into its ASCII (punycode) form,
/// as needed for URLs on sites that do not speak IDNA.
///
/// ```
/// # use tld_scraper::tools::label_to_ascii;
/// assert_eq!(label_to_ascii("рф").unwrap(), "xn--p1ai");
/// assert_eq!(label_to_ascii("forum").unwrap(), "forum");
/// ```
pub fn label_to_ascii(label: &str) -> Result<String, IdnaError> {
    if label.is_ascii() {
        return Ok(label.to_lowercase());
    }
    idna::domain_to_ascii(label).map_err(|_| IdnaError::Encode(label.to_owned()))
}

/// Removes all Unicode bidirectional-text control marks.
#[must_use]
pub fn strip_bidi_marks(text: &str) -> String {
    text.chars().filter(|chr| !BIDI_MARKS.contains(chr)).collect()
}

/// Collapses all runs of whitespace into single spaces,
/// and trims both ends.
/// HTML cell texts often contain line-breaks and indentation.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
