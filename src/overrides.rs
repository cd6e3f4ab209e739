// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use crate::model::{BrandInfo, FinalTldRecord, TldLabel};

/// The generic TLDs that predate the new-gTLD program.
/// Their agreements follow no scrapable template.
pub const ORIGINAL_GENERICS: &[&str] = &["com", "info", "mobi", "net", "org"];

/// Sponsored TLDs; each is restricted to its sponsoring community.
pub const SPONSORED: &[&str] = &[
    "aero", "asia", "cat", "coop", "edu", "gov", "int", "jobs", "mil", "museum", "post", "tel",
    "travel", "xxx",
];

/// Legacy generic TLDs with eligibility requirements.
pub const RESTRICTED_GENERICS: &[&str] = &["biz", "name", "pro"];

pub const INFRASTRUCTURE: &[&str] = &["arpa"];

/// Brand and restriction info from sources other than scraping:
/// the static table of TLDs we can not scrape,
/// and optionally the results of a previous run.
///
/// Lookup precedence, from lowest to highest:
///
/// 1. static table
/// 2. carry-forward (previous run)
///
/// Both of them take precedence over scraping,
/// which only happens if [`Self::resolve`] yields nothing.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    static_table: HashMap<TldLabel, BrandInfo>,
    carry_forward: HashMap<TldLabel, BrandInfo>,
}

impl Overrides {
    /// Only the static table, without carry-forward data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            static_table: static_table(),
            carry_forward: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_carry_forward(mut self, carry_forward: HashMap<TldLabel, BrandInfo>) -> Self {
        self.carry_forward = carry_forward;
        self
    }

    /// The brand info of `tld`, as far as known without scraping.
    ///
    /// Field-wise: a field set in a higher layer
    /// replaces the same field of a lower one.
    #[must_use]
    pub fn resolve(&self, tld: &str) -> Option<BrandInfo> {
        let layers = [self.static_table.get(tld), self.carry_forward.get(tld)];
        layers
            .into_iter()
            .flatten()
            .copied()
            .reduce(BrandInfo::overlaid_with)
            .filter(|info| !info.is_empty())
    }

    #[must_use]
    pub fn carry_forward_len(&self) -> usize {
        self.carry_forward.len()
    }
}

fn static_table() -> HashMap<TldLabel, BrandInfo> {
    let unrestricted = BrandInfo::builder()
        .is_brand(false)
        .has_restrictions(false)
        .build();
    let restricted = BrandInfo::builder()
        .is_brand(false)
        .has_restrictions(true)
        .build();
    [
        (ORIGINAL_GENERICS, unrestricted),
        (SPONSORED, restricted),
        (RESTRICTED_GENERICS, restricted),
        (INFRASTRUCTURE, restricted),
    ]
    .into_iter()
    .flat_map(|(tlds, info)| tlds.iter().map(move |tld| ((*tld).to_owned(), info)))
    .collect()
}

/// Re-keys the output of a previous run by TLD,
/// keeping only the records that carry brand info.
#[must_use]
pub fn carry_forward_from(records: Vec<FinalTldRecord>) -> HashMap<TldLabel, BrandInfo> {
    records
        .into_iter()
        .filter_map(|record| {
            let info = record.brand_info();
            (!info.is_empty()).then_some((record.tld, info))
        })
        .collect()
}

/// Parses the JSON output of a previous run into carry-forward data.
///
/// # Errors
///
/// - the input is not a JSON array of TLD records
pub fn parse_carry_forward(json: &str) -> Result<HashMap<TldLabel, BrandInfo>, serde_json::Error> {
    let records: Vec<FinalTldRecord> = serde_json::from_str(json)?;
    Ok(carry_forward_from(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_categories() {
        let overrides = Overrides::new();
        assert_eq!(
            overrides.resolve("com"),
            Some(BrandInfo::builder().is_brand(false).has_restrictions(false).build())
        );
        assert_eq!(
            overrides.resolve("museum"),
            Some(BrandInfo::builder().is_brand(false).has_restrictions(true).build())
        );
        assert_eq!(overrides.resolve("pro").and_then(|info| info.has_restrictions), Some(true));
        assert_eq!(overrides.resolve("arpa").and_then(|info| info.has_restrictions), Some(true));
        assert_eq!(overrides.resolve("forum"), None);
    }

    #[test]
    fn test_carry_forward_precedence() {
        let carry_forward = HashMap::from([
            ("forum".to_owned(), BrandInfo::builder().is_brand(true).has_restrictions(false).build()),
            ("org".to_owned(), BrandInfo::builder().has_restrictions(true).build()),
        ]);
        let overrides = Overrides::new().with_carry_forward(carry_forward);
        assert_eq!(
            overrides.resolve("forum"),
            Some(BrandInfo::builder().is_brand(true).has_restrictions(false).build())
        );
        // only the carried field replaces the static one
        assert_eq!(
            overrides.resolve("org"),
            Some(BrandInfo::builder().is_brand(false).has_restrictions(true).build())
        );
        assert_eq!(overrides.carry_forward_len(), 2);
    }

    #[test]
    fn test_parse_carry_forward() {
        let json = r#"[
            {"tld": "forum", "type": "generic", "isBrand": false, "hasRestrictions": true,
             "periods": [{"name": "Sunrise", "close": "2020-12-16"}], "isNotInGeneralAvailability": false},
            {"tld": "de", "type": "country-code"},
            {"tld": "bank", "type": "generic", "isBrand": false}
        ]"#;
        let carry_forward = parse_carry_forward(json).unwrap();
        assert_eq!(carry_forward.len(), 2);
        assert_eq!(
            carry_forward["forum"],
            BrandInfo::builder().is_brand(false).has_restrictions(true).build()
        );
        assert!(!carry_forward.contains_key("de"));
        assert_eq!(carry_forward["bank"].has_restrictions, None);
    }

    #[test]
    fn test_parse_carry_forward_invalid() {
        assert!(parse_carry_forward(r#"{"tld": "forum"}"#).is_err());
    }
}
