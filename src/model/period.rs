// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const NAME_SUNRISE: &str = "Sunrise";
pub const NAME_TRADEMARK_CLAIMS: &str = "Trademark Claims";
pub const NAME_OTHER_FALLBACK: &str = "Other";

/// A named window in the registration life-cycle of a TLD,
/// e.g. its Sunrise or Trademark Claims period.
///
/// Dates serialize as `YYYY-MM-DD`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<NaiveDate>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

impl Period {
    /// Creates a period, unless neither `open` nor `close` is known,
    /// in which case the period carries no information and `None` is returned.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        open: Option<NaiveDate>,
        close: Option<NaiveDate>,
        r#type: Option<String>,
    ) -> Option<Self> {
        if open.is_none() && close.is_none() {
            return None;
        }
        Some(Self {
            name: name.into(),
            open,
            close,
            r#type,
        })
    }

    #[must_use]
    pub fn is_trademark_claims(&self) -> bool {
        self.name == NAME_TRADEMARK_CLAIMS
    }
}

/// Whether a TLD with these periods is *not yet* open to the general public.
///
/// Takes the latest close date of all periods except Trademark Claims,
/// which runs in parallel to general availability.
/// Without any such date, we can not tell, and conservatively assume
/// the TLD is not generally available yet.
#[must_use]
pub fn is_not_generally_available(periods: &[Period], now: DateTime<Utc>) -> bool {
    periods
        .iter()
        .filter(|period| !period.is_trademark_claims())
        .filter_map(|period| period.close)
        .max()
        .is_none_or(|last_close| {
            last_close
                .and_hms_opt(0, 0, 0)
                .is_some_and(|midnight| midnight.and_utc() > now)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_new_drops_dateless() {
        assert!(Period::new(NAME_SUNRISE, None, None, None).is_none());
        let period = Period::new(NAME_SUNRISE, None, Some(date(2020, 12, 16)), None).unwrap();
        assert_eq!(period.close, Some(date(2020, 12, 16)));
    }

    #[test]
    fn test_ga_past_close() {
        let now = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let periods = vec![Period::new(NAME_SUNRISE, None, Some(date(2020, 12, 16)), None).unwrap()];
        assert!(!is_not_generally_available(&periods, now));
    }

    #[test]
    fn test_ga_future_close() {
        let now = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let periods = vec![
            Period::new(NAME_SUNRISE, None, Some(date(2020, 12, 16)), None).unwrap(),
            Period::new("Sunrise 2", None, Some(date(2021, 6, 1)), None).unwrap(),
        ];
        assert!(is_not_generally_available(&periods, now));
    }

    #[test]
    fn test_ga_ignores_claims() {
        let now = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let claims_only = vec![
            Period::new(NAME_TRADEMARK_CLAIMS, None, Some(date(2030, 1, 1)), None).unwrap(),
        ];
        // no usable close date -> conservatively unavailable
        assert!(is_not_generally_available(&claims_only, now));
        assert!(is_not_generally_available(&[], now));

        let mut mixed = claims_only;
        mixed.push(Period::new(NAME_SUNRISE, Some(date(2020, 1, 1)), Some(date(2020, 2, 1)), None).unwrap());
        assert!(!is_not_generally_available(&mixed, now));
    }

    #[test]
    fn test_serialize_dates() {
        let period = Period::new(NAME_SUNRISE, Some(date(2020, 11, 16)), None, Some("End Date Sunrise".to_owned())).unwrap();
        assert_eq!(
            serde_json::to_string(&period).unwrap(),
            r#"{"name":"Sunrise","open":"2020-11-16","type":"End Date Sunrise"}"#
        );
    }
}
