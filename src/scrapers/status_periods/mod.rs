// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashSet, str::FromStr, sync::LazyLock};

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::{element_text, selector, Error, Source, TypeInfo};
use crate::{
    model::{
        period::{self, NAME_OTHER_FALLBACK, NAME_SUNRISE, NAME_TRADEMARK_CLAIMS},
        Period, StatusPeriodsRecord,
    },
    tools,
};
use model::{split_list, Row, SunriseType, NUM_CELLS};

mod model;

pub static SCRAPER_TYPE: LazyLock<TypeInfo> = LazyLock::new(|| TypeInfo {
    name: "status-periods",
    description: "ICANN sunrise/claims periods export",
});

/// Format of all dates in the export, e.g. "16 Dec 2020".
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Exact shape of [`DATE_FORMAT`] dates.
/// chrono alone would also accept e.g. "1 dec 20" (as year 20).
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2} [A-Z][a-z]{2} [0-9]{4}$")
        .unwrap_or_else(|err| panic!("Invalid built-in regex: {err}"))
});

static SEL_ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static SEL_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td"));

/// Extracts the launch periods of the new gTLDs
/// from ICANN's sunrise/claims export.
///
/// The export is served with a spreadsheet file extension,
/// but really is a plain HTML table.
pub struct Scraper {
    url: Url,
    now: DateTime<Utc>,
}

impl Scraper {
    /// `now` is the point in time to evaluate general availability against.
    #[must_use]
    pub const fn new(url: Url, now: DateTime<Utc>) -> Self {
        Self { url, now }
    }
}

impl Source for Scraper {
    type Output = Vec<StatusPeriodsRecord>;

    fn info(&self) -> &'static TypeInfo {
        &SCRAPER_TYPE
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn parse(&self, document: &str) -> Result<Self::Output, Error> {
        let records = parse(document, self.now)?;
        tracing::info!("Found launch periods for {} TLDs.", records.len());
        Ok(records)
    }
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::parse(SCRAPER_TYPE.description, message)
}

/// Parses an optional date; blank means unknown.
fn parse_date(tld: &str, raw: &str) -> Result<Option<NaiveDate>, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if !RE_DATE.is_match(raw) {
        return Err(parse_error(format!(
            "invalid date '{raw}' for TLD '{tld}': expected e.g. '16 Dec 2020'"
        )));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|err| parse_error(format!("invalid date '{raw}' for TLD '{tld}': {err}")))
}

/// The entry at `idx`, or blank if the list is too short.
fn entry<'a>(list: &[&'a str], idx: usize) -> &'a str {
    list.get(idx).copied().unwrap_or("")
}

fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Builds the registry-defined periods,
/// aligning the entries of the four list cells by index.
///
/// Lists of differing lengths can not be aligned reliably;
/// the shorter ones are padded with blanks.
fn other_periods(tld: &str, row: &Row<'_>) -> Result<Vec<Period>, Error> {
    let opens = split_list(row.others_open);
    let names = split_list(row.others_name);
    let closes = split_list(row.others_close);
    let types = split_list(row.others_type);

    let lens = [opens.len(), names.len(), closes.len(), types.len()];
    let num = lens.into_iter().max().unwrap_or(0);
    if lens.iter().any(|len| *len != 0 && *len != num) {
        tracing::warn!(
            "TLD '{tld}' has misaligned other-period entries \
(open/name/close/type counts: {lens:?}); padding with blanks"
        );
    }

    let mut periods = Vec::new();
    for idx in 0..num {
        let name = non_blank(entry(&names, idx)).unwrap_or(NAME_OTHER_FALLBACK);
        if let Some(period) = Period::new(
            name,
            parse_date(tld, entry(&opens, idx))?,
            parse_date(tld, entry(&closes, idx))?,
            non_blank(entry(&types, idx)).map(ToOwned::to_owned),
        ) {
            periods.push(period);
        }
    }
    Ok(periods)
}

fn parse_row(row: &Row<'_>, now: DateTime<Utc>) -> Result<StatusPeriodsRecord, Error> {
    let raw_tld = row.tld.trim();
    let raw_tld = raw_tld.strip_prefix('.').unwrap_or(raw_tld);
    if raw_tld.is_empty() {
        return Err(parse_error("row with an empty TLD"));
    }
    let tld = tools::label_to_unicode(raw_tld).map_err(|err| parse_error(err.to_string()))?;

    let sunrise_type = match non_blank(row.sunrise_type) {
        None => None,
        Some(raw) => Some(SunriseType::from_str(raw).map_err(|_| {
            parse_error(format!("unknown sunrise type '{raw}' for TLD '{tld}'"))
        })?),
    };
    let spec13 = sunrise_type.is_some_and(SunriseType::is_spec13);

    let sunrise = Period::new(
        NAME_SUNRISE,
        parse_date(&tld, row.sunrise_open)?,
        parse_date(&tld, row.sunrise_close)?,
        sunrise_type.and_then(SunriseType::period_type),
    );
    let claims = Period::new(
        NAME_TRADEMARK_CLAIMS,
        parse_date(&tld, row.claims_open)?,
        parse_date(&tld, row.claims_close)?,
        None,
    );
    let periods: Vec<Period> = sunrise
        .into_iter()
        .chain(claims)
        .chain(other_periods(&tld, row)?)
        .collect();

    let is_not_generally_available = period::is_not_generally_available(&periods, now);
    Ok(StatusPeriodsRecord {
        tld,
        spec13,
        periods,
        is_not_generally_available,
    })
}

/// Parses the whole export.
/// Rows without `td` cells (headers) are skipped.
///
/// # Errors
///
/// - a data row does not have exactly [`NUM_CELLS`] cells
/// - unknown sunrise type
/// - a date not in [`DATE_FORMAT`]
/// - a TLD appears more than once
pub fn parse(document: &str, now: DateTime<Utc>) -> Result<Vec<StatusPeriodsRecord>, Error> {
    let html = Html::parse_document(document);
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (row_idx, row_elem) in html.select(&SEL_ROWS).enumerate() {
        let cells: Vec<String> = row_elem
            .select(&SEL_CELLS)
            .map(|cell| element_text(&cell))
            .collect();
        if cells.is_empty() {
            continue;
        }
        let row = Row::from_cells(&cells).ok_or_else(|| {
            parse_error(format!(
                "row {row_idx} has {} cells instead of {NUM_CELLS}: {cells:?}",
                cells.len()
            ))
        })?;
        let record = parse_row(&row, now)?;
        if !seen.insert(record.tld.clone()) {
            return Err(Error::Integrity(format!(
                "TLD '{}' appears more than once in the {}",
                record.tld, SCRAPER_TYPE.description
            )));
        }
        records.push(record);
    }
    Ok(records)
}
