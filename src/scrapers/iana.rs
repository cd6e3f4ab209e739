// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashSet, str::FromStr, sync::LazyLock};

use scraper::{Html, Selector};
use url::Url;

use super::{element_text, selector, Error, Source, TypeInfo};
use crate::{
    model::{IanaRecord, TldType},
    tools,
};

pub static SCRAPER_TYPE: LazyLock<TypeInfo> = LazyLock::new(|| TypeInfo {
    name: "iana",
    description: "IANA root zone database",
});

static SEL_ROWS: LazyLock<Selector> = LazyLock::new(|| selector("#tld-table tbody tr"));
static SEL_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td"));

const NUM_CELLS: usize = 3;

/// Extracts type and sponsor of each TLD
/// from the HTML table of the IANA root zone database.
pub struct Scraper {
    url: Url,
}

impl Scraper {
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self { url }
    }
}

impl Source for Scraper {
    type Output = Vec<IanaRecord>;

    fn info(&self) -> &'static TypeInfo {
        &SCRAPER_TYPE
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn parse(&self, document: &str) -> Result<Self::Output, Error> {
        let records = parse(document)?;
        tracing::info!("Found {} TLDs in the IANA database.", records.len());
        Ok(records)
    }
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::parse(SCRAPER_TYPE.description, message)
}

/// Turns the label as displayed by IANA (e.g. `".com"`,
/// possibly wrapped in bidi marks) into a bare TLD.
fn clean_label(raw: &str) -> String {
    let stripped = tools::strip_bidi_marks(raw);
    let trimmed = stripped.trim();
    trimmed.strip_prefix('.').unwrap_or(trimmed).trim().to_owned()
}

pub fn parse(document: &str) -> Result<Vec<IanaRecord>, Error> {
    let html = Html::parse_document(document);
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (row_idx, row) in html.select(&SEL_ROWS).enumerate() {
        let cells: Vec<String> = row
            .select(&SEL_CELLS)
            .map(|cell| element_text(&cell))
            .collect();
        if cells.len() != NUM_CELLS {
            return Err(parse_error(format!(
                "row {row_idx} has {} cells instead of {NUM_CELLS}: {cells:?}",
                cells.len()
            )));
        }
        let tld = clean_label(&cells[0]);
        if tld.is_empty() {
            return Err(parse_error(format!("row {row_idx} has an empty TLD label")));
        }
        let r#type = TldType::from_str(&cells[1]).map_err(|_| {
            parse_error(format!("unknown TLD type '{}' of TLD '{tld}'", cells[1]))
        })?;
        if !seen.insert(tld.clone()) {
            return Err(Error::Integrity(format!(
                "TLD '{tld}' appears more than once in the {}",
                SCRAPER_TYPE.description
            )));
        }
        records.push(IanaRecord {
            tld,
            r#type,
            sponsor: cells[2].clone(),
        });
    }
    if records.is_empty() {
        return Err(parse_error(
            "no TLD rows found (expected '#tld-table tbody tr')",
        ));
    }
    Ok(records)
}
