// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::LazyLock;

use url::Url;

use super::{Error, Source, TypeInfo};
use crate::{model::TldLabel, tools};

pub static SCRAPER_TYPE: LazyLock<TypeInfo> = LazyLock::new(|| TypeInfo {
    name: "root-zone",
    description: "DNS root zone transfer",
});

/// Extracts the list of delegated TLDs from the DNS root zone,
/// in master-file format (one resource record per line).
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
    type Output = Vec<TldLabel>;

    fn info(&self) -> &'static TypeInfo {
        &SCRAPER_TYPE
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn parse(&self, document: &str) -> Result<Self::Output, Error> {
        let tlds = parse(document)?;
        tracing::info!("Found {} TLDs in the root zone.", tlds.len());
        Ok(tlds)
    }
}

/// The owner name of a resource record, if it is a TLD,
/// e.g. `"com"` for `"com.   172800  IN  NS  a.gtld-servers.net."`.
///
/// A TLD owner name consists of a single label,
/// followed by the (otherwise empty) root label,
/// and thus contains exactly one dot, at its very end.
fn tld_owner_name(line: &str) -> Option<&str> {
    let owner = line.split_whitespace().next()?;
    let label = owner.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') || label.starts_with(';') {
        return None;
    }
    Some(label)
}

/// Extracts the unique TLDs from a root zone document,
/// in order of first appearance, punycode decoded.
pub fn parse(document: &str) -> Result<Vec<TldLabel>, Error> {
    let labels = document
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(tld_owner_name)
        .map(|label| {
            tools::label_to_unicode(label)
                .map_err(|err| Error::parse(SCRAPER_TYPE.description, err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tools::unique_in_order(labels))
}
