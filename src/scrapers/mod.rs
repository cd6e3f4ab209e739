// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use thiserror::Error;
use url::Url;

use crate::{
    fetcher::{Fetch, FetchError},
    model::TldLabel,
    tools::normalize_whitespace,
};

pub mod iana;
pub mod registry_agreement;
pub mod root_zone;
pub mod status_periods;

/// Thrown when a source failed to be fetched or scraped.
///
/// Only [`Self::Fetch`] stems from the transport layer
/// (and was already retried);
/// all the others mean the data itself is not as expected.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to parse the {document}: {message}")]
    Parse {
        document: &'static str,
        message: String,
    },
    #[error("Data integrity violation: {0}")]
    Integrity(String),
    #[error("Registry agreement lookup for gTLD '{tld}' failed: {source}")]
    Agreement {
        tld: TldLabel,
        #[source]
        source: Box<Error>,
    },
    #[error("{} registry agreement lookup(s) failed, first: {}", .0.len(), first_failure(.0))]
    AgreementLookups(Vec<(TldLabel, Error)>),
}

impl Error {
    pub fn parse(document: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            document,
            message: message.into(),
        }
    }

    /// Whether this is (or wraps only) a cross-source or uniqueness violation.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        match self {
            Self::Integrity(_) => true,
            Self::Agreement { source, .. } => source.is_integrity(),
            Self::AgreementLookups(errors) => {
                !errors.is_empty() && errors.iter().all(|(_, err)| err.is_integrity())
            }
            Self::Fetch(_) | Self::Parse { .. } => false,
        }
    }

    /// Whether this is (or wraps only) a download failure.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::Agreement { source, .. } => source.is_fetch(),
            Self::AgreementLookups(errors) => {
                !errors.is_empty() && errors.iter().all(|(_, err)| err.is_fetch())
            }
            Self::Parse { .. } | Self::Integrity(_) => false,
        }
    }
}

fn first_failure(errors: &[(TldLabel, Error)]) -> String {
    errors
        .first()
        .map_or_else(String::new, |(tld, err)| format!("'{tld}': {err}"))
}

/// Contains descriptive data about a type of scraper.
pub struct TypeInfo {
    /// Machine-readable name/id of this type of scraper.
    /// It should be in "kebab-case".
    pub name: &'static str,

    /// Human-readable description of the scraped document.
    pub description: &'static str,
}

/// A scraper of one upstream document,
/// turning it into typed records.
#[async_trait(?Send)]
pub trait Source {
    type Output;

    /// Info about this type of scraper.
    fn info(&self) -> &'static TypeInfo;

    /// Where the document is fetched from.
    fn url(&self) -> &Url;

    /// Extracts the records from the raw document.
    fn parse(&self, document: &str) -> Result<Self::Output, Error>;

    /// Fetches and parses the document.
    async fn scrape(&self, fetcher: &dyn Fetch) -> Result<Self::Output, Error> {
        let name = self.info().name;
        tracing::info!("Fetching {name} from '{}' ...", self.url());
        let document = fetcher.fetch_text(self.url()).await?;
        tracing::info!("Parsing {name} ...");
        self.parse(&document)
    }
}

/// Parses a CSS selector that is known to be valid.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("Invalid built-in CSS selector '{css}': {err}"))
}

/// The text content of an HTML element,
/// with whitespace collapsed and trimmed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}
