// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::{element_text, selector, Error};
use crate::{fetcher::Fetch, model::AgreementInfo, tools};

const DOC_LANDING: &str = "registry agreement landing page";
const DOC_AGREEMENT: &str = "registry agreement";

/// Text of the link to the full agreement in HTML form.
/// Its presence tells us that the landing page follows
/// the new-gTLD template we know how to read.
const MARKER_AGREEMENT_LINK: &str = "agreement html";
const MARKER_SPEC13: &str = "specification 13";
const MARKER_SPEC9: &str = "specification 9";
const MARKER_SPEC12: &str = "SPECIFICATION 12";

static SEL_ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static SEL_BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

/// Matched against lowercased anchor texts.
static RE_WITHDRAWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"withdraw").unwrap_or_else(|err| panic!("Invalid built-in regex: {err}"))
});

/// What we read from the landing page of a gTLD's agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingInfo {
    pub has_spec13: bool,
    pub has_spec9_exemption: bool,
    /// `href` of the full agreement, usually relative.
    pub agreement_href: String,
}

/// Looks up the brand and restriction markers
/// in the ICANN registry agreement of a single gTLD.
///
/// Only works for gTLDs of the new-gTLD program;
/// the landing pages of the original and sponsored TLDs
/// follow a different layout.
pub struct Scraper {
    base_url: Url,
}

impl Scraper {
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// URL of the agreement landing page of a gTLD.
    ///
    /// # Errors
    ///
    /// - the base URL can not be a base
    pub fn landing_url(&self, tld_ascii: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::parse(
                    DOC_LANDING,
                    format!("'{}' can not be used as a base URL", self.base_url),
                )
            })?
            .pop_if_empty()
            .push(tld_ascii);
        Ok(url)
    }

    /// Fetches both the landing page and the full agreement
    /// of the gTLD `tld_ascii` (punycode if internationalized).
    ///
    /// All failures are wrapped into [`Error::Agreement`],
    /// identifying the gTLD.
    pub async fn lookup(&self, fetcher: &dyn Fetch, tld_ascii: &str) -> Result<AgreementInfo, Error> {
        self.lookup_inner(fetcher, tld_ascii)
            .await
            .map_err(|err| Error::Agreement {
                tld: tld_ascii.to_owned(),
                source: Box::new(err),
            })
    }

    async fn lookup_inner(&self, fetcher: &dyn Fetch, tld_ascii: &str) -> Result<AgreementInfo, Error> {
        tracing::debug!("Looking up registry agreement of '{tld_ascii}' ...");
        let landing_url = self.landing_url(tld_ascii)?;
        let landing_doc = fetcher.fetch_text(&landing_url).await?;
        let landing = parse_landing(&landing_doc)?;

        let agreement_url = landing_url.join(&landing.agreement_href).map_err(|err| {
            Error::parse(
                DOC_LANDING,
                format!("invalid agreement link '{}': {err}", landing.agreement_href),
            )
        })?;
        let agreement_doc = fetcher.fetch_text(&agreement_url).await?;
        let has_spec12 = parse_agreement(&agreement_doc);

        let info = AgreementInfo {
            has_spec13: landing.has_spec13,
            has_spec9_exemption: landing.has_spec9_exemption,
            has_spec12,
        };
        tracing::debug!("Registry agreement of '{tld_ascii}': {info:?}");
        Ok(info)
    }
}

/// Reads the markers off an agreement landing page.
///
/// # Errors
///
/// - the link to the HTML version of the agreement is missing
pub fn parse_landing(document: &str) -> Result<LandingInfo, Error> {
    let html = Html::parse_document(document);
    let anchors: Vec<(String, Option<&str>)> = html
        .select(&SEL_ANCHORS)
        .map(|anchor| (element_text(&anchor).to_lowercase(), anchor.value().attr("href")))
        .collect();

    let agreement_href = anchors
        .iter()
        .find(|(text, _)| text.contains(MARKER_AGREEMENT_LINK))
        .ok_or_else(|| {
            Error::parse(
                DOC_LANDING,
                "no 'Agreement HTML' link found; unsupported page layout",
            )
        })?
        .1
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| Error::parse(DOC_LANDING, "the 'Agreement HTML' link has no target"))?
        .to_owned();

    let has_spec13 = anchors
        .iter()
        .any(|(text, _)| text.contains(MARKER_SPEC13));

    // A withdrawal notice about the exemption is linked the same way
    // as the exemption itself.
    let spec9_texts: Vec<&str> = anchors
        .iter()
        .map(|(text, _)| text.as_str())
        .filter(|text| text.contains(MARKER_SPEC9))
        .collect();
    let has_spec9_exemption =
        !spec9_texts.is_empty() && !spec9_texts.iter().any(|text| RE_WITHDRAWN.is_match(text));

    Ok(LandingInfo {
        has_spec13,
        has_spec9_exemption,
        agreement_href,
    })
}

/// Whether the full agreement includes Specification 12
/// (community registration policies).
#[must_use]
pub fn parse_agreement(document: &str) -> bool {
    let html = Html::parse_document(document);
    let text = html.select(&SEL_BODY).next().map_or_else(
        || tools::normalize_whitespace(&html.root_element().text().collect::<String>()),
        |body| element_text(&body),
    );
    text.contains(MARKER_SPEC12)
}
