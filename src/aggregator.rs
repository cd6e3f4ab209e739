// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::instrument;
use typed_builder::TypedBuilder;

use crate::{
    fetcher::Fetch,
    model::{
        AgreementInfo, BrandInfo, FinalTldRecord, IanaRecord, StatusPeriodsRecord, TldLabel,
        TldType,
    },
    overrides::Overrides,
    scrapers::{iana, registry_agreement, root_zone, status_periods, Error, Source},
    settings::{Settings, Sources},
    tools,
};

/// Generic TLDs that predate the sunrise/claims mechanism,
/// and thus never show up in the status export.
pub const LEGACY_GENERICS: &[&str] = &["com", "info", "net", "org", "mobi"];

const DEFAULT_CONCURRENCY: usize = 5;

/// Runs all the scrapers and merges their output
/// into one record per delegated TLD.
#[derive(TypedBuilder)]
pub struct Aggregator {
    #[builder(default)]
    sources: Sources,
    /// Maximum number of registry agreement lookups in flight.
    #[builder(default = DEFAULT_CONCURRENCY)]
    concurrency: usize,
    #[builder(default = Overrides::new())]
    overrides: Overrides,
}

impl Aggregator {
    #[must_use]
    pub fn from_settings(settings: &Settings, overrides: Overrides) -> Self {
        Self {
            sources: settings.sources.clone(),
            concurrency: settings.agreement_concurrency,
            overrides,
        }
    }

    /// Fetches all sources and merges them.
    ///
    /// `now` is the point in time general availability is evaluated against.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any single source or agreement lookup fails,
    /// so that no partial data is ever returned.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        fetcher: &dyn Fetch,
        now: DateTime<Utc>,
    ) -> Result<Vec<FinalTldRecord>, Error> {
        let root_zone = root_zone::Scraper::new(self.sources.root_zone_url.clone())
            .scrape(fetcher)
            .await?;

        let iana_records = iana::Scraper::new(self.sources.iana_url.clone())
            .scrape(fetcher)
            .await?;
        let mut records = join_iana(root_zone, iana_records)?;

        let status_records =
            status_periods::Scraper::new(self.sources.status_periods_url.clone(), now)
                .scrape(fetcher)
                .await?;
        let spec13_tlds = merge_status(&mut records, status_records);

        self.resolve_brand_info(fetcher, &mut records, &spec13_tlds)
            .await?;

        tracing::info!("Aggregated {} TLD records.", records.len());
        Ok(records)
    }

    /// Sets brand and restriction info on all records we know it for,
    /// scraping the registry agreements of the generic TLDs
    /// not covered by the overrides.
    async fn resolve_brand_info(
        &self,
        fetcher: &dyn Fetch,
        records: &mut [FinalTldRecord],
        spec13_tlds: &HashSet<TldLabel>,
    ) -> Result<(), Error> {
        let mut to_scrape = Vec::new();
        for (idx, record) in records.iter_mut().enumerate() {
            if let Some(info) = self.overrides.resolve(&record.tld) {
                record.set_brand_info(info);
            } else if record.r#type.has_registry_agreement() {
                let tld_ascii = tools::label_to_ascii(&record.tld)
                    .map_err(|err| Error::parse("root zone", err.to_string()))?;
                to_scrape.push((idx, tld_ascii));
            }
        }

        tracing::info!(
            "Looking up {} registry agreements, {} at a time ...",
            to_scrape.len(),
            self.concurrency
        );
        let scraper = registry_agreement::Scraper::new(self.sources.agreement_base_url.clone());
        let scraper = &scraper;
        let results: Vec<(usize, Result<AgreementInfo, Error>)> = stream::iter(to_scrape)
            .map(|(idx, tld_ascii)| async move {
                (idx, scraper.lookup(fetcher, &tld_ascii).await)
            })
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;

        let mut failures = Vec::new();
        for (idx, result) in results {
            let record = &mut records[idx];
            match result {
                Ok(info) => {
                    check_spec13(&record.tld, spec13_tlds.contains(&record.tld), &info);
                    record.set_brand_info(BrandInfo::from(info));
                }
                Err(err) => {
                    tracing::error!("{err}");
                    failures.push((record.tld.clone(), err));
                }
            }
        }
        if !failures.is_empty() {
            return Err(Error::AgreementLookups(failures));
        }
        Ok(())
    }
}

/// Warns if the status export and the registry agreement
/// disagree about Specification 13; the agreement wins.
///
/// Returns whether they agree.
fn check_spec13(tld: &str, in_status: bool, agreement: &AgreementInfo) -> bool {
    let agree = in_status == agreement.has_spec13;
    if !agree {
        tracing::warn!(
            "TLD '{tld}': the status export (spec13: {in_status}) and the registry agreement \
(spec13: {}) disagree about Specification 13",
            agreement.has_spec13
        );
    }
    agree
}

/// Seeds one record per root zone TLD, typed by IANA.
///
/// # Errors
///
/// - a delegated TLD is missing from the IANA database
fn join_iana(
    root_zone: Vec<TldLabel>,
    iana_records: Vec<IanaRecord>,
) -> Result<Vec<FinalTldRecord>, Error> {
    let mut types: HashMap<TldLabel, TldType> = iana_records
        .into_iter()
        .map(|record| (record.tld, record.r#type))
        .collect();

    let mut missing = Vec::new();
    let mut records = Vec::with_capacity(root_zone.len());
    for tld in root_zone {
        match types.remove(&tld) {
            Some(r#type) => records.push(FinalTldRecord::new(tld, r#type)),
            None => missing.push(tld),
        }
    }
    if !missing.is_empty() {
        return Err(Error::Integrity(format!(
            "TLDs delegated in the root zone but missing from the IANA database: {}",
            missing.join(", ")
        )));
    }
    if !types.is_empty() {
        tracing::debug!(
            "{} TLDs in the IANA database are not delegated in the root zone",
            types.len()
        );
    }
    Ok(records)
}

/// Whether launch periods are expected for this record.
fn takes_status(record: &FinalTldRecord) -> bool {
    record.r#type == TldType::Generic && !LEGACY_GENERICS.contains(&record.tld.as_str())
}

/// Left-joins the launch periods onto the (non-legacy) generic TLDs.
///
/// Returns the TLDs the export marks as `.BRAND`.
fn merge_status(
    records: &mut [FinalTldRecord],
    status_records: Vec<StatusPeriodsRecord>,
) -> HashSet<TldLabel> {
    let spec13_tlds = status_records
        .iter()
        .filter(|status| status.spec13)
        .map(|status| status.tld.clone())
        .collect();
    let mut by_tld: HashMap<TldLabel, StatusPeriodsRecord> = status_records
        .into_iter()
        .map(|status| (status.tld.clone(), status))
        .collect();
    for record in records.iter_mut().filter(|record| takes_status(record)) {
        record.set_status(by_tld.remove(&record.tld));
    }
    if !by_tld.is_empty() {
        tracing::debug!(
            "{} TLDs in the status export are not delegated generic TLDs",
            by_tld.len()
        );
    }
    spec13_tlds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fetcher::testing::StaticFetcher,
        model::Period,
        overrides::carry_forward_from,
    };
    use chrono::{NaiveDate, TimeZone};
    use url::Url;

    const URL_ROOT_ZONE: &str = "https://fixtures.test/domain/root.zone";
    const URL_IANA: &str = "https://fixtures.test/domains/root/db";
    const URL_STATUS: &str = "https://fixtures.test/sunrise-claims-periods.xlsx";
    const URL_AGREEMENTS: &str = "https://fixtures.test/registry-agreements/details";

    const ROOT_ZONE: &str = ".	86400	IN	SOA	a.root-servers.net. nstld.verisign-grs.com. 2021060100 1800 900 604800 86400
aaa.	172800	IN	NS	ns1.dns.nic.aaa.
arpa.	172800	IN	NS	a.root-servers.net.
com.	172800	IN	NS	a.gtld-servers.net.
de.	172800	IN	NS	a.nic.de.
forum.	172800	IN	NS	ns1.forum.
museum.	172800	IN	NS	ns1.museum.
shop.	172800	IN	NS	ns1.shop.
xn--p1acf.	172800	IN	NS	ns1.xn--p1acf.
forum.	86400	IN	DS	1234 8 2 ABCDEF
";

    const IANA_DB: &str = r#"<html><body><table id="tld-table"><tbody>
<tr><td><a>.aaa</a></td><td>generic</td><td>American Automobile Association, Inc.</td></tr>
<tr><td><a>.arpa</a></td><td>infrastructure</td><td>Internet Architecture Board (IAB)</td></tr>
<tr><td><a>.com</a></td><td>generic</td><td>VeriSign Global Registry Services</td></tr>
<tr><td><a>.de</a></td><td>country-code</td><td>DENIC eG</td></tr>
<tr><td><a>.forum</a></td><td>generic</td><td>Waterford Limited</td></tr>
<tr><td><a>.museum</a></td><td>sponsored</td><td>Museum Domain Management Association</td></tr>
<tr><td><a>.shop</a></td><td>generic</td><td>GMO Registry, Inc.</td></tr>
<tr><td><a>.рус</a></td><td>generic</td><td>Rusnames Limited</td></tr>
<tr><td><a>.test-not-delegated</a></td><td>test</td><td>IANA</td></tr>
</tbody></table></body></html>"#;

    const STATUS_EXPORT: &str = r"<table>
<tr><th>TLD</th><th>Sunrise Type</th><th>Sunrise Start</th><th>Sunrise End</th><th>Claims Start</th><th>Claims End</th><th>Other Start</th><th>Other Name</th><th>Other End</th><th>Other Type</th></tr>
<tr><td>aaa</td><td>Spec 13 - .BRAND TLD</td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td></tr>
<tr><td>forum</td><td>End Date Sunrise</td><td>16 Nov 2020</td><td>16 Dec 2020</td><td>16 Nov 2020</td><td>16 Feb 2021</td><td>01 Jan 2021</td><td>Sunrise 2</td><td>01 Feb 2021</td><td></td></tr>
<tr><td>xn--p1acf</td><td></td><td></td><td></td><td>01 Jan 2015</td><td>01 Apr 2015</td><td></td><td></td><td></td><td></td></tr>
</table>";

    const LANDING_AAA: &str = r#"<html><body>
<a href="/registry-agreements/aaa/aaa-agmt-html-en.htm">Agreement HTML</a>
<a href="/files/aaa-spec13-en.pdf">Specification 13</a>
</body></html>"#;
    const LANDING_AAA_NO_SPEC13: &str =
        r#"<html><body><a href="../aaa/aaa-agmt-html-en.htm">Agreement HTML</a></body></html>"#;
    const LANDING_FORUM: &str =
        r#"<html><body><a href="../forum/forum-agmt-html-en.htm">Agreement HTML</a></body></html>"#;
    const LANDING_SHOP: &str = r#"<html><body>
<a href="/registry-agreements/shop/shop-agmt-html-en.htm">Agreement HTML</a>
<a href="/files/shop-spec9-en.pdf">Specification 9 Exemption Withdrawn</a>
</body></html>"#;
    const LANDING_RUS: &str = r#"<html><body><a href="/registry-agreements/xn--p1acf/agmt-html-en.htm">Agreement HTML</a></body></html>"#;

    const AGREEMENT_PLAIN: &str = "<html><body><h2>SPECIFICATION 11</h2></body></html>";
    const AGREEMENT_COMMUNITY: &str =
        "<html><body><h2>SPECIFICATION 11</h2><h2>SPECIFICATION 12</h2></body></html>";

    fn fixtures() -> StaticFetcher {
        StaticFetcher::new()
            .with(URL_ROOT_ZONE, ROOT_ZONE)
            .with(URL_IANA, IANA_DB)
            .with(URL_STATUS, STATUS_EXPORT)
            .with(&format!("{URL_AGREEMENTS}/aaa"), LANDING_AAA)
            .with(
                "https://fixtures.test/registry-agreements/aaa/aaa-agmt-html-en.htm",
                AGREEMENT_PLAIN,
            )
            .with(&format!("{URL_AGREEMENTS}/forum"), LANDING_FORUM)
            .with(
                "https://fixtures.test/registry-agreements/forum/forum-agmt-html-en.htm",
                AGREEMENT_PLAIN,
            )
            .with(&format!("{URL_AGREEMENTS}/shop"), LANDING_SHOP)
            .with(
                "https://fixtures.test/registry-agreements/shop/shop-agmt-html-en.htm",
                AGREEMENT_PLAIN,
            )
            .with(&format!("{URL_AGREEMENTS}/xn--p1acf"), LANDING_RUS)
            .with(
                "https://fixtures.test/registry-agreements/xn--p1acf/agmt-html-en.htm",
                AGREEMENT_COMMUNITY,
            )
    }

    fn sources() -> Sources {
        Sources::builder()
            .root_zone_url(Url::parse(URL_ROOT_ZONE).unwrap())
            .iana_url(Url::parse(URL_IANA).unwrap())
            .status_periods_url(Url::parse(URL_STATUS).unwrap())
            .agreement_base_url(Url::parse(URL_AGREEMENTS).unwrap())
            .build()
    }

    fn aggregator(overrides: Overrides) -> Aggregator {
        Aggregator::builder()
            .sources(sources())
            .concurrency(2)
            .overrides(overrides)
            .build()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn find<'a>(records: &'a [FinalTldRecord], tld: &str) -> &'a FinalTldRecord {
        records
            .iter()
            .find(|record| record.tld == tld)
            .unwrap_or_else(|| panic!("No record for TLD '{tld}'"))
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let fetcher = fixtures();
        let records = aggregator(Overrides::new()).run(&fetcher, now()).await.unwrap();

        let tlds: Vec<&str> = records.iter().map(|record| record.tld.as_str()).collect();
        assert_eq!(
            tlds,
            vec!["aaa", "arpa", "com", "de", "forum", "museum", "shop", "рус"]
        );

        let forum = find(&records, "forum");
        assert_eq!(forum.r#type, TldType::Generic);
        let periods = forum.periods.as_ref().unwrap();
        let names: Vec<&str> = periods.iter().map(|period| period.name.as_str()).collect();
        assert_eq!(names, vec!["Sunrise", "Trademark Claims", "Sunrise 2"]);
        assert_eq!(periods[2].close, Some(date(2021, 2, 1)));
        // Sunrise 2 closed before `now`
        assert_eq!(forum.is_not_in_general_availability, Some(false));
        assert_eq!(forum.is_brand, Some(false));
        assert_eq!(forum.has_restrictions, Some(false));

        let aaa = find(&records, "aaa");
        assert_eq!(aaa.is_brand, Some(true));
        assert_eq!(aaa.has_restrictions, Some(false));
        assert_eq!(aaa.periods, None);
        assert_eq!(aaa.is_not_in_general_availability, Some(true));

        let shop = find(&records, "shop");
        assert_eq!(shop.is_brand, Some(false));
        assert_eq!(shop.periods, None);
        assert_eq!(shop.is_not_in_general_availability, Some(false));

        let rus = find(&records, "рус");
        assert_eq!(rus.has_restrictions, Some(true));
        assert_eq!(
            rus.periods,
            Some(vec![Period {
                name: "Trademark Claims".to_owned(),
                open: Some(date(2015, 1, 1)),
                close: Some(date(2015, 4, 1)),
                r#type: None,
            }])
        );
        assert_eq!(rus.is_not_in_general_availability, Some(true));

        let com = find(&records, "com");
        assert_eq!(com.brand_info(), BrandInfo::builder().is_brand(false).has_restrictions(false).build());
        assert_eq!(com.periods, None);
        assert_eq!(com.is_not_in_general_availability, None);

        assert_eq!(find(&records, "museum").has_restrictions, Some(true));
        assert_eq!(find(&records, "arpa").has_restrictions, Some(true));

        let de = find(&records, "de");
        assert_eq!(de, &FinalTldRecord::new("de".to_owned(), TldType::CountryCode));

        // overridden TLDs are never looked up
        assert!(!fetcher
            .requested()
            .iter()
            .any(|url| url.starts_with(&format!("{URL_AGREEMENTS}/com"))));
    }

    #[tokio::test]
    async fn test_run_future_sunrise() {
        let fetcher = fixtures();
        let early = Utc.with_ymd_and_hms(2021, 1, 15, 0, 0, 0).unwrap();
        let records = aggregator(Overrides::new()).run(&fetcher, early).await.unwrap();
        assert_eq!(
            find(&records, "forum").is_not_in_general_availability,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_run_carry_forward_skips_lookup() {
        let fetcher = fixtures();
        let mut previous = FinalTldRecord::new("forum".to_owned(), TldType::Generic);
        previous.set_brand_info(BrandInfo::builder().is_brand(true).has_restrictions(true).build());
        let overrides = Overrides::new().with_carry_forward(carry_forward_from(vec![previous]));

        let records = aggregator(overrides).run(&fetcher, now()).await.unwrap();

        let forum = find(&records, "forum");
        assert_eq!(forum.is_brand, Some(true));
        assert_eq!(forum.has_restrictions, Some(true));
        let requested = fetcher.requested();
        assert!(!requested.contains(&format!("{URL_AGREEMENTS}/forum")));
        assert!(requested.contains(&format!("{URL_AGREEMENTS}/shop")));
    }

    #[tokio::test]
    async fn test_run_missing_iana_record() {
        let fetcher = fixtures().with(
            URL_ROOT_ZONE,
            "forum.	172800	IN	NS	ns1.forum.\nunknown.	172800	IN	NS	ns1.unknown.\n",
        );
        let err = aggregator(Overrides::new())
            .run(&fetcher, now())
            .await
            .unwrap_err();
        assert!(err.is_integrity());
        assert!(err.to_string().contains("unknown"));
    }

    #[tokio::test]
    async fn test_run_failed_lookup_is_isolated_but_fatal() {
        // no landing page for shop
        let fetcher = fixtures().with(&format!("{URL_AGREEMENTS}/shop"), "<html><body></body></html>");
        let err = aggregator(Overrides::new())
            .run(&fetcher, now())
            .await
            .unwrap_err();
        match &err {
            Error::AgreementLookups(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, "shop");
            }
            other => panic!("Unexpected error: {other}"),
        }
        // the other lookups still ran to completion
        assert!(fetcher.requested().contains(
            &"https://fixtures.test/registry-agreements/xn--p1acf/agmt-html-en.htm".to_owned()
        ));
    }

    #[test]
    fn test_check_spec13() {
        let brand = AgreementInfo {
            has_spec13: true,
            ..AgreementInfo::default()
        };
        assert!(check_spec13("aaa", true, &brand));
        assert!(check_spec13("forum", false, &AgreementInfo::default()));
        assert!(!check_spec13("aaa", false, &brand));
        assert!(!check_spec13("aaa", true, &AgreementInfo::default()));
    }

    #[tokio::test]
    async fn test_run_spec13_disagreement_keeps_agreement() {
        // the export still flags aaa as .BRAND, the agreement no longer does
        let fetcher = fixtures().with(&format!("{URL_AGREEMENTS}/aaa"), LANDING_AAA_NO_SPEC13);
        let records = aggregator(Overrides::new()).run(&fetcher, now()).await.unwrap();
        let aaa = find(&records, "aaa");
        assert_eq!(aaa.is_brand, Some(false));
        assert_eq!(aaa.has_restrictions, Some(false));
    }

    #[test]
    fn test_merge_status_skips_legacy_and_non_generic() {
        let mut records = vec![
            FinalTldRecord::new("com".to_owned(), TldType::Generic),
            FinalTldRecord::new("de".to_owned(), TldType::CountryCode),
            FinalTldRecord::new("forum".to_owned(), TldType::Generic),
        ];
        let status = vec![StatusPeriodsRecord {
            tld: "com".to_owned(),
            spec13: true,
            periods: Vec::new(),
            is_not_generally_available: true,
        }];
        let spec13_tlds = merge_status(&mut records, status);
        assert!(spec13_tlds.contains("com"));
        assert_eq!(records[0].is_not_in_general_availability, None);
        assert_eq!(records[1].is_not_in_general_availability, None);
        assert_eq!(records[2].is_not_in_general_availability, Some(false));
    }
}
