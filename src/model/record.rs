// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::{period::Period, tld_type::TldType};

/// A top-level domain, always in its Unicode form
/// (punycode decoded) and without a leading dot.
pub type TldLabel = String;

/// One row of the IANA root zone database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IanaRecord {
    pub tld: TldLabel,
    pub r#type: TldType,
    pub sponsor: String,
}

/// Presence of the contractual markers in the ICANN registry agreement
/// of a single gTLD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgreementInfo {
    /// Specification 13: .Brand TLD provisions
    pub has_spec13: bool,
    /// Specification 9: Code of Conduct exemption (not withdrawn)
    pub has_spec9_exemption: bool,
    /// Specification 12: community registration policies
    pub has_spec12: bool,
}

impl AgreementInfo {
    #[must_use]
    pub const fn is_brand(&self) -> bool {
        self.has_spec13 || self.has_spec9_exemption
    }

    #[must_use]
    pub const fn has_restrictions(&self) -> bool {
        self.has_spec12
    }
}

impl From<AgreementInfo> for BrandInfo {
    fn from(value: AgreementInfo) -> Self {
        Self {
            is_brand: Some(value.is_brand()),
            has_restrictions: Some(value.has_restrictions()),
        }
    }
}

/// Launch-phase info of one TLD,
/// as found in the ICANN sunrise/claims status export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPeriodsRecord {
    pub tld: TldLabel,
    /// The export flags this TLD as `.BRAND` (Specification 13).
    pub spec13: bool,
    pub periods: Vec<Period>,
    pub is_not_generally_available: bool,
}

/// Registration-eligibility flags of a TLD,
/// either set manually, carried forward from a previous run,
/// or derived from its registry agreement.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BrandInfo {
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_brand: Option<bool>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_restrictions: Option<bool>,
}

impl BrandInfo {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_brand.is_none() && self.has_restrictions.is_none()
    }

    /// Field-wise overlay: each field of `upper` that is set
    /// replaces the corresponding field of `self`.
    #[must_use]
    pub const fn overlaid_with(self, upper: Self) -> Self {
        Self {
            is_brand: match upper.is_brand {
                Some(val) => Some(val),
                None => self.is_brand,
            },
            has_restrictions: match upper.has_restrictions {
                Some(val) => Some(val),
                None => self.has_restrictions,
            },
        }
    }
}

/// The output unit: everything we know about one delegated TLD.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinalTldRecord {
    pub tld: TldLabel,
    #[serde(rename = "type")]
    pub r#type: TldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_brand: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_restrictions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<Vec<Period>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_in_general_availability: Option<bool>,
}

impl FinalTldRecord {
    #[must_use]
    pub const fn new(tld: TldLabel, r#type: TldType) -> Self {
        Self {
            tld,
            r#type,
            is_brand: None,
            has_restrictions: None,
            periods: None,
            is_not_in_general_availability: None,
        }
    }

    #[must_use]
    pub const fn brand_info(&self) -> BrandInfo {
        BrandInfo {
            is_brand: self.is_brand,
            has_restrictions: self.has_restrictions,
        }
    }

    pub fn set_brand_info(&mut self, info: BrandInfo) {
        self.is_brand = info.is_brand;
        self.has_restrictions = info.has_restrictions;
    }

    /// Sets the launch phase info.
    /// A generic TLD without a status entry is in general availability.
    pub fn set_status(&mut self, status: Option<StatusPeriodsRecord>) {
        match status {
            Some(status) => {
                self.periods = (!status.periods.is_empty()).then_some(status.periods);
                self.is_not_in_general_availability = Some(status.is_not_generally_available);
            }
            None => {
                self.periods = None;
                self.is_not_in_general_availability = Some(false);
            }
        }
    }
}
