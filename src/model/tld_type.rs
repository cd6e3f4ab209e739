// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Category of a top-level domain,
/// as assigned by IANA in the root zone database.
///
/// NOTE: The string forms have to stay exactly as IANA spells them,
/// because they are parsed from its HTML table.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TldType {
    Generic,
    CountryCode,
    Sponsored,
    Infrastructure,
    GenericRestricted,
    Test,
}

impl TldType {
    /// Whether TLDs of this type are subject to
    /// a (scrapable) ICANN registry agreement.
    #[must_use]
    pub const fn has_registry_agreement(self) -> bool {
        matches!(self, Self::Generic)
    }
}
