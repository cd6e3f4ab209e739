// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use strum::{Display, EnumString, IntoStaticStr};

/// Number of cells in a data row of the export.
pub(super) const NUM_CELLS: usize = 10;

/// Value of the "Sunrise Type" column.
///
/// NOTE: It is important to keep the strum names
/// exactly as ICANN spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub(super) enum SunriseType {
    #[strum(serialize = "Start Date Sunrise")]
    StartDate,
    #[strum(serialize = "End Date Sunrise")]
    EndDate,
    #[strum(serialize = "Spec 13 - .BRAND TLD")]
    Spec13Brand,
}

impl SunriseType {
    /// The type to annotate the Sunrise period with, if any.
    pub(super) fn period_type(self) -> Option<String> {
        match self {
            Self::StartDate | Self::EndDate => Some(self.to_string()),
            Self::Spec13Brand => None,
        }
    }

    pub(super) const fn is_spec13(self) -> bool {
        matches!(self, Self::Spec13Brand)
    }
}

/// The trimmed cell texts of one data row, named.
#[derive(Debug)]
pub(super) struct Row<'a> {
    pub tld: &'a str,
    pub sunrise_type: &'a str,
    pub sunrise_open: &'a str,
    pub sunrise_close: &'a str,
    pub claims_open: &'a str,
    pub claims_close: &'a str,
    /// The "other period" columns hold comma separated lists,
    /// where the entries at the same index make up one period.
    pub others_open: &'a str,
    pub others_name: &'a str,
    pub others_close: &'a str,
    pub others_type: &'a str,
}

impl<'a> Row<'a> {
    /// Returns `None` if the number of cells is not [`NUM_CELLS`].
    pub(super) fn from_cells(cells: &'a [String]) -> Option<Self> {
        match cells {
            [tld, sunrise_type, sunrise_open, sunrise_close, claims_open, claims_close, others_open, others_name, others_close, others_type] => {
                Some(Self {
                    tld,
                    sunrise_type,
                    sunrise_open,
                    sunrise_close,
                    claims_open,
                    claims_close,
                    others_open,
                    others_name,
                    others_close,
                    others_type,
                })
            }
            _ => None,
        }
    }
}

/// Splits a comma separated list cell into its trimmed entries;
/// an empty cell has no entries.
pub(super) fn split_list(cell: &str) -> Vec<&str> {
    if cell.trim().is_empty() {
        return Vec::new();
    }
    cell.split(',').map(str::trim).collect()
}
