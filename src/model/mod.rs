// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod period;
pub mod record;
pub mod tld_type;

pub use period::Period;
pub use record::{
    AgreementInfo, BrandInfo, FinalTldRecord, IanaRecord, StatusPeriodsRecord, TldLabel,
};
pub use tld_type::TldType;
