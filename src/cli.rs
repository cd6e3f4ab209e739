// SPDX-FileCopyrightText: 2021-2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use clap::{command, value_parser, Arg, ArgAction, Command, ValueHint};

pub const A_L_VERSION: &str = "version";
pub const A_S_VERSION: char = 'V';
pub const A_L_QUIET: &str = "quiet";
pub const A_S_QUIET: char = 'q';
pub const A_L_VERBOSE: &str = "verbose";
pub const A_S_VERBOSE: char = 'v';
pub const A_L_INPUT: &str = "input";
pub const A_S_INPUT: char = 'i';
pub const A_L_OUTPUT: &str = "output";
pub const A_S_OUTPUT: char = 'o';
pub const A_L_CONFIG: &str = "config";
pub const A_S_CONFIG: char = 'c';
pub const A_L_CONCURRENCY: &str = "concurrency";

fn arg_version() -> Arg {
    Arg::new(A_L_VERSION)
        .help(format!(
            "Print version information and exit. \
May be combined with -{A_S_QUIET},--{A_L_QUIET}, \
to really only output the version string."
        ))
        .short(A_S_VERSION)
        .long(A_L_VERSION)
        .action(ArgAction::SetTrue)
}

fn arg_quiet() -> Arg {
    Arg::new(A_L_QUIET)
        .help("Minimize or suppress output to stdout, and only log warnings and errors")
        .long_help(
            "Minimize or suppress output to stdout, \
and only log warnings and errors. \
The aggregated records are still written.",
        )
        .action(ArgAction::SetTrue)
        .short(A_S_QUIET)
        .long(A_L_QUIET)
        .conflicts_with(A_L_VERBOSE)
}

fn arg_verbose() -> Arg {
    Arg::new(A_L_VERBOSE)
        .help("More verbose log output; useful for debugging")
        .short(A_S_VERBOSE)
        .long(A_L_VERBOSE)
        .action(ArgAction::SetTrue)
}

fn arg_input() -> Arg {
    Arg::new(A_L_INPUT)
        .help("The output of a previous run, to carry brand info forward from")
        .long_help(
            "The JSON output of a previous run. \
Brand and restriction info found in it is re-used as is, \
and the registry agreements of those TLDs are not looked up again.",
        )
        .num_args(1)
        .value_name("JSON_FILE")
        .value_hint(ValueHint::FilePath)
        .value_parser(value_parser!(std::path::PathBuf))
        .short(A_S_INPUT)
        .long(A_L_INPUT)
}

fn arg_output() -> Arg {
    Arg::new(A_L_OUTPUT)
        .help("Where to write the aggregated TLD records to (JSON); default: stdout")
        .num_args(1)
        .value_name("JSON_FILE")
        .value_hint(ValueHint::FilePath)
        .value_parser(value_parser!(std::path::PathBuf))
        .short(A_S_OUTPUT)
        .long(A_L_OUTPUT)
}

fn arg_config() -> Arg {
    Arg::new(A_L_CONFIG)
        .help("Settings file to use instead of 'config.yml'")
        .long_help(
            "Settings file to use instead of the optional 'config.yml' \
in the working directory. \
Environment variables prefixed with 'TLD_SCRAPER_' take precedence over it.",
        )
        .num_args(1)
        .value_name("CONFIG_FILE")
        .value_hint(ValueHint::FilePath)
        .short(A_S_CONFIG)
        .long(A_L_CONFIG)
}

fn arg_concurrency() -> Arg {
    Arg::new(A_L_CONCURRENCY)
        .help("Maximum number of registry agreement lookups in flight")
        .num_args(1)
        .value_name("NUM")
        .value_parser(value_parser!(usize))
        .long(A_L_CONCURRENCY)
}

fn args_list() -> [Arg; 7] {
    [
        arg_version(),
        arg_quiet(),
        arg_verbose(),
        arg_input(),
        arg_output(),
        arg_config(),
        arg_concurrency(),
    ]
}

#[must_use]
pub fn args_matcher() -> Command {
    command!()
        .about(
            "Scrapes the delegated top-level domains of the DNS root, \
and annotates each with its type, brand and restriction status, \
and its launch periods.",
        )
        .bin_name(clap::crate_name!())
        .help_expected(true)
        .disable_version_flag(true)
        .args(args_list())
}
