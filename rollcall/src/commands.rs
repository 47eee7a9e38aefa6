use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("rollcall")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("rollcall")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and non-essential output")
                .required(false)
                .global(true)
                .conflicts_with("verbose"),
        )
        .arg(
            arg!(-v --"verbose" "Log debug detail")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("JSON config file (default: ~/.config/rollcall/config.json if present)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("run")
                .about(
                    "Resolve and expand an input file, then submit every record to the lookup \
                form and store the answers.",
                )
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Input record file (city, postal code, first, last, seed date)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-r --"results-dir" <PATH>)
                        .required(false)
                        .help("Directory for result files (default: results)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-k --"key" <POLICY>)
                        .required(false)
                        .help("Result file key: first-last or full")
                        .value_parser(["first-last", "full"]),
                )
                .arg(
                    arg!(-m --"mode" <MODE>)
                        .required(false)
                        .help("Date expansion for rows without a row count: day-wrap, offset, single")
                        .value_parser(["day-wrap", "offset", "single"]),
                )
                .arg(
                    arg!(--"recycle-every" <COUNT>)
                        .required(false)
                        .help("Restart the form session after this many searched records")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-retries" <COUNT>)
                        .required(false)
                        .help("Retries per record when the form returns a placeholder page")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"dry-run")
                        .required(false)
                        .help("Use a scripted driver that answers 'not found' instead of the real form")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("resolve")
                .about("Show which jurisdiction a municipality resolves to")
                .arg(arg!(<MUNICIPALITY>).required(true).help("Municipality name"))
                .arg(
                    arg!(-z --"postal-code" <CODE>)
                        .required(false)
                        .help("Postal code to consult first"),
                ),
        )
        .subcommand(
            command!("expand")
                .about("Print the query records an input file expands to, without submitting")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Input record file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-m --"mode" <MODE>)
                        .required(false)
                        .help("Date expansion for rows without a row count: day-wrap, offset, single")
                        .value_parser(["day-wrap", "offset", "single"]),
                ),
        )
        .subcommand(
            command!("sweep")
                .about("Find stored results that are placeholder pages rather than answers")
                .arg(
                    arg!(-r --"results-dir" <PATH>)
                        .required(false)
                        .help("Directory of result files (default: results)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"purge")
                        .required(false)
                        .help("Delete the junk files so the next run retries them")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
