use clap::{ArgAction, arg};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("prerender")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("prerender")
        .about("Mirror a single-origin website into a static, self-contained file tree")
        .styles(CLAP_STYLING)
        .arg(
            arg!([URL])
                .required(false)
                .help("The site to mirror; overrides target_url from the config file")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Output directory, wiped and rebuilt on every run (default: ./dist)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help("JSON config file with target_url and output_dir")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds (default: 30)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--"user-agent" <AGENT>)
                .required(false)
                .help("User-Agent header sent with every request"),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(--"report" <PATH>)
                .required(false)
                .help("Save the report to a file (default: display to screen)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(arg!(-q --"quiet" "Suppress the progress spinner and the report").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(ArgAction::Count),
        )
}
