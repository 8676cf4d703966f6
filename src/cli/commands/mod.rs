pub mod auth;
pub mod logging;
pub mod navigate;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STORE: &str = "store";
pub const ARG_TIMEOUT: &str = "timeout";

pub const DEFAULT_STORE: &str = ".gatehouse/session.json";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("gatehouse")
        .about("Session and access control client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the API and authentication service")
                .env("GATEHOUSE_API_URL")
                .default_value(crate::config::DEFAULT_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_STORE)
                .long("store")
                .help("File holding the stored session")
                .env("GATEHOUSE_STORE")
                .default_value(DEFAULT_STORE)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Request timeout in seconds")
                .env("GATEHOUSE_TIMEOUT")
                .default_value("5")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .subcommand(auth::login())
        .subcommand(auth::register())
        .subcommand(auth::logout())
        .subcommand(auth::status())
        .subcommand(navigate::get())
        .subcommand(navigate::resolve());

    logging::with_args(command)
}
