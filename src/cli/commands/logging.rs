use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order: `-v` once is `warn`, twice is `info`, and so on.
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Reads `GATEHOUSE_LOG_LEVEL` as a level name or as its position in [`LEVELS`].
///
/// # Errors
/// Returns an error for anything else.
pub fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim();

    let position = match level.parse::<usize>() {
        Ok(number) => (number < LEVELS.len()).then_some(number),
        Err(_) => LEVELS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(level)),
    };

    position
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level {level:?}, expected one of {}", LEVELS.join(", ")))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_log_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more to stderr: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env("GATEHOUSE_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
