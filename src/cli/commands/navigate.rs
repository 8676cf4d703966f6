use clap::{Arg, Command};

pub const ARG_PATH: &str = "path";
pub const ARG_LOCATION: &str = "location";

#[must_use]
pub fn get() -> Command {
    Command::new("get")
        .about("Send an authenticated GET request to the API")
        .arg(
            Arg::new(ARG_PATH)
                .help("Path relative to the API base URL, example: api/profile/")
                .required(true),
        )
}

#[must_use]
pub fn resolve() -> Command {
    Command::new("resolve")
        .about("Show where a location leads for the current session")
        .arg(
            Arg::new(ARG_LOCATION)
                .help("Application location, example: /admin")
                .default_value("/"),
        )
}
