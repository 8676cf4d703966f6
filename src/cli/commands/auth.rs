use clap::{Arg, Command};

pub const ARG_EMAIL: &str = "email";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_RETURN_TO: &str = "return-to";

fn email() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .env("GATEHOUSE_EMAIL")
        .required(true)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Account password")
        .env("GATEHOUSE_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn login() -> Command {
    Command::new("login")
        .about("Sign in and store the issued tokens")
        .arg(email())
        .arg(password())
        .arg(
            Arg::new(ARG_RETURN_TO)
                .long("return-to")
                .help("Location to continue at after signing in"),
        )
}

#[must_use]
pub fn register() -> Command {
    Command::new("register")
        .about("Create an account and sign in")
        .arg(email())
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long("username")
                .help("Account username")
                .env("GATEHOUSE_USERNAME")
                .required(true),
        )
        .arg(password())
        .arg(
            Arg::new(ARG_CONFIRM_PASSWORD)
                .long("confirm-password")
                .help("Password confirmation (defaults to --password)")
                .env("GATEHOUSE_CONFIRM_PASSWORD")
                .hide_env_values(true),
        )
}

#[must_use]
pub fn logout() -> Command {
    Command::new("logout").about("Revoke the refresh token and forget the session")
}

#[must_use]
pub fn status() -> Command {
    Command::new("status").about("Show the current classification and cached profile")
}
