use crate::cli::{
    actions::{Action, auth, request, route},
    commands::{
        auth::{ARG_CONFIRM_PASSWORD, ARG_EMAIL, ARG_PASSWORD, ARG_RETURN_TO, ARG_USERNAME},
        navigate::{ARG_LOCATION, ARG_PATH},
    },
    globals::GlobalArgs,
};
use anyhow::{Context, Result, bail};
use secrecy::SecretString;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn secret(matches: &clap::ArgMatches, name: &str) -> Result<SecretString> {
    required(matches, name).map(SecretString::from)
}

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let Some((name, sub_m)) = matches.subcommand() else {
        bail!("missing subcommand");
    };

    // global args are propagated into the subcommand matches
    let globals = GlobalArgs::from_matches(sub_m);

    let action = match name {
        "login" => Action::Login(auth::LoginArgs {
            globals,
            email: required(sub_m, ARG_EMAIL)?,
            password: secret(sub_m, ARG_PASSWORD)?,
            return_to: sub_m.get_one::<String>(ARG_RETURN_TO).cloned(),
        }),
        "register" => {
            let password = required(sub_m, ARG_PASSWORD)?;
            let confirm_password = sub_m
                .get_one::<String>(ARG_CONFIRM_PASSWORD)
                .cloned()
                .unwrap_or_else(|| password.clone());

            Action::Register(auth::RegisterArgs {
                globals,
                email: required(sub_m, ARG_EMAIL)?,
                username: required(sub_m, ARG_USERNAME)?,
                password: SecretString::from(password),
                confirm_password: SecretString::from(confirm_password),
            })
        }
        "logout" => Action::Logout(auth::Args { globals }),
        "status" => Action::Status(auth::Args { globals }),
        "get" => Action::Get(request::Args {
            globals,
            path: required(sub_m, ARG_PATH)?,
        }),
        "resolve" => Action::Resolve(route::Args {
            globals,
            location: required(sub_m, ARG_LOCATION)?,
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    const ENV: [(&str, Option<&str>); 7] = [
        ("GATEHOUSE_API_URL", None),
        ("GATEHOUSE_STORE", None),
        ("GATEHOUSE_TIMEOUT", None),
        ("GATEHOUSE_EMAIL", None),
        ("GATEHOUSE_USERNAME", None),
        ("GATEHOUSE_PASSWORD", None),
        ("GATEHOUSE_CONFIRM_PASSWORD", None),
    ];

    fn dispatch(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(ENV, || {
            let matches = commands::new().get_matches_from(args.iter().copied());
            handler(&matches)
        })
    }

    #[test]
    fn test_login() -> Result<()> {
        let action = dispatch(&[
            "gatehouse",
            "--timeout",
            "7",
            "login",
            "--email",
            "ada@example.com",
            "--password",
            "correct horse",
            "--return-to",
            "/admin",
        ])?;

        let Action::Login(args) = action else {
            bail!("expected login action");
        };
        assert_eq!(args.email, "ada@example.com");
        assert_eq!(args.password.expose_secret(), "correct horse");
        assert_eq!(args.return_to.as_deref(), Some("/admin"));
        assert_eq!(args.globals.timeout, Duration::from_secs(7));
        Ok(())
    }

    #[test]
    fn test_login_debug_hides_password() -> Result<()> {
        let action = dispatch(&[
            "gatehouse",
            "login",
            "-e",
            "ada@example.com",
            "--password",
            "correct horse",
        ])?;
        assert!(!format!("{action:?}").contains("correct horse"));
        Ok(())
    }

    #[test]
    fn test_register_confirm_defaults_to_password() -> Result<()> {
        let action = dispatch(&[
            "gatehouse",
            "register",
            "-e",
            "ada@example.com",
            "-u",
            "ada",
            "--password",
            "correct horse",
        ])?;

        let Action::Register(args) = action else {
            bail!("expected register action");
        };
        assert_eq!(args.username, "ada");
        assert_eq!(args.confirm_password.expose_secret(), "correct horse");
        Ok(())
    }

    #[test]
    fn test_get_and_resolve() -> Result<()> {
        let action = dispatch(&["gatehouse", "get", "api/profile/"])?;
        let Action::Get(args) = action else {
            bail!("expected get action");
        };
        assert_eq!(args.path, "api/profile/");

        let action = dispatch(&["gatehouse", "resolve", "/admin", "--store", "/tmp/s.json"])?;
        let Action::Resolve(args) = action else {
            bail!("expected resolve action");
        };
        assert_eq!(args.location, "/admin");
        assert_eq!(args.globals.store_path.to_str(), Some("/tmp/s.json"));
        Ok(())
    }

    #[test]
    fn test_status_and_logout() -> Result<()> {
        assert!(matches!(
            dispatch(&["gatehouse", "status"])?,
            Action::Status(_)
        ));
        assert!(matches!(
            dispatch(&["gatehouse", "logout"])?,
            Action::Logout(_)
        ));
        Ok(())
    }
}
