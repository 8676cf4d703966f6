use crate::{
    cli::globals::GlobalArgs,
    client::{Credentials, Registration},
    error::Error,
    policy::classify,
    router::paths,
    session::Session,
};
use anyhow::{Context, Result, bail};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub return_to: Option<String>,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub username: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// # Errors
/// Returns an error if the service rejects the credentials or the session cannot be stored.
pub async fn login(args: LoginArgs) -> Result<()> {
    let client = args.globals.session_client()?;
    let credentials = Credentials {
        email: args.email,
        password: args.password,
    };

    let user = client.login(&credentials).await.context("login failed")?;

    println!(
        "Signed in as {}",
        user.display_name().unwrap_or(credentials.email.as_str())
    );
    println!(
        "Continue at {}",
        paths::after_login(args.return_to.as_deref())
    );

    Ok(())
}

/// # Errors
/// Returns an error if the service rejects the registration or the session cannot be stored.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let client = args.globals.session_client()?;
    let registration = Registration {
        email: args.email,
        username: args.username,
        password: args.password,
        confirm_password: args.confirm_password,
    };

    match client.register(&registration).await {
        Ok(user) => {
            println!(
                "Registered and signed in as {}",
                user.display_name().unwrap_or(registration.username.as_str())
            );
            println!("Continue at {}", paths::HOME);
            Ok(())
        }
        Err(Error::Validation(fields)) => {
            for (field, messages) in &fields.0 {
                for message in messages {
                    eprintln!("{field}: {message}");
                }
            }
            bail!("registration rejected")
        }
        Err(err) => Err(err).context("registration failed"),
    }
}

/// # Errors
/// Returns an error if the stored session cannot be removed.
pub async fn logout(args: Args) -> Result<()> {
    let client = args.globals.session_client()?;
    client.logout().await.context("logout failed")?;
    println!("Signed out");
    Ok(())
}

/// Prints the classification and cached profile; reads the store only.
pub fn status(args: &Args) {
    let store = args.globals.store();
    println!("{}", describe(&store.get()));
}

fn describe(session: &Session) -> String {
    let mut lines = vec![format!("classification: {}", classify(session))];

    if let Some(user) = &session.user {
        if let Some(name) = user.display_name() {
            lines.push(format!("user: {name}"));
        }
        lines.push(format!("admin: {}", user.is_admin));
    }

    lines.push(format!(
        "access token: {}",
        if session.access_token.is_some() {
            "present"
        } else {
            "absent"
        }
    ));
    lines.push(format!(
        "refresh token: {}",
        if session.refresh_token.is_some() {
            "present"
        } else {
            "absent"
        }
    ));

    lines.join("\n")
}
