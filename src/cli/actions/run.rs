use crate::cli::actions::{Action, auth, request, route};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => auth::login(args).await,
        Action::Register(args) => auth::register(args).await,
        Action::Logout(args) => auth::logout(args).await,
        Action::Status(args) => {
            auth::status(&args);
            Ok(())
        }
        Action::Get(args) => request::execute(args).await,
        Action::Resolve(args) => route::execute(&args),
    }
}
