use crate::{
    cli::globals::GlobalArgs,
    client::{ApiResponse, PendingRequest},
};
use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
}

/// Sends a GET through the session client and prints the body.
/// # Errors
/// Returns an error if the request fails, including an unrecoverable 401.
pub async fn execute(args: Args) -> Result<()> {
    let client = args.globals.session_client()?;

    let response = client
        .request(PendingRequest::get(args.path.as_str()))
        .await
        .with_context(|| format!("GET {} failed", args.path))?;

    println!("{}", render(&response));

    Ok(())
}

/// JSON bodies are pretty printed, anything else is printed as text.
fn render(response: &ApiResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| response.text())
}
