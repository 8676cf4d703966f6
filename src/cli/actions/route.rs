use crate::{
    cli::globals::GlobalArgs,
    policy::classify_store,
    router::{Resolution, RouteTable, View},
};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub location: String,
}

/// Resolves a location against the standard route table for the stored session.
/// # Errors
/// Returns an error if the route table never settles.
pub fn execute(args: &Args) -> Result<()> {
    let store = args.globals.store();
    let resolution = RouteTable::standard().resolve(&store, &args.location)?;

    println!("classification: {}", classify_store(&store));
    println!("{}", describe(&resolution));

    Ok(())
}

fn describe(resolution: &Resolution) -> String {
    let mut trail = resolution.redirects.clone();
    trail.push(resolution.location.clone());

    let mut lines = vec![format!("route: {}", trail.join(" -> "))];
    match &resolution.view {
        View::Page(name) => lines.push(format!("view: {name}")),
        View::Forbidden(message) => lines.push(format!("forbidden: {message}")),
    }
    if let Some(return_to) = &resolution.return_to {
        lines.push(format!("return to: {return_to}"));
    }

    lines.join("\n")
}
