pub mod auth;
pub mod request;
pub mod route;

mod run;

#[derive(Debug)]
pub enum Action {
    Login(auth::LoginArgs),
    Register(auth::RegisterArgs),
    Logout(auth::Args),
    Status(auth::Args),
    Get(request::Args),
    Resolve(route::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
