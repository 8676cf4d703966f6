//! Route table and entry redirect. A path resolves by following redirects until
//! a route renders or a guard answers with a forbidden message. The root path
//! dispatches on the visitor's classification and any path without a route is
//! sent back to the root, so every resolution ends on a known screen.

use crate::{
    error::{Error, Result},
    guard::{GuardOutcome, RouteGuard},
    policy::{Classification, classify_store},
    store::CredentialStore,
};
use tracing::debug;

/// Upper bound on redirects followed by one resolution.
const MAX_REDIRECTS: usize = 8;

pub mod paths {
    pub const ROOT: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const HOME: &str = "/home";
    pub const ABOUT: &str = "/about";
    pub const ADMIN: &str = "/admin";

    /// Destination after a successful login: the location a guard recorded,
    /// unless it is missing or points back into the sign-in flow.
    #[must_use]
    pub fn after_login(return_to: Option<&str>) -> &str {
        match return_to.map(str::trim) {
            Some(location)
                if location.starts_with('/')
                    && !location.starts_with("//")
                    && !location.starts_with("/\\")
                    && ![ROOT, LOGIN, REGISTER].contains(&super::path_of(location)) =>
            {
                location
            }
            _ => HOME,
        }
    }
}

/// What the resolved screen shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Page(String),
    Forbidden(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub view: String,
    /// Outermost first; each level classifies the store again.
    pub guards: Vec<RouteGuard>,
}

impl Route {
    pub fn public(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: view.into(),
            guards: Vec::new(),
        }
    }

    #[must_use]
    pub fn guard(mut self, guard: RouteGuard) -> Self {
        self.guards.push(guard);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Location the visitor ends up on.
    pub location: String,
    pub view: View,
    /// Location a guard turned the visitor away from, for the post-login return.
    pub return_to: Option<String>,
    /// Every location visited before the final one.
    pub redirects: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
    login: String,
    landing: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(paths::LOGIN, paths::HOME)
    }
}

impl RouteTable {
    pub fn new(login: impl Into<String>, landing: impl Into<String>) -> Self {
        Self {
            routes: Vec::new(),
            login: login.into(),
            landing: landing.into(),
        }
    }

    /// Screens of the stock application: public sign-in screens, an
    /// authenticated landing page and an admin area nested inside it.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
            .route(Route::public(paths::LOGIN, "login"))
            .route(Route::public(paths::REGISTER, "register"))
            .route(Route::public(paths::ABOUT, "about"))
            .route(Route::public(paths::HOME, "home").guard(RouteGuard::authenticated()))
            .route(
                Route::public(paths::ADMIN, "admin")
                    .guard(RouteGuard::authenticated())
                    .guard(
                        RouteGuard::admin()
                            .forbidden_message("You need administrator access to view this page."),
                    ),
            )
    }

    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Where the root path sends a visitor.
    #[must_use]
    pub fn entry_destination(&self, classification: Classification) -> &str {
        if classification.is_authenticated() {
            &self.landing
        } else {
            &self.login
        }
    }

    fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.path == path)
    }

    /// Resolves `location` against the store's current contents.
    /// # Errors
    /// Returns [`Error::RedirectLoop`] if the table keeps redirecting.
    pub fn resolve(&self, store: &CredentialStore, location: &str) -> Result<Resolution> {
        let mut location = normalize(location);
        let mut redirects = Vec::new();
        let mut return_to = None;

        'navigate: while redirects.len() <= MAX_REDIRECTS {
            let path = path_of(&location);

            if path == paths::ROOT {
                let next = self.entry_destination(classify_store(store)).to_string();
                debug!("entry redirect {} -> {}", location, next);
                redirects.push(std::mem::replace(&mut location, next));
                continue;
            }

            let Some(route) = self.find(path) else {
                debug!("no route for {}, returning to root", location);
                redirects.push(std::mem::replace(&mut location, paths::ROOT.to_string()));
                continue;
            };

            for guard in &route.guards {
                match guard.evaluate(store, &location) {
                    GuardOutcome::Render => {}
                    GuardOutcome::Redirect { to, from } => {
                        debug!("guard redirect {} -> {}", location, to);
                        if return_to.is_none() {
                            return_to = from;
                        }
                        redirects.push(std::mem::replace(&mut location, to));
                        continue 'navigate;
                    }
                    GuardOutcome::Forbidden(message) => {
                        return Ok(Resolution {
                            location,
                            view: View::Forbidden(message),
                            return_to,
                            redirects,
                        });
                    }
                }
            }

            return Ok(Resolution {
                location,
                view: View::Page(route.view.clone()),
                return_to,
                redirects,
            });
        }

        Err(Error::RedirectLoop(redirects.first().cloned().unwrap_or(location)))
    }
}

fn normalize(location: &str) -> String {
    let location = location.trim();
    if location.is_empty() {
        paths::ROOT.to_string()
    } else if location.starts_with('/') {
        location.to_string()
    } else {
        format!("/{location}")
    }
}

/// Path portion of a location, without query or fragment.
fn path_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionPatch, UserProfile};
    use anyhow::{Result, anyhow};

    fn signed_in(is_admin: bool) -> Result<CredentialStore> {
        let store = CredentialStore::in_memory();
        store.set(
            SessionPatch::default()
                .with_access_token("access")
                .with_refresh_token("refresh")
                .with_user(UserProfile {
                    is_admin,
                    ..UserProfile::default()
                }),
        )?;
        Ok(store)
    }

    fn admin_table() -> RouteTable {
        RouteTable::standard().route(
            Route::public("/reports", "reports")
                .guard(RouteGuard::authenticated())
                .guard(RouteGuard::admin().forbidden_message("not admin")),
        )
    }

    #[test]
    fn anonymous_guarded_route_goes_to_login() -> Result<()> {
        let store = CredentialStore::in_memory();
        let resolution = RouteTable::standard().resolve(&store, "/home")?;

        assert_eq!(resolution.location, paths::LOGIN);
        assert_eq!(resolution.view, View::Page("login".to_string()));
        assert_eq!(resolution.return_to.as_deref(), Some("/home"));
        Ok(())
    }

    #[test]
    fn non_admin_sees_forbidden_message_without_navigation() -> Result<()> {
        let store = signed_in(false)?;
        let resolution = admin_table().resolve(&store, "/reports")?;

        assert_eq!(resolution.location, "/reports");
        assert_eq!(resolution.view, View::Forbidden("not admin".to_string()));
        assert!(resolution.redirects.is_empty());
        Ok(())
    }

    #[test]
    fn admin_renders_admin_route() -> Result<()> {
        let store = signed_in(true)?;
        let resolution = admin_table().resolve(&store, "/reports")?;

        assert_eq!(resolution.view, View::Page("reports".to_string()));
        assert!(resolution.redirects.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_path_lands_on_login_for_anonymous() -> Result<()> {
        let store = CredentialStore::in_memory();
        let resolution = RouteTable::standard().resolve(&store, "/does-not-exist")?;

        assert_eq!(resolution.location, paths::LOGIN);
        assert_eq!(
            resolution.redirects,
            vec!["/does-not-exist".to_string(), paths::ROOT.to_string()]
        );
        assert_eq!(resolution.return_to, None);
        Ok(())
    }

    #[test]
    fn unknown_path_lands_on_home_when_signed_in() -> Result<()> {
        let store = signed_in(false)?;
        let resolution = RouteTable::standard().resolve(&store, "/nope?x=1")?;

        assert_eq!(resolution.location, paths::HOME);
        assert_eq!(resolution.view, View::Page("home".to_string()));
        Ok(())
    }

    #[test]
    fn root_dispatches_on_classification() -> Result<()> {
        let table = RouteTable::standard();
        assert_eq!(
            table.resolve(&CredentialStore::in_memory(), "/")?.location,
            paths::LOGIN
        );
        assert_eq!(table.resolve(&signed_in(true)?, "")?.location, paths::HOME);
        Ok(())
    }

    #[test]
    fn refresh_token_alone_reaches_home() -> Result<()> {
        let store = CredentialStore::in_memory();
        store.set(SessionPatch::default().with_refresh_token("refresh"))?;

        let resolution = RouteTable::standard().resolve(&store, "/home/")?;
        assert_eq!(resolution.view, View::Page("home".to_string()));
        Ok(())
    }

    #[test]
    fn outer_guard_short_circuits_inner() -> Result<()> {
        let table = RouteTable::standard()
            .route(Route::public("/outer-login", "outer-login"))
            .route(Route::public("/inner-login", "inner-login"))
            .route(
                Route::public("/nested", "nested")
                    .guard(RouteGuard::authenticated().redirect_to("/outer-login"))
                    .guard(RouteGuard::admin().redirect_to("/inner-login")),
            );

        let resolution = table.resolve(&CredentialStore::in_memory(), "/nested")?;
        assert_eq!(resolution.location, "/outer-login");
        assert_eq!(resolution.return_to.as_deref(), Some("/nested"));
        Ok(())
    }

    #[test]
    fn non_admin_without_message_is_sent_to_landing() -> Result<()> {
        let table = RouteTable::standard().route(
            Route::public("/ops", "ops")
                .guard(RouteGuard::authenticated())
                .guard(RouteGuard::admin()),
        );
        let resolution = table.resolve(&signed_in(false)?, "/ops")?;

        assert_eq!(resolution.location, paths::HOME);
        assert_eq!(resolution.redirects, vec!["/ops".to_string()]);
        Ok(())
    }

    #[test]
    fn redirect_cycle_is_reported() -> Result<()> {
        let table = RouteTable::standard()
            .route(Route::public("/a", "a").guard(RouteGuard::authenticated().redirect_to("/b")))
            .route(Route::public("/b", "b").guard(RouteGuard::authenticated().redirect_to("/a")));

        let err = table
            .resolve(&CredentialStore::in_memory(), "/a")
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(matches!(err, Error::RedirectLoop(ref start) if start == "/a"));
        Ok(())
    }

    #[test]
    fn after_login_destination() {
        assert_eq!(paths::after_login(None), paths::HOME);
        assert_eq!(paths::after_login(Some("/admin")), "/admin");
        assert_eq!(paths::after_login(Some("/login?next=1")), paths::HOME);
        assert_eq!(paths::after_login(Some("/")), paths::HOME);
        assert_eq!(
            paths::after_login(Some("https://evil.example/")),
            paths::HOME
        );
        assert_eq!(paths::after_login(Some("//evil.example/")), paths::HOME);
        assert_eq!(paths::after_login(Some("/\\evil.example")), paths::HOME);
        assert_eq!(paths::after_login(Some("/reports\\2024")), "/reports\\2024");
    }
}
