//! Client-side routes and the guard in front of the protected ones

use tm_core::session::User;

/// A screen of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Tasks,
    NotFound(String),
}

impl Route {
    /// Resolve a location such as `/tasks/` or `/login?next=x`
    pub fn parse(location: &str) -> Self {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = path.trim_end_matches('/');

        match path {
            "" => Self::Root,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/tasks" => Self::Tasks,
            _ => Self::NotFound(location.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Tasks => "/tasks",
            Self::NotFound(path) => path,
        }
    }

    /// Login and registration are reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// Whether the navigation bar is drawn
    pub fn shows_chrome(&self) -> bool {
        !self.is_public()
    }
}

/// What the guard knows about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Startup restore has not finished
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    pub fn from_user(user: Option<&User>) -> Self {
        match user {
            Some(_) => Self::Authenticated,
            None => Self::Unauthenticated,
        }
    }
}

/// Result of resolving a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No decision yet; show a neutral loading indicator
    Pending,
    Render(Route),
    Redirect { to: Route, replace: bool },
}

/// Decide what to show for `route`
pub fn resolve(route: &Route, guard: GuardState) -> Outcome {
    match route {
        Route::Root => Outcome::Redirect {
            to: Route::Login,
            replace: true,
        },
        Route::Tasks => match guard {
            GuardState::Checking => Outcome::Pending,
            GuardState::Authenticated => Outcome::Render(Route::Tasks),
            GuardState::Unauthenticated => Outcome::Redirect {
                to: Route::Login,
                replace: true,
            },
        },
        other => Outcome::Render(other.clone()),
    }
}

/// Navigation history
#[derive(Debug, Default)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Route> {
        self.history.last()
    }

    #[cfg(test)]
    fn history(&self) -> &[Route] {
        &self.history
    }

    /// Navigate to `location`, following redirects. Returns the final outcome;
    /// `Pending` leaves the requested route current.
    pub fn navigate(&mut self, location: &str, guard: GuardState) -> Outcome {
        let route = Route::parse(location);
        self.history.push(route.clone());
        self.settle(route, guard)
    }

    /// Forced move to the login screen after the session expired
    pub fn force_login(&mut self) {
        if self.current() != Some(&Route::Login) {
            self.history.push(Route::Login);
        }
    }

    fn settle(&mut self, mut route: Route, guard: GuardState) -> Outcome {
        loop {
            match resolve(&route, guard) {
                Outcome::Redirect { to, replace } => {
                    if replace {
                        self.history.pop();
                    }
                    self.history.push(to.clone());
                    route = to;
                }
                outcome => return outcome,
            }
        }
    }
}
