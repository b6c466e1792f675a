use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::domain::{Session, UserRole};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::session::{KeyValueStore, SessionReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Bills,
    NewBill,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Login, Route::Bills, Route::NewBill, Route::Dashboard];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Bills => "#employee/bills",
            Route::NewBill => "#employee/bill/new",
            Route::Dashboard => "#admin/dashboard",
        }
    }

    /// Unknown paths fall back to the login page.
    pub fn from_path(path: &str) -> Route {
        let path = path.trim();
        Route::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Route::Login)
    }

    pub fn required_role(self) -> Option<UserRole> {
        match self {
            Route::Login => None,
            Route::Bills | Route::NewBill => Some(UserRole::Employee),
            Route::Dashboard => Some(UserRole::Admin),
        }
    }

    pub fn is_allowed_for(self, session: &Session) -> bool {
        match self.required_role() {
            None => true,
            Some(role) => session.is_role(role),
        }
    }

    pub fn nav_icon(self) -> Option<NavIcon> {
        match self {
            Route::Bills => Some(NavIcon::Window),
            Route::NewBill => Some(NavIcon::Mail),
            Route::Login | Route::Dashboard => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Icons of the employee side bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavIcon {
    Window,
    Mail,
}

impl NavIcon {
    pub fn test_id(self) -> &'static str {
        match self {
            NavIcon::Window => "icon-window",
            NavIcon::Mail => "icon-mail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavRequest {
    Navigate(Route),
    Logout,
}

/// What a controller may do to the rest of the application: ask for another
/// page, ask for a logout, and read the session.
#[derive(Clone)]
pub struct NavigationContext {
    requests: UnboundedSender<NavRequest>,
    session: SessionReader,
}

impl NavigationContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> (Self, UnboundedReceiver<NavRequest>) {
        let (requests, rx) = unbounded_channel();
        let context = Self {
            requests,
            session: SessionReader::new(store),
        };
        (context, rx)
    }

    pub fn on_navigate(&self, route: Route) {
        self.send(NavRequest::Navigate(route));
    }

    /// Handler for the layout's disconnect control.
    pub fn disconnect(&self) {
        self.send(NavRequest::Logout);
    }

    pub fn session(&self) -> Session {
        self.session.current()
    }

    pub fn session_email(&self) -> String {
        self.session.email()
    }

    fn send(&self, request: NavRequest) {
        debug!(?request, "navigation requested");
        if self.requests.send(request).is_err() {
            warn!(?request, "navigation request dropped; router is gone");
        }
    }
}

/// Identifies one mounting of a page. Work that settles after the page was
/// replaced must not touch the view.
#[derive(Debug, Clone)]
pub struct MountToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl MountToken {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// Issues mount tokens; each new mount invalidates the previous token.
#[derive(Debug, Clone, Default)]
pub struct MountCounter {
    current: Arc<AtomicU64>,
}

impl MountCounter {
    pub fn next(&self) -> MountToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        MountToken {
            generation,
            current: self.current.clone(),
        }
    }

    /// Token that never goes stale, for controllers built outside the router.
    pub fn detached() -> MountToken {
        MountCounter::default().next()
    }
}
