use std::sync::Arc;

use tokio::sync::{mpsc::UnboundedReceiver, Mutex};
use tracing::{error, info, warn};

use crate::{
    bills::{BillsController, PreviewOptions},
    navigation::{MountCounter, NavRequest, NavigationContext, Route},
    new_bill::NewBillController,
    session::{read_session, KeyValueStore},
    view::{AppView, Page},
    RemoteStore,
};

#[derive(Default)]
struct Mounted {
    route: Option<Route>,
    bills: Option<Arc<BillsController>>,
    new_bill: Option<Arc<NewBillController>>,
}

/// Switches pages on navigation requests, gated by the stored session.
pub struct Router<V> {
    view: Arc<V>,
    store: Arc<dyn RemoteStore>,
    sessions: Arc<dyn KeyValueStore>,
    navigation: NavigationContext,
    requests: Mutex<UnboundedReceiver<NavRequest>>,
    mounts: MountCounter,
    mounted: Mutex<Mounted>,
    preview: PreviewOptions,
}

impl<V> Router<V>
where
    V: AppView + 'static,
{
    pub fn new(
        view: Arc<V>,
        store: Arc<dyn RemoteStore>,
        sessions: Arc<dyn KeyValueStore>,
        preview: PreviewOptions,
    ) -> Self {
        let (navigation, requests) = NavigationContext::new(sessions.clone());
        Self {
            view,
            store,
            sessions,
            navigation,
            requests: Mutex::new(requests),
            mounts: MountCounter::default(),
            mounted: Mutex::new(Mounted::default()),
            preview,
        }
    }

    /// Context to hand to anything that needs to navigate or log out.
    pub fn navigation(&self) -> NavigationContext {
        self.navigation.clone()
    }

    pub async fn navigate_to_path(&self, path: &str) -> Route {
        self.on_navigate(Route::from_path(path)).await
    }

    /// Mounts `route`, or the login page when the session does not allow it.
    /// Returns the route actually mounted.
    pub async fn on_navigate(&self, route: Route) -> Route {
        let session = read_session(self.sessions.as_ref());
        let route = if route.is_allowed_for(&session) {
            route
        } else {
            warn!(requested = %route, role = ?session.role(), "route not allowed; showing login");
            Route::Login
        };

        let mount = self.mounts.next();
        self.view.mount(page_for(route));
        self.view.set_active_icon(route.nav_icon());
        info!(route = %route, "mounted page");

        let mut bills = None;
        let mut new_bill = None;
        match route {
            Route::Bills => {
                bills = Some(Arc::new(BillsController::new(
                    self.store.clone(),
                    self.view.clone(),
                    self.navigation.clone(),
                    mount,
                    self.preview,
                )));
            }
            Route::NewBill => {
                new_bill = Some(Arc::new(NewBillController::new(
                    self.store.clone(),
                    self.view.clone(),
                    self.navigation.clone(),
                    mount,
                )));
            }
            Route::Login | Route::Dashboard => {}
        }

        {
            let mut mounted = self.mounted.lock().await;
            mounted.route = Some(route);
            mounted.bills = bills.clone();
            mounted.new_bill = new_bill;
        }

        if let Some(controller) = bills {
            controller.retrieve_and_render().await;
        }
        route
    }

    /// Applies every queued request in order. Returns the last route mounted.
    pub async fn process_pending(&self) -> Option<Route> {
        let mut last = None;
        loop {
            let request = self.requests.lock().await.try_recv();
            let Ok(request) = request else {
                break;
            };
            last = Some(match request {
                NavRequest::Navigate(route) => self.on_navigate(route).await,
                NavRequest::Logout => self.logout().await,
            });
        }
        last
    }

    /// Clears the session store, then shows the login page.
    pub async fn logout(&self) -> Route {
        if let Err(err) = self.sessions.clear() {
            error!(error = %err, "failed to clear session store");
        }
        info!("signed out");
        self.on_navigate(Route::Login).await
    }

    pub async fn current_route(&self) -> Option<Route> {
        self.mounted.lock().await.route
    }

    pub async fn bills_controller(&self) -> Option<Arc<BillsController>> {
        self.mounted.lock().await.bills.clone()
    }

    pub async fn new_bill_controller(&self) -> Option<Arc<NewBillController>> {
        self.mounted.lock().await.new_bill.clone()
    }
}

fn page_for(route: Route) -> Page {
    match route {
        Route::Login => Page::Login,
        Route::Bills => Page::Bills,
        Route::NewBill => Page::NewBill,
        Route::Dashboard => Page::Dashboard,
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
