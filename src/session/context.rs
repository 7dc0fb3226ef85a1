use std::sync::Arc;
use std::time::Duration;

use crate::preferences::{PreferenceStore, keys};
use crate::ui::shell::{Navigator, Route};

/// Everything a session reads from its surroundings, handed in at construction.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn PreferenceStore>,
    navigator: Arc<dyn Navigator>,
    request_timeout: Duration,
}

impl SessionContext {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        navigator: Arc<dyn Navigator>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            navigator,
            request_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn token(&self) -> Option<String> {
        self.store.get_string(keys::TOKEN)
    }

    pub fn username(&self) -> Option<String> {
        self.store.get_string(keys::USERNAME)
    }

    pub(crate) fn navigate(&self, route: Route) {
        self.navigator.navigate_to(route);
    }

    pub(crate) fn redirect_to_login(&self) {
        log::info!("credentials missing, sending the user back to login");
        self.navigate(Route::Login);
    }
}
