//! Behaviour every screen shares: the theme flag, the drop-down menu and navigation.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::preferences::{PreferenceStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Main,
    PersonalFriend,
    Help,
    TalkingPlatform,
    CreateAccount,
    ForgotPassword,
    UserSettings,
    GoalsTracker,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Main => "/main",
            Route::PersonalFriend => "/personal-friend",
            Route::Help => "/help",
            Route::TalkingPlatform => "/talking-platform",
            Route::CreateAccount => "/create-account",
            Route::ForgotPassword => "/forgot-password",
            Route::UserSettings => "/user-settings",
            Route::GoalsTracker => "/goals-tracker",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}

/// Remembers every navigation; the last entry is the screen currently shown.
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn starting_at(route: Route) -> Self {
        Self {
            history: Mutex::new(vec![route]),
        }
    }

    pub fn current(&self) -> Route {
        self.history.lock().last().copied().unwrap_or(Route::Login)
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().clone()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::starting_at(Route::Login)
    }
}

impl Navigator for HistoryNavigator {
    fn navigate_to(&self, route: Route) {
        log::debug!("navigate to {route}");
        self.history.lock().push(route);
    }
}

pub struct ScreenShell {
    store: Arc<dyn PreferenceStore>,
    navigator: Arc<dyn Navigator>,
    dark_mode: bool,
    menu_open: bool,
}

impl ScreenShell {
    /// Mounting reads the persisted theme once.
    pub fn mount(store: Arc<dyn PreferenceStore>, navigator: Arc<dyn Navigator>) -> Self {
        let dark_mode = store.get_flag(keys::DARK_MODE);
        Self {
            store,
            navigator,
            dark_mode,
            menu_open: false,
        }
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    /// Flips the theme and persists it. On a storage failure the theme stays as it was.
    pub fn toggle_dark_mode(&mut self) -> Result<bool, StoreError> {
        let next = !self.dark_mode;
        self.store.set_flag(keys::DARK_MODE, next)?;
        self.dark_mode = next;
        Ok(next)
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn navigate(&mut self, route: Route) {
        self.menu_open = false;
        self.navigator.navigate_to(route);
    }
}
