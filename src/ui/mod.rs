pub mod shell;
pub mod terminal;

pub use shell::{HistoryNavigator, Navigator, Route, ScreenShell};
