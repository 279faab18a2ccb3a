//! Navigation bar: who is signed in, plus the account menu.

use crate::session::{SessionHandle, SignOutReason};

pub const GUEST_NAME: &str = "Guest User";
pub const GUEST_EMAIL: &str = "user@TASK_MANAGER.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Image(String),
    Initial(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ProfileSettings,
    LogOut,
}

#[derive(Clone)]
pub struct SessionChrome {
    session: SessionHandle,
    menu_open: bool,
}

impl SessionChrome {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            menu_open: false,
        }
    }

    pub fn display_name(&self) -> String {
        self.session
            .user()
            .map(|user| user.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| GUEST_NAME.to_string())
    }

    pub fn display_email(&self) -> String {
        self.session
            .user()
            .map(|user| user.email)
            .filter(|email| !email.trim().is_empty())
            .unwrap_or_else(|| GUEST_EMAIL.to_string())
    }

    /// The avatar image when one is set, otherwise the upper-cased first
    /// letter of the name ('U' without one).
    pub fn avatar(&self) -> Avatar {
        let user = self.session.user();
        if let Some(url) = user
            .as_ref()
            .and_then(|user| user.avatar.clone())
            .filter(|url| !url.trim().is_empty())
        {
            return Avatar::Image(url);
        }

        let initial = user
            .and_then(|user| user.name.trim().chars().next())
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('U');
        Avatar::Initial(initial)
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// A click anywhere outside the menu.
    pub fn outside_interaction(&mut self) {
        self.menu_open = false;
    }

    /// Close the menu and carry out `action`. Logging out ends the session.
    pub fn select(&mut self, action: MenuAction) -> MenuAction {
        self.menu_open = false;
        if action == MenuAction::LogOut {
            self.session.end(SignOutReason::UserRequested);
        }
        action
    }
}
