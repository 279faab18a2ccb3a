//! Explicit session context.
//!
//! A [`SessionHandle`] is created once and cloned into every component that
//! needs the signed-in identity. It starts empty, is filled by
//! [`SessionHandle::begin`] after a successful login and is emptied by
//! [`SessionHandle::end`], either on user request or when the server rejects
//! the token. Every transition is broadcast as a [`SessionEvent`].

use std::sync::{Arc, PoisonError, RwLock};

use log::info;
use taskdeck::UserSummary;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user chose "log out".
    UserRequested,
    /// The server answered 401.
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserSummary),
    SignedOut(SignOutReason),
}

#[derive(Clone)]
pub struct SessionHandle {
    current: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current: Arc::new(RwLock::new(None)),
            events,
        }
    }

    pub fn begin(&self, session: Session) {
        let user = session.user.clone();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        info!("session started for user {}", user.id);
        // No receivers is fine.
        let _ = self.events.send(SessionEvent::SignedIn(user));
    }

    /// Drop the session. Returns `false` (and broadcasts nothing) when there was
    /// none to drop.
    pub fn end(&self, reason: SignOutReason) -> bool {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match previous {
            Some(session) => {
                info!("session ended for user {} ({reason:?})", session.user.id);
                let _ = self.events.send(SessionEvent::SignedOut(reason));
                true
            }
            None => false,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read(|session| session.token.clone())
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.read(|session| session.user.clone())
    }

    pub fn is_active(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    /// Replace the cached identity after a profile change. No-op when signed out.
    pub fn update_user(&self, user: UserSummary) {
        if let Some(session) = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            session.user = user;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> Session {
        Session {
            token: "tok".into(),
            user: UserSummary {
                id: "u1".into(),
                name: "Ann".into(),
                email: "ann@x.io".into(),
                avatar: None,
            },
        }
    }

    #[test]
    fn test_begin_and_end_broadcast() {
        let session = SessionHandle::new();
        let mut events = session.subscribe();

        session.begin(ann());
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert!(matches!(events.try_recv(), Ok(SessionEvent::SignedIn(user)) if user.name == "Ann"));

        assert!(session.end(SignOutReason::Unauthorized));
        assert!(!session.is_active());
        assert_eq!(
            events.try_recv().ok(),
            Some(SessionEvent::SignedOut(SignOutReason::Unauthorized))
        );
    }

    #[test]
    fn test_ending_twice_broadcasts_once() {
        let session = SessionHandle::new();
        let mut events = session.subscribe();
        session.begin(ann());
        let _ = events.try_recv();

        assert!(session.end(SignOutReason::UserRequested));
        assert!(!session.end(SignOutReason::Unauthorized));
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let session = SessionHandle::new();
        let other = session.clone();
        session.begin(ann());
        assert!(other.is_active());

        let mut renamed = ann().user;
        renamed.name = "Annie".into();
        other.update_user(renamed);
        assert_eq!(session.user().map(|u| u.name).as_deref(), Some("Annie"));
    }
}
