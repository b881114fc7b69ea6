//! View activation boundary.
//!
//! Errors never escape a view: they are turned into a redirect or a
//! user-facing message here. Fetch results are tagged with a generation so a
//! slow, superseded fetch cannot overwrite a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::Messages;

/// What a view shows after activation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    /// Data to render
    Ready(T),
    /// Fetch succeeded but there is nothing to show
    Empty(String),
    /// No session; go to the login entry point
    RedirectToLogin(String),
    /// Role resolution failed or the role is not allowed
    Denied(String),
    /// The fetch failed; shown to the user, not retried
    Failed(String),
}

impl<T> ViewOutcome<T> {
    /// Convert an activation result into what the view shows.
    pub fn from_result(
        result: Result<T>,
        messages: &Messages,
        is_empty: impl Fn(&T) -> bool,
    ) -> Self {
        match result {
            Ok(data) if is_empty(&data) => ViewOutcome::Empty(messages.no_data.clone()),
            Ok(data) => ViewOutcome::Ready(data),
            Err(AppError::Unauthenticated) => {
                ViewOutcome::RedirectToLogin(messages.login_required.clone())
            }
            Err(e) if e.is_denial() => ViewOutcome::Denied(messages.access_denied.clone()),
            Err(e) => {
                log::error!("View activation failed: {}", e);
                ViewOutcome::Failed(messages.fetch_failed.replace("{error}", &e.to_string()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewOutcome::Ready(_))
    }

    /// The message shown instead of data, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            ViewOutcome::Ready(_) => None,
            ViewOutcome::Empty(m)
            | ViewOutcome::RedirectToLogin(m)
            | ViewOutcome::Denied(m)
            | ViewOutcome::Failed(m) => Some(m),
        }
    }
}

/// Ticket handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Monotonic fetch counter shared by the tasks of one view.
#[derive(Debug, Clone, Default)]
pub struct FetchGeneration {
    latest: Arc<AtomicU64>,
}

impl FetchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch; any earlier ticket becomes stale.
    pub fn begin(&self) -> FetchTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket { generation }
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.latest()
    }
}

/// Latest accepted data of a view.
#[derive(Debug)]
pub struct ViewState<T> {
    generation: FetchGeneration,
    current: Option<T>,
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self {
            generation: FetchGeneration::new(),
            current: None,
        }
    }

    /// Begin a fetch for this view.
    pub fn begin(&self) -> FetchTicket {
        self.generation.begin()
    }

    /// Accept `value` unless a newer fetch was started after `ticket`.
    pub fn complete(&mut self, ticket: FetchTicket, value: T) -> Result<&T> {
        self.complete_with(ticket, |_| value)
    }

    /// Like `complete`, but builds the new value from the previous one.
    ///
    /// `merge` only runs for a current ticket.
    pub fn complete_with(
        &mut self,
        ticket: FetchTicket,
        merge: impl FnOnce(Option<T>) -> T,
    ) -> Result<&T> {
        let latest = self.generation.latest();
        if ticket.generation != latest {
            log::debug!(
                "Discarding stale fetch result (generation {}, latest {})",
                ticket.generation,
                latest
            );
            return Err(AppError::StaleGeneration {
                stale: ticket.generation,
                latest,
            });
        }
        let value = merge(self.current.take());
        Ok(self.current.insert(value))
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// In-place edits (filter, page) of the accepted value.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut()
    }

    /// Handle for tasks that need to check staleness themselves.
    pub fn generation(&self) -> FetchGeneration {
        self.generation.clone()
    }
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(result: Result<Vec<u32>>) -> ViewOutcome<Vec<u32>> {
        ViewOutcome::from_result(result, &Messages::default(), Vec::is_empty)
    }

    #[test]
    fn test_error_taxonomy_mapping() {
        assert!(outcome(Ok(vec![1])).is_ready());
        assert_eq!(
            outcome(Ok(vec![])),
            ViewOutcome::Empty("No hay datos disponibles".into())
        );
        assert!(matches!(
            outcome(Err(AppError::Unauthenticated)),
            ViewOutcome::RedirectToLogin(_)
        ));
        assert_eq!(
            outcome(Err(AppError::access_denied("Lector"))),
            ViewOutcome::Denied("Acceso denegado".into())
        );
        assert_eq!(
            outcome(Err(AppError::role_resolution("u-1", "timeout"))),
            ViewOutcome::Denied("Acceso denegado".into())
        );
    }

    #[test]
    fn test_fetch_failure_is_distinct_from_empty() {
        let failed = outcome(Err(AppError::fetch("libros", "connection reset")));
        let message = failed.message().unwrap();
        assert!(matches!(failed, ViewOutcome::Failed(_)));
        assert!(message.starts_with("Error al cargar los datos"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut state: ViewState<&str> = ViewState::new();
        let first = state.begin();
        let second = state.begin();

        assert_eq!(*state.complete(second, "new").unwrap(), "new");
        assert!(matches!(
            state.complete(first, "old"),
            Err(AppError::StaleGeneration { stale: 1, latest: 2 })
        ));
        assert_eq!(state.current(), Some(&"new"));
    }

    #[test]
    fn test_complete_with_merges_into_previous() {
        let mut state: ViewState<Vec<u8>> = ViewState::new();
        let first = state.begin();
        state.complete(first, vec![1]).unwrap();

        let stale = state.begin();
        let current = state.begin();
        assert!(state.complete_with(stale, |_| vec![9]).is_err());
        let merged = state
            .complete_with(current, |prev| {
                let mut v = prev.unwrap_or_default();
                v.push(2);
                v
            })
            .unwrap();
        assert_eq!(merged, &vec![1, 2]);
    }

    #[test]
    fn test_shared_generation_handle() {
        let state: ViewState<u8> = ViewState::new();
        let handle = state.generation();
        let ticket = state.begin();
        assert!(handle.is_current(ticket));
        handle.begin();
        assert!(!handle.is_current(ticket));
        assert_eq!(ticket.generation(), 1);
    }
}
