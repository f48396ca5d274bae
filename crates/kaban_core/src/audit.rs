//! Audit stamping and request identity.
//!
//! # Responsibility
//! - Resolve the acting user and the request time once per request.
//! - Carry both explicitly into every write as a [`RequestContext`].
//! - Describe the creator/modifier trail persisted on auditable rows.
//!
//! # Invariants
//! - `created_by`/`created_at` are written once, at insertion.
//! - `last_modified_by`/`last_modified_at` change on every later update.
//! - Soft-delete stamps nothing.
//! - An absent actor is valid and is recorded as `None`.

use crate::model::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the authenticated user for the current request.
pub trait IdentityProvider {
    fn current_actor(&self) -> Option<UserId>;
}

/// Identity provider for unauthenticated or test contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_actor(&self) -> Option<UserId> {
        None
    }
}

/// Identity provider that always reports one user.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub UserId);

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Option<UserId> {
        Some(self.0)
    }
}

/// Time source for audit and archival timestamps.
pub trait Clock {
    fn now_epoch_ms(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or_default()
    }
}

/// Settable clock for deterministic tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) -> Timestamp {
        self.now.fetch_add(millis, Ordering::SeqCst) + millis
    }
}

impl Clock for ManualClock {
    fn now_epoch_ms(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Per-request actor and time, resolved once and passed into every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    actor: Option<UserId>,
    now: Timestamp,
}

impl RequestContext {
    pub fn new(actor: Option<UserId>, now: Timestamp) -> Self {
        Self { actor, now }
    }

    /// Asks the identity provider and the clock exactly once.
    pub fn resolve(identity: &dyn IdentityProvider, clock: &dyn Clock) -> Self {
        Self::new(identity.current_actor(), clock.now_epoch_ms())
    }

    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }
}

/// Creator/modifier trail persisted on boards, lists, cards and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_by: Option<UserId>,
    pub created_at: Timestamp,
    pub last_modified_by: Option<UserId>,
    pub last_modified_at: Option<Timestamp>,
}

impl AuditTrail {
    /// Trail for a row inserted under `ctx`.
    pub fn created(ctx: &RequestContext) -> Self {
        Self {
            created_by: ctx.actor(),
            created_at: ctx.now(),
            last_modified_by: None,
            last_modified_at: None,
        }
    }

    /// Stamps a modification, leaving the creation half untouched.
    pub fn record_modification(&mut self, ctx: &RequestContext) {
        self.last_modified_by = ctx.actor();
        self.last_modified_at = Some(ctx.now());
    }
}

#[cfg(test)]
mod tests {
    use super::{Anonymous, AuditTrail, Clock, ManualClock, RequestContext, StaticIdentity};
    use uuid::Uuid;

    #[test]
    fn resolve_reads_actor_and_clock_once() {
        let clock = ManualClock::new(1_000);
        let actor = Uuid::new_v4();

        let ctx = RequestContext::resolve(&StaticIdentity(actor), &clock);
        clock.advance(50);

        assert_eq!(ctx.actor(), Some(actor));
        assert_eq!(ctx.now(), 1_000);
        assert_eq!(clock.now_epoch_ms(), 1_050);
    }

    #[test]
    fn anonymous_context_has_no_actor() {
        let ctx = RequestContext::resolve(&Anonymous, &ManualClock::new(5));
        assert_eq!(ctx.actor(), None);
    }

    #[test]
    fn modification_never_touches_creation_stamp() {
        let creator = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let mut trail = AuditTrail::created(&RequestContext::new(Some(creator), 10));

        trail.record_modification(&RequestContext::new(Some(editor), 20));

        assert_eq!(trail.created_by, Some(creator));
        assert_eq!(trail.created_at, 10);
        assert_eq!(trail.last_modified_by, Some(editor));
        assert_eq!(trail.last_modified_at, Some(20));
    }
}
