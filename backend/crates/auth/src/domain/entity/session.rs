//! Session Entity
//!
//! One device/browser login. Sessions slide forward while in use and are
//! dead once `expires_at` has passed, whether or not the row still exists.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::value_object::{SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    /// `None` is treated as already expired
    pub expires_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: UserId,
        user_agent: Option<String>,
        ip: Option<String>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            user_agent,
            ip,
            expires_at: Some(expires_at),
            last_activity_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at <= now)
    }

    /// True once less than half of `window` remains.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.expires_at
            .is_some_and(|expires_at| {
                expires_at
                    .checked_sub_signed(window / 2)
                    .is_none_or(|threshold| now >= threshold)
            })
    }

    /// Push `expires_at` to `now + window`, saturating at the latest
    /// representable instant. Never moves it backwards.
    pub fn extend_at(&mut self, now: DateTime<Utc>, window: Duration) {
        let candidate = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_at = Some(match self.expires_at {
            Some(current) => current.max(candidate),
            None => candidate,
        });
        self.updated_at = now;
    }

    pub fn touch_at(&mut self, now: DateTime<Utc>, ip: Option<String>) {
        self.last_activity_at = Some(now);
        if ip.is_some() {
            self.ip = ip;
        }
        self.updated_at = now;
    }

    pub fn summary(&self, current: Option<&SessionId>) -> SessionSummary {
        SessionSummary {
            id: self.id,
            user_agent: self.user_agent.clone(),
            ip: self.ip.clone(),
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
            created_at: self.created_at,
            is_current: current == Some(&self.id),
        }
    }
}

/// Session as shown to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>, ttl: Duration) -> Session {
        Session::new(UserId::new(), None, None, now + ttl, now)
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let s = session(now, Duration::hours(1));
        assert!(!s.is_expired_at(now));
        assert!(s.is_expired_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_null_expiry_is_dead() {
        let now = Utc::now();
        let mut s = session(now, Duration::hours(1));
        s.expires_at = None;
        assert!(s.is_expired_at(now));
        assert!(!s.needs_refresh_at(now, Duration::days(30)));
    }

    #[test]
    fn test_refresh_threshold_is_half_window() {
        let now = Utc::now();
        let window = Duration::days(30);
        let s = session(now, window);
        let threshold = now + Duration::days(15);

        assert!(!s.needs_refresh_at(threshold - Duration::seconds(1), window));
        assert!(s.needs_refresh_at(threshold, window));
    }

    #[test]
    fn test_extend_never_shrinks() {
        let now = Utc::now();
        let mut s = session(now, Duration::days(30));
        let before = s.expires_at;

        s.extend_at(now, Duration::days(1));
        assert_eq!(s.expires_at, before);

        s.extend_at(now + Duration::days(20), Duration::days(30));
        assert_eq!(s.expires_at, Some(now + Duration::days(50)));
    }

    #[test]
    fn test_oversized_window_does_not_overflow() {
        let now = Utc::now();
        let mut s = session(now, Duration::days(1));
        assert!(s.needs_refresh_at(now, Duration::MAX));

        s.extend_at(now, Duration::MAX);
        assert_eq!(s.expires_at, Some(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_touch_keeps_ip_when_absent() {
        let now = Utc::now();
        let mut s = session(now, Duration::days(1));
        s.touch_at(now, Some("10.0.0.1".into()));
        s.touch_at(now + Duration::minutes(1), None);
        assert_eq!(s.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(s.last_activity_at, Some(now + Duration::minutes(1)));
    }

    #[test]
    fn test_summary_marks_current() {
        let now = Utc::now();
        let s = session(now, Duration::days(1));
        assert!(s.summary(Some(&s.id)).is_current);
        assert!(!s.summary(Some(&SessionId::new())).is_current);
        assert!(!s.summary(None).is_current);
    }
}
