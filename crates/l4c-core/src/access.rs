//! The access gate: whether a user may use a gated feature or template right
//! now, and whether a trial offer should be shown.
//!
//! Everything here is pure. Time is passed in so callers (and tests) control
//! the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  subscription::{Subscription, SubscriptionStatus},
  template::TemplateId,
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// The outcome of [`evaluate_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
  pub has_access:      bool,
  /// True only when no subscription row exists: one trial per subject.
  pub can_start_trial: bool,
  pub is_trial:        bool,
  /// Whole days remaining in the trial, rounded up.
  pub days_left:       Option<i64>,
  pub usage_count:     i64,
  pub usage_limit:     i64,
}

impl AccessDecision {
  /// The decision for a subject the user has never touched.
  pub const FREE_TIER: Self = Self {
    has_access:      false,
    can_start_trial: true,
    is_trial:        false,
    days_left:       None,
    usage_count:     0,
    usage_limit:     0,
  };

  /// Whether one more unit of metered usage would still fit the quota.
  pub fn usage_available(&self) -> bool {
    self.usage_limit == 0 || self.usage_count < self.usage_limit
  }
}

/// Decide access from the subscription row for (user, subject), if any.
///
/// Trial and paid windows are half-open: access ends at the instant
/// `trial_end` (or `subscription_end`) is reached.
pub fn evaluate_access(
  row: Option<&Subscription>,
  now: DateTime<Utc>,
) -> AccessDecision {
  let Some(row) = row else {
    return AccessDecision::FREE_TIER;
  };

  let denied = AccessDecision {
    has_access:      false,
    can_start_trial: false,
    is_trial:        false,
    days_left:       None,
    usage_count:     row.usage_count,
    usage_limit:     row.usage_limit,
  };

  match row.status {
    SubscriptionStatus::Trial => match row.trial_end {
      Some(end) if now < end => AccessDecision {
        has_access: true,
        is_trial: true,
        days_left: Some(days_until(now, end)),
        ..denied
      },
      _ => denied,
    },
    SubscriptionStatus::Active => match row.subscription_end {
      Some(end) if now >= end => denied,
      // No end date means billing has not scheduled one.
      _ => AccessDecision { has_access: true, ..denied },
    },
    SubscriptionStatus::Expired | SubscriptionStatus::Cancelled => denied,
  }
}

/// `ceil((end - now) / 1 day)`; callers guarantee `now < end`.
fn days_until(now: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
  let millis = (end - now).num_milliseconds();
  (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// The template actually used to render a page.
///
/// `stored` is the owner's saved identifier; `decision` is the gate outcome
/// for that template, consulted only when it is premium.
pub fn effective_template(
  stored: &str,
  decision: Option<&AccessDecision>,
) -> TemplateId {
  let id = TemplateId::resolve(stored);
  if !id.is_premium() {
    return id;
  }
  match decision {
    Some(d) if d.has_access => id,
    _ => TemplateId::default(),
  }
}
