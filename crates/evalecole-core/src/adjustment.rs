//! Administrative score correction.
//!
//! The event log is append-only, so setting a user's total to a new value
//! means appending one compensating event for the difference.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{event::PointEvent, scoring::lifetime_score};

/// `created_by_id` of every adjustment event.
pub const ADMIN_ADJUST_ACTOR: &str = "admin_adjust";

/// Label of every adjustment event.
pub const ADJUSTMENT_LABEL: &str = "Ajustement administratif du score";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustmentError {
  /// The difference does not fit in a single event's points.
  #[error("cannot move the score from {current} to {requested}: the difference is too large")]
  DeltaOutOfRange { current: i64, requested: i64 },
}

/// The compensating event that brings `target_id`'s lifetime score to
/// `new_total`, or `None` when it is already there.
pub fn plan_adjustment(
  target_id: &str,
  events: &[PointEvent],
  new_total: i64,
  now: DateTime<Utc>,
) -> Result<Option<PointEvent>, AdjustmentError> {
  let current = lifetime_score(target_id, events);
  let delta = new_total
    .checked_sub(current)
    .and_then(|d| i32::try_from(d).ok())
    .ok_or(AdjustmentError::DeltaOutOfRange { current, requested: new_total })?;
  Ok((delta != 0).then(|| {
    PointEvent::custom(ADMIN_ADJUST_ACTOR, target_id, ADJUSTMENT_LABEL, delta, now)
  }))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap() }

  fn history() -> Vec<PointEvent> {
    vec![
      PointEvent::custom("s1", "t1", "Aide", 5, now()),
      PointEvent::custom("s2", "t1", "Aide", 5, now()),
      PointEvent::custom("s2", "t2", "Retard", -2, now()),
    ]
  }

  #[test]
  fn unchanged_total_appends_nothing() {
    assert!(plan_adjustment("t1", &history(), 10, now()).unwrap().is_none());
  }

  #[test]
  fn lowering_the_total_appends_the_difference() {
    let event = plan_adjustment("t1", &history(), 4, now()).unwrap().unwrap();
    assert_eq!(event.points, -6);
    assert_eq!(event.created_by_id, ADMIN_ADJUST_ACTOR);
    assert_eq!(event.action.custom_label(), Some(ADJUSTMENT_LABEL));
    assert_eq!(event.action.action_id(), None);
    assert_eq!(event.student_id, None);
    assert_eq!(event.target_user_id, "t1");
  }

  #[test]
  fn applying_the_plan_reaches_the_target_total() {
    let mut events = history();
    let event = plan_adjustment("t2", &events, 7, now()).unwrap().unwrap();
    assert_eq!(event.points, 9);
    events.push(event);
    assert_eq!(lifetime_score("t2", &events), 7);
  }

  #[test]
  fn user_without_events_starts_from_zero() {
    let event = plan_adjustment("nobody", &[], -3, now()).unwrap().unwrap();
    assert_eq!(event.points, -3);
  }

  #[test]
  fn delta_beyond_one_event_is_rejected() {
    let err = plan_adjustment("t1", &history(), i64::from(i32::MAX) + 11, now()).unwrap_err();
    assert_eq!(
      err,
      AdjustmentError::DeltaOutOfRange { current: 10, requested: i64::from(i32::MAX) + 11 }
    );
    assert!(plan_adjustment("t1", &history(), i64::MIN, now()).is_err());
    assert!(plan_adjustment("t2", &history(), i64::MAX, now()).is_err());
  }

  #[test]
  fn large_adjustment_keeps_later_scores_computable() {
    let mut events = vec![PointEvent::custom("s1", "t1", "Retard", -10, now())];
    let event = plan_adjustment("t1", &events, i64::from(i32::MAX) - 10, now()).unwrap().unwrap();
    assert_eq!(event.points, i32::MAX);
    events.push(event);
    events.push(PointEvent::custom("s1", "t1", "Aide", 5, now()));
    assert_eq!(lifetime_score("t1", &events), i64::from(i32::MAX) - 5);
  }
}
