//! Score aggregation and weekly rankings.
//!
//! Scores are never stored: they are recomputed from the event log on every
//! read. Weekly figures only count events inside the ISO week (Monday to
//! Sunday) containing a reference instant; lifetime figures count everything.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{event::PointEvent, role::Role, user::User};

// ─── Window ──────────────────────────────────────────────────────────────────

/// An inclusive time range covering one Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
  /// Monday 00:00:00.000 in the reference's time zone.
  pub start: DateTime<Utc>,
  /// Sunday 23:59:59.999 in the reference's time zone.
  pub end:   DateTime<Utc>,
}

impl WeekWindow {
  /// The week containing `reference`, with day boundaries taken in the
  /// reference's own time zone.
  pub fn containing<Tz: TimeZone>(reference: &DateTime<Tz>) -> Self {
    let tz = reference.timezone();
    let date = reference.naive_local().date();
    let monday =
      date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let next_monday = monday + Duration::days(7);

    Self {
      start: local_midnight(&tz, monday),
      end:   local_midnight(&tz, next_monday) - Duration::milliseconds(1),
    }
  }

  /// Inclusive on both bounds.
  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    self.start <= instant && instant <= self.end
  }
}

/// Midnight of `date` in `tz`. When midnight does not exist locally (a DST
/// gap) the naive time is read as UTC.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
  let naive = date.and_time(NaiveTime::MIN);
  tz.from_local_datetime(&naive)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// Sum of points targeting `user_id` inside `window`. Zero when nothing
/// matches.
pub fn weekly_score(user_id: &str, events: &[PointEvent], window: &WeekWindow) -> i64 {
  events
    .iter()
    .filter(|e| e.target_user_id == user_id && window.contains(e.date_time))
    .map(|e| i64::from(e.points))
    .sum()
}

/// Sum of every point ever targeting `user_id`.
pub fn lifetime_score(user_id: &str, events: &[PointEvent]) -> i64 {
  events
    .iter()
    .filter(|e| e.target_user_id == user_id)
    .map(|e| i64::from(e.points))
    .sum()
}

// ─── Rankings ────────────────────────────────────────────────────────────────

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry<'a> {
  pub user:  &'a User,
  pub score: i64,
}

/// Weekly leaderboard of active adults, best first.
///
/// Every active adult appears, zero-event users included. Events targeting
/// unknown or inactive users are ignored. Ties keep the order of `users`.
pub fn ranked_list<'a>(
  users: &'a [User],
  events: &[PointEvent],
  role: Option<Role>,
  window: &WeekWindow,
) -> Vec<RankedEntry<'a>> {
  let mut entries: Vec<RankedEntry<'a>> = users
    .iter()
    .filter(|u| u.active && u.role.is_adult())
    .map(|user| RankedEntry { user, score: 0 })
    .collect();

  let index: HashMap<&str, usize> = entries
    .iter()
    .enumerate()
    .map(|(i, e)| (e.user.id.as_str(), i))
    .collect();

  for event in events.iter().filter(|e| window.contains(e.date_time)) {
    if let Some(&i) = index.get(event.target_user_id.as_str()) {
      entries[i].score += i64::from(event.points);
    }
  }

  if let Some(role) = role {
    entries.retain(|e| e.user.role == role);
  }

  // `sort_by` is stable.
  entries.sort_by(|a, b| b.score.cmp(&a.score));
  entries
}

/// Entries in the global top chart.
pub const CHART_LIMIT: usize = 5;

/// The leaderboards shown together on the rankings board.
#[derive(Debug, Clone, Serialize)]
pub struct Rankings<'a> {
  pub window:      WeekWindow,
  pub all:         Vec<RankedEntry<'a>>,
  pub teachers:    Vec<RankedEntry<'a>>,
  pub supervisors: Vec<RankedEntry<'a>>,
  pub direction:   Vec<RankedEntry<'a>>,
}

impl<'a> Rankings<'a> {
  pub fn compute(users: &'a [User], events: &[PointEvent], window: WeekWindow) -> Self {
    Self {
      window,
      all: ranked_list(users, events, None, &window),
      teachers: ranked_list(users, events, Some(Role::Teacher), &window),
      supervisors: ranked_list(users, events, Some(Role::Supervisor), &window),
      direction: ranked_list(users, events, Some(Role::Direction), &window),
    }
  }

  /// The first `n` global entries (the chart feed).
  pub fn top(&self, n: usize) -> &[RankedEntry<'a>] {
    &self.all[..n.min(self.all.len())]
  }
}

// ─── Drill-down ──────────────────────────────────────────────────────────────

/// An adult's best and worst events over their whole history.
#[derive(Debug, Clone, Serialize)]
pub struct Highlights<'a> {
  /// Highest points first.
  pub positives: Vec<&'a PointEvent>,
  /// Most negative first.
  pub negatives: Vec<&'a PointEvent>,
}

/// Default number of events per side in [`highlights`].
pub const HIGHLIGHTS_LIMIT: usize = 10;

/// Top `n` positive and top `n` negative events targeting `user_id`.
/// Zero-point events are in neither list.
pub fn highlights<'a>(user_id: &str, events: &'a [PointEvent], n: usize) -> Highlights<'a> {
  let targeting = || events.iter().filter(move |e| e.target_user_id == user_id);

  let mut positives: Vec<&PointEvent> = targeting().filter(|e| e.points > 0).collect();
  positives.sort_by(|a, b| b.points.cmp(&a.points));
  positives.truncate(n);

  let mut negatives: Vec<&PointEvent> = targeting().filter(|e| e.points < 0).collect();
  negatives.sort_by(|a, b| a.points.cmp(&b.points));
  negatives.truncate(n);

  Highlights { positives, negatives }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Best-scoring target of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
  pub user_id:   String,
  pub full_name: String,
  pub score:     i64,
}

/// Per-actor summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  /// Events the actor logged this week; students and the administrator only.
  pub actions_given_this_week: Option<usize>,
  /// The actor's own weekly score; adults only.
  pub my_weekly_score:         Option<i64>,
  /// `None` when nobody received points this week, or when the leader no
  /// longer resolves to a user.
  pub weekly_leader:           Option<Leader>,
}

pub fn dashboard(
  actor: &User,
  users: &[User],
  events: &[PointEvent],
  window: &WeekWindow,
) -> DashboardStats {
  let this_week: Vec<&PointEvent> =
    events.iter().filter(|e| window.contains(e.date_time)).collect();

  let actions_given_this_week = matches!(actor.role, Role::Student | Role::Admin)
    .then(|| this_week.iter().filter(|e| e.created_by_id == actor.id).count());

  let my_weekly_score = actor
    .role
    .is_adult()
    .then(|| weekly_score(&actor.id, events, window));

  // Totals in first-encounter order; the first strict maximum wins.
  let mut totals: Vec<(&str, i64)> = Vec::new();
  for e in &this_week {
    match totals.iter_mut().find(|(id, _)| *id == e.target_user_id) {
      Some((_, score)) => *score += i64::from(e.points),
      None => totals.push((e.target_user_id.as_str(), i64::from(e.points))),
    }
  }
  let mut best: Option<(&str, i64)> = None;
  for (id, score) in totals {
    if best.is_none_or(|(_, top)| score > top) {
      best = Some((id, score));
    }
  }

  let weekly_leader = best.and_then(|(id, score)| {
    users.iter().find(|u| u.id == id).map(|u| Leader {
      user_id: u.id.clone(),
      full_name: u.full_name.clone(),
      score,
    })
  });

  DashboardStats { actions_given_this_week, my_weekly_score, weekly_leader }
}

#[cfg(test)]
mod tests {
  use chrono::FixedOffset;

  use super::*;

  fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
  }

  fn event(target: &str, points: i32, when: &str) -> PointEvent {
    PointEvent::custom("s1", target, "test", points, at(when))
  }

  fn adult(id: &str, role: Role) -> User { User::new(id, format!("Adulte {id}"), role) }

  // Wednesday 2026-10-14.
  fn window() -> WeekWindow { WeekWindow::containing(&at("2026-10-14T10:00:00Z")) }

  #[test]
  fn window_spans_monday_to_sunday() {
    let w = window();
    assert_eq!(w.start, at("2026-10-12T00:00:00Z"));
    assert_eq!(w.end, at("2026-10-18T23:59:59.999Z"));
    assert!(w.contains(at("2026-10-12T00:00:00Z")));
    assert!(w.contains(at("2026-10-18T23:59:59.999Z")));
    assert!(!w.contains(at("2026-10-11T23:59:59.999Z")));
    assert!(!w.contains(at("2026-10-19T00:00:00Z")));
  }

  #[test]
  fn window_on_a_monday_and_a_sunday() {
    let monday = WeekWindow::containing(&at("2026-10-12T00:00:00Z"));
    let sunday = WeekWindow::containing(&at("2026-10-18T23:00:00Z"));
    assert_eq!(monday, window());
    assert_eq!(sunday, window());
  }

  #[test]
  fn window_follows_reference_time_zone() {
    let paris = FixedOffset::east_opt(2 * 3600).unwrap();
    // Monday 01:00 in Paris is still Sunday in UTC.
    let reference = paris.with_ymd_and_hms(2026, 10, 12, 1, 0, 0).unwrap();
    let w = WeekWindow::containing(&reference);
    assert_eq!(w.start, at("2026-10-11T22:00:00Z"));
    assert_eq!(w.end, at("2026-10-18T21:59:59.999Z"));
  }

  #[test]
  fn weekly_score_counts_only_the_window() {
    let events = vec![
      event("t1", 5, "2026-10-12T08:00:00Z"),
      event("t1", -2, "2026-10-18T20:00:00Z"),
      event("t1", 10, "2026-10-05T08:00:00Z"),
      event("t2", 3, "2026-10-13T08:00:00Z"),
    ];
    assert_eq!(weekly_score("t1", &events, &window()), 3);
    assert_eq!(weekly_score("nobody", &events, &window()), 0);
    assert_eq!(lifetime_score("t1", &events), 13);
  }

  #[test]
  fn lifetime_score_is_order_independent() {
    let mut events = vec![
      event("t1", 5, "2026-10-12T08:00:00Z"),
      event("t1", -7, "2025-01-01T08:00:00Z"),
      event("t2", 1, "2026-10-13T08:00:00Z"),
      event("t1", 4, "2024-03-01T08:00:00Z"),
    ];
    let forward = lifetime_score("t1", &events);
    events.reverse();
    assert_eq!(forward, 2);
    assert_eq!(lifetime_score("t1", &events), forward);
  }

  #[test]
  fn extreme_point_values_sum_without_overflow() {
    let events = vec![
      event("t1", i32::MAX, "2026-10-13T08:00:00Z"),
      event("t1", 5, "2026-10-14T08:00:00Z"),
      event("t2", i32::MIN, "2026-10-14T08:00:00Z"),
      event("t2", -5, "2026-10-14T09:00:00Z"),
    ];
    let expected = i64::from(i32::MAX) + 5;
    assert_eq!(weekly_score("t1", &events, &window()), expected);
    assert_eq!(lifetime_score("t1", &events), expected);
    assert_eq!(lifetime_score("t2", &events), i64::from(i32::MIN) - 5);

    let users = vec![adult("t1", Role::Teacher), adult("t2", Role::Teacher)];
    let list = ranked_list(&users, &events, None, &window());
    assert_eq!(list[0].score, expected);
    assert_eq!(list[1].score, i64::from(i32::MIN) - 5);

    let stats = dashboard(&users[0], &users, &events, &window());
    assert_eq!(stats.my_weekly_score, Some(expected));
    assert_eq!(stats.weekly_leader.map(|l| l.score), Some(expected));
  }

  #[test]
  fn ranked_list_includes_zero_score_adults_once() {
    let mut inactive = adult("t3", Role::Teacher);
    inactive.active = false;
    let users = vec![
      adult("t1", Role::Teacher),
      adult("t2", Role::Teacher),
      adult("sv1", Role::Supervisor),
      inactive,
      User::new("s1", "Lucas", Role::Student),
    ];
    let events = vec![
      event("t2", 5, "2026-10-13T08:00:00Z"),
      event("sv1", -3, "2026-10-13T08:00:00Z"),
      event("t3", 50, "2026-10-13T08:00:00Z"),
      event("deleted", 99, "2026-10-13T08:00:00Z"),
    ];

    let list = ranked_list(&users, &events, None, &window());
    let rows: Vec<(&str, i64)> = list.iter().map(|e| (e.user.id.as_str(), e.score)).collect();
    assert_eq!(rows, [("t2", 5), ("t1", 0), ("sv1", -3)]);
    assert!(list.windows(2).all(|w| w[0].score >= w[1].score));
  }

  #[test]
  fn ranked_list_ties_keep_user_order() {
    let users = vec![
      adult("a", Role::Teacher),
      adult("b", Role::Direction),
      adult("c", Role::Supervisor),
    ];
    let events = vec![
      event("c", 2, "2026-10-13T08:00:00Z"),
      event("a", 2, "2026-10-13T08:00:00Z"),
    ];
    let list = ranked_list(&users, &events, None, &window());
    let ids: Vec<&str> = list.iter().map(|e| e.user.id.as_str()).collect();
    assert_eq!(ids, ["a", "c", "b"]);
  }

  #[test]
  fn rankings_partition_by_role() {
    let users = vec![
      adult("t1", Role::Teacher),
      adult("sv1", Role::Supervisor),
      adult("d1", Role::Direction),
      adult("t2", Role::Teacher),
    ];
    let events = vec![event("t2", 4, "2026-10-13T08:00:00Z")];
    let r = Rankings::compute(&users, &events, window());

    assert_eq!(r.all.len(), 4);
    let teachers: Vec<&str> = r.teachers.iter().map(|e| e.user.id.as_str()).collect();
    assert_eq!(teachers, ["t2", "t1"]);
    assert_eq!(r.supervisors.len(), 1);
    assert_eq!(r.direction.len(), 1);
    assert_eq!(r.top(2).len(), 2);
    assert_eq!(r.top(10).len(), 4);
  }

  #[test]
  fn highlights_sort_each_side_and_truncate() {
    let events = vec![
      event("t1", 3, "2026-10-13T08:00:00Z"),
      event("t1", -2, "2026-10-13T08:00:00Z"),
      event("t1", 10, "2020-01-01T08:00:00Z"),
      event("t1", -10, "2026-10-13T08:00:00Z"),
      event("t1", 0, "2026-10-13T08:00:00Z"),
      event("t1", 5, "2026-10-13T08:00:00Z"),
      event("t2", 50, "2026-10-13T08:00:00Z"),
    ];
    let h = highlights("t1", &events, 2);
    let pos: Vec<i32> = h.positives.iter().map(|e| e.points).collect();
    let neg: Vec<i32> = h.negatives.iter().map(|e| e.points).collect();
    assert_eq!(pos, [10, 5]);
    assert_eq!(neg, [-10, -2]);
  }

  #[test]
  fn dashboard_depends_on_role() {
    let users = vec![
      adult("t1", Role::Teacher),
      adult("t2", Role::Teacher),
      User::new("s1", "Lucas", Role::Student),
    ];
    let events = vec![
      event("t1", 5, "2026-10-13T08:00:00Z"),
      event("t2", 5, "2026-10-13T09:00:00Z"),
      event("t2", 1, "2026-10-01T09:00:00Z"),
    ];

    let student = dashboard(&users[2], &users, &events, &window());
    assert_eq!(student.actions_given_this_week, Some(2));
    assert_eq!(student.my_weekly_score, None);
    assert_eq!(student.weekly_leader.as_ref().map(|l| l.user_id.as_str()), Some("t1"));

    let teacher = dashboard(&users[1], &users, &events, &window());
    assert_eq!(teacher.actions_given_this_week, None);
    assert_eq!(teacher.my_weekly_score, Some(5));
  }

  #[test]
  fn dashboard_without_events_has_no_leader() {
    let users = vec![adult("t1", Role::Teacher)];
    let stats = dashboard(&users[0], &users, &[], &window());
    assert_eq!(stats.weekly_leader, None);
    assert_eq!(stats.my_weekly_score, Some(0));
  }
}
