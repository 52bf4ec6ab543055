//! The point-submission flow.
//!
//! A client walks [`SubmissionFlow`] through target selection, action
//! selection and, for free-text actions, the custom details. The flow yields
//! an [`EventRequest`]; the side holding the authoritative user collection
//! turns it into a [`PointEvent`] with [`EventRequest::into_event`], which
//! re-checks every eligibility rule.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  catalog::ActionCatalog,
  event::PointEvent,
  role::Role,
  user::User,
  visibility::{eligible_actions, eligible_targets},
};

/// How long the success state stays on screen before the flow resets.
pub const CONFIRMATION_DELAY: Duration = Duration::from_millis(1500);

// ─── Custom points ───────────────────────────────────────────────────────────

/// A point value for a free-text action: one of ±1 to ±5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CustomPoints(i32);

impl CustomPoints {
  /// The selectable values, positives first.
  pub const ALL: [CustomPoints; 10] = [
    CustomPoints(1),
    CustomPoints(2),
    CustomPoints(3),
    CustomPoints(4),
    CustomPoints(5),
    CustomPoints(-1),
    CustomPoints(-2),
    CustomPoints(-3),
    CustomPoints(-4),
    CustomPoints(-5),
  ];

  pub fn new(value: i32) -> Option<Self> {
    (value != 0 && (-5..=5).contains(&value)).then_some(Self(value))
  }

  pub fn value(self) -> i32 { self.0 }
}

impl TryFrom<i32> for CustomPoints {
  type Error = SubmissionError;

  fn try_from(value: i32) -> Result<Self, Self::Error> {
    Self::new(value).ok_or(SubmissionError::InvalidPoints(value))
  }
}

impl From<CustomPoints> for i32 {
  fn from(p: CustomPoints) -> Self { p.0 }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
  #[error("no target selected")]
  NoTarget,
  #[error("no action selected")]
  NoAction,
  #[error("the custom action needs a label")]
  EmptyLabel,
  #[error("the custom action needs a point value")]
  MissingPoints,
  #[error("invalid custom point value: {0} (expected ±1 to ±5)")]
  InvalidPoints(i32),
  #[error("a submission is already in flight")]
  InFlight,
  #[error("{0} cannot submit points")]
  ReadOnly(Role),
  #[error("target {0} is not eligible")]
  TargetNotEligible(String),
  #[error("action {0} does not apply to this target")]
  ActionNotEligible(String),
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// The action part of an [`EventRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestedAction {
  Catalog { action_id: String },
  Custom { label: String, points: CustomPoints },
}

/// What a client asks to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
  pub target_user_id: String,
  pub action:         RequestedAction,
}

impl EventRequest {
  /// Validate against the current users and build the event to append.
  ///
  /// Catalog actions copy the definition's default points. When the actor
  /// is a student the event records them as the originating student.
  pub fn into_event<C: ActionCatalog + ?Sized>(
    self,
    actor: &User,
    users: &[User],
    catalog: &C,
    now: DateTime<Utc>,
  ) -> Result<PointEvent, SubmissionError> {
    if !crate::navigation::Route::AddPoints.permits(actor.role) {
      return Err(SubmissionError::ReadOnly(actor.role));
    }

    let target = eligible_targets(actor, users, None)
      .into_iter()
      .find(|u| u.id == self.target_user_id)
      .ok_or_else(|| SubmissionError::TargetNotEligible(self.target_user_id.clone()))?;

    let event = match self.action {
      RequestedAction::Catalog { action_id } => {
        let action = eligible_actions(catalog, target)
          .into_iter()
          .find(|a| a.id == action_id)
          .ok_or(SubmissionError::ActionNotEligible(action_id))?;
        PointEvent::from_catalog(&actor.id, &target.id, action, now)
      }
      RequestedAction::Custom { label, points } => {
        let label = label.trim();
        if label.is_empty() {
          return Err(SubmissionError::EmptyLabel);
        }
        PointEvent::custom(&actor.id, &target.id, label, points.value(), now)
      }
    };

    Ok(if actor.role == Role::Student {
      event.with_student(&actor.id)
    } else {
      event
    })
  }
}

// ─── Flow ────────────────────────────────────────────────────────────────────

/// What the user picked in the action step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionChoice {
  Catalog(String),
  Custom,
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
  SelectingTarget,
  SelectingAction,
  CustomDetails,
  Submitting,
  Success,
}

/// Client-local state of one submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionFlow {
  target_id:     Option<String>,
  action:        Option<ActionChoice>,
  custom_label:  String,
  custom_points: Option<CustomPoints>,
  submitting:    bool,
  succeeded:     bool,
  last_error:    Option<String>,
}

impl SubmissionFlow {
  pub fn new() -> Self { Self::default() }

  pub fn stage(&self) -> SubmissionStage {
    if self.succeeded {
      SubmissionStage::Success
    } else if self.submitting {
      SubmissionStage::Submitting
    } else if self.target_id.is_none() {
      SubmissionStage::SelectingTarget
    } else if self.action == Some(ActionChoice::Custom) {
      SubmissionStage::CustomDetails
    } else {
      SubmissionStage::SelectingAction
    }
  }

  fn locked(&self) -> bool { self.submitting || self.succeeded }

  pub fn target_id(&self) -> Option<&str> { self.target_id.as_deref() }

  pub fn action(&self) -> Option<&ActionChoice> { self.action.as_ref() }

  pub fn custom_label(&self) -> &str { &self.custom_label }

  pub fn custom_points(&self) -> Option<CustomPoints> { self.custom_points }

  pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

  /// Pick a target. Any previous action choice is dropped.
  pub fn select_target(&mut self, target_id: impl Into<String>) {
    if self.locked() {
      return;
    }
    self.target_id = Some(target_id.into());
    self.action = None;
    self.last_error = None;
  }

  /// Pick an action for the selected target. Choosing the free-text action
  /// clears any previously chosen point value.
  pub fn select_action(&mut self, choice: ActionChoice) {
    if self.locked() || self.target_id.is_none() {
      return;
    }
    if choice == ActionChoice::Custom {
      self.custom_points = None;
    }
    self.action = Some(choice);
    self.last_error = None;
  }

  pub fn set_custom_label(&mut self, label: impl Into<String>) {
    if !self.locked() {
      self.custom_label = label.into();
    }
  }

  pub fn set_custom_points(&mut self, points: CustomPoints) {
    if !self.locked() {
      self.custom_points = Some(points);
    }
  }

  /// The request the current selection would submit.
  pub fn request(&self) -> Result<EventRequest, SubmissionError> {
    let target_user_id = self.target_id.clone().ok_or(SubmissionError::NoTarget)?;
    let action = match self.action.as_ref().ok_or(SubmissionError::NoAction)? {
      ActionChoice::Catalog(action_id) => {
        RequestedAction::Catalog { action_id: action_id.clone() }
      }
      ActionChoice::Custom => {
        let label = self.custom_label.trim();
        if label.is_empty() {
          return Err(SubmissionError::EmptyLabel);
        }
        let points = self.custom_points.ok_or(SubmissionError::MissingPoints)?;
        RequestedAction::Custom { label: label.to_owned(), points }
      }
    };
    Ok(EventRequest { target_user_id, action })
  }

  /// Whether the submit control is enabled.
  pub fn can_submit(&self) -> bool { !self.locked() && self.request().is_ok() }

  /// Enter `Submitting` and hand out the request to send. Fails without a
  /// state change when submission is disabled.
  pub fn begin_submit(&mut self) -> Result<EventRequest, SubmissionError> {
    if self.locked() {
      return Err(SubmissionError::InFlight);
    }
    let request = self.request()?;
    self.submitting = true;
    self.last_error = None;
    Ok(request)
  }

  /// Settle the in-flight submission. On failure the selection is kept so
  /// the user can re-trigger it manually.
  pub fn finish<E: std::fmt::Display>(&mut self, outcome: Result<(), E>) {
    if !self.submitting {
      return;
    }
    self.submitting = false;
    match outcome {
      Ok(()) => self.succeeded = true,
      Err(e) => self.last_error = Some(e.to_string()),
    }
  }

  /// Back to the initial state, e.g. once [`CONFIRMATION_DELAY`] has elapsed
  /// after a success.
  pub fn reset(&mut self) { *self = Self::default(); }
}
