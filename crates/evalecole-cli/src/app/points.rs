//! The add-points screen: a [`SubmissionFlow`] plus the lists it picks from.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use evalecole_core::{
  submission::{ActionChoice, CONFIRMATION_DELAY, CustomPoints, SubmissionFlow, SubmissionStage},
  views::{Member, TargetActions},
};

use super::App;

#[derive(Debug, Default)]
pub struct PointsState {
  pub flow:           SubmissionFlow,
  pub search:         String,
  pub editing_search: bool,
  pub targets:        Vec<Member>,
  pub target_cursor:  usize,
  /// Loaded once a target is picked.
  pub actions:        Option<TargetActions>,
  /// Over the catalog entries, then the free-text entry.
  pub action_cursor:  usize,
  pub points_cursor:  usize,
  pub succeeded_at:   Option<Instant>,
}

impl PointsState {
  pub fn is_typing(&self) -> bool {
    self.editing_search || self.flow.stage() == SubmissionStage::CustomDetails
  }

  /// Entries in the action list, the free-text entry included.
  pub fn action_count(&self) -> usize {
    self.actions.as_ref().map_or(0, |a| a.actions.len() + 1)
  }

  pub fn choice_at(&self, index: usize) -> Option<ActionChoice> {
    let actions = self.actions.as_ref()?;
    match actions.actions.get(index) {
      Some(option) => Some(ActionChoice::Catalog(option.id.clone())),
      None if index == actions.actions.len() => Some(ActionChoice::Custom),
      None => None,
    }
  }

  /// The point values offered for a free-text event.
  pub fn point_values(&self) -> &[CustomPoints] {
    self.actions.as_ref().map(|a| a.custom_points.as_slice()).unwrap_or_default()
  }

  /// Step the free-text point value. The first step only picks the value
  /// under the cursor.
  pub fn shift_points(&mut self, forward: bool) {
    let n = self.point_values().len();
    if n == 0 {
      return;
    }
    if self.flow.custom_points().is_some() {
      self.points_cursor =
        if forward { (self.points_cursor + 1) % n } else { (self.points_cursor + n - 1) % n };
    }
    let value = self.point_values()[self.points_cursor.min(n - 1)];
    self.flow.set_custom_points(value);
  }

  /// Whether the success message has been up long enough.
  pub fn confirmation_elapsed(&self, now: Instant) -> bool {
    self
      .succeeded_at
      .is_some_and(|at| now.saturating_duration_since(at) >= CONFIRMATION_DELAY)
  }

  fn back_to_targets(&mut self) {
    self.flow.reset();
    self.actions = None;
    self.action_cursor = 0;
    self.points_cursor = 0;
  }
}

impl App {
  pub(super) async fn load_targets(&mut self) -> anyhow::Result<()> {
    let targets = self.client.targets(&self.points.search).await?;
    self.points.targets = targets;
    self.points.target_cursor = 0;
    Ok(())
  }

  pub(super) async fn handle_points_key(&mut self, key: KeyEvent) {
    if self.points.editing_search {
      match key.code {
        KeyCode::Esc => self.points.editing_search = false,
        KeyCode::Enter => {
          self.points.editing_search = false;
          if let Err(e) = self.load_targets().await {
            self.fail(e);
          }
        }
        KeyCode::Backspace => {
          self.points.search.pop();
        }
        KeyCode::Char(c) => self.points.search.push(c),
        _ => {}
      }
      return;
    }

    let points = &mut self.points;
    match points.flow.stage() {
      SubmissionStage::SelectingTarget => match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
          if points.target_cursor + 1 < points.targets.len() {
            points.target_cursor += 1;
          }
        }
        KeyCode::Up | KeyCode::Char('k') => {
          points.target_cursor = points.target_cursor.saturating_sub(1);
        }
        KeyCode::Char('/') => points.editing_search = true,
        KeyCode::Enter => {
          if let Some(id) = points.targets.get(points.target_cursor).map(|t| t.id.clone()) {
            self.open_target(id).await;
          }
        }
        _ => {}
      },

      SubmissionStage::SelectingAction => match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
          if points.action_cursor + 1 < points.action_count() {
            points.action_cursor += 1;
          }
        }
        KeyCode::Up | KeyCode::Char('k') => {
          points.action_cursor = points.action_cursor.saturating_sub(1);
        }
        KeyCode::Esc | KeyCode::Left => points.back_to_targets(),
        KeyCode::Char('s') => self.submit_points().await,
        KeyCode::Enter => match points.choice_at(points.action_cursor) {
          // A second Enter on the chosen action sends it.
          Some(choice) if points.flow.action() == Some(&choice) => self.submit_points().await,
          Some(choice) => {
            if choice == ActionChoice::Custom {
              points.points_cursor = 0;
            }
            points.flow.select_action(choice);
          }
          None => {}
        },
        _ => {}
      },

      SubmissionStage::CustomDetails => match key.code {
        KeyCode::Esc => {
          if let Some(id) = points.flow.target_id().map(str::to_owned) {
            points.flow.select_target(id);
          }
        }
        KeyCode::Left => points.shift_points(false),
        KeyCode::Right => points.shift_points(true),
        KeyCode::Backspace => {
          let mut label = points.flow.custom_label().to_owned();
          label.pop();
          points.flow.set_custom_label(label);
        }
        KeyCode::Char(c) => {
          let label = format!("{}{c}", points.flow.custom_label());
          points.flow.set_custom_label(label);
        }
        KeyCode::Enter => self.submit_points().await,
        _ => {}
      },

      SubmissionStage::Submitting | SubmissionStage::Success => {}
    }
  }

  async fn open_target(&mut self, target_id: String) {
    match self.client.target_actions(&target_id).await {
      Ok(actions) => {
        self.points.flow.select_target(target_id);
        self.points.actions = Some(actions);
        self.points.action_cursor = 0;
      }
      Err(e) => self.fail(e),
    }
  }

  async fn submit_points(&mut self) {
    let request = match self.points.flow.begin_submit() {
      Ok(request) => request,
      Err(e) => {
        self.status_msg = e.to_string();
        return;
      }
    };

    match self.client.submit(&request).await {
      Ok(event) => {
        tracing::info!(event = %event.id, target = %event.target_user_id, points = event.points, "points submitted");
        self.points.flow.finish(Ok::<(), anyhow::Error>(()));
        self.points.succeeded_at = Some(Instant::now());
      }
      Err(e) => {
        self.points.flow.finish(Err(&e));
        self.fail(e);
      }
    }
  }
}
