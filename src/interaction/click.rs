use std::time::{Duration, Instant};

/// Two clicks on the same icon within this window count as a double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// Remembers the last click to recognise double-clicks by hand, since a
/// toolkit double-click would fire before drag detection has had its say.
#[derive(Debug, Clone)]
pub struct ClickState {
    last: Option<(String, Instant)>,
    window: Duration,
}

impl Default for ClickState {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_WINDOW)
    }
}

impl ClickState {
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    /// Classifies a click on `name` at `now`. A double-click consumes the
    /// remembered click, so a third quick click starts a new pair.
    pub fn register(&mut self, name: &str, now: Instant) -> ClickKind {
        let is_double = self.last.as_ref().is_some_and(|(last_name, at)| {
            last_name == name && now.saturating_duration_since(*at) <= self.window
        });

        if is_double {
            self.last = None;
            ClickKind::Double
        } else {
            self.last = Some((name.to_string(), now));
            ClickKind::Single
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
