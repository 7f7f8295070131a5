use std::time::Instant;

use tracing::debug;

use super::click::{ClickKind, ClickState};
use super::drag::DragSession;
use crate::error::Result;
use crate::models::Point;
use crate::session::DesktopSessionState;

/// Where a dragged icon moved to on a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragMove {
    pub entry: String,
    pub position: Point,
}

/// What a completed gesture amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Release without a matching press.
    Ignored,
    /// Single click: the entry is now the only highlighted icon.
    Selected(String),
    /// Second click on the same entry within the double-click window.
    Open(String),
    /// The icon was dragged; positions have been saved.
    Moved(String),
}

/// Turns pointer presses, ticks and releases on the desktop into drags,
/// clicks and double-clicks.
///
/// `Idle -> Armed` on press over an icon, `Armed -> Dragging` once the
/// pointer passes the threshold, back to `Idle` on release.
#[derive(Debug, Default)]
pub struct InteractionController {
    drag: Option<DragSession>,
    clicks: ClickState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| d.dragging)
    }

    /// Primary button pressed at `point`. Arms a gesture when the point is on
    /// an icon's glyph or label and returns that icon's name. A press on empty
    /// desktop clears the highlight.
    pub fn pointer_down(
        &mut self,
        session: &mut DesktopSessionState,
        point: Point,
    ) -> Option<String> {
        let hit = session
            .hit_test(point)
            .map(|(icon, part)| (icon.display_name.clone(), part));

        match hit {
            Some((name, part)) => {
                debug!("Armed {:?} via {:?} at ({}, {})", name, part, point.x, point.y);
                self.drag = Some(DragSession::new(name.clone(), point));
                Some(name)
            }
            None => {
                self.drag = None;
                session.select(None);
                None
            }
        }
    }

    /// Periodic sample while the button is held. Moves the dragged icon by
    /// the pointer delta since the previous sample. Never touches the disk.
    pub fn tick(&mut self, session: &mut DesktopSessionState, pointer: Point) -> Option<DragMove> {
        let drag = self.drag.as_mut()?;
        let was_dragging = drag.dragging;
        let (dx, dy) = drag.advance(pointer)?;
        if !was_dragging {
            debug!("Dragging {:?}", drag.entry);
        }

        match session.icon_mut(&drag.entry) {
            Some(icon) => {
                icon.move_by(dx, dy);
                Some(DragMove {
                    entry: icon.display_name.clone(),
                    position: icon.position,
                })
            }
            None => {
                // The icon set was rebuilt under the gesture.
                debug!("Dragged icon {:?} vanished; dropping gesture", drag.entry);
                self.drag = None;
                None
            }
        }
    }

    /// Button released at `pointer`. The release point counts as a final
    /// tick, so a fast flick that no tick saw still registers as a drag.
    pub fn pointer_up(
        &mut self,
        session: &mut DesktopSessionState,
        pointer: Point,
        now: Instant,
    ) -> Result<GestureOutcome> {
        if self.drag.is_none() {
            return Ok(GestureOutcome::Ignored);
        }
        self.tick(session, pointer);
        let Some(drag) = self.drag.take() else {
            return Ok(GestureOutcome::Ignored);
        };

        if drag.dragging {
            self.clicks.reset();
            session.save_positions()?;
            return Ok(GestureOutcome::Moved(drag.entry));
        }

        match self.clicks.register(&drag.entry, now) {
            ClickKind::Double => {
                debug!("Double-click on {:?}", drag.entry);
                Ok(GestureOutcome::Open(drag.entry))
            }
            ClickKind::Single => {
                session.select(Some(drag.entry.as_str()));
                Ok(GestureOutcome::Selected(drag.entry))
            }
        }
    }

    /// Abandons the current gesture without side effects, e.g. when the
    /// toolkit cancels the press or the icon set is about to be rebuilt.
    pub fn cancel(&mut self) {
        self.drag = None;
    }

    /// Forgets the pending click so the next click cannot complete a
    /// double-click, e.g. after the icon set was rebuilt.
    pub fn forget_clicks(&mut self) {
        self.clicks.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesktopConfig;
    use crate::layout::AutoLayout;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    struct Desk {
        root: TempDir,
        conf: TempDir,
        session: DesktopSessionState,
    }

    // a.txt at (20, 20), b.txt at (20, 90) once positioned explicitly.
    fn desk() -> Desk {
        let root = tempdir().unwrap();
        let conf = tempdir().unwrap();
        File::create(root.path().join("a.txt")).unwrap();
        File::create(root.path().join("b.txt")).unwrap();

        let mut config = DesktopConfig::new(root.path(), "");
        config.positions.insert("a.txt", Point::new(20, 20));
        config.positions.insert("b.txt", Point::new(20, 90));
        let mut session = DesktopSessionState::new(
            conf.path().join("config.txt"),
            config,
            AutoLayout::default(),
        );
        session.rebuild().unwrap();
        Desk {
            root,
            conf,
            session,
        }
    }

    fn pos(desk: &Desk, name: &str) -> Point {
        desk.session.icon(name).unwrap().position
    }

    #[test]
    fn test_small_wiggle_is_click_not_move() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        let t0 = Instant::now();

        assert_eq!(
            ctl.pointer_down(&mut desk.session, Point::new(30, 30)),
            Some("a.txt".to_string())
        );
        assert_eq!(ctl.tick(&mut desk.session, Point::new(35, 25)), None);
        let outcome = ctl
            .pointer_up(&mut desk.session, Point::new(34, 34), t0)
            .unwrap();

        assert_eq!(outcome, GestureOutcome::Selected("a.txt".to_string()));
        assert_eq!(pos(&desk, "a.txt"), Point::new(20, 20));
        assert_eq!(desk.session.selected(), Some("a.txt"));
        assert!(!ctl.is_armed());
    }

    #[test]
    fn test_drag_moves_icon_and_saves_without_opening() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        let t0 = Instant::now();

        ctl.pointer_down(&mut desk.session, Point::new(30, 30));
        let moved = ctl.tick(&mut desk.session, Point::new(40, 30)).unwrap();
        assert_eq!(moved.position, Point::new(30, 20));
        assert!(ctl.is_dragging());

        ctl.tick(&mut desk.session, Point::new(140, 230));
        let outcome = ctl
            .pointer_up(&mut desk.session, Point::new(140, 230), t0)
            .unwrap();

        assert_eq!(outcome, GestureOutcome::Moved("a.txt".to_string()));
        assert_eq!(pos(&desk, "a.txt"), Point::new(130, 220));
        assert_eq!(
            desk.session.icon("a.txt").unwrap().label_position(),
            Point::new(130, 255)
        );

        let saved = DesktopConfig::load(&desk.conf.path().join("config.txt"))
            .unwrap()
            .unwrap();
        assert_eq!(saved.positions.get("a.txt"), Some(Point::new(130, 220)));

        // A click right after the drag is a fresh single click.
        ctl.pointer_down(&mut desk.session, Point::new(135, 225));
        let outcome = ctl
            .pointer_up(
                &mut desk.session,
                Point::new(135, 225),
                t0 + Duration::from_millis(50),
            )
            .unwrap();
        assert_eq!(outcome, GestureOutcome::Selected("a.txt".to_string()));
    }

    #[test]
    fn test_flick_without_tick_is_still_a_drag() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        ctl.pointer_down(&mut desk.session, Point::new(30, 30));
        let outcome = ctl
            .pointer_up(&mut desk.session, Point::new(30, 80), Instant::now())
            .unwrap();
        assert_eq!(outcome, GestureOutcome::Moved("a.txt".to_string()));
        assert_eq!(pos(&desk, "a.txt"), Point::new(20, 70));
    }

    #[test]
    fn test_drag_from_label_moves_whole_icon() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        // b.txt label sits at (20, 125).
        assert_eq!(
            ctl.pointer_down(&mut desk.session, Point::new(25, 130)),
            Some("b.txt".to_string())
        );
        ctl.tick(&mut desk.session, Point::new(225, 130));
        assert_eq!(pos(&desk, "b.txt"), Point::new(220, 90));
    }

    #[test]
    fn test_double_click_opens_once() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        let t0 = Instant::now();
        let p = Point::new(30, 30);

        ctl.pointer_down(&mut desk.session, p);
        assert_eq!(
            ctl.pointer_up(&mut desk.session, p, t0).unwrap(),
            GestureOutcome::Selected("a.txt".to_string())
        );
        ctl.pointer_down(&mut desk.session, p);
        assert_eq!(
            ctl.pointer_up(&mut desk.session, p, t0 + Duration::from_millis(300))
                .unwrap(),
            GestureOutcome::Open("a.txt".to_string())
        );
        ctl.pointer_down(&mut desk.session, p);
        assert_eq!(
            ctl.pointer_up(&mut desk.session, p, t0 + Duration::from_millis(400))
                .unwrap(),
            GestureOutcome::Selected("a.txt".to_string())
        );
    }

    #[test]
    fn test_click_on_other_entry_never_opens() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        let t0 = Instant::now();

        ctl.pointer_down(&mut desk.session, Point::new(30, 30));
        ctl.pointer_up(&mut desk.session, Point::new(30, 30), t0)
            .unwrap();
        ctl.pointer_down(&mut desk.session, Point::new(30, 100));
        let outcome = ctl
            .pointer_up(
                &mut desk.session,
                Point::new(30, 100),
                t0 + Duration::from_millis(100),
            )
            .unwrap();

        assert_eq!(outcome, GestureOutcome::Selected("b.txt".to_string()));
        assert_eq!(desk.session.selected(), Some("b.txt"));
    }

    #[test]
    fn test_press_on_empty_desktop_clears_highlight() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        desk.session.select(Some("a.txt"));

        assert_eq!(ctl.pointer_down(&mut desk.session, Point::new(600, 600)), None);
        assert_eq!(desk.session.selected(), None);
        assert_eq!(
            ctl.pointer_up(&mut desk.session, Point::new(600, 600), Instant::now())
                .unwrap(),
            GestureOutcome::Ignored
        );
    }

    #[test]
    fn test_icon_vanishing_mid_drag_drops_gesture() {
        let mut desk = desk();
        let mut ctl = InteractionController::new();
        ctl.pointer_down(&mut desk.session, Point::new(30, 30));
        std::fs::remove_file(desk.root.path().join("a.txt")).unwrap();
        desk.session.rebuild().unwrap();

        assert_eq!(ctl.tick(&mut desk.session, Point::new(90, 90)), None);
        assert!(!ctl.is_armed());
    }
}
