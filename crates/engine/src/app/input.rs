use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Jump,
    Grab,
    Reset,
    Quit,
}

const ACTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Jump => 4,
            InputAction::Grab => 5,
            InputAction::Reset => 6,
            InputAction::Quit => 7,
        }
    }
}

/// Raw device-level input, already mapped to actions by whatever owns the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    Action { action: InputAction, pressed: bool },
    PointerMoved { delta: Vec2 },
    QuitRequested,
}

/// Anything that can feed raw input into the loop: a window backend, a replay, a test script.
pub trait InputSource {
    fn poll_events(&mut self, tick: u64, out: &mut Vec<RawInputEvent>);
}

/// Input as seen by one simulation tick.
///
/// Held state is level-triggered. Jump, grab and reset are edge-triggered and
/// appear in exactly one snapshot per physical press or release.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    jump_pressed: bool,
    grab_pressed: bool,
    grab_released: bool,
    reset_pressed: bool,
    pointer_delta: Vec2,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn grab_pressed(&self) -> bool {
        self.grab_pressed
    }

    pub fn grab_released(&self) -> bool {
        self.grab_released
    }

    pub fn reset_pressed(&self) -> bool {
        self.reset_pressed
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_jump_pressed(mut self, jump_pressed: bool) -> Self {
        self.jump_pressed = jump_pressed;
        self
    }

    /// Press edge for grab. Also marks grab as held, matching what the collector produces.
    pub fn with_grab_pressed(mut self, grab_pressed: bool) -> Self {
        self.grab_pressed = grab_pressed;
        if grab_pressed {
            self.actions.set(InputAction::Grab, true);
        }
        self
    }

    pub fn with_grab_released(mut self, grab_released: bool) -> Self {
        self.grab_released = grab_released;
        if grab_released {
            self.actions.set(InputAction::Grab, false);
        }
        self
    }

    pub fn with_reset_pressed(mut self, reset_pressed: bool) -> Self {
        self.reset_pressed = reset_pressed;
        self
    }

    pub fn with_pointer_delta(mut self, pointer_delta: Vec2) -> Self {
        self.pointer_delta = pointer_delta;
        self
    }
}

/// Folds raw events arriving between ticks into per-tick snapshots.
#[derive(Debug, Default)]
pub struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    jump_pressed_edge: bool,
    grab_pressed_edge: bool,
    grab_released_edge: bool,
    reset_pressed_edge: bool,
    pending_pointer_delta: Vec2,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: RawInputEvent) {
        match event {
            RawInputEvent::Action { action, pressed } => self.handle_action(action, pressed),
            RawInputEvent::PointerMoved { delta } => {
                self.pending_pointer_delta += delta;
            }
            RawInputEvent::QuitRequested => self.mark_quit_requested(),
        }
    }

    pub fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn handle_action(&mut self, action: InputAction, pressed: bool) {
        let was_down = self.action_states.is_down(action);
        self.action_states.set(action, pressed);

        let pressed_edge = pressed && !was_down;
        let released_edge = !pressed && was_down;
        match action {
            InputAction::Jump if pressed_edge => self.jump_pressed_edge = true,
            InputAction::Grab if pressed_edge => self.grab_pressed_edge = true,
            InputAction::Grab if released_edge => self.grab_released_edge = true,
            InputAction::Reset if pressed_edge => self.reset_pressed_edge = true,
            InputAction::Quit if pressed => self.mark_quit_requested(),
            _ => {}
        }
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            quit_requested: self.quit_requested,
            actions: self.action_states,
            jump_pressed: self.jump_pressed_edge,
            grab_pressed: self.grab_pressed_edge,
            grab_released: self.grab_released_edge,
            reset_pressed: self.reset_pressed_edge,
            pointer_delta: self.pending_pointer_delta,
        };
        self.jump_pressed_edge = false;
        self.grab_pressed_edge = false;
        self.grab_released_edge = false;
        self.reset_pressed_edge = false;
        self.pending_pointer_delta = Vec2::ZERO;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(action: InputAction) -> RawInputEvent {
        RawInputEvent::Action {
            action,
            pressed: true,
        }
    }

    fn release(action: InputAction) -> RawInputEvent {
        RawInputEvent::Action {
            action,
            pressed: false,
        }
    }

    #[test]
    fn jump_edge_is_reported_once_per_press() {
        let mut collector = InputCollector::new();
        collector.handle_event(press(InputAction::Jump));

        let first = collector.snapshot_for_tick();
        let second = collector.snapshot_for_tick();

        assert!(first.jump_pressed());
        assert!(first.is_down(InputAction::Jump));
        assert!(!second.jump_pressed());
        assert!(second.is_down(InputAction::Jump));
    }

    #[test]
    fn repeated_press_while_held_is_not_a_new_edge() {
        let mut collector = InputCollector::new();
        collector.handle_event(press(InputAction::Jump));
        let _ = collector.snapshot_for_tick();

        collector.handle_event(press(InputAction::Jump));
        assert!(!collector.snapshot_for_tick().jump_pressed());
    }

    #[test]
    fn grab_press_and_release_edges_are_tracked_separately() {
        let mut collector = InputCollector::new();
        collector.handle_event(press(InputAction::Grab));
        let pressed = collector.snapshot_for_tick();
        assert!(pressed.grab_pressed());
        assert!(!pressed.grab_released());

        collector.handle_event(release(InputAction::Grab));
        let released = collector.snapshot_for_tick();
        assert!(!released.grab_pressed());
        assert!(released.grab_released());
        assert!(!released.is_down(InputAction::Grab));
    }

    #[test]
    fn release_without_prior_press_is_not_an_edge() {
        let mut collector = InputCollector::new();
        collector.handle_event(release(InputAction::Grab));
        assert!(!collector.snapshot_for_tick().grab_released());
    }

    #[test]
    fn pointer_delta_accumulates_between_ticks_and_resets() {
        let mut collector = InputCollector::new();
        collector.handle_event(RawInputEvent::PointerMoved {
            delta: Vec2::new(0.25, -0.5),
        });
        collector.handle_event(RawInputEvent::PointerMoved {
            delta: Vec2::new(0.25, 0.0),
        });

        assert_eq!(collector.snapshot_for_tick().pointer_delta(), Vec2::new(0.5, -0.5));
        assert_eq!(collector.snapshot_for_tick().pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn quit_action_marks_quit_requested_sticky() {
        let mut collector = InputCollector::new();
        collector.handle_event(press(InputAction::Quit));
        collector.handle_event(release(InputAction::Quit));

        assert!(collector.snapshot_for_tick().quit_requested());
        assert!(collector.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn snapshot_builder_grab_pressed_implies_held() {
        let snapshot = InputSnapshot::empty().with_grab_pressed(true);
        assert!(snapshot.is_down(InputAction::Grab));
    }
}
