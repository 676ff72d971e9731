use sim_engine::{InputAction, InputSource, RawInputEvent, Vec2};

/// Replays a fixed list of raw events, each released on the tick it names.
pub(crate) struct ScriptedInput {
    script: Vec<(u64, RawInputEvent)>,
    cursor: usize,
}

impl ScriptedInput {
    pub(crate) fn new(mut script: Vec<(u64, RawInputEvent)>) -> Self {
        script.sort_by_key(|(tick, _)| *tick);
        Self { script, cursor: 0 }
    }

    /// Walks, jumps, retries the jump mid-air, turns, grabs, then requests a level reset.
    pub(crate) fn demo() -> Self {
        Self::new(vec![
            (10, press(InputAction::MoveForward)),
            (40, press(InputAction::Jump)),
            (42, release(InputAction::Jump)),
            (50, press(InputAction::Jump)),
            (52, release(InputAction::Jump)),
            (70, release(InputAction::MoveForward)),
            (
                90,
                RawInputEvent::PointerMoved {
                    delta: Vec2::new(0.5, 0.0),
                },
            ),
            (120, press(InputAction::Grab)),
            (150, release(InputAction::Grab)),
            (400, press(InputAction::Reset)),
            (401, release(InputAction::Reset)),
        ])
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        self.script.len() - self.cursor
    }
}

impl InputSource for ScriptedInput {
    fn poll_events(&mut self, tick: u64, out: &mut Vec<RawInputEvent>) {
        while let Some((at, event)) = self.script.get(self.cursor) {
            if *at > tick {
                break;
            }
            out.push(*event);
            self.cursor += 1;
        }
    }
}

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

#[cfg(test)]
mod tests {
    use sim_engine::InputCollector;

    use super::*;

    #[test]
    fn events_are_released_on_their_tick_in_order() {
        let mut input = ScriptedInput::new(vec![
            (5, release(InputAction::Jump)),
            (2, press(InputAction::Jump)),
        ]);
        let mut out = Vec::new();

        input.poll_events(1, &mut out);
        assert!(out.is_empty());

        input.poll_events(2, &mut out);
        assert_eq!(out, vec![press(InputAction::Jump)]);

        out.clear();
        input.poll_events(10, &mut out);
        assert_eq!(out, vec![release(InputAction::Jump)]);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn demo_script_produces_jump_and_grab_edges() {
        let mut input = ScriptedInput::demo();
        let mut collector = InputCollector::new();
        let mut raw = Vec::new();
        let mut jumps = 0;
        let mut grabs = 0;
        let mut grab_releases = 0;
        let mut resets = 0;

        for tick in 0..500 {
            raw.clear();
            input.poll_events(tick, &mut raw);
            for event in raw.drain(..) {
                collector.handle_event(event);
            }
            let snapshot = collector.snapshot_for_tick();
            jumps += u32::from(snapshot.jump_pressed());
            grabs += u32::from(snapshot.grab_pressed());
            grab_releases += u32::from(snapshot.grab_released());
            resets += u32::from(snapshot.reset_pressed());
        }

        assert_eq!(jumps, 2);
        assert_eq!(grabs, 1);
        assert_eq!(grab_releases, 1);
        assert_eq!(resets, 1);
        assert_eq!(input.remaining(), 0);
    }
}
