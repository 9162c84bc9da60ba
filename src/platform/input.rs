//! Input bindings
//!
//! Space and ArrowUp are equivalent jump keys: key-down starts a charge,
//! key-up releases it. Touch press/release behaves the same way. The
//! on-screen button jumps immediately. Enter starts or restarts a run.

use crate::sim::{GameEvent, JumpIntent, Session, SessionPhase};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowUp,
    Enter,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Self {
        match code {
            "Space" => Key::Space,
            "ArrowUp" => Key::ArrowUp,
            "Enter" | "NumpadEnter" => Key::Enter,
            _ => Key::Other,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Key::Space | Key::ArrowUp)
    }

    /// Keys whose browser default (page scroll) must be suppressed
    pub fn prevents_default(self) -> bool {
        self.is_jump()
    }
}

/// Raw input from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown { key: Key, repeat: bool },
    KeyUp { key: Key },
    TouchStart,
    TouchEnd,
    /// On-screen jump control
    JumpButton,
}

/// What the session should do with an input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Jump(JumpIntent),
    Start,
    Restart,
}

/// Which control began the current charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChargeSource {
    Key(Key),
    Touch,
}

/// Turns raw input into commands, tracking the control holding a charge
#[derive(Debug, Default)]
pub struct InputMapper {
    charging: Option<ChargeSource>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one event received at host time `at_ms`
    pub fn map(&mut self, event: InputEvent, at_ms: f64, phase: SessionPhase) -> Option<Command> {
        match event {
            InputEvent::KeyDown { key: Key::Enter, .. } => match phase {
                SessionPhase::Idle => Some(Command::Start),
                SessionPhase::Ended { .. } => Some(Command::Restart),
                SessionPhase::Running => None,
            },
            InputEvent::KeyDown { key, repeat } if key.is_jump() => {
                if repeat {
                    return None;
                }
                self.begin(ChargeSource::Key(key), at_ms, phase)
            }
            InputEvent::KeyUp { key } if key.is_jump() => self.end(ChargeSource::Key(key), at_ms),
            InputEvent::TouchStart => self.begin(ChargeSource::Touch, at_ms, phase),
            InputEvent::TouchEnd => self.end(ChargeSource::Touch, at_ms),
            InputEvent::JumpButton if phase == SessionPhase::Running => {
                Some(Command::Jump(JumpIntent::JumpNow))
            }
            _ => None,
        }
    }

    fn begin(&mut self, source: ChargeSource, at_ms: f64, phase: SessionPhase) -> Option<Command> {
        if phase != SessionPhase::Running || self.charging.is_some() {
            return None;
        }
        self.charging = Some(source);
        Some(Command::Jump(JumpIntent::ChargeBegin { at_ms }))
    }

    fn end(&mut self, source: ChargeSource, at_ms: f64) -> Option<Command> {
        if self.charging != Some(source) {
            return None;
        }
        self.charging = None;
        Some(Command::Jump(JumpIntent::ChargeEnd { at_ms }))
    }

    /// Forget any held control (run ended or listeners detached)
    pub fn reset(&mut self) {
        self.charging = None;
    }
}

/// Apply a command to the session; `seed` is used when a run begins
pub fn dispatch(session: &mut Session, command: Command, seed: u64) -> Option<GameEvent> {
    match command {
        Command::Jump(intent) => session.handle_intent(intent),
        Command::Start => {
            session.start(seed);
            None
        }
        Command::Restart => {
            session.restart(seed);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CollisionService, RunOutcome};
    use crate::tuning::Tuning;

    const RUNNING: SessionPhase = SessionPhase::Running;

    fn down(key: Key) -> InputEvent {
        InputEvent::KeyDown { key, repeat: false }
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("Space"), Key::Space);
        assert_eq!(Key::from_code("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_code("KeyW"), Key::Other);
        assert!(Key::ArrowUp.prevents_default());
        assert!(!Key::Enter.prevents_default());
    }

    #[test]
    fn test_charge_from_either_key() {
        let mut input = InputMapper::new();
        assert_eq!(
            input.map(down(Key::ArrowUp), 10.0, RUNNING),
            Some(Command::Jump(JumpIntent::ChargeBegin { at_ms: 10.0 }))
        );
        // The other jump key and auto-repeat are ignored while charging
        assert_eq!(input.map(down(Key::Space), 20.0, RUNNING), None);
        assert_eq!(
            input.map(InputEvent::KeyDown { key: Key::ArrowUp, repeat: true }, 30.0, RUNNING),
            None
        );
        assert_eq!(input.map(InputEvent::KeyUp { key: Key::Space }, 40.0, RUNNING), None);
        assert_eq!(
            input.map(InputEvent::KeyUp { key: Key::ArrowUp }, 250.0, RUNNING),
            Some(Command::Jump(JumpIntent::ChargeEnd { at_ms: 250.0 }))
        );
    }

    #[test]
    fn test_touch_and_button() {
        let mut input = InputMapper::new();
        assert!(matches!(
            input.map(InputEvent::TouchStart, 0.0, RUNNING),
            Some(Command::Jump(JumpIntent::ChargeBegin { .. }))
        ));
        assert!(matches!(
            input.map(InputEvent::TouchEnd, 90.0, RUNNING),
            Some(Command::Jump(JumpIntent::ChargeEnd { .. }))
        ));
        assert_eq!(
            input.map(InputEvent::JumpButton, 0.0, RUNNING),
            Some(Command::Jump(JumpIntent::JumpNow))
        );
        assert_eq!(input.map(InputEvent::JumpButton, 0.0, SessionPhase::Idle), None);
    }

    #[test]
    fn test_enter_by_phase() {
        let mut input = InputMapper::new();
        let ended = SessionPhase::Ended {
            score: 10,
            outcome: RunOutcome::Victory,
        };
        assert_eq!(input.map(down(Key::Enter), 0.0, SessionPhase::Idle), Some(Command::Start));
        assert_eq!(input.map(down(Key::Enter), 0.0, ended), Some(Command::Restart));
        assert_eq!(input.map(down(Key::Enter), 0.0, RUNNING), None);
        // No charging outside a run
        assert_eq!(input.map(down(Key::Space), 0.0, ended), None);
    }

    #[test]
    fn test_dispatch_drives_session() {
        let mut session = Session::new(Tuning::default(), CollisionService::default(), 1);
        let mut input = InputMapper::new();

        let cmd = input.map(down(Key::Enter), 0.0, session.phase()).unwrap();
        dispatch(&mut session, cmd, 3);
        assert!(session.is_running());
        assert_eq!(session.world().seed, 3);

        let cmd = input.map(down(Key::Space), 100.0, session.phase()).unwrap();
        assert_eq!(dispatch(&mut session, cmd, 0), None);
        let cmd = input
            .map(InputEvent::KeyUp { key: Key::Space }, 600.0, session.phase())
            .unwrap();
        assert!(matches!(dispatch(&mut session, cmd, 0), Some(GameEvent::Jumped { .. })));
    }
}
