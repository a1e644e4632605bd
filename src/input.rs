//! Keyboard input
//!
//! Key events arrive asynchronously and land in a held-key set that the play
//! loop samples once at the start of each tick. `InputState` is meant to be
//! owned by the single thread that also runs the loop; a driver that
//! delivers key events from another thread must wrap it in a `Mutex` (or
//! forward events over a channel) rather than share it unsynchronized.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::editor::{EditorCommand, NUDGE_STEP, NUDGE_STEP_LARGE, ROTATE_STEP};
use crate::sim::TickInput;

/// Keys currently held down, by DOM-style key name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: HashSet<String>,
}

impl HeldKeys {
    /// Returns true if the key was not already held
    pub fn press(&mut self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    pub fn release(&mut self, key: &str) {
        self.keys.remove(key);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn any_held(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.is_held(k))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|k| k.to_string()).collect()
}

/// Key names bound to each action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left_flipper: Vec<String>,
    pub right_flipper: Vec<String>,
    pub launch: Vec<String>,
    pub delete: Vec<String>,
    pub cancel: Vec<String>,
    pub rotate_forward: Vec<String>,
    pub rotate_back: Vec<String>,
    pub nudge_up: Vec<String>,
    pub nudge_down: Vec<String>,
    pub nudge_left: Vec<String>,
    pub nudge_right: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left_flipper: keys(&["z", "Z", "ArrowLeft"]),
            right_flipper: keys(&["/", "ArrowRight"]),
            launch: keys(&[" "]),
            delete: keys(&["Delete", "Backspace"]),
            cancel: keys(&["Escape"]),
            rotate_forward: keys(&["r"]),
            rotate_back: keys(&["R"]),
            nudge_up: keys(&["ArrowUp"]),
            nudge_down: keys(&["ArrowDown"]),
            nudge_left: keys(&["ArrowLeft"]),
            nudge_right: keys(&["ArrowRight"]),
        }
    }
}

fn bound(list: &[String], key: &str) -> bool {
    list.iter().any(|k| k == key)
}

impl KeyBindings {
    /// Editor-mode meaning of a key press, if any
    pub fn editor_command(&self, key: &str, shift: bool) -> Option<EditorCommand> {
        let step = if shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        if bound(&self.delete, key) {
            Some(EditorCommand::DeleteSelected)
        } else if bound(&self.cancel, key) {
            Some(EditorCommand::Cancel)
        } else if bound(&self.rotate_forward, key) {
            Some(EditorCommand::Rotate(ROTATE_STEP))
        } else if bound(&self.rotate_back, key) {
            Some(EditorCommand::Rotate(-ROTATE_STEP))
        } else if bound(&self.nudge_up, key) {
            Some(EditorCommand::Nudge(Vec2::new(0.0, -step)))
        } else if bound(&self.nudge_down, key) {
            Some(EditorCommand::Nudge(Vec2::new(0.0, step)))
        } else if bound(&self.nudge_left, key) {
            Some(EditorCommand::Nudge(Vec2::new(-step, 0.0)))
        } else if bound(&self.nudge_right, key) {
            Some(EditorCommand::Nudge(Vec2::new(step, 0.0)))
        } else {
            None
        }
    }
}

/// Play-mode input: held flipper keys plus a latched launch edge
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HeldKeys,
    bindings: KeyBindings,
    launch_pending: bool,
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            held: HeldKeys::default(),
            bindings,
            launch_pending: false,
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn held(&self) -> &HeldKeys {
        &self.held
    }

    /// Record a key press. Auto-repeat of an already held key is not a new
    /// edge. Returns true when this press latched a launch.
    pub fn key_down(&mut self, key: &str) -> bool {
        let fresh = self.held.press(key);
        let launch = fresh && bound(&self.bindings.launch, key);
        if launch {
            self.launch_pending = true;
        }
        launch
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.release(key);
    }

    /// Window lost focus: nothing is held any more
    pub fn blur(&mut self) {
        self.held.clear();
        self.launch_pending = false;
    }

    /// Sample for the next tick, consuming any latched launch
    pub fn tick_input(&mut self) -> TickInput {
        TickInput {
            left: self.held.any_held(&self.bindings.left_flipper),
            right: self.held.any_held(&self.bindings.right_flipper),
            launch: std::mem::take(&mut self.launch_pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliased_left_keys() {
        let mut input = InputState::default();
        input.key_down("Z");
        assert!(input.tick_input().left);
        input.key_up("Z");
        input.key_down("ArrowLeft");
        let sample = input.tick_input();
        assert!(sample.left);
        assert!(!sample.right);
    }

    #[test]
    fn test_flippers_are_level_triggered() {
        let mut input = InputState::default();
        input.key_down("/");
        for _ in 0..5 {
            assert!(input.tick_input().right);
        }
        input.key_up("/");
        assert!(!input.tick_input().right);
    }

    #[test]
    fn test_launch_is_a_single_edge() {
        let mut input = InputState::default();
        assert!(input.key_down(" "));
        // Auto-repeat while held
        assert!(!input.key_down(" "));
        assert!(input.tick_input().launch);
        assert!(!input.tick_input().launch);

        input.key_up(" ");
        input.key_down(" ");
        assert!(input.tick_input().launch);
    }

    #[test]
    fn test_blur_releases_everything() {
        let mut input = InputState::default();
        input.key_down("z");
        input.key_down(" ");
        input.blur();
        assert_eq!(input.tick_input(), TickInput::default());
        assert!(input.held().is_empty());
    }

    #[test]
    fn test_editor_commands() {
        let b = KeyBindings::default();
        assert_eq!(b.editor_command("Delete", false), Some(EditorCommand::DeleteSelected));
        assert_eq!(b.editor_command("Backspace", false), Some(EditorCommand::DeleteSelected));
        assert_eq!(b.editor_command("Escape", false), Some(EditorCommand::Cancel));
        assert_eq!(b.editor_command("r", false), Some(EditorCommand::Rotate(ROTATE_STEP)));
        assert_eq!(b.editor_command("R", true), Some(EditorCommand::Rotate(-ROTATE_STEP)));
        assert_eq!(
            b.editor_command("ArrowUp", false),
            Some(EditorCommand::Nudge(Vec2::new(0.0, -1.0)))
        );
        assert_eq!(
            b.editor_command("ArrowRight", true),
            Some(EditorCommand::Nudge(Vec2::new(10.0, 0.0)))
        );
        assert_eq!(b.editor_command("q", false), None);
    }

    #[test]
    fn test_bindings_partial_json_fills_defaults() {
        let b: KeyBindings = serde_json::from_str(r#"{"launch":["Enter"]}"#).unwrap();
        assert_eq!(b.launch, vec!["Enter".to_string()]);
        assert_eq!(b.left_flipper, KeyBindings::default().left_flipper);
    }
}
