//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s so every host
//! shares the same bindings. `key` is the DOM `KeyboardEvent.key` value.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    /// Remove selected nodes, group and connections.
    Delete,
    SelectAll,
    Deselect,

    // ── View ──
    ZoomIn,
    ZoomOut,
    /// Space pressed: pointer drags pan the canvas.
    PanStart,
    /// Space released.
    PanEnd,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘, elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key press. Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, mods: Modifiers) -> Option<ShortcutAction> {
        let cmd = mods.command();

        // ── Modifier combos first (most specific) ──
        if cmd && mods.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }

    /// Resolve a key release.
    pub fn resolve_release(key: &str) -> Option<ShortcutAction> {
        (key == " ").then_some(ShortcutAction::PanEnd)
    }
}
