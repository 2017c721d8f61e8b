//! Input normalization
//!
//! Pointer clicks, touch starts, and one keyboard key all fold into a single
//! fire intent. The mapping is platform-free so it tests without a browser;
//! the listener plumbing lives in `platform::web`.

/// A raw input occurrence, already stripped of browser specifics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    PointerDown,
    TouchStart,
    /// A key press, identified by its `KeyboardEvent.code`
    Key(String),
}

/// Whether this input should fire an arrow. `fire_key` comes from
/// [`crate::config::GameConfig::fire_key`].
pub fn is_fire(input: &RawInput, fire_key: &str) -> bool {
    match input {
        RawInput::PointerDown | RawInput::TouchStart => true,
        RawInput::Key(code) => code == fire_key,
    }
}

/// Touch and fire-key events must suppress the browser default (scroll,
/// zoom, click synthesis) to avoid double triggers.
pub fn wants_default_suppressed(input: &RawInput) -> bool {
    matches!(input, RawInput::TouchStart | RawInput::Key(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_and_touch_always_fire() {
        assert!(is_fire(&RawInput::PointerDown, "Space"));
        assert!(is_fire(&RawInput::TouchStart, "Space"));
    }

    #[test]
    fn test_only_configured_key_fires() {
        assert!(is_fire(&RawInput::Key("Space".into()), "Space"));
        assert!(!is_fire(&RawInput::Key("Enter".into()), "Space"));
        assert!(is_fire(&RawInput::Key("Enter".into()), "Enter"));
        assert!(!is_fire(&RawInput::Key("KeyA".into()), "Space"));
    }

    #[test]
    fn test_touch_and_key_suppress_default() {
        assert!(wants_default_suppressed(&RawInput::TouchStart));
        assert!(wants_default_suppressed(&RawInput::Key("Space".into())));
        assert!(!wants_default_suppressed(&RawInput::PointerDown));
    }
}
