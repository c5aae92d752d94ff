//! Keys the zoom controller reacts to.

/// Keyboard input relevant to a zoomed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value, including the legacy names
    /// older browsers report.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => Key::Other,
        }
    }

    /// Maps a legacy `KeyboardEvent.keyCode`.
    pub fn from_key_code(code: u32) -> Self {
        match code {
            27 => Key::Escape,
            37 => Key::ArrowLeft,
            39 => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}
