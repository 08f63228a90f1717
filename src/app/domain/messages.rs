use serde::{Deserialize, Serialize};

/// Commands routed to the toggle state machine by the message-dispatch shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Turn the transform on, or re-render if it is already on.
    StartBionic,
    /// Toolbar button: flip between on and off.
    Toggle,
    /// History navigation in a single-page app: re-render if on.
    Refresh,
    ToggleAutouse,
    ToggleFontColor,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "startBionic" => Some(Self::StartBionic),
            "toggle" => Some(Self::Toggle),
            "bionic" => Some(Self::Refresh),
            "toggleAutouse" => Some(Self::ToggleAutouse),
            "toggleFontColor" => Some(Self::ToggleFontColor),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartBionic => "startBionic",
            Self::Toggle => "toggle",
            Self::Refresh => "bionic",
            Self::ToggleAutouse => "toggleAutouse",
            Self::ToggleFontColor => "toggleFontColor",
        }
    }
}

/// Wire shape of an inbound message: `{"type": "toggle"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Reply sent back for every handled message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn done() -> Self {
        Self {
            message: "DONE".to_string(),
        }
    }
}

/// Page events a render can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEventKind {
    Scroll,
    Wheel,
    Resize,
}

impl PageEventKind {
    pub fn all() -> &'static [PageEventKind] {
        &[Self::Scroll, Self::Wheel, Self::Resize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    /// Viewport scrolled to `top` px.
    Scroll { top: f64 },
    /// Wheel input; the scroll itself arrives as a separate event.
    Wheel,
    /// Viewport resized to `height` px.
    Resize { height: f64 },
}

impl PageEvent {
    pub fn kind(&self) -> PageEventKind {
        match self {
            Self::Scroll { .. } => PageEventKind::Scroll,
            Self::Wheel => PageEventKind::Wheel,
            Self::Resize { .. } => PageEventKind::Resize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_round_trip() {
        for name in ["startBionic", "toggle", "bionic", "toggleAutouse", "toggleFontColor"] {
            let command = Command::from_name(name).unwrap();
            assert_eq!(command.name(), name);
        }
        assert_eq!(Command::from_name("toggleDarkMode"), None);
    }

    #[test]
    fn test_inbound_message_parsing() {
        let msg: InboundMessage = serde_json::from_str(r#"{"type": "toggle"}"#).unwrap();
        assert_eq!(msg.kind, "toggle");

        // extra fields from the sender are ignored
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type": "bionic", "message": "history"}"#).unwrap();
        assert_eq!(msg.kind, "bionic");
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_string(&MessageResponse::done()).unwrap();
        assert_eq!(json, r#"{"message":"DONE"}"#);
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(PageEvent::Scroll { top: 10.0 }.kind(), PageEventKind::Scroll);
        assert_eq!(PageEvent::Wheel.kind(), PageEventKind::Wheel);
        assert_eq!(PageEvent::Resize { height: 600.0 }.kind(), PageEventKind::Resize);
        assert_eq!(PageEventKind::all().len(), 3);
    }
}
