/// Whether the transform is currently applied to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
}

/// Per-page render state. Written only by the toggle controller.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub injected: bool,
    pub font_color: String,
}

impl RenderState {
    pub fn new(font_color: impl Into<String>) -> Self {
        Self {
            injected: false,
            font_color: font_color.into(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.injected {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    /// Swap between the default and alternate color; returns the new color.
    pub fn flip_font_color(&mut self, default: &str, alternate: &str) -> &str {
        self.font_color = if self.font_color == default {
            alternate.to_string()
        } else {
            default.to_string()
        };
        &self.font_color
    }
}
