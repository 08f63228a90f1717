use std::collections::HashSet;

use crate::app::domain::{BionicConfig, Document, PageEventKind, Phase, RenderState};
use crate::app::infrastructure::error::Result;
use crate::app::infrastructure::preferences::{PreferenceStore, UserOptions};
use crate::app::services::style::{ensure_style, remove_style};
use crate::app::services::units::sanitize;

use super::render::{RenderController, RenderReport};

/// The Idle/Active state machine. Sole writer of [`RenderState`].
pub struct ToggleController {
    default_font_color: String,
    alternate_font_color: String,
    listeners: HashSet<PageEventKind>,
}

impl ToggleController {
    pub fn new(config: &BionicConfig) -> Self {
        Self {
            default_font_color: config.default_font_color.clone(),
            alternate_font_color: config.alternate_font_color.clone(),
            listeners: HashSet::new(),
        }
    }

    /// Whether a render is currently bound to events of `kind`.
    pub fn is_listening(&self, kind: PageEventKind) -> bool {
        self.listeners.contains(&kind)
    }

    /// Idle → Active. `None` if already active.
    pub fn activate(
        &mut self,
        state: &mut RenderState,
        doc: &mut Document,
        render: &mut RenderController,
    ) -> Option<RenderReport> {
        if state.injected {
            tracing::debug!("activate ignored: already active");
            return None;
        }
        ensure_style(doc, &state.font_color);
        state.injected = true;
        self.listeners.extend(PageEventKind::all().iter().copied());
        tracing::info!("bionic reading activated");

        render.cancel();
        render.render(doc, state)
    }

    /// Active → Idle. Safe to call when already idle.
    ///
    /// A render still pending in the debouncer is left in place; it sees
    /// `injected == false` when it fires and does nothing.
    pub fn deactivate(&mut self, state: &mut RenderState, doc: &mut Document) -> usize {
        let was_active = state.injected;
        state.injected = false;
        self.listeners.clear();

        let removed = sanitize(doc);
        remove_style(doc);
        if was_active {
            tracing::info!(removed, "bionic reading deactivated");
        }
        removed
    }

    /// Flip between the default and alternate font color. `None` while idle.
    pub fn toggle_font_color(&mut self, state: &mut RenderState, doc: &mut Document) -> Option<String> {
        if state.phase() == Phase::Idle {
            tracing::info!("font color toggle ignored: bionic reading is not active");
            return None;
        }
        let color = state
            .flip_font_color(&self.default_font_color, &self.alternate_font_color)
            .to_string();
        ensure_style(doc, &color);
        tracing::info!(color = %color, "font color changed");
        Some(color)
    }

    /// Flip the persisted autouse preference and follow it with a transition.
    ///
    /// Returns the new autouse value. If the new value cannot be persisted, no
    /// transition happens.
    pub fn toggle_autouse(
        &mut self,
        store: &mut dyn PreferenceStore,
        state: &mut RenderState,
        doc: &mut Document,
        render: &mut RenderController,
    ) -> Result<bool> {
        let current = match store.get_user_options() {
            Ok(options) => options.autouse,
            Err(e) => {
                tracing::warn!(error = %e, "could not read user options, assuming autouse is off");
                false
            }
        };
        let autouse = !current;
        store.set_user_options(UserOptions { autouse })?;
        tracing::info!(autouse, "autouse preference changed");

        match (autouse, state.phase()) {
            (true, Phase::Idle) => {
                self.activate(state, doc, render);
            }
            (false, Phase::Active) => {
                self.deactivate(state, doc);
            }
            _ => {}
        }
        Ok(autouse)
    }
}
