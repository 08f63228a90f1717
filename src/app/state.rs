use std::time::Instant;

use super::controllers::render::{RenderController, RenderReport};
use super::controllers::toggle::ToggleController;
use super::domain::{
    BionicConfig, Command, Document, InboundMessage, MessageResponse, PageEvent, Phase,
    RenderState,
};
use super::infrastructure::error::Result;
use super::infrastructure::preferences::PreferenceStore;

/// One page-load context: the document plus everything that acts on it.
pub struct BionicPage {
    document: Document,
    state: RenderState,
    render: RenderController,
    toggle: ToggleController,
    preferences: Box<dyn PreferenceStore>,
}

impl BionicPage {
    pub fn new(mut document: Document, config: BionicConfig, preferences: Box<dyn PreferenceStore>) -> Self {
        document.set_layout_metrics(config.layout);
        Self {
            document,
            state: RenderState::new(config.default_font_color.clone()),
            render: RenderController::new(&config),
            toggle: ToggleController::new(&config),
            preferences,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn render_passes(&self) -> u64 {
        self.render.passes()
    }

    /// Turn the transform on when the stored preference asks for it.
    ///
    /// A preference read failure leaves the page untouched.
    pub fn on_page_load(&mut self) -> Option<RenderReport> {
        let autouse = match self.preferences.get_user_options() {
            Ok(options) => options.autouse,
            Err(e) => {
                tracing::warn!(error = %e, "could not read user options, autouse disabled");
                false
            }
        };
        if !autouse {
            tracing::debug!("autouse is off, page left as is");
            return None;
        }
        self.activate()
    }

    fn activate(&mut self) -> Option<RenderReport> {
        self.toggle.activate(&mut self.state, &mut self.document, &mut self.render)
    }

    fn deactivate(&mut self) -> usize {
        self.toggle.deactivate(&mut self.state, &mut self.document)
    }

    // --- Inbound commands ---

    pub fn dispatch(&mut self, command: Command, now: Instant) {
        tracing::debug!(command = command.name(), "dispatching");
        match command {
            Command::StartBionic => match self.phase() {
                Phase::Idle => {
                    self.activate();
                }
                Phase::Active => {
                    self.render.cancel();
                    self.render.render(&mut self.document, &self.state);
                }
            },
            Command::Toggle => match self.phase() {
                Phase::Idle => {
                    self.activate();
                }
                Phase::Active => {
                    self.deactivate();
                }
            },
            Command::Refresh => {
                if self.phase() == Phase::Active {
                    self.render.request(now);
                }
            }
            Command::ToggleAutouse => {
                if let Err(e) = self.toggle.toggle_autouse(
                    self.preferences.as_mut(),
                    &mut self.state,
                    &mut self.document,
                    &mut self.render,
                ) {
                    tracing::warn!(error = %e, "could not persist autouse preference");
                }
            }
            Command::ToggleFontColor => {
                self.toggle.toggle_font_color(&mut self.state, &mut self.document);
            }
        }
    }

    /// Dispatch by wire name. Returns false for names nobody handles.
    pub fn dispatch_name(&mut self, name: &str, now: Instant) -> bool {
        match Command::from_name(name) {
            Some(command) => {
                self.dispatch(command, now);
                true
            }
            None => {
                tracing::warn!(name, "unknown command");
                false
            }
        }
    }

    /// Handle a JSON message `{"type": "<name>"}`; every parsed message is answered.
    pub fn handle_message(&mut self, json: &str, now: Instant) -> Result<MessageResponse> {
        let message: InboundMessage = serde_json::from_str(json)?;
        self.dispatch_name(&message.kind, now);
        Ok(MessageResponse::done())
    }

    // --- Page events and timers ---

    /// Apply a viewport event, then schedule a render if one is bound to it.
    pub fn handle_event(&mut self, event: PageEvent, now: Instant) {
        match event {
            PageEvent::Scroll { top } => self.document.scroll_to(top),
            PageEvent::Resize { height } => self.document.resize(height),
            PageEvent::Wheel => {}
        }
        if self.toggle.is_listening(event.kind()) {
            self.render.request(now);
        }
    }

    /// Fire the debounced render if it is due.
    pub fn tick(&mut self, now: Instant) -> Option<RenderReport> {
        self.render.poll(&mut self.document, &self.state, now)
    }

    /// Fire the debounced render now, if one is pending.
    pub fn flush(&mut self) -> Option<RenderReport> {
        self.render.flush(&mut self.document, &self.state)
    }

    pub fn render_pending(&self) -> bool {
        self.render.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::app::domain::{EXT_NAME, WORD_TAG};
    use crate::app::infrastructure::preferences::{MemoryPreferenceStore, UserOptions};
    use crate::app::services::markup::parse_document;

    const SENTENCE: &str = "Bionic reading guides the eye through dense prose";

    fn long_page() -> Document {
        let mut html = String::from("<html><head></head><body><article>");
        for i in 0..100 {
            html.push_str(&format!("<p>{SENTENCE} number {i}</p>"));
        }
        html.push_str("</article></body></html>");
        parse_document(&html).unwrap()
    }

    fn page_with(store: MemoryPreferenceStore) -> BionicPage {
        BionicPage::new(long_page(), BionicConfig::default(), Box::new(store))
    }

    fn wrapped(page: &BionicPage) -> usize {
        page.document().elements_by_tag(WORD_TAG).len()
    }

    #[test]
    fn test_page_load_with_autouse() {
        let mut page = page_with(MemoryPreferenceStore::default());
        let report = page.on_page_load().unwrap();
        assert_eq!(page.phase(), Phase::Active);
        // 800px viewport plus 100px margin, 20px per paragraph
        assert_eq!(report.transformed, 46);
        assert_eq!(wrapped(&page), 46);
    }

    #[test]
    fn test_page_load_without_autouse() {
        let mut page = page_with(MemoryPreferenceStore::new(UserOptions { autouse: false }));
        assert!(page.on_page_load().is_none());
        assert_eq!(page.phase(), Phase::Idle);
        assert_eq!(page.document().mutation_count(), long_page().mutation_count());
    }

    #[test]
    fn test_page_load_read_failure_stays_idle() {
        let mut page = page_with(MemoryPreferenceStore::failing_reads());
        assert!(page.on_page_load().is_none());
        assert_eq!(page.phase(), Phase::Idle);
        assert_eq!(wrapped(&page), 0);
    }

    #[test]
    fn test_scrolling_extends_transformed_region() {
        let start = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::default());
        page.on_page_load();

        for step in 1..=5u64 {
            let at = start + Duration::from_millis(step * 30);
            page.handle_event(PageEvent::Wheel, at);
            page.handle_event(PageEvent::Scroll { top: step as f64 * 200.0 }, at);
        }
        assert!(page.tick(start + Duration::from_millis(200)).is_none());
        let report = page.tick(start + Duration::from_millis(330)).unwrap();
        assert_eq!(page.render_passes(), 2);
        assert!(report.transformed > 0);
        assert!(wrapped(&page) > 46);
    }

    #[test]
    fn test_events_ignored_while_idle() {
        let start = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::new(UserOptions { autouse: false }));
        page.on_page_load();
        page.handle_event(PageEvent::Scroll { top: 400.0 }, start);
        assert!(!page.render_pending());
        assert_eq!(page.document().viewport().scroll_top, 400.0);
        assert!(page.flush().is_none());
    }

    #[test]
    fn test_toggle_command_round_trip() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::new(UserOptions { autouse: false }));
        let text_before = page.document().text_content(page.document().body());

        let reply = page.handle_message(r#"{"type": "toggle"}"#, now).unwrap();
        assert_eq!(reply, MessageResponse::done());
        assert_eq!(page.phase(), Phase::Active);

        page.handle_message(r#"{"type": "toggle"}"#, now).unwrap();
        assert_eq!(page.phase(), Phase::Idle);
        assert_eq!(page.document().text_content(page.document().body()), text_before);
        assert!(page.document().element_by_id(EXT_NAME).is_none());
    }

    #[test]
    fn test_start_bionic_when_active_rerenders() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::default());
        page.dispatch(Command::StartBionic, now);
        page.dispatch(Command::StartBionic, now);
        assert_eq!(page.render_passes(), 2);
        assert_eq!(wrapped(&page), 46);
    }

    #[test]
    fn test_refresh_schedules_render_only_when_active() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::new(UserOptions { autouse: false }));
        page.dispatch(Command::Refresh, now);
        assert!(!page.render_pending());

        page.dispatch(Command::StartBionic, now);
        page.dispatch(Command::Refresh, now);
        assert!(page.render_pending());
        assert!(page.flush().is_some());
    }

    #[test]
    fn test_unknown_command_is_answered() {
        let mut page = page_with(MemoryPreferenceStore::default());
        assert!(!page.dispatch_name("toggleDarkMode", Instant::now()));
        let reply = page
            .handle_message(r#"{"type": "toggleDarkMode"}"#, Instant::now())
            .unwrap();
        assert_eq!(reply.message, "DONE");
        assert_eq!(page.phase(), Phase::Idle);
        assert!(page.handle_message("not json", Instant::now()).is_err());
    }

    #[test]
    fn test_toggle_autouse_command() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::new(UserOptions { autouse: false }));
        page.dispatch_name("toggleAutouse", now);
        assert_eq!(page.phase(), Phase::Active);
        page.dispatch_name("toggleAutouse", now);
        assert_eq!(page.phase(), Phase::Idle);
    }

    #[test]
    fn test_toggle_autouse_write_failure_is_not_fatal() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::failing_writes(UserOptions { autouse: false }));
        page.dispatch(Command::ToggleAutouse, now);
        assert_eq!(page.phase(), Phase::Idle);
    }

    #[test]
    fn test_font_color_command() {
        let now = Instant::now();
        let mut page = page_with(MemoryPreferenceStore::default());
        page.dispatch(Command::ToggleFontColor, now);
        assert_eq!(page.state().font_color, "inherit");

        page.on_page_load();
        page.dispatch(Command::ToggleFontColor, now);
        assert_eq!(page.state().font_color, "#000000");
    }
}
