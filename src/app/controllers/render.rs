use std::time::{Duration, Instant};

use crate::app::domain::{BionicConfig, Document, RenderState, RootStrategy};
use crate::app::services::scanner::{resolve_root, scan};
use crate::app::services::style::ensure_style;
use crate::app::services::units::wrap_text_node;
use crate::app::services::{BionicTransformer, EligibilityFilter};

use super::debounce::Debouncer;

/// Outcome of one scan-and-transform pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderReport {
    /// Text nodes the filter accepted.
    pub accepted: usize,
    pub transformed: usize,
    /// Accepted nodes whose text held no words.
    pub skipped: usize,
    /// Nodes whose markup could not be materialized.
    pub failed: usize,
    pub elapsed: Duration,
}

pub struct RenderController {
    root: RootStrategy,
    filter: EligibilityFilter,
    transformer: BionicTransformer,
    debouncer: Debouncer,
    passes: u64,
}

impl RenderController {
    pub fn new(config: &BionicConfig) -> Self {
        Self {
            root: config.root,
            filter: EligibilityFilter::new(config),
            transformer: BionicTransformer::new(config),
            debouncer: Debouncer::new(config.debounce_wait()),
            passes: 0,
        }
    }

    /// Number of passes that actually scanned the document.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    // --- Debounced entry points ---

    /// Ask for a render once triggers have been quiet for the debounce period.
    pub fn request(&mut self, now: Instant) {
        self.debouncer.schedule(now);
    }

    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Run the pending render if its quiet period has elapsed.
    pub fn poll(&mut self, doc: &mut Document, state: &RenderState, now: Instant) -> Option<RenderReport> {
        if self.debouncer.poll(now) {
            self.render(doc, state)
        } else {
            None
        }
    }

    /// Run the pending render now, if there is one.
    pub fn flush(&mut self, doc: &mut Document, state: &RenderState) -> Option<RenderReport> {
        if self.debouncer.flush() {
            self.render(doc, state)
        } else {
            None
        }
    }

    // --- The pass itself ---

    /// Scan, then transform. Returns `None` without touching the document when
    /// the transform is not active.
    pub fn render(&mut self, doc: &mut Document, state: &RenderState) -> Option<RenderReport> {
        if !state.injected {
            tracing::debug!("render skipped: bionic reading is not active");
            return None;
        }
        let started = Instant::now();
        self.passes += 1;

        ensure_style(doc, &state.font_color);

        let root = resolve_root(doc, self.root);
        let units = scan(doc, root, &self.filter);
        let mut report = RenderReport {
            accepted: units.len(),
            ..Default::default()
        };
        if units.is_empty() {
            tracing::info!("no eligible text in view");
        }

        for unit in units {
            let Some(text) = doc.text(unit).map(str::to_owned) else {
                continue;
            };
            let Some(html) = self.transformer.transform(&text) else {
                report.skipped += 1;
                continue;
            };
            match wrap_text_node(doc, unit, &html) {
                Ok(_) => report.transformed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, markup = %html, "could not apply transformed markup");
                    report.failed += 1;
                }
            }
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            pass = self.passes,
            accepted = report.accepted,
            transformed = report.transformed,
            skipped = report.skipped,
            elapsed_us = report.elapsed.as_micros() as u64,
            "render pass finished"
        );
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::{FONT_TAG, WORD_TAG};
    use crate::app::services::markup::{parse_document, serialize_document};
    use crate::app::services::units::sanitize;

    const SENTENCE: &str = "Bionic reading guides the eye through dense prose";

    fn active_state() -> RenderState {
        let mut state = RenderState::new("inherit");
        state.injected = true;
        state
    }

    fn page() -> Document {
        parse_document(&format!(
            "<html><head></head><body><p>{SENTENCE}</p><p>Short one</p><p>{SENTENCE} again</p></body></html>"
        ))
        .unwrap()
    }

    #[test]
    fn test_render_transforms_eligible_text() {
        let mut doc = page();
        let mut render = RenderController::new(&BionicConfig::default());
        let report = render.render(&mut doc, &active_state()).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.transformed, 2);
        assert_eq!(doc.elements_by_tag(WORD_TAG).len(), 2);
        assert!(doc.elements_by_tag(FONT_TAG).len() > 10);

        let first = doc.elements_by_tag(WORD_TAG)[0];
        assert_eq!(doc.text_content(first), SENTENCE);
        assert!(doc.element_by_id("Bionic_Reading").is_some());
    }

    #[test]
    fn test_render_is_noop_when_idle() {
        let mut doc = page();
        let before = doc.mutation_count();
        let mut render = RenderController::new(&BionicConfig::default());
        assert_eq!(render.render(&mut doc, &RenderState::new("inherit")), None);
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(render.passes(), 0);
    }

    #[test]
    fn test_rerender_does_not_rewrap() {
        let mut doc = page();
        let mut render = RenderController::new(&BionicConfig::default());
        let state = active_state();
        render.render(&mut doc, &state);
        let markup = serialize_document(&doc);

        let report = render.render(&mut doc, &state).unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(serialize_document(&doc), markup);
    }

    #[test]
    fn test_render_sanitize_cycles_preserve_text() {
        let mut doc = page();
        let original_text = doc.text_content(doc.body());
        let mut render = RenderController::new(&BionicConfig::default());
        let state = active_state();
        for _ in 0..2 {
            render.render(&mut doc, &state);
            sanitize(&mut doc);
            assert_eq!(doc.text_content(doc.body()), original_text);
        }
        assert!(doc.elements_by_tag(WORD_TAG).is_empty());
    }

    #[test]
    fn test_wordless_text_is_skipped() {
        // enough letters to pass the filter, but none of them form a lowercase word
        let mut doc = parse_document(
            "<body><p>NASA ESA JAXA ROSCOSMOS CNSA ISRO</p></body>",
        )
        .unwrap();
        let mut render = RenderController::new(&BionicConfig::default());
        let report = render.render(&mut doc, &active_state()).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.transformed, 0);
        assert!(doc.elements_by_tag(WORD_TAG).is_empty());
    }

    #[test]
    fn test_debounced_requests_coalesce() {
        let start = Instant::now();
        let mut doc = page();
        let mut render = RenderController::new(&BionicConfig::default());
        let state = active_state();
        for i in 0..5 {
            render.request(start + Duration::from_millis(i * 40));
            assert_eq!(render.poll(&mut doc, &state, start + Duration::from_millis(i * 40)), None);
        }
        assert_eq!(render.poll(&mut doc, &state, start + Duration::from_millis(339)), None);
        assert!(render.poll(&mut doc, &state, start + Duration::from_millis(340)).is_some());
        assert_eq!(render.poll(&mut doc, &state, start + Duration::from_millis(900)), None);
        assert_eq!(render.passes(), 1);
    }

    #[test]
    fn test_pending_render_observes_state_when_it_fires() {
        let start = Instant::now();
        let mut doc = page();
        let mut render = RenderController::new(&BionicConfig::default());
        let mut state = active_state();
        render.request(start);
        state.injected = false;
        assert_eq!(render.poll(&mut doc, &state, start + Duration::from_millis(200)), None);
        assert_eq!(render.passes(), 0);
        assert!(doc.elements_by_tag(WORD_TAG).is_empty());
    }

    #[test]
    fn test_script_body_is_never_transformed() {
        let html = format!(
            "<html><head></head><body><script>if (a<b) {{ go(); }}</script><p>{SENTENCE}</p></body></html>"
        );
        let mut doc = parse_document(&html).unwrap();
        let mut render = RenderController::new(&BionicConfig::default());
        let report = render.render(&mut doc, &active_state()).unwrap();
        assert_eq!(report.transformed, 1);

        let script = doc.elements_by_tag("script")[0];
        assert_eq!(doc.text_content(script), "if (a<b) { go(); }");
        let wrapper = doc.elements_by_tag(WORD_TAG)[0];
        let p = doc.elements_by_tag("p")[0];
        assert_eq!(doc.parent(wrapper), Some(p));
        assert_eq!(doc.parent(p), Some(doc.body()));
        assert!(serialize_document(&doc).contains("<script>if (a<b) { go(); }</script><p><bionic-word>"));
    }
}
