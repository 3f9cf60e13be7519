//! HTML markup for composed highlights
//!
//! Turns a [`Composition`] into one HTML fragment per text run. Plain
//! segments are emitted as escaped text; highlighted segments are wrapped
//! in `<mark>` elements carrying the annotation ids so a view can route
//! clicks back to [`Composition::annotations_at`].

use serde::Serialize;

use crate::engine::{Composition, RunId, RunSegments, Segment, SegmentStyle};

/// Configuration for highlight markup
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// CSS class for committed highlights
    pub class_prefix: String,
    /// Data attribute for a single annotation id
    pub id_attribute: String,
    /// Data attribute for the space-separated ids of overlapping annotations
    pub ids_attribute: String,
    /// CSS class for the in-progress selection
    pub draft_class: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            class_prefix: "sm-highlight".to_string(),
            id_attribute: "data-annotation-id".to_string(),
            ids_attribute: "data-annotation-ids".to_string(),
            draft_class: "annotation-mark-active".to_string(),
        }
    }
}

/// Markup for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRun {
    pub run: RunId,
    pub html: String,
}

/// Render every run of a composition
pub fn render_html(composition: &Composition, config: &HighlightConfig) -> Vec<RenderedRun> {
    composition
        .runs()
        .iter()
        .map(|run| RenderedRun {
            run: run.run,
            html: render_run(run, config),
        })
        .collect()
}

/// Render the segments of a single run
pub fn render_run(run: &RunSegments, config: &HighlightConfig) -> String {
    run.segments
        .iter()
        .map(|segment| render_segment(segment, config))
        .collect()
}

fn render_segment(segment: &Segment, config: &HighlightConfig) -> String {
    let text = html_escape::encode_text(&segment.text);

    match segment.style() {
        SegmentStyle::Plain => text.into_owned(),
        SegmentStyle::Draft => format!(
            "<mark class=\"{}\" data-active=\"true\">{}</mark>",
            config.draft_class, text
        ),
        SegmentStyle::Single => {
            let draft_class = draft_suffix(segment, config);
            format!(
                "<mark class=\"{}{}\" {}=\"{}\">{}</mark>",
                config.class_prefix,
                draft_class,
                config.id_attribute,
                html_escape::encode_double_quoted_attribute(&segment.ids[0]),
                text
            )
        }
        SegmentStyle::Multiple => {
            let draft_class = draft_suffix(segment, config);
            let ids = segment.ids.join(" ");
            format!(
                "<mark class=\"{} {}-multiple{}\" {}=\"{}\">{}</mark>",
                config.class_prefix,
                config.class_prefix,
                draft_class,
                config.ids_attribute,
                html_escape::encode_double_quoted_attribute(&ids),
                text
            )
        }
    }
}

fn draft_suffix(segment: &Segment, config: &HighlightConfig) -> String {
    if segment.draft {
        format!(" {}", config.draft_class)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{compose, Anchor, RenderedDocument, TextRange};

    fn anchor(id: &str, start: usize, end: usize) -> Anchor {
        Anchor {
            start,
            end,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_plain_text_is_escaped() {
        let doc = RenderedDocument::from_runs(["a < b & c"]);
        let rendered = render_html(&compose(&doc, &[], None), &HighlightConfig::default());

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].html, "a &lt; b &amp; c");
    }

    #[test]
    fn test_single_highlight() {
        let doc = RenderedDocument::from_runs(["Hello brave world"]);
        let composition = compose(&doc, &[anchor("a1", 6, 11)], None);
        let rendered = render_html(&composition, &HighlightConfig::default());

        assert_eq!(
            rendered[0].html,
            "Hello <mark class=\"sm-highlight\" data-annotation-id=\"a1\">brave</mark> world"
        );
    }

    #[test]
    fn test_overlapping_highlights_carry_all_ids() {
        let doc = RenderedDocument::from_runs(["abcdef"]);
        let composition = compose(&doc, &[anchor("x", 0, 4), anchor("y", 2, 6)], None);
        let html = render_run(&composition.runs()[0], &HighlightConfig::default());

        assert!(html.contains(
            "<mark class=\"sm-highlight sm-highlight-multiple\" data-annotation-ids=\"x y\">cd</mark>"
        ));
        assert!(html.starts_with("<mark class=\"sm-highlight\" data-annotation-id=\"x\">ab</mark>"));
    }

    #[test]
    fn test_draft_highlight() {
        let doc = RenderedDocument::from_runs(["one two"]);
        let composition = compose(&doc, &[], Some(TextRange::new(4, 7)));
        let html = render_run(&composition.runs()[0], &HighlightConfig::default());

        assert_eq!(
            html,
            "one <mark class=\"annotation-mark-active\" data-active=\"true\">two</mark>"
        );
    }

    #[test]
    fn test_empty_run_renders_empty() {
        let doc = RenderedDocument::from_runs(["", "text"]);
        let rendered = render_html(&compose(&doc, &[anchor("a", 0, 4)], None), &HighlightConfig::default());

        assert_eq!(rendered[0].html, "");
        assert!(rendered[1].html.contains("data-annotation-id=\"a\""));
    }
}
