//! Feedback digest export
//!
//! Renders the annotation list as a markdown digest that can be pasted
//! elsewhere. Entries keep insertion order, not document order.

use serde::{Deserialize, Serialize};

use super::reconcile::AnchorResolver;
use super::text::FlatText;
use crate::annotations::Annotation;

/// User-facing export options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub include_line_numbers: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            header: String::new(),
            include_line_numbers: true,
        }
    }
}

/// Build the feedback digest for `annotations` over `text`
pub fn generate_feedback(
    annotations: &[Annotation],
    text: &FlatText,
    settings: &ExportSettings,
) -> String {
    let header = settings.header.trim();
    let line_starts = if settings.include_line_numbers {
        text.line_starts()
    } else {
        Vec::new()
    };
    let mut resolver = AnchorResolver::new(text);

    let mut feedback = String::new();
    if !header.is_empty() {
        feedback.push_str(header);
        feedback.push_str("\n\n");
    }

    for (index, annotation) in annotations.iter().enumerate() {
        let line_ref = if settings.include_line_numbers && !text.is_empty() {
            line_reference(&mut resolver, annotation, &line_starts)
        } else {
            None
        };

        match line_ref {
            Some(line_ref) => feedback.push_str(&format!("### {}. {}\n\n", index + 1, line_ref)),
            None => feedback.push_str(&format!("### {}.\n\n", index + 1)),
        }
        feedback.push_str(&format_quoted_text(&annotation.selected_text));
        feedback.push_str("\n\n");
        feedback.push_str(&annotation.comment);
        feedback.push_str("\n\n");
    }

    let mut feedback = feedback.trim_end().to_string();
    feedback.push('\n');
    feedback
}

/// "Line N" or "Lines N-M" for an annotation, if it can be located
fn line_reference(
    resolver: &mut AnchorResolver<'_>,
    annotation: &Annotation,
    line_starts: &[usize],
) -> Option<String> {
    let range = resolver.resolve(annotation)?;
    let start_line = line_number(line_starts, range.start);
    // The last covered character, not the exclusive end
    let end_line = line_number(line_starts, range.start.max(range.end.saturating_sub(1)));

    if start_line == end_line {
        Some(format!("Line {}", start_line))
    } else {
        Some(format!("Lines {}-{}", start_line, end_line))
    }
}

/// 1-based line containing `offset`, given ascending line-start offsets
pub fn line_number(line_starts: &[usize], offset: usize) -> usize {
    line_starts.partition_point(|&start| start <= offset).max(1)
}

/// Prefix every line with a block-quote marker
pub fn format_quoted_text(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
