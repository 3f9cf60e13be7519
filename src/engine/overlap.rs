//! Insertion-time overlap guard

use super::error::EngineError;
use super::reconcile::Anchor;
use super::text::TextRange;

/// First anchor intersecting `proposed`, if any
pub fn find_overlap<'a>(proposed: &TextRange, anchors: &'a [Anchor]) -> Option<&'a Anchor> {
    anchors
        .iter()
        .find(|anchor| proposed.intersects(&anchor.range()))
}

pub fn has_overlap(proposed: &TextRange, anchors: &[Anchor]) -> bool {
    find_overlap(proposed, anchors).is_some()
}

/// Accept `proposed` only if it intersects none of `anchors`.
///
/// Only meant for creating a new annotation. Edits and later drift are
/// never re-checked.
pub fn check_overlap(proposed: TextRange, anchors: &[Anchor]) -> Result<(), EngineError> {
    match find_overlap(&proposed, anchors) {
        Some(anchor) => Err(EngineError::OverlapRejected {
            range: proposed,
            conflicting: anchor.id.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(id: &str, start: usize, end: usize) -> Anchor {
        Anchor {
            start,
            end,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_touching_ranges_are_accepted() {
        let existing = vec![anchor("a", 5, 10)];

        assert!(check_overlap(TextRange::new(0, 5), &existing).is_ok());
        assert!(check_overlap(TextRange::new(10, 12), &existing).is_ok());
    }

    #[test]
    fn test_intersecting_ranges_are_rejected() {
        let existing = vec![anchor("a", 5, 10), anchor("b", 20, 30)];

        let err = check_overlap(TextRange::new(25, 40), &existing).unwrap_err();
        assert_eq!(
            err,
            EngineError::OverlapRejected {
                range: TextRange::new(25, 40),
                conflicting: "b".to_string(),
            }
        );
        assert_eq!(err.kind(), "overlap_rejected");

        // Fully contained and fully containing
        assert!(has_overlap(&TextRange::new(6, 7), &existing));
        assert!(has_overlap(&TextRange::new(0, 50), &existing));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let pairs = [
            ((0, 10), (5, 15)),
            ((5, 15), (0, 10)),
            ((0, 10), (10, 20)),
            ((3, 4), (0, 10)),
            ((0, 1), (1, 2)),
        ];

        for ((a_start, a_end), (b_start, b_end)) in pairs {
            let a = TextRange::new(a_start, a_end);
            let b = TextRange::new(b_start, b_end);
            let a_against_b = has_overlap(&a, &[anchor("b", b_start, b_end)]);
            let b_against_a = has_overlap(&b, &[anchor("a", a_start, a_end)]);
            assert_eq!(a_against_b, b_against_a);
        }
    }

    #[test]
    fn test_no_existing_anchors() {
        assert!(check_overlap(TextRange::new(0, 100), &[]).is_ok());
    }
}
