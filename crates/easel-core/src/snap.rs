//! Alignment snapping for layer drags.
//!
//! [`compute_snap`] is a pure function: given the moving layer's bounds,
//! the bounds of every other visible layer and the canvas size, it returns
//! the snapped top-left position plus the guide lines to draw. Candidates
//! are scanned per axis in a fixed order (canvas edges, canvas midline,
//! then each other layer's edges and midline) and the first candidate
//! within [`SNAP_THRESHOLD`] of a reference point wins. The axes resolve
//! independently; an unmatched axis passes through unchanged.

use kurbo::Rect;

/// Snap distance in canvas units.
pub const SNAP_THRESHOLD: f64 = 8.0;

/// Orientation of an alignment guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    /// A vertical line at `x = position`, spanning the canvas height.
    Vertical,
    /// A horizontal line at `y = position`, spanning the canvas width.
    Horizontal,
}

/// One alignment guide, spanning the full canvas perpendicular to its
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,
    pub position: f64,
}

/// Result of a snap query: the (possibly adjusted) top-left position of
/// the moving bounds and the guides to render.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<SnapGuide>,
}

/// Snap `moving` against the canvas frame and the other layers' bounds.
///
/// `others` must already be filtered to visible layers excluding the
/// moving layer itself.
pub fn compute_snap(
    moving: Rect,
    others: &[Rect],
    canvas_width: f64,
    canvas_height: f64,
) -> SnapOutcome {
    let mut outcome = SnapOutcome {
        x: moving.x0,
        y: moving.y0,
        guides: Vec::new(),
    };

    let refs_x = [moving.x0, moving.center().x, moving.x1];
    let candidates_x = axis_candidates(
        canvas_width,
        others.iter().map(|r| (r.x0, r.x1, r.center().x)),
    );
    if let Some((delta, target)) = snap_axis(&refs_x, &candidates_x) {
        outcome.x = moving.x0 + delta;
        outcome.guides.push(SnapGuide {
            orientation: GuideOrientation::Vertical,
            position: target,
        });
    }

    let refs_y = [moving.y0, moving.center().y, moving.y1];
    let candidates_y = axis_candidates(
        canvas_height,
        others.iter().map(|r| (r.y0, r.y1, r.center().y)),
    );
    if let Some((delta, target)) = snap_axis(&refs_y, &candidates_y) {
        outcome.y = moving.y0 + delta;
        outcome.guides.push(SnapGuide {
            orientation: GuideOrientation::Horizontal,
            position: target,
        });
    }

    outcome
}

/// Candidate coordinates for one axis in scan order: canvas edges, canvas
/// midline, then each other layer's edges and midline.
fn axis_candidates<I>(canvas_extent: f64, others: I) -> Vec<f64>
where
    I: Iterator<Item = (f64, f64, f64)>,
{
    let mut candidates = vec![0.0, canvas_extent, canvas_extent / 2.0];
    for (lo, hi, mid) in others {
        candidates.push(lo);
        candidates.push(hi);
        candidates.push(mid);
    }
    candidates
}

/// First candidate within threshold of any reference point, scanning
/// candidates in order and references edge-center-edge within each.
/// Returns the position delta and the matched target coordinate.
fn snap_axis(refs: &[f64; 3], candidates: &[f64]) -> Option<(f64, f64)> {
    for &candidate in candidates {
        for &reference in refs {
            if (reference - candidate).abs() <= SNAP_THRESHOLD {
                return Some((candidate - reference, candidate));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS_W: f64 = 1000.0;
    const CANVAS_H: f64 = 1000.0;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn test_snaps_within_threshold() {
        // Left edge 7.9 units from the canvas left edge.
        let moving = rect(7.9, 400.0, 50.0, 50.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        assert!(outcome.x.abs() < f64::EPSILON);
        assert_eq!(outcome.guides.len(), 1);
        assert_eq!(outcome.guides[0].orientation, GuideOrientation::Vertical);
        assert!(outcome.guides[0].position.abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_snap_above_threshold() {
        let moving = rect(8.1, 400.0, 50.0, 50.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        assert!((outcome.x - 8.1).abs() < f64::EPSILON);
        // y refs sit far from 0, 1000 and 500 as well.
        assert!((outcome.y - 400.0).abs() < f64::EPSILON);
        assert!(outcome.guides.is_empty());
    }

    #[test]
    fn test_snap_exactly_at_threshold() {
        let moving = rect(8.0, 400.0, 50.0, 50.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        assert!(outcome.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_edge_to_edge_snap_with_guide() {
        // Moving right edge 6 units left of the other layer's left edge.
        let moving = rect(194.0, 100.0, 100.0, 50.0);
        let other = rect(300.0, 400.0, 120.0, 80.0);
        let outcome = compute_snap(moving, &[other], CANVAS_W, CANVAS_H);

        // x adjusted so the edges coincide exactly.
        assert!((outcome.x - 200.0).abs() < f64::EPSILON);
        assert!((outcome.x + moving.width() - 300.0).abs() < f64::EPSILON);

        let verticals: Vec<&SnapGuide> = outcome
            .guides
            .iter()
            .filter(|g| g.orientation == GuideOrientation::Vertical)
            .collect();
        assert_eq!(verticals.len(), 1);
        assert!((verticals[0].position - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_center_to_center_snap() {
        // Moving center at 497, other center at 500.
        let moving = rect(472.0, 300.0, 50.0, 50.0);
        let other = rect(450.0, 600.0, 100.0, 100.0);
        let outcome = compute_snap(moving, &[other], CANVAS_W, CANVAS_H);
        // Canvas midline (500) is scanned before the other layer and the
        // moving center is within threshold of it already.
        assert!((outcome.x - 475.0).abs() < f64::EPSILON);
        assert!((outcome.guides[0].position - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_canvas_midline_snap() {
        let moving = rect(495.0, 300.0, 50.0, 50.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        // Left edge is 5 from the midline of a 1000-wide canvas.
        assert!((outcome.x - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_axes_resolve_independently() {
        // x near the other layer's edge, y near nothing.
        let moving = rect(195.0, 333.3, 100.0, 40.0);
        let other = rect(300.0, 700.0, 100.0, 100.0);
        let outcome = compute_snap(moving, &[other], CANVAS_W, CANVAS_H);
        assert!((outcome.x - 200.0).abs() < f64::EPSILON);
        assert!((outcome.y - 333.3).abs() < f64::EPSILON);
        assert_eq!(outcome.guides.len(), 1);
    }

    #[test]
    fn test_both_axes_emit_two_guides() {
        let moving = rect(5.0, 900.0, 50.0, 94.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        assert!(outcome.x.abs() < f64::EPSILON);
        // Bottom edge 994 snaps to the canvas bottom at 1000.
        assert!((outcome.y - 906.0).abs() < f64::EPSILON);
        assert_eq!(outcome.guides.len(), 2);
    }

    #[test]
    fn test_canvas_frame_scanned_before_layers() {
        // Both the canvas left edge (distance 5) and another layer's edge
        // (distance 2) are in range; the fixed scan order prefers the
        // canvas frame.
        let moving = rect(5.0, 400.0, 50.0, 50.0);
        let other = rect(7.0, 400.0, 100.0, 100.0);
        let outcome = compute_snap(moving, &[other], CANVAS_W, CANVAS_H);
        assert!(outcome.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reference_order_prefers_left_edge() {
        // Left edge and right edge are both within range of the same
        // candidate; the left edge reference is checked first.
        let moving = rect(297.0, 400.0, 6.0, 50.0);
        let other = rect(300.0, 600.0, 100.0, 100.0);
        let outcome = compute_snap(moving, &[other], CANVAS_W, CANVAS_H);
        assert!((outcome.x - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_far_from_everything_is_identity() {
        let moving = rect(123.4, 256.7, 31.0, 17.0);
        let outcome = compute_snap(moving, &[], CANVAS_W, CANVAS_H);
        assert!((outcome.x - 123.4).abs() < f64::EPSILON);
        assert!((outcome.y - 256.7).abs() < f64::EPSILON);
        assert!(outcome.guides.is_empty());
    }
}
