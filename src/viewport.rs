//! Viewport windowing over the flattened row sequence.
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every scroll or resize.

use std::ops::Range;

/// Extra rows materialized beyond each edge of the viewport
pub const DEFAULT_OVERSCAN: usize = 50;

/// Rows kept between a navigation target and the viewport edge
pub const SCROLL_MARGIN: usize = 2;

/// Scroll position and size of the diff view, in rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scroll_top: f64,
    pub viewport_height: usize,
    pub total_rows: usize,
}

/// Half-open range `[start, end)` of rows to materialize.
///
/// Guarantees `0 <= start <= end <= total_rows`.
pub fn visible_range(viewport: ViewportState, overscan: usize) -> Range<usize> {
    let scroll_top = viewport.scroll_top.max(0.0);
    let start = (scroll_top.floor() as usize).saturating_sub(overscan);
    let bottom = (scroll_top + viewport.viewport_height as f64).ceil() as usize;
    let end = bottom.saturating_add(overscan).min(viewport.total_rows);
    start.min(end)..end
}

/// Largest scroll offset that still fills the viewport.
pub fn max_scroll(total_rows: usize, viewport_height: usize) -> usize {
    total_rows.saturating_sub(viewport_height)
}

/// New scroll offset that brings `index` into view with `margin` rows of
/// padding, or `None` when it is already comfortably visible.
pub fn scroll_into_view(
    index: usize,
    scroll_top: usize,
    viewport_height: usize,
    total_rows: usize,
    margin: usize,
) -> Option<usize> {
    if total_rows == 0 || viewport_height == 0 {
        return None;
    }

    let visible_end = scroll_top + viewport_height - 1;
    let safe_start = scroll_top + margin;
    let safe_end = visible_end.saturating_sub(margin);

    let new_scroll = if index < safe_start {
        index.saturating_sub(margin)
    } else if index > safe_end {
        (index + margin + 1).saturating_sub(viewport_height)
    } else {
        scroll_top
    };
    let new_scroll = new_scroll.min(max_scroll(total_rows, viewport_height));

    (new_scroll != scroll_top).then_some(new_scroll)
}
