//! Per-draw selection of the residual averaging window.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seiir_config::BetaScaling;
use seiir_primitives::DrawId;
use serde::Serialize;

use crate::error::{ScalingError, ScalingResult};

/// Minimum number of days between the window bounds.
pub const MIN_WINDOW_DAYS: i64 = 7;

/// Days before the transition date bounding the residual average.
///
/// The average covers observations from `end` days before the transition up
/// to, but excluding, `start` days before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryWindow {
    draw: DrawId,
    start: usize,
    end: usize,
}

impl HistoryWindow {
    /// Draws the window for one draw. The same draw always yields the same
    /// window.
    ///
    /// `start` is uniform on `[1, average_over_min)` and `end` is uniform on
    /// `[start + 7, average_over_max)`.
    ///
    /// # Errors
    ///
    /// Returns [`ScalingError::EmptyWindowRange`] when either range is empty.
    pub fn draw(draw: DrawId, scaling: &BetaScaling) -> ScalingResult<Self> {
        let mut rng = StdRng::seed_from_u64(u64::from(draw.get()));

        let start = sample(&mut rng, "history start", 1, scaling.average_over_min())?;
        let end_low = end_floor(start, scaling.average_over_max())?;
        let end = sample(&mut rng, "history end", end_low, scaling.average_over_max())?;

        Ok(Self {
            draw,
            start: to_days(start),
            end: to_days(end),
        })
    }

    /// Creates a window from explicit bounds.
    #[must_use]
    pub const fn new(draw: DrawId, start: usize, end: usize) -> Self {
        Self { draw, start, end }
    }

    /// Draw the window belongs to.
    #[must_use]
    pub const fn draw_id(&self) -> DrawId {
        self.draw
    }

    /// Days before the transition at which averaging stops.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Days before the transition at which averaging begins.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Index range of a history of `len` daily observations covered by the
    /// window, clamped to the history.
    #[must_use]
    pub fn slice_range(&self, len: usize) -> std::ops::Range<usize> {
        let lo = len.saturating_sub(self.end);
        let hi = len.saturating_sub(self.start);
        lo..hi.max(lo)
    }
}

fn sample(rng: &mut StdRng, bound: &'static str, low: i64, high: i64) -> ScalingResult<i64> {
    if low >= high {
        return Err(ScalingError::EmptyWindowRange { bound, low, high });
    }
    Ok(rng.gen_range(low..high))
}

/// Smallest admissible window end for a given start.
fn end_floor(start: i64, high: i64) -> ScalingResult<i64> {
    start
        .checked_add(MIN_WINDOW_DAYS)
        .ok_or(ScalingError::EmptyWindowRange {
            bound: "history end",
            low: i64::MAX,
            high,
        })
}

fn to_days(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaling(min: i64, max: i64) -> BetaScaling {
        BetaScaling::new(42, min, max, 150, 300).unwrap()
    }

    #[test]
    fn window_is_deterministic_per_draw() {
        let scaling = scaling(7, 42);
        for draw in DrawId::range(20) {
            let first = HistoryWindow::draw(draw, &scaling).unwrap();
            let second = HistoryWindow::draw(draw, &scaling).unwrap();
            assert_eq!(first, second);
            assert!((1..7).contains(&first.start()));
            assert!(first.end() >= first.start() + 7);
            assert!(first.end() < 42);
        }
    }

    #[test]
    fn empty_start_range_is_an_error() {
        let err = HistoryWindow::draw(DrawId::new(0), &scaling(1, 42)).unwrap_err();
        assert_eq!(
            err,
            ScalingError::EmptyWindowRange {
                bound: "history start",
                low: 1,
                high: 1
            }
        );
    }

    #[test]
    fn empty_end_range_is_an_error() {
        let err = HistoryWindow::draw(DrawId::new(0), &scaling(2, 8)).unwrap_err();
        assert!(matches!(err, ScalingError::EmptyWindowRange { bound: "history end", .. }));
    }

    #[test]
    fn end_floor_overflow_is_an_empty_range() {
        assert_eq!(end_floor(3, 42), Ok(10));
        assert_eq!(
            end_floor(i64::MAX - 3, i64::MAX),
            Err(ScalingError::EmptyWindowRange {
                bound: "history end",
                low: i64::MAX,
                high: i64::MAX
            })
        );
    }

    #[test]
    fn huge_bounds_do_not_overflow() {
        let window = HistoryWindow::draw(DrawId::new(0), &scaling(i64::MAX, i64::MAX));
        if let Err(err) = window {
            assert!(matches!(err, ScalingError::EmptyWindowRange { .. }));
        }
    }

    #[test]
    fn slice_range_clamps_to_history() {
        let window = HistoryWindow::new(DrawId::new(0), 3, 10);
        assert_eq!(window.slice_range(30), 20..27);
        assert_eq!(window.slice_range(5), 0..2);
        assert_eq!(window.slice_range(2), 0..0);
    }
}
