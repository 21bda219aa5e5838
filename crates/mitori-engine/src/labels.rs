//! Distance labels: virtual-unit gaps between consecutive grid lines.
//!
//! Each axis gets an ordered list of `(pixel center, rounded virtual
//! delta)` pairs derived from the grid points projected onto that axis,
//! with the two image edges as implicit endpoints. Recomputation is
//! idempotent: the same point set always yields the same labels, no
//! matter the insertion order.

use crate::types::GridPoint;
use crate::viewport::Viewport;

/// One measured gap between two adjacent reference lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceLabel {
    /// Canvas-pixel midpoint between the two lines, along the axis.
    pub center: f64,
    /// Gap size in virtual units, rounded to the nearest integer.
    pub value: i64,
}

/// Which axis a break list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Breaks along x, produced by points with a vertical line.
    X,
    /// Breaks along y, produced by points with a horizontal line.
    Y,
}

/// Collect the sorted logical break positions for one axis.
///
/// The list is seeded with the image edges (0 and 100); each matching
/// point is insertion-sorted strictly between existing breaks, so
/// duplicates and edge-coincident coordinates contribute nothing.
#[must_use]
pub fn axis_breaks(points: &[GridPoint], axis: Axis) -> Vec<f64> {
    let mut breaks = vec![0.0, 100.0];
    for point in points {
        let (selected, coordinate) = match axis {
            Axis::X => (point.vertical, point.x),
            Axis::Y => (point.horizontal, point.y),
        };
        if !selected {
            continue;
        }
        for j in 0..breaks.len() - 1 {
            if breaks[j] < coordinate && breaks[j + 1] > coordinate {
                breaks.insert(j + 1, coordinate);
                break;
            }
        }
    }
    breaks
}

/// Walk consecutive breaks, producing a label per gap.
///
/// `offset` and `draw_size` place the axis on the canvas (the
/// viewport's x components for [`Axis::X`], y components for
/// [`Axis::Y`]); `virtual_size` scales the values.
#[allow(clippy::cast_possible_truncation)]
fn walk_breaks(breaks: &[f64], offset: f64, draw_size: f64, virtual_size: f64) -> Vec<DistanceLabel> {
    let mut labels = Vec::with_capacity(breaks.len().saturating_sub(1));
    let mut previous = offset;
    for window in breaks.windows(2) {
        let &[lower, upper] = window else { break };
        let current = draw_size * (upper / 100.0) + offset;
        labels.push(DistanceLabel {
            center: previous + (current - previous) / 2.0,
            value: ((upper / 100.0) * virtual_size - (lower / 100.0) * virtual_size).round() as i64,
        });
        previous = current;
    }
    labels
}

/// Compute both axes' labels for the current viewport and virtual size.
///
/// Returns `(x_labels, y_labels)`.
#[must_use]
pub fn compute(
    points: &[GridPoint],
    viewport: &Viewport,
    virtual_width: f64,
    virtual_height: f64,
) -> (Vec<DistanceLabel>, Vec<DistanceLabel>) {
    let x_breaks = axis_breaks(points, Axis::X);
    let y_breaks = axis_breaks(points, Axis::Y);
    (
        walk_breaks(&x_breaks, viewport.offset_x, viewport.draw_width, virtual_width),
        walk_breaks(&y_breaks, viewport.offset_y, viewport.draw_height, virtual_height),
    )
}
