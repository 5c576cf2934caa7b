//! Connection path computation.

use topograph_core::Position;

/// Compute an SVG path between two positioned entities.
///
/// The path exits the source and enters the target on the edge pair
/// matching the dominant axis of displacement (top/bottom for mostly
/// vertical runs, left/right for mostly horizontal ones), so lines do not
/// cut through the icons they connect.
pub fn connection_path(source: &Position, target: &Position) -> String {
    let (mut sx, mut sy) = source.center();
    let (mut tx, mut ty) = target.center();

    if (ty - sy).abs() > (tx - sx).abs() {
        if ty > sy {
            sy = source.bottom();
            ty = target.y;
        } else {
            sy = source.y;
            ty = target.bottom();
        }
    } else if tx > sx {
        sx = source.right();
        tx = target.x;
    } else {
        sx = source.x;
        tx = target.right();
    }

    let mid_x = (sx + tx) / 2.0;
    let mid_y = (sy + ty) / 2.0;

    format!("M {sx} {sy} Q {mid_x} {sy}, {mid_x} {mid_y} Q {mid_x} {ty}, {tx} {ty}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_run_uses_bottom_and_top_edges() {
        let source = Position::new(100.0, 0.0, 64.0, 64.0);
        let target = Position::new(110.0, 300.0, 64.0, 64.0);

        let path = connection_path(&source, &target);
        // Exits the source bottom edge (y = 64) and enters the target top
        // edge (y = 300).
        assert!(path.starts_with("M 132 64 "));
        assert!(path.ends_with("142 300"));
    }

    #[test]
    fn test_horizontal_run_uses_side_edges() {
        let source = Position::new(0.0, 100.0, 64.0, 64.0);
        let target = Position::new(300.0, 110.0, 64.0, 64.0);

        let path = connection_path(&source, &target);
        assert!(path.starts_with("M 64 132 "));
        assert!(path.ends_with("300 142"));
    }

    #[test]
    fn test_leftward_run_swaps_edges() {
        let source = Position::new(300.0, 100.0, 64.0, 64.0);
        let target = Position::new(0.0, 100.0, 64.0, 64.0);

        let path = connection_path(&source, &target);
        assert!(path.starts_with("M 300 132 "));
        assert!(path.ends_with("64 132"));
    }
}
