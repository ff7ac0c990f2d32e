//! Shape rasterisation helpers used for carving passages.

/// Generate points forming a filled circle
pub fn filled_circle(center_x: i32, center_y: i32, radius: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                points.push((center_x + dx, center_y + dy));
            }
        }
    }

    points
}

/// Bresenham's line algorithm, both end points included.
pub fn bresenham_line(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut path = Vec::new();

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        path.push((x, y));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_radius_zero_is_single_point() {
        assert_eq!(filled_circle(4, 5, 0), vec![(4, 5)]);
    }

    #[test]
    fn test_circle_radius_one_is_plus() {
        let mut points = filled_circle(0, 0, 1);
        points.sort();
        assert_eq!(points, vec![(-1, 0), (0, -1), (0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_line_endpoints_and_steps() {
        let line = bresenham_line(0, 0, 5, 2);
        assert_eq!(line.first(), Some(&(0, 0)));
        assert_eq!(line.last(), Some(&(5, 2)));
        assert_eq!(line.len(), 6);

        for pair in line.windows(2) {
            let (ax, ay) = pair[0];
            let (bx, by) = pair[1];
            assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1);
        }
    }

    #[test]
    fn test_line_reversed_and_vertical() {
        assert_eq!(bresenham_line(2, 3, 2, 0), vec![(2, 3), (2, 2), (2, 1), (2, 0)]);
        assert_eq!(bresenham_line(3, 1, 1, 1), vec![(3, 1), (2, 1), (1, 1)]);
    }
}
