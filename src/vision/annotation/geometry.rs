// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Planar geometry over integer contour points

use imageproc::point::Point;

/// Axis-aligned box in pixel units, inclusive of both edge pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Width over height; infinite for a zero-height box
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return f64::INFINITY;
        }
        self.width as f64 / self.height as f64
    }
}

/// Drop the interior points of straight horizontal, vertical and diagonal runs
///
/// Equivalent to simple chain approximation: a closed chain keeps only the
/// points where the step direction changes.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |from: Point<i32>, to: Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    // A chain whose every step is identical is degenerate; keep its extremes
    if kept.is_empty() {
        return vec![points[0], points[n - 1]];
    }
    kept
}

/// Enclosed area of a closed polygon (shoelace formula, always non-negative)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    (twice_area as f64 / 2.0).abs()
}

/// Smallest upright box containing every point
pub fn bounding_rect(points: &[Point<i32>]) -> Option<PixelRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(PixelRect {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Convex hull (monotone chain), counter-clockwise in image coordinates,
/// without collinear points
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut pts: Vec<(i64, i64)> = points.iter().map(|p| (p.x as i64, p.y as i64)).collect();
    pts.sort_unstable();
    pts.dedup();

    if pts.len() < 3 {
        return pts.into_iter().map(|(x, y)| Point::new(x as i32, y as i32)).collect();
    }

    let cross = |o: (i64, i64), a: (i64, i64), b: (i64, i64)| {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(i64, i64)> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(i64, i64)> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);

    lower.into_iter().map(|(x, y)| Point::new(x as i32, y as i32)).collect()
}

/// Corners of the minimum-area rotated rectangle around the points
///
/// Rotating calipers over the convex hull. Corners are truncated toward zero.
/// Fewer than three hull points fall back to the upright extent.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<[Point<i32>; 4]> {
    let hull = convex_hull(points);

    if hull.is_empty() {
        return None;
    }

    if hull.len() < 3 {
        let bounds = bounding_rect(&hull)?;
        let (x0, y0) = (bounds.x, bounds.y);
        let (x1, y1) = (bounds.x + bounds.width - 1, bounds.y + bounds.height - 1);
        return Some([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]);
    }

    let hull: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = hull.len();

    let mut best: Option<(f64, [(f64, f64); 4])> = None;

    for i in 0..n {
        let (ax, ay) = hull[i];
        let (bx, by) = hull[(i + 1) % n];
        let (ex, ey) = (bx - ax, by - ay);
        let len = (ex * ex + ey * ey).sqrt();
        if len < f64::EPSILON {
            continue;
        }

        // Edge direction and its normal
        let (ux, uy) = (ex / len, ey / len);
        let (vx, vy) = (-uy, ux);

        let mut min_u = f64::INFINITY;
        let mut max_u = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        for &(px, py) in &hull {
            let (dx, dy) = (px - ax, py - ay);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().map_or(true, |(best_area, _)| area < *best_area) {
            let corner = |u: f64, v: f64| (ax + u * ux + v * vx, ay + u * uy + v * vy);
            best = Some((
                area,
                [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            ));
        }
    }

    let (_, corners) = best?;
    // Nudge away from float noise before truncating (29.9999 must stay 30)
    Some(corners.map(|(x, y)| Point::new((x + 1e-6_f64.copysign(x)) as i32, (y + 1e-6_f64.copysign(y)) as i32)))
}
