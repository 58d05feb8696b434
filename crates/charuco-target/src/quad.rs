use serde::{Deserialize, Serialize};

use crate::segmentation::Component;

/// Options for fitting quadrilaterals to dark components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitQuadConfig {
    /// Minimum number of pixels of a component.
    pub min_component_pixels: usize,
    /// Minimum bounding box perimeter, relative to the larger image side.
    pub min_perimeter_rate: f64,
    /// Maximum bounding box perimeter, relative to the larger image side.
    pub max_perimeter_rate: f64,
    /// Minimum ratio between the quad area and the area of the convex hull.
    pub min_fill_ratio: f64,
    /// Minimum side length, relative to the quad perimeter.
    pub min_corner_distance_rate: f64,
}

impl Default for FitQuadConfig {
    fn default() -> Self {
        Self {
            min_component_pixels: 20,
            min_perimeter_rate: 0.03,
            max_perimeter_rate: 4.0,
            min_fill_ratio: 0.85,
            min_corner_distance_rate: 0.05,
        }
    }
}

/// A marker candidate: four corners, clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Corners in image coordinates, pixel centres at integers.
    pub corners: [[f64; 2]; 4],
}

impl Quad {
    /// Sum of the side lengths.
    pub fn perimeter(&self) -> f64 {
        (0..4)
            .map(|i| distance(self.corners[i], self.corners[(i + 1) % 4]))
            .sum()
    }
}

#[inline]
fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

#[inline]
fn cross(o: [i64; 2], a: [i64; 2], b: [i64; 2]) -> i64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Convex hull of sorted, unique points with Andrew's monotone chain.
///
/// Collinear points are dropped. The hull winds with a positive shoelace sum,
/// which is clockwise on screen.
pub fn convex_hull(points: &[[i64; 2]]) -> Vec<[i64; 2]> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut lower: Vec<[i64; 2]> = Vec::with_capacity(points.len());
    for &p in points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<[i64; 2]> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Signed polygon area, positive for clockwise on screen.
pub fn polygon_area(poly: &[[f64; 2]]) -> f64 {
    let n = poly.len();
    0.5 * (0..n)
        .map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f64>()
}

/// Fits a quad to a component, or returns `None` when it is not quad shaped.
///
/// The quad corners are the two farthest hull points plus the hull points
/// farthest on either side of the line joining them. Each side is then
/// refitted to the outline pixels near it.
pub fn fit_quad(component: &Component, width: usize, height: usize, config: &FitQuadConfig) -> Option<Quad> {
    if component.num_pixels < config.min_component_pixels || component.touches_border {
        return None;
    }

    let max_side = width.max(height) as f64;
    let perimeter = component.bbox_perimeter() as f64;
    if perimeter < config.min_perimeter_rate * max_side
        || perimeter > config.max_perimeter_rate * max_side
    {
        return None;
    }

    let boundary = component.boundary_points();
    let hull = convex_hull(&boundary);
    if hull.len() < 4 {
        return None;
    }

    // the diameter of the hull
    let mut diameter = (0i64, 0usize, 0usize);
    for i in 0..hull.len() {
        for j in i + 1..hull.len() {
            let (dx, dy) = (hull[i][0] - hull[j][0], hull[i][1] - hull[j][1]);
            let d = dx * dx + dy * dy;
            if d > diameter.0 {
                diameter = (d, i, j);
            }
        }
    }
    let (_, ia, ic) = diameter;

    // farthest points on each side of the diagonal
    let (mut ib, mut best_b) = (None, 0i64);
    let (mut id, mut best_d) = (None, 0i64);
    for (k, &p) in hull.iter().enumerate() {
        let s = cross(hull[ia], hull[ic], p);
        if s > best_b {
            best_b = s;
            ib = Some(k);
        }
        if s < best_d {
            best_d = s;
            id = Some(k);
        }
    }
    let (ib, id) = (ib?, id?);

    let mut indices = [ia, ib, ic, id];
    indices.sort_unstable();
    let mut corners = indices.map(|k| [hull[k][0] as f64, hull[k][1] as f64]);

    let hull_f: Vec<[f64; 2]> = hull.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();
    let hull_area = polygon_area(&hull_f).abs();
    let quad_area = polygon_area(&corners);
    if hull_area <= 0.0 || quad_area.abs() / hull_area < config.min_fill_ratio {
        return None;
    }
    if quad_area < 0.0 {
        corners.reverse();
    }

    let quad = Quad { corners };
    let min_side = config.min_corner_distance_rate * quad.perimeter();
    if (0..4).any(|i| distance(corners[i], corners[(i + 1) % 4]) < min_side) {
        return None;
    }

    refine_sides(&quad, &boundary)
}

// line n . p = c with unit normal n pointing out of the quad
#[derive(Debug, Clone, Copy)]
struct Line {
    n: [f64; 2],
    c: f64,
}

/// Refit each side to the outline pixels near it and intersect the sides.
///
/// Outline pixel centres lie half a pixel inside the dark region, so the
/// lines are moved outwards by that amount.
fn refine_sides(quad: &Quad, boundary: &[[i64; 2]]) -> Option<Quad> {
    let q = &quad.corners;

    let lines: Vec<Line> = (0..4)
        .map(|i| {
            let (p0, p1) = (q[i], q[(i + 1) % 4]);
            let len = distance(p0, p1);
            let d = [(p1[0] - p0[0]) / len, (p1[1] - p0[1]) / len];
            let n = [d[1], -d[0]];
            let tol = (0.05 * len).max(1.5);

            let near: Vec<[f64; 2]> = boundary
                .iter()
                .map(|p| [p[0] as f64, p[1] as f64])
                .filter(|p| {
                    let r = [p[0] - p0[0], p[1] - p0[1]];
                    let t = (r[0] * d[0] + r[1] * d[1]) / len;
                    let dist = r[0] * n[0] + r[1] * n[1];
                    (0.1..=0.9).contains(&t) && dist.abs() <= tol
                })
                .collect();

            let line = fit_line(&near)
                .map(|(fit_n, c)| {
                    if fit_n[0] * n[0] + fit_n[1] * n[1] < 0.0 {
                        Line {
                            n: [-fit_n[0], -fit_n[1]],
                            c: -c,
                        }
                    } else {
                        Line { n: fit_n, c }
                    }
                })
                .unwrap_or(Line {
                    n,
                    c: n[0] * p0[0] + n[1] * p0[1],
                });

            Line {
                n: line.n,
                c: line.c + 0.5 * line.n[0].abs().max(line.n[1].abs()),
            }
        })
        .collect();

    let mut corners = [[0.0; 2]; 4];
    for i in 0..4 {
        let (a, b) = (lines[(i + 3) % 4], lines[i]);
        let det = a.n[0] * b.n[1] - a.n[1] * b.n[0];
        if det.abs() < 1e-3 {
            return None;
        }
        let x = (a.c * b.n[1] - a.n[1] * b.c) / det;
        let y = (a.n[0] * b.c - a.c * b.n[0]) / det;
        // keep the hull corner when the fit went astray
        corners[i] = if distance([x, y], q[i]) > 3.0 {
            q[i]
        } else {
            [x, y]
        };
    }

    Some(Quad { corners })
}

/// Total least squares line through at least 3 points as `(unit normal, offset)`.
fn fit_line(points: &[[f64; 2]]) -> Option<([f64; 2], f64)> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy) = (p[0] - mx, p[1] - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let normal = [-theta.sin(), theta.cos()];
    Some((normal, normal[0] * mx + normal[1] * my))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::find_connected_components;
    use crate::union_find::UnionFind;
    use charuco_image::{GrayImage, Image};

    fn filled_square(size: usize, x0: usize, y0: usize, side: usize) -> GrayImage {
        let mut image = Image::from_size_val([size, size].into(), 0u8);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                image.as_slice_mut()[y * size + x] = 255;
            }
        }
        image
    }

    #[test]
    fn hull_of_a_square() {
        let points = [[0, 0], [0, 2], [1, 0], [1, 1], [2, 0], [2, 2]];
        let hull = convex_hull(&points);
        assert_eq!(hull, vec![[0, 0], [2, 0], [2, 2], [0, 2]]);
        let hull_f: Vec<[f64; 2]> = hull.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();
        assert_eq!(polygon_area(&hull_f), 4.0);
    }

    #[test]
    fn axis_aligned_square_edges() {
        let image = filled_square(60, 10, 20, 30);
        let mut uf = UnionFind::new(0);
        let comps = find_connected_components(&image, &mut uf);
        assert_eq!(comps.len(), 1);

        let quad = fit_quad(&comps[0], 60, 60, &FitQuadConfig::default());
        let Some(quad) = quad else {
            panic!("square not fitted");
        };
        // pixels 10..40 x 20..50: edges at 9.5 and 39.5, 19.5 and 49.5
        let mut expected = vec![[9.5, 19.5], [39.5, 19.5], [39.5, 49.5], [9.5, 49.5]];
        for c in quad.corners {
            let k = expected
                .iter()
                .position(|e| distance(*e, c) < 1e-9)
                .unwrap_or_else(|| panic!("unexpected corner {c:?}"));
            expected.remove(k);
        }
        assert!(polygon_area(&quad.corners) > 0.0);
    }

    #[test]
    fn rejects_border_and_tiny_components() {
        let image = filled_square(60, 0, 0, 30);
        let mut uf = UnionFind::new(0);
        let comps = find_connected_components(&image, &mut uf);
        assert_eq!(fit_quad(&comps[0], 60, 60, &FitQuadConfig::default()), None);

        let image = filled_square(60, 20, 20, 2);
        let comps = find_connected_components(&image, &mut uf);
        assert_eq!(fit_quad(&comps[0], 60, 60, &FitQuadConfig::default()), None);
    }

    #[test]
    fn rejects_triangles() {
        let size = 60;
        let mut image = Image::from_size_val([size, size].into(), 0u8);
        for y in 10..50 {
            for x in 10..(10 + (y - 10)) {
                image.as_slice_mut()[y * size + x] = 255;
            }
        }
        let mut uf = UnionFind::new(0);
        let comps = find_connected_components(&image, &mut uf);
        assert_eq!(fit_quad(&comps[0], size, size, &FitQuadConfig::default()), None);
    }
}
