use crate::coords::Vec2;

/// Ordered chain of wall points in map units.
pub type WallPolyline = Vec<Vec2>;

/// Vertices emitted for one segment body (two triangles).
pub const BODY_VERTICES: usize = 6;

/// Vertices emitted for one zero-area edge element (two triangles).
pub const EDGE_VERTICES: usize = 6;

/// Quad edges per segment.
pub const EDGES_PER_SEGMENT: usize = 4;

/// Vertices per segment in shadow mode.
pub const SHADOW_SEGMENT_VERTICES: usize = BODY_VERTICES + EDGES_PER_SEGMENT * EDGE_VERTICES;

/// Position/normal streams, two floats per vertex each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,

    /// Zero-length or non-finite segments left out of the streams.
    pub skipped_segments: usize,
}

impl Mesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    fn push(&mut self, position: Vec2, normal: Vec2) {
        self.positions.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
    }
}

/// Builds triangle streams for every wall segment.
///
/// Each segment `A -> B` becomes a quad with corners `A±p`, `B±p` where
/// `p = thickness/2 * perp(normalize(B - A))`. Body vertices carry the normal of
/// their long edge.
///
/// With `for_shadow`, each of the four quad edges also gets a zero-area element:
/// the edge endpoints carry the edge's outward normal and their twins carry the
/// flipped normal. The caster shader pushes a vertex away from the light when its
/// normal points away from the light, so every element opens into that edge's
/// shadow quad while the twins stay on the edge.
///
/// Segments whose direction cannot be normalized are skipped and counted.
pub fn build_walls(walls: &[WallPolyline], thickness: f32, for_shadow: bool) -> Mesh {
    let mut mesh = Mesh::default();
    if !thickness.is_finite() {
        mesh.skipped_segments = walls.iter().map(|w| w.len().saturating_sub(1)).sum();
        return mesh;
    }

    let half = thickness.abs() * 0.5;
    let per_segment = if for_shadow { SHADOW_SEGMENT_VERTICES } else { BODY_VERTICES };
    let segments: usize = walls.iter().map(|w| w.len().saturating_sub(1)).sum();
    mesh.positions.reserve(segments * per_segment * 2);
    mesh.normals.reserve(segments * per_segment * 2);

    for wall in walls {
        for pair in wall.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let Some(d) = (b - a).normalized().filter(|_| a.is_finite() && b.is_finite()) else {
                mesh.skipped_segments += 1;
                continue;
            };

            let side = d.perp();
            let p = side * half;
            let (a_pos, b_pos, b_neg, a_neg) = (a + p, b + p, b - p, a - p);

            // body
            mesh.push(a_pos, side);
            mesh.push(b_pos, side);
            mesh.push(b_neg, -side);
            mesh.push(a_pos, side);
            mesh.push(b_neg, -side);
            mesh.push(a_neg, -side);

            if for_shadow {
                push_edge(&mut mesh, a_pos, b_pos, side);
                push_edge(&mut mesh, b_pos, b_neg, d);
                push_edge(&mut mesh, b_neg, a_neg, -side);
                push_edge(&mut mesh, a_neg, a_pos, -d);
            }
        }
    }

    mesh
}

/// Zero-area element for edge `p -> q` with outward normal `n`.
fn push_edge(mesh: &mut Mesh, p: Vec2, q: Vec2, n: Vec2) {
    mesh.push(p, n);
    mesh.push(q, n);
    mesh.push(q, -n);
    mesh.push(p, n);
    mesh.push(q, -n);
    mesh.push(p, -n);
}

/// Two triangles covering the map rectangle `[0, extent]`, with zero normals.
pub fn map_quad(extent: Vec2) -> Mesh {
    let mut mesh = Mesh::default();
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(extent.x, 0.0),
        Vec2::new(extent.x, extent.y),
        Vec2::new(0.0, 0.0),
        Vec2::new(extent.x, extent.y),
        Vec2::new(0.0, extent.y),
    ];
    for c in corners {
        mesh.push(c, Vec2::zero());
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn vertex(mesh: &Mesh, i: usize) -> (Vec2, Vec2) {
        (
            v(mesh.positions[2 * i], mesh.positions[2 * i + 1]),
            v(mesh.normals[2 * i], mesh.normals[2 * i + 1]),
        )
    }

    fn tri_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
        ((b - a).x * (c - a).y - (b - a).y * (c - a).x).abs() * 0.5
    }

    fn sample_walls() -> Vec<WallPolyline> {
        vec![
            vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 3.0)],
            vec![v(-2.0, 5.0), v(1.0, 9.0)],
        ]
    }

    // ── determinism ───────────────────────────────────────────────────────

    #[test]
    fn identical_inputs_give_identical_output() {
        for for_shadow in [false, true] {
            let a = build_walls(&sample_walls(), 0.5, for_shadow);
            let b = build_walls(&sample_walls(), 0.5, for_shadow);
            assert_eq!(a.positions.len(), b.positions.len());
            let bits = |xs: &[f32]| xs.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&a.positions), bits(&b.positions));
            assert_eq!(bits(&a.normals), bits(&b.normals));
        }
    }

    // ── degenerate input ──────────────────────────────────────────────────

    #[test]
    fn zero_length_segment_is_skipped_without_nan() {
        let walls = vec![vec![v(1.0, 1.0), v(1.0, 1.0), v(3.0, 1.0)]];
        for for_shadow in [false, true] {
            let mesh = build_walls(&walls, 1.0, for_shadow);
            assert_eq!(mesh.skipped_segments, 1);
            assert!(mesh.positions.iter().chain(&mesh.normals).all(|x| x.is_finite()));
            let expected = if for_shadow { SHADOW_SEGMENT_VERTICES } else { BODY_VERTICES };
            assert_eq!(mesh.vertex_count(), expected);
        }
    }

    #[test]
    fn only_degenerate_segment_yields_empty_mesh() {
        let mesh = build_walls(&[vec![v(1.0, 1.0), v(1.0, 1.0)]], 1.0, true);
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_segments, 1);
    }

    #[test]
    fn single_point_polyline_contributes_nothing() {
        let mesh = build_walls(&[vec![v(2.0, 2.0)], vec![]], 1.0, true);
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_segments, 0);
    }

    #[test]
    fn non_finite_point_is_skipped() {
        let walls = vec![vec![v(0.0, 0.0), v(f32::NAN, 1.0), v(2.0, 2.0)]];
        let mesh = build_walls(&walls, 1.0, false);
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_segments, 2);
    }

    #[test]
    fn non_finite_thickness_fails_closed() {
        let mesh = build_walls(&sample_walls(), f32::INFINITY, true);
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_segments, 3);
    }

    // ── counts ────────────────────────────────────────────────────────────

    #[test]
    fn positions_and_normals_have_equal_counts() {
        for for_shadow in [false, true] {
            let mesh = build_walls(&sample_walls(), 0.25, for_shadow);
            assert_eq!(mesh.positions.len(), mesh.normals.len());
            assert_eq!(mesh.positions.len() % 2, 0);
        }
    }

    #[test]
    fn vertex_count_per_segment() {
        assert_eq!(build_walls(&sample_walls(), 1.0, false).vertex_count(), 3 * BODY_VERTICES);
        assert_eq!(
            build_walls(&sample_walls(), 1.0, true).vertex_count(),
            3 * SHADOW_SEGMENT_VERTICES
        );
    }

    // ── body layout ───────────────────────────────────────────────────────

    #[test]
    fn body_corners_are_offset_by_half_thickness() {
        let mesh = build_walls(&[vec![v(0.0, 0.0), v(10.0, 0.0)]], 2.0, false);
        let corners: Vec<Vec2> = (0..6).map(|i| vertex(&mesh, i).0).collect();
        assert_eq!(corners[0], v(0.0, 1.0));
        assert_eq!(corners[1], v(10.0, 1.0));
        assert_eq!(corners[2], v(10.0, -1.0));
        assert_eq!(corners[5], v(0.0, -1.0));
    }

    #[test]
    fn body_normals_follow_their_long_edge() {
        let mesh = build_walls(&[vec![v(0.0, 0.0), v(10.0, 0.0)]], 2.0, false);
        for i in 0..BODY_VERTICES {
            let (pos, n) = vertex(&mesh, i);
            assert_eq!(n, if pos.y > 0.0 { v(0.0, 1.0) } else { v(0.0, -1.0) });
        }
    }

    #[test]
    fn body_triangles_cover_the_quad() {
        let mesh = build_walls(&[vec![v(0.0, 0.0), v(10.0, 0.0)]], 2.0, false);
        let area: f32 = (0..2)
            .map(|t| tri_area(vertex(&mesh, 3 * t).0, vertex(&mesh, 3 * t + 1).0, vertex(&mesh, 3 * t + 2).0))
            .sum();
        assert!((area - 20.0).abs() < 1e-4);
    }

    // ── shadow edges ──────────────────────────────────────────────────────

    #[test]
    fn edge_elements_have_zero_area() {
        let mesh = build_walls(&[vec![v(1.0, 2.0), v(5.0, 7.0)]], 0.5, true);
        for t in (BODY_VERTICES / 3)..(SHADOW_SEGMENT_VERTICES / 3) {
            let area = tri_area(vertex(&mesh, 3 * t).0, vertex(&mesh, 3 * t + 1).0, vertex(&mesh, 3 * t + 2).0);
            assert!(area < 1e-5, "triangle {t} has area {area}");
        }
    }

    #[test]
    fn edge_endpoints_carry_outward_normal() {
        let mesh = build_walls(&[vec![v(0.0, 0.0), v(10.0, 0.0)]], 2.0, true);
        let center = v(5.0, 0.0);
        for e in 0..EDGES_PER_SEGMENT {
            let base = BODY_VERTICES + e * EDGE_VERTICES;
            let (p, n) = vertex(&mesh, base);
            let (q, nq) = vertex(&mesh, base + 1);
            assert_eq!(n, nq);
            let mid = (p + q) * 0.5;
            assert!((mid - center).dot(n) > 0.0, "edge {e} normal points inward");
            assert!((n.length() - 1.0).abs() < 1e-6);
            // twins sit on the same edge with the flipped normal
            let (q2, flipped) = vertex(&mesh, base + 2);
            assert_eq!(q2, q);
            assert_eq!(flipped, -n);
        }
    }

    // ── map quad ──────────────────────────────────────────────────────────

    #[test]
    fn map_quad_spans_extent() {
        let mesh = map_quad(v(8.0, 6.0));
        assert_eq!(mesh.vertex_count(), 6);
        let area = tri_area(vertex(&mesh, 0).0, vertex(&mesh, 1).0, vertex(&mesh, 2).0)
            + tri_area(vertex(&mesh, 3).0, vertex(&mesh, 4).0, vertex(&mesh, 5).0);
        assert_eq!(area, 48.0);
        assert!(mesh.normals.iter().all(|&n| n == 0.0));
    }
}
