//! CPU geometry synthesis for casters and full-map passes.

mod walls;

pub use walls::{
    build_walls, map_quad, Mesh, WallPolyline, BODY_VERTICES, EDGES_PER_SEGMENT, EDGE_VERTICES,
    SHADOW_SEGMENT_VERTICES,
};
