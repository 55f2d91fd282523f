//! Geometry codec.
//!
//! Pure functions turning pixel-space rectangles into the interleaved
//! two-triangle layout uploaded to the vertex store.

mod quad;

pub use quad::{
    pixel_to_texel, rect_tex_coords, rect_vertices, square_vertices, Quad, QUAD_VERTEX_COUNT,
};
