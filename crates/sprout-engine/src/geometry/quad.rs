use crate::coords::Rect;

/// Vertices per sprite: two triangles, no index buffer.
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Six 2D points in triangle-list order.
pub type Quad = [[f32; 2]; QUAD_VERTEX_COUNT as usize];

/// Builds the two triangles covering `rect`.
///
/// Layout (y grows downward):
///
/// ```text
/// 0,3 ──── 1
///  │ ╲     │
///  │   ╲   │
///  5 ──── 2,4
/// ```
///
/// Both triangles have positive signed area in pixel coordinates
/// (counter-clockwise in the math convention). Pipelines do not cull.
pub fn rect_vertices(rect: Rect) -> Quad {
    let (x0, y0) = (rect.origin.x, rect.origin.y);
    let (x1, y1) = (x0 + rect.size.x, y0 + rect.size.y);

    [
        // upper right triangle
        [x0, y0],
        [x1, y0],
        [x1, y1],
        // lower left triangle
        [x0, y0],
        [x1, y1],
        [x0, y1],
    ]
}

/// `rect_vertices` for a square of side `size`.
#[inline]
pub fn square_vertices(x: f32, y: f32, size: f32) -> Quad {
    rect_vertices(Rect::square(x, y, size))
}

/// Texture coordinates for a region of the texture, in texture pixels.
///
/// Same winding as [`rect_vertices`]. Convert with [`pixel_to_texel`] before upload.
#[inline]
pub fn rect_tex_coords(region: Rect) -> Quad {
    rect_vertices(region)
}

/// Normalizes texture-pixel coordinates into `[0, 1]` texel space.
pub fn pixel_to_texel(mut quad: Quad, texture_width: u32, texture_height: u32) -> Quad {
    let w = texture_width.max(1) as f32;
    let h = texture_height.max(1) as f32;
    for [u, v] in quad.iter_mut() {
        *u /= w;
        *v /= h;
    }
    quad
}
