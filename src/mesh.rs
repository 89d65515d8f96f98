//! Vertex format and quad helpers shared by the element mesh generators

use crate::types::{Color, LayoutRect, Vec2, VERTICES_PER_QUAD};
use serde::Serialize;

/// Screen space is y-down, mesh space is y-up.
pub const FLIP: Vec2 = Vec2 { x: 1.0, y: -1.0 };
pub const FORWARD: [f32; 3] = [0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
    /// xy: background uv, zw: foreground uv.
    pub uv1: [f32; 4],
    pub uv2: [f32; 4],
}

impl Vertex {
    fn at(point: Vec2, color: Color, uv1: [f32; 4]) -> Self {
        Self {
            position: [point.x * FLIP.x, point.y * FLIP.y, 0.0],
            normal: FORWARD,
            color,
            uv1,
            uv2: [0.0; 4],
        }
    }
}

/// Which uv channel a quad's texture coordinates go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvChannel {
    Background,
    Foreground,
}

/// Writes one quad into the first four vertices of `vertices`, corners
/// ordered top-left, top-right, bottom-left, bottom-right.
pub fn write_quad(vertices: &mut [Vertex], rect: LayoutRect, uv: [f32; 4], channel: UvChannel, color: Color) {
    let [u0, v0, u1, v1] = uv;
    let corners = [
        (Vec2::new(rect.min.x, rect.min.y), (u0, v0)),
        (Vec2::new(rect.max.x, rect.min.y), (u1, v0)),
        (Vec2::new(rect.min.x, rect.max.y), (u0, v1)),
        (Vec2::new(rect.max.x, rect.max.y), (u1, v1)),
    ];
    for (vertex, (point, (u, v))) in vertices.iter_mut().take(VERTICES_PER_QUAD).zip(corners) {
        let uv1 = match channel {
            UvChannel::Background => [u, v, 0.0, 0.0],
            UvChannel::Foreground => [0.0, 0.0, u, v],
        };
        *vertex = Vertex::at(point, color, uv1);
    }
}

pub fn clear_vertices(vertices: &mut [Vertex]) {
    vertices.fill(Vertex::default());
}
