//! Tile geometry data structures and generation

use crate::backend::types::TileVertex;
use glam::{Vec2, Vec3};

/// CPU-side tile geometry with vertex and index data
#[derive(Debug, Clone)]
pub struct TileGeometry {
    pub vertices: Vec<TileVertex>,
    pub indices: Vec<u32>,
}

impl TileGeometry {
    pub fn new(vertices: Vec<TileVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Create a flat square patch on the XZ plane, subdivided into a grid
    ///
    /// Produces `(segments + 1)^2` vertices and `segments^2 * 6` indices.
    pub fn patch(size: f32, segments: u32) -> Self {
        let mut vertices = Vec::with_capacity(((segments + 1) * (segments + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);

        let half = size * 0.5;
        let step = size / segments as f32;

        for row in 0..=segments {
            for col in 0..=segments {
                let x = -half + col as f32 * step;
                let z = -half + row as f32 * step;
                vertices.push(TileVertex {
                    position: Vec3::new(x, 0.0, z),
                    normal: Vec3::Y,
                    uv: Vec2::new(
                        col as f32 / segments as f32,
                        row as f32 / segments as f32,
                    ),
                });
            }
        }

        let stride = segments + 1;
        for row in 0..segments {
            for col in 0..segments {
                let a = row * stride + col;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_counts() {
        let geometry = TileGeometry::patch(1.0, 1);
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.index_count(), 6);
        assert_eq!(geometry.triangle_count(), 2);

        let geometry = TileGeometry::patch(10.0, 4);
        assert_eq!(geometry.vertex_count(), 25);
        assert_eq!(geometry.index_count(), 96);
    }

    #[test]
    fn patch_indices_in_range() {
        let geometry = TileGeometry::patch(2.0, 3);
        let max = geometry.vertex_count() as u32;
        assert!(geometry.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn patch_spans_size() {
        let geometry = TileGeometry::patch(4.0, 2);
        let min_x = geometry
            .vertices
            .iter()
            .map(|v| v.position.x)
            .fold(f32::INFINITY, f32::min);
        let max_x = geometry
            .vertices
            .iter()
            .map(|v| v.position.x)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min_x, -2.0);
        assert_eq!(max_x, 2.0);
    }
}
