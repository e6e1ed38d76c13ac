//! Viewport transform
//!
//! Maps page-space coordinates (PDF user space, y up) onto surface pixels
//! (y down) for a given scale and rotation. The matrix layout matches the
//! usual `[a, b, c, d, e, f]` affine form.

use super::types::{PageBox, Rotation, TextRun, TextSpan};

/// Affine matrix `[a, b, c, d, e, f]`
pub type Transform = [f32; 6];

/// Scale + rotation mapping for one page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub rotation: Rotation,
    /// Transformed width in pixels
    pub width: f32,
    /// Transformed height in pixels
    pub height: f32,
    pub transform: Transform,
}

impl Viewport {
    #[must_use]
    pub fn new(page_box: PageBox, scale: f32, rotation: Rotation) -> Self {
        let PageBox { x0, y0, x1, y1 } = page_box;
        let center_x = (x0 + x1) / 2.0;
        let center_y = (y0 + y1) / 2.0;

        let (rotate_a, rotate_b, rotate_c, rotate_d) = match rotation {
            Rotation::Deg0 => (1.0, 0.0, 0.0, -1.0),
            Rotation::Deg90 => (0.0, 1.0, 1.0, 0.0),
            Rotation::Deg180 => (-1.0, 0.0, 0.0, 1.0),
            Rotation::Deg270 => (0.0, -1.0, -1.0, 0.0),
        };

        let (offset_x, offset_y, width, height) = if rotation.is_sideways() {
            (
                (center_y - y0).abs() * scale,
                (center_x - x0).abs() * scale,
                (y1 - y0).abs() * scale,
                (x1 - x0).abs() * scale,
            )
        } else {
            (
                (center_x - x0).abs() * scale,
                (center_y - y0).abs() * scale,
                (x1 - x0).abs() * scale,
                (y1 - y0).abs() * scale,
            )
        };

        let transform = [
            rotate_a * scale,
            rotate_b * scale,
            rotate_c * scale,
            rotate_d * scale,
            offset_x - rotate_a * scale * center_x - rotate_c * scale * center_y,
            offset_y - rotate_b * scale * center_x - rotate_d * scale * center_y,
        ];

        Self {
            scale,
            rotation,
            width,
            height,
            transform,
        }
    }

    /// Surface size in whole pixels
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.ceil() as u32, self.height.ceil() as u32)
    }

    /// Map a page-space point onto the surface
    #[must_use]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.transform;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Position a text run on the surface using the same transform as the raster
    #[must_use]
    pub fn place(&self, run: &TextRun) -> TextSpan {
        let m = compose(&self.transform, &run.transform);
        let font_size = m[2].hypot(m[3]);
        TextSpan {
            text: run.text.clone(),
            left: m[4],
            top: m[5] - font_size,
            font_size,
            font_name: run.font_name.clone(),
        }
    }
}

/// `m1 × m2`, applying `m2` first
#[must_use]
pub fn compose(m1: &Transform, m2: &Transform) -> Transform {
    [
        m1[0] * m2[0] + m1[2] * m2[1],
        m1[1] * m2[0] + m1[3] * m2[1],
        m1[0] * m2[2] + m1[2] * m2[3],
        m1[1] * m2[2] + m1[3] * m2[3],
        m1[0] * m2[4] + m1[2] * m2[5] + m1[4],
        m1[1] * m2[4] + m1[3] * m2[5] + m1[5],
    ]
}
