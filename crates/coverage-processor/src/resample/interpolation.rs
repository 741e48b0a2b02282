//! Interpolation kernels for grid resampling.
//!
//! Positions are fractional pixel indices where `(0.0, 0.0)` is the centre
//! of the top-left cell. Taps falling off the grid repeat the edge cell.

use crate::types::InterpolationMethod;

/// Borrowed view of one band's samples, row-major, top row first.
#[derive(Debug, Clone, Copy)]
pub struct PixelGrid<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
}

impl<'a> PixelGrid<'a> {
    pub fn new(data: &'a [f32], width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Interpolate at a pixel position, clamped onto the grid.
    ///
    /// NaN marks missing samples: bilinear returns NaN when any tap is
    /// missing, bicubic drops back to bilinear.
    pub fn sample(&self, method: InterpolationMethod, x: f64, y: f64) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f64);
        let y = y.clamp(0.0, (self.height - 1) as f64);

        match method {
            InterpolationMethod::Nearest => self.nearest(x, y),
            InterpolationMethod::Bilinear => self.bilinear(x, y),
            InterpolationMethod::Cubic => self.bicubic(x, y),
        }
    }

    fn at(&self, col: i64, row: i64) -> f32 {
        let col = col.clamp(0, self.width as i64 - 1) as usize;
        let row = row.clamp(0, self.height as i64 - 1) as usize;
        self.data[row * self.width + col]
    }

    fn nearest(&self, x: f64, y: f64) -> f32 {
        self.at(x.round() as i64, y.round() as i64)
    }

    fn bilinear(&self, x: f64, y: f64) -> f32 {
        let (col, row) = (x.floor(), y.floor());
        let (tx, ty) = ((x - col) as f32, (y - row) as f32);
        let (col, row) = (col as i64, row as i64);

        let taps = [
            self.at(col, row),
            self.at(col + 1, row),
            self.at(col, row + 1),
            self.at(col + 1, row + 1),
        ];
        if taps.iter().any(|v| v.is_nan()) {
            return f32::NAN;
        }

        let top = lerp(taps[0], taps[1], tx);
        let bottom = lerp(taps[2], taps[3], tx);
        lerp(top, bottom, ty)
    }

    fn bicubic(&self, x: f64, y: f64) -> f32 {
        let (col, row) = (x.floor(), y.floor());
        let (tx, ty) = ((x - col) as f32, (y - row) as f32);
        let (col, row) = (col as i64, row as i64);

        let mut rows = [0.0f32; 4];
        for (dy, out) in (-1..=2).zip(rows.iter_mut()) {
            let taps = [-1, 0, 1, 2].map(|dx| self.at(col + dx, row + dy));
            if taps.iter().any(|v| v.is_nan()) {
                return self.bilinear(x, y);
            }
            *out = catmull_rom(taps, tx);
        }

        catmull_rom(rows, ty)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Catmull-Rom spline through `p[1]` (t = 0) and `p[2]` (t = 1).
fn catmull_rom(p: [f32; 4], t: f32) -> f32 {
    let a = -0.5 * p[0] + 1.5 * p[1] - 1.5 * p[2] + 0.5 * p[3];
    let b = p[0] - 2.5 * p[1] + 2.0 * p[2] - 0.5 * p[3];
    let c = -0.5 * p[0] + 0.5 * p[2];
    ((a * t + b) * t + c) * t + p[1]
}
