//! Test data generators for synthetic band data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read, cropped or
/// resampled correctly by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates one test grid per band, offset by `band * 1_000_000`.
///
/// Band `b` holds `b * 1_000_000 + col * 1000 + row`, so a value identifies
/// its band and cell.
pub fn create_band_stack(width: usize, height: usize, bands: usize) -> Vec<Vec<f32>> {
    (0..bands)
        .map(|band| {
            create_test_grid(width, height)
                .into_iter()
                .map(|v| v + (band * 1_000_000) as f32)
                .collect()
        })
        .collect()
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a test grid with `value` at the given (col, row) positions.
///
/// Useful for testing no-data handling.
pub fn create_grid_with_value_at(
    width: usize,
    height: usize,
    positions: &[(usize, usize)],
    value: f32,
) -> Vec<f32> {
    let mut data = create_test_grid(width, height);
    for &(col, row) in positions {
        if col < width && row < height {
            data[row * width + col] = value;
        }
    }
    data
}
