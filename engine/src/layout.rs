//! Grid layout.
//!
//! Two algorithms place the photos on the canvas:
//!
//! - **Square**: equal tiles, column count rebalanced so the last column is
//!   never mostly empty, filled column-major and centered on the canvas.
//! - **Justified**: rows of a shared height where each photo keeps its aspect
//!   ratio; the last photo of a row is stretched so every row has exactly the
//!   same width.
//!
//! Placements may extend past the canvas. That only produces a warning, the
//! compositor clips whatever falls outside.

use common::{GridMode, MediaItem};

/// Where and how large a single photo is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Canvas and grid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Tile edge length
    pub tile: u32,
    pub spacing: u32,
    /// Requested number of columns
    pub columns: usize,
}

impl GridSpec {
    /// Target width of a justified row
    pub fn desired_row_width(&self) -> i64 {
        let columns = self.columns.max(1) as i64;
        columns * (self.tile as i64 + self.spacing as i64) - self.spacing as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// One placement per item, in item order
    pub placements: Vec<Placement>,
    pub rows: usize,
    pub cols: usize,
    /// The grid is larger than the canvas on at least one axis
    pub overflow: bool,
}

/// Lay out `items` with the selected algorithm
pub fn compute(mode: GridMode, items: &[MediaItem], spec: &GridSpec) -> Layout {
    match mode {
        GridMode::Square => square_grid(items.len(), spec),
        GridMode::Justified => justified_grid(items, spec),
    }
}

/// Rows and columns of a square grid for `count` items.
///
/// `rows = ceil(count / columns)`, then `cols = ceil(count / rows)` so 7
/// items in 5 requested columns become 2 rows of 4 instead of 5 + 2.
pub fn square_dimensions(count: usize, columns: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }

    let rows = count.div_ceil(columns.max(1));
    let cols = count.div_ceil(rows);
    (rows, cols)
}

/// Equal-size square tiles, filled column by column
pub fn square_grid(count: usize, spec: &GridSpec) -> Layout {
    let (rows, cols) = square_dimensions(count, spec.columns);
    if count == 0 {
        return Layout::default();
    }

    let step = spec.tile as f64 + spec.spacing as f64;
    let grid_width = cols as f64 * step - spec.spacing as f64;
    let grid_height = rows as f64 * step - spec.spacing as f64;

    let dx = (spec.canvas_width as f64 - grid_width) / 2.0;
    let dy = (spec.canvas_height as f64 - grid_height) / 2.0;

    let overflow = dx < 0.0 || dy < 0.0;
    if overflow {
        log::warn!(
            "Grid ({:.0}x{:.0}) exceeds the output size ({}x{}), consider a smaller grid size",
            grid_width,
            grid_height,
            spec.canvas_width,
            spec.canvas_height
        );
    }

    let placements = (0..count)
        .map(|index| {
            let col = (index / rows) as f64;
            let row = (index % rows) as f64;

            Placement {
                x: (dx + col * step) as i64,
                y: (dy + row * step) as i64,
                width: spec.tile,
                height: spec.tile,
            }
        })
        .collect();

    Layout {
        placements,
        rows,
        cols,
        overflow,
    }
}

/// Width left for photos in a justified row of `count` items
pub fn available_row_width(count: usize, spacing: u32, desired_width: i64) -> i64 {
    desired_width - spacing as i64 * (count as i64 - 1).max(0)
}

/// Height shared by a justified row with the given aspect ratios.
///
/// The gaps between items are taken off `desired_width` first, so that the
/// photos alone fill what remains at their natural aspect ratio.
pub fn row_height(ratios: &[f64], spacing: u32, desired_width: i64) -> u32 {
    let sum: f64 = ratios.iter().sum();
    let sum = if sum > 0.0 { sum } else { 1.0 };
    let available = available_row_width(ratios.len(), spacing, desired_width);

    ((available as f64 / sum) as u32).max(1)
}

/// Widths of a justified row.
///
/// Every width is the photo's aspect ratio times `height`, truncated. The
/// last one then absorbs whatever truncation lost so that the widths plus
/// spacing add up to `desired_width`. With `height` from [`row_height`] the
/// last width is never below its own truncated share.
pub fn row_widths(ratios: &[f64], height: u32, spacing: u32, desired_width: i64) -> Vec<u32> {
    let available = available_row_width(ratios.len(), spacing, desired_width);

    let mut widths: Vec<u32> = ratios
        .iter()
        .map(|ratio| (ratio * height as f64) as u32)
        .collect();

    if let Some((last, rest)) = widths.split_last_mut() {
        let used: i64 = rest.iter().map(|w| *w as i64).sum();
        *last = (available - used).max(0) as u32;
    }

    widths
}

/// Rows of equal height that preserve each photo's aspect ratio
pub fn justified_grid(items: &[MediaItem], spec: &GridSpec) -> Layout {
    if items.is_empty() {
        return Layout::default();
    }

    let columns = spec.columns.max(1);
    let desired = spec.desired_row_width();
    let spacing = spec.spacing as i64;

    let rows: Vec<(u32, Vec<u32>)> = items
        .chunks(columns)
        .map(|row| {
            let ratios: Vec<f64> = row.iter().map(MediaItem::aspect_ratio).collect();
            let height = row_height(&ratios, spec.spacing, desired);
            (height, row_widths(&ratios, height, spec.spacing, desired))
        })
        .collect();

    let total_height: i64 = rows.iter().map(|(h, _)| *h as i64).sum::<i64>()
        + spacing * (rows.len() as i64 - 1);

    let dx = (spec.canvas_width as f64 - desired as f64) / 2.0;
    let dy = (spec.canvas_height as f64 - total_height as f64) / 2.0;

    let overflow = dx < 0.0 || dy < 0.0;
    if overflow {
        log::warn!(
            "Grid ({}x{}) exceeds the output size ({}x{}), consider a smaller grid size",
            desired,
            total_height,
            spec.canvas_width,
            spec.canvas_height
        );
    }

    let left = dx as i64;
    let mut x = left;
    let mut y = dy as i64;
    let mut placements = Vec::with_capacity(items.len());

    for (height, widths) in &rows {
        for width in widths {
            placements.push(Placement {
                x,
                y,
                width: *width,
                height: *height,
            });
            x += *width as i64 + spacing;
        }

        x = left;
        y += *height as i64 + spacing;
    }

    Layout {
        placements,
        rows: rows.len(),
        cols: columns,
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(columns: usize) -> GridSpec {
        GridSpec {
            canvas_width: 1920,
            canvas_height: 1080,
            tile: 212,
            spacing: 10,
            columns,
        }
    }

    fn item(id: usize, w: u32, h: u32) -> MediaItem {
        MediaItem::new(id.to_string(), format!("http://example.com/{}", id), w, h)
    }

    #[test]
    fn test_square_dimensions_rebalance() {
        assert_eq!(square_dimensions(7, 5), (2, 4));
        assert_eq!(square_dimensions(10, 5), (2, 5));
        assert_eq!(square_dimensions(1, 5), (1, 1));
        assert_eq!(square_dimensions(0, 5), (0, 0));
        assert_eq!(square_dimensions(3, 0), (3, 1));
    }

    #[test]
    fn test_square_dimensions_no_empty_trailing_row() {
        for count in 1..=60 {
            for columns in 1..=12 {
                let (rows, cols) = square_dimensions(count, columns);
                assert!(rows * cols >= count, "n={} c={}", count, columns);
                assert!(rows * cols - count < cols, "n={} c={}", count, columns);
            }
        }
    }

    #[test]
    fn test_square_grid_column_major_and_centered() {
        let layout = square_grid(7, &spec(5));
        assert_eq!((layout.rows, layout.cols), (2, 4));
        assert!(!layout.overflow);

        // grid is 4*222-10 = 878 wide, 2*222-10 = 434 high
        let first = layout.placements[0];
        assert_eq!((first.x, first.y), (521, 323));
        assert_eq!((first.width, first.height), (212, 212));

        // second item goes below the first
        assert_eq!(layout.placements[1].x, 521);
        assert_eq!(layout.placements[1].y, 323 + 222);

        // third item starts the next column
        assert_eq!(layout.placements[2].x, 521 + 222);
        assert_eq!(layout.placements[2].y, 323);
    }

    #[test]
    fn test_square_grid_overflow_is_allowed() {
        let small = GridSpec {
            canvas_width: 300,
            canvas_height: 200,
            ..spec(5)
        };
        let layout = square_grid(10, &small);
        assert!(layout.overflow);
        assert_eq!(layout.placements.len(), 10);
        assert!(layout.placements[0].x < 0);
    }

    #[test]
    fn test_row_height_example() {
        // ratios 1.0 + 1.5 + 0.8 = 3.3, 1000 / 3.3 = 303.03
        assert_eq!(row_height(&[1.0, 1.5, 0.8], 0, 1000), 303);

        // two gaps of 10 leave 980 for the photos
        assert_eq!(row_height(&[1.0, 1.5, 0.8], 10, 1000), 296);
    }

    #[test]
    fn test_row_widths_last_absorbs_rounding() {
        let widths = row_widths(&[1.0, 1.5, 0.8], 303, 0, 1000);
        assert_eq!(widths[0], 303);
        assert_eq!(widths[1], 454);
        assert_eq!(widths.iter().sum::<u32>(), 1000);

        let widths = row_widths(&[1.0, 1.5, 0.8], 297, 10, 1000);
        assert_eq!(widths.iter().sum::<u32>() + 20, 1000);
    }

    #[test]
    fn test_justified_rows_have_exact_width() {
        let items: Vec<MediaItem> = [
            (640, 480),
            (480, 640),
            (1000, 600),
            (500, 500),
            (1280, 720),
            (333, 777),
            (801, 599),
            (1024, 768),
            (300, 200),
            (720, 1280),
            (999, 1001),
        ]
        .iter()
        .enumerate()
        .map(|(i, (w, h))| item(i, *w, *h))
        .collect();

        let spec = spec(4);
        let desired = spec.desired_row_width();
        let layout = justified_grid(&items, &spec);
        assert_eq!(layout.rows, 3);
        assert_eq!(layout.placements.len(), items.len());

        for row in layout.placements.chunks(4) {
            let widths: i64 = row.iter().map(|p| p.width as i64).sum();
            let spacing = spec.spacing as i64 * (row.len() as i64 - 1);
            assert_eq!(widths + spacing, desired);

            // shared height and a left-to-right cursor
            assert!(row.iter().all(|p| p.height == row[0].height));
            for pair in row.windows(2) {
                assert_eq!(pair[1].x, pair[0].x + pair[0].width as i64 + 10);
                assert_eq!(pair[1].y, pair[0].y);
            }
        }
    }

    #[test]
    fn test_justified_cursor_moves_down() {
        let items: Vec<MediaItem> = (0..4).map(|i| item(i, 400, 400)).collect();
        let layout = justified_grid(&items, &spec(2));

        // two square photos per row: height = (2*222-10-10) / 2 = 212
        let first = layout.placements[0];
        let third = layout.placements[2];
        assert_eq!(first.height, 212);
        assert_eq!(third.x, first.x);
        assert_eq!(third.y, first.y + 212 + 10);
    }

    #[test]
    fn test_justified_last_partial_row() {
        let items: Vec<MediaItem> = (0..3).map(|i| item(i, 300, 200)).collect();
        let spec = spec(2);
        let layout = justified_grid(&items, &spec);

        let last = layout.placements[2];
        assert_eq!(last.width as i64, spec.desired_row_width());
        assert_eq!(last.height, (spec.desired_row_width() as f64 / 1.5) as u32);
    }

    #[test]
    fn test_compute_dispatch_and_empty() {
        let items: Vec<MediaItem> = (0..3).map(|i| item(i, 300, 200)).collect();
        let square = compute(GridMode::Square, &items, &spec(5));
        assert!(square.placements.iter().all(|p| p.width == 212 && p.height == 212));

        let justified = compute(GridMode::Justified, &items, &spec(5));
        assert_eq!(justified.rows, 1);

        assert!(compute(GridMode::Justified, &[], &spec(5)).placements.is_empty());
        assert!(compute(GridMode::Square, &[], &spec(5)).placements.is_empty());
    }

    #[test]
    fn test_square_photos_keep_their_shape() {
        let items: Vec<MediaItem> = (0..4).map(|i| item(i, 500, 500)).collect();
        let layout = justified_grid(&items, &spec(4));

        for placement in &layout.placements {
            assert_eq!((placement.width, placement.height), (212, 212));
        }
    }

    #[test]
    fn test_extreme_ratios_keep_exact_width() {
        let spec = spec(3);
        let desired = spec.desired_row_width();

        let items = vec![item(0, 400, 400), item(1, 400, 400), item(2, 50, 1000)];
        let layout = justified_grid(&items, &spec);
        let widths: Vec<u32> = layout.placements.iter().map(|p| p.width).collect();

        // 636 for photos over ratios summing to 2.05
        assert_eq!(layout.placements[0].height, 310);
        assert_eq!(widths, vec![310, 310, 16]);
        assert_eq!(widths.iter().map(|w| *w as i64).sum::<i64>() + 20, desired);

        for ratios in [
            vec![1.0, 1.0, 0.05],
            vec![0.01, 0.01, 0.01],
            vec![20.0, 0.05, 0.05],
            vec![0.05, 0.05, 20.0],
        ] {
            let height = row_height(&ratios, spec.spacing, desired);
            let widths = row_widths(&ratios, height, spec.spacing, desired);
            let total: i64 = widths.iter().map(|w| *w as i64).sum::<i64>() + 20;
            assert_eq!(total, desired, "ratios {:?}", ratios);

            // the last photo only absorbs truncation of the height and the widths
            let natural = ratios[2] * height as f64;
            let slack: f64 = ratios.iter().sum::<f64>() + ratios.len() as f64;
            assert!(widths[2] as f64 >= natural.floor(), "ratios {:?}", ratios);
            assert!((widths[2] as f64 - natural) < slack, "ratios {:?}", ratios);
        }
    }
}
