use photogrid_protocol::Rect;

/// Boxes of a justified layout, relative to the top-left of the container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JustifiedLayout {
    pub boxes: Vec<Rect>,
    pub container_height: f64,
}

/// Pack boxes of the given aspect ratios into rows that fill
/// `container_width` exactly.
///
/// Rows are filled greedily: an item joins the current row as long as the
/// resulting row height is closer to `target_row_height` than the row
/// without it. A final row that cannot reach the full width keeps the
/// target height and stays left-aligned. `spacing` separates boxes within a
/// row and rows from each other.
pub fn justify(
    aspect_ratios: &[f64],
    container_width: f64,
    target_row_height: f64,
    spacing: f64,
) -> JustifiedLayout {
    let n = aspect_ratios.len();
    let fill_height =
        |sum: f64, count: usize| (container_width - spacing * (count as f64 - 1.0)) / sum;

    let mut boxes = Vec::with_capacity(n);
    let mut top = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        let mut sum = aspect_ratios[start];
        let mut height = fill_height(sum, 1);
        while end < n && height > target_row_height {
            let next = fill_height(sum + aspect_ratios[end], end + 1 - start);
            if next < target_row_height && target_row_height - next > height - target_row_height {
                break;
            }
            sum += aspect_ratios[end];
            end += 1;
            height = next;
        }

        let row_height = if end == n && height > target_row_height {
            target_row_height
        } else {
            height
        };
        let mut left = 0.0;
        for ar in &aspect_ratios[start..end] {
            let width = ar * row_height;
            boxes.push(Rect::new(left, top, width, row_height));
            left += width + spacing;
        }

        top += row_height;
        start = end;
        if start < n {
            top += spacing;
        }
    }

    JustifiedLayout {
        boxes,
        container_height: top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rows(layout: &JustifiedLayout) -> Vec<Vec<Rect>> {
        let mut rows: Vec<Vec<Rect>> = Vec::new();
        for b in &layout.boxes {
            match rows.last_mut() {
                Some(row) if (row[0].y - b.y).abs() < EPS => row.push(*b),
                _ => rows.push(vec![*b]),
            }
        }
        rows
    }

    #[test]
    fn empty_input() {
        let layout = justify(&[], 800.0, 200.0, 4.0);
        assert!(layout.boxes.is_empty());
        assert_eq!(layout.container_height, 0.0);
    }

    #[test]
    fn full_rows_fill_the_width() {
        let ars = vec![1.5; 10];
        let layout = justify(&ars, 1000.0, 200.0, 4.0);
        let rows = rows(&layout);
        assert!(rows.len() > 1);
        for row in &rows[..rows.len() - 1] {
            let right = row.last().map(Rect::right).unwrap_or_default();
            assert!((right - 1000.0).abs() < 1e-6, "row ends at {right}");
        }
    }

    #[test]
    fn last_row_keeps_target_height() {
        // three per row at ~219px, the tenth item is alone
        let ars = vec![1.5; 10];
        let layout = justify(&ars, 1000.0, 200.0, 4.0);
        let last = layout.boxes.last().copied().unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(last.h, 200.0);
        assert_eq!(last.x, 0.0);
        assert!((layout.container_height - last.bottom()).abs() < EPS);
    }

    #[test]
    fn rows_are_separated_by_spacing() {
        let layout = justify(&[2.0, 2.0, 2.0, 2.0], 800.0, 200.0, 10.0);
        let rows = rows(&layout);
        assert_eq!(rows.len(), 2);
        assert!((rows[1][0].y - (rows[0][0].bottom() + 10.0)).abs() < EPS);
    }

    #[test]
    fn panorama_is_shrunk_to_width() {
        let layout = justify(&[10.0, 1.0], 1000.0, 200.0, 4.0);
        assert_eq!(layout.boxes[0].w, 1000.0);
        assert_eq!(layout.boxes[0].h, 100.0);
        assert_eq!(layout.boxes[1].h, 200.0);
    }
}
