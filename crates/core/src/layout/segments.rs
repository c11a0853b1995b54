use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use photogrid_protocol::{GridItemKind, ItemRange, Rect, SharedStr, TimelineGridItem};

use super::LayoutError;
use super::justified::justify;
use crate::model::{Segment, SegmentKind, TimelineItem};
use crate::options::TimelineOptions;

/// Tolerance for the row width check.
const EPSILON: f64 = 1e-6;

/// Everything `layout_segments` needs besides the segments themselves.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams<'a> {
    /// End date of the preceding section. A section continuing the same
    /// month does not repeat its month title.
    pub prev_end_date: Option<DateTime<Utc>>,
    pub base_top: f64,
    pub base_asset_index: usize,
    pub container_width: f64,
    pub options: &'a TimelineOptions,
    /// Current best guess for the height of title items.
    pub title_height: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionLayout {
    /// Positioned items, starting at `base_top`.
    pub items: Vec<TimelineGridItem>,
    pub total_height: f64,
    /// One range per input segment, in input order, indexing into `items`.
    pub segment_ranges: Vec<ItemRange>,
}

struct PlacedSegment {
    index: usize,
    /// Boxes relative to the top of the row band, below the titles.
    boxes: Vec<Rect>,
}

/// Segments sharing one band of the grid: either several short segments
/// merged side by side, or a single segment with any number of rows.
struct Band {
    segments: Vec<PlacedSegment>,
    height: f64,
}

struct Candidate {
    band: Band,
    width: f64,
    month: NaiveDate,
}

/// Lay out the segments of one section.
///
/// Short segments are merged into a shared row with the following segments
/// of the same month as long as they fit; draft groups are always on their
/// own. A segment wider than the container is justified over several rows.
/// Every band gets a month title when its month differs from the previous
/// band's, and every segment gets a day or group title above its
/// thumbnails.
pub fn layout_segments(
    segments: &[Segment],
    params: &LayoutParams<'_>,
) -> Result<SectionLayout, LayoutError> {
    if segments.is_empty() {
        return Ok(SectionLayout::default());
    }
    let width = params.container_width;
    if !width.is_finite() || width <= 0.0 {
        return Err(LayoutError::InvalidWidth(width));
    }

    let bands = pack_bands(segments, params);
    let title_height = params.title_height;

    let mut items = Vec::new();
    let mut ranges = vec![ItemRange::default(); segments.len()];
    let mut last_month = params.prev_end_date.map(month_of);
    let mut asset_index = params.base_asset_index;
    let mut top = params.base_top;

    for band in &bands {
        let right = band
            .segments
            .iter()
            .flat_map(|placed| placed.boxes.iter())
            .map(Rect::right)
            .fold(0.0, f64::max);
        if right > width + EPSILON {
            return Err(LayoutError::RowOverflow {
                width: right,
                container_width: width,
            });
        }

        let band_start = items.len();
        let Some(lead) = band.segments.iter().find(|placed| !placed.boxes.is_empty()) else {
            for placed in &band.segments {
                ranges[placed.index] = ItemRange::new(band_start, band_start);
            }
            continue;
        };

        let lead_segment = &segments[lead.index];
        let month = month_of(lead_segment.start);
        if last_month != Some(month) {
            last_month = Some(month);
            items.push(TimelineGridItem {
                key: format!("month-{}-{}", month.format("%Y-%m"), lead_key(lead_segment)).into(),
                top,
                height: title_height,
                kind: GridItemKind::MajorTitle { month },
            });
            top += title_height;
        }

        for placed in &band.segments {
            // the month title belongs to the first segment of its band
            let start = if placed.index <= lead.index {
                band_start
            } else {
                items.len()
            };
            if placed.boxes.is_empty() {
                ranges[placed.index] = ItemRange::new(start, start);
                continue;
            }
            let segment = &segments[placed.index];
            items.push(title_item(segment, &placed.boxes, top, title_height));
            let boxes_top = top + title_height;
            for (item, rect) in segment.items.iter().zip(&placed.boxes) {
                items.push(thumbnail_item(item, rect, boxes_top, &mut asset_index));
            }
            ranges[placed.index] = ItemRange::new(start, items.len());
        }
        top += title_height + band.height;
    }

    check_keys(&items)?;
    check_ranges(&ranges, items.len())?;

    Ok(SectionLayout {
        items,
        total_height: top - params.base_top,
        segment_ranges: ranges,
    })
}

fn pack_bands(segments: &[Segment], params: &LayoutParams<'_>) -> Vec<Band> {
    let options = params.options;
    let target = options.target_row_height;
    let spacing = options.box_spacing;
    let container_width = params.container_width;

    let mut bands = Vec::new();
    let mut candidate: Option<Candidate> = None;

    for (index, segment) in segments.iter().enumerate() {
        if segment.items.is_empty() {
            let placed = PlacedSegment {
                index,
                boxes: Vec::new(),
            };
            match candidate.as_mut() {
                Some(c) => c.band.segments.push(placed),
                None => bands.push(Band {
                    segments: vec![placed],
                    height: 0.0,
                }),
            }
            continue;
        }

        let ratios: Vec<f64> = segment.items.iter().map(TimelineItem::aspect_ratio).collect();
        let natural = natural_width(&ratios, target, spacing);
        let month = month_of(segment.start);
        let mergeable = !segment.is_creating_group();

        if let Some(c) = candidate.as_mut().filter(|c| {
            mergeable
                && c.month == month
                && c.width + options.segment_margin + natural <= container_width
        }) {
            let left = c.width + options.segment_margin;
            c.band.segments.push(PlacedSegment {
                index,
                boxes: single_row(&ratios, left, target, spacing),
            });
            c.width = left + natural;
            continue;
        }
        if let Some(c) = candidate.take() {
            bands.push(c.band);
        }

        if natural > container_width {
            let layout = justify(&ratios, container_width, target, spacing);
            bands.push(Band {
                segments: vec![PlacedSegment {
                    index,
                    boxes: layout.boxes,
                }],
                height: layout.container_height,
            });
            continue;
        }

        let band = Band {
            segments: vec![PlacedSegment {
                index,
                boxes: single_row(&ratios, 0.0, target, spacing),
            }],
            height: target,
        };
        if mergeable {
            candidate = Some(Candidate {
                band,
                width: natural,
                month,
            });
        } else {
            bands.push(band);
        }
    }
    if let Some(c) = candidate {
        bands.push(c.band);
    }
    bands
}

/// Width of all items side by side at the target height.
fn natural_width(ratios: &[f64], target_row_height: f64, spacing: f64) -> f64 {
    let boxes: f64 = ratios.iter().map(|ar| ar * target_row_height).sum();
    boxes + spacing * ratios.len().saturating_sub(1) as f64
}

fn single_row(ratios: &[f64], left: f64, height: f64, spacing: f64) -> Vec<Rect> {
    let mut x = left;
    ratios
        .iter()
        .map(|ar| {
            let rect = Rect::new(x, 0.0, ar * height, height);
            x += rect.w + spacing;
            rect
        })
        .collect()
}

fn month_of(date: DateTime<Utc>) -> NaiveDate {
    let day = date.date_naive();
    day.with_day(1).unwrap_or(day)
}

fn lead_key(segment: &Segment) -> SharedStr {
    segment
        .items
        .first()
        .map(TimelineItem::key)
        .unwrap_or_else(|| SharedStr::from("empty"))
}

fn title_item(segment: &Segment, boxes: &[Rect], top: f64, height: f64) -> TimelineGridItem {
    let left = boxes.iter().map(|b| b.x).fold(f64::INFINITY, f64::min);
    let right = boxes.iter().map(Rect::right).fold(0.0, f64::max);
    let width = right - left;
    let (key, kind) = match &segment.kind {
        SegmentKind::DateRange => (
            format!("day-{}", lead_key(segment)).into(),
            GridItemKind::DayTitle {
                left,
                width,
                start: segment.start,
                end: segment.end,
            },
        ),
        SegmentKind::Group { group_id, name } => (
            format!("group-{group_id}-{}", lead_key(segment)).into(),
            GridItemKind::GroupTitle {
                left,
                width,
                group_id: group_id.clone(),
                name: name.clone(),
            },
        ),
        SegmentKind::CreatingGroup => ("group-draft".into(), GridItemKind::GroupTitleInput { left, width }),
    };
    TimelineGridItem {
        key,
        top,
        height,
        kind,
    }
}

fn thumbnail_item(
    item: &TimelineItem,
    rect: &Rect,
    top: f64,
    next_asset_index: &mut usize,
) -> TimelineGridItem {
    let kind = match item {
        TimelineItem::Asset(asset) => GridItemKind::Asset {
            left: rect.x,
            width: rect.w,
            asset_index: *next_asset_index,
            asset: asset.clone(),
        },
        TimelineItem::PhotoStack(stack) => GridItemKind::PhotoStack {
            left: rect.x,
            width: rect.w,
            series_id: stack.series.series_id.clone(),
            cover: stack.cover().clone(),
            first_asset_index: *next_asset_index,
            piece_len: stack.range.len(),
            series_len: stack.series.assets.len(),
        },
    };
    *next_asset_index += item.num_assets();
    TimelineGridItem {
        key: item.key(),
        top: top + rect.y,
        height: rect.h,
        kind,
    }
}

fn check_keys(items: &[TimelineGridItem]) -> Result<(), LayoutError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.key.as_str()) {
            return Err(LayoutError::DuplicateKey(item.key.to_string()));
        }
    }
    Ok(())
}

fn check_ranges(ranges: &[ItemRange], total: usize) -> Result<(), LayoutError> {
    let mut cursor = 0;
    for range in ranges {
        if range.start_idx != cursor || range.end_idx < range.start_idx {
            return Err(LayoutError::RangeMismatch {
                covered: cursor,
                total,
            });
        }
        cursor = range.end_idx;
    }
    if cursor != total {
        return Err(LayoutError::RangeMismatch {
            covered: cursor,
            total,
        });
    }
    Ok(())
}
