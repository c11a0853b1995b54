#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use photogrid_core::{
    ApiError, NoopHost, SegmentKind, Timeline, TimelineApi, TimelineHost, TimelineOptions,
};
use photogrid_protocol::{
    Asset, AssetId, CreatedGroup, DateRangeData, GroupId, HideAction, ItemData, ItemRange,
    SectionData, SectionId, SegmentData, SeriesData, SeriesId, UserGroupData, Viewport,
};

pub fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
}

pub fn asset(id: &str, taken: DateTime<Utc>) -> Asset {
    Asset {
        id: AssetId::from(id),
        width: 300,
        height: 200,
        rotation_correction: None,
        taken_date: taken,
        extra: serde_json::Map::new(),
    }
}

/// `count` assets named `{prefix}01..` taken one hour apart, newest first.
pub fn assets(prefix: &str, count: u32, month: u32, day: u32) -> Vec<ItemData> {
    (0..count)
        .map(|i| ItemData::Asset(asset(&format!("{prefix}{:02}", i + 1), at(month, day, 20 - i))))
        .collect()
}

pub fn day(items: Vec<ItemData>, month: u32, day: u32) -> SegmentData {
    SegmentData::DateRange(DateRangeData {
        start: at(month, day, 23),
        end: at(month, day, 0),
        items,
        sort_date: None,
    })
}

fn count(segments: &[SegmentData]) -> u64 {
    let items = |items: &[ItemData]| -> u64 {
        items
            .iter()
            .map(|item| match item {
                ItemData::Asset(_) => 1,
                ItemData::PhotoSeries(series) => series.assets.len() as u64,
            })
            .sum()
    };
    segments
        .iter()
        .map(|segment| match segment {
            SegmentData::DateRange(range) => items(&range.items),
            SegmentData::UserGroup(group) => items(&group.items),
        })
        .sum()
}

/// Three monthly sections:
///
/// - `2024-03`: a01-a03 (Mar 20), b01-b08 (Mar 12), group `g-trip` with
///   t01-t02 (Mar 8), c01 plus series `s1` of three assets split into two
///   pieces (Mar 3). 17 assets.
/// - `2024-02`: d01-d04 (Feb 25), e01-e02 (Feb 10). 6 assets.
/// - `2024-01`: f01-f06 (Jan 15). 6 assets.
pub fn library() -> Vec<(SectionData, Vec<SegmentData>)> {
    let mut march_3 = assets("c", 1, 3, 3);
    march_3.push(ItemData::PhotoSeries(SeriesData {
        series_id: SeriesId::from("s1"),
        assets: vec![
            asset("s1-1", at(3, 3, 9)),
            asset("s1-2", at(3, 3, 8)),
            asset("s1-3", at(3, 3, 7)),
        ],
        selection_indices: vec![0, 2],
    }));
    let march = vec![
        day(assets("a", 3, 3, 20), 3, 20),
        day(assets("b", 8, 3, 12), 3, 12),
        SegmentData::UserGroup(UserGroupData {
            id: GroupId::from("g-trip"),
            name: Some("Trip".into()),
            items: assets("t", 2, 3, 8),
            sort_date: Some(at(3, 8, 20)),
        }),
        day(march_3, 3, 3),
    ];
    let february = vec![day(assets("d", 4, 2, 25), 2, 25), day(assets("e", 2, 2, 10), 2, 10)];
    let january = vec![day(assets("f", 6, 1, 15), 1, 15)];

    [
        ("2024-03", march, at(3, 31, 0), at(3, 1, 0)),
        ("2024-02", february, at(2, 29, 0), at(2, 1, 0)),
        ("2024-01", january, at(1, 31, 0), at(1, 1, 0)),
    ]
    .into_iter()
    .map(|(id, segments, start_date, end_date)| {
        (
            SectionData {
                id: SectionId::from(id),
                avg_aspect_ratio: 1.5,
                num_assets: count(&segments),
                start_date,
                end_date,
            },
            segments,
        )
    })
    .collect()
}

/// In-memory collaborator that records every call.
#[derive(Default)]
pub struct FakeApi {
    pub catalog: Vec<SectionData>,
    pub segments: HashMap<SectionId, Vec<SegmentData>>,
    /// Number of executor yields before a section's segments arrive.
    pub delays: RefCell<HashMap<SectionId, usize>>,
    /// Number of executor yields before group requests answer.
    pub group_delay: Cell<usize>,
    /// Calls listed here fail with `ApiError::Request`.
    pub failing: RefCell<HashSet<&'static str>>,
    pub section_fetches: Cell<usize>,
    pub segment_fetches: RefCell<HashMap<SectionId, usize>>,
    pub hidden: RefCell<Vec<AssetId>>,
    pub created: RefCell<Vec<(String, Vec<AssetId>)>>,
    pub added: RefCell<Vec<(Vec<AssetId>, GroupId)>>,
}

impl FakeApi {
    pub fn new(library: Vec<(SectionData, Vec<SegmentData>)>) -> Self {
        let mut api = FakeApi::default();
        for (section, segments) in library {
            api.segments.insert(section.id.clone(), segments);
            api.catalog.push(section);
        }
        api
    }

    pub fn fail(&self, call: &'static str) {
        self.failing.borrow_mut().insert(call);
    }

    pub fn delay(&self, section: &str, yields: usize) {
        self.delays.borrow_mut().insert(SectionId::from(section), yields);
    }

    pub fn fetches_of(&self, section: &str) -> usize {
        self.segment_fetches
            .borrow()
            .get(&SectionId::from(section))
            .copied()
            .unwrap_or(0)
    }

    async fn wait_for_group_call(&self) {
        for _ in 0..self.group_delay.get() {
            tokio::task::yield_now().await;
        }
    }

    fn check(&self, call: &'static str) -> Result<(), ApiError> {
        if self.failing.borrow().contains(call) {
            Err(ApiError::Request(format!("{call} failed")))
        } else {
            Ok(())
        }
    }
}

impl TimelineApi for FakeApi {
    async fn fetch_sections(&self) -> Result<Vec<SectionData>, ApiError> {
        self.section_fetches.set(self.section_fetches.get() + 1);
        tokio::task::yield_now().await;
        self.check("fetch_sections")?;
        Ok(self.catalog.clone())
    }

    async fn fetch_segments(&self, section_id: &SectionId) -> Result<Vec<SegmentData>, ApiError> {
        *self
            .segment_fetches
            .borrow_mut()
            .entry(section_id.clone())
            .or_default() += 1;
        let yields = self.delays.borrow().get(section_id).copied().unwrap_or(0);
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        self.check("fetch_segments")?;
        self.segments
            .get(section_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(section_id.to_string()))
    }

    async fn set_hidden(&self, asset_ids: &[AssetId], action: HideAction) -> Result<(), ApiError> {
        self.check("set_hidden")?;
        assert_eq!(action, HideAction::Hide);
        self.hidden.borrow_mut().extend_from_slice(asset_ids);
        Ok(())
    }

    async fn create_group(&self, name: &str, asset_ids: &[AssetId]) -> Result<CreatedGroup, ApiError> {
        self.wait_for_group_call().await;
        self.check("create_group")?;
        let mut created = self.created.borrow_mut();
        created.push((name.to_string(), asset_ids.to_vec()));
        Ok(CreatedGroup {
            group_id: GroupId::from(format!("g-new-{}", created.len())),
            display_date: at(2, 10, 14),
        })
    }

    async fn add_to_group(&self, asset_ids: &[AssetId], group_id: &GroupId) -> Result<(), ApiError> {
        self.wait_for_group_call().await;
        self.check("add_to_group")?;
        self.added
            .borrow_mut()
            .push((asset_ids.to_vec(), group_id.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    AdjustScroll { delta: f64, if_scroll_top_gt: f64 },
    ScrollToCenter { top: f64, height: f64 },
}

#[derive(Default)]
pub struct RecordingHost {
    pub calls: RefCell<Vec<HostCall>>,
    pub changes: Cell<usize>,
}

impl RecordingHost {
    pub fn take(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

impl TimelineHost for RecordingHost {
    fn adjust_scroll_top(&self, delta: f64, if_scroll_top_gt: f64) {
        self.calls.borrow_mut().push(HostCall::AdjustScroll {
            delta,
            if_scroll_top_gt,
        });
    }

    fn scroll_to_center(&self, top: f64, height: f64) {
        self.calls
            .borrow_mut()
            .push(HostCall::ScrollToCenter { top, height });
    }

    fn timeline_changed(&self) {
        self.changes.set(self.changes.get() + 1);
    }
}

pub type TestTimeline = Timeline<FakeApi, RecordingHost>;

pub fn timeline() -> (Rc<FakeApi>, TestTimeline) {
    let api = Rc::new(FakeApi::new(library()));
    let timeline = Timeline::new(TimelineOptions::default(), Rc::clone(&api), RecordingHost::default());
    (api, timeline)
}

pub fn headless() -> Timeline<FakeApi, NoopHost> {
    Timeline::new(
        TimelineOptions::default(),
        Rc::new(FakeApi::new(library())),
        NoopHost,
    )
}

/// Viewport tall enough to pull in the first two sections at scroll 0.
pub const TALL: Viewport = Viewport {
    width: 1000.0,
    height: 2000.0,
};

pub const SHORT: Viewport = Viewport {
    width: 1000.0,
    height: 800.0,
};

/// Grid index of the thumbnail with key `key`.
pub fn index_of<A: TimelineApi + 'static, H: TimelineHost>(
    timeline: &Timeline<A, H>,
    key: &str,
) -> usize {
    timeline
        .items()
        .iter()
        .position(|item| item.key == key)
        .unwrap_or_else(|| panic!("no item with key {key}"))
}

pub fn select<A: TimelineApi + 'static, H: TimelineHost>(timeline: &Timeline<A, H>, key: &str) {
    let index = index_of(timeline, key);
    timeline.set_item_selected(index, true).unwrap();
}

pub fn thumbnail_count<A: TimelineApi + 'static, H: TimelineHost>(timeline: &Timeline<A, H>) -> usize {
    timeline.items().iter().filter(|i| i.is_selectable()).count()
}

/// Asset ids held by segments of `kind`-matching segments in loaded sections.
pub fn segment_assets<A: TimelineApi + 'static, H: TimelineHost>(
    timeline: &Timeline<A, H>,
    matches: impl Fn(&SegmentKind) -> bool,
) -> Vec<Vec<String>> {
    timeline
        .sections()
        .iter()
        .flat_map(|section| section.segments.iter().flatten())
        .filter(|segment| matches(&segment.kind))
        .map(|segment| {
            segment
                .items
                .iter()
                .flat_map(|item| item.assets())
                .map(|a| a.id.to_string())
                .collect()
        })
        .collect()
}

/// Structural invariants that must hold after every operation.
pub fn assert_invariants<A: TimelineApi + 'static, H: TimelineHost>(timeline: &Timeline<A, H>) {
    let items = timeline.items();
    let sections = timeline.sections();

    let mut keys = HashSet::new();
    for item in items.iter() {
        assert!(keys.insert(item.key.clone()), "duplicate key {}", item.key);
    }

    let mut last_thumb = f64::MIN;
    let mut last_title = f64::MIN;
    for item in items.iter() {
        let last = if item.is_selectable() {
            &mut last_thumb
        } else {
            &mut last_title
        };
        assert!(item.top >= *last, "{} is above its predecessor", item.key);
        *last = item.top;
    }

    let mut cursor = 0;
    let mut top = 0.0;
    for section in sections.iter() {
        assert!((section.top - top).abs() < 1e-6, "section {} is misplaced", section.id);
        top = section.bottom();
        let Some(range) = section.items else {
            continue;
        };
        assert_eq!(range.start_idx, cursor, "gap before section {}", section.id);
        cursor = range.end_idx;
        let mut inner = range.start_idx;
        for segment in section.segments.iter().flatten() {
            let segment_range = segment.item_range.unwrap_or(ItemRange::new(usize::MAX, 0));
            assert_eq!(segment_range.start_idx, inner, "segment ranges of {} do not chain", section.id);
            inner = segment_range.end_idx;

            let own = &items[segment_range.as_range()];
            let first_thumb = own
                .iter()
                .filter(|item| item.is_selectable())
                .map(|item| item.top)
                .fold(f64::INFINITY, f64::min);
            for title in own.iter().filter(|item| item.is_title()) {
                assert!(title.bottom() <= first_thumb + 1e-6, "{} overlaps its thumbnails", title.key);
            }
        }
        assert_eq!(inner, range.end_idx, "segments of {} do not cover it", section.id);
        for item in &items[range.as_range()] {
            assert!(item.top >= section.top - 1e-6 && item.bottom() <= section.bottom() + 1e-6);
        }
    }
    assert_eq!(cursor, items.len(), "items outside every section");
    assert!((timeline.timeline_height() - top).abs() < 1e-6);
    assert_eq!(
        timeline.total_num_assets(),
        sections.iter().map(|s| s.num_assets).sum::<u64>()
    );
    for section in sections.iter() {
        if let Some(counted) = section.count_assets() {
            assert_eq!(counted, section.num_assets, "stale count in {}", section.id);
        }
    }
}
