mod common;

use common::*;
use photogrid_core::{ItemId, ScrollOutcome, SegmentKind, TimelineError, TimelineMode};
use photogrid_protocol::{AssetId, GridItemKind, GroupId, SeriesId, Viewport};

async fn scrolled(viewport: Viewport) -> (std::rc::Rc<FakeApi>, TestTimeline) {
    let (api, timeline) = timeline();
    timeline.initialize(viewport).await.unwrap();
    timeline.on_scroll_change(0.0, false).await.unwrap();
    timeline.host().take();
    (api, timeline)
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn stack_pieces_are_selected_together() {
    let (_, timeline) = scrolled(SHORT).await;
    select(&timeline, "stack-s1-2");

    let series = SeriesId::from("s1");
    let first = ItemId::StackPiece {
        series_id: series.clone(),
        start: 0,
    };
    assert!(timeline.is_selected(&first));
    assert_eq!(timeline.selected_items().len(), 2);
    assert_eq!(timeline.selected_asset_count(), 3);

    let index = index_of(&timeline, "stack-s1-0");
    timeline.set_item_selected(index, false).unwrap();
    assert!(timeline.selected_items().is_empty());
}

#[tokio::test]
async fn selection_keeps_click_order() {
    let (_, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-b03");
    select(&timeline, "asset-a01");
    select(&timeline, "asset-b03");
    assert_eq!(
        timeline.selected_items(),
        vec![
            ItemId::Asset(AssetId::from("b03")),
            ItemId::Asset(AssetId::from("a01")),
        ]
    );
    let changes = timeline.host().changes.get();
    timeline.clear_selection();
    assert_eq!(timeline.selected_asset_count(), 0);
    assert_eq!(timeline.host().changes.get(), changes + 1);
}

#[tokio::test]
async fn titles_cannot_be_selected() {
    let (_, timeline) = scrolled(SHORT).await;
    assert!(matches!(
        timeline.set_item_selected(0, true),
        Err(TimelineError::NotSelectable(0))
    ));
    assert!(matches!(
        timeline.set_item_selected(500, true),
        Err(TimelineError::ItemOutOfRange { index: 500, .. })
    ));
}

#[tokio::test]
async fn hiding_removes_assets_across_sections() {
    let (api, timeline) = scrolled(TALL).await;
    let thumbnails = thumbnail_count(&timeline);
    let items = timeline.items().len();
    select(&timeline, "asset-a01");
    select(&timeline, "asset-d02");
    select(&timeline, "stack-s1-0");
    select(&timeline, "asset-e01");
    select(&timeline, "asset-e02");

    let hidden = timeline.hide_selected_assets().await.unwrap();

    assert_eq!(hidden, 7);
    assert_eq!(api.hidden.borrow().len(), 7);
    assert_eq!(timeline.total_num_assets(), 22);
    assert_eq!(thumbnail_count(&timeline), thumbnails - 6);
    // six thumbnails plus the title of the emptied Feb 10 segment
    assert_eq!(timeline.items().len(), items - 7);
    assert!(!timeline.items().iter().any(|item| item.key == "day-asset-e01"));
    assert!(timeline.selected_items().is_empty());

    let remaining: Vec<String> = segment_assets(&timeline, |_| true).concat();
    for gone in ["a01", "d02", "s1-1", "s1-2", "s1-3", "e01", "e02"] {
        assert!(!remaining.iter().any(|id| id == gone), "{gone} still shown");
    }
    let d01 = index_of(&timeline, "asset-d01");
    assert!(matches!(
        timeline.items()[d01].kind,
        GridItemKind::Asset { asset_index: 13, .. }
    ));
    assert_invariants(&timeline);
}

#[tokio::test]
async fn failed_hide_changes_nothing() {
    let (api, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a01");
    let items = timeline.items().to_vec();
    api.fail("set_hidden");

    assert!(matches!(
        timeline.hide_selected_assets().await,
        Err(TimelineError::Api(_))
    ));
    assert_eq!(timeline.items().to_vec(), items);
    assert_eq!(timeline.selected_asset_count(), 1);
    assert_eq!(timeline.total_num_assets(), 29);
}

#[tokio::test]
async fn hiding_nothing_skips_the_server() {
    let (api, timeline) = scrolled(SHORT).await;
    api.fail("set_hidden");
    assert_eq!(timeline.hide_selected_assets().await.unwrap(), 0);
}

#[tokio::test]
async fn created_group_spans_sections() {
    let (api, timeline) = scrolled(TALL).await;
    select(&timeline, "asset-b02");
    select(&timeline, "asset-b05");
    select(&timeline, "asset-e01");

    assert!(timeline.create_group_clicked().unwrap());
    assert_eq!(timeline.mode(), TimelineMode::CreatingGroup);
    assert!(timeline.selected_items().is_empty());
    assert_eq!(
        segment_assets(&timeline, |kind| *kind == SegmentKind::CreatingGroup),
        vec![ids(&["b02", "b05", "e01"])]
    );
    assert!(timeline.items().iter().any(|item| item.key == "group-draft"));
    assert!(matches!(
        timeline.host().take().as_slice(),
        [HostCall::ScrollToCenter { .. }]
    ));
    assert_invariants(&timeline);

    let group = timeline.confirm_create_group("Ski").await.unwrap();

    assert_eq!(group, GroupId::from("g-new-1"));
    assert_eq!(
        *api.created.borrow(),
        vec![(
            "Ski".to_string(),
            vec![AssetId::from("b02"), AssetId::from("b05"), AssetId::from("e01")]
        )]
    );
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert!(segment_assets(&timeline, |kind| *kind == SegmentKind::CreatingGroup).is_empty());
    assert_eq!(
        segment_assets(&timeline, |kind| kind_is_group(kind, "g-new-1")),
        vec![ids(&["b02", "b05", "e01"])]
    );
    assert_eq!(timeline.total_num_assets(), 29);
    assert_invariants(&timeline);
}

#[tokio::test]
async fn cancel_restores_the_timeline() {
    let (_, timeline) = scrolled(TALL).await;
    select(&timeline, "asset-b02");
    select(&timeline, "asset-e01");
    let sections = timeline.sections().to_vec();
    let items = timeline.items().to_vec();

    assert!(timeline.create_group_clicked().unwrap());
    assert_ne!(timeline.items().to_vec(), items);
    timeline.cancel_create_group().unwrap();

    assert_eq!(timeline.sections().to_vec(), sections);
    assert_eq!(timeline.items().to_vec(), items);
    assert_eq!(timeline.selected_items().len(), 2);
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert!(matches!(
        timeline.cancel_create_group(),
        Err(TimelineError::NotCreatingGroup)
    ));
}

#[tokio::test]
async fn cancel_keeps_sections_loaded_during_the_draft() {
    let (api, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a01");
    assert!(timeline.create_group_clicked().unwrap());
    api.delay("2024-01", 6);

    let (scroll, cancel) = tokio::join!(timeline.on_scroll_change(1500.0, false), async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        timeline.cancel_create_group()
    });

    cancel.unwrap();
    assert!(matches!(scroll, Ok(ScrollOutcome::Updated(_))));
    assert!(timeline.sections().iter().all(|s| s.is_loaded() && s.is_laid_out()));
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert_eq!(timeline.selected_items(), vec![ItemId::Asset(AssetId::from("a01"))]);
    assert!(!timeline.items().iter().any(|item| item.key == "group-draft"));
    assert_invariants(&timeline);
}

#[tokio::test]
async fn cancel_waits_for_a_pending_confirm() {
    let (api, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a01");
    assert!(timeline.create_group_clicked().unwrap());
    api.group_delay.set(2);

    let (confirm, cancel) = tokio::join!(timeline.confirm_create_group("Lunch"), async {
        tokio::task::yield_now().await;
        timeline.cancel_create_group()
    });

    assert!(matches!(cancel, Err(TimelineError::DraftSaving)));
    assert_eq!(confirm.unwrap(), GroupId::from("g-new-1"));
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert_eq!(
        segment_assets(&timeline, |kind| kind_is_group(kind, "g-new-1")),
        vec![ids(&["a01"])]
    );
    assert_invariants(&timeline);
}

#[tokio::test]
async fn cancel_after_resize_uses_the_new_width() {
    let (_, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a01");
    assert!(timeline.create_group_clicked().unwrap());

    let narrow = Viewport {
        width: 500.0,
        height: 800.0,
    };
    timeline.resize(narrow, 0.0).await.unwrap();
    timeline.cancel_create_group().unwrap();

    assert!(!timeline.items().is_empty());
    assert!(!timeline.visible_items().is_empty());
    for item in timeline.items().iter() {
        if let Some((left, width)) = item.horizontal() {
            assert!(left + width <= narrow.width + 1e-6, "{} overflows", item.key);
        }
    }
    assert_eq!(timeline.selected_items().len(), 1);
    assert_invariants(&timeline);
}

#[tokio::test]
async fn create_without_selection_is_a_no_op() {
    let (_, timeline) = scrolled(SHORT).await;
    assert!(!timeline.create_group_clicked().unwrap());
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert!(matches!(
        timeline.confirm_create_group("x").await,
        Err(TimelineError::NotCreatingGroup)
    ));
}

#[tokio::test]
async fn draft_mode_blocks_other_edits() {
    let (_, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a02");
    timeline.create_group_clicked().unwrap();

    assert!(matches!(
        timeline.create_group_clicked(),
        Err(TimelineError::AlreadyCreatingGroup)
    ));
    assert!(matches!(
        timeline.hide_selected_assets().await,
        Err(TimelineError::AlreadyCreatingGroup)
    ));
}

#[tokio::test]
async fn adding_to_an_existing_group_merges_by_date() {
    let (api, timeline) = scrolled(TALL).await;
    select(&timeline, "asset-d01");
    select(&timeline, "asset-d03");
    assert!(timeline.create_group_clicked().unwrap());

    let trip = GroupId::from("g-trip");
    timeline.add_selected_to_existing_group(&trip).await.unwrap();

    assert_eq!(
        *api.added.borrow(),
        vec![(vec![AssetId::from("d01"), AssetId::from("d03")], trip.clone())]
    );
    assert_eq!(timeline.mode(), TimelineMode::JustLooking);
    assert_eq!(
        segment_assets(&timeline, |kind| kind_is_group(kind, "g-trip")),
        vec![ids(&["t01", "t02", "d01", "d03"])]
    );
    let sections = timeline.sections();
    assert_eq!(sections[0].num_assets, 19);
    assert_eq!(sections[1].num_assets, 4);
    drop(sections);
    assert_eq!(timeline.total_num_assets(), 29);
    assert_invariants(&timeline);
}

#[tokio::test]
async fn unknown_target_group_keeps_the_draft() {
    let (api, timeline) = scrolled(TALL).await;
    select(&timeline, "asset-d01");
    timeline.create_group_clicked().unwrap();

    assert!(matches!(
        timeline
            .add_selected_to_existing_group(&GroupId::from("nope"))
            .await,
        Err(TimelineError::GroupNotFound(_))
    ));
    assert!(api.added.borrow().is_empty());
    assert_eq!(timeline.mode(), TimelineMode::CreatingGroup);
    timeline.cancel_create_group().unwrap();
    assert_invariants(&timeline);
}

#[tokio::test]
async fn failed_confirm_keeps_the_draft() {
    let (api, timeline) = scrolled(SHORT).await;
    select(&timeline, "asset-a02");
    timeline.create_group_clicked().unwrap();
    api.fail("create_group");

    assert!(matches!(
        timeline.confirm_create_group("x").await,
        Err(TimelineError::Api(_))
    ));
    assert_eq!(timeline.mode(), TimelineMode::CreatingGroup);
    assert_eq!(
        segment_assets(&timeline, |kind| *kind == SegmentKind::CreatingGroup),
        vec![ids(&["a02"])]
    );
}

fn kind_is_group(kind: &SegmentKind, id: &str) -> bool {
    matches!(kind, SegmentKind::Group { group_id, .. } if group_id.as_str() == id)
}
