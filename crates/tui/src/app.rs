use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::executor::block_on;
use photogrid_core::{Direction, ItemId, Timeline, TimelineHost, TimelineMode, TimelineOptions};
use photogrid_protocol::{GridItemKind, GroupId, SharedStr, Viewport};
use tracing::{debug, info};

use crate::fixture::FixtureApi;

/// Timeline pixels per terminal column.
pub const COL_PX: f64 = 10.0;
/// Timeline pixels per terminal row. Titles are one row tall.
pub const ROW_PX: f64 = 20.0;

/// Owns the scroll offset the timeline asks to be corrected.
#[derive(Debug, Default)]
pub struct TerminalHost {
    scroll_top: Cell<f64>,
    viewport_height: Cell<f64>,
}

impl TimelineHost for TerminalHost {
    fn adjust_scroll_top(&self, delta: f64, if_scroll_top_gt: f64) {
        let top = self.scroll_top.get();
        if top > if_scroll_top_gt {
            self.scroll_top.set((top + delta).max(0.0));
        }
    }

    fn scroll_to_center(&self, top: f64, height: f64) {
        let centered = top + height / 2.0 - self.viewport_height.get() / 2.0;
        self.scroll_top.set(centered.max(0.0));
    }
}

pub type TerminalTimeline = Timeline<FixtureApi, TerminalHost>;

pub struct App {
    pub timeline: TerminalTimeline,
    /// Key of the thumbnail under the keyboard cursor.
    cursor: Option<SharedStr>,
    pub group_name: String,
    pub status: String,
    pub quit: bool,
}

impl App {
    pub fn new(options: TimelineOptions, api: FixtureApi) -> Self {
        Self {
            timeline: Timeline::new(options, Rc::new(api), TerminalHost::default()),
            cursor: None,
            group_name: String::new(),
            status: String::new(),
            quit: false,
        }
    }

    /// Timeline viewport for a terminal of `cols` x `rows`, minus the
    /// header line.
    pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
        Viewport::new(
            f64::from(cols) * COL_PX,
            f64::from(rows.saturating_sub(1)) * ROW_PX,
        )
    }

    pub fn start(&mut self, viewport: Viewport) -> Result<()> {
        self.timeline.host().viewport_height.set(viewport.height);
        block_on(self.timeline.initialize(viewport))?;
        self.refresh()
    }

    pub fn scroll_top(&self) -> f64 {
        self.timeline.host().scroll_top.get()
    }

    /// Grid index of the cursor thumbnail, if it is laid out.
    pub fn cursor_index(&self) -> Option<usize> {
        let key = self.cursor.as_ref()?;
        self.timeline.items().iter().position(|item| &item.key == key)
    }

    fn set_cursor(&mut self, index: usize) {
        self.cursor = self.timeline.items().get(index).map(|item| item.key.clone());
    }

    /// Lay out around the current scroll offset, then report the real
    /// title height for every visible title.
    fn refresh(&mut self) -> Result<()> {
        block_on(self.timeline.on_scroll_change(self.scroll_top(), false))?;
        let titles: Vec<usize> = {
            let items = self.timeline.items();
            self.timeline
                .visible_items()
                .as_range()
                .filter(|&i| items[i].is_title() && items[i].height != ROW_PX)
                .collect()
        };
        for index in titles {
            self.timeline.set_actual_item_height(index, ROW_PX)?;
        }
        Ok(())
    }

    pub fn scroll_to(&mut self, top: f64) -> Result<()> {
        let host = self.timeline.host();
        let max = (self.timeline.timeline_height() - host.viewport_height.get()).max(0.0);
        host.scroll_top.set(top.clamp(0.0, max));
        self.refresh()
    }

    pub fn scroll_by(&mut self, delta: f64) -> Result<()> {
        self.scroll_to(self.scroll_top() + delta)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        let viewport = Self::viewport_for(cols, rows);
        self.timeline.host().viewport_height.set(viewport.height);
        block_on(self.timeline.resize(viewport, self.scroll_top()))?;
        self.refresh()
    }

    fn reveal(&mut self, index: usize) -> Result<()> {
        let Some((top, bottom)) = self
            .timeline
            .items()
            .get(index)
            .map(|item| (item.top, item.bottom()))
        else {
            return Ok(());
        };
        let scroll = self.scroll_top();
        let height = self.timeline.host().viewport_height.get();
        if top < scroll {
            self.scroll_to(top - ROW_PX)
        } else if bottom > scroll + height {
            self.scroll_to(bottom - height)
        } else {
            Ok(())
        }
    }

    fn move_cursor(&mut self, direction: Direction) -> Result<()> {
        let next = match self.cursor_index() {
            Some(index) => self.timeline.next_item_position(index, direction).or_else(|| {
                // the neighbour may live in a section that is not laid out yet
                let forward = matches!(direction, Direction::Right | Direction::Down);
                let scroll = self.scroll_top() + if forward { ROW_PX * 10.0 } else { -ROW_PX * 10.0 };
                self.scroll_to(scroll).ok()?;
                let index = self.cursor_index()?;
                self.timeline.next_item_position(index, direction)
            }),
            None => {
                let scroll = self.scroll_top();
                let items = self.timeline.items();
                self.timeline
                    .visible_items()
                    .as_range()
                    .find(|&i| items[i].is_selectable() && items[i].top >= scroll)
            }
        };
        if let Some(index) = next {
            self.set_cursor(index);
            self.reveal(index)?;
        }
        Ok(())
    }

    /// Put the cursor on the thumbnail showing global asset `asset_index`.
    pub fn jump_to_asset(&mut self, asset_index: usize) -> Result<()> {
        let (_, item) = block_on(self.timeline.move_view_to_asset(asset_index))?;
        self.cursor = Some(item.key);
        self.scroll_to(item.top - ROW_PX)?;
        match self.cursor_index() {
            Some(index) => self.reveal(index),
            None => Ok(()),
        }
    }

    fn cursor_asset_index(&self) -> Option<usize> {
        let index = self.cursor_index()?;
        match self.timeline.items()[index].kind {
            GridItemKind::Asset { asset_index, .. } => Some(asset_index),
            GridItemKind::PhotoStack {
                first_asset_index, ..
            } => Some(first_asset_index),
            _ => None,
        }
    }

    /// Group owning the thumbnail under the cursor. A segment's title is
    /// emitted right before its thumbnails.
    fn group_at_cursor(&self) -> Option<GroupId> {
        let index = self.cursor_index()?;
        let items = self.timeline.items();
        match &items[..index].iter().rev().find(|item| item.is_title())?.kind {
            GridItemKind::GroupTitle { group_id, .. } => Some(group_id.clone()),
            _ => None,
        }
    }

    fn toggle_selection(&mut self, index: usize) -> Result<()> {
        let id = self.timeline.items()[index].key.clone();
        let selected = self
            .timeline
            .selected_items()
            .iter()
            .any(|item| selection_key(item) == id.as_str());
        self.timeline.set_item_selected(index, !selected)?;
        self.status = format!("{} selected", self.timeline.selected_asset_count());
        Ok(())
    }

    pub fn is_selected_key(&self, key: &str) -> bool {
        self.timeline
            .selected_items()
            .iter()
            .any(|item| selection_key(item) == key)
    }

    pub fn click(&mut self, col: u16, row: u16) -> Result<()> {
        if row == 0 {
            return Ok(());
        }
        let x = f64::from(col) * COL_PX + COL_PX / 2.0;
        let y = self.scroll_top() + f64::from(row - 1) * ROW_PX + ROW_PX / 2.0;
        match self.timeline.grid_item_at_position(x, y) {
            Some(index) if self.timeline.items()[index].is_selectable() => {
                self.set_cursor(index);
                self.toggle_selection(index)
            }
            _ => Ok(()),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let page = self.timeline.host().viewport_height.get();
        match key.code {
            KeyCode::Left => return self.move_cursor(Direction::Left),
            KeyCode::Right => return self.move_cursor(Direction::Right),
            KeyCode::Up => return self.move_cursor(Direction::Up),
            KeyCode::Down => return self.move_cursor(Direction::Down),
            KeyCode::PageUp => return self.scroll_by(-page),
            KeyCode::PageDown => return self.scroll_by(page),
            _ => {}
        }
        if self.timeline.mode() == TimelineMode::CreatingGroup {
            self.handle_naming_key(key)
        } else {
            self.handle_browse_key(key)
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char(' ') => {
                if let Some(index) = self.cursor_index() {
                    self.toggle_selection(index)?;
                }
            }
            KeyCode::Char('c') => {
                self.timeline.clear_selection();
                self.status.clear();
            }
            KeyCode::Char('h') => {
                let hidden = block_on(self.timeline.hide_selected_assets())?;
                self.cursor = None;
                self.status = format!("{hidden} hidden");
                self.scroll_by(0.0)?;
            }
            KeyCode::Char('g') => {
                if self.timeline.create_group_clicked()? {
                    self.group_name.clear();
                    self.status = "name the group, Enter to save, Tab to add to the group under the cursor".into();
                    self.scroll_by(0.0)?;
                }
            }
            KeyCode::Home => self.jump_to_asset(0)?,
            KeyCode::End => {
                let total = self.timeline.total_num_assets() as usize;
                if total > 0 {
                    self.jump_to_asset(total - 1)?;
                }
            }
            KeyCode::Char('i') => {
                if let Some(asset_index) = self.cursor_asset_index() {
                    let asset = block_on(self.timeline.get_or_load_asset_at_index(asset_index))?;
                    self.status = format!(
                        "#{asset_index} {} {}x{} taken {}",
                        asset.id,
                        asset.width,
                        asset.height,
                        asset.taken_date.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_naming_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.timeline.cancel_create_group()?;
                self.status = "group discarded".into();
                self.scroll_by(0.0)?;
            }
            KeyCode::Enter => {
                let name = std::mem::take(&mut self.group_name);
                let group = block_on(self.timeline.confirm_create_group(name.trim()))?;
                info!(group = %group, "group saved from terminal");
                self.status = format!("saved group {group}");
                self.scroll_by(0.0)?;
            }
            KeyCode::Tab => match self.group_at_cursor() {
                Some(group) => {
                    block_on(self.timeline.add_selected_to_existing_group(&group))?;
                    self.status = format!("added to group {group}");
                    self.scroll_by(0.0)?;
                }
                None => self.status = "move the cursor onto a group first".into(),
            },
            KeyCode::Backspace => {
                self.group_name.pop();
            }
            KeyCode::Char(c) => self.group_name.push(c),
            other => debug!(?other, "key ignored while naming"),
        }
        Ok(())
    }
}

/// Grid key of the thumbnail showing a selected item.
fn selection_key(item: &ItemId) -> String {
    match item {
        ItemId::Asset(id) => format!("asset-{id}"),
        ItemId::StackPiece { series_id, start } => format!("stack-{series_id}-{start}"),
    }
}
