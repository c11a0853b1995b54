use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use photogrid_core::TimelineMode;
use photogrid_protocol::{GridItemKind, TimelineGridItem};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders},
};
use tracing::warn;

use crate::app::{App, COL_PX, ROW_PX};

/// Cell rectangle of a grid item relative to the content area, clipped
/// vertically by the caller. Rows may be negative above the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CellBox {
    col: i64,
    row: i64,
    width: i64,
    height: i64,
}

fn cell_box(item: &TimelineGridItem, scroll_top: f64, container_cols: u16) -> CellBox {
    let (left, width) = item
        .horizontal()
        .unwrap_or((0.0, f64::from(container_cols) * COL_PX));
    let col = (left / COL_PX).round() as i64;
    let right = ((left + width) / COL_PX).round() as i64;
    CellBox {
        col,
        row: ((item.top - scroll_top) / ROW_PX).floor() as i64,
        // leave a one-cell gutter between neighbours
        width: (right - col - 1).max(1),
        height: ((item.height / ROW_PX).round() as i64).max(1),
    }
}

fn put_str(buf: &mut Buffer, area: Rect, col: i64, row: i64, text: &str, max: i64, style: Style) {
    if row < 0 || row >= i64::from(area.height) {
        return;
    }
    for (i, ch) in text.chars().take(max.max(0) as usize).enumerate() {
        let x = col + i as i64;
        if x < 0 || x >= i64::from(area.width) {
            continue;
        }
        buf[(area.x + x as u16, area.y + row as u16)]
            .set_char(ch)
            .set_style(style);
    }
}

fn title_text(app: &App, item: &TimelineGridItem) -> Option<(String, Style)> {
    let plain = Style::default().fg(Color::White);
    Some(match &item.kind {
        GridItemKind::MajorTitle { month } => (
            month.format("%B %Y").to_string(),
            plain.add_modifier(Modifier::BOLD),
        ),
        GridItemKind::DayTitle { start, .. } => (
            start.format("%a, %b %-d").to_string(),
            Style::default().fg(Color::Gray),
        ),
        GridItemKind::GroupTitle { name, .. } => (
            format!("◆ {}", name.as_deref().unwrap_or("Untitled group")),
            Style::default().fg(Color::LightBlue),
        ),
        GridItemKind::GroupTitleInput { .. } => (
            format!("◆ {}_", app.group_name),
            Style::default().fg(Color::Black).bg(Color::LightYellow),
        ),
        GridItemKind::Asset { .. } | GridItemKind::PhotoStack { .. } => return None,
    })
}

fn thumbnail_label(item: &TimelineGridItem) -> String {
    match &item.kind {
        GridItemKind::Asset { asset, .. } => asset.id.to_string(),
        GridItemKind::PhotoStack {
            cover,
            piece_len,
            series_len,
            ..
        } => format!("{} [{piece_len}/{series_len}]", cover.id),
        _ => String::new(),
    }
}

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();
    let timeline = &app.timeline;

    // Header
    let header_area = Rect::new(0, 0, area.width, 1);
    let mode = match timeline.mode() {
        TimelineMode::JustLooking => "space select | h hide | g group | i info | q quit",
        TimelineMode::CreatingGroup => "type a name | Enter save | Tab add to group | Esc cancel",
    };
    let header = Block::default()
        .title(format!(
            " photogrid · {} assets · {} selected · {mode} · {} ",
            timeline.total_num_assets(),
            timeline.selected_asset_count(),
            app.status
        ))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let content_area = Rect::new(0, 1, area.width, area.height.saturating_sub(1));
    let block = Block::default()
        .borders(Borders::NONE)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(block, content_area);

    let scroll_top = app.scroll_top();
    let cursor = app.cursor_index();
    let items = timeline.items();
    let buf = frame.buffer_mut();
    for index in timeline.visible_items().as_range() {
        let item = &items[index];
        let cell = cell_box(item, scroll_top, content_area.width);
        if cell.row + cell.height <= 0 || cell.row >= i64::from(content_area.height) {
            continue;
        }

        if let Some((text, style)) = title_text(app, item) {
            put_str(buf, content_area, cell.col, cell.row, &text, cell.width, style);
            continue;
        }

        let fg = if app.is_selected_key(&item.key) {
            Color::Green
        } else if matches!(item.kind, GridItemKind::PhotoStack { .. }) {
            Color::Cyan
        } else {
            Color::Blue
        };
        let mut style = Style::default().fg(fg).bg(Color::Black);
        if cursor == Some(index) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let fill = "░".repeat(cell.width.max(0) as usize);
        for row in cell.row..cell.row + cell.height {
            put_str(buf, content_area, cell.col, row, &fill, cell.width, style);
        }
        let label = thumbnail_label(item);
        put_str(buf, content_area, cell.col, cell.row, &label, cell.width, style);
    }
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.quit {
        terminal.draw(|frame| draw(frame, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let outcome = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => app.scroll_by(ROW_PX * 3.0),
                MouseEventKind::ScrollUp => app.scroll_by(-ROW_PX * 3.0),
                MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
                _ => Ok(()),
            },
            Event::Resize(cols, rows) => app.resize(cols, rows),
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            warn!(error = %err, "command failed");
            app.status = format!("error: {err}");
        }
    }
    Ok(())
}

pub fn render_tui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let result = app
        .start(App::viewport_for(size.width, size.height))
        .and_then(|()| event_loop(&mut terminal, app));

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
