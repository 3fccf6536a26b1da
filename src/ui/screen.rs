//! The single-screen layout: preview surface, photo thumbnail, result
//! labels, toggles, and busy indicator.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::preview::AsciiImage;

/// Busy indicator animation frames.
pub const SPINNER_FRAMES: &[char] = &['|', '/', '-', '\\'];

/// Width of the side column holding thumbnail and results.
const SIDE_WIDTH: u16 = 34;

/// Height of the thumbnail panel (including borders).
const THUMB_HEIGHT: u16 = 12;

/// One rendered view of the application.
pub struct ScreenState<'a> {
    /// Live preview grid (blank while the camera has no frames)
    pub preview: &'a AsciiImage,
    /// Thumbnail of the most recent captured photo
    pub thumbnail: Option<&'a AsciiImage>,
    /// Identification label text
    pub identification: &'a str,
    /// Confidence label text
    pub confidence: &'a str,
    /// "Flash: On" / "Flash: Off"
    pub flash_label: &'a str,
    /// "Speech: On" / "Speech: Off"
    pub speech_label: &'a str,
    /// Whether a pipeline run is in flight
    pub busy: bool,
    /// Short name of the in-flight stage
    pub stage: &'a str,
    /// Current spinner frame index
    pub spinner_tick: usize,
    /// Whether the camera configured successfully at startup
    pub camera_ok: bool,
}

/// Character cell dimensions available for the live preview.
pub fn preview_dimensions(term_width: u16, term_height: u16) -> (u16, u16) {
    let area = layout(Rect::new(0, 0, term_width, term_height)).preview;
    (area.width.saturating_sub(2), area.height.saturating_sub(2))
}

/// Character cell dimensions available for the photo thumbnail.
pub fn thumbnail_dimensions() -> (u16, u16) {
    (SIDE_WIDTH - 2, THUMB_HEIGHT - 2)
}

struct Areas {
    preview: Rect,
    thumbnail: Rect,
    results: Rect,
    status: Rect,
}

fn layout(size: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(size);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDE_WIDTH)])
        .split(rows[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(THUMB_HEIGHT), Constraint::Min(4)])
        .split(columns[1]);

    Areas {
        preview: columns[0],
        thumbnail: side[0],
        results: side[1],
        status: rows[1],
    }
}

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, state: &ScreenState) {
    let areas = layout(frame.area());

    draw_preview(frame, areas.preview, state);
    draw_thumbnail(frame, areas.thumbnail, state);
    draw_results(frame, areas.results, state);
    draw_status(frame, areas.status, state);
}

fn draw_preview(frame: &mut Frame, area: Rect, state: &ScreenState) {
    let title = if state.camera_ok {
        " camera · Space to capture "
    } else {
        " camera unavailable "
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let text: Vec<Line> = if state.camera_ok {
        state
            .preview
            .lines()
            .into_iter()
            .map(Line::from)
            .collect()
    } else {
        vec![Line::from(""), Line::from("  no camera device")]
    };

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_thumbnail(frame: &mut Frame, area: Rect, state: &ScreenState) {
    let block = Block::default().borders(Borders::ALL).title(" last photo ");
    let text: Vec<Line> = match state.thumbnail {
        Some(thumb) => thumb.lines().into_iter().map(Line::from).collect(),
        None => vec![Line::from(""), Line::from("  (none yet)")],
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_results(frame: &mut Frame, area: Rect, state: &ScreenState) {
    let block = Block::default().borders(Borders::ALL).title(" result ");

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            state.identification.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(state.confidence.to_string()),
    ];

    if state.busy {
        let spinner = SPINNER_FRAMES[state.spinner_tick % SPINNER_FRAMES.len()];
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} {}...", spinner, state.stage),
            Style::default().fg(Color::Yellow),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &ScreenState) {
    let status = format!(
        " {} | {} | Space capture · f flash · s speech · q quit",
        state.flash_label, state.speech_label
    );
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_dimensions_fit_inside_terminal() {
        let (cols, rows) = preview_dimensions(80, 24);
        assert!(cols > 0 && cols < 80);
        assert!(rows > 0 && rows < 24);
    }

    #[test]
    fn test_preview_dimensions_tiny_terminal() {
        // Must not underflow on absurdly small terminals
        let (cols, rows) = preview_dimensions(2, 2);
        assert!(cols <= 2);
        assert!(rows <= 2);
    }

    #[test]
    fn test_thumbnail_dimensions_match_side_column() {
        let (cols, rows) = thumbnail_dimensions();
        assert_eq!(cols, SIDE_WIDTH - 2);
        assert_eq!(rows, THUMB_HEIGHT - 2);
    }

    #[test]
    fn test_spinner_frames_nonempty() {
        assert!(!SPINNER_FRAMES.is_empty());
    }
}
