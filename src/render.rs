use chrono::DateTime;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::App;
use crate::controller::Phase;
use crate::gate::tray_label;
use crate::layout::compute_depths;

// ── Colors ─────────────────────────────────────────────────────────────────

const BLUE: Color = Color::Rgb(122, 162, 247);
const GREEN: Color = Color::Rgb(158, 206, 106);
const ORANGE: Color = Color::Rgb(255, 158, 100);
const CYAN: Color = Color::Rgb(115, 218, 202);
const YELLOW: Color = Color::Rgb(224, 175, 104);
const DIM: Color = Color::Rgb(86, 95, 137);
const RED: Color = Color::Rgb(247, 118, 142);
const DARK_BLUE: Color = Color::Rgb(192, 202, 245);
const SLOT_BG: Color = Color::Rgb(41, 46, 66);

// ── Layout constants ────────────────────────────────────────────────────────

pub const CELL_W: usize = 9;
const LABEL_W: u16 = 7; // "q[N]  ──"
const RANK_W: u16 = 36;
const TRAY_H: u16 = 4;
const SCORE_H: u16 = 3;
const CTRL_H: u16 = 3;

// ── Main render entry point ─────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let size = f.area();
    app.width = size.width;
    app.height = size.height;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(CTRL_H)])
        .split(size);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(RANK_W)])
        .split(main_chunks[0]);

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(TRAY_H),
            Constraint::Length(SCORE_H),
        ])
        .split(top_chunks[0]);

    render_circuit_panel(f, app, left_chunks[0]);
    render_tray_panel(f, app, left_chunks[1]);
    render_score_panel(f, app, left_chunks[2]);
    render_rank_panel(f, app, top_chunks[1]);
    render_controls_panel(f, app, main_chunks[1]);

    if app.hints.is_some() {
        render_hint_overlay(f, app);
    }
    if app.notice.is_some() {
        render_notice_overlay(f, app);
    }
}

// ── Circuit Panel ─────────────────────────────────────────────────────────────

fn render_circuit_panel(f: &mut Frame, app: &mut App, area: Rect) {
    let border_color = if app.in_game() { ORANGE } else { BLUE };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            "Circuit",
            Style::default().fg(ORANGE).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    app.wire_hits.clear();

    let Some(player) = &app.player else {
        let p = Paragraph::new(Span::styled(
            "  press s to start a game",
            Style::default().fg(DIM),
        ));
        f.render_widget(p, inner);
        return;
    };
    let Some(grid) = &app.grid else {
        return;
    };

    // next-free-slot highlights: hovered wire while dragging, every
    // candidate wire while picking a control
    let depths = compute_depths(&player.circuit, player.n_qubit).unwrap_or_default();
    let mut marked: Vec<(usize, usize)> = vec![];
    match &app.phase {
        Phase::Dragging { .. } => {
            if let Some(w) = app.hover_wire {
                if let Some(&d) = depths.get(w) {
                    marked.push((w, d));
                }
            }
        }
        Phase::AwaitingControl { candidates, .. } => {
            for &r in candidates {
                if let Some(&d) = depths.get(r) {
                    marked.push((r, d));
                }
            }
        }
        Phase::Idle => {}
    }

    let avail_cols = ((inner.width.saturating_sub(LABEL_W)) as usize / CELL_W).max(1);
    let visible_cols = grid.depth_limit.min(avail_cols);

    let mut lines: Vec<Line> = Vec::new();
    let mut wire_hits: Vec<(usize, Rect)> = Vec::new();

    // column index header
    let mut hdr: Vec<Span> = vec![Span::raw(" ".repeat(LABEL_W as usize))];
    for c in 0..visible_cols {
        hdr.push(Span::styled(
            pad_center(&format!("{c}"), CELL_W),
            Style::default().fg(DIM),
        ));
    }
    lines.push(Line::from(hdr));

    for wire in 0..grid.wire_count {
        let mut spans: Vec<Span> = Vec::new();
        spans.push(Span::styled(
            format!("{:<5}──", format!("q[{wire}]")),
            Style::default().fg(DARK_BLUE),
        ));
        for col in 0..visible_cols {
            let cell = grid.cell(wire, col);
            let is_marked = marked.contains(&(wire, col));
            let span = if cell.occupied() {
                let txt = if cell.is_control {
                    format!("●{}", cell.label)
                } else if cell.is_target {
                    format!("⊕{}", cell.label)
                } else {
                    cell.label.clone()
                };
                Span::styled(
                    pad_center(&txt, CELL_W),
                    Style::default().fg(Color::Black).bg(BLUE),
                )
            } else if is_marked {
                Span::styled(
                    pad_center("◌", CELL_W),
                    Style::default().fg(Color::Black).bg(YELLOW),
                )
            } else {
                Span::styled(pad_center("─", CELL_W), Style::default().fg(DIM).bg(SLOT_BG))
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));

        // hit zone: the cells region of this wire's row (header is line 0)
        wire_hits.push((
            wire,
            Rect {
                x: inner.x + LABEL_W,
                y: inner.y + 1 + wire as u16,
                width: (visible_cols * CELL_W) as u16,
                height: 1,
            },
        ));
    }

    if !app.status_msg.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("  {}", app.status_msg),
            Style::default().fg(YELLOW),
        ));
    }

    app.wire_hits = wire_hits;

    let p = Paragraph::new(Text::from(lines));
    f.render_widget(p, inner);
}

// ── Tray Panel ────────────────────────────────────────────────────────────────

const TRAY_SLOTS: usize = 3;
const SLOT_W: u16 = 11;

fn render_tray_panel(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title(Span::styled(
            "Gates",
            Style::default().fg(ORANGE).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let tray = app
        .player
        .as_ref()
        .map(|p| p.cur_gate.as_slice())
        .unwrap_or(&[]);
    let nxt = app.player.as_ref().and_then(|p| p.nxt_gate.as_ref());
    let dragging_slot = match app.phase {
        Phase::Dragging { slot } => Some(slot),
        _ => None,
    };

    let mut tray_hits: Vec<(usize, Rect)> = Vec::new();
    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for i in 0..TRAY_SLOTS {
        let gate = tray.get(i);
        let label = tray_label(gate);
        let style = if gate.is_some() {
            let s = Style::default().fg(Color::Black).bg(GREEN);
            if dragging_slot == Some(i) {
                s.bg(CYAN)
            } else {
                s
            }
        } else {
            Style::default().fg(DIM).bg(SLOT_BG)
        };
        spans.push(Span::styled(pad_center(&label, SLOT_W as usize), style));
        spans.push(Span::raw(" "));

        if gate.is_some() {
            tray_hits.push((
                i,
                Rect {
                    x: inner.x + 1 + i as u16 * (SLOT_W + 1),
                    y: inner.y,
                    width: SLOT_W,
                    height: 1,
                },
            ));
        }
    }

    spans.push(Span::styled("  next: ", Style::default().fg(DIM)));
    spans.push(Span::styled(
        pad_center(&tray_label(nxt), SLOT_W as usize),
        Style::default().fg(Color::Black).bg(DIM),
    ));

    app.tray_hits = tray_hits;

    let mut lines = vec![Line::from(spans)];
    if let Phase::AwaitingControl { target, .. } = app.phase {
        lines.push(Line::styled(
            format!(" pick a control wire for the gate on q[{target}]  (left click: confirm, right click: cancel)"),
            Style::default().fg(CYAN),
        ));
    }
    let p = Paragraph::new(Text::from(lines));
    f.render_widget(p, inner);
}

// ── Score Panel ───────────────────────────────────────────────────────────────

fn render_score_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(RED));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let (score, token, bingo) = match &app.player {
        Some(p) => (p.score, p.token, p.bingo),
        None => (0, 0, 0),
    };
    let line = Line::from(vec![
        Span::styled(" Score: ", Style::default().fg(DIM)),
        Span::styled(score.to_string(), Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)),
        Span::styled("  Token: ", Style::default().fg(DIM)),
        Span::styled(token.to_string(), Style::default().fg(CYAN)),
        Span::styled("  Bingo: ", Style::default().fg(DIM)),
        Span::styled(bingo.to_string(), Style::default().fg(GREEN)),
        Span::styled("  Player: ", Style::default().fg(DIM)),
        Span::styled(app.player_name.as_str(), Style::default().fg(DARK_BLUE)),
    ]);
    f.render_widget(Paragraph::new(line), inner);
}

// ── Rank Panel ────────────────────────────────────────────────────────────────

fn render_rank_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title(Span::styled(
            "Leaderboard",
            Style::default().fg(ORANGE).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::styled(
        format!("{:<10} {:>6} {:>5}  {:<10}", "name", "score", "bingo", "date"),
        Style::default().fg(DIM).add_modifier(Modifier::BOLD),
    ));
    for row in &app.ranklist {
        let date = DateTime::from_timestamp(row.ts_end, 0)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::styled(
            format!("{:<10} {:>6} {:>5}  {:<10}", row.name, row.score, row.bingo, date),
            Style::default().fg(DARK_BLUE),
        ));
    }
    if app.ranklist.is_empty() {
        lines.push(Line::styled("  (no records yet)", Style::default().fg(DIM)));
    }

    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ── Controls Panel ─────────────────────────────────────────────────────────────

fn render_controls_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let help = match app.phase {
        Phase::Dragging { .. } => "Drop on a wire to place  Release elsewhere to cancel".to_string(),
        Phase::AwaitingControl { .. } => {
            "Left click a highlighted wire to confirm  Right click to cancel".to_string()
        }
        Phase::Idle => {
            "s Start  e Settle  h Hint  r Ranks  RightClick gate: remove  q Quit".to_string()
        }
    };

    let p = Paragraph::new(Span::styled(help, Style::default().fg(YELLOW)));
    f.render_widget(p, inner);
}

// ── Notification Overlay ───────────────────────────────────────────────────────

fn render_notice_overlay(f: &mut Frame, app: &App) {
    let Some(notice) = &app.notice else { return };
    let area = overlay_rect(f.area(), 60, 7);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(RED))
        .title(Span::styled(
            "Notice",
            Style::default().fg(RED).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::default(),
        Line::styled(notice.as_str(), Style::default().fg(DARK_BLUE)),
        Line::default(),
        Line::styled("press any key to dismiss", Style::default().fg(DIM)),
    ];
    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ── Hint Overlay ──────────────────────────────────────────────────────────────

fn render_hint_overlay(f: &mut Frame, app: &App) {
    let Some(hints) = &app.hints else { return };
    let area = overlay_rect(f.area(), 56, 16);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(CYAN))
        .title(Span::styled(
            "Hints",
            Style::default().fg(CYAN).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    if hints.is_empty() {
        lines.push(Line::styled(
            "no scoring placements right now",
            Style::default().fg(DIM),
        ));
    }
    for case in hints.iter().take(12) {
        let mut txt = format!(
            " slot {} -> q[{}]",
            case.idx, case.target_qubit
        );
        if let Some(c) = case.control_qubit {
            txt.push_str(&format!(" ctrl q[{c}]"));
        }
        txt.push_str(&format!("  {} +{}", case.settle_type, case.score));
        lines.push(Line::styled(txt, Style::default().fg(DARK_BLUE)));
    }
    lines.push(Line::default());
    lines.push(Line::styled("press any key to close", Style::default().fg(DIM)));

    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn pad_center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.chars().take(width).collect();
    }
    let total = width - len;
    let left = total / 2;
    let right = total - left;
    " ".repeat(left) + s + &" ".repeat(right)
}

fn overlay_rect(screen: Rect, min_w: u16, min_h: u16) -> Rect {
    let w = min_w.min(screen.width.saturating_sub(4));
    let h = min_h.min(screen.height.saturating_sub(4));
    Rect {
        x: screen.width.saturating_sub(w) / 2,
        y: screen.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
}
