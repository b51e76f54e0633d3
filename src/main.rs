pub mod app;
pub mod controller;
pub mod gate;
pub mod gateway;
pub mod layout;
pub mod render;

use std::error::Error;
use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use app::App;
use controller::{Gesture, Phase};
use gateway::HttpGateway;

#[derive(Parser)]
#[command(name = "q-lines", about = "Terminal client for the quantum circuit puzzle game")]
struct Args {
    /// Game server address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Game server port
    #[arg(short = 'P', long, default_value_t = 8088)]
    port: u16,
    /// Display name for the leaderboard
    #[arg(long)]
    name: Option<String>,
    /// Log gateway traffic
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.debug {
        "debug"
    } else {
        "warn"
    }))
    .init();

    let name = args.name.unwrap_or_else(app::random_name);
    let gateway = HttpGateway::new(&args.host, args.port);
    let mut app = App::new(Box::new(gateway), name);
    app.refresh_rank();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| render::render(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                // Clear status message on any key
                app.status_msg.clear();

                // a blocking notice or hint overlay eats the key
                if app.notice.take().is_some() {
                    continue;
                }
                if app.hints.take().is_some() {
                    continue;
                }

                let code = key.code;
                let mods = key.modifiers;

                if code == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
                    app.settle_game()?;
                    return Ok(());
                }
                match code {
                    KeyCode::Char('q') => {
                        app.settle_game()?;
                        return Ok(());
                    }
                    KeyCode::Char('s') => app.start_game()?,
                    KeyCode::Char('e') => app.settle_game()?,
                    KeyCode::Char('h') => app.request_hint()?,
                    KeyCode::Char('r') => app.refresh_rank(),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => {
                if app.notice.is_some() || app.hints.is_some() {
                    // overlays are keyboard-dismissed; ignore the mouse
                    continue;
                }
                handle_mouse(app, mouse)?;
            }
            _ => {}
        }
    }
}

/// Maps raw mouse events onto the placement protocol's gestures: press on
/// a tray slot starts a drag, release over the grid is a drop, left and
/// right clicks drive control-wire selection, right click on a placed
/// gate removes it.
fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Result<(), Box<dyn Error>> {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match app.phase {
            Phase::Idle => {
                if let Some(slot) = app.tray_slot_at(x, y) {
                    app.gesture(Gesture::DragStart(slot))?;
                }
            }
            Phase::AwaitingControl { .. } => {
                if let Some(wire) = app.wire_at(x, y) {
                    app.gesture(Gesture::PrimaryClick(wire))?;
                }
            }
            Phase::Dragging { .. } => {}
        },
        MouseEventKind::Drag(MouseButton::Left) => {
            if matches!(app.phase, Phase::Dragging { .. }) {
                app.hover_wire = app.wire_at(x, y);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if matches!(app.phase, Phase::Dragging { .. }) {
                match app.wire_at(x, y) {
                    Some(wire) => app.gesture(Gesture::Drop(wire))?,
                    None => app.gesture(Gesture::DragEnd)?,
                }
            }
        }
        MouseEventKind::Down(MouseButton::Right) => match app.phase {
            Phase::AwaitingControl { .. } => app.gesture(Gesture::SecondaryClick)?,
            Phase::Idle => {
                if let Some(idx) = app.placed_gate_at(x, y) {
                    app.remove_gate(idx)?;
                }
            }
            Phase::Dragging { .. } => {}
        },
        _ => {}
    }
    Ok(())
}
