//! Interactive bookmark board. Markers are picked up and dropped onto
//! another marker; the new order shows at once and is synced in the
//! background.

use crate::api::{ApiError, LifehubApi};
use crate::error::AppResult;
use crate::models::marker::{LinkItem, Marker};
use crate::operations::browse::centered_rect;
use crate::operations::toast::Toast;
use crate::state::markers::{FailedMovePolicy, MarkerStore, MoveSettlement};
use crate::state::reorder::MoveCommand;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

type MoveResult = (MoveCommand, Result<(), ApiError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Markers,
    Links,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    Input(InputKind),
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputKind {
    MarkerTitle,
    LinkTitle,
    LinkUrl { title: String },
}

struct BoardState {
    store: MarkerStore,
    focus: Focus,
    mode: Mode,
    markers_state: ListState,
    links_state: ListState,
    /// Marker currently lifted for a move.
    picked: Option<String>,
    input_buffer: String,
    toast: Option<Toast>,
    /// Moves applied locally that still need their server call.
    outbox: Vec<MoveCommand>,
    in_flight: usize,
    open_browser: bool,
}

impl BoardState {
    fn new(store: MarkerStore, open_browser: bool) -> Self {
        let mut markers_state = ListState::default();
        if !store.markers().is_empty() {
            markers_state.select(Some(0));
        }
        Self {
            store,
            focus: Focus::Markers,
            mode: Mode::Normal,
            markers_state,
            links_state: ListState::default(),
            picked: None,
            input_buffer: String::new(),
            toast: None,
            outbox: Vec::new(),
            in_flight: 0,
            open_browser,
        }
    }

    fn selected_marker(&self) -> Option<&Marker> {
        self.store.markers().get(self.markers_state.selected()?)
    }

    fn selected_link(&self) -> Option<&LinkItem> {
        self.selected_marker()?.links.get(self.links_state.selected()?)
    }

    fn select_marker_id(&mut self, id: &str) {
        let index = self.store.markers().iter().position(|m| m.id == id);
        self.markers_state.select(index);
        self.reset_links();
    }

    fn reset_links(&mut self) {
        let has_links = self.selected_marker().is_some_and(|m| !m.links.is_empty());
        self.links_state.select(has_links.then_some(0));
    }

    fn clamp_selection(&mut self) {
        let len = self.store.markers().len();
        let selected = match self.markers_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.markers_state.select(selected);

        let links = self.selected_marker().map_or(0, |m| m.links.len());
        let link = match self.links_state.selected() {
            _ if links == 0 => None,
            Some(i) => Some(i.min(links - 1)),
            None => Some(0),
        };
        self.links_state.select(link);
    }

    fn move_selection(&mut self, delta: i32) {
        let (state, len) = match self.focus {
            Focus::Markers => (&mut self.markers_state, self.store.markers().len()),
            Focus::Links => {
                let len = self
                    .markers_state
                    .selected()
                    .and_then(|i| self.store.markers().get(i))
                    .map_or(0, |m| m.links.len());
                (&mut self.links_state, len)
            }
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, len as i32 - 1) as usize;
        state.select(Some(next));
        if self.focus == Focus::Markers {
            self.reset_links();
        }
    }

    /// First press lifts the selected marker, the second drops it onto
    /// whatever is selected then.
    fn pick_or_drop(&mut self) {
        let Some(target) = self.selected_marker().map(|m| m.id.clone()) else {
            return;
        };
        match self.picked.take() {
            None => self.picked = Some(target),
            Some(source) => {
                if let Some(command) = self.store.begin_move(&source, &target) {
                    self.outbox.push(command);
                }
                self.select_marker_id(&source);
            }
        }
    }

    /// A 401 from the sync is handed back so the board closes and the
    /// caller can send the user to the login page.
    fn settle_move(&mut self, command: MoveCommand, result: Result<(), ApiError>) -> AppResult<()> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let selected = self.selected_marker().map(|m| m.id.clone());
        let error = match self.store.settle_move(command, result) {
            MoveSettlement::Synced => return Ok(()),
            MoveSettlement::KeptLocal(e) => e,
            MoveSettlement::RolledBack(e) => {
                self.toast = Some(Toast::error("Move failed, order restored", e.to_string()));
                if let Some(id) = selected {
                    self.select_marker_id(&id);
                }
                e
            }
        };
        if error == ApiError::Unauthorized {
            return Err(error.into());
        }
        Ok(())
    }

    fn settle<T>(
        &mut self,
        result: AppResult<T>,
        success: Toast,
        fail_title: &str,
    ) -> AppResult<()> {
        match result {
            Ok(_) => {
                self.toast = Some(success);
                self.clamp_selection();
                Ok(())
            }
            Err(e) if e.needs_login() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "{}", fail_title);
                self.toast = Some(Toast::from_error(fail_title, &e));
                Ok(())
            }
        }
    }

    fn start_input(&mut self, kind: InputKind) {
        self.input_buffer.clear();
        self.mode = Mode::Input(kind);
    }

    fn commit_input<A: LifehubApi>(&mut self, api: &A, kind: InputKind) -> AppResult<()> {
        let raw = self.input_buffer.trim().to_string();
        self.mode = Mode::Normal;
        if raw.is_empty() {
            return Ok(());
        }

        match kind {
            InputKind::MarkerTitle => {
                let result = self.store.create_marker(api, &raw, None).map(|m| m.id.clone());
                let created = result.as_ref().ok().cloned();
                let toast = Toast::success("Marker created", raw.clone());
                self.settle(result, toast, "Create failed")?;
                if let Some(id) = created {
                    self.select_marker_id(&id);
                }
                Ok(())
            }
            InputKind::LinkTitle => {
                self.start_input(InputKind::LinkUrl { title: raw });
                Ok(())
            }
            InputKind::LinkUrl { title } => {
                let Some(marker_id) = self.selected_marker().map(|m| m.id.clone()) else {
                    return Ok(());
                };
                let result = self.store.add_link(api, &marker_id, &title, &raw);
                let added = result.is_ok();
                self.settle(result, Toast::success("Link added", title), "Add link failed")?;
                if added {
                    let last = self
                        .selected_marker()
                        .map_or(0, |m| m.links.len().saturating_sub(1));
                    self.links_state.select(Some(last));
                }
                Ok(())
            }
        }
    }

    fn delete_selected<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        self.mode = Mode::Normal;
        let Some(marker_id) = self.selected_marker().map(|m| m.id.clone()) else {
            return Ok(());
        };
        match self.focus {
            Focus::Markers => {
                if self.picked.as_deref() == Some(marker_id.as_str()) {
                    self.picked = None;
                }
                let result = self.store.delete_marker(api, &marker_id);
                self.settle(result, Toast::success("Marker deleted", ""), "Delete failed")
            }
            Focus::Links => {
                let Some(link_id) = self.selected_link().map(|l| l.id.clone()) else {
                    return Ok(());
                };
                let result = self.store.delete_link(api, &marker_id, &link_id);
                self.settle(result, Toast::success("Link deleted", ""), "Delete failed")
            }
        }
    }

    fn open_selected_link(&mut self) {
        let Some(url) = self.selected_link().map(|l| l.url.clone()) else {
            return;
        };
        if !self.open_browser {
            self.toast = Some(Toast::success("Link", url));
            return;
        }
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, url, "Failed to open link");
            self.toast = Some(Toast::error("Failed to open link", e.to_string()));
        }
    }

    fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }
}

/// Runs each move's single update call off the UI thread.
fn dispatch_moves<A>(api: &A, state: &mut BoardState, results: &Sender<MoveResult>)
where
    A: LifehubApi + Clone + Send + 'static,
{
    for command in state.outbox.drain(..) {
        let api = api.clone();
        let results = results.clone();
        state.in_flight += 1;
        thread::spawn(move || {
            let result = command.sync(&api);
            // The board may already be closed; the result is then dropped.
            let _ = results.send((command, result));
        });
    }
}

fn collect_results(state: &mut BoardState, results: &Receiver<MoveResult>) -> AppResult<()> {
    while let Ok((command, result)) = results.try_recv() {
        state.settle_move(command, result)?;
    }
    Ok(())
}

pub fn run_board<A>(api: &A, store: MarkerStore, open_browser: bool) -> AppResult<()>
where
    A: LifehubApi + Clone + Send + 'static,
{
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let result = board_loop(api, BoardState::new(store, open_browser));

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn board_loop<A>(api: &A, mut state: BoardState) -> AppResult<()>
where
    A: LifehubApi + Clone + Send + 'static,
{
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;
    let (sender, receiver) = mpsc::channel();

    loop {
        collect_results(&mut state, &receiver)?;
        state.expire_toast();

        terminal.draw(|frame| {
            let size = frame.area();
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(3),
                ])
                .split(size);
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(layout[1]);

            render_header(frame, layout[0], &state);
            render_markers(frame, body[0], &mut state);
            render_links(frame, body[1], &mut state);
            render_footer(frame, layout[2], &state);

            match state.mode {
                Mode::Input(ref kind) => render_input_modal(frame, size, &state, kind),
                Mode::ConfirmDelete => render_confirm_modal(frame, size, &state),
                Mode::Normal => {}
            }
        })?;

        if event::poll(std::time::Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                let quit = handle_key(api, &mut state, key)?;
                dispatch_moves(api, &mut state, &sender);
                if quit {
                    if state.in_flight > 0 {
                        tracing::info!(
                            pending = state.in_flight,
                            "Leaving board with moves still syncing"
                        );
                    }
                    return Ok(());
                }
            }
        }
    }
}

fn handle_key<A: LifehubApi>(api: &A, state: &mut BoardState, key: KeyEvent) -> AppResult<bool> {
    if key.kind == KeyEventKind::Release {
        return Ok(false);
    }

    match state.mode.clone() {
        Mode::Normal => match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if state.picked.take().is_none() {
                    return Ok(true);
                }
            }
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::Tab => {
                state.focus = match state.focus {
                    Focus::Markers if state.selected_marker().is_some() => Focus::Links,
                    _ => Focus::Markers,
                };
                state.clamp_selection();
            }
            KeyCode::Char(' ') if state.focus == Focus::Markers => state.pick_or_drop(),
            KeyCode::Char('n') => state.start_input(InputKind::MarkerTitle),
            KeyCode::Char('a') if state.selected_marker().is_some() => {
                state.start_input(InputKind::LinkTitle)
            }
            KeyCode::Char('d') => {
                let target = match state.focus {
                    Focus::Markers => state.selected_marker().is_some(),
                    Focus::Links => state.selected_link().is_some(),
                };
                if target {
                    state.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Enter | KeyCode::Char('o') if state.focus == Focus::Links => {
                state.open_selected_link()
            }
            KeyCode::Char('r') => {
                state.picked = None;
                state.store.reload(api)?;
                state.clamp_selection();
            }
            _ => {}
        },
        Mode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => state.delete_selected(api)?,
            _ => state.mode = Mode::Normal,
        },
        Mode::Input(kind) => match key.code {
            KeyCode::Esc => state.mode = Mode::Normal,
            KeyCode::Enter => state.commit_input(api, kind)?,
            KeyCode::Backspace => {
                state.input_buffer.pop();
            }
            KeyCode::Char(ch) => state.input_buffer.push(ch),
            _ => {}
        },
    }

    Ok(false)
}

fn marker_color(class: &str) -> Color {
    match class.split('-').nth(1) {
        Some("rose") | Some("red") => Color::Red,
        Some("blue") => Color::Blue,
        Some("emerald") | Some("green") => Color::Green,
        Some("violet") | Some("purple") => Color::Magenta,
        Some("slate") | Some("gray") => Color::Gray,
        Some("amber") | Some("yellow") => Color::Yellow,
        _ => Color::White,
    }
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BoardState) {
    let mut spans = vec![
        Span::styled("LifeHub Markers", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  "),
        Span::raw(format!("Markers: {}", state.store.markers().len())),
    ];
    if state.store.policy() == FailedMovePolicy::Rollback {
        spans.push(Span::styled(
            "  (failed moves roll back)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(ref picked) = state.picked {
        let title = state.store.marker(picked).map_or(picked.as_str(), |m| m.title.as_str());
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(format!("Moving: {}", title), Style::default().fg(Color::Yellow)));
    }
    if state.in_flight > 0 {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled("syncing...", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_markers(frame: &mut ratatui::Frame, area: Rect, state: &mut BoardState) {
    let border = if state.focus == Focus::Markers { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .title("Game Guides")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    if state.store.markers().is_empty() {
        let text = if state.store.is_loading() {
            "Loading..."
        } else {
            "No markers yet. Press n to create one."
        };
        frame.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = state
        .store
        .markers()
        .iter()
        .map(|marker| {
            let lifted = state.picked.as_deref() == Some(marker.id.as_str());
            let mut title = Style::default().fg(Color::White);
            if lifted {
                title = title.fg(Color::Yellow).bold();
            }
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(marker_color(&marker.color))),
                Span::styled(marker.title.clone(), title),
                Span::styled(
                    format!("  ({} links)", marker.links.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("➤ ");
    frame.render_stateful_widget(list, area, &mut state.markers_state);
}

fn render_links(frame: &mut ratatui::Frame, area: Rect, state: &mut BoardState) {
    let border = if state.focus == Focus::Links { Color::Cyan } else { Color::DarkGray };
    let title = state
        .selected_marker()
        .map_or_else(|| "Links".to_string(), |m| format!("Links: {}", m.title));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let links: Vec<ListItem> = state
        .selected_marker()
        .map(|m| m.links.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|link| {
            ListItem::new(vec![
                Line::from(Span::styled(link.title.clone(), Style::default().bold())),
                Line::from(Span::styled(link.url.clone(), Style::default().fg(Color::Blue))),
            ])
        })
        .collect();

    if links.is_empty() {
        frame.render_widget(
            Paragraph::new("No links. Press a to add one.")
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let list = List::new(links)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("➤ ");
    frame.render_stateful_widget(list, area, &mut state.links_state);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BoardState) {
    let block = Block::default().borders(Borders::ALL);
    if let Some(ref toast) = state.toast {
        frame.render_widget(
            Paragraph::new(Span::styled(toast.text(), toast.style())).block(block),
            area,
        );
        return;
    }

    let hint = match (&state.mode, state.focus) {
        (Mode::Normal, Focus::Markers) if state.picked.is_some() => {
            "↑/↓ choose target  Space drop  Esc cancel"
        }
        (Mode::Normal, Focus::Markers) => {
            "↑/↓ move  Space pick up  n new  a add link  d delete  Tab links  r reload  q exit"
        }
        (Mode::Normal, Focus::Links) => {
            "↑/↓ move  Enter/o open  a add  d delete  Tab markers  q exit"
        }
        (Mode::Input(_), _) => "Type, Enter apply, Esc cancel",
        (Mode::ConfirmDelete, _) => "y confirm, any other key cancels",
    };
    frame.render_widget(
        Paragraph::new(hint).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_input_modal(
    frame: &mut ratatui::Frame,
    area: Rect,
    state: &BoardState,
    kind: &InputKind,
) {
    let popup_area = centered_rect(60, 25, area);
    frame.render_widget(Clear, popup_area);

    let (title, help) = match kind {
        InputKind::MarkerTitle => ("New Marker", "Game title".to_string()),
        InputKind::LinkTitle => ("New Link", "Link title".to_string()),
        InputKind::LinkUrl { title } => ("New Link", format!("URL for \"{}\"", title)),
    };
    let lines = vec![
        Line::from(Span::styled(title, Style::default().bold())),
        Line::from(help),
        Line::from(""),
        Line::from(Span::styled(
            format!("> {}", state.input_buffer),
            Style::default().fg(Color::Yellow),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Input"))
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, state: &BoardState) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let target = match state.focus {
        Focus::Markers => {
            state.selected_marker().map(|m| format!("Delete marker \"{}\"?", m.title))
        }
        Focus::Links => state.selected_link().map(|l| format!("Delete link \"{}\"?", l.title)),
    };
    let lines = vec![
        Line::from(Span::styled(
            target.unwrap_or_default(),
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y to delete, any other key to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .alignment(Alignment::Center),
        popup_area,
    );
}
