//! Interactive payment history.

use crate::api::LifehubApi;
use crate::error::AppResult;
use crate::models::transaction::Transaction;
use crate::operations::history::{self, HistoryFilter};
use crate::operations::toast::Toast;
use crate::state::data::{DataStore, EditOutcome};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::cmp::{max, min};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
    Input(InputKind),
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Search,
    Category,
    Amount,
    NewCategory,
}

struct BrowseState {
    mode: Mode,
    store: DataStore,
    filtered_indices: Vec<usize>,
    table_state: TableState,
    filter: HistoryFilter,

    input_buffer: String,
    toast: Option<Toast>,

    last_page_size: usize,
}

impl BrowseState {
    fn new(store: DataStore) -> Self {
        let mut state = Self {
            mode: Mode::List,
            store,
            filtered_indices: Vec::new(),
            table_state: TableState::default(),
            filter: HistoryFilter::default(),
            input_buffer: String::new(),
            toast: None,
            last_page_size: 10,
        };
        state.recompute();
        state
    }

    fn selected_transaction(&self) -> Option<&Transaction> {
        let selected = self.table_state.selected()?;
        let idx = *self.filtered_indices.get(selected)?;
        self.store.transactions().get(idx)
    }

    fn recompute(&mut self) {
        let txs = self.store.transactions();
        let mut indices: Vec<usize> = (0..txs.len())
            .filter(|&i| self.filter.matches(&txs[i]))
            .collect();
        // Newest first; unparsable dates sink to the bottom.
        indices.sort_by(|&a, &b| {
            txs[b]
                .day()
                .cmp(&txs[a].day())
                .then_with(|| txs[b].date.cmp(&txs[a].date))
        });
        self.filtered_indices = indices;

        if self.filtered_indices.is_empty() {
            self.table_state.select(None);
        } else {
            let new_selected = match self.table_state.selected() {
                Some(sel) => min(sel, self.filtered_indices.len().saturating_sub(1)),
                None => 0,
            };
            self.table_state.select(Some(new_selected));
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.filtered_indices.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.filtered_indices.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page(&mut self, direction: i32) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(direction * page);
    }

    /// All categories, then each category in turn.
    fn cycle_category(&mut self) {
        let categories = self.store.categories();
        self.filter.category = match self.filter.category {
            None => categories.first().cloned(),
            Some(ref current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1))
                .cloned(),
        };
        self.recompute();
    }

    /// Without a month selected, stepping starts at the newest month.
    fn shift_month(&mut self, delta: i32) {
        self.filter.month = match self.filter.month {
            Some(ref month) => history::shift_month(month, delta).or_else(|| Some(month.clone())),
            None => history::available_months(self.store.transactions()).into_iter().next(),
        };
        self.recompute();
    }

    fn clear_filters(&mut self) {
        self.filter = HistoryFilter::default();
        self.recompute();
    }

    fn start_input(&mut self, kind: InputKind) {
        let prefill = match kind {
            InputKind::Search => Some(self.filter.search.clone()),
            InputKind::Category => self.selected_transaction().map(|t| t.category.clone()),
            InputKind::Amount => self.selected_transaction().map(|t| t.amount.to_string()),
            InputKind::NewCategory => Some(String::new()),
        };
        let Some(prefill) = prefill else {
            return;
        };
        self.input_buffer = prefill;
        self.mode = Mode::Input(kind);
    }

    fn cancel_input(&mut self) {
        self.mode = Mode::List;
    }

    /// Shows the outcome of a user action. Login failures are handed back
    /// so the caller can leave the screen.
    fn settle<T>(
        &mut self,
        result: AppResult<T>,
        on_ok: impl FnOnce(T) -> Option<Toast>,
        fail_title: &str,
    ) -> AppResult<()> {
        match result {
            Ok(value) => {
                if let Some(toast) = on_ok(value) {
                    self.toast = Some(toast);
                }
                self.recompute();
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

    fn commit_input<A: LifehubApi>(&mut self, api: &A, kind: InputKind) -> AppResult<()> {
        self.mode = Mode::List;
        let raw = self.input_buffer.trim().to_string();

        match kind {
            InputKind::Search => {
                self.filter.search = raw;
                self.recompute();
                Ok(())
            }
            InputKind::Category => {
                let Some(id) = self.selected_transaction().map(|t| t.id.clone()) else {
                    return Ok(());
                };
                let result = self.store.edit_category(api, &id, &raw);
                self.settle(
                    result,
                    |outcome| {
                        (outcome == EditOutcome::Updated).then(|| {
                            let message = format!("Category changed to {}.", raw);
                            Toast::success("Category updated", message)
                        })
                    },
                    "Update failed",
                )
            }
            InputKind::Amount => {
                let Some(id) = self.selected_transaction().map(|t| t.id.clone()) else {
                    return Ok(());
                };
                let result = self.store.edit_amount(api, &id, &raw);
                self.settle(
                    result,
                    |outcome| {
                        (outcome == EditOutcome::Updated).then(|| {
                            Toast::success("Amount updated", format!("Amount changed to {}.", raw))
                        })
                    },
                    "Update failed",
                )
            }
            InputKind::NewCategory => {
                if !raw.is_empty() {
                    self.store.add_category(&raw);
                    self.toast = Some(Toast::success("Category added", raw));
                }
                Ok(())
            }
        }
    }

    /// Drops the category under the filter. Its transactions become
    /// `Uncategorized` for this session only; the server is not told.
    fn delete_filtered_category(&mut self) {
        let Some(category) = self.filter.category.take() else {
            return;
        };
        self.store.delete_category(&category);
        self.toast = Some(Toast::success("Category removed", category));
        self.recompute();
    }

    fn delete_selected<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        self.mode = Mode::List;
        let Some(id) = self.selected_transaction().map(|t| t.id.clone()) else {
            return Ok(());
        };
        let result = self.store.remove_transaction(api, &id);
        self.settle(
            result,
            |_| Some(Toast::success("Transaction deleted", "")),
            "Delete failed",
        )
    }

    fn refresh<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        self.store.reload(api)?;
        self.recompute();
        self.toast = Some(Toast::success(
            "Refreshed",
            format!("{} transactions loaded.", self.store.transactions().len()),
        ));
        Ok(())
    }

    fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }
}

pub fn run_browse<A: LifehubApi>(api: &A, store: DataStore) -> AppResult<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let result = browse_loop(api, BrowseState::new(store));

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn browse_loop<A: LifehubApi>(api: &A, mut state: BrowseState) -> AppResult<()> {
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    loop {
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

            render_header(frame, layout[0], &state);
            render_table(frame, layout[1], &mut state);
            render_footer(frame, layout[2], &state);

            match state.mode {
                Mode::Input(kind) => render_input_modal(frame, size, &state, kind),
                Mode::Details => render_details_modal(frame, size, &state),
                Mode::ConfirmDelete => render_confirm_modal(frame, size, &state),
                Mode::List => {}
            }
        })?;

        if event::poll(std::time::Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(api, &mut state, key)? {
                    return Ok(());
                }
            }
        }
    }
}

fn handle_key<A: LifehubApi>(api: &A, state: &mut BrowseState, key: KeyEvent) -> AppResult<bool> {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return Ok(false);
    }

    match state.mode {
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.page(-1),
            KeyCode::PageDown => state.page(1),
            KeyCode::Home => state.move_selection(i32::MIN / 2),
            KeyCode::End => state.move_selection(i32::MAX / 2),
            KeyCode::Left => state.shift_month(-1),
            KeyCode::Right => state.shift_month(1),
            KeyCode::Enter => {
                if state.selected_transaction().is_some() {
                    state.mode = Mode::Details;
                }
            }
            KeyCode::Char('/') => state.start_input(InputKind::Search),
            KeyCode::Char('c') => state.cycle_category(),
            KeyCode::Char('n') => state.start_input(InputKind::NewCategory),
            KeyCode::Char('D') => state.delete_filtered_category(),
            KeyCode::Char('m') => {
                state.filter.month = None;
                state.recompute();
            }
            KeyCode::Char('e') => state.start_input(InputKind::Category),
            KeyCode::Char('a') => state.start_input(InputKind::Amount),
            KeyCode::Char('d') => {
                if state.selected_transaction().is_some() {
                    state.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('r') => state.refresh(api)?,
            KeyCode::Char('x') => state.clear_filters(),
            _ => {}
        },
        Mode::Details => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => state.mode = Mode::List,
            KeyCode::Char('e') => state.start_input(InputKind::Category),
            KeyCode::Char('a') => state.start_input(InputKind::Amount),
            _ => {}
        },
        Mode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => state.delete_selected(api)?,
            _ => state.mode = Mode::List,
        },
        Mode::Input(kind) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.cancel_input();
                return Ok(false);
            }

            match key.code {
                KeyCode::Esc => state.cancel_input(),
                KeyCode::Enter => state.commit_input(api, kind)?,
                KeyCode::Backspace => {
                    state.input_buffer.pop();
                }
                KeyCode::Char(ch) => state.input_buffer.push(ch),
                _ => {}
            }
        }
    }

    Ok(false)
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let category = state.filter.category.as_deref().unwrap_or("(all)");
    let month = state
        .filter
        .month
        .as_deref()
        .map(history::month_label)
        .unwrap_or_else(|| "(all)".to_string());
    let search = if state.filter.search.is_empty() {
        "(none)"
    } else {
        state.filter.search.as_str()
    };
    let total: rust_decimal::Decimal = state
        .filtered_indices
        .iter()
        .map(|&i| state.store.transactions()[i].amount)
        .sum();

    let line = Line::from(vec![
        Span::styled("LifeHub History", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  "),
        Span::raw(format!("Month: {}", month)),
        Span::raw("  |  "),
        Span::raw(format!("Category: {}", category)),
        Span::raw("  |  "),
        Span::raw(format!("Search: {}", search)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.filtered_indices.len())),
        Span::raw("  |  "),
        Span::raw(format!("Total: {}", total)),
    ]);

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let block = Block::default().borders(Borders::ALL);

    if let Some(ref toast) = state.toast {
        frame.render_widget(
            Paragraph::new(Span::styled(toast.text(), toast.style()))
                .block(block)
                .alignment(Alignment::Left),
            area,
        );
        return;
    }

    let hint = match state.mode {
        Mode::List => "↑/↓ move  ←/→ month  Enter details  / search  c category  n new category  D drop category  m all months  e edit category  a edit amount  d delete  r refresh  x clear  q exit",
        Mode::Details => "e edit category  a edit amount  Esc/q/b back",
        Mode::Input(_) => "Type, Enter apply, Esc cancel",
        Mode::ConfirmDelete => "y confirm, any other key cancels",
    };

    frame.render_widget(
        Paragraph::new(hint)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Transactions").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header = Row::new([
        Cell::from("Date").style(Style::default().bold()),
        Cell::from("Merchant").style(Style::default().bold()),
        Cell::from("Amount").style(Style::default().bold()),
        Cell::from("Category").style(Style::default().bold()),
        Cell::from("Status").style(Style::default().bold()),
        Cell::from("Method").style(Style::default().bold()),
    ])
    .style(Style::default().fg(Color::White));

    let txs = state.store.transactions();
    let rows = state.filtered_indices.iter().map(|&idx| &txs[idx]).map(|tx| {
        let date = tx
            .day()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| tx.date.clone());
        let merchant: String = if tx.merchant.chars().count() > 30 {
            tx.merchant.chars().take(27).chain("...".chars()).collect()
        } else {
            tx.merchant.clone()
        };

        Row::new([
            Cell::from(date),
            Cell::from(merchant),
            Cell::from(tx.amount.to_string()),
            Cell::from(tx.category.clone()),
            Cell::from(tx.status.label()),
            Cell::from(tx.payment_method.clone()),
        ])
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(35),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);
    let empty = state.filtered_indices.is_empty();
    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if empty {
        let text = if state.store.transactions().is_empty() {
            "No transactions yet. Import a card statement to get started."
        } else {
            "No transactions match the current filters"
        };
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    }
}

fn render_input_modal(
    frame: &mut ratatui::Frame,
    area: Rect,
    state: &BrowseState,
    kind: InputKind,
) {
    let popup_area = centered_rect(70, 25, area);
    frame.render_widget(Clear, popup_area);

    let (title, help) = match kind {
        InputKind::Search => ("Search", "Merchant or description (empty clears)"),
        InputKind::Category => ("Edit Category", "New category for the selected transaction"),
        InputKind::Amount => ("Edit Amount", "New amount for the selected transaction"),
        InputKind::NewCategory => ("New Category", "Added to the category list"),
    };

    let lines = vec![
        Line::from(vec![Span::styled(title, Style::default().bold())]),
        Line::from(help),
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("> {}", state.input_buffer),
            Style::default().fg(Color::Yellow),
        )]),
    ];

    let block = Block::default().borders(Borders::ALL).title("Input");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup_area);

    let target = state
        .selected_transaction()
        .map(|t| format!("{} ({})", t.merchant, t.amount))
        .unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled("Delete transaction?", Style::default().fg(Color::Red).bold())),
        Line::from(""),
        Line::from(target),
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

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(80, 60, area);
    frame.render_widget(Clear, popup_area);

    let Some(tx) = state.selected_transaction() else {
        frame.render_widget(
            Paragraph::new("No selection")
                .block(Block::default().borders(Borders::ALL).title("Details"))
                .alignment(Alignment::Center),
            popup_area,
        );
        return;
    };

    let lines = vec![
        Line::from(vec![Span::styled(
            "Transaction Details",
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from(""),
        Line::from(format!("Id: {}", tx.id)),
        Line::from(format!("Date: {}", tx.date)),
        Line::from(format!("Merchant: {}", tx.merchant)),
        Line::from(format!("Amount: {}", tx.amount)),
        Line::from(format!("Category: {}", tx.category)),
        Line::from(format!("Status: {}", tx.status.label())),
        Line::from(format!("Payment method: {}", tx.payment_method)),
        Line::from(""),
        Line::from("Description:"),
        Line::from(tx.description.clone()),
    ];

    let block = Block::default().borders(Borders::ALL).title("Details");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
