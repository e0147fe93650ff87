//! Monthly analysis screen: category share chart, category table and the
//! AI report stored for the month.

use crate::api::LifehubApi;
use crate::error::AppResult;
use crate::models::analysis::{AnalysisReport, Priority, TrendKind};
use crate::models::transaction::Transaction;
use crate::operations::analysis::{self, MonthlyBreakdown};
use crate::operations::history;
use crate::operations::toast::Toast;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::io;

const PALETTE: [Color; 11] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightMagenta,
    Color::LightYellow,
    Color::LightGreen,
    Color::LightBlue,
];

struct ReportView<'a> {
    transactions: &'a [Transaction],
    history: Vec<AnalysisReport>,
    month: String,
    breakdown: MonthlyBreakdown,
    category_colors: HashMap<String, Color>,
    toast: Option<Toast>,
}

impl<'a> ReportView<'a> {
    fn new(transactions: &'a [Transaction], history: Vec<AnalysisReport>, month: String) -> Self {
        let mut categories: Vec<String> = transactions.iter().map(|t| t.category.clone()).collect();
        categories.sort();
        categories.dedup();

        let breakdown = analysis::monthly_breakdown(transactions, &month);
        Self {
            transactions,
            history,
            month,
            breakdown,
            category_colors: assign_colors(&categories),
            toast: None,
        }
    }

    fn shift_month(&mut self, delta: i32) {
        if let Some(month) = history::shift_month(&self.month, delta) {
            self.breakdown = analysis::monthly_breakdown(self.transactions, &month);
            self.month = month;
        }
    }

    fn reanalyze<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        match analysis::reanalyze(api, &mut self.history, self.transactions, &self.month) {
            Ok(_) => {
                let month = history::month_label(&self.month);
                self.toast = Some(Toast::success("Analysis updated", month));
                Ok(())
            }
            Err(e) if e.needs_login() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, month = %self.month, "Analysis failed");
                self.toast = Some(Toast::from_error("Analysis failed", &e));
                Ok(())
            }
        }
    }

    fn color_of(&self, category: &str) -> Color {
        self.category_colors.get(category).copied().unwrap_or(Color::White)
    }
}

fn assign_colors(categories: &[String]) -> HashMap<String, Color> {
    categories
        .iter()
        .enumerate()
        .map(|(idx, category)| (category.clone(), PALETTE[idx % PALETTE.len()]))
        .collect()
}

pub fn run_report<A: LifehubApi>(
    api: &A,
    transactions: &[Transaction],
    history: Vec<AnalysisReport>,
    month: String,
) -> AppResult<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let result = report_loop(api, ReportView::new(transactions, history, month));

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn report_loop<A: LifehubApi>(api: &A, mut view: ReportView<'_>) -> AppResult<()> {
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    loop {
        if view.toast.as_ref().is_some_and(Toast::is_expired) {
            view.toast = None;
        }

        terminal.draw(|frame| {
            let size = frame.area();
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Percentage(45),
                    Constraint::Min(6),
                ])
                .split(size);

            render_title(frame, layout[0], &view);

            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(layout[1]);
            render_pie_chart(frame, top[0], &view);
            render_category_table(frame, top[1], &view);
            render_insights(frame, layout[2], &view);
        })?;

        if event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Release => {}
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Left => view.shift_month(-1),
                    KeyCode::Right => view.shift_month(1),
                    KeyCode::Char('r') => view.reanalyze(api)?,
                    _ => {}
                },
                _ => {}
            }
        }
    }
}

fn render_title(frame: &mut ratatui::Frame, area: Rect, view: &ReportView) {
    let mut spans = vec![
        Span::styled(
            history::month_label(&view.month),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw(format!(
            "  {} transactions  total {}",
            view.breakdown.transactions, view.breakdown.total
        )),
    ];
    match view.toast {
        Some(ref toast) => {
            spans.push(Span::raw("  |  "));
            spans.push(Span::styled(toast.text(), toast.style()));
        }
        None => spans.push(Span::styled(
            "  ←/→ month  r re-analyze  q exit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_pie_chart(frame: &mut ratatui::Frame, area: Rect, view: &ReportView) {
    let block = Block::default().title("Category Share").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.breakdown.total <= rust_decimal::Decimal::ZERO {
        frame.render_widget(
            Paragraph::new("There are no transactions recorded for this month.")
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let total = view.breakdown.total.to_f64().unwrap_or(1.0).max(1.0);
    let mut slices = Vec::new();
    let mut start_angle = 0.0_f64;
    for share in &view.breakdown.categories {
        let sweep = share.amount.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
        slices.push((start_angle, start_angle + sweep, view.color_of(&share.category)));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, color) in &slices {
                let mut points = Vec::new();
                let mut r = 0.0;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points { coords: &points, color: *color });
                }
            }
        });
    frame.render_widget(canvas, inner);
}

fn render_category_table(frame: &mut ratatui::Frame, area: Rect, view: &ReportView) {
    let block = Block::default().title("Category Spend").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.breakdown.categories.is_empty() {
        return;
    }

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:15}", "Category"), Style::default().bold()),
        Span::raw("  "),
        Span::styled(format!("{:>12}", "Amount"), Style::default().bold()),
        Span::raw("  "),
        Span::styled("Share", Style::default().bold()),
    ])];
    for share in &view.breakdown.categories {
        let style = Style::default().fg(view.color_of(&share.category));
        lines.push(Line::from(vec![
            Span::styled(format!("{:15}", share.category), style),
            Span::raw("  "),
            Span::styled(format!("{:>12}", share.amount), style),
            Span::raw("  "),
            Span::styled(format!("{:>4}%", share.percentage), style),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_insights(frame: &mut ratatui::Frame, area: Rect, view: &ReportView) {
    let block = Block::default().title("AI Insights").borders(Borders::ALL);

    let Some(report) = analysis::report_for(&view.history, &view.month) else {
        frame.render_widget(
            Paragraph::new("No analysis for this month yet. Press r to analyze.")
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
        return;
    };

    let mut lines = vec![Line::from(report.summary.clone()), Line::from("")];
    if let Some(ref health) = report.budget_health {
        lines.push(Line::from(vec![
            Span::styled("Budget health ", Style::default().bold()),
            Span::raw(format!("{}/100 ({}) {}", health.score, health.status, health.description)),
        ]));
    }
    for trend in &report.trends {
        let (marker, color) = match trend.kind {
            TrendKind::Increase => ("▲", Color::Red),
            TrendKind::Decrease => ("▼", Color::Green),
            TrendKind::Stable => ("■", Color::Gray),
            TrendKind::Unknown => ("•", Color::Gray),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {} {} ", marker, trend.category, trend.change),
                Style::default().fg(color),
            ),
            Span::raw(trend.description.clone()),
        ]));
    }
    for rec in &report.recommendations {
        let color = match rec.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Green,
            Priority::Unknown => Color::White,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("• {} ", rec.title), Style::default().fg(color).bold()),
            Span::raw(rec.description.clone()),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
