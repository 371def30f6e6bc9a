//! Rendering: header, two-table content area, footer, and modal overlays
//! (spec.md §4.4.3). Grounded on the prior generation's render layout split
//! (header / summary / content, with popups drawn last).

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as UiRow, Table as UiTable};
use ratatui::Frame;

use crate::derive::{Category, Recommendation, Severity};
use crate::history::Field;
use crate::model::HealthStatus;

use super::controller::{ActiveTable, ConnectionState, Dashboard, Overlay};
use super::style::Styles;
use super::table::{compute_column_widths, truncate_name, Row, Table};

pub fn render(frame: &mut Frame, dash: &mut Dashboard) {
    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(2),
    ])
    .split(area);

    render_header(frame, chunks[0], dash);
    render_content(frame, chunks[1], dash);
    render_footer(frame, chunks[2], dash);

    match dash.overlay {
        Overlay::Analytics => render_analytics(frame, area, dash),
        Overlay::DeleteConfirm => render_delete_confirm(frame, area, dash),
        Overlay::Settings => render_settings_form(frame, area, dash),
        Overlay::None => {}
    }

    if dash.help_visible {
        render_help(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let block = Block::default().borders(Borders::ALL).title("esdash");

    let text = match (&dash.current, dash.connection) {
        (Some(snap), ConnectionState::Connected) => {
            let h = &snap.health;
            Line::from(vec![
                Span::styled(crate::sanitize::sanitize(&h.cluster_name), Styles::table_header()),
                Span::raw("  "),
                Span::styled(format!("{:?}", h.status), Styles::health(h.status)),
                Span::raw(format!(
                    "  nodes={} shards={} unassigned={} pending={}",
                    h.node_count, h.active_shards, h.unassigned_shards, h.pending_tasks
                )),
            ])
        }
        (_, ConnectionState::Disconnected) => {
            let mut spans = vec![Span::styled("disconnected", Styles::critical())];
            if let Some(err) = &dash.last_error {
                spans.push(Span::raw(format!("  {err}")));
            }
            if let Some(at) = dash.next_retry_at {
                let remaining = (at - chrono::Utc::now()).num_seconds().max(0);
                spans.push(Span::raw(format!("  retry in {remaining}s")));
            }
            Line::from(spans)
        }
        _ => Line::from("connecting..."),
    };

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_content(frame: &mut Frame, area: Rect, dash: &mut Dashboard) {
    let chunks = Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).split(area);

    render_table(
        frame,
        chunks[0],
        "Indices",
        &dash.index_table,
        dash.active_table == ActiveTable::Index,
    );
    render_table(
        frame,
        chunks[1],
        "Nodes",
        &dash.node_table,
        dash.active_table == ActiveTable::Node,
    );
}

fn render_table<T: Row>(frame: &mut Frame, area: Rect, title: &str, table: &Table<T>, focused: bool) {
    let border_style = if focused { Styles::tab_active() } else { Styles::tab_inactive() };
    let block = Block::default().borders(Borders::ALL).title(format!("{title} ({}/{})", table.page + 1, table.total_pages())).border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let widths = compute_column_widths(&table.columns, inner.width);
    let header = UiRow::new(table.columns.iter().map(|c| Cell::from(c.title))).style(Styles::table_header());

    let rows: Vec<UiRow> = table
        .page_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let cells: Vec<Cell> = table
                .columns
                .iter()
                .enumerate()
                .map(|(col, _)| {
                    let text = row.cell(col);
                    let text = if col == 0 {
                        truncate_name(&text, widths.first().copied().unwrap_or(20) as usize)
                    } else {
                        text
                    };
                    Cell::from(text)
                })
                .collect();
            let style = if i == table.cursor { Styles::selected() } else { Styles::default() };
            UiRow::new(cells).style(style)
        })
        .collect();

    let constraints: Vec<Constraint> = widths.iter().map(|&w| Constraint::Length(w)).collect();
    let ui_table = UiTable::new(rows, constraints).header(header);
    frame.render_widget(ui_table, inner);
}

fn render_footer(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let mut spans = vec![Span::styled(
        "q quit | tab switch | / search | 1-9 sort | a analytics | e settings | d delete | ? help",
        Styles::help(),
    )];

    if let Some(status) = &dash.delete_status {
        spans.push(Span::raw("  "));
        spans.push(Span::raw(status.clone()));
    }
    if let Some(status) = &dash.settings_status {
        spans.push(Span::raw("  "));
        spans.push(Span::raw(status.clone()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_analytics(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let popup = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup);
    let block = Block::default().borders(Borders::ALL).title("Analytics (esc to close)");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let Some(derived) = &dash.derived else {
        return;
    };

    let rows = Layout::vertical([Constraint::Length(6), Constraint::Length(6), Constraint::Min(1)]).split(inner);

    let indexing = dash.history_values(Field::IndexingRate);
    let search = dash.history_values(Field::SearchRate);
    render_sparkline_block(frame, rows[0], "Indexing rate/s", &indexing);
    render_sparkline_block(frame, rows[1], "Search rate/s", &search);

    let recs: Vec<Line> = derived
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| render_recommendation_line(r, i == dash.analytics_cursor))
        .collect();
    frame.render_widget(Paragraph::new(recs).block(Block::default().title("Recommendations").borders(Borders::TOP)), rows[2]);
}

fn render_sparkline_block(frame: &mut Frame, area: Rect, title: &str, values: &[f64]) {
    let data: Vec<u64> = values.iter().map(|v| if *v < 0.0 { 0 } else { *v as u64 }).collect();
    let sparkline = ratatui::widgets::Sparkline::default()
        .block(Block::default().borders(Borders::BOTTOM).title(title))
        .data(&data);
    frame.render_widget(sparkline, area);
}

fn render_recommendation_line(rec: &Recommendation, selected: bool) -> Line<'static> {
    let style = match rec.severity {
        Severity::Critical => Styles::critical(),
        Severity::Warning => Styles::warning(),
    };
    let prefix = if selected { "> " } else { "  " };
    let cat = match rec.category {
        Category::Resource => "resource",
        Category::Shard => "shard",
        Category::IndexConfig => "index",
        Category::Hotspot => "hotspot",
    };
    Line::from(Span::styled(
        format!("{prefix}[{cat}] {}: {}", crate::sanitize::sanitize(&rec.title), crate::sanitize::sanitize(&rec.detail)),
        style,
    ))
}

fn render_delete_confirm(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let popup = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup);
    let block = Block::default().borders(Borders::ALL).title("Confirm delete");
    let text = format!("Delete {}? (y/n)", dash.delete_target.join(", "));
    frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn render_settings_form(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);
    let Some(form) = &dash.settings_form else {
        return;
    };
    let block = Block::default().borders(Borders::ALL).title(format!("Settings: {}", form.index_name));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    if form.state == super::settings::FormState::Loading {
        frame.render_widget(Paragraph::new("loading..."), inner);
        return;
    }

    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let style = if i == form.focused { Styles::selected() } else { Styles::default() };
            Line::from(Span::styled(format!("{}: {}", f.label, f.input), style))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);
    let block = Block::default().borders(Borders::ALL).title("Help (? to close)");
    let text = "\
q / ctrl+c   quit
tab          switch focused table
/            search in focused table
1-9          sort by column
space        toggle selection (indices)
a            analytics overlay
e            edit index settings
d            delete index
r            force refresh";
    frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn centered_rect(pct_x: u16, pct_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - pct_y) / 2),
        Constraint::Percentage(pct_y),
        Constraint::Percentage((100 - pct_y) / 2),
    ])
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - pct_x) / 2),
        Constraint::Percentage(pct_x),
        Constraint::Percentage((100 - pct_x) / 2),
    ])
    .split(vertical[1])[1]
}
