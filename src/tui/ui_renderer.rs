use super::app_logic::TuiApp;
use super::app_state::{AppMode, FormField};
use crate::notify::Level;
use crate::presets::{self, SelectorEntry};
use crate::preview::PreviewBody;
use crate::selection::SelectionSummary;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

fn draw_help_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let save_hint = if app.session.presets.save_trigger_visible() {
        " | s: Save as preset"
    } else {
        ""
    };
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav | Space: Sel | Enter/Tab/o: Fold/Preview | p: Preview | c: Clear | q/Esc: Quit"),
        Line::from(format!(
            "*: Expand All | -: Collapse All | r: Refresh | x: Selected | l: Presets{} | g: Generate | y: Copy | e: Export",
            save_hint
        )),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Promptpick"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_tree_block(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    let title = if app.session.tree.is_loading() {
        "Files (loading...)"
    } else {
        "Files"
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(message) = app.session.tree.message() {
        let paragraph = Paragraph::new(message.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    app.ensure_cursor_is_visible_in_viewport();

    let rows = app.rows();
    let end = (app.scroll_offset + app.list_viewport_height).min(rows.len());
    let list_items: Vec<ListItem> = rows
        .get(app.scroll_offset..end)
        .unwrap_or(&[])
        .iter()
        .map(|row| ListItem::new(row.label.clone()))
        .collect();

    let base_style = if app.session.tree.is_dimmed() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let list_widget = List::new(list_items)
        .block(block)
        .style(base_style)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state = ListState::default();
    if app.mode == AppMode::Normal && app.cursor >= app.scroll_offset && app.cursor < end {
        list_state.select(Some(app.cursor - app.scroll_offset));
    }
    f.render_stateful_widget(list_widget, area, &mut list_state);
}

fn draw_summary_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let summary = app.session.selection.summary();
    let focused = app.mode == AppMode::Summary;
    let title = if focused {
        format!("{} (d: Remove, Esc: Back)", summary.heading())
    } else {
        summary.heading()
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let items = match summary {
        SelectionSummary::Empty { placeholder } => {
            let paragraph = Paragraph::new(Line::styled(
                *placeholder,
                Style::default().fg(Color::DarkGray),
            ))
            .wrap(Wrap { trim: false })
            .block(block);
            f.render_widget(paragraph, area);
            return;
        }
        SelectionSummary::Listed(items) => items,
    };

    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| ListItem::new(format!("{}  ({})  [x]", item.name, item.path)))
        .collect();
    let list = List::new(list_items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("❯ ");
    let mut state = ListState::default();
    if focused {
        state.select(Some(app.summary_cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_presets_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let selector = app.session.presets.selector();
    let items: Vec<ListItem> = selector
        .entries()
        .iter()
        .map(|entry| {
            let marker = if entry == selector.active() { "● " } else { "  " };
            let delete = match entry {
                SelectorEntry::Preset { .. } => "  [d]",
                SelectorEntry::None => "",
            };
            ListItem::new(format!("{}{}{}", marker, entry.label(), delete))
        })
        .collect();

    let title = if app.mode == AppMode::Presets {
        "Presets (Enter: Apply, d: Delete, Esc: Back)"
    } else {
        "Presets"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("❯ ");
    let mut state = ListState::default();
    if matches!(app.mode, AppMode::Presets | AppMode::ConfirmDelete { .. }) {
        state.select(Some(app.preset_cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_prompt_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let text = match &app.session.prompt {
        Some(prompt) => format!(
            "{} chars (≈ {} tokens)",
            prompt.char_count, prompt.token_estimate
        ),
        None => "Not generated yet".to_string(),
    };
    let paragraph =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Prompt"));
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, app: &TuiApp, area: Rect) {
    let Some(notice) = app.session.toasts.latest() else {
        return;
    };
    let color = match notice.level {
        Level::Success => Color::Green,
        Level::Info => Color::Cyan,
        Level::Warning => Color::Yellow,
        Level::Error => Color::Red,
    };
    f.render_widget(
        Paragraph::new(notice.message.clone()).style(Style::default().fg(color)),
        area,
    );
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_popup(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(paragraph, area);
}

fn draw_preview(f: &mut Frame, app: &TuiApp) {
    let Some(panel) = app.session.preview.current() else {
        return;
    };
    let lines: Vec<Line> = match &panel.body {
        PreviewBody::Loading => vec![Line::from("Loading...")],
        PreviewBody::Content(content) => content.lines().map(Line::from).collect(),
        PreviewBody::Error(msg) => {
            vec![Line::styled(msg.clone(), Style::default().fg(Color::Red))]
        }
    };
    let title = format!("{} (Esc to close)", panel.path);
    draw_popup(f, centered(f.area(), 80, 80), &title, lines);
}

fn draw_save_dialog(f: &mut Frame, app: &TuiApp) {
    let dialog = app.session.presets.dialog();
    let mut lines = vec![
        Line::from(format!("Name: {}", dialog.name)),
        Line::from(""),
        Line::from(format!("Files ({}):", dialog.files_summary.len())),
    ];
    lines.extend(dialog.files_summary.iter().map(|name| Line::from(format!("  {}", name))));
    if let Some(error) = &dialog.error {
        lines.push(Line::from(""));
        lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    }
    let title = if app.session.presets.is_saving() {
        "Save preset (saving...)"
    } else {
        "Save preset (Enter: Save, Esc: Cancel)"
    };
    draw_popup(f, centered(f.area(), 60, 50), title, lines);
}

fn draw_confirm(f: &mut Frame, name: &str) {
    let lines = vec![
        Line::from(presets::delete_prompt(name)),
        Line::from(""),
        Line::from("y: Delete | n/Esc: Keep"),
    ];
    draw_popup(f, centered(f.area(), 50, 20), "Delete preset", lines);
}

fn draw_prompt_form(f: &mut Frame, app: &TuiApp) {
    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::styled(format!("{}: {}", label, value), style)
    };
    let lines = vec![
        field(
            "Description",
            &app.form.description,
            app.form.focus == FormField::Description,
        ),
        field(
            "Instructions",
            &app.form.instructions,
            app.form.focus == FormField::Instructions,
        ),
        Line::from(""),
        Line::from(format!(
            "{} context files | Tab: Switch field | Enter: Generate | Esc: Cancel",
            app.session.selection.summary().count()
        )),
    ];
    draw_popup(f, centered(f.area(), 70, 30), "Generate prompt", lines);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp) {
    let help_lines = 2;
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(help_lines + 2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_help_block(frame, app, main_chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[1]);
    draw_tree_block(frame, app, body[0]);

    let preset_rows = app.session.presets.selector().entries().len() as u16 + 2;
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(preset_rows.min(12)),
            Constraint::Length(3),
        ])
        .split(body[1]);
    draw_summary_block(frame, app, side[0]);
    draw_presets_block(frame, app, side[1]);
    draw_prompt_block(frame, app, side[2]);

    draw_status_line(frame, app, main_chunks[2]);

    draw_preview(frame, app);
    match &app.mode {
        AppMode::SaveDialog => draw_save_dialog(frame, app),
        AppMode::ConfirmDelete { name } => draw_confirm(frame, name),
        AppMode::PromptForm => draw_prompt_form(frame, app),
        AppMode::Normal | AppMode::Presets | AppMode::Summary => {}
    }
}
