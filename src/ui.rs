use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use std::time::Instant;
use crate::app::{App, CustomField, InputMode};
use crate::question::QuizMode;
use crate::range::RangePreset;
use crate::session::Phase;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.input_mode == InputMode::Editing {
        render_custom_range_input(app, frame, area);
    } else if app.show_mode_picker {
        render_mode_picker(app, frame, area);
    } else if app.show_range_picker {
        render_range_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" بطاقات حفظ القرآن ", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(
            format!("النتيجة: {}", app.session.score()),
            Style::default().fg(Color::Yellow).bold(),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    let [settings_area, card_area, gauge_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_settings(app, frame, settings_area);
    render_card(app, frame, card_area);
    render_timer(app, frame, gauge_area);

    let status = Paragraph::new(app.session.status().to_string())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    frame.render_widget(status, status_area);
}

fn timer_label(secs: u64) -> String {
    if secs == 0 {
        "بدون مؤقت".to_string()
    } else {
        format!("{} ثانية", secs)
    }
}

fn range_label(app: &App) -> String {
    if app.range_preset == RangePreset::Custom {
        format!("{} ({}-{})", app.range_preset.display_name(), app.custom_min, app.custom_max)
    } else {
        app.range_preset.display_name().to_string()
    }
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled("النوع: ", dim),
        Span::styled(app.mode.label(), Style::default().fg(Color::Cyan)),
        Span::styled("  |  النطاق: ", dim),
        Span::styled(range_label(app), Style::default().fg(Color::Cyan)),
        Span::styled("  |  المؤقت: ", dim),
        Span::styled(timer_label(app.timer_secs), Style::default().fg(Color::Cyan)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" الإعدادات ");

    frame.render_widget(
        Paragraph::new(line).alignment(Alignment::Center).block(block),
        area,
    );
}

fn render_card(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.card_area = Some(area);

    let showing_answer = app.session.showing_answer();
    let (face, border_color) = match (app.session.phase(), showing_answer) {
        (Phase::Loading, _) => (" ... ", Color::DarkGray),
        (_, true) => (" الجواب ", Color::Green),
        (Phase::Ready, _) | (Phase::Flipped, _) | (Phase::Answered, _) => (" السؤال ", Color::Cyan),
        (Phase::Idle, _) => (" — ", Color::DarkGray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(face)
        .title_alignment(Alignment::Center);

    let help = Line::from(Span::styled(
        app.mode.help_text(),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));

    let body: Vec<Line> = if app.session.phase() == Phase::Loading {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        vec![Line::from(Span::styled(
            format!("جاري التحميل{}", dots),
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some(card) = app.session.card() {
        let text = if showing_answer { &card.answer } else { &card.question };
        let mut lines = vec![Line::from(Span::styled(
            text.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))];
        if showing_answer {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("صفحة {}", card.source_page),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines
    } else if let Some(failure) = app.session.failure() {
        vec![Line::from(Span::styled(failure, Style::default().fg(Color::Red)))]
    } else {
        vec![Line::from(Span::styled("—", Style::default().fg(Color::DarkGray)))]
    };

    let mut lines = vec![help, Line::default()];
    lines.extend(body);

    let paragraph = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_timer(app: &App, frame: &mut Frame, area: Rect) {
    let label = match app.timer.remaining(Instant::now()) {
        Some(left) => format!("{}s", left.as_secs()),
        None => String::new(),
    };
    let ratio = (app.timer.progress() / 100.0).clamp(0.0, 1.0);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Yellow).bg(Color::Black))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.session.phase() {
        Phase::Idle => " IDLE ",
        Phase::Loading => " LOADING ",
        Phase::Ready => " READY ",
        Phase::Flipped => " FLIPPED ",
        Phase::Answered => " ANSWERED ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" apply ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else if app.show_mode_picker || app.show_range_picker {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ]
    } else {
        let mut hints = Vec::new();
        if app.session.can_generate() {
            hints.extend(vec![
                Span::styled(" n ", key_style),
                Span::styled(" new ", label_style),
            ]);
        }
        if app.session.card().is_some() {
            hints.extend(vec![
                Span::styled(" Space ", key_style),
                Span::styled(" flip ", label_style),
            ]);
        }
        if app.session.can_mark() {
            hints.extend(vec![
                Span::styled(" y ", key_style),
                Span::styled(" right ", label_style),
                Span::styled(" w ", key_style),
                Span::styled(" wrong ", label_style),
            ]);
        }
        hints.extend(vec![
            Span::styled(" m ", key_style),
            Span::styled(" mode ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" range ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" custom ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(" timer ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
        hints
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Centered popup rect, clamped to the frame
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn picker_highlight() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn render_mode_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let modes = QuizMode::all();
    let popup_area = popup_area(area, 50, modes.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" نوع السؤال ");

    let items: Vec<ListItem> = modes
        .iter()
        .map(|mode| {
            let is_current = *mode == app.mode;
            let prefix = if is_current { "* " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", prefix, mode.label())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(picker_highlight())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.mode_picker_state);
}

fn render_range_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let presets = RangePreset::all();
    let popup_area = popup_area(area, 45, presets.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" النطاق ");

    let items: Vec<ListItem> = presets
        .iter()
        .map(|preset| {
            let is_current = *preset == app.range_preset;
            let prefix = if is_current { "* " } else { "  " };
            let bounds = preset
                .bounds()
                .map(|r| format!(" ({}-{})", r.min, r.max))
                .unwrap_or_default();
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}{}", prefix, preset.display_name(), bounds)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(picker_highlight())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.range_picker_state);
}

fn render_custom_range_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_area(area, 40, 6);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" نطاق مخصص (1-604) ");

    let field = |label: &str, value: &str, active: bool| {
        let value_style = if active {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::styled(format!(" {}: ", label), Style::default().fg(Color::DarkGray)),
            Span::styled(format!(" {:<6}", value), value_style),
        ])
    };

    let lines = vec![
        field("من صفحة", &app.custom_min_input, app.custom_field == CustomField::Min),
        Line::default(),
        field("إلى صفحة", &app.custom_max_input, app.custom_field == CustomField::Max),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
