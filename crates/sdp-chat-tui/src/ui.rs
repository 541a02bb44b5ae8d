use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use sdp_chat_core::{render_with, ChatRole, InlineSpan, RegisterForm, RenderedBlock, Route, StatusKind};

use crate::app::{AdminField, App, FocusPane, LoginField, RegisterField};

/// Turn rendered message blocks into terminal lines, one line per block
pub fn blocks_to_lines(blocks: &[RenderedBlock]) -> Vec<Line<'static>> {
    blocks
        .iter()
        .map(|block| match block {
            RenderedBlock::Break => Line::default(),
            RenderedBlock::BulletItem(spans) => styled_line(Some("• ".to_string()), spans),
            RenderedBlock::NumberedItem { number, content } => {
                styled_line(Some(format!("{}. ", number)), content)
            }
            RenderedBlock::Paragraph(spans) => styled_line(None, spans),
        })
        .collect()
}

fn styled_line(prefix: Option<String>, spans: &[InlineSpan]) -> Line<'static> {
    let mut out: Vec<Span<'static>> = Vec::with_capacity(spans.len() + 1);
    if let Some(prefix) = prefix {
        out.push(Span::styled(prefix, Style::default().fg(Color::Yellow)));
    }
    for span in spans {
        out.push(match span {
            InlineSpan::PlainText(text) => Span::raw(text.clone()),
            InlineSpan::Bold(text) => Span::styled(
                text.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        });
    }
    Line::from(out)
}

/// Center a fixed-size box inside `area`, shrinking it if the terminal is small
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

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

    match app.screen {
        Route::Login => render_login_screen(app, frame, body_area),
        Route::Register => render_register_screen(app, frame, body_area),
        Route::Chatbot => render_chat_screen(app, frame, body_area),
        Route::Admin => render_admin_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let user_indicator = match &app.auth.user {
        Some(user) => format!(" {} ({})", user.username, user.user_type.display_name()),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" SDP Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(user_indicator, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_text = match app.screen {
        Route::Login => " LOGIN ",
        Route::Register => " REGISTER ",
        Route::Chatbot => " CHAT ",
        Route::Admin => " ADMIN ",
    };
    let mode_style = Style::default().bg(Color::Blue).fg(Color::White);

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<(&str, &str)> = match app.screen {
        Route::Login => vec![
            ("Tab", "next field"),
            ("Enter", "sign in"),
            ("^R", "register"),
            ("Esc", "quit"),
        ],
        Route::Register => vec![
            ("Tab", "next field"),
            ("←/→", "role"),
            ("Enter", "create"),
            ("Esc", "back"),
        ],
        Route::Chatbot if app.focus == FocusPane::Input => vec![
            ("Enter", "send"),
            ("Esc", "sessions"),
            ("^N", "new chat"),
            ("^C", "quit"),
        ],
        Route::Chatbot => {
            let mut hints = vec![
                ("j/k", "move"),
                ("Enter", "open"),
                ("d", "delete"),
                ("n", "new"),
                ("i", "type"),
                ("L", "logout"),
            ];
            if app.auth.is_admin() {
                hints.push(("A", "admin"));
            }
            hints.push(("q", "quit"));
            hints
        }
        Route::Admin => vec![
            ("Tab", "switch"),
            ("Enter", "upload / newline"),
            ("^S", "submit"),
            ("Esc", "chat"),
            ("^L", "logout"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    if let Some(notice) = &app.notice {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Green)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// One bordered single-line input; returns its inner area for cursor placement
fn render_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    focused: bool,
) -> Rect {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));
    let inner = block.inner(area);

    // Keep the tail visible when the value is wider than the box
    let width = inner.width as usize;
    let len = value.chars().count();
    let visible: String = value.chars().skip(len.saturating_sub(width.saturating_sub(1))).collect();

    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)).block(block),
        area,
    );
    inner
}

fn place_cursor(frame: &mut Frame, inner: Rect, value: &str) {
    let len = value.chars().count() as u16;
    let x = len.min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + x, inner.y));
}

fn message_line(error: Option<&str>, notice: Option<&str>, loading: Option<&str>) -> Line<'static> {
    if let Some(text) = loading {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(text) = error {
        Line::from(Span::styled(text.to_string(), Style::default().fg(Color::Red)))
    } else if let Some(text) = notice {
        Line::from(Span::styled(text.to_string(), Style::default().fg(Color::Green)))
    } else {
        Line::default()
    }
}

fn render_login_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 12, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Sign in ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [username_area, password_area, message_area, link_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(inner);

    let masked = "*".repeat(app.login_form.password.chars().count());
    let username_inner = render_field(
        frame,
        username_area,
        "Username",
        &app.login_form.username,
        app.login_field == LoginField::Username,
    );
    let password_inner = render_field(
        frame,
        password_area,
        "Password",
        &masked,
        app.login_field == LoginField::Password,
    );

    let loading = app.login_loading.then_some("Signing in...");
    let message = message_line(app.login_error.as_deref(), app.notice.as_deref(), loading);
    frame.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), message_area);

    let link = Paragraph::new("Don't have an account? Press Ctrl+R to register")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(link, link_area);

    match app.login_field {
        LoginField::Username => place_cursor(frame, username_inner, &app.login_form.username),
        LoginField::Password => place_cursor(frame, password_inner, &masked),
    }
}

fn render_register_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 18, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Create account ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [username_area, email_area, password_area, type_area, message_area] =
        Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);

    let form = &app.register_form;
    let masked = "*".repeat(form.password.chars().count());
    let username_inner = render_field(
        frame,
        username_area,
        "Username",
        &form.username,
        app.register_field == RegisterField::Username,
    );
    let email_inner = render_field(
        frame,
        email_area,
        "Email",
        &form.email,
        app.register_field == RegisterField::Email,
    );
    let password_inner = render_field(
        frame,
        password_area,
        "Password",
        &masked,
        app.register_field == RegisterField::Password,
    );

    // Role picker: radio-style choice between the selectable user types
    let type_focused = app.register_field == RegisterField::UserType;
    let type_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if type_focused { Color::Yellow } else { Color::DarkGray }))
        .title(" I am a ");
    let mut choices: Vec<Span> = Vec::new();
    for user_type in RegisterForm::USER_TYPES {
        let selected = form.user_type == user_type;
        let marker = if selected { "(•) " } else { "( ) " };
        let style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        choices.push(Span::styled(format!("{}{}", marker, user_type.display_name()), style));
        choices.push(Span::raw("   "));
    }
    frame.render_widget(Paragraph::new(Line::from(choices)).block(type_block), type_area);

    let loading = app.register_loading.then_some("Creating account...");
    let message = message_line(app.register_error.as_deref(), None, loading);
    frame.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), message_area);

    match app.register_field {
        RegisterField::Username => place_cursor(frame, username_inner, &form.username),
        RegisterField::Email => place_cursor(frame, email_inner, &form.email),
        RegisterField::Password => place_cursor(frame, password_inner, &masked),
        RegisterField::UserType => {}
    }
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    // Sidebar with chat history on the left, conversation on the right
    let [sessions_area, main_area] = Layout::horizontal([
        Constraint::Length(32),
        Constraint::Min(0),
    ])
    .areas(area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(main_area);

    // Store areas for mouse hit-testing
    app.sessions_area = Some(sessions_area);
    app.chat_area = Some(chat_area);

    render_sessions(app, frame, sessions_area);
    render_transcript(app, frame, chat_area);
    render_chat_input(app, frame, input_area);
}

fn render_sessions(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Sessions;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat History ");

    if app.conversation.sessions.is_empty() {
        let placeholder = Paragraph::new("No chat sessions yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .conversation
        .sessions
        .iter()
        .map(|session| {
            let current = app.conversation.is_current(&session.id);
            let title_style = if current {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let count = session.message_count();
            let noun = if count == 1 { "message" } else { "messages" };
            ListItem::new(vec![
                Line::from(Span::styled(session.preview(), title_style)),
                Line::from(Span::styled(
                    format!("{} · {} {}", session.created_label(), count, noun),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.session_state);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let title = match &app.conversation.session_id {
        Some(_) => " Conversation ",
        None => " New Chat ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let text = if app.conversation.transcript_is_empty() && !app.conversation.loading {
        Text::from(Span::styled(
            "Start a conversation with the chatbot",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.conversation.messages {
            let (label, color) = match msg.sender {
                ChatRole::User => ("You:", Color::Cyan),
                ChatRole::Assistant => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            lines.extend(blocks_to_lines(&render_with(&msg.text, app.markdown)));
            lines.push(Line::default());
        }

        if app.conversation.loading {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input;
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    let title = if app.conversation.loading {
        " Waiting for answer... "
    } else {
        " Type your message... "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .conversation
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_admin_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [file_area, file_info_area, urls_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(5),
        Constraint::Length(2),
    ])
    .areas(area);

    let path_focused = app.admin_field == AdminField::FilePath;
    let path_inner = render_field(
        frame,
        file_area,
        "Upload document (path to a PDF or TXT file)",
        &app.admin_path_input,
        path_focused,
    );

    let file_info = if app.admin.file_loading {
        Line::from(Span::styled(
            "Uploading...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(file) = &app.admin.file {
        Line::from(vec![
            Span::raw(" Selected: "),
            Span::styled(file.file_name.clone(), Style::default().bold()),
            Span::styled(format!(" ({})", file.mime), Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(file_info), file_info_area);

    let urls_focused = app.admin_field == AdminField::Urls;
    let urls_title = if app.admin.url_loading {
        " Processing URLs... "
    } else {
        " Add URLs (one per line, Ctrl+S to submit) "
    };
    let urls_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if urls_focused { Color::Yellow } else { Color::DarkGray }))
        .title(urls_title);
    let urls_inner = urls_block.inner(urls_area);
    let urls = Paragraph::new(app.admin.urls.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(urls_block);
    frame.render_widget(urls, urls_area);

    if let Some(status) = &app.admin.status {
        let color = match status.kind {
            StatusKind::Success => Color::Green,
            StatusKind::Error => Color::Red,
        };
        let line = Line::from(Span::styled(status.text.clone(), Style::default().fg(color)));
        frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), status_area);
    }

    if path_focused {
        place_cursor(frame, path_inner, &app.admin_path_input);
    } else {
        // Cursor at the end of the last URL line
        let last_line = app.admin.urls.split('\n').last().unwrap_or("");
        let row = app.admin.urls.matches('\n').count() as u16;
        let x = (last_line.chars().count() as u16).min(urls_inner.width.saturating_sub(1));
        let y = row.min(urls_inner.height.saturating_sub(1));
        frame.set_cursor_position((urls_inner.x + x, urls_inner.y + y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_chat_core::{render, MarkdownSubset};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_blocks_to_lines_keeps_one_line_per_block() {
        let blocks = render("Intro\n\n- **Key** point\n2. Second");
        let lines = blocks_to_lines(&blocks);
        assert_eq!(lines.len(), blocks.len());
        assert_eq!(line_text(&lines[0]), "Intro");
        assert_eq!(line_text(&lines[1]), "");
        assert_eq!(line_text(&lines[2]), "• Key point");
        assert_eq!(line_text(&lines[3]), "2. Second");
    }

    #[test]
    fn test_bold_spans_are_styled() {
        let lines = blocks_to_lines(&render("a **b** c"));
        let bold: Vec<&str> = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["b"]);
    }

    #[test]
    fn test_plain_subset_shows_markers_verbatim() {
        let lines = blocks_to_lines(&render_with("- **x**", MarkdownSubset::None));
        assert_eq!(line_text(&lines[0]), "- **x**");
    }

    #[test]
    fn test_centered_rect_fits_small_area() {
        let area = Rect::new(0, 0, 30, 8);
        let rect = centered_rect(50, 12, area);
        assert_eq!(rect, Rect::new(0, 0, 30, 8));
        let rect = centered_rect(10, 4, area);
        assert_eq!(rect, Rect::new(10, 2, 10, 4));
    }
}
