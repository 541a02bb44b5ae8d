use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use sdp_chat_core::Route;
use tracing::{debug, warn};

use crate::app::{AdminField, ApiEvent, App, FocusPane, LoginField, RegisterField};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Api { generation, event } => {
            if generation == app.auth_generation {
                handle_api(app, event);
            } else {
                debug!(generation, "dropped result from a previous sign-in");
            }
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on any screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen {
        Route::Login => handle_login(app, key),
        Route::Register => handle_register(app, key),
        Route::Chatbot => handle_chat(app, key),
        Route::Admin => handle_admin(app, key),
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.login_error = None;
            app.navigate(Route::Register);
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
            app.login_field = match app.login_field {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }
        KeyCode::Enter => app.submit_login(),
        KeyCode::Backspace if !app.login_loading => {
            login_input(app).pop();
        }
        KeyCode::Char(c) if !app.login_loading => login_input(app).push(c),
        _ => {}
    }
}

fn login_input(app: &mut App) -> &mut String {
    match app.login_field {
        LoginField::Username => &mut app.login_form.username,
        LoginField::Password => &mut app.login_form.password,
    }
}

fn handle_register(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.register_error = None;
            app.navigate(Route::Login);
        }
        KeyCode::Tab | KeyCode::Down => app.register_field = app.register_field.next(),
        KeyCode::BackTab | KeyCode::Up => app.register_field = app.register_field.prev(),
        KeyCode::Enter => app.submit_register(),
        _ if app.register_loading => {}
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            if app.register_field == RegisterField::UserType =>
        {
            app.register_form.toggle_user_type();
        }
        KeyCode::Backspace => {
            if let Some(input) = register_input(app) {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = register_input(app) {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn register_input(app: &mut App) -> Option<&mut String> {
    match app.register_field {
        RegisterField::Username => Some(&mut app.register_form.username),
        RegisterField::Email => Some(&mut app.register_form.email),
        RegisterField::Password => Some(&mut app.register_form.password),
        RegisterField::UserType => None,
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    // New chat from anywhere on the chat screen
    if key.code == KeyCode::Char('n') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.new_chat();
        return;
    }

    if app.focus == FocusPane::Input {
        handle_chat_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles: Sessions -> Chat -> Input
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Sessions => FocusPane::Chat,
                FocusPane::Chat | FocusPane::Input => FocusPane::Input,
            };
            if app.focus == FocusPane::Input {
                // Cursor at end of existing text
                app.input_cursor = app.conversation.input.chars().count();
            }
        }
        KeyCode::Char('i') | KeyCode::Esc => {
            app.focus = FocusPane::Input;
            app.input_cursor = app.conversation.input.chars().count();
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Sessions => app.sessions_nav_down(),
            _ => app.scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Sessions => app.sessions_nav_up(),
            _ => app.scroll_up(),
        },
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Enter if app.focus == FocusPane::Sessions => app.open_selected_session(),
        KeyCode::Char('d') if app.focus == FocusPane::Sessions => app.delete_selected_session(),
        KeyCode::Char('n') => app.new_chat(),
        KeyCode::Char('r') => app.refresh_sessions(),

        KeyCode::Char('A') => app.navigate(Route::Admin),
        KeyCode::Char('L') => app.logout(),

        _ => {}
    }
}

fn handle_chat_input(app: &mut App, key: KeyEvent) {
    let input = &mut app.conversation.input;
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.focus = FocusPane::Sessions,
        KeyCode::Enter => app.send_question(),
        // Input is read-only while waiting for an answer
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char(_) if app.conversation.loading => {}
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, app.input_cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_admin(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.logout();
        return;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        match app.admin_field {
            AdminField::FilePath => app.upload_file(),
            AdminField::Urls => app.submit_urls(),
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.navigate(Route::Chatbot),
        KeyCode::Tab | KeyCode::BackTab => {
            app.admin_field = match app.admin_field {
                AdminField::FilePath => AdminField::Urls,
                AdminField::Urls => AdminField::FilePath,
            };
        }
        KeyCode::Enter => match app.admin_field {
            AdminField::FilePath => app.upload_file(),
            AdminField::Urls => {
                let mut urls = app.admin.urls.clone();
                urls.push('\n');
                app.admin.set_urls(urls);
            }
        },
        KeyCode::Backspace => match app.admin_field {
            AdminField::FilePath => {
                app.admin_path_input.pop();
            }
            AdminField::Urls => {
                let mut urls = app.admin.urls.clone();
                urls.pop();
                app.admin.set_urls(urls);
            }
        },
        KeyCode::Char(c) => match app.admin_field {
            AdminField::FilePath => app.admin_path_input.push(c),
            AdminField::Urls => {
                let mut urls = app.admin.urls.clone();
                urls.push(c);
                app.admin.set_urls(urls);
            }
        },
        _ => {}
    }
}

fn handle_api(app: &mut App, event: ApiEvent) {
    match event {
        ApiEvent::LoggedIn(result) => {
            app.login_loading = false;
            match result {
                Ok(logged_in) => app.signed_in(logged_in),
                Err(e) => {
                    warn!(error = %e, "login failed");
                    app.login_error = Some(e.user_message("Login failed"));
                }
            }
        }
        ApiEvent::Registered(result) => {
            app.register_loading = false;
            match result {
                Ok(registered) => {
                    debug!(issued_token = registered.token.is_some(), "registration accepted");
                    app.login_form.username = app.register_form.username.clone();
                    app.login_form.password.clear();
                    app.login_field = LoginField::Password;
                    app.register_form = Default::default();
                    app.notice = Some("Account created. Please sign in.".to_string());
                    app.navigate(Route::Login);
                }
                Err(e) => {
                    warn!(error = %e, "registration failed");
                    app.register_error =
                        Some(e.user_message("Registration failed. Please try again."));
                }
            }
        }
        ApiEvent::Answer { epoch, result } => {
            if epoch == app.conversation.epoch {
                app.chat_task = None;
            }
            match result {
                Ok(reply) => {
                    if app.conversation.receive_answer(epoch, reply) {
                        app.scroll_chat_to_bottom();
                        app.sync_session_selection();
                        // The answer may have created or extended a session
                        app.refresh_sessions();
                    } else {
                        debug!(epoch, "dropped answer for an abandoned conversation");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "chat request failed");
                    if app.conversation.receive_error(epoch) {
                        app.scroll_chat_to_bottom();
                    }
                }
            }
        }
        ApiEvent::Sessions(result) => match result {
            Ok(sessions) => {
                app.conversation.sessions_loaded(sessions);
                app.sync_session_selection();
            }
            Err(e) => warn!(error = %e, "fetching sessions failed"),
        },
        ApiEvent::SessionDeleted { id, result } => match result {
            Ok(()) => {
                app.conversation.session_deleted(&id);
                app.sync_session_selection();
                app.notice = None;
            }
            Err(e) => {
                warn!(error = %e, session_id = %id, "deleting session failed");
                app.notice = Some(e.user_message("Could not delete session"));
            }
        },
        ApiEvent::FileIngested(result) => {
            if result.is_ok() {
                app.admin_path_input.clear();
            }
            app.admin.file_upload_finished(result);
        }
        ApiEvent::UrlsIngested(result) => app.admin.url_submit_finished(result),
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Route::Chatbot {
        return;
    }

    let x = mouse.column;
    let y = mouse.row;

    // Position-based scrolling
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_sessions = app.sessions_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.chat_scroll = app.chat_scroll.saturating_add(3);
            } else if in_sessions {
                app.sessions_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.chat_scroll = app.chat_scroll.saturating_sub(3);
            } else if in_sessions {
                app.sessions_nav_up();
            }
        }
        _ => {}
    }
}
