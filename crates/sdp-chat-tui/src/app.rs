use std::future::Future;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use sdp_chat_core::api::ApiResult;
use sdp_chat_core::{
    guard, render_with, AdminPanel, ApiClient, AuthState, ChatReply, Conversation, LoggedIn,
    LoginForm, MarkdownSubset, RegisterForm, Registered, RenderedBlock, Route, Session,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::tui::AppEvent;

/// Outcome of a backend request, delivered back to the event loop
#[derive(Debug)]
pub enum ApiEvent {
    LoggedIn(ApiResult<LoggedIn>),
    Registered(ApiResult<Registered>),
    Answer { epoch: u64, result: ApiResult<ChatReply> },
    Sessions(ApiResult<Vec<Session>>),
    SessionDeleted { id: String, result: ApiResult<()> },
    FileIngested(ApiResult<String>),
    UrlsIngested(ApiResult<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Username,
    Email,
    Password,
    UserType,
}

impl RegisterField {
    pub fn next(self) -> Self {
        match self {
            RegisterField::Username => RegisterField::Email,
            RegisterField::Email => RegisterField::Password,
            RegisterField::Password => RegisterField::UserType,
            RegisterField::UserType => RegisterField::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            RegisterField::Username => RegisterField::UserType,
            RegisterField::Email => RegisterField::Username,
            RegisterField::Password => RegisterField::Email,
            RegisterField::UserType => RegisterField::Password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sessions,
    Chat,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminField {
    FilePath,
    Urls,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Route,
    pub notice: Option<String>,

    // Auth
    pub auth: AuthState,
    pub api: ApiClient,
    /// Bumped on sign-out so results of the previous user's requests are dropped
    pub auth_generation: u64,

    // Login screen
    pub login_form: LoginForm,
    pub login_field: LoginField,
    pub login_error: Option<String>,
    pub login_loading: bool,

    // Register screen
    pub register_form: RegisterForm,
    pub register_field: RegisterField,
    pub register_error: Option<String>,
    pub register_loading: bool,

    // Chat screen
    pub conversation: Conversation,
    pub focus: FocusPane,
    pub input_cursor: usize, // cursor position in conversation.input (chars)
    pub session_state: ListState,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_task: Option<JoinHandle<()>>,
    pub markdown: MarkdownSubset,

    // Admin screen
    pub admin: AdminPanel,
    pub admin_field: AdminField,
    pub admin_path_input: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub sessions_area: Option<Rect>,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(api: ApiClient, markdown: MarkdownSubset, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            screen: Route::Login,
            notice: None,

            auth: AuthState::new(),
            api,
            auth_generation: 0,

            login_form: LoginForm::default(),
            login_field: LoginField::Username,
            login_error: None,
            login_loading: false,

            register_form: RegisterForm::default(),
            register_field: RegisterField::Username,
            register_error: None,
            register_loading: false,

            conversation: Conversation::new(),
            focus: FocusPane::Input,
            input_cursor: 0,
            session_state: ListState::default(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_task: None,
            markdown,

            admin: AdminPanel::new(),
            admin_field: AdminField::FilePath,
            admin_path_input: String::new(),

            animation_frame: 0,

            chat_area: None,
            sessions_area: None,

            events,
        }
    }

    /// Run a backend call in the background and post its result to the event loop
    pub fn spawn_request<F>(&self, request: F) -> JoinHandle<()>
    where
        F: Future<Output = ApiEvent> + Send + 'static,
    {
        let tx = self.events.clone();
        let generation = self.auth_generation;
        tokio::spawn(async move {
            let event = request.await;
            let _ = tx.send(AppEvent::Api { generation, event });
        })
    }

    /// Switch screens, honouring the sign-in and admin guards
    pub fn navigate(&mut self, route: Route) {
        let target = guard(route, &self.auth);
        if target != route {
            debug!(requested = route.path(), landed = target.path(), "route guarded");
        }
        self.screen = target;

        if target == Route::Chatbot {
            self.focus = FocusPane::Input;
            self.refresh_sessions();
        }
    }

    pub fn submit_login(&mut self) {
        if self.login_loading {
            return;
        }
        if let Err(msg) = self.login_form.validate() {
            self.login_error = Some(msg);
            return;
        }
        self.login_error = None;
        self.login_loading = true;

        let api = self.api.clone();
        let form = self.login_form.clone();
        self.spawn_request(async move {
            ApiEvent::LoggedIn(api.login(&form.username, &form.password).await)
        });
    }

    pub fn submit_register(&mut self) {
        if self.register_loading {
            return;
        }
        if let Err(msg) = self.register_form.validate() {
            self.register_error = Some(msg);
            return;
        }
        self.register_error = None;
        self.register_loading = true;

        let api = self.api.clone();
        let form = self.register_form.clone();
        self.spawn_request(async move { ApiEvent::Registered(api.register(&form).await) });
    }

    pub fn signed_in(&mut self, logged_in: LoggedIn) {
        info!(username = %logged_in.user.username, user_type = logged_in.user.user_type.as_str(), "signed in");
        self.api.set_token(Some(logged_in.token.clone()));
        self.auth.sign_in(logged_in);
        self.login_form.password.clear();
        self.login_error = None;
        self.notice = None;
        self.navigate(Route::Chatbot);
    }

    pub fn logout(&mut self) {
        info!("signed out");
        self.abort_chat_task();
        self.auth.logout();
        self.api.set_token(None);
        self.auth_generation += 1;
        self.conversation.reset();
        self.session_state = ListState::default();
        self.input_cursor = 0;
        self.chat_scroll = 0;
        self.admin = AdminPanel::new();
        self.admin_path_input.clear();
        self.notice = None;
        self.navigate(Route::Login);
    }

    pub fn refresh_sessions(&self) {
        if !self.auth.is_authenticated() {
            return;
        }
        let api = self.api.clone();
        self.spawn_request(async move { ApiEvent::Sessions(api.list_sessions().await) });
    }

    pub fn send_question(&mut self) {
        let Some(pending) = self.conversation.submit() else {
            return;
        };
        self.input_cursor = 0;
        self.scroll_chat_to_bottom();

        let api = self.api.clone();
        self.chat_task = Some(self.spawn_request(async move {
            let result = api
                .chat(&pending.question, pending.session_id.as_deref())
                .await;
            ApiEvent::Answer {
                epoch: pending.epoch,
                result,
            }
        }));
    }

    pub fn new_chat(&mut self) {
        self.abort_chat_task();
        self.conversation.new_conversation();
        self.input_cursor = 0;
        self.chat_scroll = 0;
        self.session_state.select(None);
        self.focus = FocusPane::Input;
    }

    fn abort_chat_task(&mut self) {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
    }

    pub fn open_selected_session(&mut self) {
        let Some(session) = self
            .session_state
            .selected()
            .and_then(|i| self.conversation.sessions.get(i))
            .cloned()
        else {
            return;
        };
        self.abort_chat_task();
        self.conversation.select_session(&session);
        self.input_cursor = 0;
        self.scroll_chat_to_bottom();
    }

    pub fn delete_selected_session(&mut self) {
        let Some(id) = self
            .session_state
            .selected()
            .and_then(|i| self.conversation.sessions.get(i))
            .map(|s| s.id.clone())
        else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(async move {
            let result = api.delete_session(&id).await;
            ApiEvent::SessionDeleted { id, result }
        });
    }

    pub fn upload_file(&mut self) {
        if self.admin.file_loading {
            return;
        }
        let path = self.admin_path_input.trim().to_string();
        if !path.is_empty() {
            self.admin.select_file(&path);
            if self.admin.file.is_none() {
                return;
            }
        }
        let Some(file) = self.admin.begin_file_upload() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(async move { ApiEvent::FileIngested(api.ingest_file(&file).await) });
    }

    pub fn submit_urls(&mut self) {
        if self.admin.url_loading {
            return;
        }
        let Some(urls) = self.admin.begin_url_submit() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(async move { ApiEvent::UrlsIngested(api.ingest_urls(&urls).await) });
    }

    /// Keep the sidebar selection inside the session list
    pub fn sync_session_selection(&mut self) {
        let len = self.conversation.sessions.len();
        match self.session_state.selected() {
            _ if len == 0 => self.session_state.select(None),
            Some(i) if i >= len => self.session_state.select(Some(len - 1)),
            None => self
                .session_state
                .select(self.conversation.current_session_index()),
            _ => {}
        }
    }

    pub fn sessions_nav_down(&mut self) {
        let len = self.conversation.sessions.len();
        if len == 0 {
            return;
        }
        let i = match self.session_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.session_state.select(Some(i));
    }

    pub fn sessions_nav_up(&mut self) {
        if self.conversation.sessions.is_empty() {
            return;
        }
        let i = self.session_state.selected().unwrap_or(0).saturating_sub(1);
        self.session_state.select(Some(i));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the latest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.conversation.messages {
            total_lines = total_lines.saturating_add(1); // Sender line ("You:" or "AI:")
            for block in render_with(&msg.text, self.markdown) {
                total_lines = total_lines.saturating_add(wrapped_height(&block, wrap_width));
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.conversation.loading {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

/// Rows a rendered block takes once wrapped to `width` columns
fn wrapped_height(block: &RenderedBlock, width: usize) -> u16 {
    let prefix = match block {
        RenderedBlock::Break => return 1,
        RenderedBlock::BulletItem(_) => 2,
        RenderedBlock::NumberedItem { number, .. } => number.chars().count() + 2,
        RenderedBlock::Paragraph(_) => 0,
    };
    // Use character count, not byte length, for proper UTF-8 handling
    let chars: usize = prefix + block.spans().iter().map(|s| s.text().chars().count()).sum::<usize>();
    ((chars / width.max(1)) + 1) as u16
}
