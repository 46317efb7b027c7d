use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::state::{App, BackendStatus, Screen};
use crate::tui::component::Component;
use crate::tui::components::overlay::truncate_str;
use crate::tui::components::{AccountSelector, AuthMode, ChatArea, Header, Sidebar, StatusView};
use crate::tui::{Focus, TuiState};

pub const SIDEBAR_WIDTH: u16 = 32;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let area = frame.area();
    match app.screen {
        Screen::Starting => {
            let mut view = StatusView {
                backend: &BackendStatus::Checking,
                base_url: &tui.base_url,
                spinner_frame,
            };
            view.render(frame, area);
        }
        Screen::Login => tui.auth_form.render(frame, area, AuthMode::Login, &app.auth_form),
        Screen::Register => tui
            .auth_form
            .render(frame, area, AuthMode::Register, &app.auth_form),
        Screen::Main => draw_main(frame, area, app, tui, spinner_frame),
    }
}

/// The status view replaces the chat UI while the backend is unreachable,
/// and while it is first being probed (a refresh keeps the chat UI up).
pub fn shows_status_view(app: &App) -> bool {
    app.backend.is_unavailable()
        || (app.backend == BackendStatus::Checking && !app.loading.refreshing)
}

fn draw_main(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let banner_height = if app.error.is_some() { 1 } else { 0 };
    let [header_area, banner_area, body_area] =
        Layout::vertical([Length(1), Length(banner_height), Min(0)]).areas(area);

    let mut header = Header {
        username: app.user.as_ref().map(|u| u.username.as_str()),
        backend: &app.backend,
        refreshing: app.loading.refreshing,
        account: app.selected_phone(),
        spinner_frame,
    };
    header.render(frame, header_area);

    if let Some(error) = &app.error {
        draw_error_banner(frame, banner_area, error);
    }

    if shows_status_view(app) {
        let mut view = StatusView {
            backend: &app.backend,
            base_url: &tui.base_url,
            spinner_frame,
        };
        view.render(frame, body_area);
        return;
    }

    let overlay_open = app.account_selector_open || app.telegram_login.is_some();
    let [sidebar_area, chat_column] =
        Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(body_area);

    Sidebar::new(
        &mut tui.sidebar,
        &app.chats,
        app.selected_chat_id(),
        app.selected_phone(),
        app.loading.chats,
        tui.focus == Focus::Sidebar && !overlay_open,
    )
    .render(frame, sidebar_area);

    let chat_area_rect = if app.selected_chat.is_some() {
        tui.composer.dimmed = tui.focus != Focus::Composer || overlay_open;
        tui.composer.sending = app.loading.sending;
        let composer_height = tui.composer.calculate_height(chat_column.width);
        let [thread_area, composer_area] =
            Layout::vertical([Min(0), Length(composer_height)]).areas(chat_column);
        tui.composer.render(frame, composer_area);
        thread_area
    } else {
        chat_column
    };

    ChatArea {
        state: &mut tui.chat_area,
        chat: app.selected_chat.as_ref(),
        messages: &app.messages,
        loading: app.loading.messages,
        endpoint_missing: app.endpoint_missing,
        tz: Local,
        today: Local::now().date_naive(),
    }
    .render(frame, chat_area_rect);

    if app.account_selector_open
        && let Some(state) = tui.account_selector.as_mut()
    {
        AccountSelector::new(state, &app.accounts, app.selected_phone(), app.loading.accounts)
            .render(frame, body_area);
    }
    if let (Some(dialog), Some(form)) = (&app.telegram_login, &tui.telegram_form) {
        form.render(frame, body_area, dialog);
    }
}

fn draw_error_banner(frame: &mut Frame, area: Rect, error: &str) {
    const HINT: &str = "  ^E Dismiss ";
    let style = Style::default().fg(Color::White).bg(Color::Red);
    let width = usize::from(area.width).saturating_sub(HINT.len() + 1);
    let line = Line::from(vec![
        Span::styled(format!(" {}", truncate_str(error, width)), style.add_modifier(Modifier::BOLD)),
        Span::styled(HINT, style),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}
