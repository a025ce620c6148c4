// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use jobtrack_app::{
    Application, ApplicationId, CommitRefusal, CommitResolution, CommitState, FetchResolution,
    FetchTicket, FilterState, ListController, ListPhase, PaginatedApplications, Status,
    StatusHistoryEntry, StatusTone, StatusUpdate, StoreError, TransitionDraft,
    request_transition,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const STATUS_CLEAR_SECS: u64 = 4;
const PROGRESS_BAR_WIDTH: usize = 20;

// The remote store seam. Implementations run the blocking call and post the
// tagged outcome back on the channel; the default spawn methods resolve
// inline, which keeps tests deterministic, while real runtimes override them
// to use worker threads.
pub trait AppRuntime {
    fn fetch_applications(
        &mut self,
        filter: &FilterState,
    ) -> Result<PaginatedApplications, StoreError>;

    fn update_status(&mut self, update: &StatusUpdate)
    -> Result<StatusHistoryEntry, StoreError>;

    fn spawn_fetch(&mut self, ticket: &FetchTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.fetch_applications(&ticket.filter);
        tx.send(InternalEvent::FetchResolved {
            request_id: ticket.request_id,
            outcome,
        })
        .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }

    fn spawn_status_update(
        &mut self,
        update: &StatusUpdate,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.update_status(update);
        tx.send(InternalEvent::CommitResolved {
            application_id: update.application_id,
            outcome,
        })
        .map_err(|_| anyhow!("commit event channel closed"))?;
        Ok(())
    }

    fn cancel_fetch(&mut self, _request_id: u64) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    FetchResolved {
        request_id: u64,
        outcome: Result<PaginatedApplications, StoreError>,
    },
    CommitResolved {
        application_id: ApplicationId,
        outcome: Result<StatusHistoryEntry, StoreError>,
    },
    ClearStatus {
        token: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Nav,
    Search,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModalState {
    draft: TransitionDraft,
    note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UiState {
    mode: InputMode,
    selected: usize,
    search_buffer: String,
    modal: Option<ModalState>,
    status_line: Option<String>,
    status_token: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            mode: InputMode::Nav,
            selected: 0,
            search_buffer: String::new(),
            modal: None,
            status_line: None,
            status_token: 0,
        }
    }
}

impl UiState {
    fn clamp_selection(&mut self, row_count: usize) {
        if row_count == 0 {
            self.selected = 0;
        } else if self.selected >= row_count {
            self.selected = row_count - 1;
        }
    }
}

pub fn run_app<R: AppRuntime>(controller: &mut ListController, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut ui = UiState::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch_fetch(controller.refetch(), runtime, &mut ui, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(controller, runtime, &mut ui, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, controller, &ui)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(controller, runtime, &mut ui, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    // Unmount: nothing that is still in flight may touch state afterwards.
    controller.close_session();

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::FetchResolved {
                request_id,
                outcome,
            } => {
                match controller.resolve_fetch(request_id, outcome) {
                    FetchResolution::Applied(followup) => {
                        ui.clamp_selection(controller.applications().len());
                        // Authoritative paging pushed us off the end; chase
                        // the clamped page.
                        dispatch_fetch(followup, runtime, ui, tx);
                    }
                    FetchResolution::Failed => {
                        if let ListPhase::Failed(message) = controller.phase() {
                            let message = format!("load failed: {message}");
                            emit_status(ui, tx, message);
                        }
                    }
                    FetchResolution::Stale => {}
                }
            }
            InternalEvent::CommitResolved {
                application_id,
                outcome,
            } => {
                let confirmed_status = outcome.as_ref().ok().map(|entry| entry.status);
                match controller.resolve_commit(application_id, outcome) {
                    CommitResolution::Applied | CommitResolution::NotOnPage => {
                        if let Some(status) = confirmed_status {
                            emit_status(ui, tx, format!("status updated to {}", status.as_str()));
                        }
                    }
                    CommitResolution::Failed => {
                        // The row keeps its Failed marker until the next
                        // attempt; the status line is just the notification.
                        if let CommitState::Failed(message) =
                            controller.commit_state(application_id)
                        {
                            emit_status(ui, tx, format!("status update failed: {message}"));
                        }
                    }
                    CommitResolution::Ignored => {}
                }
            }
            InternalEvent::ClearStatus { token } if token == ui.status_token => {
                ui.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn dispatch_fetch<R: AppRuntime>(
    ticket: Option<FetchTicket>,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
) {
    let Some(ticket) = ticket else { return };
    if let Err(error) = runtime.spawn_fetch(&ticket, tx.clone()) {
        emit_status(ui, tx, format!("fetch failed to start: {error}"));
    }
}

fn emit_status(ui: &mut UiState, tx: &Sender<InternalEvent>, message: impl Into<String>) {
    ui.status_line = Some(message.into());
    ui.status_token = ui.status_token.saturating_add(1);
    schedule_status_clear(tx, ui.status_token);
}

fn schedule_status_clear(tx: &Sender<InternalEvent>, token: u64) {
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(STATUS_CLEAR_SECS));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn handle_key_event<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match ui.mode {
        InputMode::Nav => handle_nav_key(controller, runtime, ui, tx, key),
        InputMode::Search => {
            handle_search_key(controller, runtime, ui, tx, key);
            false
        }
        InputMode::Modal => {
            handle_modal_key(controller, runtime, ui, tx, key);
            false
        }
    }
}

fn handle_nav_key<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Down | KeyCode::Char('j') => {
            let rows = controller.applications().len();
            if rows > 0 && ui.selected + 1 < rows {
                ui.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ui.selected = ui.selected.saturating_sub(1);
        }
        KeyCode::Char('/') => {
            ui.mode = InputMode::Search;
            ui.search_buffer = controller.filter().search_term.clone();
        }
        KeyCode::Char('f') => {
            let next = controller.filter().status_filter.next();
            dispatch_fetch(controller.set_status_filter(next), runtime, ui, tx);
        }
        KeyCode::Right | KeyCode::Char('n') => {
            let page = controller.filter().page;
            dispatch_fetch(controller.set_page(page + 1), runtime, ui, tx);
        }
        KeyCode::Left | KeyCode::Char('p') => {
            let page = controller.filter().page;
            if page > 1 {
                dispatch_fetch(controller.set_page(page - 1), runtime, ui, tx);
            }
        }
        KeyCode::Char('r') => {
            dispatch_fetch(controller.refetch(), runtime, ui, tx);
        }
        KeyCode::Char('s') => open_status_modal(controller, ui, tx),
        KeyCode::Char('e') => emit_status(ui, tx, "edit is handled outside this view"),
        KeyCode::Char('d') => emit_status(ui, tx, "delete is handled outside this view"),
        _ => {}
    }
    false
}

fn open_status_modal(
    controller: &ListController,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
) {
    let Some(application) = controller.applications().get(ui.selected) else {
        return;
    };
    if controller.has_pending_commit(application.id) {
        // One in-flight status update per application.
        emit_status(ui, tx, CommitRefusal::AlreadyPending.message());
        return;
    }

    let target = next_target_status(application.status);
    let Some(draft) = request_transition(controller.applications(), application.id, target)
    else {
        return;
    };
    ui.modal = Some(ModalState {
        draft,
        // The note starts blank every time the dialog opens.
        note: String::new(),
    });
    ui.mode = InputMode::Modal;
}

// Default modal target: the next pipeline stage, wrapping terminal statuses
// back onto themselves so the picker starts somewhere sensible.
fn next_target_status(current: Status) -> Status {
    match current {
        Status::Applied => Status::Test,
        Status::Test => Status::Interview,
        Status::Interview => Status::OfferAwarded,
        terminal => terminal,
    }
}

fn cycle_target(status: Status, delta: isize) -> Status {
    let index = Status::ALL
        .iter()
        .position(|candidate| *candidate == status)
        .unwrap_or(0) as isize;
    let len = Status::ALL.len() as isize;
    let next = (index + delta).rem_euclid(len) as usize;
    Status::ALL[next]
}

fn handle_search_key<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            ui.mode = InputMode::Nav;
        }
        KeyCode::Enter => {
            ui.mode = InputMode::Nav;
            let term = ui.search_buffer.clone();
            dispatch_fetch(controller.set_search_term(&term), runtime, ui, tx);
        }
        KeyCode::Backspace => {
            ui.search_buffer.pop();
        }
        KeyCode::Char(ch) => {
            ui.search_buffer.push(ch);
        }
        _ => {}
    }
}

fn handle_modal_key<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut modal) = ui.modal.take() else {
        ui.mode = InputMode::Nav;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            ui.mode = InputMode::Nav;
            return;
        }
        KeyCode::Up => {
            modal.draft.target_status = cycle_target(modal.draft.target_status, -1);
        }
        KeyCode::Down => {
            modal.draft.target_status = cycle_target(modal.draft.target_status, 1);
        }
        KeyCode::Enter => {
            ui.mode = InputMode::Nav;
            save_status_update(controller, runtime, ui, tx, modal);
            return;
        }
        KeyCode::Backspace => {
            modal.note.pop();
        }
        KeyCode::Char(ch) => {
            modal.note.push(ch);
        }
        _ => {}
    }

    ui.modal = Some(modal);
}

fn save_status_update<R: AppRuntime>(
    controller: &mut ListController,
    runtime: &mut R,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    modal: ModalState,
) {
    let note = if modal.note.trim().is_empty() {
        None
    } else {
        Some(modal.note)
    };

    match controller.begin_commit(modal.draft.application_id, modal.draft.target_status, note) {
        Ok(update) => {
            if let Err(error) = runtime.spawn_status_update(&update, tx.clone()) {
                controller.resolve_commit(
                    update.application_id,
                    Err(StoreError::NetworkUnavailable(error.to_string())),
                );
                controller.acknowledge_commit_failure(update.application_id);
                emit_status(ui, tx, format!("status update failed to start: {error}"));
            }
        }
        Err(refusal) => emit_status(ui, tx, refusal.message()),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, controller: &ListController, ui: &UiState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, outer[0], controller);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(outer[1]);

    render_list(frame, panels[0], controller, ui);
    render_detail(frame, panels[1], controller, ui);
    render_footer(frame, outer[2], ui);

    if ui.mode == InputMode::Modal
        && let Some(modal) = &ui.modal
    {
        render_modal(frame, modal);
    }
}

fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, controller: &ListController) {
    let filter = controller.filter();
    let mut spans = vec![
        Span::styled(
            "jobtrack",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(format!("status:{}", filter.status_filter.label())),
        Span::raw("  "),
        Span::raw(pagination_label(controller)),
    ];
    if !filter.search_term.is_empty() {
        spans.push(Span::raw(format!("  search:{:?}", filter.search_term)));
    }
    match controller.phase() {
        ListPhase::Loading => {
            spans.push(Span::styled(
                "  loading...",
                Style::default().fg(Color::Yellow),
            ));
        }
        ListPhase::Failed(message) => {
            spans.push(Span::styled(
                format!("  {message}"),
                Style::default().fg(Color::Red),
            ));
        }
        ListPhase::Idle => {}
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &ListController,
    ui: &UiState,
) {
    let items: Vec<ListItem> = controller
        .applications()
        .iter()
        .map(|application| {
            let pending = controller.has_pending_commit(application.id);
            let marker = if pending {
                "~"
            } else {
                application.status.glyph()
            };
            let line = Line::from(vec![
                Span::styled(
                    format!("{marker} "),
                    Style::default().fg(tone_color(application.status.tone())),
                ),
                Span::raw(format!(
                    "{} | {}",
                    application.company, application.position
                )),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!(" applications ({}) ", controller.applications().len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !controller.applications().is_empty() {
        list_state.select(Some(ui.selected));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_detail(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &ListController,
    ui: &UiState,
) {
    let body = match controller.applications().get(ui.selected) {
        Some(application) => detail_lines(application, controller),
        None => vec![Line::from(
            "No applications found matching your filters.",
        )],
    };

    let detail = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(" detail "))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn detail_lines<'a>(application: &'a Application, controller: &ListController) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            application.position.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("at {}", application.company)),
    ];
    if let Some(website) = &application.website {
        lines.push(Line::from(format!("site: {website}")));
    }
    if let Some(kind) = &application.application_type {
        lines.push(Line::from(format!("type: {kind}")));
    }

    lines.push(Line::from(vec![
        Span::styled(
            format!("{} ", application.status.as_str()),
            Style::default().fg(tone_color(application.status.tone())),
        ),
        Span::raw(progress_bar(application.status)),
    ]));

    match controller.commit_state(application.id) {
        CommitState::Pending => {
            lines.push(Line::from(Span::styled(
                "updating status...",
                Style::default().fg(Color::Yellow),
            )));
        }
        CommitState::Failed(message) => {
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(Color::Red),
            )));
        }
        CommitState::Idle => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "history",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for entry in &application.status_history {
        lines.push(Line::from(format!(
            "  {} {}",
            format_timestamp(entry.created_at),
            entry.status.as_str()
        )));
        if let Some(notes) = &entry.notes {
            lines.push(Line::from(Span::styled(
                format!("      {notes}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines
}

fn render_footer(frame: &mut ratatui::Frame<'_>, area: Rect, ui: &UiState) {
    let text = match ui.mode {
        InputMode::Search => format!("search: {}_", ui.search_buffer),
        _ => match &ui.status_line {
            Some(status) => status.clone(),
            None => " j/k:select  /:search  f:filter  n/p:page  s:status  r:reload  q:quit"
                .to_owned(),
        },
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_modal(frame: &mut ratatui::Frame<'_>, modal: &ModalState) {
    let area = centered_rect(frame.area(), 52, 9);
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(format!(
            "Update status to \"{}\"",
            modal.draft.target_status.as_str()
        )),
        Line::from(Span::styled(
            format!("{} at {}", modal.draft.position, modal.draft.company),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(format!("note: {}_", modal.note)),
        Line::from(""),
        Line::from(Span::styled(
            "up/down:status  enter:save  esc:cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let dialog = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" status update "))
        .wrap(Wrap { trim: false });
    frame.render_widget(dialog, area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn pagination_label(controller: &ListController) -> String {
    match controller.pagination() {
        Some(meta) => format!(
            "page {}/{} ({} total)",
            controller.filter().page,
            meta.total_pages.max(1),
            meta.total
        ),
        None => format!("page {}", controller.filter().page),
    }
}

fn progress_bar(status: Status) -> String {
    let percent = status.progress_percent() as usize;
    let filled = (percent * PROGRESS_BAR_WIDTH).div_ceil(100);
    let mut bar = String::with_capacity(PROGRESS_BAR_WIDTH + 8);
    bar.push('[');
    for index in 0..PROGRESS_BAR_WIDTH {
        bar.push(if index < filled { '#' } else { '.' });
    }
    bar.push_str(&format!("] {percent}%"));
    bar
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.date().to_string())
}

fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Blue => Color::Blue,
        StatusTone::Amber => Color::Rgb(245, 158, 11),
        StatusTone::Purple => Color::Magenta,
        StatusTone::Green => Color::Green,
        StatusTone::Red => Color::Red,
        StatusTone::Yellow => Color::Yellow,
    }
}
