//! Interactive console.
//!
//! A single event loop reads commands from stdin and network results from a
//! channel. Requests run as spawned tasks and are never cancelled; their
//! results carry tickets so that a response meant for a closed panel or a
//! superseded fetch is dropped instead of overwriting newer state.

mod command;
mod render;

pub use command::{help, parse, Command};
pub use render::Style;

use std::path::PathBuf;

use chrono::Weekday;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::{AccountService, RecordStore};
use crate::edit::{RecordDetailPanel, SaveOutcome, SaveTicket};
use crate::errors::ConsoleError;
use crate::models::{Entity, Record};
use crate::views::settings::{self, Settings};
use crate::views::{Dashboard, FetchTicket, RecordListView};

/// Results delivered back to the event loop by request tasks.
#[derive(Debug)]
pub enum NetEvent {
    Fetched {
        ticket: FetchTicket,
        result: Result<Vec<Record>, ConsoleError>,
    },
    Saved {
        ticket: SaveTicket,
        result: Result<Option<Record>, ConsoleError>,
    },
    Archived {
        entity: Entity,
        id: i64,
        result: Result<(), ConsoleError>,
    },
    Counted {
        entity: Entity,
        result: Result<Vec<Record>, ConsoleError>,
    },
    PasswordChanged(Result<(), ConsoleError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<B> {
    backend: B,
    settings: Settings,
    settings_path: PathBuf,
    style: Style,
    active: Entity,
    students: RecordListView,
    faculty: RecordListView,
    panel: Option<RecordDetailPanel>,
    dashboard: Dashboard,
    events_tx: mpsc::UnboundedSender<NetEvent>,
    events_rx: mpsc::UnboundedReceiver<NetEvent>,
    output: Vec<String>,
}

impl<B> Console<B>
where
    B: RecordStore + AccountService + Clone + Send + Sync + 'static,
{
    pub fn new(backend: B, settings: Settings, settings_path: PathBuf, style: Style) -> Self {
        let dashboard = Dashboard::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            settings,
            settings_path,
            style,
            active: Entity::Students,
            students: RecordListView::new(Entity::Students, dashboard.sync_handle()),
            faculty: RecordListView::new(Entity::Faculty, dashboard.sync_handle()),
            panel: None,
            dashboard,
            events_tx,
            events_rx,
            output: Vec::new(),
        }
    }

    /// Run until `quit`, `logout` or end of input.
    pub async fn run(mut self) -> Result<(), ConsoleError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let usage = help();
        self.say(&usage);
        self.spawn_fetch(self.active);
        self.refresh_dashboard_if_stale();
        self.flush();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("End of input, exiting");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let flow = match parse(&line) {
                        Ok(command) => self.handle(command).await,
                        Err(e) => {
                            self.say(&e.render().to_string());
                            Flow::Continue
                        }
                    };
                    self.refresh_dashboard_if_stale();
                    self.flush();
                    if flow == Flow::Quit {
                        break;
                    }
                }
                Some(event) = self.events_rx.recv() => {
                    self.on_event(event);
                    self.refresh_dashboard_if_stale();
                    self.flush();
                }
            }
        }
        Ok(())
    }

    fn say(&mut self, text: &str) {
        self.output.push(text.trim_end().to_string());
    }

    fn flush(&mut self) {
        for chunk in self.output.drain(..) {
            println!("{}", chunk);
        }
    }

    /// Output produced since the last call, for callers not running `run`.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Wait for the next network result.
    pub async fn next_event(&mut self) -> Option<NetEvent> {
        self.events_rx.recv().await
    }

    pub fn view(&self, entity: Entity) -> &RecordListView {
        match entity {
            Entity::Students => &self.students,
            Entity::Faculty => &self.faculty,
        }
    }

    fn list_mut(&mut self, entity: Entity) -> &mut RecordListView {
        match entity {
            Entity::Students => &mut self.students,
            Entity::Faculty => &mut self.faculty,
        }
    }

    pub fn panel(&self) -> Option<&RecordDetailPanel> {
        self.panel.as_ref()
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn report(&mut self, err: &ConsoleError) {
        self.say(&format!("error: {}", err.message()));
    }

    fn show_list(&mut self) {
        let text = render::list(self.view(self.active), &self.style);
        self.say(&text);
    }

    fn show_panel(&mut self) {
        if let Some(panel) = &self.panel {
            let text = render::panel(panel, &self.style);
            self.say(&text);
        }
    }

    fn panel_mut(&mut self) -> Result<&mut RecordDetailPanel, ConsoleError> {
        self.panel
            .as_mut()
            .ok_or_else(|| ConsoleError::InvalidState("No record is open".to_string()))
    }

    pub async fn handle(&mut self, command: Command) -> Flow {
        match self.dispatch(command).await {
            Ok(flow) => flow,
            Err(e) => {
                self.report(&e);
                self.show_panel();
                Flow::Continue
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow, ConsoleError> {
        match command {
            Command::Students => self.show(Entity::Students),
            Command::Faculty => self.show(Entity::Faculty),
            Command::Reload => {
                self.spawn_fetch(self.active);
                self.show_list();
            }
            Command::Search { term } => {
                self.list_mut(self.active).set_search(&term.join(" "));
                self.show_list();
            }
            Command::List => self.show_list(),
            Command::Open { id } => {
                let panel = self.view(self.active).open(id)?;
                self.close_panel();
                self.panel = Some(panel);
                self.show_panel();
            }
            Command::New => {
                let panel = self.view(self.active).create_form();
                self.close_panel();
                self.panel = Some(panel);
                self.show_panel();
            }
            Command::Edit { field, value } => {
                let (field, value) =
                    command::edit_target(&field, &value).map_err(ConsoleError::InvalidState)?;
                let panel = self.panel_mut()?;
                panel.begin_edit(&field)?;
                if let Some(value) = value {
                    panel.type_text(&value)?;
                    panel.commit_edit()?;
                }
                self.show_panel();
            }
            Command::Type { text } => {
                self.panel_mut()?.type_text(&text.join(" "))?;
                self.show_panel();
            }
            Command::Enter => {
                self.panel_mut()?.commit_edit()?;
                self.show_panel();
            }
            Command::Esc => {
                self.panel_mut()?.cancel_edit();
                self.show_panel();
            }
            Command::Save => {
                let ticket = self.panel_mut()?.begin_save()?;
                self.spawn_save(ticket);
                self.show_panel();
            }
            Command::Discard => {
                self.panel_mut()?.discard_all();
                self.show_panel();
            }
            Command::Close => {
                self.close_panel();
                self.show_list();
            }
            Command::Archive { id } => {
                let entity = self.active;
                let request = self.view(entity).archive_request(id)?;
                let backend = self.backend.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = request.dispatch(&backend).await.map(|_| ());
                    let _ = tx.send(NetEvent::Archived { entity, id, result });
                });
                self.say(&format!("archiving {} {}...", entity, id));
            }
            Command::Schedule { day } => self.show_schedule(day),
            Command::Dashboard => {
                let text = render::dashboard(&self.dashboard, &self.style);
                self.say(&text);
            }
            Command::Theme => {
                let theme = self.settings.toggle_theme(&self.settings_path).await?;
                self.style = Style::for_theme(theme);
                self.say(&format!("theme: {}", theme.as_str()));
            }
            Command::Password {
                current,
                new,
                confirmation,
            } => {
                let request = settings::password_change(&current, &new, &confirmation)?;
                let backend = self.backend.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = backend.change_password(&request).await;
                    let _ = tx.send(NetEvent::PasswordChanged(result));
                });
                self.say("changing password...");
            }
            Command::Logout => {
                self.close_panel();
                self.backend.logout().await;
                self.say("logged out");
                return Ok(Flow::Quit);
            }
            Command::Quit => {
                self.close_panel();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn show(&mut self, entity: Entity) {
        self.close_panel();
        self.active = entity;
        self.spawn_fetch(entity);
        self.show_list();
    }

    fn show_schedule(&mut self, day: Option<Weekday>) {
        let text = render::schedule(day, &self.style);
        self.say(&text);
    }

    fn close_panel(&mut self) {
        if let Some(panel) = self.panel.take() {
            let dropped = panel.close();
            if dropped > 0 {
                self.say(&format!("discarded {} unsaved change(s)", dropped));
            }
        }
    }

    fn spawn_fetch(&mut self, entity: Entity) {
        let ticket = self.list_mut(entity).begin_fetch();
        self.spawn_fetch_ticket(ticket);
    }

    fn spawn_fetch_ticket(&self, ticket: FetchTicket) {
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.list(ticket.entity).await;
            let _ = tx.send(NetEvent::Fetched { ticket, result });
        });
    }

    fn spawn_save(&self, ticket: SaveTicket) {
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = ticket.request.dispatch(&backend).await;
            let _ = tx.send(NetEvent::Saved { ticket, result });
        });
    }

    fn refresh_dashboard_if_stale(&mut self) {
        if !self.dashboard.take_stale() {
            return;
        }
        for entity in Entity::ALL {
            let backend = self.backend.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = backend.list(entity).await;
                let _ = tx.send(NetEvent::Counted { entity, result });
            });
        }
    }

    /// A create, update or archive went through: re-fetch and notify.
    fn committed(&mut self, entity: Entity) {
        let ticket = self.list_mut(entity).mutation_committed();
        self.spawn_fetch_ticket(ticket);
    }

    pub fn on_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Fetched { ticket, result } => {
                let entity = ticket.entity;
                let applied = self.list_mut(entity).finish_fetch(ticket, result);
                if applied && entity == self.active && self.panel.is_none() {
                    self.show_list();
                }
            }
            NetEvent::Saved { ticket, result } => self.on_saved(ticket, result),
            NetEvent::Archived { entity, id, result } => match result {
                Ok(()) => {
                    self.say(&format!("archived {} {}", entity, id));
                    if self
                        .panel
                        .as_ref()
                        .is_some_and(|p| p.entity() == entity && p.record().id == Some(id))
                    {
                        self.close_panel();
                    }
                    self.committed(entity);
                }
                Err(e) => self.report(&e),
            },
            NetEvent::Counted { entity, result } => self.dashboard.apply(entity, result),
            NetEvent::PasswordChanged(result) => match result {
                Ok(()) => self.say("password changed"),
                Err(e) => {
                    self.report(&e);
                    for (field, message) in e.field_errors() {
                        self.say(&format!("  {}: {}", field, message));
                    }
                }
            },
        }
    }

    fn on_saved(&mut self, ticket: SaveTicket, result: Result<Option<Record>, ConsoleError>) {
        let entity = ticket.request.entity();
        let succeeded = result.is_ok();

        let outcome = match self.panel.as_mut() {
            Some(panel) => panel.finish_save(ticket, result),
            None => SaveOutcome::Stale,
        };

        match outcome {
            SaveOutcome::Saved { created: Some(record) } => {
                // The panel now holds the created record and edits the new id
                self.say(&format!(
                    "created {} {}",
                    entity.schema().noun,
                    record.id.map(|id| id.to_string()).unwrap_or_default()
                ));
                self.show_panel();
            }
            SaveOutcome::Saved { created: None } => {
                self.say("saved");
                self.show_panel();
            }
            SaveOutcome::Failed(_) => self.show_panel(),
            SaveOutcome::Stale => {
                tracing::debug!("Save response arrived after its panel closed");
            }
        }

        if succeeded {
            self.committed(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeStore};
    use tempfile::TempDir;

    fn ana() -> Record {
        Record::with_id(1)
            .set("student_id", "2024-0001")
            .set("first_name", "Ana")
            .set("last_name", "Cruz")
            .set("email", "ana@uni.edu")
            .set("program", "Nursing Program")
            .set("status", "Active")
    }

    struct Harness {
        console: Console<FakeStore>,
        store: FakeStore,
        _dir: TempDir,
    }

    impl Harness {
        async fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = FakeStore::with_records(Entity::Students, vec![ana()]);
            let mut console = Console::new(
                store.clone(),
                Settings::default(),
                dir.path().join("settings.json"),
                Style::plain(),
            );
            console.spawn_fetch(Entity::Students);
            let event = console.next_event().await.unwrap();
            console.on_event(event);
            console.take_output();
            console.dashboard.take_stale();
            Harness {
                console,
                store,
                _dir: dir,
            }
        }

        async fn run(&mut self, line: &str) -> String {
            let command = parse(line).unwrap();
            self.console.handle(command).await;
            self.console.take_output().join("\n")
        }

        async fn pump(&mut self) -> String {
            let event = self.console.next_event().await.unwrap();
            self.console.on_event(event);
            self.console.take_output().join("\n")
        }

        fn lists(&self) -> usize {
            self.store
                .calls()
                .iter()
                .filter(|call| matches!(call, Call::List(_)))
                .count()
        }
    }

    #[tokio::test]
    async fn test_edit_and_save_through_console() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        let shown = h.run("edit program = Engineering Program").await;
        assert!(shown.contains("1 unsaved change(s)"));
        assert_eq!(h.store.mutation_count(), 0);

        h.run("save").await;
        let saved = h.pump().await;
        assert!(saved.contains("saved"));
        assert_eq!(h.store.updates().len(), 1);
        assert!(h.console.dashboard().take_stale());

        // re-fetch after the save
        h.pump().await;
        assert_eq!(h.lists(), 2);
        assert_eq!(
            h.console.view(Entity::Students).find(1).unwrap().text("program").as_deref(),
            Some("Engineering Program")
        );
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edits_without_refetch() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        h.run("edit email = ana.cruz@uni.edu").await;
        h.store.fail_next(ConsoleError::field("email", "The email has already been taken."));

        h.run("save").await;
        let shown = h.pump().await;
        assert!(shown.contains("The email has already been taken."));

        let panel = h.console.panel().unwrap();
        assert_eq!(panel.pending().get("email"), Some("ana.cruz@uni.edu"));
        assert!(!panel.is_saving());
        assert_eq!(h.lists(), 1);
        assert!(!h.console.dashboard().take_stale());
    }

    #[tokio::test]
    async fn test_close_discards_and_late_save_is_ignored() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        h.run("edit email = ana@uni.ph").await;
        h.run("save").await;
        let closed = h.run("close").await;
        assert!(closed.contains("discarded 1 unsaved change(s)"));

        h.run("open 1").await;
        let saved = h.pump().await;
        assert!(!saved.contains("saved"));
        assert!(h.console.panel().unwrap().pending().is_empty());
    }

    #[tokio::test]
    async fn test_late_successful_save_still_refetches_and_notifies() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        h.run("edit phone = 0917 555 0101").await;
        h.run("save").await;
        h.run("close").await;

        h.pump().await;
        assert!(h.console.panel().is_none());
        assert!(h.console.dashboard().take_stale());

        h.pump().await;
        assert_eq!(h.lists(), 2);
        assert_eq!(
            h.console.view(Entity::Students).find(1).unwrap().text("phone").as_deref(),
            Some("0917 555 0101")
        );
    }

    #[tokio::test]
    async fn test_create_keeps_panel_and_edits_made_in_flight() {
        let mut h = Harness::new().await;
        h.run("new").await;
        for line in [
            "edit student_id = 2024-0002",
            "edit first_name = Ben",
            "edit last_name = Lim",
            "edit email = ben@uni.edu",
            "edit program = 2",
        ] {
            h.run(line).await;
        }
        h.run("save").await;
        h.run("edit phone = 0917 555 0101").await;

        let created = h.pump().await;
        assert!(created.contains("created student 2"));

        let panel = h.console.panel().unwrap();
        assert!(!panel.is_new());
        assert_eq!(panel.record().id, Some(2));
        assert_eq!(panel.pending().get("phone"), Some("0917 555 0101"));
        assert!(panel.pending().get("first_name").is_none());

        // The next save edits the created record
        h.pump().await;
        h.run("save").await;
        h.pump().await;
        let updates = h.store.updates();
        assert_eq!(updates.len(), 1);
        let (_, id, body) = &updates[0];
        assert_eq!(*id, 2);
        assert_eq!(body.text("phone").as_deref(), Some("0917 555 0101"));
        assert_eq!(body.text("first_name").as_deref(), Some("Ben"));
    }

    #[tokio::test]
    async fn test_create_with_missing_required_fields_sends_nothing() {
        let mut h = Harness::new().await;
        h.run("new").await;
        h.run("edit first_name = Ben").await;
        let out = h.run("save").await;
        assert!(out.contains("The last name field is required."));
        assert_eq!(h.store.mutation_count(), 0);
        assert!(!h.console.panel().unwrap().is_saving());
    }

    #[tokio::test]
    async fn test_archive_closes_open_panel_and_refetches() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        h.run("edit phone = 0917 555 0101").await;
        h.run("archive 1").await;

        let archived = h.pump().await;
        assert!(archived.contains("archived students 1"));
        assert!(archived.contains("discarded 1 unsaved change(s)"));
        assert!(h.console.panel().is_none());
        assert!(h.console.dashboard().take_stale());

        let (_, id, body) = &h.store.updates()[0];
        assert_eq!(*id, 1);
        assert!(body.is_archived());
        assert!(body.text("archived_at").is_some());
        assert!(body.text("phone").is_none());

        let listed = h.pump().await;
        assert!(listed.contains("no students to show"));
        assert!(h.console.view(Entity::Students).find(1).is_none());
        assert!(h.run("open 1").await.contains("No student with id 1"));
    }

    #[tokio::test]
    async fn test_failed_archive_keeps_row() {
        let mut h = Harness::new().await;
        h.store.fail_next(ConsoleError::Rejected {
            status: 403,
            message: "Forbidden".to_string(),
        });
        h.run("archive 1").await;

        assert!(h.pump().await.contains("error: Forbidden"));
        assert!(!h.console.dashboard().take_stale());
        assert_eq!(h.lists(), 1);
        assert!(h.console.view(Entity::Students).find(1).is_some());
    }

    #[tokio::test]
    async fn test_untouched_editor_leaves_nothing_pending() {
        let mut h = Harness::new().await;
        h.run("open 1").await;
        h.run("edit first_name").await;
        h.run("edit middle_name").await;
        let shown = h.run("esc").await;
        assert!(!shown.contains("unsaved"));
        assert!(!h.console.panel().unwrap().has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_errors_are_reported_not_fatal() {
        let mut h = Harness::new().await;
        assert!(h.run("save").await.contains("No record is open"));
        assert!(h.run("open 42").await.contains("No student with id 42"));
        h.run("open 1").await;
        assert!(h.run("edit program = Astrology").await.contains("Program must be one of"));
        assert!(h.run("edit program Astrology").await.contains("usage: edit"));
    }

    #[tokio::test]
    async fn test_password_mismatch_is_local() {
        let mut h = Harness::new().await;
        let out = h.run("password old new1 new2").await;
        assert!(out.contains("does not match"));
        assert_eq!(h.store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_password_change_reports_result() {
        let mut h = Harness::new().await;
        h.run("password old n3w-pass n3w-pass").await;
        assert!(h.pump().await.contains("password changed"));
        assert!(matches!(h.store.calls().last(), Some(Call::ChangePassword(_))));
    }

    #[tokio::test]
    async fn test_logout_quits() {
        let mut h = Harness::new().await;
        let command = parse("logout").unwrap();
        assert_eq!(h.console.handle(command).await, Flow::Quit);
        assert_eq!(h.store.calls().last(), Some(&Call::Logout));
    }
}
