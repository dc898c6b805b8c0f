//! The injection engine, one per page context.
//!
//! State machine:
//!
//! ```text
//!            platform detected                input found
//!   Idle ───────────────────────▶ Searching ───────────────▶ Ready ◀──┐
//!    ▲ ▲            timeout          │                         │      │
//!    │ └─────────────────────────────┘                         │   Injected
//!    │                 URL changed (resume after settle delay) │      ▲
//!    └─────────────────────────────────────────────────────────┘      │
//!                                              role chosen ───────────┘
//! ```
//!
//! The engine runs as a single task. Polling, the navigation watch, role
//! pushes and user clicks are all branches of one `select!` loop.
//! Page and storage failures are logged and never surface to the page.

use chrono::Utc;
use rolecast_config::EngineConfig;
use rolecast_core::event::{DomainEvent, EventBus};
use rolecast_core::page::{Page, UiEvent};
use rolecast_core::role::Role;
use rolecast_core::storage::RoleStore;
use rolecast_platforms::detect_platform;
use rolecast_prompt::format_role;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::merge::apply_merge;
use crate::session::InjectionSession;

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Unsupported page, gave up searching, or waiting out a navigation
    Idle,
    /// Polling for the prompt input
    Searching,
    /// Input found; selector available
    Ready,
    /// Text was just merged (returns to Ready immediately)
    Injected,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Searching => "searching",
            EngineState::Ready => "ready",
            EngineState::Injected => "injected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle {
        resume_at: Option<Instant>,
    },
    Searching {
        deadline: Instant,
        next_poll: Instant,
        attempts: u32,
    },
    Ready,
    Injected,
}

/// Engine timing.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub search_timeout: Duration,
    pub navigation_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            search_timeout: config.search_timeout(),
            navigation_interval: config.navigation_interval(),
            settle_delay: config.settle_delay(),
        }
    }
}

pub struct InjectionEngine {
    page: Arc<dyn Page>,
    store: Arc<dyn RoleStore>,
    settings: EngineSettings,
    events: Option<Arc<EventBus>>,
    session: InjectionSession,
    roles: Vec<Role>,
    phase: Phase,
}

impl InjectionEngine {
    pub fn new(page: Arc<dyn Page>, store: Arc<dyn RoleStore>, settings: EngineSettings) -> Self {
        let session = InjectionSession::new(page.url());
        Self {
            page,
            store,
            settings,
            events: None,
            session,
            roles: Vec::new(),
            phase: Phase::Idle { resume_at: None },
        }
    }

    /// Publish lifecycle events on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn state(&self) -> EngineState {
        match self.phase {
            Phase::Idle { .. } => EngineState::Idle,
            Phase::Searching { .. } => EngineState::Searching,
            Phase::Ready => EngineState::Ready,
            Phase::Injected => EngineState::Injected,
        }
    }

    pub fn session(&self) -> &InjectionSession {
        &self.session
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Drive the engine until the page goes away (the UI channel closes).
    ///
    /// Returns the engine so callers can inspect its final state.
    pub async fn run(mut self, mut ui_events: mpsc::Receiver<UiEvent>) -> Self {
        let mut subscription = self.store.subscribe();
        self.load_roles().await;
        self.start(Instant::now());

        let mut navigation = tokio::time::interval(self.settings.navigation_interval);
        navigation.set_missed_tick_behavior(MissedTickBehavior::Delay);
        navigation.tick().await;

        let mut roles_open = true;
        loop {
            let wake = self.next_wakeup();
            tokio::select! {
                event = ui_events.recv() => match event {
                    Some(event) => self.handle_ui(event),
                    None => break,
                },
                update = subscription.next(), if roles_open => match update {
                    Some(roles) => self.set_roles(roles),
                    None => {
                        debug!("Role storage closed, keeping last role list");
                        roles_open = false;
                    }
                },
                _ = navigation.tick() => self.check_navigation(Instant::now()),
                _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                    self.on_timer(Instant::now());
                }
            }
        }

        debug!("Page closed, tearing down");
        self.session.reset(self.page.as_ref());
        self.phase = Phase::Idle { resume_at: None };
        self
    }

    /// Load the role list; a storage failure means no roles.
    pub async fn load_roles(&mut self) {
        let roles = match self.store.get_all().await {
            Ok(roles) => roles,
            Err(e) => {
                warn!(error = %e, "Could not read roles, continuing with none");
                Vec::new()
            }
        };
        self.set_roles(roles);
    }

    /// Begin work on the page as it is at `now`.
    pub fn start(&mut self, now: Instant) {
        self.session.url = self.page.url();
        self.activate(now);
    }

    /// Detect the platform and, if supported, start searching immediately.
    fn activate(&mut self, now: Instant) {
        let Some(platform) = detect_platform(&self.page.hostname()) else {
            debug!(url = %self.session.url, "Page is not a supported chat platform");
            self.phase = Phase::Idle { resume_at: None };
            return;
        };

        info!(platform = platform.name, url = %self.session.url, "Chat platform detected");
        self.session.platform = Some(platform);
        self.publish(DomainEvent::PlatformDetected {
            platform: platform.name.to_string(),
            url: self.session.url.clone(),
            timestamp: Utc::now(),
        });

        self.phase = Phase::Searching {
            deadline: now + self.settings.search_timeout,
            next_poll: now,
            attempts: 0,
        };
        self.poll(now);
    }

    /// One look for the prompt input.
    fn poll(&mut self, now: Instant) {
        let Phase::Searching {
            deadline, attempts, ..
        } = self.phase
        else {
            return;
        };
        let Some(platform) = self.session.platform else {
            self.phase = Phase::Idle { resume_at: None };
            return;
        };
        let attempts = attempts + 1;

        if let Some(input) = self.page.query_selector(platform.input_selector) {
            debug!(platform = platform.name, input = %input, attempts, "Prompt input located");
            self.session.input = Some(input);
            self.phase = Phase::Ready;
            self.publish(DomainEvent::InputLocated {
                platform: platform.name.to_string(),
                attempts,
                timestamp: Utc::now(),
            });
            self.sync_button();
            return;
        }

        if now >= deadline {
            info!(
                platform = platform.name,
                attempts, "Prompt input not found before timeout, staying idle"
            );
            self.phase = Phase::Idle { resume_at: None };
            self.publish(DomainEvent::SearchTimedOut {
                platform: platform.name.to_string(),
                attempts,
                timestamp: Utc::now(),
            });
            return;
        }

        self.phase = Phase::Searching {
            deadline,
            next_poll: (now + self.settings.poll_interval).min(deadline),
            attempts,
        };
    }

    /// When the engine next needs a timer callback, if at all.
    pub fn next_wakeup(&self) -> Option<Instant> {
        match self.phase {
            Phase::Searching { next_poll, .. } => Some(next_poll),
            Phase::Idle { resume_at } => resume_at,
            Phase::Ready | Phase::Injected => None,
        }
    }

    /// Fire whatever timer is due at `now`.
    pub fn on_timer(&mut self, now: Instant) {
        match self.phase {
            Phase::Searching { next_poll, .. } if now >= next_poll => self.poll(now),
            Phase::Idle {
                resume_at: Some(resume_at),
            } if now >= resume_at => self.activate(now),
            _ => {}
        }
    }

    /// Navigation watch: react to URL changes and a vanished input.
    pub fn check_navigation(&mut self, now: Instant) {
        let url = self.page.url();
        if url != self.session.url {
            info!(from = %self.session.url, to = %url, "Navigation observed");
            self.publish(DomainEvent::NavigationObserved {
                from: self.session.url.clone(),
                to: url.clone(),
                timestamp: Utc::now(),
            });
            self.session.reset(self.page.as_ref());
            self.session.url = url;
            self.phase = Phase::Idle {
                resume_at: Some(now + self.settings.settle_delay),
            };
            return;
        }

        let (Phase::Ready | Phase::Injected, Some(input)) = (self.phase, self.session.input) else {
            return;
        };
        if !self.page.is_connected(input) {
            debug!(input = %input, "Prompt input left the document, searching again");
            self.session.reset(self.page.as_ref());
            self.activate(now);
            return;
        }

        // The host page may re-render around a live input and drop our button
        if let Some(button) = self.session.button {
            if !self.page.is_connected(button) {
                debug!(button = %button, "Selector button left the document, mounting again");
                self.session.menu.close();
                self.session.button = None;
                self.sync_button();
            }
        }
    }

    /// Replace the role list and reconcile the mounted UI with it.
    pub fn set_roles(&mut self, roles: Vec<Role>) {
        debug!(count = roles.len(), "Role list updated");
        self.publish(DomainEvent::RolesUpdated {
            count: roles.len(),
            timestamp: Utc::now(),
        });
        self.session.menu.update(&roles);
        self.roles = roles;
        self.sync_button();
    }

    /// Mount the button when there is an input and something to offer;
    /// remove it when the role list empties.
    fn sync_button(&mut self) {
        let Some(input) = self.session.input else {
            return;
        };

        match (self.session.button, self.roles.is_empty()) {
            (Some(button), true) => {
                debug!("No roles left, removing selector button");
                self.session.menu.close();
                self.page.remove(button);
                self.session.button = None;
            }
            (None, false) => match self.page.mount_selector(input) {
                Ok(button) => {
                    debug!(button = %button, "Selector button mounted");
                    self.session.button = Some(button);
                }
                Err(e) => warn!(error = %e, "Could not mount selector button"),
            },
            (Some(_), false) => {
                if self.session.menu.is_open() {
                    self.render_menu();
                }
            }
            (None, true) => {}
        }
    }

    fn render_menu(&mut self) {
        let Some(button) = self.session.button else {
            return;
        };
        if let Err(e) = self.session.menu.render(self.page.as_ref(), button) {
            warn!(error = %e, "Could not render role menu");
        }
    }

    pub fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::ButtonActivated => {
                if self.session.button_mounted() {
                    self.session.menu.toggle();
                    self.render_menu();
                }
            }
            UiEvent::OutsideClick => {
                if self.session.menu.close() {
                    self.render_menu();
                }
            }
            UiEvent::RoleChosen(id) => {
                self.inject(&id);
            }
        }
    }

    /// Merge the chosen role into the input. Returns whether text was written.
    pub fn inject(&mut self, role_id: &str) -> bool {
        let chosen = self.session.menu.choose(&self.roles, role_id).cloned();
        self.render_menu();

        if !matches!(self.phase, Phase::Ready) {
            debug!(role_id = %role_id, state = %self.state(), "Ignoring role choice outside ready state");
            return false;
        }
        let (Some(platform), Some(input)) = (self.session.platform, self.session.input) else {
            return false;
        };
        let Some(role) = chosen else {
            warn!(role_id = %role_id, "Chosen role is no longer available");
            return false;
        };

        let text = format_role(&role);
        self.phase = Phase::Injected;
        let written = match apply_merge(self.page.as_ref(), input, platform.editing_mode, &text) {
            Ok(_) => {
                info!(role_id = %role.id, platform = platform.name, "Role injected");
                self.publish(DomainEvent::RoleInjected {
                    role_id: role.id.clone(),
                    platform: platform.name.to_string(),
                    timestamp: Utc::now(),
                });
                true
            }
            Err(e) => {
                warn!(role_id = %role.id, error = %e, "Could not write role into prompt input");
                false
            }
        };
        self.phase = Phase::Ready;
        written
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedPage;
    use rolecast_core::page::{EditingMode, MenuItem, SyntheticEvent};
    use rolecast_core::role::RoleDraft;
    use rolecast_prompt::TASK_PLACEHOLDER;
    use rolecast_core::storage::StorageArea;
    use rolecast_store::{FileArea, KvRoleStore, MemoryArea};

    const CHATGPT_INPUT: &str = "#prompt-textarea";
    const DEEPSEEK_INPUT: &str = "textarea#chat-input";

    fn role(id: &str, name: &str, area: &str) -> Role {
        RoleDraft::named(name)
            .with_area(area)
            .into_role(id.into(), Utc::now(), Utc::now())
    }

    fn store() -> Arc<KvRoleStore> {
        Arc::new(KvRoleStore::new(Arc::new(MemoryArea::new()), "roles"))
    }

    fn engine_for(page: &Arc<SimulatedPage>, roles: Vec<Role>) -> InjectionEngine {
        let mut engine = InjectionEngine::new(page.clone(), store(), EngineSettings::default());
        engine.set_roles(roles);
        engine
    }

    #[test]
    fn unsupported_host_stays_idle() {
        let page = Arc::new(SimulatedPage::new("https://example.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);

        engine.start(Instant::now());

        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.session().platform.is_none());
        assert!(engine.next_wakeup().is_none());
        assert!(page.mounted_buttons().is_empty());
    }

    #[test]
    fn input_present_at_start_is_ready_immediately() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let input = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);

        engine.start(Instant::now());

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.session().input, Some(input));
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn input_appearing_later_is_found_by_polling() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();

        engine.start(t0);
        assert_eq!(engine.state(), EngineState::Searching);
        assert_eq!(engine.next_wakeup(), Some(t0 + Duration::from_secs(1)));

        engine.on_timer(t0 + Duration::from_secs(1));
        assert_eq!(engine.state(), EngineState::Searching);

        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        engine.on_timer(t0 + Duration::from_secs(2));
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn search_gives_up_after_timeout() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();
        let mut engine = engine_for(&page, vec![role("a", "A", "")]).with_event_bus(bus);
        let t0 = Instant::now();

        engine.start(t0);
        while let Some(wake) = engine.next_wakeup() {
            engine.on_timer(wake);
        }

        assert_eq!(engine.state(), EngineState::Idle);
        assert!(page.mounted_buttons().is_empty());

        let mut timed_out = None;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::SearchTimedOut { attempts, .. } = event.as_ref() {
                timed_out = Some(*attempts);
            }
        }
        // Polls at 0s, 1s, ..., 30s
        assert_eq!(timed_out, Some(31));

        // Late-arriving input is ignored until the next navigation
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        engine.on_timer(t0 + Duration::from_secs(60));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn empty_role_list_mounts_no_button_until_first_save() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![]);

        engine.start(Instant::now());
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(page.mounted_buttons().is_empty());

        engine.set_roles(vec![role("a", "A", "")]);
        assert_eq!(page.mounted_buttons().len(), 1);

        engine.set_roles(vec![]);
        assert!(page.mounted_buttons().is_empty());
        assert!(!engine.session().button_mounted());
    }

    #[test]
    fn navigation_tears_down_and_resumes_after_settle() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);
        assert_eq!(page.mounted_buttons().len(), 1);

        // Same URL: nothing happens
        engine.check_navigation(t0);
        assert_eq!(engine.state(), EngineState::Ready);

        page.navigate("https://chatgpt.com/c/123");
        let t1 = t0 + Duration::from_secs(5);
        engine.check_navigation(t1);

        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.session().input.is_none());
        assert!(page.mounted_buttons().is_empty());
        assert_eq!(engine.next_wakeup(), Some(t1 + Duration::from_secs(1)));

        engine.on_timer(t1 + Duration::from_millis(500));
        assert_eq!(engine.state(), EngineState::Idle);

        engine.on_timer(t1 + Duration::from_secs(1));
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.session().url, "https://chatgpt.com/c/123");
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn navigation_while_searching_restarts_the_search() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);
        engine.on_timer(t0 + Duration::from_secs(1));
        assert_eq!(engine.state(), EngineState::Searching);

        page.navigate("https://chatgpt.com/c/9");
        let t1 = t0 + Duration::from_secs(20);
        engine.check_navigation(t1);

        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.next_wakeup(), Some(t1 + Duration::from_secs(1)));

        engine.on_timer(t1 + Duration::from_secs(1));
        assert_eq!(engine.state(), EngineState::Searching);

        // Well past the first search's deadline, the new one is still running
        let horizon = t0 + Duration::from_secs(40);
        while let Some(wake) = engine.next_wakeup().filter(|wake| *wake <= horizon) {
            engine.on_timer(wake);
        }
        assert_eq!(engine.state(), EngineState::Searching);

        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let wake = engine.next_wakeup().unwrap();
        engine.on_timer(wake);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn navigation_to_unsupported_host_goes_inert() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);

        page.navigate("https://example.com/");
        engine.check_navigation(t0);
        engine.on_timer(t0 + Duration::from_secs(1));

        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.next_wakeup().is_none());
        assert!(page.mounted_buttons().is_empty());
    }

    #[test]
    fn replaced_input_is_found_again() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let old = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);

        page.detach(old);
        let new = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        engine.check_navigation(t0 + Duration::from_millis(500));

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.session().input, Some(new));
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn removed_button_is_mounted_again() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let input = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);
        let old = page.mounted_buttons()[0];
        engine.handle_ui(UiEvent::ButtonActivated);

        page.detach(old);
        engine.check_navigation(t0 + Duration::from_millis(500));

        let buttons = page.mounted_buttons();
        assert_eq!(buttons.len(), 1);
        assert_ne!(buttons[0], old);
        assert_eq!(engine.session().button, Some(buttons[0]));
        assert_eq!(engine.session().input, Some(input));
        assert_eq!(engine.state(), EngineState::Ready);

        // The fresh button opens the menu on its first activation
        engine.handle_ui(UiEvent::ButtonActivated);
        assert!(page.open_menu().is_some());
    }

    #[tokio::test]
    async fn unreadable_storage_means_no_roles_until_a_push() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::create_dir(&path).unwrap();
        let area: Arc<dyn StorageArea> = Arc::new(FileArea::new(path.clone()));
        let engine_store = Arc::new(KvRoleStore::new(area.clone(), "roles"));
        let editor = KvRoleStore::new(area, "roles");
        let mut updates = engine_store.subscribe();

        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine =
            InjectionEngine::new(page.clone(), engine_store, EngineSettings::default());
        engine.load_roles().await;
        engine.start(Instant::now());

        assert_eq!(engine.state(), EngineState::Ready);
        assert!(engine.roles().is_empty());
        assert!(page.mounted_buttons().is_empty());

        // Storage recovers and the editor saves a role
        std::fs::remove_dir(&path).unwrap();
        let saved = editor.save(RoleDraft::named("Reviewer")).await.unwrap();
        engine.set_roles(updates.next().await.unwrap());

        assert_eq!(engine.roles(), [saved].as_slice());
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn button_toggles_grouped_menu_and_outside_click_closes() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(
            &page,
            vec![role("a", "A", "Eng"), role("b", "B", ""), role("c", "C", "Eng")],
        );
        engine.start(Instant::now());

        engine.handle_ui(UiEvent::ButtonActivated);
        let menu = page.open_menu().unwrap();
        assert_eq!(
            menu,
            vec![
                MenuItem::Role { id: "b".into(), label: "B".into() },
                MenuItem::Header { label: "Eng".into() },
                MenuItem::Role { id: "a".into(), label: "A".into() },
                MenuItem::Role { id: "c".into(), label: "C".into() },
            ]
        );

        engine.handle_ui(UiEvent::OutsideClick);
        assert!(page.open_menu().is_none());

        engine.handle_ui(UiEvent::ButtonActivated);
        engine.handle_ui(UiEvent::ButtonActivated);
        assert!(page.open_menu().is_none());
    }

    #[test]
    fn choosing_role_merges_into_content_editable() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let input =
            page.insert_input_with(CHATGPT_INPUT, EditingMode::ContentEditable, "Hello there");
        let mut engine = engine_for(&page, vec![role("a", "Analyst", "")]);
        engine.start(Instant::now());

        engine.handle_ui(UiEvent::ButtonActivated);
        engine.handle_ui(UiEvent::RoleChosen("a".into()));

        assert_eq!(engine.state(), EngineState::Ready);
        assert!(page.open_menu().is_none());
        assert_eq!(
            page.inner_html(input),
            format!("<p>Hello there</p><p>Role: Analyst</p><p>{TASK_PLACEHOLDER}</p>")
        );
        assert_eq!(page.events(input), vec![SyntheticEvent::Input]);
        assert!(page.caret_at_end(input));
        assert_eq!(page.focused(), Some(input));

        // Repeated injection stays available
        assert!(engine.inject("a"));
        assert_eq!(page.events(input).len(), 2);
        assert_eq!(page.mounted_buttons().len(), 1);
    }

    #[test]
    fn choosing_role_merges_into_plain_field() {
        let page = Arc::new(SimulatedPage::new("https://chat.deepseek.com/"));
        let input = page.insert_input_with(DEEPSEEK_INPUT, EditingMode::PlainField, "draft");
        let mut engine = engine_for(&page, vec![role("a", "Analyst", "")]);
        engine.start(Instant::now());

        assert!(engine.inject("a"));

        assert_eq!(
            page.input_text(input),
            format!("draft\n\nRole: Analyst\n\n{TASK_PLACEHOLDER}")
        );
        assert_eq!(
            page.events(input),
            vec![SyntheticEvent::Input, SyntheticEvent::Change]
        );
        assert!(page.caret_at_end(input));
    }

    #[test]
    fn unknown_role_or_wrong_state_writes_nothing() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        let t0 = Instant::now();
        engine.start(t0);

        // Still searching
        assert!(!engine.inject("a"));

        let input = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        engine.on_timer(t0 + Duration::from_secs(1));
        assert!(!engine.inject("zzz"));
        assert!(page.events(input).is_empty());
    }

    #[test]
    fn detached_input_during_inject_does_not_panic() {
        let page = Arc::new(SimulatedPage::new("https://chatgpt.com/"));
        let input = page.insert_input(CHATGPT_INPUT, EditingMode::ContentEditable);
        let mut engine = engine_for(&page, vec![role("a", "A", "")]);
        engine.start(Instant::now());

        page.detach(input);
        assert!(!engine.inject("a"));
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_end_to_end() {
        let page = Arc::new(SimulatedPage::new("https://claude.ai/new"));
        let area = MemoryArea::new();
        let engine_store = Arc::new(KvRoleStore::new(Arc::new(area.clone()), "roles"));
        let editor_store = KvRoleStore::new(Arc::new(area), "roles");

        let (tx, rx) = mpsc::channel(8);
        let engine = InjectionEngine::new(page.clone(), engine_store, EngineSettings::default());
        let handle = tokio::spawn(engine.run(rx));

        // Input shows up three seconds in; no roles yet so no button
        tokio::time::sleep(Duration::from_secs(3)).await;
        let input = page.insert_input(
            "div.ProseMirror[contenteditable=\"true\"]",
            EditingMode::ContentEditable,
        );
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(page.mounted_buttons().is_empty());

        // A save from the editor context mounts the button
        let saved = editor_store
            .save(RoleDraft::named("Reviewer").with_area("Eng"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(page.mounted_buttons().len(), 1);

        tx.send(UiEvent::ButtonActivated).await.unwrap();
        tx.send(UiEvent::RoleChosen(saved.id.clone())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(page.input_text(input).starts_with("Role: Reviewer"));

        // SPA navigation: UI removed, then rebuilt after the settle delay
        page.navigate("https://claude.ai/chat/42");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(page.mounted_buttons().is_empty());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(page.mounted_buttons().len(), 1);

        drop(tx);
        let engine = handle.await.unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(page.mounted_buttons().is_empty());
    }
}
