//! `rolecast simulate`: run the injection engine against an in-memory page.
//!
//! The page starts empty; the platform's input appears after `delay_ms`,
//! holding `existing` text. Once the engine has mounted its selector, the
//! role is chosen through the same UI event channel a real page would use.

use rolecast_core::error::{Error, MessagingError};
use rolecast_core::event::{DomainEvent, EventBus};
use rolecast_core::messaging::ExtensionRequest;
use rolecast_core::page::{Page, UiEvent};
use rolecast_core::storage::RoleStore;
use rolecast_inject::{EngineSettings, InjectionEngine, SimulatedPage};
use rolecast_platforms::detect_platform;
use rolecast_store::spawn_role_responder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use super::{load_config, open_store};

/// What the simulated page looked like afterwards.
#[derive(Debug)]
pub(crate) struct SimulationOutcome {
    pub platform: &'static str,
    pub injected: bool,
    pub input_text: String,
}

pub async fn run(
    url: &str,
    role_id: &str,
    existing: Option<&str>,
    delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store: Arc<dyn RoleStore> = Arc::new(open_store(&config));
    let settings = EngineSettings::from(&config.engine);

    let outcome = simulate(
        store,
        settings,
        url,
        role_id,
        existing.unwrap_or_default(),
        Duration::from_millis(delay_ms),
    )
    .await?;

    println!("Platform: {}", outcome.platform);
    if outcome.injected {
        println!("Input content:\n");
        println!("{}", outcome.input_text);
    } else {
        println!("Nothing was injected.");
    }
    Ok(())
}

pub(crate) async fn simulate(
    store: Arc<dyn RoleStore>,
    settings: EngineSettings,
    url: &str,
    role_id: &str,
    existing: &str,
    delay: Duration,
) -> rolecast_core::Result<SimulationOutcome> {
    let page = Arc::new(SimulatedPage::new(url));
    let platform = detect_platform(&page.hostname()).ok_or_else(|| Error::UnsupportedPage {
        url: url.to_string(),
    })?;

    // The page context only learns about roles by asking
    let (requester, _responder) = spawn_role_responder(store.clone());
    let roles = requester
        .request(ExtensionRequest::GetRoles)
        .await?
        .into_roles();
    drop(requester);
    if !roles.iter().any(|role| role.id == role_id) {
        return Err(Error::RoleNotFound {
            id: role_id.to_string(),
        });
    }

    let bus = Arc::new(EventBus::new(64));
    let mut events = bus.subscribe();
    let (ui_tx, ui_rx) = mpsc::channel(8);
    let engine = InjectionEngine::new(page.clone(), store, settings.clone()).with_event_bus(bus);
    let search_window = settings.search_timeout + delay + settings.poll_interval;

    let host = page.clone();
    let drive = async move {
        let insert = async {
            tokio::time::sleep(delay).await;
            host.insert_input_with(platform.input_selector, platform.editing_mode, existing)
        };
        let located = wait_for(&mut events, search_window, |event| match event {
            DomainEvent::InputLocated { .. } => Some(true),
            DomainEvent::SearchTimedOut { .. } => Some(false),
            _ => None,
        });
        let (input, located) = tokio::join!(insert, located);

        let mut injected = false;
        if located.unwrap_or(false) {
            for event in [
                UiEvent::ButtonActivated,
                UiEvent::RoleChosen(role_id.to_string()),
            ] {
                ui_tx
                    .send(event)
                    .await
                    .map_err(|_| MessagingError::Closed)?;
            }
            injected = wait_for(&mut events, Duration::from_secs(1), |event| {
                matches!(event, DomainEvent::RoleInjected { .. }).then_some(true)
            })
            .await
            .unwrap_or(false);
        }

        // Closing the UI channel ends the engine's run loop
        drop(ui_tx);
        Ok::<_, Error>((input, injected))
    };

    let (_engine, driven) = tokio::join!(engine.run(ui_rx), drive);
    let (input, injected) = driven?;

    Ok(SimulationOutcome {
        platform: platform.name,
        injected,
        input_text: page.text_content(input)?,
    })
}

/// Wait for the first event `pick` recognizes.
async fn wait_for<T>(
    events: &mut broadcast::Receiver<Arc<DomainEvent>>,
    within: Duration,
    mut pick: impl FnMut(&DomainEvent) -> Option<T>,
) -> Option<T> {
    let search = async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(found) = pick(&event) {
                        return Some(found);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(within, search).await.ok().flatten()
}
