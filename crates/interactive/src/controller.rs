//! Event handling for live interactive messages.

use crate::session::{LoadError, LoadOutcome, PagerStep, Session, Transition, PAGER_NEXT, PAGER_PREV};
use crate::view::{PartialView, Reply};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Notice sent to anyone but the invoker who presses a control.
pub const UNAUTHORIZED_NOTICE: &str = "Only the user who invoked this command can use the controls!";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Render failed: {0}")]
pub struct RenderError(pub String);

/// Where a session's message lives. Sends edits and ephemeral notices.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Replace the message the control belongs to.
    async fn update(&self, reply: Reply) -> Result<(), RenderError>;

    /// Show `text` to the acting user only.
    async fn notice(&self, text: &str) -> Result<(), RenderError>;
}

/// Loads the content of one lazy page.
#[async_trait]
pub trait LazyLoader: Send + Sync {
    async fn load(&self) -> Result<PartialView, LoadError>;
}

/// A press of a control on a registered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEvent {
    pub session_id: String,
    pub control_id: String,
    pub actor_id: String,
    /// Picked values of a select menu. Empty for buttons.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Acknowledged without any change.
    Acknowledged,
    /// Actor is not allowed to drive the controls.
    Unauthorized,
    /// State changed and the message was re-rendered.
    Rendered,
    /// A lazy page failed to load; its control is now disabled.
    LoadFailed,
}

/// Handler registered for a message's controls.
#[async_trait]
pub trait ComponentHandler: Send + Sync {
    async fn handle(&self, event: &ComponentEvent, surface: &dyn Surface) -> Outcome;
}

/// Drives one [`Session`] from component events.
///
/// The session lock is never held across a load. Renders go through a
/// separate gate and always read the latest state, so the message never
/// goes back to an older state.
pub struct SessionController {
    session: Mutex<Session>,
    loaders: HashMap<String, Arc<dyn LazyLoader>>,
    render_gate: Mutex<()>,
}

impl SessionController {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            loaders: HashMap::new(),
            render_gate: Mutex::new(()),
        }
    }

    pub fn with_loader(mut self, page: impl Into<String>, loader: Arc<dyn LazyLoader>) -> Self {
        self.loaders.insert(page.into(), loader);
        self
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Render the current state.
    pub async fn render(&self) -> Reply {
        self.session.lock().await.render()
    }

    async fn publish(&self, surface: &dyn Surface) {
        let _gate = self.render_gate.lock().await;
        let reply = self.session.lock().await.render();
        if let Err(e) = surface.update(reply).await {
            warn!("Failed to update interactive message: {}", e);
        }
    }

    async fn notify(&self, surface: &dyn Surface, text: &str) {
        if let Err(e) = surface.notice(text).await {
            warn!("Failed to send notice: {}", e);
        }
    }

    async fn load(&self, page: &str, surface: &dyn Surface) -> Outcome {
        let Some(ticket) = self.session.lock().await.begin_load(page) else {
            return Outcome::Acknowledged;
        };

        debug!(page, "Loading lazy page");
        let result = match self.loaders.get(page) {
            Some(loader) => loader.load().await,
            None => Err(LoadError::Failed(format!("no loader for page {}", page))),
        };

        let notice = match &result {
            Err(LoadError::Empty) => Some("There is nothing to show here!".to_string()),
            Err(LoadError::Failed(reason)) => {
                warn!(page, reason = %reason, "Lazy page failed to load");
                Some("That could not be loaded! Try again later!".to_string())
            }
            Ok(_) => None,
        };

        let outcome = self.session.lock().await.finish_load(ticket, result);
        self.publish(surface).await;

        match outcome {
            LoadOutcome::Unavailable => {
                if let Some(text) = notice {
                    self.notify(surface, &text).await;
                }
                Outcome::LoadFailed
            }
            LoadOutcome::Shown | LoadOutcome::Stored => Outcome::Rendered,
        }
    }
}

#[async_trait]
impl ComponentHandler for SessionController {
    async fn handle(&self, event: &ComponentEvent, surface: &dyn Surface) -> Outcome {
        let transition = {
            let mut session = self.session.lock().await;
            if !session.is_authorized(&event.actor_id) {
                None
            } else {
                Some(match event.control_id.as_str() {
                    PAGER_PREV | PAGER_NEXT => {
                        let step = if event.control_id == PAGER_PREV {
                            PagerStep::Prev
                        } else {
                            PagerStep::Next
                        };
                        if session.pager_step(step) {
                            Transition::Switched {
                                page: session.current_page().to_string(),
                            }
                        } else {
                            Transition::Ignored
                        }
                    }
                    control => session.toggle(control),
                })
            }
        };

        match transition {
            None => {
                debug!(actor = %event.actor_id, "Rejected control press from non-invoker");
                self.notify(surface, UNAUTHORIZED_NOTICE).await;
                Outcome::Unauthorized
            }
            Some(Transition::Switched { .. }) => {
                self.publish(surface).await;
                Outcome::Rendered
            }
            Some(Transition::NeedsLoad { page }) => self.load(&page, surface).await,
            Some(Transition::Loading) | Some(Transition::Ignored) => Outcome::Acknowledged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ToggleControl, MAIN_PAGE};
    use crate::view::{Field, View};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingSurface {
        updates: std::sync::Mutex<Vec<Reply>>,
        notices: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingSurface {
        fn updates(&self) -> Vec<Reply> {
            self.updates.lock().unwrap().clone()
        }

        fn notices(&self) -> Vec<String> {
            self.notices.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Surface for RecordingSurface {
        async fn update(&self, reply: Reply) -> Result<(), RenderError> {
            self.updates.lock().unwrap().push(reply);
            Ok(())
        }

        async fn notice(&self, text: &str) -> Result<(), RenderError> {
            self.notices.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Loader that waits for a signal before returning.
    struct GatedLoader {
        calls: AtomicUsize,
        release: Notify,
        result: Result<PartialView, LoadError>,
    }

    impl GatedLoader {
        fn new(result: Result<PartialView, LoadError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                result,
            })
        }
    }

    #[async_trait]
    impl LazyLoader for GatedLoader {
        async fn load(&self) -> Result<PartialView, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            self.result.clone()
        }
    }

    struct InstantLoader(Result<PartialView, LoadError>);

    #[async_trait]
    impl LazyLoader for InstantLoader {
        async fn load(&self) -> Result<PartialView, LoadError> {
            self.0.clone()
        }
    }

    fn session() -> Session {
        Session::new("invoker", View::titled("Gaben"), PartialView::described("main"))
            .with_page("background", PartialView::described("background"))
            .with_lazy_page("aliases")
            .with_control(ToggleControl::new("background", "background", "Background"))
            .with_control(ToggleControl::new("aliases", "aliases", "Aliases"))
    }

    fn press(control: &str, actor: &str) -> ComponentEvent {
        ComponentEvent {
            session_id: "42".into(),
            control_id: control.into(),
            actor_id: actor.into(),
            values: Vec::new(),
        }
    }

    fn aliases_page() -> PartialView {
        PartialView::default().with_field(Field::new("Aliases", "gabe\ngaben"))
    }

    #[tokio::test]
    async fn test_unauthorized_press_changes_nothing() {
        let loader = GatedLoader::new(Ok(aliases_page()));
        let controller = SessionController::new(session()).with_loader("aliases", loader.clone());
        let surface = RecordingSurface::default();
        let before = controller.snapshot().await;

        for control in ["background", "aliases", PAGER_NEXT] {
            let outcome = controller.handle(&press(control, "someone-else"), &surface).await;
            assert_eq!(outcome, Outcome::Unauthorized);
        }

        assert_eq!(controller.snapshot().await, before);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
        assert!(surface.updates().is_empty());
        assert_eq!(surface.notices(), vec![UNAUTHORIZED_NOTICE; 3]);
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let controller = SessionController::new(session())
            .with_loader("aliases", Arc::new(InstantLoader(Ok(aliases_page()))));
        let surface = RecordingSurface::default();

        let outcome = controller.handle(&press("aliases", "invoker"), &surface).await;
        assert_eq!(outcome, Outcome::Rendered);
        let state = controller.snapshot().await;
        assert_eq!(state.current_page(), "aliases");
        assert_eq!(state.control("aliases").unwrap().label(), "Hide Aliases");

        controller.handle(&press("aliases", "invoker"), &surface).await;
        let state = controller.snapshot().await;
        assert_eq!(state.current_page(), MAIN_PAGE);
        assert_eq!(state.control("aliases").unwrap().label(), "Show Aliases");
        assert!(!state.control("aliases").unwrap().active);

        let updates = surface.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].rows[0][1].label, "Hide Aliases");
        assert_eq!(updates[1].rows[0][1].label, "Show Aliases");
    }

    #[tokio::test]
    async fn test_double_press_during_load_fetches_once() {
        let loader = GatedLoader::new(Ok(aliases_page()));
        let controller = Arc::new(
            SessionController::new(session()).with_loader("aliases", loader.clone()),
        );
        let surface = Arc::new(RecordingSurface::default());

        let first = {
            let controller = controller.clone();
            let surface = surface.clone();
            tokio::spawn(async move {
                controller
                    .handle(&press("aliases", "invoker"), surface.as_ref())
                    .await
            })
        };

        // Wait until the first press is inside the loader.
        while loader.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = controller
            .handle(&press("aliases", "invoker"), surface.as_ref())
            .await;
        assert_eq!(second, Outcome::Acknowledged);

        loader.release.notify_one();
        assert_eq!(first.await.unwrap(), Outcome::Rendered);

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.snapshot().await.current_page(), "aliases");
    }

    #[tokio::test]
    async fn test_press_during_load_wins() {
        let loader = GatedLoader::new(Ok(aliases_page()));
        let controller = Arc::new(
            SessionController::new(session()).with_loader("aliases", loader.clone()),
        );
        let surface = Arc::new(RecordingSurface::default());

        let first = {
            let controller = controller.clone();
            let surface = surface.clone();
            tokio::spawn(async move {
                controller
                    .handle(&press("aliases", "invoker"), surface.as_ref())
                    .await
            })
        };
        while loader.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        controller
            .handle(&press("background", "invoker"), surface.as_ref())
            .await;
        loader.release.notify_one();
        first.await.unwrap();

        // The later press stays visible in the final render.
        let state = controller.snapshot().await;
        assert_eq!(state.current_page(), "background");
        let last = surface.updates().pop().unwrap();
        assert_eq!(last.views[0].description.as_deref(), Some("background"));
    }

    #[tokio::test]
    async fn test_failed_load_notifies_once_and_disables() {
        let loader = Arc::new(InstantLoader(Err(LoadError::Failed("503".into()))));
        let controller = SessionController::new(session()).with_loader("aliases", loader);
        let surface = RecordingSurface::default();

        let outcome = controller.handle(&press("aliases", "invoker"), &surface).await;
        assert_eq!(outcome, Outcome::LoadFailed);

        let again = controller.handle(&press("aliases", "invoker"), &surface).await;
        assert_eq!(again, Outcome::Acknowledged);

        assert_eq!(surface.notices().len(), 1);
        let state = controller.snapshot().await;
        assert!(state.control("aliases").unwrap().disabled);
        assert_eq!(state.current_page(), MAIN_PAGE);

        let last = surface.updates().pop().unwrap();
        assert_eq!(last.rows[0][1].label, "Aliases Unavailable");
        assert!(last.rows[0][1].disabled);
    }

    #[tokio::test]
    async fn test_empty_load_disables() {
        let controller = SessionController::new(session())
            .with_loader("aliases", Arc::new(InstantLoader(Err(LoadError::Empty))));
        let surface = RecordingSurface::default();

        assert_eq!(
            controller.handle(&press("aliases", "invoker"), &surface).await,
            Outcome::LoadFailed
        );
        assert_eq!(surface.notices(), vec!["There is nothing to show here!".to_string()]);
    }
}
