//! Interactive message sessions.
//!
//! A command that wants buttons builds a [`Session`] (base view, pages and
//! toggle controls), wraps it in a [`SessionController`] and registers it in
//! the [`ComponentRegistry`] under the message's scope id. Presses are then
//! routed back to the controller, which applies them to the session and
//! re-renders through a [`Surface`].

pub mod controller;
pub mod registry;
pub mod session;
pub mod split;
pub mod view;

pub use controller::{
    ComponentEvent, ComponentHandler, LazyLoader, Outcome, RenderError, SessionController,
    Surface, UNAUTHORIZED_NOTICE,
};
pub use registry::ComponentRegistry;
pub use session::{
    LazySlot, LoadError, PageContent, PagedText, PagerStep, Session, ToggleControl, Transition,
    MAIN_PAGE,
};
pub use split::{cutoff_text, split_message, SplitError, SplitOptions};
pub use view::{
    parse_scoped_id, scoped_id, Author, ControlDescriptor, ControlKind, ControlStyle, Field,
    PartialView, Reply, SelectChoice, View,
};
