//! Session state for one interactive message.
//!
//! A [`Session`] is a plain value. Every transition is a synchronous method
//! that reads and writes the current state, so the controller can apply
//! events against whatever state is current when it gets the lock.

use crate::view::{ControlDescriptor, ControlStyle, PartialView, Reply, View};
use std::collections::BTreeMap;
use thiserror::Error;

pub const MAIN_PAGE: &str = "main";
pub const PAGER_PREV: &str = "pager:prev";
pub const PAGER_NEXT: &str = "pager:next";

/// Why lazily loaded page content is unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Nothing to show")]
    Empty,

    #[error("{0}")]
    Failed(String),
}

/// Content of a lazily loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazySlot {
    NotFetched,
    InFlight,
    Ready(PartialView),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Eager(PartialView),
    Lazy(LazySlot),
}

/// A button switching between `main` and one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleControl {
    pub id: String,
    pub page: String,
    pub show_label: String,
    pub hide_label: String,
    pub unavailable_label: String,
    pub active: bool,
    /// Set for good once the page's content turns out to be unavailable.
    pub disabled: bool,
}

impl ToggleControl {
    pub fn new(id: impl Into<String>, page: impl Into<String>, noun: &str) -> Self {
        Self {
            id: id.into(),
            page: page.into(),
            show_label: format!("Show {}", noun),
            hide_label: format!("Hide {}", noun),
            unavailable_label: format!("{} Unavailable", noun),
            active: false,
            disabled: false,
        }
    }

    pub fn label(&self) -> &str {
        if self.disabled {
            &self.unavailable_label
        } else if self.active {
            &self.hide_label
        } else {
            &self.show_label
        }
    }

    fn descriptor(&self) -> ControlDescriptor {
        let style = if self.active {
            ControlStyle::Primary
        } else {
            ControlStyle::Secondary
        };
        ControlDescriptor::button(&self.id, self.label(), style).disabled(self.disabled)
    }
}

/// Long text shown one page at a time on a session page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedText {
    pub page: String,
    pub pages: Vec<String>,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerStep {
    Prev,
    Next,
}

/// Result of applying a toggle to the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The current page changed.
    Switched { page: String },
    /// The target page has to be loaded first.
    NeedsLoad { page: String },
    /// The target page is already being loaded.
    Loading,
    /// Unknown or disabled control.
    Ignored,
}

/// Ticket for a claimed lazy load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub page: String,
    /// Session revision when the load was claimed.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Content stored and the page is now showing.
    Shown,
    /// Content stored, but the user moved on while it loaded.
    Stored,
    /// Content unavailable, controls for the page disabled.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    invoker: String,
    base: View,
    pages: BTreeMap<String, PageContent>,
    current_page: String,
    controls: Vec<ToggleControl>,
    extra_rows: Vec<Vec<ControlDescriptor>>,
    paged_text: Option<PagedText>,
    /// Bumped on every accepted transition.
    revision: u64,
}

impl Session {
    pub fn new(invoker: impl Into<String>, base: View, main: PartialView) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(MAIN_PAGE.to_string(), PageContent::Eager(main));
        Self {
            invoker: invoker.into(),
            base,
            pages,
            current_page: MAIN_PAGE.to_string(),
            controls: Vec::new(),
            extra_rows: Vec::new(),
            paged_text: None,
            revision: 0,
        }
    }

    pub fn with_page(mut self, name: impl Into<String>, content: PartialView) -> Self {
        self.pages.insert(name.into(), PageContent::Eager(content));
        self
    }

    pub fn with_lazy_page(mut self, name: impl Into<String>) -> Self {
        self.pages
            .insert(name.into(), PageContent::Lazy(LazySlot::NotFetched));
        self
    }

    pub fn with_control(mut self, control: ToggleControl) -> Self {
        self.controls.push(control);
        self
    }

    /// A static row rendered after the toggle row, e.g. link buttons.
    pub fn with_row(mut self, row: Vec<ControlDescriptor>) -> Self {
        self.extra_rows.push(row);
        self
    }

    /// Page `page` through `pages`. Single-page text gets no pager.
    pub fn with_paged_text(mut self, page: impl Into<String>, pages: Vec<String>) -> Self {
        self.paged_text = Some(PagedText {
            page: page.into(),
            pages,
            index: 0,
        });
        self
    }

    pub fn invoker(&self) -> &str {
        &self.invoker
    }

    pub fn is_authorized(&self, actor: &str) -> bool {
        actor == self.invoker
    }

    pub fn current_page(&self) -> &str {
        &self.current_page
    }

    pub fn controls(&self) -> &[ToggleControl] {
        &self.controls
    }

    pub fn control(&self, id: &str) -> Option<&ToggleControl> {
        self.controls.iter().find(|c| c.id == id)
    }

    pub fn page(&self, name: &str) -> Option<&PageContent> {
        self.pages.get(name)
    }

    pub fn paged_text(&self) -> Option<&PagedText> {
        self.paged_text.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn show(&mut self, page: &str) {
        self.current_page = page.to_string();
        for control in &mut self.controls {
            control.active = page != MAIN_PAGE && control.page == page;
        }
        self.revision += 1;
    }

    /// Apply a press of toggle control `id`.
    pub fn toggle(&mut self, id: &str) -> Transition {
        let Some(control) = self.control(id) else {
            return Transition::Ignored;
        };
        if control.disabled {
            return Transition::Ignored;
        }
        let page = control.page.clone();

        if self.current_page == page {
            self.show(MAIN_PAGE);
            return Transition::Switched {
                page: MAIN_PAGE.into(),
            };
        }

        match self.pages.get(&page) {
            Some(PageContent::Eager(_)) | Some(PageContent::Lazy(LazySlot::Ready(_))) => {
                self.show(&page);
                Transition::Switched { page }
            }
            Some(PageContent::Lazy(LazySlot::NotFetched)) => Transition::NeedsLoad { page },
            Some(PageContent::Lazy(LazySlot::InFlight)) => Transition::Loading,
            Some(PageContent::Lazy(LazySlot::Unavailable)) | None => Transition::Ignored,
        }
    }

    /// Claim the load of a lazy page. Returns `None` unless it was never fetched.
    pub fn begin_load(&mut self, page: &str) -> Option<LoadTicket> {
        match self.pages.get_mut(page) {
            Some(PageContent::Lazy(slot)) if *slot == LazySlot::NotFetched => {
                *slot = LazySlot::InFlight;
                Some(LoadTicket {
                    page: page.to_string(),
                    revision: self.revision,
                })
            }
            _ => None,
        }
    }

    /// Record the result of a claimed load.
    ///
    /// The page is shown only if nothing else happened while it loaded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<PartialView, LoadError>,
    ) -> LoadOutcome {
        let Some(PageContent::Lazy(slot)) = self.pages.get_mut(&ticket.page) else {
            return LoadOutcome::Unavailable;
        };

        match result {
            Ok(content) => {
                *slot = LazySlot::Ready(content);
                if self.revision == ticket.revision {
                    self.show(&ticket.page);
                    LoadOutcome::Shown
                } else {
                    LoadOutcome::Stored
                }
            }
            Err(_) => {
                *slot = LazySlot::Unavailable;
                for control in self.controls.iter_mut().filter(|c| c.page == ticket.page) {
                    control.disabled = true;
                    control.active = false;
                }
                self.revision += 1;
                LoadOutcome::Unavailable
            }
        }
    }

    /// Move the pager, clamped to the first and last page. Returns whether
    /// anything changed.
    pub fn pager_step(&mut self, step: PagerStep) -> bool {
        let Some(paged) = self.paged_text.as_mut() else {
            return false;
        };
        if paged.page != self.current_page || paged.pages.is_empty() {
            return false;
        }

        let last = paged.pages.len() - 1;
        let next = match step {
            PagerStep::Prev => paged.index.saturating_sub(1),
            PagerStep::Next => (paged.index + 1).min(last),
        };
        if next == paged.index {
            return false;
        }
        paged.index = next;
        self.revision += 1;
        true
    }

    fn current_content(&self) -> Option<&PartialView> {
        match self.pages.get(&self.current_page)? {
            PageContent::Eager(content) | PageContent::Lazy(LazySlot::Ready(content)) => {
                Some(content)
            }
            PageContent::Lazy(_) => None,
        }
    }

    /// Base view merged with the current page, plus every control row.
    pub fn render(&self) -> Reply {
        let mut view = match self.current_content() {
            Some(content) => self.base.merge(content),
            None => self.base.clone(),
        };

        let mut pager_row = Vec::new();
        if let Some(paged) = self.paged_text.as_ref() {
            if paged.page == self.current_page {
                if let Some(text) = paged.pages.get(paged.index) {
                    view.description = Some(text.clone());
                }
                if paged.pages.len() > 1 {
                    let last = paged.pages.len() - 1;
                    pager_row = vec![
                        ControlDescriptor::button(PAGER_PREV, "◀", ControlStyle::Secondary)
                            .disabled(paged.index == 0),
                        ControlDescriptor::button(
                            "pager:position",
                            format!("{}/{}", paged.index + 1, paged.pages.len()),
                            ControlStyle::Secondary,
                        )
                        .disabled(true),
                        ControlDescriptor::button(PAGER_NEXT, "▶", ControlStyle::Secondary)
                            .disabled(paged.index == last),
                    ];
                }
            }
        }

        let toggles = self.controls.iter().map(ToggleControl::descriptor).collect();
        let mut reply = Reply::view(view).with_row(toggles).with_row(pager_row);
        for row in &self.extra_rows {
            reply = reply.with_row(row.clone());
        }
        reply
    }
}
