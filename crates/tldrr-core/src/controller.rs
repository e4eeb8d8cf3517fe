//! The Controller
//!
//! Owns control attachment for discovered posts and comments, turns clicks
//! into service requests, and runs the result panel, thread modal, floating
//! widget and toolbar. It is sans-IO: a dispatch returns a
//! [`ServiceRequest`] and the host later hands the answer back through
//! [`Controller::complete`]. Timers are advanced through
//! [`Controller::tick`].
//!
//! Per button the state machine is `idle -> busy -> idle`: the button is
//! busy (disabled) from dispatch until its request settles, independent of
//! how long the resulting panel stays open. At most one result panel exists
//! in the document at any time.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::dom::{Dom, DomError};
use crate::observer::PageObserver;
use crate::presentation::{
    self, ModalContent, ToolbarButton, ACTIVE_CLASS, BUTTON_CLASS, CLUSTER_CLASS, MODAL_BODY_CLASS,
    MODAL_CLOSE_CLASS, MODAL_ID, TOOLBAR_BUTTON_CLASS, TOOLBAR_ID, VISIBLE_CLASS, WIDGET_ID,
};
use crate::profile::{HostProfile, Placement};
use crate::selector::Selector;
use crate::settings::{SettingName, Settings, StoredSettings};
use crate::text::{degraded_summary, extract_body_text, ThreadDocument};
use crate::timers::{Clock, TimerId, TimerQueue};
use crate::types::{Action, ElementKind, PanelKind, ServiceResponse};
use crate::widget::ThreadWidget;

/// Shown for a failed non-tldr action that came back without a message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Failed to process. Please check your API key.";
/// Shown in the thread modal when the thread request fails.
pub const THREAD_FAILURE_MESSAGE: &str =
    "Could not generate thread summary. Please ensure your API key is configured.";

const DARK_BACKGROUNDS: [&str; 2] = ["rgb(26, 26, 27)", "rgb(1, 1, 1)"];

// =============================================================================
// Configuration
// =============================================================================

/// Result panel lifecycle durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelTimings {
    /// Delay before the `visible` class is added (lets the CSS transition run)
    pub reveal: Duration,
    /// Wall-clock lifetime of an untouched panel
    pub expire: Duration,
    /// Gap between hiding a panel and detaching it
    pub fade: Duration,
}

impl Default for PanelTimings {
    fn default() -> Self {
        Self {
            reveal: Duration::from_millis(10),
            expire: Duration::from_secs(30),
            fade: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub profile: HostProfile,
    pub timings: PanelTimings,
    /// Render the top-level toolbar at init
    pub toolbar: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            profile: HostProfile::default(),
            timings: PanelTimings::default(),
            toolbar: true,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Correlates a [`ServiceRequest`] with its completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Work for the translation service, produced by a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub ticket: Ticket,
    pub action: Action,
    pub text: String,
}

impl ServiceRequest {
    /// Wire name of the request type.
    pub fn request_type(&self) -> &'static str {
        self.action.as_str()
    }
}

#[derive(Debug)]
enum Origin<E> {
    /// Per-element action from a cluster button
    Element { button: E, action: Action, text: String },
    /// Thread summary from a cluster button or the floating widget
    Thread { button: E, loading_modal: Option<E> },
}

// =============================================================================
// Panels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Reveal(PanelId),
    Expire(PanelId),
    Detach(PanelId),
}

#[derive(Debug)]
struct OpenPanel<E> {
    id: PanelId,
    root: E,
    close: E,
    timers: Vec<TimerId>,
}

// =============================================================================
// Controller
// =============================================================================

pub struct Controller<D: Dom, C: Clock> {
    dom: D,
    clock: C,
    config: ControllerConfig,
    settings: Settings,
    detected_dark: bool,
    observer: PageObserver,
    widget: ThreadWidget<D::Element>,
    toolbar: Option<D::Element>,
    panels: Vec<OpenPanel<D::Element>>,
    modal: Option<D::Element>,
    timers: TimerQueue<TimerEvent>,
    pending: BTreeMap<Ticket, Origin<D::Element>>,
    next_ticket: u64,
    next_panel: u64,
}

impl<D: Dom, C: Clock> Controller<D, C> {
    pub fn new(dom: D, clock: C, config: ControllerConfig) -> Self {
        Self {
            dom,
            clock,
            config,
            settings: Settings::default(),
            detected_dark: false,
            observer: PageObserver::new(),
            widget: ThreadWidget::default(),
            toolbar: None,
            panels: Vec::new(),
            modal: None,
            timers: TimerQueue::default(),
            pending: BTreeMap::new(),
            next_ticket: 0,
            next_panel: 0,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn profile(&self) -> &HostProfile {
        &self.config.profile
    }

    /// Requests dispatched and not yet completed.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Result panels currently attached (zero or one).
    pub fn open_panels(&self) -> usize {
        self.panels.len()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Load settings, render the toolbar and decorate what is already on the page.
    pub fn init(&mut self, stored: &StoredSettings) {
        self.detected_dark = self.detect_dark_mode();
        log::info!("controller: dark mode detected: {}", self.detected_dark);
        self.load_settings(stored);

        if self.config.toolbar {
            if let Err(e) = self.create_toolbar() {
                log::warn!("controller: toolbar not created: {e}");
            }
        }

        let body = self.dom.body();
        let found = self.observer.scan(&self.dom, &self.config.profile, &body);
        for discovered in found {
            self.attach_logged(&discovered.element, discovered.kind);
        }
        self.sync_page_state();
    }

    /// Overwrite settings wholesale after an external update.
    pub fn apply_settings(&mut self, stored: &StoredSettings) {
        self.load_settings(stored);
        self.refresh_toolbar();
    }

    fn load_settings(&mut self, stored: &StoredSettings) {
        self.settings = Settings::from_stored(stored);
        self.settings.dark_mode |= self.detected_dark;
    }

    /// One delivered batch of inserted nodes.
    pub fn on_mutations(&mut self, added: &[D::Element]) {
        let found = self.observer.discover(&self.dom, &self.config.profile, added);
        for discovered in found {
            self.attach_logged(&discovered.element, discovered.kind);
        }
        self.sync_page_state();
    }

    /// Re-evaluate the floating widget and the overlay after a DOM settle.
    pub fn sync_page_state(&mut self) {
        if let Err(e) = self.widget.sync(&mut self.dom, &self.config.profile) {
            log::warn!("controller: thread summarizer sync failed: {e}");
        }
        if let Some(open) = self.observer.overlay_visibility(&self.dom, &self.config.profile) {
            log::debug!("controller: media overlay open: {open}");
            self.widget.set_overlay_open(&mut self.dom, open);
        }
    }

    fn detect_dark_mode(&self) -> bool {
        let body = self.dom.body();
        let html = self.dom.document_element();
        let background = self.dom.background_color(&body);

        self.dom.has_class(&body, "dark")
            || self.dom.has_class(&html, "dark")
            || self.dom.attribute(&body, "data-theme").as_deref() == Some("dark")
            || DARK_BACKGROUNDS.iter().any(|c| background.contains(c))
    }

    // -------------------------------------------------------------------------
    // Attachment
    // -------------------------------------------------------------------------

    fn attach_logged(&mut self, element: &D::Element, kind: ElementKind) {
        if let Err(e) = self.attach_controls(element, kind) {
            log::warn!("controller: failed to decorate {kind:?} {element:?}: {e}");
        }
    }

    /// Attach a control cluster to `element` unless it already carries one.
    ///
    /// Returns `Ok(false)` when the element is already decorated or has no
    /// anchor to attach next to.
    pub fn attach_controls(&mut self, element: &D::Element, kind: ElementKind) -> Result<bool, DomError> {
        if self.has_controls(element) {
            return Ok(false);
        }

        let Some(anchor) = self.own_anchor(element, kind) else {
            log::debug!("controller: no anchor for {kind:?} {element:?}");
            return Ok(false);
        };
        let placement = self.config.profile.anchor_for(kind).placement;

        let cluster = presentation::build_cluster(&mut self.dom, kind.actions())?;
        match placement {
            Placement::After => self.dom.insert_after(&anchor, &cluster)?,
            Placement::Inside => self.dom.append_child(&anchor, &cluster)?,
        }
        self.dom.listen_clicks(&cluster);
        Ok(true)
    }

    /// First anchor in chain order that belongs to `element` itself.
    ///
    /// Anchors inside nested posts or comments are skipped; a cluster placed
    /// there would be owned by the nested element and never satisfy the
    /// marker guard for `element`.
    fn own_anchor(&self, element: &D::Element, kind: ElementKind) -> Option<D::Element> {
        let chain = &self.config.profile.anchor_for(kind).chain;
        chain.selectors().iter().find_map(|selector| {
            self.dom
                .query_all(element, selector)
                .into_iter()
                .find(|anchor| self.owner_of(anchor).as_ref() == Some(element))
        })
    }

    /// Marker guard: a cluster whose owning post or comment is `element`.
    ///
    /// Clusters of nested comments live inside their parent's subtree, so
    /// presence alone is not enough.
    pub fn has_controls(&self, element: &D::Element) -> bool {
        self.dom
            .query_all(element, &Selector::class(CLUSTER_CLASS))
            .iter()
            .any(|cluster| self.owner_of(cluster).as_ref() == Some(element))
    }

    /// Nearest post or comment enclosing `node`.
    fn owner_of(&self, node: &D::Element) -> Option<D::Element> {
        let profile = &self.config.profile;
        let mut current = self.dom.parent(node);
        while let Some(candidate) = current {
            let is_target = [&profile.post, &profile.comment]
                .into_iter()
                .any(|selector| self.dom.matches(&candidate, selector).unwrap_or(false));
            if is_target {
                return Some(candidate);
            }
            current = self.dom.parent(&candidate);
        }
        None
    }

    // -------------------------------------------------------------------------
    // Click routing
    // -------------------------------------------------------------------------

    /// Delegated click handler. `root` is the element the listener was
    /// registered on, `target` the innermost clicked node.
    pub fn handle_click(&mut self, root: &D::Element, target: &D::Element) -> Option<ServiceRequest> {
        if !self.dom.contains(root, target) {
            return None;
        }

        if self.dom.has_class(root, CLUSTER_CLASS) {
            let button = self
                .dom
                .closest(target, &Selector::class(BUTTON_CLASS))
                .filter(|button| self.dom.contains(root, button))?;
            let action = presentation::button_action(&self.dom, &button)?;
            if action.is_page_level() {
                return self.dispatch_thread(&button, false);
            }
            let element = self.owner_of(root)?;
            return self.dispatch_action(&element, action, &button);
        }

        if let Some(idx) = self.panels.iter().position(|p| &p.root == root) {
            let close = self.panels[idx].close.clone();
            if self.dom.contains(&close, target) {
                let id = self.panels[idx].id;
                self.close_panel(id);
            }
            return None;
        }

        match self.dom.attribute(root, "id").as_deref() {
            Some(WIDGET_ID) => {
                let button = self.widget.button(&self.dom)?;
                if self.dom.contains(&button, target) {
                    return self.dispatch_thread(&button, true);
                }
                None
            }
            Some(MODAL_ID) => {
                let on_close = self
                    .dom
                    .closest(target, &Selector::class(MODAL_CLOSE_CLASS))
                    .is_some_and(|close| self.dom.contains(root, &close));
                if on_close || target == root {
                    self.close_modal();
                }
                None
            }
            Some(TOOLBAR_ID) => {
                let button = self.dom.closest(target, &Selector::class(TOOLBAR_BUTTON_CLASS))?;
                let id = self.dom.attribute(&button, "id")?;
                match ToolbarButton::from_id(&id)? {
                    ToolbarButton::Close => self.hide_toolbar(),
                    other => match other.setting() {
                        Some(name) => {
                            self.toggle_setting(name);
                        }
                        None => self.refresh_toolbar(),
                    },
                }
                None
            }
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Start `action` on `element` from `button`.
    ///
    /// Returns `None` when the button is busy. Page-level actions are
    /// redirected to the thread summary regardless of `element`.
    pub fn dispatch_action(&mut self, element: &D::Element, action: Action, button: &D::Element) -> Option<ServiceRequest> {
        if action.is_page_level() {
            return self.dispatch_thread(button, false);
        }
        if self.dom.is_disabled(button) {
            log::debug!("controller: {} ignored, button busy", action.as_str());
            return None;
        }

        self.close_all_panels();
        let text = extract_body_text(&self.dom, &self.config.profile, element);
        presentation::set_busy(&mut self.dom, button, true);

        let ticket = self.next_ticket();
        log::debug!("controller: dispatch {} ({} chars) as {ticket:?}", action.as_str(), text.len());
        self.pending.insert(
            ticket,
            Origin::Element {
                button: button.clone(),
                action,
                text: text.clone(),
            },
        );
        Some(ServiceRequest { ticket, action, text })
    }

    /// Start a thread summary from `button`, optionally behind a loading modal.
    pub fn dispatch_thread(&mut self, button: &D::Element, show_loading: bool) -> Option<ServiceRequest> {
        if self.dom.is_disabled(button) {
            log::debug!("controller: thread summary ignored, button busy");
            return None;
        }

        self.close_all_panels();
        presentation::set_busy(&mut self.dom, button, true);
        let document = ThreadDocument::collect(&self.dom, &self.config.profile);

        let loading_modal = if show_loading {
            self.show_modal(ModalContent::Loading)
        } else {
            None
        };

        let ticket = self.next_ticket();
        log::debug!(
            "controller: dispatch thread summary with {} comments as {ticket:?}",
            document.comments.len()
        );
        self.pending.insert(
            ticket,
            Origin::Thread {
                button: button.clone(),
                loading_modal,
            },
        );
        Some(ServiceRequest {
            ticket,
            action: Action::ThreadTldr,
            text: document.render(),
        })
    }

    fn next_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Settle a request. Answers for buttons that left the document are dropped.
    pub fn complete(&mut self, ticket: Ticket, response: ServiceResponse) {
        let Some(origin) = self.pending.remove(&ticket) else {
            log::warn!("controller: completion for unknown {ticket:?}");
            return;
        };

        match origin {
            Origin::Element { button, action, text } => {
                if !self.dom.is_connected(&button) {
                    log::debug!("controller: dropping {} result, button detached", action.as_str());
                    return;
                }
                presentation::set_busy(&mut self.dom, &button, false);

                let (content, kind) = match response.into_result() {
                    Ok(data) => (data, PanelKind::Result(action)),
                    Err(_) if action == Action::Tldr => {
                        log::info!("controller: tldr failed, showing local summary");
                        (degraded_summary(&text), PanelKind::Result(action))
                    }
                    Err(error) if error.is_empty() => (DEFAULT_ERROR_MESSAGE.to_string(), PanelKind::Error),
                    Err(error) => (error, PanelKind::Error),
                };
                if let Err(e) = self.render_result_panel(&button, &content, kind) {
                    log::warn!("controller: failed to render result panel: {e}");
                }
            }
            Origin::Thread { button, loading_modal } => {
                if !self.dom.is_connected(&button) {
                    log::debug!("controller: dropping thread summary, button detached");
                    if loading_modal.is_some() && self.modal == loading_modal {
                        self.close_modal();
                    }
                    return;
                }
                presentation::set_busy(&mut self.dom, &button, false);

                let summary = match response.into_result() {
                    Ok(data) => data,
                    Err(error) => {
                        log::info!("controller: thread summary failed: {error}");
                        THREAD_FAILURE_MESSAGE.to_string()
                    }
                };
                self.show_modal(ModalContent::Summary(&summary));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Result panels
    // -------------------------------------------------------------------------

    /// Show `content` right after the cluster owning `button`.
    ///
    /// Any other panel is removed first. Returns `Ok(None)` if the button no
    /// longer sits in a cluster.
    pub fn render_result_panel(&mut self, button: &D::Element, content: &str, kind: PanelKind) -> Result<Option<PanelId>, DomError> {
        let Some(cluster) = self.dom.closest(button, &Selector::class(CLUSTER_CLASS)) else {
            return Ok(None);
        };
        self.close_all_panels();

        let parts = presentation::build_panel(&mut self.dom, kind, content, self.settings.dark_mode)?;
        self.dom.insert_after(&cluster, &parts.root)?;
        self.dom.listen_clicks(&parts.root);

        let id = PanelId(self.next_panel);
        self.next_panel += 1;
        let now = self.clock.now_ms();
        let timings = self.config.timings;
        let timers = vec![
            self.timers.schedule(now, timings.reveal, TimerEvent::Reveal(id)),
            self.timers.schedule(now, timings.expire, TimerEvent::Expire(id)),
        ];
        self.panels.push(OpenPanel {
            id,
            root: parts.root,
            close: parts.close,
            timers,
        });
        Ok(Some(id))
    }

    /// Detach every panel immediately, cancelling their timers.
    pub fn close_all_panels(&mut self) {
        for panel in std::mem::take(&mut self.panels) {
            for timer in panel.timers {
                self.timers.cancel(timer);
            }
            self.dom.remove(&panel.root);
        }
    }

    /// Explicit close: hide now, detach after the fade delay.
    pub fn close_panel(&mut self, id: PanelId) {
        let now = self.clock.now_ms();
        let fade = self.config.timings.fade;
        let Some(panel) = self.panels.iter_mut().find(|p| p.id == id) else {
            return;
        };
        for timer in panel.timers.drain(..) {
            self.timers.cancel(timer);
        }
        self.dom.set_class(&panel.root, VISIBLE_CLASS, false);
        panel.timers.push(self.timers.schedule(now, fade, TimerEvent::Detach(id)));
    }

    /// Fire due timers.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        while let Some((timer, event)) = self.timers.pop_due(now) {
            match event {
                TimerEvent::Reveal(id) => {
                    if let Some(panel) = self.panel_mut(id, timer) {
                        let root = panel.root.clone();
                        self.dom.set_class(&root, VISIBLE_CLASS, true);
                    }
                }
                TimerEvent::Expire(id) => {
                    let connected = self
                        .panels
                        .iter()
                        .find(|p| p.id == id)
                        .is_some_and(|p| self.dom.is_connected(&p.root));
                    if connected {
                        self.close_panel(id);
                    } else {
                        self.forget_panel(id);
                    }
                }
                TimerEvent::Detach(id) => {
                    if let Some(panel) = self.forget_panel(id) {
                        self.dom.remove(&panel.root);
                    }
                }
            }
        }
    }

    /// Earliest pending timer deadline, in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    fn panel_mut(&mut self, id: PanelId, fired: TimerId) -> Option<&mut OpenPanel<D::Element>> {
        let panel = self.panels.iter_mut().find(|p| p.id == id)?;
        panel.timers.retain(|t| *t != fired);
        Some(panel)
    }

    fn forget_panel(&mut self, id: PanelId) -> Option<OpenPanel<D::Element>> {
        let idx = self.panels.iter().position(|p| p.id == id)?;
        let panel = self.panels.remove(idx);
        for timer in &panel.timers {
            self.timers.cancel(*timer);
        }
        Some(panel)
    }

    // -------------------------------------------------------------------------
    // Thread modal
    // -------------------------------------------------------------------------

    fn show_modal(&mut self, content: ModalContent<'_>) -> Option<D::Element> {
        self.close_modal();
        let result = presentation::build_modal(&mut self.dom, content, self.settings.dark_mode).and_then(|modal| {
            let body = self.dom.body();
            self.dom.append_child(&body, &modal)?;
            Ok(modal)
        });
        match result {
            Ok(modal) => {
                self.dom.listen_clicks(&modal);
                self.modal = Some(modal.clone());
                Some(modal)
            }
            Err(e) => {
                log::warn!("controller: failed to show thread modal: {e}");
                None
            }
        }
    }

    pub fn close_modal(&mut self) {
        if let Some(existing) = self.dom.get_element_by_id(MODAL_ID) {
            self.dom.remove(&existing);
        }
        if let Some(modal) = self.modal.take() {
            self.dom.remove(&modal);
        }
    }

    /// Text of the open thread modal's body.
    pub fn modal_text(&self) -> Option<String> {
        let modal = self.modal.as_ref().filter(|m| self.dom.is_connected(m))?;
        let body = self.dom.query(modal, &Selector::class(MODAL_BODY_CLASS))?;
        Some(self.dom.text_content(&body))
    }

    // -------------------------------------------------------------------------
    // Toolbar & settings
    // -------------------------------------------------------------------------

    fn create_toolbar(&mut self) -> Result<(), DomError> {
        if let Some(existing) = self.dom.get_element_by_id(TOOLBAR_ID) {
            self.toolbar = Some(existing);
            self.refresh_toolbar();
            return Ok(());
        }
        let toolbar = presentation::build_toolbar(&mut self.dom, self.settings.dark_mode)?;
        let body = self.dom.body();
        self.dom.append_child(&body, &toolbar)?;
        self.dom.listen_clicks(&toolbar);
        self.toolbar = Some(toolbar);
        self.refresh_toolbar();
        log::debug!("controller: toolbar created, dark mode {}", self.settings.dark_mode);
        Ok(())
    }

    /// Flip one in-memory setting and refresh the toolbar. Never persisted.
    pub fn toggle_setting(&mut self, name: SettingName) -> bool {
        let value = self.settings.toggle(name);
        self.refresh_toolbar();
        value
    }

    /// Mirror settings onto the toolbar buttons' active state.
    pub fn refresh_toolbar(&mut self) {
        for name in SettingName::ALL {
            match self.dom.get_element_by_id(name.toolbar_button_id()) {
                Some(button) => self.dom.set_class(&button, ACTIVE_CLASS, self.settings.get(name)),
                None => log::trace!("controller: toolbar button {} not found", name.toolbar_button_id()),
            }
        }
    }

    pub fn hide_toolbar(&mut self) {
        if let Some(toolbar) = &self.toolbar {
            self.dom.set_hidden(toolbar, true);
        }
    }

    /// Widget trigger button, when on a thread page.
    pub fn widget_button(&self) -> Option<D::Element> {
        self.widget.button(&self.dom)
    }

    pub fn widget(&self) -> Option<&D::Element> {
        self.widget.element()
    }
}
