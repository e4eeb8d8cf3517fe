//! TLDRR Core Library
//!
//! This crate provides the host-independent half of the TLDRR reading
//! extension: it discovers posts and comments on the page, attaches action
//! controls to them exactly once, dispatches user actions to the translation
//! service and manages the transient result surfaces.
//!
//! # Architecture
//!
//! Nothing in here talks to a browser directly. The page is reached through
//! the [`dom::Dom`] trait, time through [`timers::Clock`], and the network
//! through [`controller::ServiceRequest`] tickets that the host completes
//! with a [`types::ServiceResponse`]. The wasm crate binds these seams to
//! `web-sys`; tests bind them to [`dom::MemoryDom`] and a manual clock.
//!
//! # Modules
//!
//! - `types`: Actions, element kinds, panel kinds and the service envelope
//! - `selector`: Simple selectors and first-match fallback chains
//! - `profile`: Host markup profile (which selectors mean what)
//! - `settings`: User settings and their stored form
//! - `dom`: DOM abstraction and the in-memory implementation
//! - `text`: Body extraction, degraded summaries, thread documents
//! - `timers`: Cancellable timer queue driven by a host clock
//! - `observer`: Page Observer (element discovery, overlay visibility)
//! - `presentation`: Rendering of clusters, panels, modals and toolbar
//! - `widget`: Floating thread summarizer control
//! - `controller`: The Controller

pub mod types;
pub mod selector;
pub mod profile;
pub mod settings;
pub mod dom;
pub mod text;
pub mod timers;
pub mod observer;
pub mod presentation;
pub mod widget;
pub mod controller;

// Re-export commonly used types
pub use controller::{Controller, ControllerConfig, ServiceRequest, Ticket};
pub use dom::{Dom, DomError, MemoryDom};
pub use profile::HostProfile;
pub use selector::{Selector, SelectorChain};
pub use settings::{Settings, SettingName, StoredSettings};
pub use timers::{Clock, ManualClock};
pub use types::{Action, ElementKind, PanelKind, ServiceResponse};
