//! # Rolecast Core
//!
//! Domain types, traits, and error definitions for Rolecast, a role-prompt
//! injector for third-party AI chat pages. This crate has **no runtime
//! wiring**. It defines the domain model that every other crate implements
//! against.
//!
//! ## Design Philosophy
//!
//! Every external surface is a trait here:
//! - [`StorageArea`] is the extension's key-value storage
//! - [`RoleStore`] is the role persistence contract
//! - [`Page`] is the foreign chat page DOM
//!
//! Implementations live in their respective crates, so the injection engine
//! can be driven against an in-memory page in tests and a real one in a
//! browser host.

pub mod error;
pub mod event;
pub mod messaging;
pub mod page;
pub mod role;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MessagingError, PageError, Result, StoreError};
pub use event::{DomainEvent, EventBus};
pub use messaging::{ExtensionRequest, ExtensionResponse};
pub use page::{EditingMode, ElementId, MenuItem, Page, SyntheticEvent, UiEvent};
pub use role::{Role, RoleDraft};
pub use storage::{RoleStore, RoleSubscription, StorageArea, StorageChange};
