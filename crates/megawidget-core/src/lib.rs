//! Core systems for megawidgets.
//!
//! This crate provides the foundational pieces shared by the megawidget
//! specification engine and its runtime instances:
//!
//! - **Values**: The untyped configuration vocabulary (`ConfigMap`, `StateMap`)
//!   and typed readers for it
//! - **Errors**: Specification, property and state error families sharing one
//!   diagnostic shape
//! - **Property System**: Change-detecting property cells and the batch
//!   ordering rule for mutable properties
//! - **Signal System**: Direct-dispatch signals for change notification
//! - **Reentrancy Guard**: The `Idle`/`SettingState` flag that defuses
//!   notify→set→notify cycles
//! - **Logging**: `tracing` targets and tree visualisation helpers
//!
//! # Signal Example
//!
//! ```
//! use megawidget_core::Signal;
//!
//! let value_changed = Signal::<i64>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Reentrancy Guard Example
//!
//! ```
//! use megawidget_core::{GuardState, ReentrancyGuard};
//!
//! let guard = ReentrancyGuard::new();
//! {
//!     let _token = guard.try_enter().expect("guard is idle");
//!     assert_eq!(guard.state(), GuardState::SettingState);
//!
//!     // A nested attempt is refused while the token is alive.
//!     assert!(guard.try_enter().is_none());
//! }
//! assert_eq!(guard.state(), GuardState::Idle);
//! ```

mod error;
pub mod guard;
pub mod logging;
pub mod property;
pub mod signal;
pub mod value;

pub use error::{
    Diagnostic, MegawidgetError, PropertyError, PropertyErrorKind, Result, SpecificationError,
    SpecificationErrorKind, StateError, StateErrorKind, ValidationError, ValidationErrorKind,
};
pub use guard::{GuardState, GuardToken, ReentrancyGuard};
pub use logging::{DebugTreeNode, PerfSpan, TreeDebug, TreeFormatOptions, TreeStyle};
pub use property::{order_for_batch, Property, PropertyPhase};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use value::{ConfigMap, StateMap, Value};
