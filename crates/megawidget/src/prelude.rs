//! Commonly used types.
//!
//! ```
//! use megawidget::prelude::*;
//! ```

// ============================================================================
// Values and Errors
// ============================================================================

pub use megawidget_core::{
    ConfigMap, MegawidgetError, PropertyError, PropertyErrorKind, Signal, SpecificationError,
    SpecificationErrorKind, StateError, StateErrorKind, StateMap, Value,
};

// ============================================================================
// Specifiers
// ============================================================================

pub use crate::capability::Capabilities;
pub use crate::specifier::{
    ContainerSpecifier, Specifier, SpecifierFactory, SpecifierManager, SpecifierRegistry,
    StatefulSpecifier,
};

// ============================================================================
// Runtime
// ============================================================================

pub use crate::runtime::{
    ContainerMegawidget, CreationParams, ExplicitCommitMegawidget, InvocationEvent,
    InvocationListener, Megawidget, MegawidgetManager, NotifierMegawidget, NullRendererProvider,
    Renderer, RendererProvider, StateChangeEvent, StateChangeListener, StatefulMegawidget,
};
