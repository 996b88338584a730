//! Property system for megawidgets.
//!
//! This module provides the change-detecting [`Property`] cell that runtime
//! megawidgets keep their mutable properties in, and the ordering rule used
//! when several mutable properties are applied in one batch.
//!
//! # Batch Ordering
//!
//! Some properties constrain the values of others: a choice list constrains
//! which state values are legal, and a pair of bounds constrains a numeric
//! state. When such properties arrive together, the constraining ones must be
//! applied first so the dependent value is validated against the new
//! constraint rather than a stale one. [`order_for_batch`] sorts a batch into
//! [`PropertyPhase::Bounds`], then [`PropertyPhase::Ordinary`], then
//! [`PropertyPhase::Value`].
//!
//! ```
//! use megawidget_core::property::{order_for_batch, names};
//! use serde_json::json;
//!
//! let batch = json!({"values": 15, "maxValue": 10, "enabled": true});
//! let ordered: Vec<&str> = order_for_batch(batch.as_object().unwrap())
//!     .into_iter()
//!     .map(|(name, _)| name)
//!     .collect();
//! assert_eq!(ordered, vec![names::MAX_VALUE, names::ENABLED, names::VALUES]);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::value::{ConfigMap, Value};

/// Names of the mutable properties understood by the built-in megawidgets.
pub mod names {
    /// Enablement flag.
    pub const ENABLED: &str = "enabled";
    /// Editability flag.
    pub const EDITABLE: &str = "editable";
    /// Opaque caller data.
    pub const EXTRA_DATA: &str = "extraData";
    /// Label text.
    pub const LABEL: &str = "label";
    /// State value(s).
    pub const VALUES: &str = "values";
    /// Choice list.
    pub const CHOICES: &str = "choices";
    /// Lower bound.
    pub const MIN_VALUE: &str = "minValue";
    /// Upper bound.
    pub const MAX_VALUE: &str = "maxValue";
    /// Increment step.
    pub const INCREMENT_DELTA: &str = "incrementDelta";
}

/// A property cell that tracks changes.
///
/// `Property<T>` wraps a value and provides change detection. When `set()` is
/// called, it compares the new value with the current one and returns whether
/// the value actually changed, so callers only synchronise renderers when
/// something really moved.
///
/// # Example
///
/// ```
/// use megawidget_core::Property;
///
/// let enabled = Property::new(true);
/// assert!(!enabled.set(true));
/// assert!(enabled.set(false));
/// assert!(!enabled.get());
/// ```
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

/// When a property is applied within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyPhase {
    /// Defines the legal range of other properties (choices, bounds).
    Bounds,
    /// Independent of every other property.
    Ordinary,
    /// A value validated against the bounds (state values).
    Value,
}

impl PropertyPhase {
    /// The phase of a property name.
    pub fn of(name: &str) -> Self {
        match name {
            names::CHOICES | names::MIN_VALUE | names::MAX_VALUE => Self::Bounds,
            names::VALUES => Self::Value,
            _ => Self::Ordinary,
        }
    }
}

/// Order a batch of properties so bound-defining ones come first.
///
/// Within one phase the map's own key order is kept.
pub fn order_for_batch(properties: &ConfigMap) -> Vec<(&str, &Value)> {
    let mut ordered: Vec<(&str, &Value)> = properties
        .iter()
        .map(|(name, value)| (name.as_str(), value))
        .collect();
    ordered.sort_by_key(|(name, _)| PropertyPhase::of(name));
    ordered
}
