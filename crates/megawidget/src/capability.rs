//! Capability sets.
//!
//! Specifiers and megawidgets do not form a class hierarchy. Instead each
//! implementation declares the set of orthogonal capabilities it provides,
//! and the factory checks that set against what a caller requires (a
//! container may, for example, require every child to be a control).

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A set of megawidget capabilities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u16);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Capabilities = Capabilities(0);
    /// Every specifier and megawidget has this capability.
    pub const MEGAWIDGET: Capabilities = Capabilities(1 << 0);
    /// An interactive control that can be placed inside a container.
    pub const CONTROL: Capabilities = Capabilities(1 << 1);
    /// Owns one or more state values.
    pub const STATEFUL: Capabilities = Capabilities(1 << 2);
    /// Stages state changes and applies them on commit.
    pub const EXPLICIT_COMMIT: Capabilities = Capabilities(1 << 3);
    /// Notifies an invocation listener when activated.
    pub const NOTIFIER: Capabilities = Capabilities(1 << 4);
    /// Owns child specifiers or megawidgets.
    pub const CONTAINER: Capabilities = Capabilities(1 << 5);
    /// Offers a list of choices.
    pub const CHOICES: Capabilities = Capabilities(1 << 6);
    /// The choice list may be replaced at runtime.
    pub const MUTABLE_CHOICES: Capabilities = Capabilities(1 << 7);
    /// Constrains its state to a numeric range.
    pub const BOUNDS: Capabilities = Capabilities(1 << 8);

    const NAMED: [(Capabilities, &'static str); 9] = [
        (Self::MEGAWIDGET, "MEGAWIDGET"),
        (Self::CONTROL, "CONTROL"),
        (Self::STATEFUL, "STATEFUL"),
        (Self::EXPLICIT_COMMIT, "EXPLICIT_COMMIT"),
        (Self::NOTIFIER, "NOTIFIER"),
        (Self::CONTAINER, "CONTAINER"),
        (Self::CHOICES, "CHOICES"),
        (Self::MUTABLE_CHOICES, "MUTABLE_CHOICES"),
        (Self::BOUNDS, "BOUNDS"),
    ];

    /// The union of two sets, usable in constants.
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// Check if every capability in `required` is present.
    pub fn contains(&self, required: Capabilities) -> bool {
        (self.0 & required.0) == required.0
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The capabilities of `required` that this set lacks.
    pub fn missing(&self, required: Capabilities) -> Capabilities {
        Capabilities(required.0 & !self.0)
    }

    /// Names of the capabilities in this set.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Capabilities {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 & rhs.0)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<&str> = self.names().collect();
        write!(f, "{}", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_contains() {
        let caps = Capabilities::MEGAWIDGET | Capabilities::CONTROL | Capabilities::STATEFUL;
        assert!(caps.contains(Capabilities::CONTROL));
        assert!(caps.contains(Capabilities::CONTROL | Capabilities::STATEFUL));
        assert!(!caps.contains(Capabilities::CONTROL | Capabilities::CONTAINER));
        assert!(caps.contains(Capabilities::NONE));
    }

    #[test]
    fn test_capabilities_missing() {
        let caps = Capabilities::MEGAWIDGET | Capabilities::CONTROL;
        let missing = caps.missing(Capabilities::CONTROL | Capabilities::STATEFUL);
        assert_eq!(missing, Capabilities::STATEFUL);
    }

    #[test]
    fn test_capabilities_display() {
        assert_eq!(Capabilities::NONE.to_string(), "NONE");
        let caps = Capabilities::CHOICES | Capabilities::CONTROL;
        assert_eq!(caps.to_string(), "CONTROL | CHOICES");
    }

    #[test]
    fn test_capabilities_bitor_assign() {
        let mut caps = Capabilities::MEGAWIDGET;
        caps |= Capabilities::NOTIFIER;
        assert!(caps.contains(Capabilities::NOTIFIER));
        assert_eq!(caps & Capabilities::NOTIFIER, Capabilities::NOTIFIER);
    }
}
