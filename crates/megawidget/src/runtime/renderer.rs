//! The rendering collaborator contract.
//!
//! Painting is out of scope for megawidgets. Each runtime instance is paired
//! with a [`Renderer`] that the core calls whenever the observable state,
//! choices or properties change, and which in turn reports user interaction
//! back through [`StatefulMegawidget::notify_state_change`].
//!
//! Hooks are always invoked with no internal lock held, so a renderer may
//! read the megawidget's state from inside any hook. Calling
//! [`StatefulMegawidget::set_state`] from inside a hook is a no-op, since
//! the reentrancy guard is engaged for the duration of the synchronization.

use std::sync::Arc;

use super::{Megawidget, StatefulMegawidget};

/// Per-instance rendering hooks.
///
/// All hooks default to doing nothing.
pub trait Renderer: Send + Sync {
    /// The state `identifier` of `megawidget` changed and should be repainted.
    fn synchronize_to_state(&self, _megawidget: &dyn StatefulMegawidget, _identifier: &str) {}

    /// The choice list is about to be replaced.
    fn prepare_for_choices_change(&self, _megawidget: &dyn StatefulMegawidget) {}

    /// A prepared choice replacement was rejected; undo the preparation.
    fn cancel_preparation(&self, _megawidget: &dyn StatefulMegawidget) {}

    /// The choice list was replaced and the state pruned to match.
    fn synchronize_to_choices(&self, _megawidget: &dyn StatefulMegawidget) {}

    /// A mutable property other than state or choices changed.
    fn synchronize_to_property(&self, _megawidget: &dyn Megawidget, _name: &str) {}
}

/// A renderer that ignores every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}

/// Supplies a renderer for each megawidget as it is created.
pub trait RendererProvider: Send + Sync {
    /// The renderer for the megawidget `identifier` of type `type_name`.
    fn renderer_for(&self, identifier: &str, type_name: &str) -> Arc<dyn Renderer>;
}

/// Provides [`NullRenderer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRendererProvider;

impl RendererProvider for NullRendererProvider {
    fn renderer_for(&self, _identifier: &str, _type_name: &str) -> Arc<dyn Renderer> {
        Arc::new(NullRenderer)
    }
}

impl<F> RendererProvider for F
where
    F: Fn(&str, &str) -> Arc<dyn Renderer> + Send + Sync,
{
    fn renderer_for(&self, identifier: &str, type_name: &str) -> Arc<dyn Renderer> {
        self(identifier, type_name)
    }
}
