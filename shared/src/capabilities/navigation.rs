//! Browser history capability.
//!
//! The core never touches the address bar itself. It asks the shell to
//! replace the current history entry so filter tweaks do not pile up in the
//! back/forward stack.

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

use crate::location::BrowserLocation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigationOperation {
    /// `history.replaceState` semantics: no new entry.
    Replace(BrowserLocation),
}

impl Operation for NavigationOperation {
    type Output = ();
}

#[derive(Capability)]
pub struct Navigation<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Navigation<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn replace(&self, location: BrowserLocation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(NavigationOperation::Replace(location)).await;
        });
    }
}
