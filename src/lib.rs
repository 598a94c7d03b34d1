//! Declarative form state: descriptors in, immutable snapshots out.
//!
//! The engine owns field values, pristine tracking and validation. Rendering
//! stays with the caller, which reads snapshots and feeds user input back
//! through [`form::FormController`].

pub mod form;
pub mod i18n;
pub mod prelude;
