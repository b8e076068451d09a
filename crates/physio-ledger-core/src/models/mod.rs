//! Domain models for the physio-ledger system.

mod invoice;
mod patient;
mod reference;
mod session;
mod settings;
mod therapy;

pub use invoice::*;
pub use patient::*;
pub use reference::*;
pub use session::*;
pub use settings::*;
pub use therapy::*;
