pub mod compose;
pub mod header;
pub mod invoke;

pub use compose::ComposePhase;
pub use header::HeaderPhase;
pub use invoke::InvokePhase;
