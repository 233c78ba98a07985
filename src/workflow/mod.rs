// Capture Workflow Module - state machine plus the async driver
//
// `state` holds the pure transition table, `session` chains the permission
// gate, capture controller, geolocation fetcher and upload dispatcher, and
// `view` projects the state onto what the host shell renders.

pub mod state;
pub mod session;
pub mod view;

#[cfg(test)]
pub mod mocks;


pub use session::{CaptureWorkflow, Collaborators, WorkflowSettings};
pub use state::{Mode, TransitionError, TransitionRecord, WorkflowEvent, WorkflowState};
pub use view::View;
