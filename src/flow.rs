//! The funnel's step machine.
//!
//! Every navigation decision in the funnel goes through [`advance`], the
//! one transition table. Handlers derive the current step from the stored
//! session with [`step_of`], feed an event in, and render whatever
//! destination comes back. No handler branches on customer type or the
//! design flag on its own.

use thiserror::Error;

use crate::error::AppError;
use crate::models::{CheckoutSession, CustomerType};

/// Where a session stands in the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Customer type not chosen yet
    SelectType,
    /// Type chosen, files still owed
    Upload,
    /// Files delivered (or never owed), payment choice pending
    Payment,
    /// Handed to the processor or recorded for later invoicing
    Done,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::SelectType => "select_type",
            Step::Upload => "upload",
            Step::Payment => "payment",
            Step::Done => "done",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the customer just did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    TypeChosen {
        customer_type: CustomerType,
        design_attached: bool,
    },
    FilesDelivered {
        customer_type: CustomerType,
    },
    PayNowStarted,
    PayLaterRecorded,
}

impl FlowEvent {
    fn name(self) -> &'static str {
        match self {
            FlowEvent::TypeChosen { .. } => "customer-type selection",
            FlowEvent::FilesDelivered { .. } => "file delivery",
            FlowEvent::PayNowStarted => "pay-now",
            FlowEvent::PayLaterRecorded => "pay-later",
        }
    }
}

/// Where the browser goes after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// External checkout link; the handler supplies the URL
    Processor,
    Upload,
    Payment,
    Confirmation,
}

/// A step received an event it does not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event} is not valid from the {step} step")]
pub struct FlowError {
    pub step: Step,
    pub event: &'static str,
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// The transition table.
///
/// Returns the step the session lands on and the destination to render.
/// Re-choosing the customer type is allowed until files have shipped;
/// everything else is a one-way door.
pub fn advance(step: Step, event: FlowEvent) -> Result<(Step, Destination), FlowError> {
    use Destination as D;
    use FlowEvent as E;
    use Step as S;

    match (step, event) {
        (
            S::SelectType | S::Upload,
            E::TypeChosen {
                customer_type,
                design_attached,
            },
        ) => Ok(match (customer_type, design_attached) {
            // Files still owed: both customer types go through upload
            (_, false) => (S::Upload, D::Upload),
            // Designs already attached upstream: nothing left to collect
            (CustomerType::New, true) => (S::Done, D::Processor),
            (CustomerType::Existing, true) => (S::Payment, D::Payment),
        }),
        (S::Upload, E::FilesDelivered { customer_type }) => Ok(match customer_type {
            CustomerType::New => (S::Done, D::Processor),
            CustomerType::Existing => (S::Payment, D::Payment),
        }),
        (S::Payment, E::PayNowStarted) => Ok((S::Done, D::Processor)),
        (S::Payment, E::PayLaterRecorded) => Ok((S::Done, D::Confirmation)),
        (step, event) => Err(FlowError {
            step,
            event: event.name(),
        }),
    }
}

/// Derive the current step from what the session has recorded.
pub fn step_of(session: &CheckoutSession) -> Step {
    if session.completed {
        return Step::Done;
    }
    if session.customer_type.is_none() {
        return Step::SelectType;
    }
    if !session.design_attached && !session.files_delivered {
        return Step::Upload;
    }
    Step::Payment
}

/// Local page for a step.
pub fn step_path(step: Step, session_id: &str) -> String {
    match step {
        Step::SelectType => format!("/{}", session_id),
        Step::Upload => format!("/{}/upload", session_id),
        Step::Payment => format!("/{}/payment", session_id),
        Step::Done => format!("/{}/confirmation", session_id),
    }
}

/// Local page for a destination; the processor is external and its URL
/// is supplied by the caller.
pub fn local_destination_path(destination: Destination, session_id: &str) -> Option<String> {
    match destination {
        Destination::Processor => None,
        Destination::Upload => Some(step_path(Step::Upload, session_id)),
        Destination::Payment => Some(step_path(Step::Payment, session_id)),
        Destination::Confirmation => Some(step_path(Step::Done, session_id)),
    }
}
