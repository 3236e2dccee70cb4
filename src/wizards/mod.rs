//! The four wizard pages.
//!
//! Each wizard is a linear stage machine over one in-memory session:
//! collect typed fields stage by stage, assemble a prompt, make one
//! Gemini call per submission, render the result as Markdown. The
//! handlers share the outcome classification below; everything else is
//! wizard-local.

pub mod citation;
pub mod small_claims;
pub mod tenancy;
pub mod tos;

use crate::error::GenError;
use crate::gemini::Generated;

/// Shown when a submission arrives for a slot that already has a call
/// in flight.
pub(crate) const BUSY_MESSAGE: &str =
    "A request is already in progress. Please wait for it to finish.";

/// Shown when a form carries an unknown or swept session id.
pub(crate) const SESSION_EXPIRED: &str = "Your session expired. Please start again.";

/// A stored follow-up exchange: the question as asked and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub text: String,
}

/// What a handler does with the result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallOutcome {
    /// Generated text to store; the stage may advance.
    Text(String),
    /// Inline message to show; the stage stays put.
    Failed(String),
}

/// Map a call result onto the user-visible contract: refusals carry the
/// service's reason code verbatim, a missing credential names itself, and
/// everything else is a generic recoverable failure.
pub(crate) fn classify(result: Result<Generated, GenError>) -> CallOutcome {
    match result {
        Ok(Generated::Text(text)) => CallOutcome::Text(text),
        Ok(Generated::Blocked { reason }) => CallOutcome::Failed(format!(
            "Request blocked due to: {reason}. Please check the input text."
        )),
        Err(e @ GenError::MissingApiKey) => CallOutcome::Failed(e.to_string()),
        Err(e) => CallOutcome::Failed(format!("An error occurred: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_passes_through() {
        let outcome = classify(Ok(Generated::Text("hello".to_string())));
        assert_eq!(outcome, CallOutcome::Text("hello".to_string()));
    }

    #[test]
    fn block_reason_surfaces_verbatim() {
        let outcome = classify(Ok(Generated::Blocked {
            reason: "SAFETY".to_string(),
        }));
        assert_eq!(
            outcome,
            CallOutcome::Failed(
                "Request blocked due to: SAFETY. Please check the input text.".to_string()
            )
        );
    }

    #[test]
    fn missing_key_names_the_variable() {
        let CallOutcome::Failed(message) = classify(Err(GenError::MissingApiKey)) else {
            panic!("expected failure");
        };
        assert!(message.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn transport_failure_is_generic() {
        let CallOutcome::Failed(message) =
            classify(Err(GenError::Transport("connection refused".to_string())))
        else {
            panic!("expected failure");
        };
        assert!(message.starts_with("An error occurred:"));
        assert!(message.contains("connection refused"));
    }
}
