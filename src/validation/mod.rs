//! Content validation: independent validators that inspect free text and accept or
//! reject it with a reason. Validators never modify the text they inspect.

use async_trait::async_trait;

pub mod keyword;
pub mod url;

pub use keyword::KeywordValidator;
pub use url::{DnsResolver, HostResolver, UrlPolicy, UrlValidator};

/// Reason reported when a validator runs out of time.
pub const TIMEOUT_REASON: &str = "validation timeout";

/// Outcome
///
/// The result of a single validator call. Not stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid { reason: String },
    /// Fail-closed: a timed out check counts as a rejection.
    TimedOut,
}

impl Outcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Outcome::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Valid => None,
            Outcome::Invalid { reason } => Some(reason),
            Outcome::TimedOut => Some(TIMEOUT_REASON),
        }
    }
}

/// Validator
///
/// The single capability every content check implements. New kinds of checks are
/// added by implementing this trait; the interactor never changes.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn check(&self, text: &str) -> Outcome;
}
