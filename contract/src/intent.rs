//! The declared purpose of a transition.

use ehr_types::AgreementStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a transition claims to do.
///
/// On the wire an intent is its lowercase tag. A tag that names no known
/// intent decodes to [`Intent::Unrecognized`] instead of failing, so the
/// verifier can reject it explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    Create,
    Approve,
    Activate,
    Reject,
    Suspend,
    Share,
    Delete,
    Unrecognized(String),
}

impl Intent {
    /// Every intent the verifier knows how to judge.
    pub const KNOWN: [Intent; 7] = [
        Intent::Create,
        Intent::Approve,
        Intent::Activate,
        Intent::Reject,
        Intent::Suspend,
        Intent::Share,
        Intent::Delete,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Approve => "approve",
            Self::Activate => "activate",
            Self::Reject => "reject",
            Self::Suspend => "suspend",
            Self::Share => "share",
            Self::Delete => "delete",
            Self::Unrecognized(tag) => tag,
        }
    }

    /// Status the produced version must carry, for the subject's
    /// status-changing intents.
    pub fn target_status(&self) -> Option<AgreementStatus> {
        match self {
            Self::Approve => Some(AgreementStatus::Approved),
            Self::Activate => Some(AgreementStatus::Active),
            Self::Reject => Some(AgreementStatus::Rejected),
            Self::Suspend => Some(AgreementStatus::Suspended),
            Self::Create | Self::Share | Self::Delete | Self::Unrecognized(_) => None,
        }
    }
}

impl From<String> for Intent {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "create" => Self::Create,
            "approve" => Self::Approve,
            "activate" => Self::Activate,
            "reject" => Self::Reject,
            "suspend" => Self::Suspend,
            "share" => Self::Share,
            "delete" => Self::Delete,
            _ => Self::Unrecognized(tag),
        }
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Unrecognized(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
