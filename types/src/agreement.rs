//! The agreement state model.
//!
//! An [`Agreement`] is an immutable value. Every accepted transition consumes
//! one version and produces a new one (or none, for deletion); nothing is ever
//! updated in place. A version is addressed by [`StateRef`]: the agreement's
//! linear id plus a version number that starts at 1 on creation.

use crate::{AttachmentRef, Party, PublicKey, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Linear identifier of an agreement, stable across all of its versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgreementId(Uuid);

impl AgreementId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AgreementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgreementId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TypesError::InvalidAgreementId(s.to_string()))
    }
}

/// Lifecycle status of an agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementStatus {
    /// Requested by the origin custodian; awaiting the subject.
    Pending,
    /// Approved by the subject but not yet in force.
    Approved,
    /// In force: the target custodian may receive the record.
    Active,
    /// Refused by the subject.
    Rejected,
    /// Put on hold by the subject.
    Suspended,
}

impl AgreementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Active => "ACTIVE",
            Self::Rejected => "REJECTED",
            Self::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a party plays in an agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Origin,
    Target,
    Subject,
}

/// One version of a sharing agreement between an origin custodian, a target
/// custodian and the subject of the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub status: AgreementStatus,
    /// Custodian that currently holds the record and requests the share.
    pub origin: Party,
    /// Custodian the record is to be shared with.
    pub target: Party,
    /// The patient the record is about.
    pub subject: Party,
    pub note: Option<String>,
    pub attachment: Option<AttachmentRef>,
}

impl Agreement {
    /// A fresh `PENDING` agreement with a newly generated id.
    ///
    /// No legality checks happen here; the contract decides whether the
    /// result may be committed.
    pub fn new(
        origin: Party,
        target: Party,
        subject: Party,
        note: Option<String>,
        attachment: Option<AttachmentRef>,
    ) -> Self {
        Self {
            id: AgreementId::generate(),
            status: AgreementStatus::Pending,
            origin,
            target,
            subject,
            note,
            attachment,
        }
    }

    /// Copy of this version that differs only in `status`.
    pub fn with_status(&self, status: AgreementStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Every party that holds this agreement, in role order.
    pub fn participants(&self) -> [&Party; 3] {
        [&self.origin, &self.target, &self.subject]
    }

    pub fn is_participant(&self, key: &PublicKey) -> bool {
        self.participants().iter().any(|p| &p.key == key)
    }

    /// The first role held by `key`, if any.
    pub fn role_of(&self, key: &PublicKey) -> Option<Role> {
        if &self.origin.key == key {
            Some(Role::Origin)
        } else if &self.target.key == key {
            Some(Role::Target)
        } else if &self.subject.key == key {
            Some(Role::Subject)
        } else {
            None
        }
    }

    pub fn party(&self, role: Role) -> &Party {
        match role {
            Role::Origin => &self.origin,
            Role::Target => &self.target,
            Role::Subject => &self.subject,
        }
    }

    /// Whether origin, target and subject are three different identities.
    pub fn parties_distinct(&self) -> bool {
        self.origin != self.target && self.origin != self.subject && self.target != self.subject
    }

    /// Whether `other` describes the same agreement between the same parties
    /// with the same content, ignoring status.
    pub fn same_identity_fields(&self, other: &Agreement) -> bool {
        self.id == other.id
            && self.origin.key == other.origin.key
            && self.target.key == other.target.key
            && self.subject.key == other.subject.key
            && self.note == other.note
            && self.attachment == other.attachment
    }
}

/// Address of one version of an agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub id: AgreementId,
    pub version: u64,
}

impl StateRef {
    pub const FIRST_VERSION: u64 = 1;

    pub fn new(id: AgreementId, version: u64) -> Self {
        Self { id, version }
    }

    /// The version a transition consuming this one produces.
    pub fn next(&self) -> Self {
        Self {
            id: self.id,
            version: self.version + 1,
        }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.id, self.version)
    }
}

/// An agreement version together with the address it lives at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub state: Agreement,
    pub reference: StateRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartyName, PublicKey};

    fn party(name: &str, byte: u8) -> Party {
        Party::new(PartyName::parse(name).unwrap(), PublicKey([byte; 32]))
    }

    fn sample() -> Agreement {
        Agreement::new(
            party("Doctor One", 1),
            party("Doctor Two", 2),
            party("Patient", 3),
            Some("referral".into()),
            None,
        )
    }

    #[test]
    fn new_agreement_is_pending() {
        assert_eq!(sample().status, AgreementStatus::Pending);
    }

    #[test]
    fn with_status_changes_only_status() {
        let a = sample();
        let b = a.with_status(AgreementStatus::Active);
        assert_eq!(b.status, AgreementStatus::Active);
        assert!(a.same_identity_fields(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn roles_resolve_by_key() {
        let a = sample();
        assert_eq!(a.role_of(&PublicKey([1; 32])), Some(Role::Origin));
        assert_eq!(a.role_of(&PublicKey([2; 32])), Some(Role::Target));
        assert_eq!(a.role_of(&PublicKey([3; 32])), Some(Role::Subject));
        assert_eq!(a.role_of(&PublicKey([4; 32])), None);
        assert!(a.is_participant(&PublicKey([3; 32])));
    }

    #[test]
    fn distinctness_detects_shared_identity() {
        let mut a = sample();
        assert!(a.parties_distinct());
        a.target = a.origin.clone();
        assert!(!a.parties_distinct());
    }

    #[test]
    fn agreement_id_parses_and_rejects() {
        let id = AgreementId::generate();
        assert_eq!(id.to_string().parse::<AgreementId>().unwrap(), id);
        assert!(matches!(
            "not-a-uuid".parse::<AgreementId>(),
            Err(TypesError::InvalidAgreementId(_))
        ));
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&AgreementStatus::Suspended).unwrap();
        assert_eq!(json, "\"SUSPENDED\"");
    }

    #[test]
    fn state_ref_next_bumps_version() {
        let r = StateRef::new(AgreementId::generate(), StateRef::FIRST_VERSION);
        assert_eq!(r.next().version, 2);
        assert_eq!(r.next().id, r.id);
    }
}
