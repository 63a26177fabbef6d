use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paytv_core::{BranchId, DomainError, DomainResult, Entity, SubscriberId};

/// Whether service is provisioned for a subscriber.
///
/// Coarser than, and independent from, the payment status derived by billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Active,
    Inactive,
}

/// Contact information for a subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A billed customer attached to exactly one branch.
///
/// The monthly price is deliberately not stored here: it is read from the
/// branch whenever a period is synthesized or materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    id: SubscriberId,
    name: String,
    branch_id: BranchId,
    lifecycle: LifecycleStatus,
    #[serde(default)]
    contact: ContactInfo,
    created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Register a new, active subscriber on a branch.
    pub fn register(
        id: SubscriberId,
        name: impl Into<String>,
        branch_id: BranchId,
        contact: ContactInfo,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: validate_name(name.into())?,
            branch_id,
            lifecycle: LifecycleStatus::Active,
            contact,
            created_at,
        })
    }

    pub fn id_typed(&self) -> &SubscriberId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch_id(&self) -> &BranchId {
        &self.branch_id
    }

    pub fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == LifecycleStatus::Active
    }

    pub fn activate(&mut self) {
        self.lifecycle = LifecycleStatus::Active;
    }

    pub fn deactivate(&mut self) {
        self.lifecycle = LifecycleStatus::Inactive;
    }

    /// Move to another branch; only periods synthesized afterwards use its price.
    pub fn move_to_branch(&mut self, branch_id: BranchId) {
        self.branch_id = branch_id;
    }

    pub fn update_details(
        &mut self,
        name: Option<String>,
        contact: Option<ContactInfo>,
    ) -> DomainResult<()> {
        if let Some(name) = name {
            self.name = validate_name(name)?;
        }
        if let Some(contact) = contact {
            self.contact = contact;
        }
        Ok(())
    }
}

impl Entity for Subscriber {
    type Id = SubscriberId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("subscriber name must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber() -> Subscriber {
        Subscriber::register(
            SubscriberId::new(),
            "Ana Machava",
            BranchId::new(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn registered_subscribers_start_active() {
        let s = subscriber();
        assert!(s.is_active());
        assert_eq!(s.name(), "Ana Machava");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Subscriber::register(
            SubscriberId::new(),
            " ",
            BranchId::new(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lifecycle_transitions() {
        let mut s = subscriber();
        s.deactivate();
        assert_eq!(s.lifecycle(), LifecycleStatus::Inactive);
        s.activate();
        assert!(s.is_active());
    }

    #[test]
    fn update_details_keeps_unspecified_fields() {
        let mut s = subscriber();
        let contact = ContactInfo {
            phone: Some("+258 84 000 0000".to_string()),
            ..ContactInfo::default()
        };
        s.update_details(None, Some(contact.clone())).unwrap();
        assert_eq!(s.name(), "Ana Machava");
        assert_eq!(s.contact(), &contact);
    }

    #[test]
    fn contact_defaults_when_missing_from_json() {
        let json = serde_json::json!({
            "id": "client-1",
            "name": "Ana",
            "branch_id": "filial-1",
            "lifecycle": "inactive",
            "created_at": "2024-01-01T00:00:00Z",
        });
        let s: Subscriber = serde_json::from_value(json).unwrap();
        assert_eq!(s.lifecycle(), LifecycleStatus::Inactive);
        assert_eq!(s.contact(), &ContactInfo::default());
    }
}
