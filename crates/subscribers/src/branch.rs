use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paytv_core::{BranchId, DomainError, DomainResult, Entity};

/// Branch status lifecycle (informational for billing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Active,
    Inactive,
}

/// An operating location with its own monthly subscription price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    id: BranchId,
    name: String,
    /// Price per billing period in smallest currency unit.
    monthly_price: u64,
    status: BranchStatus,
    created_at: DateTime<Utc>,
}

impl Branch {
    /// Open a new, active branch.
    pub fn open(
        id: BranchId,
        name: impl Into<String>,
        monthly_price: u64,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = validate_name(name.into())?;
        validate_price(monthly_price)?;
        Ok(Self {
            id,
            name,
            monthly_price,
            status: BranchStatus::Active,
            created_at,
        })
    }

    pub fn id_typed(&self) -> &BranchId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn monthly_price(&self) -> u64 {
        self.monthly_price
    }

    pub fn status(&self) -> BranchStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Change the price charged for periods synthesized from now on.
    ///
    /// Already materialized periods keep the amount they were created with.
    pub fn set_monthly_price(&mut self, monthly_price: u64) -> DomainResult<()> {
        validate_price(monthly_price)?;
        self.monthly_price = monthly_price;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.status = BranchStatus::Active;
    }

    pub fn deactivate(&mut self) {
        self.status = BranchStatus::Inactive;
    }
}

impl Entity for Branch {
    type Id = BranchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("branch name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_price(monthly_price: u64) -> DomainResult<()> {
    if monthly_price == 0 {
        return Err(DomainError::validation("monthly price must be positive"));
    }
    Ok(())
}
