//! Immutable lookup over branches and subscribers.

use std::collections::HashMap;

use paytv_core::{BranchId, Entity, SubscriberId};

use crate::branch::Branch;
use crate::subscriber::Subscriber;

/// Snapshot of branches and subscribers used for price resolution.
#[derive(Debug, Clone, Default)]
pub struct SubscriberDirectory {
    branches: HashMap<BranchId, Branch>,
    subscribers: HashMap<SubscriberId, Subscriber>,
}

impl SubscriberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        branches: impl IntoIterator<Item = Branch>,
        subscribers: impl IntoIterator<Item = Subscriber>,
    ) -> Self {
        let mut directory = Self::new();
        for branch in branches {
            directory.insert_branch(branch);
        }
        for subscriber in subscribers {
            directory.insert_subscriber(subscriber);
        }
        directory
    }

    /// Insert or replace a branch.
    pub fn insert_branch(&mut self, branch: Branch) {
        self.branches.insert(branch.id().clone(), branch);
    }

    /// Insert or replace a subscriber.
    pub fn insert_subscriber(&mut self, subscriber: Subscriber) {
        self.subscribers
            .insert(subscriber.id().clone(), subscriber);
    }

    pub fn branch(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn subscriber(&self, id: &SubscriberId) -> Option<&Subscriber> {
        self.subscribers.get(id)
    }

    /// Owning branch of a subscriber; `None` when the reference dangles.
    pub fn branch_of(&self, subscriber: &Subscriber) -> Option<&Branch> {
        self.branches.get(subscriber.branch_id())
    }

    /// Branches ordered by name.
    pub fn branches(&self) -> Vec<&Branch> {
        let mut out: Vec<&Branch> = self.branches.values().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id_typed().cmp(b.id_typed())));
        out
    }

    /// Subscribers ordered by name.
    pub fn subscribers(&self) -> Vec<&Subscriber> {
        let mut out: Vec<&Subscriber> = self.subscribers.values().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id_typed().cmp(b.id_typed())));
        out
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::ContactInfo;
    use chrono::Utc;

    #[test]
    fn branch_of_resolves_and_reports_dangling_references() {
        let branch = Branch::open(BranchId::new(), "Matola", 2000, Utc::now()).unwrap();
        let attached = Subscriber::register(
            SubscriberId::new(),
            "Carlos",
            branch.id_typed().clone(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap();
        let dangling = Subscriber::register(
            SubscriberId::new(),
            "Dina",
            BranchId::new(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap();

        let directory =
            SubscriberDirectory::from_parts([branch.clone()], [attached.clone(), dangling.clone()]);

        assert_eq!(directory.branch_of(&attached), Some(&branch));
        assert_eq!(directory.branch_of(&dangling), None);
        assert_eq!(directory.subscriber_count(), 2);
        assert_eq!(directory.subscribers()[0].name(), "Carlos");
    }
}
