//! The single-vs-batch split an [`crate::Activity`] is constructed from.

use feed_core::UserId;

/// Which users an [`crate::Activity`] addresses: a single user or a batch.
/// No trait hierarchy of handle "kinds"; `Activity` branches on this enum
/// internally instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Users {
    One(UserId),
    Many(Vec<UserId>),
}

impl Users {
    pub fn as_slice(&self) -> Vec<UserId> {
        match self {
            Users::One(id) => vec![id.clone()],
            Users::Many(ids) => ids.clone(),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Users::One(_))
    }
}

impl From<UserId> for Users {
    fn from(id: UserId) -> Self {
        Users::One(id)
    }
}

impl From<Vec<UserId>> for Users {
    fn from(ids: Vec<UserId>) -> Self {
        Users::Many(ids)
    }
}
