//! Per-user result container for multi-user (batch) calls.

use std::collections::HashMap;

use crate::error::FeedError;
use crate::ids::UserId;

/// Ordered, per-user result set. Preserves the input user list's order and
/// lets a partial failure on one user leave every other user's result
/// intact.
#[derive(Debug, Clone)]
pub struct Response<T> {
    order: Vec<UserId>,
    index: HashMap<UserId, usize>,
    values: Vec<Result<T, FeedError>>,
}

impl<T> Response<T> {
    /// Build a response from per-user results, in the order the user ids
    /// were requested in. `pairs` must not contain duplicate user ids.
    pub fn from_pairs(pairs: Vec<(UserId, Result<T, FeedError>)>) -> Self {
        let mut order = Vec::with_capacity(pairs.len());
        let mut index = HashMap::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());

        for (i, (user, value)) in pairs.into_iter().enumerate() {
            index.insert(user.clone(), i);
            order.push(user);
            values.push(value);
        }

        Self {
            order,
            index,
            values,
        }
    }

    /// A response with the same error for every user (used when argument
    /// validation already failed before dispatch).
    pub fn error_for_all(users: &[UserId], err: FeedError) -> Self {
        Self::from_pairs(
            users
                .iter()
                .map(|u| (u.clone(), Err(err.clone())))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up the result for one user, if it was part of this response.
    pub fn get(&self, user: &UserId) -> Option<&Result<T, FeedError>> {
        self.index.get(user).map(|&i| &self.values[i])
    }

    /// Iterate `(user_id, result)` pairs in the original input order.
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &Result<T, FeedError>)> {
        self.order.iter().zip(self.values.iter())
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.order
    }

    pub fn has_errors(&self) -> bool {
        self.values.iter().any(Result::is_err)
    }

    /// Unwrap the entry for one user, raising its captured error (if any).
    pub fn value_or_raise(&self, user: &UserId) -> Result<T, FeedError>
    where
        T: Clone,
    {
        match self.get(user) {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FeedError::argument(format!(
                "no result for user {user} in this response"
            ))),
        }
    }

    /// Collapse a single-user response to its scalar value, raising on
    /// error. Used by the single-user `Activity` handle.
    pub fn into_single(mut self) -> Result<T, FeedError> {
        if self.values.len() != 1 {
            return Err(FeedError::argument(
                "expected a single-user response".to_string(),
            ));
        }
        self.values.remove(0)
    }
}

impl<T: PartialEq> PartialEq for Response<T> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.values == other.values
    }
}
