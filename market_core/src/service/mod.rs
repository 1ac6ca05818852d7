use std::collections::HashMap;

use sea_orm::ItemsAndPagesNumber;
use serde::Serialize;

use crate::{
    entity::{prelude::*, user::DEFAULT_AVATAR},
    ids::UserId,
};

pub mod accounts;
pub mod board;
pub mod items;
pub mod messages;
pub mod notifications;
pub mod password;
pub mod requests;
pub mod social;
pub mod stocks;

#[cfg(test)]
pub(crate) mod tests_support;

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, page: u64, per_page: u64, totals: ItemsAndPagesNumber) -> Self {
        Self {
            items,
            page,
            per_page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
            has_prev: page > 1,
            has_next: page < totals.number_of_pages,
        }
    }
}

/// Clamp a user-supplied page number and turn it into a paginator index.
pub(crate) fn page_index(page: u64) -> (u64, u64) {
    let page = page.max(1);
    (page, page - 1)
}

/// Public face of a user, safe to embed anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCard {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
}

impl From<&UserModel> for UserCard {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

impl UserCard {
    /// Placeholder for a row whose author no longer resolves.
    pub(crate) fn missing(id: UserId) -> Self {
        Self {
            id,
            username: "[deleted]".to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }
}

/// Batch-load user cards for a set of ids.
pub(crate) async fn load_cards<C, I>(conn: &C, ids: I) -> Result<HashMap<UserId, UserCard>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = UserId>,
{
    let mut ids: Vec<UserId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find().filter(UserColumn::Id.is_in(ids)).all(conn).await?;
    Ok(users.iter().map(|user| (user.id, UserCard::from(user))).collect())
}

pub(crate) fn card_for(cards: &HashMap<UserId, UserCard>, id: UserId) -> UserCard {
    cards.get(&id).cloned().unwrap_or_else(|| UserCard::missing(id))
}
