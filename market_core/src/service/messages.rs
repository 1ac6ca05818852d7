use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    entity::prelude::*,
    error::{required, ValidationError},
    ids::{MessageId, UserId},
    service::{card_for, load_cards, UserCard},
    time,
};

#[derive(Debug, Error)]
pub enum MessagesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("user not found")]
    UserNotFound,

    #[error("you cannot message yourself")]
    SelfMessage,
}

/// One row of the inbox.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub partner: UserCard,
    pub latest: MessageModel,
    pub unread: u64,
}

pub(crate) async fn insert_message<C: ConnectionTrait>(
    conn: &C,
    sender: UserId,
    receiver: UserId,
    content: String,
) -> Result<MessageModel, DbErr> {
    debug!(%sender, %receiver, "message");

    let message = MessageActiveModel {
        id: Set(MessageId::new()),
        sender_id: Set(sender),
        receiver_id: Set(receiver),
        content: Set(content),
        date_sent: Set(time::now()),
        is_read: Set(false),
    };
    Message::insert(message).exec_with_returning(conn).await
}

fn between(a: UserId, b: UserId) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(MessageColumn::SenderId.eq(a))
                .add(MessageColumn::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(MessageColumn::SenderId.eq(b))
                .add(MessageColumn::ReceiverId.eq(a)),
        )
}

#[derive(Clone)]
pub struct MessagesService {
    db: DatabaseConnection,
}

impl MessagesService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
    ) -> Result<MessageModel, MessagesServiceError> {
        let content = required("message", content)?;
        if sender_id == receiver_id {
            return Err(MessagesServiceError::SelfMessage);
        }
        User::find_by_id(receiver_id)
            .one(&self.db)
            .await?
            .ok_or(MessagesServiceError::UserNotFound)?;

        Ok(insert_message(&self.db, sender_id, receiver_id, content).await?)
    }

    /// Everyone `user_id` has exchanged messages with, most recent first.
    pub async fn conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, MessagesServiceError> {
        // Newest message id per partner, in each direction. Ids are UUIDv7 so
        // the largest id is the latest message.
        let sent: Vec<(UserId, MessageId)> = Message::find()
            .select_only()
            .column(MessageColumn::ReceiverId)
            .column_as(Expr::col(MessageColumn::Id).max(), "latest")
            .filter(MessageColumn::SenderId.eq(user_id))
            .group_by(MessageColumn::ReceiverId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let received: Vec<(UserId, MessageId)> = Message::find()
            .select_only()
            .column(MessageColumn::SenderId)
            .column_as(Expr::col(MessageColumn::Id).max(), "latest")
            .filter(MessageColumn::ReceiverId.eq(user_id))
            .group_by(MessageColumn::SenderId)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut latest_ids: HashMap<UserId, MessageId> = HashMap::new();
        for (partner, id) in sent.into_iter().chain(received) {
            latest_ids
                .entry(partner)
                .and_modify(|current| *current = (*current).max(id))
                .or_insert(id);
        }

        let unread: HashMap<UserId, i64> = Message::find()
            .select_only()
            .column(MessageColumn::SenderId)
            .column_as(Expr::col(MessageColumn::Id).count(), "count")
            .filter(MessageColumn::ReceiverId.eq(user_id))
            .filter(MessageColumn::IsRead.eq(false))
            .group_by(MessageColumn::SenderId)
            .into_tuple::<(UserId, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let latest: Vec<(UserId, MessageModel)> = Message::find()
            .filter(MessageColumn::Id.is_in(latest_ids.into_values()))
            .order_by_desc(MessageColumn::DateSent)
            .order_by_desc(MessageColumn::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|message| {
                let partner = if message.sender_id == user_id {
                    message.receiver_id
                } else {
                    message.sender_id
                };
                (partner, message)
            })
            .collect();

        let cards = load_cards(&self.db, latest.iter().map(|(p, _)| *p)).await?;
        Ok(latest
            .into_iter()
            .map(|(partner, message)| Conversation {
                partner: card_for(&cards, partner),
                unread: unread.get(&partner).copied().unwrap_or(0) as u64,
                latest: message,
            })
            .collect())
    }

    /// Full exchange, oldest first. Marks the partner's messages as read.
    pub async fn thread(
        &self,
        user_id: UserId,
        partner_id: UserId,
    ) -> Result<Vec<MessageModel>, MessagesServiceError> {
        User::find_by_id(partner_id)
            .one(&self.db)
            .await?
            .ok_or(MessagesServiceError::UserNotFound)?;

        Message::update_many()
            .col_expr(MessageColumn::IsRead, Expr::value(true))
            .filter(MessageColumn::SenderId.eq(partner_id))
            .filter(MessageColumn::ReceiverId.eq(user_id))
            .filter(MessageColumn::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(Message::find()
            .filter(between(user_id, partner_id))
            .order_by_asc(MessageColumn::DateSent)
            .order_by_asc(MessageColumn::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, MessagesServiceError> {
        Ok(Message::find()
            .filter(MessageColumn::ReceiverId.eq(user_id))
            .filter(MessageColumn::IsRead.eq(false))
            .count(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::memory_db, service::tests_support::seed_user};

    async fn setup() -> (DatabaseConnection, MessagesService) {
        let db = memory_db().await;
        let service = MessagesService::new(db.clone());
        (db, service)
    }

    #[tokio::test]
    async fn test_send_validates() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;

        assert!(matches!(
            service.send(alice.id, alice.id, "hi me").await,
            Err(MessagesServiceError::SelfMessage)
        ));
        assert!(matches!(
            service.send(alice.id, UserId::new(), "hi").await,
            Err(MessagesServiceError::UserNotFound)
        ));

        let bob = seed_user(&db, "bob").await;
        assert!(matches!(
            service.send(alice.id, bob.id, "  ").await,
            Err(MessagesServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_conversations_and_thread() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;

        service.send(bob.id, alice.id, "is the bike sold?").await.unwrap();
        service.send(alice.id, bob.id, "not yet").await.unwrap();
        service.send(carol.id, alice.id, "hello").await.unwrap();
        service.send(carol.id, alice.id, "anyone?").await.unwrap();

        assert_eq!(service.unread_count(alice.id).await.unwrap(), 3);

        let inbox = service.conversations(alice.id).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].partner.username, "carol");
        assert_eq!(inbox[0].latest.content, "anyone?");
        assert_eq!(inbox[0].unread, 2);
        assert_eq!(inbox[1].partner.username, "bob");
        assert_eq!(inbox[1].latest.content, "not yet");
        assert_eq!(inbox[1].unread, 1);

        let thread = service.thread(alice.id, bob.id).await.unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["is the bike sold?", "not yet"]);
        assert!(thread[0].is_read);
        // alice's own message stays unread for bob
        assert_eq!(service.unread_count(bob.id).await.unwrap(), 1);

        assert_eq!(service.unread_count(alice.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_conversations_list_each_partner_once() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;

        for n in 0..5 {
            service.send(alice.id, bob.id, &format!("ping {n}")).await.unwrap();
            service.send(bob.id, alice.id, &format!("pong {n}")).await.unwrap();
        }
        service.send(carol.id, alice.id, "hi").await.unwrap();
        service.send(alice.id, bob.id, "last word").await.unwrap();

        let inbox = service.conversations(alice.id).await.unwrap();
        let partners: Vec<_> = inbox.iter().map(|c| c.partner.username.as_str()).collect();
        assert_eq!(partners, vec!["bob", "carol"]);
        assert_eq!(inbox[0].latest.content, "last word");
        assert_eq!(inbox[0].unread, 5);
        assert_eq!(inbox[1].latest.content, "hi");

        let from_bob = service.conversations(bob.id).await.unwrap();
        assert_eq!(from_bob.len(), 1);
        assert_eq!(from_bob[0].partner.username, "alice");
        assert_eq!(from_bob[0].latest.content, "last word");
        assert_eq!(from_bob[0].unread, 6);
    }
}
