use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    entity::{item::DEFAULT_IMAGE, prelude::*},
    error::{positive_price, required, ValidationError},
    ids::{RequestId, UserId},
    service::{card_for, load_cards, page_index, Page, UserCard},
    time,
};

pub const PER_PAGE: u64 = 12;

#[derive(Debug, Error)]
pub enum RequestsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("request not found")]
    RequestNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("forbidden: not the owner")]
    Forbidden,
}

/// A want-ad as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestForm {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestCard {
    #[serde(flatten)]
    pub request: RequestModel,
    pub author: UserCard,
}

fn validate(form: &RequestForm) -> Result<(String, String, f64), ValidationError> {
    Ok((
        required("title", &form.title)?,
        required("description", &form.description)?,
        positive_price(form.price)?,
    ))
}

pub(crate) async fn requests_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<RequestModel>, DbErr> {
    Request::find()
        .filter(RequestColumn::UserId.eq(user_id))
        .order_by_desc(RequestColumn::DatePosted)
        .order_by_desc(RequestColumn::Id)
        .all(conn)
        .await
}

#[derive(Clone)]
pub struct RequestsService {
    db: DatabaseConnection,
}

impl RequestsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first, 12 per page. `search` matches title or description.
    pub async fn list_requests(
        &self,
        search: &str,
        page: u64,
    ) -> Result<Page<RequestCard>, RequestsServiceError> {
        let (page, index) = page_index(page);

        let mut query = Request::find();
        let search = search.trim();
        if !search.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(RequestColumn::Title.contains(search))
                    .add(RequestColumn::Description.contains(search)),
            );
        }

        let paginator = query
            .order_by_desc(RequestColumn::DatePosted)
            .order_by_desc(RequestColumn::Id)
            .paginate(&self.db, PER_PAGE);
        let totals = paginator.num_items_and_pages().await?;
        let requests = paginator.fetch_page(index).await?;

        let authors = load_cards(&self.db, requests.iter().map(|r| r.user_id)).await?;
        let cards = requests
            .into_iter()
            .map(|request| RequestCard {
                author: card_for(&authors, request.user_id),
                request,
            })
            .collect();

        Ok(Page::new(cards, page, PER_PAGE, totals))
    }

    pub async fn create(
        &self,
        user_id: UserId,
        form: RequestForm,
    ) -> Result<RequestModel, RequestsServiceError> {
        let (title, description, price) = validate(&form)?;
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(RequestsServiceError::UserNotFound)?;

        let image_file = form
            .image_file
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        let request = RequestActiveModel {
            id: Set(RequestId::new()),
            title: Set(title),
            description: Set(description),
            price: Set(price),
            image_file: Set(image_file),
            date_posted: Set(time::now()),
            user_id: Set(user_id),
        };

        let request = Request::insert(request).exec_with_returning(&self.db).await?;
        info!(request = %request.id, user = %user_id, "posted request");
        Ok(request)
    }

    pub async fn get(&self, request_id: RequestId) -> Result<RequestCard, RequestsServiceError> {
        let request = Request::find_by_id(request_id)
            .one(&self.db)
            .await?
            .ok_or(RequestsServiceError::RequestNotFound)?;
        let authors = load_cards(&self.db, [request.user_id]).await?;

        Ok(RequestCard {
            author: card_for(&authors, request.user_id),
            request,
        })
    }

    pub async fn update(
        &self,
        owner_id: UserId,
        request_id: RequestId,
        form: RequestForm,
    ) -> Result<RequestModel, RequestsServiceError> {
        let request = self.get(request_id).await?.request;
        if request.user_id != owner_id {
            return Err(RequestsServiceError::Forbidden);
        }
        let (title, description, price) = validate(&form)?;

        let mut active: RequestActiveModel = request.into();
        active.title = Set(title);
        active.description = Set(description);
        active.price = Set(price);
        if let Some(file) = form.image_file.filter(|f| !f.trim().is_empty()) {
            active.image_file = Set(file);
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(
        &self,
        actor: &UserModel,
        request_id: RequestId,
    ) -> Result<(), RequestsServiceError> {
        let request = self.get(request_id).await?.request;
        if request.user_id != actor.id && !actor.is_admin {
            return Err(RequestsServiceError::Forbidden);
        }

        request.delete(&self.db).await?;
        info!(request = %request_id, actor = %actor.id, "deleted request");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::memory_db,
        service::tests_support::{seed_admin, seed_user},
    };

    async fn setup() -> (DatabaseConnection, RequestsService) {
        let db = memory_db().await;
        let service = RequestsService::new(db.clone());
        (db, service)
    }

    fn form(title: &str) -> RequestForm {
        RequestForm {
            title: title.to_string(),
            description: format!("looking for a {title}"),
            price: 30.0,
            image_file: None,
        }
    }

    #[tokio::test]
    async fn test_request_lifecycle() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let admin = seed_admin(&db, "root").await;

        let request = service.create(alice.id, form("monitor")).await.unwrap();
        assert_eq!(request.image_file, DEFAULT_IMAGE);

        let card = service.get(request.id).await.unwrap();
        assert_eq!(card.author.username, "alice");

        assert!(matches!(
            service.update(bob.id, request.id, form("tv")).await,
            Err(RequestsServiceError::Forbidden)
        ));
        let updated = service.update(alice.id, request.id, form("tv")).await.unwrap();
        assert_eq!(updated.title, "tv");

        assert!(matches!(
            service.delete(&bob, request.id).await,
            Err(RequestsServiceError::Forbidden)
        ));
        service.delete(&admin, request.id).await.unwrap();
        assert!(matches!(
            service.get(request.id).await,
            Err(RequestsServiceError::RequestNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_requests_search_and_order() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;

        service.create(alice.id, form("chair")).await.unwrap();
        let desk = service.create(alice.id, form("desk")).await.unwrap();

        let page = service.list_requests("", 1).await.unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].request.id, desk.id);

        let found = service.list_requests("DESK", 1).await.unwrap();
        assert_eq!(found.total_items, 1);

        assert!(matches!(
            service
                .create(
                    alice.id,
                    RequestForm {
                        price: -1.0,
                        ..form("bad")
                    }
                )
                .await,
            Err(RequestsServiceError::Validation(_))
        ));

        assert_eq!(requests_by_user(&db, alice.id).await.unwrap().len(), 2);
    }
}
