use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    entity::{item::DEFAULT_IMAGE, prelude::*},
    error::{positive_quantity, required, ValidationError},
    ids::{StockId, UserId},
    time,
};

#[derive(Debug, Error)]
pub enum StocksServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("stock entry not found")]
    StockNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("forbidden: not the owner")]
    Forbidden,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockForm {
    pub name: String,
    pub quantity: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Newest first.
pub(crate) async fn stocks_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<StockModel>, DbErr> {
    Stock::find()
        .filter(StockColumn::UserId.eq(user_id))
        .order_by_desc(StockColumn::DateAdded)
        .order_by_desc(StockColumn::Id)
        .all(conn)
        .await
}

#[derive(Clone)]
pub struct StocksService {
    db: DatabaseConnection,
}

impl StocksService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: UserId,
        form: StockForm,
    ) -> Result<StockModel, StocksServiceError> {
        let name = required("name", &form.name)?;
        let quantity = positive_quantity("quantity", form.quantity)?;
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(StocksServiceError::UserNotFound)?;

        let stock = StockActiveModel {
            id: Set(StockId::new()),
            name: Set(name),
            quantity: Set(quantity),
            description: Set(non_blank(form.description)),
            image_file: Set(non_blank(form.image_file).unwrap_or_else(|| DEFAULT_IMAGE.to_string())),
            date_added: Set(time::now()),
            user_id: Set(user_id),
        };

        let stock = Stock::insert(stock).exec_with_returning(&self.db).await?;
        info!(stock = %stock.id, user = %user_id, "added stock");
        Ok(stock)
    }

    pub async fn get(&self, stock_id: StockId) -> Result<StockModel, StocksServiceError> {
        Stock::find_by_id(stock_id)
            .one(&self.db)
            .await?
            .ok_or(StocksServiceError::StockNotFound)
    }

    /// Owner-only lookup, for the edit form.
    pub async fn get_owned(
        &self,
        owner_id: UserId,
        stock_id: StockId,
    ) -> Result<StockModel, StocksServiceError> {
        let stock = self.get(stock_id).await?;
        if stock.user_id != owner_id {
            return Err(StocksServiceError::Forbidden);
        }
        Ok(stock)
    }

    pub async fn update(
        &self,
        owner_id: UserId,
        stock_id: StockId,
        form: StockForm,
    ) -> Result<StockModel, StocksServiceError> {
        let stock = self.get_owned(owner_id, stock_id).await?;
        let name = required("name", &form.name)?;
        let quantity = positive_quantity("quantity", form.quantity)?;

        let mut active: StockActiveModel = stock.into();
        active.name = Set(name);
        active.quantity = Set(quantity);
        active.description = Set(non_blank(form.description));
        if let Some(file) = non_blank(form.image_file) {
            active.image_file = Set(file);
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, owner_id: UserId, stock_id: StockId) -> Result<(), StocksServiceError> {
        let stock = self.get_owned(owner_id, stock_id).await?;
        stock.delete(&self.db).await?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<StockModel>, StocksServiceError> {
        Ok(stocks_by_user(&self.db, user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::memory_db, service::tests_support::seed_user};

    async fn setup() -> (DatabaseConnection, StocksService) {
        let db = memory_db().await;
        let service = StocksService::new(db.clone());
        (db, service)
    }

    fn form(name: &str, quantity: i32) -> StockForm {
        StockForm {
            name: name.to_string(),
            quantity,
            description: Some("   ".into()),
            image_file: None,
        }
    }

    #[tokio::test]
    async fn test_stock_crud_is_owner_only() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let stock = service.create(alice.id, form("Textbook", 2)).await.unwrap();
        assert_eq!(stock.description, None);
        assert_eq!(stock.image_file, DEFAULT_IMAGE);

        assert!(matches!(
            service.create(alice.id, form("Textbook", 0)).await,
            Err(StocksServiceError::Validation(_))
        ));

        assert!(matches!(
            service.update(bob.id, stock.id, form("Mine now", 1)).await,
            Err(StocksServiceError::Forbidden)
        ));
        let updated = service
            .update(
                alice.id,
                stock.id,
                StockForm {
                    description: Some("2nd edition".into()),
                    ..form("Textbook", 5)
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.description.as_deref(), Some("2nd edition"));

        service.create(alice.id, form("Kettle", 1)).await.unwrap();
        let listed = service.list_for_user(alice.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Kettle");

        assert!(matches!(
            service.delete(bob.id, stock.id).await,
            Err(StocksServiceError::Forbidden)
        ));
        service.delete(alice.id, stock.id).await.unwrap();
        assert!(matches!(
            service.get(stock.id).await,
            Err(StocksServiceError::StockNotFound)
        ));
    }
}
