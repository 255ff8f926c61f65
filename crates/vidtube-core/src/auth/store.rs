use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::user::{self, Entity as User};

/// Persistence the session manager needs from the user collection.
///
/// Every write touches one column of one row, so each call is atomic on its own.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Fetch a principal by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DbErr>;

    /// Fetch a principal whose username or email equals `identifier`.
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<user::Model>, DbErr>;

    /// Overwrite (or clear, with `None`) the stored refresh digest.
    ///
    /// Returns `false` when no principal with `id` exists.
    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<bool, DbErr>;

    /// Replace the stored digest only if it still equals `current`.
    ///
    /// Returns `false` when the stored value changed underneath the caller.
    async fn swap_refresh_token_hash(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, DbErr>;
}

/// [`PrincipalStore`] backed by the `users` table.
#[derive(Clone)]
pub struct SeaPrincipalStore {
    db: DatabaseConnection,
}

impl SeaPrincipalStore {
    pub fn new(db: DatabaseConnection) -> Self {
        SeaPrincipalStore { db }
    }
}

#[async_trait]
impl PrincipalStore for SeaPrincipalStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(id).one(&self.db).await
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        let identifier = identifier.trim().to_lowercase();
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier.as_str()))
                    .add(user::Column::Email.eq(identifier.as_str())),
            )
            .one(&self.db)
            .await
    }

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<bool, DbErr> {
        let result = User::update_many()
            .col_expr(
                user::Column::RefreshTokenHash,
                Expr::value(hash.map(str::to_string)),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn swap_refresh_token_hash(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, DbErr> {
        let result = User::update_many()
            .col_expr(user::Column::RefreshTokenHash, Expr::value(next.to_string()))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::RefreshTokenHash.eq(current))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
