use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterData, TableSpec};

/// Filtered reads over one table.
pub struct Repository<T> {
    spec: TableSpec,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(spec: TableSpec, pool: PgPool) -> Self {
        Self {
            spec,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.spec)
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.spec)
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_404(&self, filter_data: FilterData) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", self.spec.name)))
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(self.spec)
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    /// Fetch a row owned by `user_id`; rows of other users read as missing.
    pub async fn select_owned(&self, id: Uuid, user_id: Uuid) -> Result<T, DatabaseError> {
        self.select_404(FilterData {
            where_clause: Some(json!({ "id": id, "user_id": user_id })),
            ..Default::default()
        })
        .await
    }

    /// Delete a row owned by `user_id`. Returns false when nothing matched.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1 AND user_id = $2", self.spec.name);
        let result = sqlx::query(&sql).bind(id).bind(user_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
