use crate::entities::subscription_entity as subscriptions;
use crate::error::{AppError, AppResult};
use crate::models::{NewSubscription, SubscriptionPatch, TotalCostFilter};
use crate::utils::{PageWindow, month_start};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

/// Persistence for subscription rows.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: DatabaseConnection,
}

fn not_found(id: Uuid) -> AppError {
    log::debug!("Subscription {id} not found");
    AppError::NotFound("subscription not found".to_string())
}

fn duplicate_id(id: Uuid) -> AppError {
    log::warn!("Subscription id {id} already exists");
    AppError::ConstraintViolation("subscription id already exists".to_string())
}

/// Row-level well-formedness, checked before every write.
fn check_row(
    service_name: &str,
    price: i32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::ConstraintViolation(
            "price must be positive".to_string(),
        ));
    }
    if service_name.trim().is_empty() {
        return Err(AppError::ConstraintViolation(
            "service name is required".to_string(),
        ));
    }
    if end_date.is_some_and(|end| end < start_date) {
        return Err(AppError::ConstraintViolation(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

impl SubscriptionRepository {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewSubscription) -> AppResult<subscriptions::Model> {
        let start_date = month_start(input.start_date);
        let end_date = input.end_date.map(month_start);
        check_row(&input.service_name, input.price, start_date, end_date)?;

        // 客户端指定的 id 不能覆盖已有记录
        if let Some(id) = input.id {
            if subscriptions::Entity::find_by_id(id)
                .one(&self.pool)
                .await?
                .is_some()
            {
                return Err(duplicate_id(id));
            }
        }

        let id = input.id.unwrap_or_else(Uuid::new_v4);
        let model = subscriptions::ActiveModel {
            id: Set(id),
            service_name: Set(input.service_name),
            price: Set(input.price),
            user_id: Set(input.user_id),
            start_date: Set(start_date),
            end_date: Set(end_date),
        }
        .insert(&self.pool)
        .await
        .map_err(|err: DbErr| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_id(id),
            _ => err.into(),
        })?;

        Ok(model)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<subscriptions::Model> {
        subscriptions::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Applies only the supplied fields and returns the row as stored.
    pub async fn update(
        &self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> AppResult<subscriptions::Model> {
        let txn = self.pool.begin().await?;

        let current = subscriptions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| not_found(id))?;

        let mut am = current.clone().into_active_model();
        let mut merged = current;
        if let Some(service_name) = patch.service_name {
            merged.service_name = service_name.clone();
            am.service_name = Set(service_name);
        }
        if let Some(price) = patch.price {
            merged.price = price;
            am.price = Set(price);
        }
        if let Some(start_date) = patch.start_date.map(month_start) {
            merged.start_date = start_date;
            am.start_date = Set(start_date);
        }
        if let Some(end_date) = patch.end_date.map(month_start) {
            merged.end_date = Some(end_date);
            am.end_date = Set(Some(end_date));
        }
        check_row(
            &merged.service_name,
            merged.price,
            merged.start_date,
            merged.end_date,
        )?;

        let updated = am.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = subscriptions::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Rows ordered by `start_date`, then `id`, so pages are stable.
    pub async fn list(&self, page: PageWindow) -> AppResult<Vec<subscriptions::Model>> {
        let rows = subscriptions::Entity::find()
            .order_by_asc(subscriptions::Column::StartDate)
            .order_by_asc(subscriptions::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Sum of `price` over rows whose validity overlaps `[start, end]`:
    /// `start_date <= end AND (end_date >= start OR end_date IS NULL)`.
    pub async fn get_total_cost(&self, filter: TotalCostFilter) -> AppResult<i64> {
        #[derive(Debug, FromQueryResult)]
        struct TotalRow {
            total: i64,
        }

        let start = month_start(filter.start);
        let end = month_start(filter.end);

        let mut query = subscriptions::Entity::find()
            .select_only()
            .column_as(
                Expr::expr(Expr::col(subscriptions::Column::Price).sum()).if_null(0i64),
                "total",
            )
            .filter(subscriptions::Column::StartDate.lte(end))
            .filter(
                Condition::any()
                    .add(subscriptions::Column::EndDate.gte(start))
                    .add(subscriptions::Column::EndDate.is_null()),
            );

        if let Some(user_id) = filter.user_id {
            query = query.filter(subscriptions::Column::UserId.eq(user_id));
        }
        if let Some(service_name) = filter.service_name {
            query = query.filter(subscriptions::Column::ServiceName.eq(service_name));
        }

        let total = query
            .into_model::<TotalRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.total)
            .unwrap_or(0);

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    fn new_sub(
        service_name: &str,
        price: i32,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> NewSubscription {
        NewSubscription {
            id: None,
            service_name: service_name.to_string(),
            price,
            user_id,
            start_date,
            end_date,
        }
    }

    fn window(start: NaiveDate, end: NaiveDate) -> TotalCostFilter {
        TotalCostFilter {
            user_id: None,
            service_name: None,
            start,
            end,
        }
    }

    async fn repo() -> SubscriptionRepository {
        SubscriptionRepository::new(test_pool().await)
    }

    #[tokio::test]
    async fn test_create_generates_id_and_keeps_fields() {
        let repo = repo().await;
        let user = Uuid::new_v4();
        let created = repo
            .create(new_sub("Netflix", 500, user, month(2025, 1), None))
            .await
            .unwrap();

        assert!(!created.id.is_nil());
        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.price, 500);
        assert_eq!(fetched.user_id, user);
        assert_eq!(fetched.end_date, None);
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_id_and_pins_month() {
        let repo = repo().await;
        let id = Uuid::new_v4();
        let mut input = new_sub(
            "Spotify",
            199,
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 4, 18).unwrap(),
            None,
        );
        input.id = Some(id);

        let created = repo.create(input).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.start_date, month(2025, 4));
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_rows() {
        let repo = repo().await;
        let user = Uuid::new_v4();

        for input in [
            new_sub("Netflix", 0, user, month(2025, 1), None),
            new_sub("Netflix", -10, user, month(2025, 1), None),
            new_sub("  ", 100, user, month(2025, 1), None),
            new_sub("Netflix", 100, user, month(2025, 5), Some(month(2025, 4))),
        ] {
            let err = repo.create(input).await.unwrap_err();
            assert!(matches!(err, AppError::ConstraintViolation(_)), "{err:?}");
        }
        assert!(repo.list(PageWindow::normalize(100, 0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_taken_id_is_constraint_violation() {
        let repo = repo().await;
        let id = Uuid::new_v4();
        let mut input = new_sub("Netflix", 500, Uuid::new_v4(), month(2025, 1), None);
        input.id = Some(id);

        repo.create(input.clone()).await.unwrap();
        input.price = 900;
        let err = repo.create(input).await.unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)), "{err:?}");
        assert_eq!(repo.get_by_id(id).await.unwrap().price, 500);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = repo().await;
        let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let repo = repo().await;
        let created = repo
            .create(new_sub("Netflix", 500, Uuid::new_v4(), month(2025, 1), None))
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                SubscriptionPatch {
                    price: Some(600),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 600);
        assert_eq!(updated.service_name, "Netflix");

        let updated = repo
            .update(
                created.id,
                SubscriptionPatch {
                    end_date: Some(month(2025, 12)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 600);
        assert_eq!(updated.end_date, Some(month(2025, 12)));
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo().await;
        let err = repo
            .update(
                Uuid::new_v4(),
                SubscriptionPatch {
                    price: Some(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_end_before_start() {
        let repo = repo().await;
        let created = repo
            .create(new_sub("Netflix", 500, Uuid::new_v4(), month(2025, 6), None))
            .await
            .unwrap();

        let err = repo
            .update(
                created.id,
                SubscriptionPatch {
                    end_date: Some(month(2025, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)));
        assert_eq!(repo.get_by_id(created.id).await.unwrap().end_date, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let created = repo
            .create(new_sub("Netflix", 500, Uuid::new_v4(), month(2025, 1), None))
            .await
            .unwrap();

        repo.delete(created.id).await.unwrap();
        assert!(matches!(
            repo.get_by_id(created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paged() {
        let repo = repo().await;
        let user = Uuid::new_v4();
        for m in [5, 1, 3, 2, 4] {
            repo.create(new_sub("Netflix", 100, user, month(2025, m), None))
                .await
                .unwrap();
        }

        let all = repo.list(PageWindow::normalize(10, 0)).await.unwrap();
        let starts: Vec<_> = all.iter().map(|s| s.start_date).collect();
        assert_eq!(
            starts,
            vec![
                month(2025, 1),
                month(2025, 2),
                month(2025, 3),
                month(2025, 4),
                month(2025, 5)
            ]
        );

        let page = repo.list(PageWindow::normalize(2, 2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].start_date, month(2025, 3));
        assert_eq!(page[1].start_date, month(2025, 4));

        let past_end = repo.list(PageWindow::normalize(10, 50)).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_total_cost_counts_partial_overlap() {
        let repo = repo().await;
        repo.create(new_sub(
            "Netflix",
            500,
            Uuid::new_v4(),
            month(2025, 1),
            Some(month(2025, 3)),
        ))
        .await
        .unwrap();

        let total = repo
            .get_total_cost(window(month(2025, 2), month(2025, 2)))
            .await
            .unwrap();
        assert_eq!(total, 500);
    }

    #[tokio::test]
    async fn test_total_cost_counts_open_ended() {
        let repo = repo().await;
        repo.create(new_sub("Netflix", 500, Uuid::new_v4(), month(2025, 1), None))
            .await
            .unwrap();

        let total = repo
            .get_total_cost(window(month(2030, 1), month(2030, 12)))
            .await
            .unwrap();
        assert_eq!(total, 500);
    }

    #[tokio::test]
    async fn test_total_cost_skips_disjoint() {
        let repo = repo().await;
        repo.create(new_sub(
            "Netflix",
            500,
            Uuid::new_v4(),
            month(2025, 5),
            Some(month(2025, 6)),
        ))
        .await
        .unwrap();
        // starts after the window
        repo.create(new_sub("Spotify", 300, Uuid::new_v4(), month(2025, 3), None))
            .await
            .unwrap();

        let total = repo
            .get_total_cost(window(month(2025, 1), month(2025, 2)))
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_total_cost_boundaries_are_inclusive() {
        let repo = repo().await;
        let user = Uuid::new_v4();
        // ends exactly on window start
        repo.create(new_sub("A", 100, user, month(2024, 10), Some(month(2025, 1))))
            .await
            .unwrap();
        // starts exactly on window end
        repo.create(new_sub("B", 200, user, month(2025, 6), None))
            .await
            .unwrap();

        let total = repo
            .get_total_cost(window(month(2025, 1), month(2025, 6)))
            .await
            .unwrap();
        assert_eq!(total, 300);
    }

    #[tokio::test]
    async fn test_total_cost_empty_table_is_zero() {
        let repo = repo().await;
        let total = repo
            .get_total_cost(window(month(2025, 1), month(2025, 12)))
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_total_cost_filters() {
        let repo = repo().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        for (name, price, user) in [
            ("Netflix", 500, alice),
            ("Spotify", 200, alice),
            ("Netflix", 700, bob),
        ] {
            repo.create(new_sub(name, price, user, month(2025, 1), None))
                .await
                .unwrap();
        }
        let base = window(month(2025, 1), month(2025, 12));

        let unfiltered = repo.get_total_cost(base.clone()).await.unwrap();
        assert_eq!(unfiltered, 1400);

        let by_user = repo
            .get_total_cost(TotalCostFilter {
                user_id: Some(alice),
                ..base.clone()
            })
            .await
            .unwrap();
        assert_eq!(by_user, 700);

        let by_service = repo
            .get_total_cost(TotalCostFilter {
                service_name: Some("Netflix".to_string()),
                ..base.clone()
            })
            .await
            .unwrap();
        assert_eq!(by_service, 1200);

        let both = repo
            .get_total_cost(TotalCostFilter {
                user_id: Some(bob),
                service_name: Some("Netflix".to_string()),
                ..base.clone()
            })
            .await
            .unwrap();
        assert_eq!(both, 700);

        let nobody = repo
            .get_total_cost(TotalCostFilter {
                user_id: Some(Uuid::new_v4()),
                ..base
            })
            .await
            .unwrap();
        assert_eq!(nobody, 0);
    }
}
