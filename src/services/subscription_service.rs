use crate::entities::subscription_entity as subscriptions;
use crate::error::{AppError, AppResult};
use crate::models::{NewSubscription, SubscriptionPatch, TotalCostFilter};
use crate::repositories::SubscriptionRepository;
use crate::utils::PageWindow;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionService {
    repo: SubscriptionRepository,
}

fn validate_price(price: i32) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::ValidationError(
            "price must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_service_name(service_name: &str) -> AppResult<()> {
    if service_name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "service name is required".to_string(),
        ));
    }
    Ok(())
}

impl SubscriptionService {
    pub fn new(repo: SubscriptionRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: NewSubscription) -> AppResult<subscriptions::Model> {
        validate_price(input.price)?;
        validate_service_name(&input.service_name)?;
        if input.end_date.is_some_and(|end| end < input.start_date) {
            return Err(AppError::ValidationError(
                "end_date must not be before start_date".to_string(),
            ));
        }

        log::debug!("Calling store to create subscription");
        let created = self.repo.create(input).await?;
        log::info!(
            "Subscription {} created (service={}, user={})",
            created.id,
            created.service_name,
            created.user_id
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<subscriptions::Model> {
        log::debug!("Calling store to get subscription {id}");
        self.repo.get_by_id(id).await
    }

    /// Price is only checked when the patch carries one.
    pub async fn update(
        &self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> AppResult<subscriptions::Model> {
        if patch.is_empty() {
            return Err(AppError::ValidationError(
                "no fields for update".to_string(),
            ));
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        if let Some(service_name) = patch.service_name.as_deref() {
            validate_service_name(service_name)?;
        }

        log::debug!("Calling store to update subscription {id}");
        let updated = self.repo.update(id, patch).await?;
        log::info!("Subscription {id} updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        log::debug!("Calling store to delete subscription {id}");
        self.repo.delete(id).await?;
        log::info!("Subscription {id} deleted");
        Ok(())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<subscriptions::Model>> {
        let page = PageWindow::normalize(limit, offset);
        log::debug!(
            "Calling store to list subscriptions (limit={}, offset={})",
            page.limit,
            page.offset
        );
        self.repo.list(page).await
    }

    pub async fn get_total_cost(&self, filter: TotalCostFilter) -> AppResult<i64> {
        log::debug!("Calling store to get total cost for {filter:?}");
        self.repo.get_total_cost(filter).await
    }
}
