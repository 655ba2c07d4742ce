use crate::entities::subscription_entity as subscriptions;
use crate::utils::format_month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Validated input for a new row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    /// Generated when absent.
    pub id: Option<Uuid>,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionPatch {
    pub service_name: Option<String>,
    pub price: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SubscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.service_name.is_none()
            && self.price.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// Aggregation window plus optional filters. The window is inclusive on both
/// ends and a row matches when its validity interval overlaps it.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalCostFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Option<String>,
    #[schema(example = "Netflix")]
    pub service_name: String,
    #[schema(example = 599)]
    pub price: i32,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(example = "09-2025")]
    pub start_date: String, // MM-YYYY
    #[schema(example = "03-2026")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    #[schema(example = "Netflix")]
    pub service_name: Option<String>,
    #[schema(example = 699)]
    pub price: Option<i32>,
    #[schema(example = "10-2025")]
    pub start_date: Option<String>,
    #[schema(example = "03-2026")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    #[schema(example = "09-2025")]
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "03-2026")]
    pub end_date: Option<String>,
}

impl From<subscriptions::Model> for SubscriptionResponse {
    fn from(m: subscriptions::Model) -> Self {
        Self {
            id: m.id,
            service_name: m.service_name,
            price: m.price,
            user_id: m.user_id,
            start_date: format_month(m.start_date),
            end_date: m.end_date.map(format_month),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsQuery {
    /// Page size, 1..=100 (default 10)
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Rows to skip (default 0)
    #[param(value_type = Option<i64>)]
    pub offset: Option<String>,
}

/// Non-numeric or missing values read as 0 and are normalised downstream.
fn lenient_int(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

impl ListSubscriptionsQuery {
    pub fn limit(&self) -> i64 {
        lenient_int(self.limit.as_deref())
    }

    pub fn offset(&self) -> i64 {
        lenient_int(self.offset.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalCostQuery {
    /// Filter by owner (UUID)
    pub user_id: Option<String>,
    /// Filter by exact service name
    pub service_name: Option<String>,
    /// Window start, MM-YYYY
    pub start: String,
    /// Window end, MM-YYYY
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalCostResponse {
    #[schema(example = 1598)]
    pub total: i64,
}
