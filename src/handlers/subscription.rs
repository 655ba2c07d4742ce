use crate::config::TimeoutConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SubscriptionService;
use crate::utils::{parse_month, with_deadline};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use uuid::Uuid;

fn parse_uuid(value: &str, message: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| AppError::ValidationError(message.to_string()))
}

fn parse_month_field(value: &str, field: &str) -> AppResult<NaiveDate> {
    parse_month(value.trim())
        .ok_or_else(|| AppError::ValidationError(format!("invalid {field} format")))
}

/// Empty query values count as "no filter".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn subscription_id(path: &str) -> AppResult<Uuid> {
    parse_uuid(path, "invalid subscription id")
}

impl TryFrom<CreateSubscriptionRequest> for NewSubscription {
    type Error = AppError;

    fn try_from(req: CreateSubscriptionRequest) -> AppResult<Self> {
        let id = non_empty(req.id)
            .map(|id| parse_uuid(&id, "invalid id format"))
            .transpose()?;
        Ok(Self {
            id,
            user_id: parse_uuid(&req.user_id, "invalid user_id format")?,
            start_date: parse_month_field(&req.start_date, "start_date")?,
            end_date: req
                .end_date
                .as_deref()
                .map(|d| parse_month_field(d, "end_date"))
                .transpose()?,
            service_name: req.service_name,
            price: req.price,
        })
    }
}

impl TryFrom<UpdateSubscriptionRequest> for SubscriptionPatch {
    type Error = AppError;

    fn try_from(req: UpdateSubscriptionRequest) -> AppResult<Self> {
        Ok(Self {
            service_name: req.service_name,
            price: req.price,
            start_date: req
                .start_date
                .as_deref()
                .map(|d| parse_month_field(d, "start_date"))
                .transpose()?,
            end_date: req
                .end_date
                .as_deref()
                .map(|d| parse_month_field(d, "end_date"))
                .transpose()?,
        })
    }
}

impl TryFrom<TotalCostQuery> for TotalCostFilter {
    type Error = AppError;

    fn try_from(query: TotalCostQuery) -> AppResult<Self> {
        Ok(Self {
            user_id: non_empty(query.user_id)
                .map(|id| parse_uuid(&id, "invalid user_id format"))
                .transpose()?,
            service_name: non_empty(query.service_name),
            start: parse_month_field(&query.start, "start date")?,
            end: parse_month_field(&query.end, "end date")?,
        })
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
        (status = 504, description = "Deadline exceeded", body = ErrorResponse)
    )
)]
pub async fn create_subscription(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    request: web::Json<CreateSubscriptionRequest>,
) -> AppResult<HttpResponse> {
    let input = NewSubscription::try_from(request.into_inner())?;
    log::debug!(
        "Creating subscription (service={}, user={})",
        input.service_name,
        input.user_id
    );
    let created = with_deadline(timeouts.create(), service.create(input)).await?;
    Ok(HttpResponse::Created().json(SubscriptionResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn get_subscription(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = subscription_id(&path)?;
    let sub = with_deadline(timeouts.get(), service.get_by_id(id)).await?;
    Ok(HttpResponse::Ok().json(SubscriptionResponse::from(sub)))
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscriptions",
    params(ListSubscriptionsQuery),
    responses(
        (status = 200, description = "Page of subscriptions", body = [SubscriptionResponse]),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    )
)]
pub async fn list_subscriptions(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    query: web::Query<ListSubscriptionsQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.limit();
    let offset = query.offset();
    let rows = with_deadline(timeouts.list(), service.list(limit, offset)).await?;
    let body: Vec<SubscriptionResponse> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    patch,
    path = "/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn update_subscription(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    path: web::Path<String>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> AppResult<HttpResponse> {
    let id = subscription_id(&path)?;
    let patch = SubscriptionPatch::try_from(request.into_inner())?;
    let updated = with_deadline(timeouts.update(), service.update(id, patch)).await?;
    Ok(HttpResponse::Ok().json(SubscriptionResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn delete_subscription(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = subscription_id(&path)?;
    with_deadline(timeouts.delete(), service.delete(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/subscriptions/total",
    tag = "subscriptions",
    params(TotalCostQuery),
    responses(
        (status = 200, description = "Summed price of overlapping subscriptions", body = TotalCostResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    )
)]
pub async fn get_total_cost(
    service: web::Data<SubscriptionService>,
    timeouts: web::Data<TimeoutConfig>,
    query: web::Query<TotalCostQuery>,
) -> AppResult<HttpResponse> {
    let filter = TotalCostFilter::try_from(query.into_inner())?;
    let total = with_deadline(timeouts.total_cost(), service.get_total_cost(filter)).await?;
    Ok(HttpResponse::Ok().json(TotalCostResponse { total }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {err}");
        AppError::ValidationError("invalid request body".to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected query string: {err}");
        AppError::ValidationError("invalid query parameters".to_string()).into()
    })
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscriptions")
            .app_data(json_config())
            .app_data(query_config())
            .route("", web::post().to(create_subscription))
            .route("", web::get().to(list_subscriptions))
            .route("/total", web::get().to(get_total_cost))
            .route("/{id}", web::get().to(get_subscription))
            .route("/{id}", web::patch().to(update_subscription))
            .route("/{id}", web::delete().to(delete_subscription)),
    );
}
