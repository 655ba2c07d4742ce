use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::subscription::create_subscription,
        handlers::subscription::get_subscription,
        handlers::subscription::list_subscriptions,
        handlers::subscription::update_subscription,
        handlers::subscription::delete_subscription,
        handlers::subscription::get_total_cost,
    ),
    components(
        schemas(
            CreateSubscriptionRequest,
            UpdateSubscriptionRequest,
            SubscriptionResponse,
            TotalCostResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "subscriptions", description = "Subscription records and cost aggregation"),
    ),
    info(
        title = "Subtrack API",
        version = "1.0.0",
        description = "Subscription tracking REST API"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/subscriptions".to_string()));
        assert!(paths.contains(&"/subscriptions/{id}".to_string()));
        assert!(paths.contains(&"/subscriptions/total".to_string()));
    }
}
