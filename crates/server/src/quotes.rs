use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use fieldquote_core::domain::catalog::TenantId;
use fieldquote_core::domain::quote::QuoteRequest;
use fieldquote_core::errors::InterfaceError;
use fieldquote_core::{CatalogProvider, QuoteService};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

pub struct QuoteState<P> {
    service: Arc<QuoteService<P>>,
}

impl<P> Clone for QuoteState<P> {
    fn clone(&self) -> Self {
        Self { service: Arc::clone(&self.service) }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_class: &'static str,
    pub message: String,
    pub correlation_id: String,
}

pub fn router<P>(service: Arc<QuoteService<P>>) -> Router
where
    P: CatalogProvider + 'static,
{
    Router::new()
        .route("/api/v1/tenants/{tenant_id}/quotes", post(create_quote::<P>))
        .with_state(QuoteState { service })
}

async fn create_quote<P>(
    State(state): State<QuoteState<P>>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Response
where
    P: CatalogProvider + 'static,
{
    let correlation_id = correlation_id(&headers);

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(
                event_name = "quote.http.invalid_body",
                correlation_id = %correlation_id,
                tenant_id = %tenant_id,
                error = %rejection.body_text(),
                "rejected malformed quote request body"
            );
            let body = ErrorBody {
                error_class: "invalid_body",
                message: rejection.body_text(),
                correlation_id: correlation_id.clone(),
            };
            return respond(StatusCode::BAD_REQUEST, body, &correlation_id);
        }
    };

    let tenant_id = TenantId(tenant_id);
    match state.service.resolve(&tenant_id, &request, &correlation_id).await {
        Ok(quote) => respond(StatusCode::OK, quote, &correlation_id),
        Err(error) => {
            let error_class = error.error_class();
            let interface = error.into_interface(correlation_id.clone());
            let (status, body) = error_response(error_class, interface);
            if status.is_server_error() {
                warn!(
                    event_name = "quote.http.failed",
                    correlation_id = %correlation_id,
                    tenant_id = %tenant_id.0,
                    error_class,
                    status = status.as_u16(),
                    "quote request failed"
                );
            }
            respond(status, body, &correlation_id)
        }
    }
}

/// Caller-supplied correlation id, or a fresh UUID v4 when absent or unusable.
fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Validation failures echo their detail; operator-facing failures only
/// expose the user-safe message.
fn error_response(error_class: &'static str, error: InterfaceError) -> (StatusCode, ErrorBody) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &error {
        InterfaceError::BadRequest { message, .. } => message.clone(),
        _ => error.user_message().to_string(),
    };

    let body =
        ErrorBody { error_class, message, correlation_id: error.correlation_id().to_string() };
    (status, body)
}

fn respond(status: StatusCode, body: impl Serialize, correlation_id: &str) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use fieldquote_core::domain::catalog::TenantId;
    use fieldquote_core::errors::CatalogLoadError;
    use fieldquote_core::fixtures::demo_catalog;
    use fieldquote_core::{
        CatalogProvider, CatalogSnapshot, DeterministicQuoteResolver, LineRounding, PricingPolicy,
        QuoteService,
    };
    use fieldquote_db::InMemoryCatalogRepository;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::{router, CORRELATION_HEADER};

    struct UnavailableCatalog;

    #[async_trait]
    impl CatalogProvider for UnavailableCatalog {
        async fn load_snapshot(
            &self,
            _tenant_id: &TenantId,
        ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
            Err(CatalogLoadError::Storage("database is locked".to_string()))
        }
    }

    fn resolver() -> DeterministicQuoteResolver {
        DeterministicQuoteResolver::new(PricingPolicy {
            line_rounding: LineRounding::WholeUnits,
            ..PricingPolicy::default()
        })
    }

    fn demo_app() -> Router {
        let repository =
            InMemoryCatalogRepository::with_catalog(TenantId("demo".to_string()), demo_catalog());
        router(Arc::new(QuoteService::new(repository, resolver())))
    }

    fn quote_request(tenant: &str, body: &str, correlation_id: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/tenants/{tenant}/quotes"))
            .header("content-type", "application/json");
        if let Some(correlation_id) = correlation_id {
            builder = builder.header(CORRELATION_HEADER, correlation_id);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_000_000).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn header(response: &Response) -> String {
        response
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn priced_quote_returns_ok_and_echoes_correlation_id() {
        let response = demo_app()
            .oneshot(quote_request(
                "demo",
                r#"{"neighborhood":"Vila Nova","lines":[{"service_id":"cleaning","quantity":3}]}"#,
                Some("req-42"),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response), "req-42");

        let body = body_json(response).await;
        assert_eq!(body["outcome"], "priced");
        let total = body["total"].as_str().expect("decimal string");
        assert_eq!(Decimal::from_str(total).expect("decimal"), Decimal::new(595, 0));
    }

    #[tokio::test]
    async fn manual_quote_is_a_successful_outcome() {
        let response = demo_app()
            .oneshot(quote_request(
                "demo",
                r#"{"neighborhood":"Serra Alta","lines":[
                    {"service_id":"install-18k","quantity":1,"selected_option_ids":["line-set-3m"]}
                ]}"#,
                None,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(Uuid::parse_str(&header(&response)).is_ok(), "generated correlation id");

        let body = body_json(response).await;
        assert_eq!(body["outcome"], "requires_manual_quote");
        assert_eq!(body["zone_id"], "zone-remote");
    }

    #[tokio::test]
    async fn validation_failures_and_unknown_tenants_are_bad_requests() {
        let unknown_service = demo_app()
            .oneshot(quote_request(
                "demo",
                r#"{"neighborhood":"Centro","lines":[{"service_id":"window-tint","quantity":1}]}"#,
                Some("req-7"),
            ))
            .await
            .expect("response");
        assert_eq!(unknown_service.status(), StatusCode::BAD_REQUEST);
        let body = body_json(unknown_service).await;
        assert_eq!(body["error_class"], "validation");
        assert_eq!(body["correlation_id"], "req-7");
        assert!(body["message"].as_str().is_some_and(|message| message.contains("window-tint")));

        let unknown_tenant = demo_app()
            .oneshot(quote_request(
                "acme",
                r#"{"neighborhood":"Centro","lines":[{"service_id":"cleaning","quantity":1}]}"#,
                None,
            ))
            .await
            .expect("response");
        assert_eq!(unknown_tenant.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(unknown_tenant).await["error_class"], "unknown_tenant");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_with_correlation_id() {
        let response = demo_app()
            .oneshot(quote_request("demo", r#"{"neighborhood": 12}"#, Some("req-9")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response), "req-9");
        assert_eq!(body_json(response).await["error_class"], "invalid_body");
    }

    #[tokio::test]
    async fn broken_catalog_is_an_internal_error() {
        let mut broken = demo_catalog();
        broken.zones.iter_mut().for_each(|zone| zone.is_default = false);
        let repository =
            InMemoryCatalogRepository::with_catalog(TenantId("demo".to_string()), broken);
        let app = router(Arc::new(QuoteService::new(repository, resolver())));

        let response = app
            .oneshot(quote_request(
                "demo",
                r#"{"neighborhood":"Centro","lines":[{"service_id":"cleaning","quantity":1}]}"#,
                None,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error_class"], "catalog_configuration");
        assert!(body["message"].as_str().is_some_and(|message| message.contains("operator")));
    }

    #[tokio::test]
    async fn storage_failures_are_service_unavailable() {
        let app = router(Arc::new(QuoteService::new(UnavailableCatalog, resolver())));

        let response = app
            .oneshot(quote_request(
                "demo",
                r#"{"neighborhood":"Centro","lines":[{"service_id":"cleaning","quantity":1}]}"#,
                Some("req-503"),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(header(&response), "req-503");
        let body = body_json(response).await;
        assert_eq!(body["error_class"], "catalog_storage");
        assert!(!body["message"].as_str().unwrap_or_default().contains("locked"));
    }
}
