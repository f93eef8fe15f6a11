use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::cpq::catalog::CatalogSnapshot;
use crate::cpq::{DeterministicQuoteResolver, QuoteResolver};
use crate::domain::catalog::TenantId;
use crate::domain::quote::{Quote, QuoteRequest};
use crate::errors::{ApplicationError, CatalogLoadError};

/// Source of validated per-tenant catalog snapshots.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn load_snapshot(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError>;
}

#[async_trait]
impl<P: CatalogProvider + ?Sized> CatalogProvider for Arc<P> {
    async fn load_snapshot(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        (**self).load_snapshot(tenant_id).await
    }
}

/// Loads a tenant catalog, runs the resolver against it, and records the
/// outcome. All I/O for a quote happens here.
pub struct QuoteService<P, R = DeterministicQuoteResolver> {
    provider: P,
    resolver: R,
    audit: Arc<dyn AuditSink>,
}

impl<P: CatalogProvider> QuoteService<P> {
    pub fn new(provider: P, resolver: DeterministicQuoteResolver) -> Self {
        Self { provider, resolver, audit: Arc::new(TracingAuditSink) }
    }
}

impl<P: CatalogProvider, R: QuoteResolver> QuoteService<P, R> {
    pub fn with_resolver(provider: P, resolver: R, audit: Arc<dyn AuditSink>) -> Self {
        Self { provider, resolver, audit }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
        request: &QuoteRequest,
        correlation_id: &str,
    ) -> Result<Quote, ApplicationError> {
        let snapshot = match self.provider.load_snapshot(tenant_id).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                let error = ApplicationError::from(error);
                warn!(
                    event_name = "quote.catalog.load_failed",
                    tenant_id = %tenant_id.0,
                    correlation_id,
                    error_class = error.error_class(),
                    error = %error,
                    "catalog snapshot could not be loaded"
                );
                self.audit.emit(
                    AuditEvent::new(
                        tenant_id.clone(),
                        correlation_id,
                        "quote.catalog_failed",
                        AuditCategory::Catalog,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error_class", error.error_class())
                    .with_metadata("error", error.to_string()),
                );
                return Err(error);
            }
        };

        match self.resolver.resolve(&snapshot, request) {
            Ok(quote) => {
                self.audit.emit(outcome_event(tenant_id, correlation_id, request, &quote));
                info!(
                    event_name = "quote.resolve.completed",
                    tenant_id = %tenant_id.0,
                    correlation_id,
                    manual = quote.is_manual(),
                    "quote resolved"
                );
                Ok(quote)
            }
            Err(error) => {
                let error = ApplicationError::from(error);
                warn!(
                    event_name = "quote.resolve.rejected",
                    tenant_id = %tenant_id.0,
                    correlation_id,
                    error_class = error.error_class(),
                    error = %error,
                    "quote request rejected"
                );
                self.audit.emit(
                    AuditEvent::new(
                        tenant_id.clone(),
                        correlation_id,
                        "quote.rejected",
                        AuditCategory::Pricing,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error_class", error.error_class())
                    .with_metadata("error", error.to_string()),
                );
                Err(error)
            }
        }
    }
}

fn outcome_event(
    tenant_id: &TenantId,
    correlation_id: &str,
    request: &QuoteRequest,
    quote: &Quote,
) -> AuditEvent {
    let lines = request.lines.len().to_string();
    match quote {
        Quote::Priced(priced) => AuditEvent::new(
            tenant_id.clone(),
            correlation_id,
            "quote.resolved",
            AuditCategory::Pricing,
            AuditOutcome::Success,
        )
        .with_metadata("zone_id", priced.zone_id.0.clone())
        .with_metadata("total", priced.total.to_string())
        .with_metadata("lines", lines),
        Quote::RequiresManualQuote(reason) => AuditEvent::new(
            tenant_id.clone(),
            correlation_id,
            "quote.manual_required",
            AuditCategory::Pricing,
            AuditOutcome::Success,
        )
        .with_metadata("zone_id", reason.zone_id.0.clone())
        .with_metadata("blocking_categories", reason.blocking_categories.join(","))
        .with_metadata("lines", lines),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{CatalogProvider, QuoteService};
    use crate::{
        audit::{AuditOutcome, InMemoryAuditSink},
        cpq::{catalog::CatalogSnapshot, DeterministicQuoteResolver},
        domain::catalog::TenantId,
        errors::{ApplicationError, CatalogLoadError, ResolutionError, ValidationError},
        fixtures::{demo_catalog, single_line_request, DEMO_TENANT},
    };

    struct StaticProvider {
        catalogs: HashMap<TenantId, Arc<CatalogSnapshot>>,
        fail_storage: bool,
    }

    impl StaticProvider {
        fn demo() -> Self {
            let snapshot = CatalogSnapshot::build(demo_catalog()).expect("demo catalog is valid");
            let catalogs = HashMap::from([(TenantId(DEMO_TENANT.to_string()), Arc::new(snapshot))]);
            Self { catalogs, fail_storage: false }
        }
    }

    #[async_trait]
    impl CatalogProvider for StaticProvider {
        async fn load_snapshot(
            &self,
            tenant_id: &TenantId,
        ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
            if self.fail_storage {
                return Err(CatalogLoadError::Storage("pool timed out".to_string()));
            }
            self.catalogs
                .get(tenant_id)
                .cloned()
                .ok_or_else(|| CatalogLoadError::TenantNotFound(tenant_id.0.clone()))
        }
    }

    fn build_service(
        provider: StaticProvider,
    ) -> (QuoteService<StaticProvider>, InMemoryAuditSink) {
        let sink = InMemoryAuditSink::default();
        let service = QuoteService::new(provider, DeterministicQuoteResolver::default())
            .with_audit_sink(Arc::new(sink.clone()));
        (service, sink)
    }

    fn demo_tenant() -> TenantId {
        TenantId(DEMO_TENANT.to_string())
    }

    #[tokio::test]
    async fn priced_quote_emits_resolved_audit_event() {
        let (service, sink) = build_service(StaticProvider::demo());

        let quote = service
            .resolve(&demo_tenant(), &single_line_request("Vila Nova", "cleaning", 2), "req-1")
            .await
            .expect("resolves");
        assert!(!quote.is_manual());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "quote.resolved");
        assert_eq!(events[0].correlation_id, "req-1");
        assert_eq!(events[0].metadata.get("zone_id").map(String::as_str), Some("zone-north"));
    }

    #[tokio::test]
    async fn manual_quote_is_an_ok_outcome_with_its_own_event() {
        let (service, sink) = build_service(StaticProvider::demo());

        let quote = service
            .resolve(&demo_tenant(), &single_line_request("Serra Alta", "cleaning", 1), "req-2")
            .await
            .expect("manual quote is not an error");
        assert!(quote.is_manual());
        assert_eq!(sink.events()[0].event_type, "quote.manual_required");
    }

    #[tokio::test]
    async fn validation_failure_is_audited_as_rejected() {
        let (service, sink) = build_service(StaticProvider::demo());

        let error = service
            .resolve(&demo_tenant(), &single_line_request("Centro", "cleaning", 0), "req-3")
            .await
            .expect_err("zero quantity is invalid");
        assert_eq!(
            error,
            ApplicationError::Resolution(ResolutionError::Validation(
                ValidationError::NonPositiveQuantity { line: 0 }
            ))
        );

        let events = sink.events();
        assert_eq!(events[0].event_type, "quote.rejected");
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].metadata.get("error_class").map(String::as_str), Some("validation"));
    }

    #[tokio::test]
    async fn catalog_failures_surface_as_catalog_errors() {
        let (service, sink) = build_service(StaticProvider::demo());
        let error = service
            .resolve(
                &TenantId("acme".to_string()),
                &single_line_request("Centro", "cleaning", 1),
                "req-4",
            )
            .await
            .expect_err("unknown tenant");
        assert_eq!(error.error_class(), "unknown_tenant");
        assert_eq!(sink.events()[0].event_type, "quote.catalog_failed");

        let mut broken = StaticProvider::demo();
        broken.fail_storage = true;
        let (service, _) = build_service(broken);
        let error = service
            .resolve(&demo_tenant(), &single_line_request("Centro", "cleaning", 1), "req-5")
            .await
            .expect_err("storage failure");
        assert!(matches!(error, ApplicationError::Catalog(CatalogLoadError::Storage(_))));
    }
}
