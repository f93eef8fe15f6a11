pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod service;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use cpq::catalog::{CatalogIssue, CatalogSnapshot};
pub use cpq::policy::{LineRounding, PricingPolicy, TierModifierPolicy, TierOverflowPolicy};
pub use cpq::{DeterministicQuoteResolver, QuoteResolver};
pub use domain::catalog::{CatalogData, TenantId};
pub use domain::quote::{Quote, QuoteRequest};
pub use errors::{
    ApplicationError, CatalogLoadError, ConfigurationError, InterfaceError, ResolutionError,
    ValidationError,
};
pub use service::{CatalogProvider, QuoteService};
