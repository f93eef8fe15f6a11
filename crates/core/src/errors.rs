use thiserror::Error;

/// A malformed quote request. Always surfaced to the caller, never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quote request must contain at least one line")]
    EmptyRequest,
    #[error("line {line}: quantity must be at least 1")]
    NonPositiveQuantity { line: usize },
    #[error("line {line}: unknown service `{service_id}`")]
    UnknownService { line: usize, service_id: String },
    #[error("line {line}: option `{option_id}` does not belong to service `{service_id}`")]
    UnknownOption { line: usize, service_id: String, option_id: String },
    #[error("line {line}: required variable `{variable_id}` of service `{service_id}` has no selection")]
    MissingRequiredSelection { line: usize, service_id: String, variable_id: String },
    #[error("line {line}: variable `{variable_id}` of service `{service_id}` has more than one selection")]
    ConflictingSelections { line: usize, service_id: String, variable_id: String },
    #[error("unknown additional `{additional_id}`")]
    UnknownAdditional { additional_id: String },
    #[error("additional `{additional_id}` was selected more than once")]
    DuplicateAdditional { additional_id: String },
    #[error("additional `{additional_id}` is not eligible for any requested category (eligible: {eligible})")]
    IneligibleAdditional { additional_id: String, eligible: String },
}

/// A catalog integrity violation. Fatal for the tenant's catalog and meant
/// for an operator, not the end user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("catalog has no default zone")]
    NoDefaultZone,
    #[error("catalog has more than one default zone: {zone_ids}")]
    MultipleDefaultZones { zone_ids: String },
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("service `{service_id}` has an invalid tier sequence: {reason}")]
    InvalidTiers { service_id: String, reason: String },
    #[error("service `{service_id}` has no tier covering quantity {quantity}")]
    TierNotFound { service_id: String, quantity: u32 },
    #[error("combo `{combo_id}` is invalid: {reason}")]
    InvalidCombo { combo_id: String, reason: String },
    #[error("zone exception references unknown zone `{zone_id}`")]
    UnknownExceptionZone { zone_id: String },
    #[error("service `{service_id}` repeats option id `{option_id}`")]
    DuplicateOption { service_id: String, option_id: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogLoadError {
    #[error("no catalog found for tenant `{0}`")]
    TenantNotFound(String),
    #[error("catalog storage failure: {0}")]
    Storage(String),
    #[error(transparent)]
    Integrity(#[from] ConfigurationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The quote request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service catalog is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "The service catalog needs attention from an operator.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Stable short label used in logs, audit metadata, and CLI payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Resolution(ResolutionError::Validation(_)) => "validation",
            Self::Resolution(ResolutionError::Configuration(_)) => "catalog_configuration",
            Self::Catalog(CatalogLoadError::TenantNotFound(_)) => "unknown_tenant",
            Self::Catalog(CatalogLoadError::Storage(_)) => "catalog_storage",
            Self::Catalog(CatalogLoadError::Integrity(_)) => "catalog_configuration",
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = "unassigned".to_owned();
        match value {
            ApplicationError::Resolution(ResolutionError::Validation(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Catalog(CatalogLoadError::TenantNotFound(tenant)) => {
                Self::BadRequest {
                    message: format!("unknown tenant `{tenant}`"),
                    correlation_id: unassigned,
                }
            }
            ApplicationError::Catalog(CatalogLoadError::Storage(message)) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned }
            }
            ApplicationError::Resolution(ResolutionError::Configuration(error))
            | ApplicationError::Catalog(CatalogLoadError::Integrity(error)) => {
                Self::Internal { message: error.to_string(), correlation_id: unassigned }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{
        ApplicationError, CatalogLoadError, ConfigurationError, InterfaceError, ResolutionError,
        ValidationError,
    };

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(ResolutionError::from(
            ValidationError::UnknownAdditional { additional_id: "gas-refill".to_owned() },
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("gas-refill")
        ));
        assert_eq!(
            interface.user_message(),
            "The quote request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal_for_operator_alerting() {
        let from_resolution =
            ApplicationError::from(ResolutionError::from(ConfigurationError::NoDefaultZone));
        assert_eq!(from_resolution.error_class(), "catalog_configuration");
        assert!(matches!(from_resolution.into_interface("req-2"), InterfaceError::Internal { .. }));

        let from_catalog =
            ApplicationError::from(CatalogLoadError::from(ConfigurationError::NoDefaultZone));
        let interface = from_catalog.into_interface("req-3");
        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn storage_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Catalog(CatalogLoadError::Storage(
            "database lock timeout".to_owned(),
        ))
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service catalog is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn unknown_tenant_is_a_request_error() {
        let error = ApplicationError::Catalog(CatalogLoadError::TenantNotFound("acme".to_owned()));
        assert_eq!(error.error_class(), "unknown_tenant");
        assert!(matches!(error.into_interface("req-5"), InterfaceError::BadRequest { .. }));
    }
}
