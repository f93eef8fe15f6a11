use std::fs;
use std::path::Path;

use anyhow::Context;
use fieldquote_core::config::LoadOptions;
use fieldquote_core::domain::catalog::TenantId;
use fieldquote_core::domain::quote::{Quote, QuoteRequest};
use fieldquote_core::errors::ApplicationError;
use fieldquote_core::{DeterministicQuoteResolver, QuoteService};
use fieldquote_db::SqlCatalogRepository;

use crate::commands::{
    build_runtime, load_config, open_pool, CommandResult, EXIT_CATALOG, EXIT_REQUEST_FILE,
    EXIT_VALIDATION,
};

pub fn run(options: &LoadOptions, request_path: &Path, tenant: &str) -> CommandResult {
    let config = match load_config("quote", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let request = match read_request(request_path) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "request_file",
                format!("{error:#}"),
                EXIT_REQUEST_FILE,
            );
        }
    };

    let runtime = match build_runtime("quote") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let tenant_id = TenantId(tenant.to_string());
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let service = QuoteService::new(
            SqlCatalogRepository::new(pool.clone()),
            DeterministicQuoteResolver::new(config.pricing_policy()),
        );

        let resolved = service.resolve(&tenant_id, &request, &correlation_id).await;
        pool.close().await;
        resolved.map_err(|error| (error.error_class(), error.to_string(), exit_code_for(&error)))
    });

    match result {
        Ok(quote) => CommandResult::success_with_data("quote", summarize(&quote), quote),
        Err((error_class, message, exit_code)) => CommandResult::failure(
            "quote",
            error_class,
            format!("{message} (correlation id {correlation_id})"),
            exit_code,
        ),
    }
}

fn read_request(path: &Path) -> anyhow::Result<QuoteRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read request file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("request file `{}` is not a valid quote request", path.display()))
}

fn exit_code_for(error: &ApplicationError) -> u8 {
    match error.error_class() {
        "validation" => EXIT_VALIDATION,
        _ => EXIT_CATALOG,
    }
}

fn summarize(quote: &Quote) -> String {
    match quote {
        Quote::Priced(priced) => {
            format!("quote priced at {} in zone `{}`", priced.total, priced.zone_id.0)
        }
        Quote::RequiresManualQuote(reason) => reason.message.clone(),
    }
}
