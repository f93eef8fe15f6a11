use fieldquote_core::config::LoadOptions;
use fieldquote_core::domain::catalog::TenantId;
use fieldquote_db::{migrations, DemoSeed};

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, EXIT_MIGRATION};

pub fn run(options: &LoadOptions, tenant: &str) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let tenant_id = TenantId(tenant.to_string());
    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seeded = DemoSeed::load(&pool, &tenant_id)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION));

        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => {
            let message = format!(
                "demo catalog loaded for tenant `{}`: {} services, {} combos, {} zones",
                seeded.tenant_id, seeded.services, seeded.combos, seeded.zones
            );
            CommandResult::success_with_data("seed", message, seeded)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
