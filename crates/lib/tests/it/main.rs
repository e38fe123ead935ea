/*! Integration tests for Confmodel.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The modules cover the request-facing behavior end to end:
 * - crud: get/add/set/delete through the controller
 * - commit: generation checks and edits re-applied after intervening commits
 * - safe_delete: reference scanning before deletes
 * - toggle: enabling and disabling entries
 * - search: grid search, paging and the action router
 * - relation: option resolution across models and the option cache
 * - validation: settings updates and validation output
 * - storage: persistence to JSON files
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("confmodel=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod commit;
mod context;
mod helpers;
mod relation;
mod safe_delete;
mod toggle;
mod validation;
