/// Installs a `fmt` subscriber for hosts that embed the service.
///
/// Returns `false` when a global subscriber is already set; never panics.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt().with_target(false).try_init().is_ok()
}
