pub mod socket_guard;

/// Starts a mock image server, or returns `Ok(())` from the calling test
/// when loopback sockets are unavailable.
macro_rules! require_image_server {
    () => {{
        if support::socket_guard::loopback_unavailable() {
            return Ok(());
        }
        wiremock::MockServer::start().await
    }};
}
