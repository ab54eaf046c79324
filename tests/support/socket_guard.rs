//! Loopback availability check for tests that talk to a mock image server.
//!
//! Sandboxed runners sometimes forbid binding sockets. Those tests skip with
//! a note on stderr unless `COOKBOOKER_REQUIRE_SOCKET_TESTS` is set, in
//! which case the missing loopback is a test failure.

use std::net::{Ipv4Addr, TcpListener};
use std::panic::Location;

const REQUIRE_SOCKETS_ENV: &str = "COOKBOOKER_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"))
}

/// True when no loopback port can be bound and the caller should skip.
///
/// # Panics
///
/// When the bind fails and sockets are required by the environment.
#[track_caller]
pub fn loopback_unavailable() -> bool {
    let Err(error) = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)) else {
        return false;
    };

    let caller = Location::caller();
    assert!(
        !sockets_required(),
        "{REQUIRE_SOCKETS_ENV} is set but binding 127.0.0.1 failed at {caller}: {error}"
    );
    eprintln!(
        "skipping mock-server test at {caller}: cannot bind 127.0.0.1 ({error}); \
         set {REQUIRE_SOCKETS_ENV}=1 to fail instead"
    );
    true
}
