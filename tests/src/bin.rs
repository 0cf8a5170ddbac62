#![cfg(test)]

use std::sync::Once;

mod harness;
mod utils;
mod stubs {
    pub mod fs;
    pub mod remote;
}
mod tests;

use harness::Harness;

static LOG_INIT: Once = Once::new();

fn harness(remote: stubs::remote::Stub) -> Harness {
    LOG_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    Harness::new(remote)
}
