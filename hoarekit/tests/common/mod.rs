#![allow(dead_code)]

use std::{
    process::Command,
    thread,
    time::{Duration, Instant},
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll `condition` until it holds, failing the test after a generous timeout.
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

const DEATH_TEST_ENV: &str = "HOAREKIT_DEATH_TEST";

/// Run `body` in a child process and expect it to abort.
///
/// The test binary re-executes itself filtered down to `test_name`; inside the
/// child the environment variable is set and `body` runs for real.
pub fn expect_abort(test_name: &str, body: impl FnOnce()) {
    if std::env::var_os(DEATH_TEST_ENV).is_some() {
        init_logger();
        body();
        // reaching this point means the contract violation went unnoticed
        std::process::exit(0);
    }

    let exe = std::env::current_exe().expect("test binary path");
    let output = Command::new(exe)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(DEATH_TEST_ENV, "1")
        .output()
        .expect("failed to spawn death test");

    assert!(
        !output.status.success(),
        "{test_name}: child exited normally"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("contract violation"),
        "{test_name}: unexpected stderr:\n{stderr}"
    );

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(libc::SIGABRT));
    }
}
