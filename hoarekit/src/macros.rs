/// Reports a broken monitor contract and terminates the process.
///
/// Misusing a monitor (operating it from a thread that does not occupy it,
/// tearing it down while threads are still queued, ...) is a bug in the
/// calling code. It is never turned into a recoverable error.
macro_rules! contract_violation {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        log::error!("contract violation: {}", message);
        eprintln!("hoarekit: contract violation: {}", message);
        std::process::abort()
    }};
}
