use once_cell::sync::Lazy;
use std::sync::Once;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static START: Once = Once::new();
static _GUARD: Lazy<std::sync::Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> =
    Lazy::new(|| std::sync::Mutex::new(None));

/// Initialize tracing for integration tests (stderr + rotating file).
/// Idempotent: safe to call multiple times.
pub fn init() {
    START.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("debug"))
            .expect("env filter");

        let file_appender = rolling::daily("logs", "tests.log");
        let (file_nb, guard) = tracing_appender::non_blocking(file_appender);
        *_GUARD.lock().unwrap() = Some(guard); // retain guard for lifetime

        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_test_writer();

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(file_nb);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();

        tracing::info!(target: "test_init", "Test tracing initialized (stderr + rotating file)");
    });
}

/// Body shaped like the server's reply.
#[allow(dead_code)]
pub fn response_body(text: &str) -> String {
    serde_json::json!({ "response": text }).to_string()
}

/// Local server that accepts connections and never answers. Returns its base URL.
/// Accepted sockets are held open for the life of the test process.
#[allow(dead_code)]
pub fn stalling_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stalling listener");
    let addr = listener.local_addr().expect("listener addr");
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://{addr}")
}
