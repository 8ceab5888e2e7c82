//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::Level;
use waymark::middleware::RequestLogger;
use waymark::{Request, Response, Router};

/// Keeps every line it is handed, in order.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl RequestLogger for RecordingLogger {
    fn log(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_owned()));
    }
}

/// The request every logging test sends: `GET http://host/path?q=test`.
pub fn sample_request() -> Request {
    Request::builder()
        .host("host")
        .path("/path")
        .query("q=test")
        .build()
}

/// A router answering `GET /path` with `"done"` and counting its calls.
pub fn counting_router() -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let router = Router::new().get("/path", move |_req: Request| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Response::text("done")
        }
    });
    (router, hits)
}
