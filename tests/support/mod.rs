//! Shared helpers for integration tests: a canned HTTP backend on a random
//! local port.

#![allow(dead_code)]

use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tiny_http::{Header, Response, Server};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Canned reply: status and body.
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Start a backend answering the given replies in order, one per request.
///
/// Returns the base URL and a channel yielding each request received.
pub fn mock_backend(replies: Vec<Reply>) -> (String, Receiver<Recorded>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for reply in replies {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let _ = tx.send(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                content_type,
                body,
            });

            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(reply.body)
                .with_status_code(reply.status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    (format!("http://{addr}"), rx)
}

/// Logging switched off so tests never touch the user's log files.
pub fn quiet_logging() -> medform::config::LoggingConfig {
    medform::config::LoggingConfig {
        enabled: false,
        ..Default::default()
    }
}
