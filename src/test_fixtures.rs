use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;

pub const IMAGE_BYTES: &[u8] = b"not actually a jpeg";

pub struct MockProvider {
    pub attempts: Mutex<Vec<String>>,
    failures: usize,
}

async fn text_to_image(
    State(provider): State<Arc<MockProvider>>,
    Path(model): Path<String>,
) -> (StatusCode, Vec<u8>) {
    let mut attempts = provider.attempts.lock().unwrap();
    attempts.push(model);

    if attempts.len() <= provider.failures {
        (StatusCode::SERVICE_UNAVAILABLE, b"model is overloaded".to_vec())
    } else {
        (StatusCode::OK, IMAGE_BYTES.to_vec())
    }
}

/// Spawns a stand-in for the Hugging Face inference endpoint that fails the
/// first `failures` calls and records every attempted model in order.
pub async fn mock_provider(failures: usize) -> (String, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider { attempts: Mutex::new(Vec::new()), failures });

    let router = Router::new()
        .route("/models/{*model}", post(text_to_image))
        .with_state(provider.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/models", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (endpoint, provider)
}
