use std::sync::Arc;
use crate::admission::AdmissionController;
// app's shared state

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream: String,                      // chat backend base url
    pub admission: Arc<AdmissionController>,   // sole owner of the entry store
}

impl AppState {
    pub fn new(upstream: &str, admission: Arc<AdmissionController>) -> Self {
        // add http:// if not present
        let upstream = if upstream.starts_with("http") {
            upstream.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", upstream.trim_end_matches('/'))
        };
        Self {
            client: reqwest::Client::new(),
            upstream,
            admission,
        }
    }
}
