use serde::{Deserialize, Serialize};

// Ollama API request format
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

// Ollama API response format. The eval counts are the token cost we meter.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerateResponse {
    pub fn token_cost(&self) -> u64 {
        self.prompt_eval_count
            .unwrap_or(0)
            .saturating_add(self.eval_count.unwrap_or(0))
    }
}

// Body of every non-2xx gateway response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
