//! Line structuring through a generative model endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StructureError;
use crate::models::config::StructurerConfig;

/// Turns one line of bill text into raw model output.
///
/// The output is expected to hold a single JSON object but nothing is
/// guaranteed; see [`parse_response`](super::parse_response).
pub trait LineStructurer {
    fn structure(&self, line: &str) -> Result<String, StructureError>;
}

const SYSTEM_PROMPT: &str = "You are an AI assistant and you're supposed to convert this unstructured text into a structured JSON format.";

const PROMPT_TEMPLATE: &str = r#"Extract the numerical value from the following unstructured text and convert it into a structured JSON format.
- The key should be a descriptive field name based on the text, written in snake_case.
- The value should be the corresponding numerical value (as a float or integer).
- The value should be accurate
- Ensure the output is in this format: { "field_name": value }

Examples:
1. Text: "Installation Charge - - - 150.00 is applicable for new connections."
Output: { "installation_charge": 150.00 }

2. Text: "Late Payment Penalty ---------> 50 Only if paid after due date."
Output: { "late_payment_penalty": 50 }

3. Text: "Electricity Duty: 7.25 is levied as per government norms."
Output: { "electricity_duty": 7.25 }

4. Text: "Monthly Rental ========== 1200 per month for the plan."
Output: { "monthly_rental": 1200 }

5. Text: "Due Date 12/28/15, please pay by this date."
Output: { "due_date": "12/28/15" }

6. Text: "The total bill amount is $499.99, thank you for shopping with us."
Output: { "total_bill_amount": 499.99 }

7. Text: "Phone Number: +1 (555) 123-4567 is registered with your account."
Output: { "registered_phone_number": "+1 (555) 123-4567" }

Now process the following text and generate the structured JSON format:

Text: "{line}""#;

/// Build the user prompt for one line.
pub fn build_prompt(line: &str) -> String {
    PROMPT_TEMPLATE.replace("{line}", line)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Structurer backed by an OpenAI-compatible chat completions endpoint
/// (llama.cpp server, Ollama, vLLM and the like).
pub struct ChatLineStructurer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

impl ChatLineStructurer {
    /// Create a structurer from configuration.
    ///
    /// The bearer token falls back to the `BILLEX_API_KEY` environment variable.
    pub fn from_config(config: &StructurerConfig) -> Result<Self, StructureError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("BILLEX_API_KEY").ok());

        info!("Using model {} at {}", config.model, config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }
}

impl LineStructurer for ChatLineStructurer {
    fn structure(&self, line: &str) -> Result<String, StructureError> {
        let prompt = build_prompt(line);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        debug!("Structuring line of {} chars", line.len());

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StructureError::Status { status, body });
        }

        let reply: ChatResponse = response.json()?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(StructureError::NoCompletion)
    }
}
