//! Request plumbing shared by the OpenAI-compatible chat completion vendors.

use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{ExtractError, Result};

pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// The single user message: prompt text followed by the image reference.
pub(crate) fn vision_message(prompt: &str, image_url: &str) -> Value {
    json!({
        "role": "user",
        "content": [
            { "type": "text", "text": prompt },
            { "type": "image_url", "image_url": { "url": image_url } }
        ]
    })
}

/// POST `payload` and return `choices[0].message.content`.
pub(crate) async fn complete(
    client: &Client,
    vendor: &str,
    url: &str,
    api_key: &str,
    payload: &Value,
) -> Result<String> {
    debug!("Sending request to {} API at {}", vendor, url);

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    debug!("{} response status: {}", vendor, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("{} API error ({}): {}", vendor, status, body);
        return Err(ExtractError::Upstream {
            provider: vendor.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let response_body: Value = response.json().await?;
    debug!("{} API response: {:?}", vendor, response_body);

    response_body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExtractError::MalformedResponse(response_body.to_string()))
}
