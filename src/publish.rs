/// Publishing a draft to the webhook endpoint
///
/// Delivery is one-way: the request is posted and only transport-level
/// failures are reported back. The response body and status are not
/// interpreted.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::PublishError;
use crate::state::data::Draft;
use crate::state::session::DraftForm;

/// The JSON document sent to the endpoint
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PublishPayload {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub tags: String,
    pub category: String,
    pub image: String,
    pub content: String,
    pub publish: String,
    pub update: String,
}

/// A validated, ready-to-send publish request.
///
/// Only [`prepare`] builds one, so nothing reaches [`send`] without
/// passing validation.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    endpoint: String,
    payload: PublishPayload,
}

impl PublishRequest {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self) -> &PublishPayload {
        &self.payload
    }
}

/// Check the preconditions for publishing
pub fn validate(endpoint: &str, title: &str) -> Result<(), PublishError> {
    if endpoint.trim().is_empty() {
        return Err(PublishError::MissingEndpoint);
    }
    if title.is_empty() {
        return Err(PublishError::MissingTitle);
    }
    Ok(())
}

/// Compose the request for the current draft.
///
/// `stored` is the saved record for `id`; its `publishTime` becomes
/// `publish`, falling back to `now` when there is no record.
pub fn prepare(
    endpoint: &str,
    id: &str,
    form: &DraftForm,
    stored: Option<&Draft>,
    now: DateTime<Utc>,
) -> Result<PublishRequest, PublishError> {
    validate(endpoint, &form.title)?;

    let slug = if form.slug.is_empty() {
        id.to_string()
    } else {
        form.slug.clone()
    };
    let publish = stored.and_then(|d| d.publish_time).unwrap_or(now);

    Ok(PublishRequest {
        endpoint: endpoint.trim().to_string(),
        payload: PublishPayload {
            id: id.to_string(),
            slug,
            title: form.title.clone(),
            tags: form.tags.clone(),
            category: form.category.clone(),
            image: form.image.clone(),
            content: form.content.clone(),
            publish: iso_timestamp(publish),
            update: iso_timestamp(now),
        },
    })
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// POST the payload as JSON.
///
/// Succeeds once the request has been delivered; whatever the endpoint
/// answers is ignored. No timeout and no retry.
pub async fn send(request: PublishRequest) -> Result<(), PublishError> {
    tracing::info!(
        "Publishing draft {} (slug {}) to {}",
        request.payload().id,
        request.payload().slug,
        request.endpoint()
    );

    let response = reqwest::Client::new()
        .post(request.endpoint())
        .json(request.payload())
        .send()
        .await?;

    tracing::debug!("Endpoint answered with {}", response.status());
    Ok(())
}
