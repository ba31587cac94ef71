use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{BREVO_API_URL, HTTP_TIMEOUT_SECS, PRODUCT_NAME, PRODUCT_URLS};
use crate::error::{AppError, Result};
use crate::types::{EmailSettings, NotificationEvent};

/// Best-effort alert sink. Returns whether the alert was accepted; callers
/// never roll back state on `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, email: &EmailSettings, event: &NotificationEvent) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    pub fn html(&self) -> String {
        self.text.replace('\n', "<br>")
    }
}

pub fn compose(product_name: &str, product_url: &str, ev: &NotificationEvent) -> EmailMessage {
    let subject = format!("Price Drop Alert: {product_name}");
    let text = format!(
        "Good news! The price of {product_name} has dropped.\n\
         \n\
         Previous price: ${:.2}\n\
         Current price: ${:.2}\n\
         You save: ${:.2} ({:.1}% drop)\n\
         \n\
         Original price: ${:.2}\n\
         Current discount: ${:.2} ({:.1}% off)\n\
         \n\
         Check it out at: {product_url}\n\
         \n\
         This notification was sent by your Price Tracker.\n",
        ev.previous_price,
        ev.current_price,
        ev.price_diff,
        ev.percentage_drop,
        ev.original_price,
        ev.discount_amount,
        ev.discount_percentage,
    );
    EmailMessage { subject, text }
}

// ---------------------------------------------------------------------------
// Brevo wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Sender<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    html_content: String,
}

#[derive(Serialize)]
struct Sender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

/// Sends alerts through Brevo's transactional email API.
pub struct BrevoNotifier {
    client: reqwest::Client,
    endpoint: String,
    product_name: String,
    product_url: String,
}

impl BrevoNotifier {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(BREVO_API_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            product_name: PRODUCT_NAME.to_string(),
            product_url: PRODUCT_URLS.first().copied().unwrap_or_default().to_string(),
        })
    }

    async fn send(&self, email: &EmailSettings, message: &EmailMessage) -> Result<()> {
        let request = SendEmailRequest {
            sender: Sender {
                name: &email.sender_name,
                email: &email.sender_email,
            },
            to: vec![Recipient {
                email: &email.recipient_email,
            }],
            subject: &message.subject,
            html_content: message.html(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header("api-key", &email.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        warn!("Email API rejected request: {status} - {body}");
        Err(AppError::Status {
            status: status.as_u16(),
            url: self.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn notify(&self, email: &EmailSettings, event: &NotificationEvent) -> bool {
        if email.has_placeholder_key() {
            warn!("Brevo API key not set. Please update the config file.");
            return false;
        }

        let message = compose(&self.product_name, &self.product_url, event);
        match self.send(email, &message).await {
            Ok(()) => {
                info!("Price drop email notification sent successfully");
                true
            }
            Err(e) => {
                error!("Failed to send email: {e}");
                false
            }
        }
    }
}
