use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::Result;

#[derive(Clone, Debug, Serialize)]
pub struct OutgoingMail<'a> {
	pub from: &'a str,
	pub to: &'a str,
	pub subject: &'a str,
	pub text: &'a str,
	pub html: &'a str,
}

/// Hands one message to the transactional mail relay and returns the relay's message id, if
/// it reports one.
pub async fn send(
	cfg: &lnf_config::MailProviderConfig,
	mail: &OutgoingMail<'_>,
) -> Result<Option<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(mail)
		.send()
		.await?;
	let res = crate::check_status(&cfg.path, res).await?;
	let body = res.text().await?;

	Ok(parse_message_id(&body))
}

fn parse_message_id(body: &str) -> Option<String> {
	let json: Value = serde_json::from_str(body).ok()?;

	json.get("message_id")
		.or_else(|| json.get("messageId"))
		.or_else(|| json.get("id"))
		.and_then(|v| v.as_str())
		.map(str::to_string)
}
