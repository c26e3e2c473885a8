use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EmbedInput<'a> {
	pub text: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
	pub vector: Vec<f32>,
	pub model: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CompareItem<'a> {
	pub id: &'a str,
	pub embedding: &'a [f32],
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompareScore {
	pub id: String,
	pub score: f32,
}

pub async fn embed(
	cfg: &lnf_config::EmbeddingProviderConfig,
	input: EmbedInput<'_>,
) -> Result<Embedding> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.embed_path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&input)
		.send()
		.await?;
	let json: Value = crate::check_status(&cfg.embed_path, res).await?.json().await?;

	parse_embed_response(json)
}

pub async fn compare(
	cfg: &lnf_config::EmbeddingProviderConfig,
	query: &[f32],
	items: &[CompareItem<'_>],
) -> Result<Vec<CompareScore>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.compare_path);
	let body = serde_json::json!({ "query": query, "items": items });
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = crate::check_status(&cfg.compare_path, res).await?.json().await?;

	parse_compare_response(json)
}

fn parse_embed_response(json: Value) -> Result<Embedding> {
	let values = json
		.get("embedding")
		.and_then(|v| v.as_array())
		.ok_or_else(|| invalid("Embed response is missing embedding array."))?;

	if values.is_empty() {
		return Err(invalid("Embed response returned an empty embedding."));
	}

	let mut vector = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| invalid("Embedding value must be numeric."))?;

		if !number.is_finite() {
			return Err(invalid("Embedding value must be finite."));
		}

		vector.push(number as f32);
	}

	if let Some(dim) = json.get("dim").and_then(|v| v.as_u64())
		&& dim as usize != vector.len()
	{
		return Err(invalid(format!(
			"Embed response dim {dim} does not match embedding length {}.",
			vector.len()
		)));
	}

	let model = json.get("model").and_then(|v| v.as_str()).map(str::to_string);

	Ok(Embedding { vector, model })
}

fn parse_compare_response(json: Value) -> Result<Vec<CompareScore>> {
	let results = json
		.get("results")
		.and_then(|v| v.as_array())
		.ok_or_else(|| invalid("Compare response is missing results array."))?;
	let mut scores = Vec::with_capacity(results.len());

	for item in results {
		let id = item
			.get("id")
			.and_then(|v| v.as_str())
			.ok_or_else(|| invalid("Compare result missing id."))?;
		let score = item
			.get("score")
			.and_then(|v| v.as_f64())
			.ok_or_else(|| invalid("Compare result missing score."))?;

		scores.push(CompareScore { id: id.to_string(), score: score as f32 });
	}

	Ok(scores)
}

fn invalid(message: impl Into<String>) -> Error {
	Error::InvalidResponse { message: message.into() }
}
