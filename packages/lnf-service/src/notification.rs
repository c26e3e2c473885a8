use lnf_config::MailProviderConfig;
use lnf_providers::mail::OutgoingMail;
use lnf_storage::models::Report;

use crate::Mailer;

pub const SAFETY_REMINDER: &str =
	"Always meet in a safe, public location when arranging item exchanges.";

#[derive(Debug, thiserror::Error)]
#[error("Failed to deliver match email to {recipient}: {source}")]
pub struct DeliveryError {
	pub recipient: String,
	pub source: lnf_providers::Error,
}

/// Rendered match notification. Both bodies carry the same facts.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchEmail {
	pub subject: String,
	pub text: String,
	pub html: String,
}
impl MatchEmail {
	pub fn render(app_url: &str, lost: &Report, found: &Report, score: f32) -> Self {
		let app_url = app_url.trim_end_matches('/');
		let found_url = format!("{app_url}/items/{}", found.report_id);
		let lost_url = format!("{app_url}/items/{}", lost.report_id);
		let percent = similarity_percent(score);
		let subject = format!("Lost & Found: Potential Match for \"{}\"", lost.title);
		let text = format!(
			"Hello,\n\n\
			We found a report that may match your item. If it is not yours you can ignore this \
			email. We will keep looking and let you know about closer matches.\n\n\
			Match details\n\
			-------------\n\
			Lost item: {lost_title}\n\
			Found item: {found_title}\n\
			Similarity: {percent}\n\n\
			View the found item: {found_url}\n\
			Your report: {lost_url}\n\n\
			Safety reminder: {SAFETY_REMINDER}\n\n\
			This is an automated notification from the Lost & Found system.",
			lost_title = lost.title,
			found_title = found.title,
		);
		let html = render_html(HtmlParts {
			app_url,
			lost,
			found,
			percent: &percent,
			found_url: &found_url,
			lost_url: &lost_url,
		});

		Self { subject, text, html }
	}
}

struct HtmlParts<'a> {
	app_url: &'a str,
	lost: &'a Report,
	found: &'a Report,
	percent: &'a str,
	found_url: &'a str,
	lost_url: &'a str,
}

/// Returns the trimmed address if it looks deliverable.
pub fn validate_recipient(address: &str) -> Option<&str> {
	let address = address.trim();
	let (local, domain) = address.split_once('@')?;

	if local.is_empty() || domain.is_empty() || address.chars().any(char::is_whitespace) {
		return None;
	}

	Some(address)
}

pub async fn deliver(
	mailer: &dyn Mailer,
	cfg: &MailProviderConfig,
	to: &str,
	email: &MatchEmail,
) -> Result<Option<String>, DeliveryError> {
	let mail = OutgoingMail {
		from: &cfg.from,
		to,
		subject: &email.subject,
		text: &email.text,
		html: &email.html,
	};

	mailer
		.send(cfg, &mail)
		.await
		.map_err(|source| DeliveryError { recipient: to.to_string(), source })
}

pub fn similarity_percent(score: f32) -> String {
	format!("{:.1}%", score.clamp(0.0, 1.0) * 100.0)
}

pub fn escape_html(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(ch),
		}
	}

	out
}

fn render_html(parts: HtmlParts<'_>) -> String {
	let HtmlParts { app_url, lost, found, percent, found_url, lost_url } = parts;

	format!(
		r#"<div style="background:#f7f7fb;padding:24px;font-family:Arial,sans-serif;color:#0f172a;">
<table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width:640px;margin:0 auto;background:#ffffff;border-radius:12px;">
<tr><td style="padding:24px;background:#2563eb;color:#ffffff;">
<div style="font-size:18px;font-weight:600;">Lost &amp; Found</div>
<div style="font-size:14px;">Potential match detected</div>
</td></tr>
<tr><td style="padding:20px 24px;">
<p>We found a report that may match your item. If it is not yours you can ignore this email.</p>
<table role="presentation" width="100%" cellspacing="0" cellpadding="0"><tr>
<td style="width:50%;vertical-align:top;padding-right:8px;">
<div style="font-size:12px;color:#64748b;font-weight:600;">Your lost item</div>
{lost_image}<div style="font-weight:600;">{lost_title}</div>
<a href="{lost_url}">View your report</a>
</td>
<td style="width:50%;vertical-align:top;padding-left:8px;">
<div style="font-size:12px;color:#64748b;font-weight:600;">Potential found item</div>
{found_image}<div style="font-weight:600;">{found_title}</div>
<a href="{found_url}">View the found item</a>
</td>
</tr></table>
<p style="font-size:14px;">Similarity: <strong>{percent}</strong></p>
<p style="font-size:12px;color:#64748b;">Or visit <a href="{app_url}">{app_url}</a> and check your matches.</p>
<div style="margin-top:20px;padding:12px;border-left:4px solid #16a34a;background:#f0fdf4;font-size:13px;">
<strong>Safety reminder:</strong> {safety}
</div>
<p style="font-size:12px;color:#94a3b8;">This is an automated notification from the Lost &amp; Found system.</p>
</td></tr>
</table>
</div>"#,
		lost_image = image_tag(lost.primary_image(), "Lost item"),
		lost_title = escape_html(&lost.title),
		lost_url = escape_html(lost_url),
		found_image = image_tag(found.primary_image(), "Found item"),
		found_title = escape_html(&found.title),
		found_url = escape_html(found_url),
		percent = escape_html(percent),
		app_url = escape_html(app_url),
		safety = SAFETY_REMINDER,
	)
}

fn image_tag(url: Option<&str>, alt: &str) -> String {
	match url {
		Some(url) => format!(
			r#"<img src="{}" alt="{alt}" style="width:100%;max-height:140px;object-fit:cover;border-radius:8px;">"#,
			escape_html(url)
		),
		None => String::new(),
	}
}
