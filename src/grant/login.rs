//! `/authorize` operations: the login challenge and credential submission.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, Subject, TokenSecret},
	grant::AuthorizationCodeFlow,
	obs::{self, OpKind},
	store::CodeRecord,
};

/// Form action the login challenge posts back to.
pub const LOGIN_FORM_ACTION: &str = "/authorize";

/// Input type of a [`LoginField`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFieldKind {
	/// Round-tripped value the user never edits.
	Hidden,
	/// Plain text input.
	Text,
	/// Masked input.
	Password,
}
impl LoginFieldKind {
	/// HTML `type` attribute for the field.
	pub const fn as_str(self) -> &'static str {
		match self {
			LoginFieldKind::Hidden => "hidden",
			LoginFieldKind::Text => "text",
			LoginFieldKind::Password => "password",
		}
	}
}

/// One input of the login form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginField {
	/// Form field name.
	pub name: &'static str,
	/// Input type.
	pub kind: LoginFieldKind,
	/// Human label for visible fields.
	pub label: Option<&'static str>,
	/// Pre-filled value for hidden fields.
	pub value: Option<String>,
}

/// Structured description of the login form presented by `GET /authorize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginChallenge {
	/// Where the form posts.
	pub action: &'static str,
	/// Fields in display order.
	pub fields: Vec<LoginField>,
}
impl LoginChallenge {
	/// Renders the challenge as a minimal HTML login page with every value escaped.
	pub fn render_html(&self) -> String {
		let mut html = String::from("<h2>Mock OAuth Login</h2>\n");

		html.push_str(&format!("<form method=\"POST\" action=\"{}\">\n", escape_html(self.action)));

		for field in &self.fields {
			let value = field.value.as_deref().map(escape_html).unwrap_or_default();
			let input = format!(
				"<input type=\"{}\" name=\"{}\" value=\"{value}\" />",
				field.kind.as_str(),
				field.name,
			);

			match field.label {
				Some(label) => html.push_str(&format!("  <label>{label}: {input}</label><br/>\n")),
				None => html.push_str(&format!("  {input}\n")),
			}
		}

		html.push_str("  <button type=\"submit\">Login</button>\n</form>\n");

		html
	}
}

/// Credentials and round-tripped parameters posted by the login form.
#[derive(Clone, Default, Deserialize)]
pub struct LoginSubmission {
	/// Submitted user identifier; becomes the subject.
	#[serde(default)]
	pub username: String,
	/// Submitted password; only checked for presence.
	#[serde(default)]
	pub password: String,
	/// OAuth client identifier; recorded when well-formed, never required.
	#[serde(default)]
	pub client_id: String,
	/// Redirect URI the code is delivered to.
	#[serde(default)]
	pub redirect_uri: String,
	/// Opaque client state echoed back on the redirect.
	#[serde(default)]
	pub state: Option<String>,
}
impl Debug for LoginSubmission {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginSubmission")
			.field("username", &self.username)
			.field("password_set", &!self.password.is_empty())
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri)
			.field("state", &self.state)
			.finish()
	}
}

impl AuthorizationCodeFlow {
	/// Describes the login form for `client_id` without touching any state.
	pub fn begin_authorization(
		&self,
		client_id: &str,
		redirect_uri: &str,
		state: Option<&str>,
	) -> Result<LoginChallenge> {
		let redirect_uri = parse_redirect(redirect_uri)?;
		let hidden = |name, value: String| LoginField {
			name,
			kind: LoginFieldKind::Hidden,
			label: None,
			value: Some(value),
		};

		Ok(LoginChallenge {
			action: LOGIN_FORM_ACTION,
			fields: vec![
				hidden("client_id", client_id.to_owned()),
				hidden("redirect_uri", redirect_uri.to_string()),
				hidden("state", state.unwrap_or_default().to_owned()),
				LoginField {
					name: "username",
					kind: LoginFieldKind::Text,
					label: Some("User ID"),
					value: None,
				},
				LoginField {
					name: "password",
					kind: LoginFieldKind::Password,
					label: Some("Password"),
					value: None,
				},
			],
		})
	}

	/// Accepts any non-empty credential pair, mints a code, and returns the redirect target.
	pub async fn submit_credentials(&self, submission: LoginSubmission) -> Result<Url> {
		obs::observe(OpKind::Authorize, "submit_credentials", async move {
			if submission.username.is_empty() || submission.password.is_empty() {
				return Err(Error::MissingCredentials);
			}

			let mut redirect = parse_redirect(&submission.redirect_uri)?;
			let client_id = ClientId::new(&submission.client_id).ok();
			let subject = Subject::new(&submission.username)?;
			let issued_at = OffsetDateTime::now_utc();
			let code = TokenSecret::generate();

			// Lazy eviction: every insertion sweeps codes that can no longer be redeemed.
			self.store.purge_expired_codes(issued_at).await?;
			self.store
				.save_code(CodeRecord {
					code: code.clone(),
					client_id,
					subject,
					redirect_uri: redirect.clone(),
					issued_at,
					expires_at: issued_at + self.settings.code_ttl,
				})
				.await?;

			{
				let mut pairs = redirect.query_pairs_mut();

				pairs.append_pair("code", code.expose());

				if let Some(state) = submission.state.as_deref().filter(|state| !state.is_empty()) {
					pairs.append_pair("state", state);
				}
			}

			Ok(redirect)
		})
		.await
	}
}

/// Parses an absolute, hierarchical redirect URI.
pub fn parse_redirect(raw: &str) -> Result<Url> {
	let url = Url::parse(raw).map_err(|err| Error::InvalidRedirect { reason: err.to_string() })?;

	if url.cannot_be_a_base() {
		return Err(Error::InvalidRedirect { reason: "URI is not hierarchical".into() });
	}

	Ok(url)
}

fn escape_html(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}

	out
}
