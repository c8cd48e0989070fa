//! Thread-safe in-memory [`TokenStore`] implementation; the mock's only backend.

// self
use crate::{
	_prelude::*,
	auth::{Subject, fingerprint},
	store::{
		CodeRecord, CodeRedemption, GrantRecord, StoreError, StoreFuture, TokenBinding, TokenKind,
		TokenStore,
	},
};

#[derive(Debug, Default)]
struct State {
	codes: HashMap<String, CodeRecord>,
	tokens: HashMap<String, TokenBinding>,
	// Subject -> fingerprint of its current refresh token.
	latest_refresh: HashMap<Subject, String>,
}

type StoreMap = Arc<RwLock<State>>;

/// Thread-safe storage backend that keeps records in-process for the lifetime of the server.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of authorization codes currently awaiting redemption.
	pub fn pending_codes(&self) -> usize {
		self.0.read().codes.len()
	}

	/// Number of tokens (access and refresh) currently recorded.
	pub fn recorded_tokens(&self) -> usize {
		self.0.read().tokens.len()
	}

	fn save_code_now(map: StoreMap, record: CodeRecord) -> Result<(), StoreError> {
		let key = record.code.fingerprint();

		map.write().codes.insert(key, record);

		Ok(())
	}

	fn take_code_now(map: StoreMap, code: &str, now: OffsetDateTime) -> CodeRedemption {
		let key = fingerprint(code);
		// Lookup and removal share one write guard so a code is redeemed at most once.
		let removed = map.write().codes.remove(&key);

		match removed {
			Some(record) if record.is_expired_at(now) => CodeRedemption::Expired,
			Some(record) => CodeRedemption::Redeemed(record),
			None => CodeRedemption::Missing,
		}
	}

	fn purge_now(map: StoreMap, now: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let before = guard.codes.len();

		guard.codes.retain(|_, record| !record.is_expired_at(now));

		before - guard.codes.len()
	}

	fn save_grant_now(map: StoreMap, grant: GrantRecord) -> Result<(), StoreError> {
		let access_key = grant.access_token.fingerprint();
		let refresh_key = grant.refresh_token.fingerprint();
		let mut guard = map.write();

		if let Some(previous) = guard.latest_refresh.insert(grant.subject.clone(), refresh_key.clone())
		{
			guard.tokens.remove(&previous);
		}

		guard.tokens.insert(access_key, TokenBinding {
			subject: grant.subject.clone(),
			client_id: grant.client_id.clone(),
			kind: TokenKind::Access,
			expires_at: Some(grant.expires_at),
		});
		guard.tokens.insert(refresh_key, TokenBinding {
			subject: grant.subject,
			client_id: grant.client_id,
			kind: TokenKind::Refresh,
			expires_at: None,
		});

		Ok(())
	}

	fn lookup_now(map: StoreMap, token: &str) -> Option<TokenBinding> {
		map.read().tokens.get(&fingerprint(token)).cloned()
	}
}
impl TokenStore for MemoryStore {
	fn save_code(&self, record: CodeRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_code_now(map, record) })
	}

	fn take_code<'a>(
		&'a self,
		code: &'a str,
		now: OffsetDateTime,
	) -> StoreFuture<'a, CodeRedemption> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::take_code_now(map, code, now)) })
	}

	fn purge_expired_codes(&self, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::purge_now(map, now)) })
	}

	fn save_grant(&self, grant: GrantRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_grant_now(map, grant) })
	}

	fn lookup_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<TokenBinding>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::lookup_now(map, token)) })
	}
}
