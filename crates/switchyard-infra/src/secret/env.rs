//! Environment variable API key provider.
//!
//! API keys never live in `config.toml`. For a provider id `groq` the
//! lookup order is:
//! - `SWITCHYARD_GROQ_API_KEY`
//! - `GROQ_API_KEY`
//!
//! Ids are uppercased and `-`/`.` become `_`, so `azure-openai` reads
//! `SWITCHYARD_AZURE_OPENAI_API_KEY`.

use secrecy::SecretString;

/// Environment variable secret provider.
///
/// Keys are returned wrapped in [`SecretString`] and never appear in
/// `Debug` output or logs.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    /// Create a new environment variable secret provider.
    pub fn new() -> Self {
        Self
    }

    /// The API key for `provider_id`, if one is set.
    pub fn api_key(&self, provider_id: &str) -> Option<SecretString> {
        resolve_with(provider_id, |name| match std::env::var(name) {
            Ok(value) => Some(value),
            // Present but not valid Unicode is treated as absent.
            Err(std::env::VarError::NotPresent | std::env::VarError::NotUnicode(_)) => None,
        })
    }
}

/// Candidate variable names for a provider, in lookup order.
pub fn candidate_vars(provider_id: &str) -> [String; 2] {
    let slug: String = provider_id
        .chars()
        .map(|c| match c {
            '-' | '.' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect();
    [format!("SWITCHYARD_{slug}_API_KEY"), format!("{slug}_API_KEY")]
}

fn resolve_with(
    provider_id: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    candidate_vars(provider_id)
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .map(SecretString::from)
}
