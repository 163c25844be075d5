//! Ordered checks deciding whether a request is eligible for token exchange.

use crate::claims::IncomingTokenContext;
use crate::config::ExchangeConfig;
use std::fmt;

/// Why a request was passed through without token exchange.
///
/// Variants are listed in evaluation order; the first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingToken,
    MissingAuthorizedParty,
    AuthorizedPartyMismatch { prefix: String },
    MissingAudience { audience: String },
    ForbiddenAudience { audience: String },
    ForbiddenScope { scope: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingToken => {
                write!(f, "Request has no Authorization header with Bearer token")
            }
            SkipReason::MissingAuthorizedParty => write!(
                f,
                "Incoming Bearer token has no authorized party (claim 'azp') specified"
            ),
            SkipReason::AuthorizedPartyMismatch { prefix } => write!(
                f,
                "Incoming Bearer token has an authorized party (claim 'azp') not matching the configured prefix '{}'",
                prefix
            ),
            SkipReason::MissingAudience { audience } => write!(
                f,
                "Incoming Bearer token does not contain the audience '{}'",
                audience
            ),
            SkipReason::ForbiddenAudience { audience } => write!(
                f,
                "Incoming Bearer token does already contain the audience '{}'",
                audience
            ),
            SkipReason::ForbiddenScope { scope } => write!(
                f,
                "Incoming Bearer token does already contain the scope '{}'",
                scope
            ),
        }
    }
}

/// Runs the admission rules against the incoming token.
///
/// Returns the context when every rule passes, so the caller can continue
/// with the cache lookup.
pub fn admit<'a>(
    config: &ExchangeConfig,
    context: Option<&'a IncomingTokenContext>,
) -> Result<&'a IncomingTokenContext, SkipReason> {
    let context = match context {
        Some(context) if !context.token().trim().is_empty() => context,
        _ => return Err(SkipReason::MissingToken),
    };

    let authorized_party = match context.authorized_party() {
        Some(azp) if !azp.trim().is_empty() => azp,
        _ => return Err(SkipReason::MissingAuthorizedParty),
    };

    if !authorized_party.starts_with(&config.authorized_party_prefix) {
        return Err(SkipReason::AuthorizedPartyMismatch {
            prefix: config.authorized_party_prefix.clone(),
        });
    }

    if let Some(audience) = config.required_audience() {
        if !context.has_audience(audience) {
            return Err(SkipReason::MissingAudience {
                audience: audience.to_string(),
            });
        }
    }

    if let Some(audience) = config.forbidden_audience() {
        if context.has_audience(audience) {
            return Err(SkipReason::ForbiddenAudience {
                audience: audience.to_string(),
            });
        }
    }

    if let Some(scope) = config.forbidden_scope() {
        if context.has_scope(scope) {
            return Err(SkipReason::ForbiddenScope {
                scope: scope.to_string(),
            });
        }
    }

    Ok(context)
}
