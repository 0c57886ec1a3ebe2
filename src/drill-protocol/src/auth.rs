// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Client token checks.

use std::collections::HashSet;

/// Reason a client token was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization token")]
    Missing,

    #[error("invalid authorization token")]
    Invalid,
}

/// Drop an optional, case-insensitive `Bearer ` prefix.
pub fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: Option<&str>) -> Result<(), AuthError>;
}

/// Accepts any of a fixed set of tokens. An empty set disables the check.
#[derive(Debug, Clone, Default)]
pub struct SimpleTokenValidator {
    tokens: HashSet<String>,
}

impl SimpleTokenValidator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenValidator for SimpleTokenValidator {
    fn validate(&self, token: Option<&str>) -> Result<(), AuthError> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let token = token.ok_or(AuthError::Missing)?;
        if self.tokens.contains(strip_bearer(token)) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

/// Accepts every client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthValidator;

impl TokenValidator for NoAuthValidator {
    fn validate(&self, _token: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}
