//! Account state guard
//!
//! Sequential predicates over a loaded identity. Existence is always checked
//! first; the remaining checks run in a fixed order (deleted, blocked, email
//! confirmed) no matter how a guard lists them, and the first failure wins.

use crate::core::db::models::Identity;

/// One account-state predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccountCheck {
    NotDeleted,
    NotBlocked,
    EmailConfirmed,
}

impl AccountCheck {
    const CANONICAL_ORDER: [AccountCheck; 3] = [
        AccountCheck::NotDeleted,
        AccountCheck::NotBlocked,
        AccountCheck::EmailConfirmed,
    ];

    fn evaluate(self, identity: &Identity) -> Result<(), GuardError> {
        match self {
            AccountCheck::NotDeleted if identity.is_deleted => Err(GuardError::Deleted),
            AccountCheck::NotBlocked if identity.is_blocked() => Err(GuardError::Blocked),
            AccountCheck::EmailConfirmed if !identity.is_email_confirmed => {
                Err(GuardError::EmailNotConfirmed)
            }
            _ => Ok(()),
        }
    }
}

/// Guard failures, one per predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("This user is not found!")]
    NotFound,

    #[error("This user is deleted!")]
    Deleted,

    #[error("This user is blocked!")]
    Blocked,

    #[error("Please confirm your email first!")]
    EmailNotConfirmed,
}

/// A configured subset of account checks
#[derive(Debug, Clone, Copy)]
pub struct AccountGuard {
    checks: &'static [AccountCheck],
}

impl AccountGuard {
    /// Existence only
    pub const EXISTS: AccountGuard = AccountGuard { checks: &[] };

    pub const NOT_BLOCKED: AccountGuard = AccountGuard {
        checks: &[AccountCheck::NotBlocked],
    };

    /// Deleted and blocked, used for admin login and authenticated sessions
    pub const ACTIVE: AccountGuard = AccountGuard {
        checks: &[AccountCheck::NotDeleted, AccountCheck::NotBlocked],
    };

    pub const USER_LOGIN: AccountGuard = AccountGuard {
        checks: &[
            AccountCheck::NotDeleted,
            AccountCheck::NotBlocked,
            AccountCheck::EmailConfirmed,
        ],
    };

    pub const fn new(checks: &'static [AccountCheck]) -> Self {
        Self { checks }
    }

    pub fn includes(&self, check: AccountCheck) -> bool {
        self.checks.contains(&check)
    }

    /// Run the guard over a lookup result.
    pub fn check(&self, identity: Option<Identity>) -> Result<Identity, GuardError> {
        let identity = identity.ok_or(GuardError::NotFound)?;

        for check in AccountCheck::CANONICAL_ORDER {
            if self.includes(check) {
                check.evaluate(&identity)?;
            }
        }

        Ok(identity)
    }
}
