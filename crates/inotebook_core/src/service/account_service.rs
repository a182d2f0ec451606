//! Account use-case service.
//!
//! # Responsibility
//! - Sign up, log in, reset passwords, update identity, delete accounts.
//! - Issue a fresh session token whenever the account epoch advances.
//! - Validate presented tokens on behalf of callers.
//!
//! # Invariants
//! - Login and identity updates advance the epoch, invalidating every token
//!   issued before them.
//! - Password reset leaves the epoch alone; outstanding tokens stay valid.
//! - Plaintext credentials never leave this module and are never logged.

use crate::auth::password::CredentialHasher;
use crate::auth::session::SessionValidator;
use crate::auth::token::TokenCodec;
use crate::error::ServiceError;
use crate::model::account::{
    normalize_email, normalize_phone, normalize_user_name, validate_password, Account, AccountId,
    Epoch, IdentityUpdate, NewAccount, Principal,
};
use crate::model::now_epoch_ms;
use crate::repo::account_repo::{AccountDeletion, AccountRepository};
use log::{info, warn};
use uuid::Uuid;

/// Signup input.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Password reset input.
#[derive(Debug, Clone)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Identity update input. `password` re-confirms the caller.
#[derive(Debug, Clone)]
pub struct UpdateDetailsRequest {
    pub user_name: String,
    pub old_email: String,
    pub new_email: String,
    pub phone: String,
    pub password: String,
}

/// Token plus the principal it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub principal: Principal,
}

/// Use-case service over an account repository.
pub struct AccountService<'a, R: AccountRepository> {
    repo: R,
    codec: &'a TokenCodec,
    hasher: &'a dyn CredentialHasher,
}

impl<'a, R: AccountRepository> AccountService<'a, R> {
    pub fn new(repo: R, codec: &'a TokenCodec, hasher: &'a dyn CredentialHasher) -> Self {
        Self {
            repo,
            codec,
            hasher,
        }
    }

    /// Resolves an `Authorization` header value to the current principal.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, ServiceError> {
        Ok(SessionValidator::new(self.codec, &self.repo).validate(authorization)?)
    }

    /// Creates an account and opens its first session.
    pub fn signup(&self, request: &SignupRequest) -> Result<IssuedSession, ServiceError> {
        let user_name = normalize_user_name(&request.user_name)?;
        let email = normalize_email(&request.email)?;
        let phone = normalize_phone(&request.phone)?;
        validate_password(&request.password)?;

        if self.repo.find_by_email(&email)?.is_some() {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }

        let now_ms = now_epoch_ms();
        let new_account = NewAccount {
            id: Uuid::new_v4(),
            user_name,
            email,
            password_hash: self.hasher.hash(&request.password)?,
            phone,
            epoch: Epoch::from_millis(now_ms),
        };
        let account = self.repo.create_account(&new_account, now_ms)?;
        info!(
            "event=account_signup module=account status=ok account_id={}",
            account.id
        );
        self.issue_session(account)
    }

    /// Verifies credentials and starts a new session generation.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedSession, ServiceError> {
        let account = self
            .repo
            .find_by_email(email.trim())?
            .ok_or(ServiceError::NotFound("account"))?;
        self.verify_credential(&account, password)?;

        let account = self.repo.advance_epoch(account.id, now_epoch_ms())?;
        info!(
            "event=account_login module=account status=ok account_id={} epoch={}",
            account.id, account.epoch
        );
        self.issue_session(account)
    }

    /// Replaces the password of the account identified by `request.email`.
    ///
    /// The epoch is not advanced, so tokens issued before the reset remain
    /// valid.
    pub fn reset_password(
        &self,
        actor: &Principal,
        request: &ResetPasswordRequest,
    ) -> Result<(), ServiceError> {
        validate_password(&request.new_password)?;
        let account = self
            .repo
            .find_by_email(request.email.trim())?
            .ok_or(ServiceError::NotFound("account"))?;
        self.verify_credential(&account, &request.old_password)?;

        let new_hash = self.hasher.hash(&request.new_password)?;
        self.repo
            .set_password_hash(account.id, &new_hash, now_epoch_ms())?;
        info!(
            "event=password_reset module=account status=ok actor_id={} account_id={}",
            actor.id, account.id
        );
        Ok(())
    }

    /// Replaces name, email and phone, then starts a new session generation.
    pub fn update_details(
        &self,
        principal: &Principal,
        request: &UpdateDetailsRequest,
    ) -> Result<IssuedSession, ServiceError> {
        let update = IdentityUpdate {
            user_name: normalize_user_name(&request.user_name)?,
            email: normalize_email(&request.new_email)?,
            phone: normalize_phone(&request.phone)?,
        };

        let account = self
            .repo
            .find_by_id(principal.id)?
            .filter(|account| account.email == request.old_email.trim())
            .ok_or(ServiceError::NotFound("account with old email"))?;
        self.verify_credential(&account, &request.password)?;

        if let Some(holder) = self.repo.find_by_email(&update.email)? {
            if holder.id != account.id {
                return Err(ServiceError::Conflict(
                    "New email is already in use".to_string(),
                ));
            }
        }

        let account = self
            .repo
            .update_identity(account.id, &update, now_epoch_ms())?;
        info!(
            "event=account_update module=account status=ok account_id={} epoch={}",
            account.id, account.epoch
        );
        self.issue_session(account)
    }

    /// Deletes the account with its notes and image records.
    pub fn delete_account(&self, principal: &Principal) -> Result<AccountDeletion, ServiceError> {
        let deletion = self.repo.delete_account(principal.id)?;
        info!(
            "event=account_delete module=account status=ok account_id={} notes_removed={} images_removed={}",
            principal.id, deletion.notes_removed, deletion.images_removed
        );
        Ok(deletion)
    }

    /// Loads an account as a principal.
    pub fn profile(&self, id: AccountId) -> Result<Principal, ServiceError> {
        self.repo
            .find_by_id(id)?
            .map(Account::into_principal)
            .ok_or(ServiceError::NotFound("account"))
    }

    fn verify_credential(&self, account: &Account, credential: &str) -> Result<(), ServiceError> {
        if self.hasher.verify(credential, &account.password_hash)? {
            return Ok(());
        }
        warn!(
            "event=credential_verify module=account status=rejected account_id={}",
            account.id
        );
        Err(ServiceError::CredentialMismatch)
    }

    fn issue_session(&self, account: Account) -> Result<IssuedSession, ServiceError> {
        let token = self
            .codec
            .issue(account.id, &account.user_name, account.epoch)?;
        Ok(IssuedSession {
            token,
            principal: account.into_principal(),
        })
    }
}
