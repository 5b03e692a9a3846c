//! Auth endpoints and the two sign-in flows built on them.
//!
//! Diners sign in with phone + OTP through [`DinerLogin`]; restaurant staff
//! sign in with email + password through [`ApiClient::sign_in_admin`]. Both
//! write the resulting identity to the [`crate::SessionStore`].

use dinemore_core::User;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ClientError;

#[derive(Debug, Serialize)]
struct PhoneRequest<'a> {
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyOtpRequest<'a> {
    phone: &'a str,
    otp: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTokenResponse {
    pub has_valid_token: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpResponse {
    pub sms_sent: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

/// Rejects blank input before anything is sent.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

impl ApiClient {
    /// `POST /api/auth/check-token`: whether `phone` still has a valid login.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank phone; otherwise the
    /// transport and status errors of [`ApiClient::api_request`].
    pub async fn check_token(&self, phone: &str) -> Result<CheckTokenResponse, ClientError> {
        let phone = required("phone number", phone)?;
        self.post_json("/api/auth/check-token", &PhoneRequest { phone })
            .await
    }

    /// `POST /api/auth/request-otp`: asks the server to text a code to `phone`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank phone; otherwise the
    /// transport and status errors of [`ApiClient::api_request`].
    pub async fn request_otp(&self, phone: &str) -> Result<RequestOtpResponse, ClientError> {
        let phone = required("phone number", phone)?;
        self.post_json("/api/auth/request-otp", &PhoneRequest { phone })
            .await
    }

    /// `POST /api/auth/verify-otp`. Does not touch the session store.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank phone or code; otherwise the
    /// transport and status errors of [`ApiClient::api_request`].
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<User, ClientError> {
        let phone = required("phone number", phone)?;
        let otp = required("OTP", otp)?;
        let response: UserResponse = self
            .post_json("/api/auth/verify-otp", &VerifyOtpRequest { phone, otp })
            .await?;
        Ok(response.user)
    }

    /// `POST /api/auth/login`. Does not touch the session store.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank email or password; otherwise
    /// the transport and status errors of [`ApiClient::api_request`].
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let email = required("email", email)?;
        if password.is_empty() {
            return Err(ClientError::Validation("password is required".to_string()));
        }
        let response: UserResponse = self
            .post_json("/api/auth/login", &LoginRequest { email, password })
            .await?;
        Ok(response.user)
    }

    /// Admin portal sign-in: [`ApiClient::login`] restricted to admin roles.
    ///
    /// The identity is persisted only when the role is allowed.
    ///
    /// # Errors
    ///
    /// [`ClientError::RoleMismatch`] when the account is not an admin, plus
    /// the errors of [`ApiClient::login`] and storage write failures.
    pub async fn sign_in_admin(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let user = self.login(email, password).await?;
        if !user.user_type.is_admin() {
            tracing::info!(user_type = %user.user_type, "rejected non-admin account at admin login");
            return Err(ClientError::RoleMismatch {
                user_type: user.user_type.to_string(),
            });
        }
        self.session()
            .set_stored_auth(&user.id, user.user_type.as_str())?;
        tracing::info!(user_id = %user.id, "admin signed in");
        Ok(user)
    }
}

/// Diner phone/OTP sign-in.
#[derive(Debug, Clone, Default)]
pub enum DinerLogin {
    #[default]
    PhoneEntry,
    OtpSent {
        phone: String,
        sms_sent: bool,
    },
    Authenticated {
        user: User,
    },
}

impl DinerLogin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes a flow whose code was requested earlier, e.g. by a previous
    /// CLI invocation.
    #[must_use]
    pub fn awaiting_otp(phone: &str) -> Self {
        DinerLogin::OtpSent {
            phone: phone.trim().to_string(),
            sms_sent: true,
        }
    }

    /// Submits the phone number.
    ///
    /// A phone with a still-valid login is signed in directly; otherwise an
    /// OTP is requested and the flow waits for it.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank phone, plus request and
    /// storage errors. The state is unchanged on error.
    pub async fn submit_phone(&mut self, api: &ApiClient, phone: &str) -> Result<(), ClientError> {
        let phone = required("phone number", phone)?;
        let check = api.check_token(phone).await?;
        if let (true, Some(user)) = (check.has_valid_token, check.user) {
            api.session()
                .set_stored_auth(&user.id, user.user_type.as_str())?;
            *self = DinerLogin::Authenticated { user };
            return Ok(());
        }

        let otp = api.request_otp(phone).await?;
        if !otp.sms_sent {
            tracing::warn!("server accepted OTP request but reported no SMS sent");
        }
        *self = DinerLogin::OtpSent {
            phone: phone.to_string(),
            sms_sent: otp.sms_sent,
        };
        Ok(())
    }

    /// Verifies the code texted to the phone from [`DinerLogin::submit_phone`].
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when no code was requested or `otp` is
    /// blank (no request is sent), plus request and storage errors.
    pub async fn submit_otp(&mut self, api: &ApiClient, otp: &str) -> Result<User, ClientError> {
        let DinerLogin::OtpSent { phone, .. } = &*self else {
            return Err(ClientError::Validation(
                "request an OTP before verifying".to_string(),
            ));
        };
        let user = api.verify_otp(phone, otp).await?;
        api.session()
            .set_stored_auth(&user.id, user.user_type.as_str())?;
        *self = DinerLogin::Authenticated { user: user.clone() };
        Ok(user)
    }

    /// Back to phone entry, e.g. to use a different number.
    pub fn reset(&mut self) {
        *self = DinerLogin::PhoneEntry;
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            DinerLogin::Authenticated { user } => Some(user),
            _ => None,
        }
    }
}
