//! Sign-in command handlers.
//!
//! Diner commands drive the phone + OTP flow one step per invocation; the
//! admin `login` signs in with email and password. Every successful sign-in
//! is persisted in the profile file so later commands run as that identity.

use clap::Subcommand;
use dinemore_client::{AppSession, DinerLogin};
use dinemore_core::User;

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Ask whether the phone already has a valid session
    CheckToken {
        #[arg(long)]
        phone: String,
    },
    /// Start diner sign-in; sends an OTP unless a valid session exists
    RequestOtp {
        #[arg(long)]
        phone: String,
    },
    /// Finish diner sign-in with the received OTP
    VerifyOtp {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        otp: String,
    },
}

fn describe(user: &User) -> String {
    match user.name.as_deref() {
        Some(name) => format!("{name} ({}, {})", user.id, user.user_type),
        None => format!("{} ({})", user.id, user.user_type),
    }
}

pub(crate) async fn run_auth(app: &AppSession, command: AuthCommands) -> anyhow::Result<()> {
    match command {
        AuthCommands::CheckToken { phone } => {
            let response = app.api().check_token(phone.trim()).await?;
            match (response.has_valid_token, response.user) {
                (true, Some(user)) => println!("valid session for {}", describe(&user)),
                _ => println!("no valid session for {}", phone.trim()),
            }
        }
        AuthCommands::RequestOtp { phone } => {
            let mut flow = DinerLogin::new();
            flow.submit_phone(app.api(), &phone).await?;
            match flow {
                DinerLogin::Authenticated { user } => {
                    println!("signed in as {}", describe(&user));
                }
                DinerLogin::OtpSent { phone, sms_sent } => {
                    if sms_sent {
                        println!("OTP sent to {phone}");
                    } else {
                        println!("OTP issued for {phone} but no SMS was sent");
                    }
                    println!("finish with `auth verify-otp --phone {phone} --otp <code>`");
                }
                DinerLogin::PhoneEntry => {}
            }
        }
        AuthCommands::VerifyOtp { phone, otp } => {
            let mut flow = DinerLogin::awaiting_otp(&phone);
            let user = flow.submit_otp(app.api(), &otp).await?;
            println!("signed in as {}", describe(&user));
        }
    }
    Ok(())
}

/// Admin sign-in.
///
/// # Errors
///
/// Fails on bad credentials or when the account is not a restaurant admin;
/// nothing is stored in either case.
pub(crate) async fn run_login(
    app: &mut AppSession,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let user = app.login_admin(email, password).await?;
    println!("signed in as {}", describe(&user));
    match user.restaurant_id.as_deref() {
        Some(restaurant_id) => println!("restaurant: {restaurant_id}"),
        None => println!("no restaurant linked; pass --restaurant to branch commands"),
    }
    Ok(())
}

pub(crate) fn run_logout(app: &mut AppSession) -> anyhow::Result<()> {
    app.logout()?;
    println!("signed out");
    Ok(())
}

pub(crate) fn run_whoami(app: &AppSession) {
    match app.session().get_stored_auth() {
        Some(auth) => println!("{} ({})", auth.user_id, auth.user_type),
        None => println!("not signed in"),
    }
}
