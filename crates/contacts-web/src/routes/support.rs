//! Support routes.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

const BUG_REPORT_SUBJECT: &str = "Bug Report - Contact Manager App";

/// A prefilled bug report email.
#[derive(Serialize)]
pub struct BugReport {
    pub email: String,
    pub subject: String,
    pub body: String,
    pub mailto: String,
}

fn bug_report_body() -> String {
    format!(
        "Device Details:\n\
         Server: {} {}\n\
         App Version: {}\n\
         \n\
         Bug Description:\n\
         [Please describe the issue you encountered]\n\
         \n\
         Steps to Reproduce:\n\
         1.\n\
         2.\n\
         3.\n\
         \n\
         Expected Behavior:\n\
         [What did you expect to happen?]\n\
         \n\
         Actual Behavior:\n\
         [What actually happened?]",
        std::env::consts::OS,
        std::env::consts::ARCH,
        env!("CARGO_PKG_VERSION"),
    )
}

/// Build a `mailto:` link with an encoded subject and body.
pub fn mailto_link(email: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        email,
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// Prefilled bug report for the configured support address.
pub async fn bug_report(State(state): State<AppState>) -> Json<BugReport> {
    let body = bug_report_body();
    let email = state.config.support_email.clone();

    Json(BugReport {
        mailto: mailto_link(&email, BUG_REPORT_SUBJECT, &body),
        subject: BUG_REPORT_SUBJECT.to_string(),
        email,
        body,
    })
}
