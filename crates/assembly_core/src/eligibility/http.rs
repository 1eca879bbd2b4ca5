//! HTTP adapter for the external user-info eligibility service.
//!
//! Contract: `GET {base_url}/users/{voter_id}` answers 200 with
//! `{"status": "ABLE_TO_VOTE" | "UNABLE_TO_VOTE"}` or 404 for unknown ids.

use crate::eligibility::{EligibilityChecker, EligibilityError};
use crate::model::vote::VoterId;
use log::{debug, error, info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const ABLE_TO_VOTE: &str = "ABLE_TO_VOTE";
pub const UNABLE_TO_VOTE: &str = "UNABLE_TO_VOTE";

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    status: String,
}

/// Blocking HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpEligibilityChecker {
    client: Client,
    base_url: String,
}

impl HttpEligibilityChecker {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EligibilityError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| EligibilityError::Unavailable(format!("client setup failed: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, voter_id: &VoterId) -> String {
        format!("{}/users/{}", self.base_url, voter_id.as_str())
    }
}

impl EligibilityChecker for HttpEligibilityChecker {
    fn is_eligible(&self, voter_id: &VoterId) -> Result<bool, EligibilityError> {
        debug!("event=eligibility_check module=eligibility status=start voter={voter_id}");

        let response = self
            .client
            .get(self.user_url(voter_id))
            .send()
            .map_err(|err| transport_error(err, voter_id))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(
                "event=eligibility_check module=eligibility status=unknown_voter voter={voter_id}"
            );
            return Err(EligibilityError::InvalidIdentifier(voter_id.masked()));
        }
        if !status.is_success() {
            error!(
                "event=eligibility_check module=eligibility status=error voter={voter_id} http_status={}",
                status.as_u16()
            );
            return Err(EligibilityError::Unavailable(format!(
                "unexpected http status {}",
                status.as_u16()
            )));
        }

        let body: UserInfoResponse = response.json().map_err(|err| {
            EligibilityError::Unavailable(format!("unreadable response: {}", err.without_url()))
        })?;
        let eligible = body.status == ABLE_TO_VOTE;
        info!(
            "event=eligibility_check module=eligibility status=ok voter={voter_id} answer={}",
            if eligible { ABLE_TO_VOTE } else { UNABLE_TO_VOTE }
        );
        Ok(eligible)
    }
}

fn transport_error(err: reqwest::Error, voter_id: &VoterId) -> EligibilityError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "network"
    };
    // The request URL embeds the full identifier.
    let err = err.without_url();
    error!(
        "event=eligibility_check module=eligibility status=error voter={voter_id} error_kind={kind} error={err}"
    );
    EligibilityError::Unavailable(format!("{kind} error: {err}"))
}
