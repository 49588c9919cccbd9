use std::time::Duration;

use reqwest::{Client, Response};

/// Build the long-lived client shared by one provider.
///
/// Every request made through it is bounded by `timeout`, so a stalled
/// upstream surfaces as a timeout error instead of blocking the caller.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("newsrag/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// Split a response into `Ok(response)` for 2xx, or `Err((status, body))`.
///
/// The body is read eagerly on failure so that it can be logged; a body that
/// cannot be read is reported as empty.
pub(crate) async fn check_status(resp: Response) -> Result<Response, (u16, String)> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err((status.as_u16(), truncate_for_log(&body)))
}

fn truncate_for_log(body: &str) -> String {
    const LIMIT: usize = 512;
    if body.len() <= LIMIT {
        return body.to_owned();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_untouched() {
        assert_eq!(truncate_for_log("rate limited"), "rate limited");
    }

    #[test]
    fn long_bodies_are_cut_on_a_char_boundary() {
        let body = "é".repeat(400);
        let cut = truncate_for_log(&body);
        assert!(cut.ends_with('…'));
        assert!(cut.len() <= 512 + '…'.len_utf8());
    }
}
