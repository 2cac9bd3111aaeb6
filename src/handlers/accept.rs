use axum::http::{HeaderMap, header::ACCEPT};

use crate::error::WalletError;

/// Representations offered by the confirmation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmFormat {
    Json,
    Html,
}

fn media_format(media: &str) -> Option<ConfirmFormat> {
    match media {
        "application/json" | "application/*" | "*/*" => Some(ConfirmFormat::Json),
        "text/html" | "text/*" => Some(ConfirmFormat::Html),
        _ => None,
    }
}

/// Pick a representation from the `Accept` header, honouring `q` weights.
/// A missing or empty header selects JSON.
pub fn negotiate(headers: &HeaderMap) -> Result<ConfirmFormat, WalletError> {
    let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
        return Ok(ConfirmFormat::Json);
    };
    if accept.trim().is_empty() {
        return Ok(ConfirmFormat::Json);
    }

    let mut ranges: Vec<(String, f32)> = accept
        .split(',')
        .filter_map(|range| {
            let mut parts = range.split(';');
            let media = parts.next()?.trim().to_ascii_lowercase();
            if media.is_empty() {
                return None;
            }
            let q = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then_some((media, q))
        })
        .collect();
    // stable: equal weights keep header order
    ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranges
        .iter()
        .find_map(|(media, _)| media_format(media))
        .ok_or(WalletError::NotAcceptable)
}
