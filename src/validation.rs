use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::{AppError, AppResult};

const MAX_TEXT_LEN: usize = 255;
const FORBIDDEN_CHARS: [char; 4] = ['!', '@', '#', '?'];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trims and lower-cases `raw`, then checks its length and shape.
pub fn normalize_email(field: &str, raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation(field, "must be a valid email address"));
    }
    Ok(email)
}

/// Display names and locations: 1..=255 characters, none of `! @ # ?`.
pub fn validate_text(field: &str, value: &str) -> AppResult<()> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(AppError::validation(field, "must not be empty"));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
    if value.contains(&FORBIDDEN_CHARS[..]) {
        return Err(AppError::validation(field, "must not contain any of ! @ # ?"));
    }
    Ok(())
}

/// Client origin as stored with the security record. Overlong values are
/// dropped rather than failing the request they arrived with.
pub fn bounded_origin(origin: Option<String>) -> Option<String> {
    origin.filter(|o| {
        let fits = o.chars().count() <= MAX_TEXT_LEN;
        if !fits {
            warn!(len = o.len(), "dropping overlong client origin");
        }
        fits
    })
}

pub fn validate_coordinates(longitude: f64, latitude: f64) -> AppResult<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation("longitude", "must be within [-180, 180]"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation("latitude", "must be within [-90, 90]"));
    }
    Ok(())
}
