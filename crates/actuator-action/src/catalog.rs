//! Course catalog: reservation sites and their named endpoints.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [[courses]]
//! course_id = 1
//! name = "Birdsfoot Golf Course"
//! origin = "https://birdsfoot.cps.golf"
//! client_id = "onlineresweb"
//! website_id = "abc-123"
//! scope = "openid profile onlinereservation"
//!
//! [courses.endpoints]
//! token-url = "/identityapi/connect/token"
//! jwks-url = "/identityapi/.well-known/openid-configuration/jwks"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// Endpoint names every reservation site must define.
pub mod endpoint {
    pub const TOKEN: &str = "token-url";
    pub const JWKS: &str = "jwks-url";
    pub const SEARCH_TEE_TIMES: &str = "search-tee-times";
    pub const LOCK_TEE_TIME: &str = "lock-tee-time";
    pub const PRICE_CALCULATION: &str = "price-calculation";
    pub const BOOK_TEE_TIME: &str = "book-tee-time";
    pub const FETCH_RESERVATIONS: &str = "fetch-reservations";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,
    pub name: String,
    /// Scheme and host all endpoint paths are relative to.
    pub origin: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub website_id: String,
    #[serde(default)]
    pub scope: Option<String>,
    /// Secret holding the site login; falls back to the configured default.
    #[serde(default)]
    pub secret_name: Option<String>,
    /// Path shown to golfers for cancelling a booking.
    #[serde(default)]
    pub cancel_reservation_path: Option<String>,
    #[serde(default)]
    pub home_page_path: Option<String>,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl Course {
    /// Absolute URL of a named endpoint.
    pub fn endpoint_url(&self, name: &str) -> Result<String, ActionError> {
        self.endpoints
            .get(name)
            .map(|path| self.absolute(path))
            .ok_or_else(|| {
                ActionError::Config(format!(
                    "course {} has no '{}' endpoint",
                    self.course_id, name
                ))
            })
    }

    pub fn cancel_reservation_link(&self) -> String {
        self.cancel_reservation_path
            .as_deref()
            .map(|p| self.absolute(p))
            .unwrap_or_default()
    }

    pub fn home_page_link(&self) -> String {
        self.home_page_path
            .as_deref()
            .map(|p| self.absolute(p))
            .unwrap_or_default()
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.origin.trim_end_matches('/'), path)
        }
    }
}

/// All configured reservation sites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseCatalog {
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl CourseCatalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    pub fn load(path: &Path) -> Result<Self, ActionError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ActionError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ActionError> {
        let catalog: CourseCatalog = toml::from_str(contents)
            .map_err(|e| ActionError::Config(format!("invalid course catalog: {}", e)))?;
        let mut seen = std::collections::HashSet::new();
        for course in &catalog.courses {
            if !seen.insert(course.course_id) {
                return Err(ActionError::Config(format!(
                    "duplicate course_id {}",
                    course.course_id
                )));
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, course_id: i64) -> Result<&Course, ActionError> {
        self.courses
            .iter()
            .find(|c| c.course_id == course_id)
            .ok_or_else(|| ActionError::Config(format!("unknown course_id {}", course_id)))
    }

    /// Case-insensitive partial match in either direction, so "birdsfoot"
    /// finds "Birdsfoot Golf Course".
    pub fn find_by_name(&self, name: &str) -> Option<&Course> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.courses.iter().find(|c| {
            let have = c.name.to_lowercase();
            have.contains(&wanted) || wanted.contains(&have)
        })
    }
}
