//! Tee-time reservation handlers.
//!
//! All three actions share one [`ReservationClient`]: it resolves the
//! course from the catalog, logs in with the OAuth password grant, verifies
//! the golfer's identity claims, and then talks to the site's endpoints.
//! Booking is a three-step flow (lock, price, reserve); the final reserve
//! call is never retried since it is not idempotent.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use actuator_core::types::ActionType;
use actuator_http::{bearer_header, HttpClient, HttpError, OAuthClient, RequestConfig, TokenRequest};

use crate::catalog::{endpoint, Course, CourseCatalog};
use crate::claims::{string_or_number, ClaimsVerifier, IdentityClaims};
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::ActionPayload;

/// Wall-clock format used by the reservation site (no offset).
pub const SITE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const DEFAULT_LOCK_SETTLE_DELAY: Duration = Duration::from_secs(3);
const MAX_RESERVATIONS: usize = 4;
const RESERVATIONS_PAGE_SIZE: u32 = 14;
const ACCEPT: &str = "application/json, text/plain, */*";
const DISPLAY_FORMAT: &str = "%a, %b %-d at %-I:%M %p";
const NO_TEETIMES: &str = "NO_TEETIMES";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ReservationsPage {
    #[serde(default)]
    items: Option<Vec<Reservation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reservation {
    pub reservation_id: i64,
    pub start_time: String,
    pub course_name: String,
    #[serde(rename = "numberOfPlayer")]
    pub number_of_players: u32,
    #[serde(rename = "reservationConfirmKey")]
    pub confirmation_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeeTimeSlot {
    pub tee_sheet_id: i64,
    pub start_time: String,
    pub course_name: String,
    pub holes: u32,
    pub sh_item_prices: Vec<ItemPrice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPrice {
    pub sh_item_code: String,
    pub price: f64,
    pub item_desc: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LockResponse {
    session_id: Option<String>,
    error: Option<String>,
    warning: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub transaction_id: String,
    pub start_time: String,
    pub course_name: String,
    pub holes: u32,
    pub summary_detail: PricingSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingSummary {
    pub total: f64,
    pub total_due_at_course: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReserveResponse {
    pub reservation_id: i64,
    pub confirmation_key: String,
    pub reservation_result: i64,
}

// =============================================================================
// Parameters
// =============================================================================

fn player_count(requested: u32) -> Result<u32, ActionError> {
    match requested {
        0 => Ok(1),
        1..=4 => Ok(requested),
        _ => Err(ActionError::InvalidPayload(
            "number_of_players must be between 1 and 4".into(),
        )),
    }
}

fn parse_site_time(field: &str, raw: &str) -> Result<NaiveDateTime, ActionError> {
    NaiveDateTime::parse_from_str(raw, SITE_TIME_FORMAT).map_err(|e| {
        ActionError::InvalidPayload(format!(
            "{} must be YYYY-MM-DDTHH:MM:SS, got '{}': {}",
            field, raw, e
        ))
    })
}

/// Tee time as reported by the site: RFC 3339, or wall-clock without offset
/// (taken as UTC).
pub fn parse_tee_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, SITE_TIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Date in the site's search format, e.g. `Sun Jun 1 2025`.
    pub search_date: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub players: u32,
    pub max_results: usize,
    pub auto_book: bool,
}

impl SearchParams {
    pub fn from_payload(payload: &ActionPayload) -> Result<Self, ActionError> {
        let raw_start = payload
            .start_search_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ActionError::InvalidPayload("start_search_time is required".into()))?;
        let start = parse_site_time("start_search_time", raw_start)?;
        let end = payload
            .end_search_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|raw| parse_site_time("end_search_time", raw))
            .transpose()?;
        let max_results = if payload.max_results > 0 {
            payload.max_results
        } else {
            DEFAULT_MAX_RESULTS
        };
        Ok(Self {
            search_date: start.format("%a %b %-d %Y").to_string(),
            start,
            end,
            players: player_count(payload.number_of_players)?,
            max_results: max_results as usize,
            auto_book: payload.auto_book,
        })
    }

    fn in_range(&self, at: NaiveDateTime) -> bool {
        at >= self.start && self.end.map_or(true, |end| at <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingParams {
    pub tee_sheet_id: i64,
    pub players: u32,
}

impl BookingParams {
    pub fn from_payload(payload: &ActionPayload) -> Result<Self, ActionError> {
        if payload.tee_sheet_id <= 0 {
            return Err(ActionError::InvalidPayload("tee_sheet_id is required".into()));
        }
        Ok(Self {
            tee_sheet_id: payload.tee_sheet_id,
            players: player_count(payload.number_of_players)?,
        })
    }
}

// =============================================================================
// Formatting
// =============================================================================

fn urgency(at: DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let days = (at.with_timezone(&Utc) - now).num_hours() / 24;
    match days {
        0 => " 🔴 TODAY".to_string(),
        1 => " 🟡 TOMORROW".to_string(),
        2..=3 => format!(" 🟢 in {} days", days),
        _ => String::new(),
    }
}

/// Summary of the earliest upcoming reservations. Entries whose start time
/// cannot be parsed sort last and show the raw value.
pub fn format_reservations(reservations: &[Reservation], now: DateTime<Utc>) -> String {
    if reservations.is_empty() {
        return "⛳ Golf Reservations\n\nNo upcoming tee times found.\n".to_string();
    }

    let mut dated: Vec<(Option<DateTime<FixedOffset>>, &Reservation)> = reservations
        .iter()
        .map(|r| {
            let at = parse_tee_time(&r.start_time);
            if at.is_none() {
                warn!(start_time = %r.start_time, "Failed to parse reservation start time");
            }
            (at, r)
        })
        .collect();
    dated.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    dated.truncate(MAX_RESERVATIONS);

    let mut out = String::from("⛳ Upcoming Tee Times\n\n");
    for (i, (at, reservation)) in dated.iter().enumerate() {
        let when = match at {
            Some(at) => format!("{}{}", at.format(DISPLAY_FORMAT), urgency(*at, now)),
            None => reservation.start_time.clone(),
        };
        out.push_str(&format!("{}. {}\n", i + 1, when));
        if !reservation.course_name.is_empty() {
            out.push_str(&format!("   📍 {}\n", reservation.course_name));
        }
        out.push_str(&format!("   👥 {} player(s)\n", reservation.number_of_players));
        if !reservation.confirmation_key.is_empty() {
            out.push_str(&format!("   🎟️ Confirmation: {}\n", reservation.confirmation_key));
        }
        if i + 1 < dated.len() {
            out.push('\n');
        }
    }
    out.push_str(&format!("\n\n🏌️ Total: {} upcoming reservation(s)", dated.len()));
    out
}

/// Slots whose wall-clock start lies within the requested window.
pub fn filter_slots(slots: Vec<TeeTimeSlot>, params: &SearchParams) -> Vec<TeeTimeSlot> {
    slots
        .into_iter()
        .filter(|slot| match parse_tee_time(&slot.start_time) {
            Some(at) => params.in_range(at.naive_local()),
            None => {
                warn!(start_time = %slot.start_time, "Failed to parse tee time slot");
                false
            }
        })
        .collect()
}

/// One outcome per available slot, or a single "nothing found" outcome.
pub fn format_search_results(slots: &[TeeTimeSlot], params: &SearchParams) -> Vec<String> {
    if slots.is_empty() {
        return vec![format!(
            "⛳ Tee Time Search Results\n\nNo available tee times found for {}\nTry adjusting your time range.",
            params.search_date
        )];
    }

    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let time = parse_tee_time(&slot.start_time)
                .map(|at| at.format("%-I:%M %p").to_string())
                .unwrap_or_else(|| slot.start_time.clone());
            let mut out = format!(
                "⛳ Available Tee Time ({} of {})\n\nDate: {}\nPlayers: {}\n\n",
                i + 1,
                slots.len(),
                params.search_date,
                params.players
            );
            out.push_str(&format!("🕐 {}\n", time));
            out.push_str(&format!("📍 {}\n", slot.course_name));
            out.push_str(&format!("⛳ {} holes available\n", slot.holes));
            out.push_str(&format!("🎟️ Tee Sheet ID: {}\n", slot.tee_sheet_id));
            if let Some(fee) = slot
                .sh_item_prices
                .iter()
                .find(|p| p.sh_item_code == "GreenFee18")
            {
                out.push_str(&format!("💵 ${:.2} - {}\n", fee.price, fee.item_desc));
            }
            out
        })
        .collect()
}

pub fn format_booking(course_name: &str, reserve: &ReserveResponse, pricing: &PricingResponse) -> String {
    let mut out = format!("⛳ Tee Time Booked Successfully at {}!\n\n", course_name);
    out.push_str(&format!("Confirmation: {}\n", reserve.confirmation_key));
    out.push_str(&format!("Reservation ID: {}\n\n", reserve.reservation_id));
    if let Ok(at) = NaiveDateTime::parse_from_str(&pricing.start_time, SITE_TIME_FORMAT) {
        out.push_str(&format!("Date/Time: {}\n", at.format(DISPLAY_FORMAT)));
    }
    out.push_str(&format!("Course: {}\n", pricing.course_name));
    out.push_str(&format!("Holes: {}\n\n", pricing.holes));
    out.push_str(&format!("Total: ${:.2}\n", pricing.summary_detail.total));
    out.push_str(&format!(
        "Due at Course: ${:.2}\n\n",
        pricing.summary_detail.total_due_at_course
    ));
    out.push_str("See you on the course!");
    out
}

// =============================================================================
// Client
// =============================================================================

struct SiteSession<'a> {
    course: &'a Course,
    token: String,
    claims: IdentityClaims,
}

impl SiteSession<'_> {
    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), ACCEPT.to_string()),
            bearer_header(&self.token),
            ("client-id".to_string(), self.course.client_id.clone()),
            ("x-componentid".to_string(), "1".to_string()),
            ("x-websiteid".to_string(), self.course.website_id.clone()),
            ("Origin".to_string(), self.course.origin.clone()),
        ]
    }
}

/// Shared client for the reservation site actions.
pub struct ReservationClient {
    http: Arc<HttpClient>,
    oauth: Arc<OAuthClient>,
    verifier: Arc<dyn ClaimsVerifier>,
    catalog: Arc<CourseCatalog>,
    default_secret_name: String,
    lock_settle_delay: Duration,
}

impl ReservationClient {
    pub fn new(
        http: Arc<HttpClient>,
        oauth: Arc<OAuthClient>,
        verifier: Arc<dyn ClaimsVerifier>,
        catalog: Arc<CourseCatalog>,
        default_secret_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            oauth,
            verifier,
            catalog,
            default_secret_name: default_secret_name.into(),
            lock_settle_delay: DEFAULT_LOCK_SETTLE_DELAY,
        }
    }

    /// Pause between pricing and reserving; the site rejects a reserve that
    /// follows the lock too quickly.
    pub fn with_lock_settle_delay(mut self, delay: Duration) -> Self {
        self.lock_settle_delay = delay;
        self
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    async fn open_session(
        &self,
        cancel: &CancellationToken,
        course_id: i64,
    ) -> Result<SiteSession<'_>, ActionError> {
        let course = self.catalog.get(course_id)?;
        let token_url = course.endpoint_url(endpoint::TOKEN)?;
        let jwks_url = course.endpoint_url(endpoint::JWKS)?;
        let secret_name = course
            .secret_name
            .clone()
            .unwrap_or_else(|| self.default_secret_name.clone());

        let token = self
            .oauth
            .password_grant(
                cancel,
                &TokenRequest {
                    token_url,
                    secret_name,
                    scope: course.scope.clone(),
                    headers: vec![
                        ("Accept".to_string(), ACCEPT.to_string()),
                        ("client-id".to_string(), course.client_id.clone()),
                        ("Origin".to_string(), course.origin.clone()),
                    ],
                },
            )
            .await?;
        let claims = self.verifier.verify(cancel, &token, &jwks_url).await?;
        debug!(course_id, golfer_id = %claims.golfer_id, "Reservation session opened");
        Ok(SiteSession {
            course,
            token,
            claims,
        })
    }

    pub async fn fetch_reservations(
        &self,
        cancel: &CancellationToken,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        let session = self.open_session(cancel, payload.course_id).await?;
        // Session headers carry the course token; only catalog endpoints receive them.
        let url = session.course.endpoint_url(endpoint::FETCH_RESERVATIONS)?;

        let request = RequestConfig::get(url)
            .headers(session.headers())
            .query("golferId", &session.claims.golfer_id)
            .query("pageSize", RESERVATIONS_PAGE_SIZE)
            .query("currentPage", 1);
        let response = self.http.execute(cancel, request).await?;
        let page: ReservationsPage = response.json().map_err(|e| {
            ActionError::Execution(format!("failed to parse reservations response: {}", e))
        })?;
        let items = page.items.unwrap_or_default();

        info!(
            course_id = payload.course_id,
            reservations_found = items.len(),
            "Fetched reservations"
        );
        Ok(vec![format_reservations(&items, Utc::now())])
    }

    pub async fn search_tee_times(
        &self,
        cancel: &CancellationToken,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        let params = SearchParams::from_payload(payload)?;
        let session = self.open_session(cancel, payload.course_id).await?;
        let url = session.course.endpoint_url(endpoint::SEARCH_TEE_TIMES)?;

        let request = RequestConfig::get(url)
            .headers(session.headers())
            .query("searchDate", &params.search_date)
            .query("holes", 0)
            .query("numberOfPlayer", params.players)
            .query("courseIds", session.course.course_id)
            .query("searchTimeType", 0)
            .query("teeSheetSearchView", 5)
            .query("classCode", "R")
            .query("defaultOnlineRate", "N")
            .query("isUseCapacityPricing", false)
            .query("memberStoreId", 1)
            .query("searchType", 1);

        let slots: Vec<TeeTimeSlot> = match self.http.execute(cancel, request).await {
            Ok(response) => match serde_json::from_str(&response.body) {
                Ok(slots) => slots,
                Err(_) if response.body.contains(NO_TEETIMES) => Vec::new(),
                Err(e) => {
                    return Err(ActionError::Execution(format!(
                        "failed to parse tee times response: {}",
                        e
                    )))
                }
            },
            Err(HttpError::Status { body, .. }) if body.contains(NO_TEETIMES) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut slots = filter_slots(slots, &params);
        slots.truncate(params.max_results);
        info!(
            course_id = payload.course_id,
            search_date = %params.search_date,
            slots_found = slots.len(),
            auto_book = params.auto_book,
            "Searched tee times"
        );

        if params.auto_book {
            if let Some(first) = slots.first() {
                info!(tee_sheet_id = first.tee_sheet_id, "Auto-booking first available tee time");
                let booking = BookingParams {
                    tee_sheet_id: first.tee_sheet_id,
                    players: params.players,
                };
                return self.book(cancel, &session, booking).await;
            }
        }
        Ok(format_search_results(&slots, &params))
    }

    pub async fn book_tee_time(
        &self,
        cancel: &CancellationToken,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        let params = BookingParams::from_payload(payload)?;
        let session = self.open_session(cancel, payload.course_id).await?;
        self.book(cancel, &session, params).await
    }

    async fn book(
        &self,
        cancel: &CancellationToken,
        session: &SiteSession<'_>,
        params: BookingParams,
    ) -> Result<Vec<String>, ActionError> {
        let golfer_id = session.claims.golfer_id_number()?;

        let lock_session = self.lock(cancel, session, params, golfer_id).await?;
        debug!(session_id = %lock_session, tee_sheet_id = params.tee_sheet_id, "Tee time locked");

        let pricing = self.price(cancel, session, params, golfer_id).await?;
        if pricing.transaction_id.is_empty() {
            return Err(ActionError::Execution(
                "pricing response has no transactionId".into(),
            ));
        }
        debug!(
            transaction_id = %pricing.transaction_id,
            total = pricing.summary_detail.total,
            "Pricing calculated"
        );

        if !self.lock_settle_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ActionError::Cancelled),
                _ = tokio::time::sleep(self.lock_settle_delay) => {}
            }
        }

        let reserve = self
            .reserve(cancel, session, &lock_session, &pricing.transaction_id)
            .await?;
        info!(
            reservation_id = reserve.reservation_id,
            confirmation_key = %reserve.confirmation_key,
            "Tee time reserved"
        );
        Ok(vec![format_booking(&session.course.name, &reserve, &pricing)])
    }

    /// Returns the lock session id to reserve against.
    async fn lock(
        &self,
        cancel: &CancellationToken,
        session: &SiteSession<'_>,
        params: BookingParams,
        golfer_id: i64,
    ) -> Result<String, ActionError> {
        let url = session.course.endpoint_url(endpoint::LOCK_TEE_TIME)?;
        let session_id = Uuid::new_v4().to_string();
        let body = json!({
            "teeSheetIds": [params.tee_sheet_id],
            "email": session.claims.email,
            "action": "Online Reservation V5",
            "sessionId": session_id,
            "golferId": golfer_id,
            "classCode": "R",
            "numberOfPlayer": params.players,
            "navigateUrl": "",
            "isGroupBooking": false,
        });
        let response = self
            .http
            .execute(cancel, RequestConfig::post(url).headers(session.headers()).json(body))
            .await?;
        let lock: LockResponse = response
            .json()
            .map_err(|e| ActionError::Execution(format!("failed to parse lock response: {}", e)))?;

        if let Some(warning) = lock
            .warning
            .as_deref()
            .filter(|w| w.contains("already have a reservation"))
        {
            return Err(ActionError::Conflict(warning.to_string()));
        }
        if let Some(error) = lock.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(ActionError::Execution(format!("lock error: {}", error)));
        }
        Ok(lock
            .session_id
            .filter(|s| !s.is_empty())
            .unwrap_or(session_id))
    }

    async fn price(
        &self,
        cancel: &CancellationToken,
        session: &SiteSession<'_>,
        params: BookingParams,
        golfer_id: i64,
    ) -> Result<PricingResponse, ActionError> {
        let url = session.course.endpoint_url(endpoint::PRICE_CALCULATION)?;
        let body = json!({
            "selectedTeeSheetId": params.tee_sheet_id,
            "bookingList": [{
                "teeSheetId": params.tee_sheet_id,
                "holes": 18,
                "participantNo": 1,
                "golferId": golfer_id,
                "rateCode": "N",
                "isUnAssignedPlayer": false,
                "memberClassCode": "R",
                "memberStoreId": "1",
                "cartType": 1,
                "playerId": "0",
                "acct": session.claims.acct,
                "isGuestOf": false,
                "isUseCapacityPricing": false,
            }],
            "holes": 18,
            "numberOfPlayer": params.players,
            "numberOfRider": 1,
            "cartType": 1,
            "depositType": 0,
            "depositAmount": 0,
            "isUseCapacityPricing": false,
        });
        let response = self
            .http
            .execute(cancel, RequestConfig::post(url).headers(session.headers()).json(body))
            .await?;
        response
            .json()
            .map_err(|e| ActionError::Execution(format!("failed to parse pricing response: {}", e)))
    }

    async fn reserve(
        &self,
        cancel: &CancellationToken,
        session: &SiteSession<'_>,
        lock_session: &str,
        transaction_id: &str,
    ) -> Result<ReserveResponse, ActionError> {
        let url = session.course.endpoint_url(endpoint::BOOK_TEE_TIME)?;
        let body = json!({
            "cancelReservationLink": session.course.cancel_reservation_link(),
            "homePageLink": session.course.home_page_link(),
            "finalizeSaleModel": {
                "acct": session.claims.acct,
                "playerId": 0,
                "isGuest": false,
                "creditCardInfo": { "email": session.claims.email },
            },
            "lockedTeeTimesSessionId": lock_session,
            "transactionId": transaction_id,
        });
        let request = RequestConfig::post(url)
            .headers(session.headers())
            .json(body)
            .max_attempts(1);
        let response = self.http.execute(cancel, request).await?;
        let reserve: ReserveResponse = response.json().map_err(|e| {
            ActionError::Execution(format!("failed to parse reservation response: {}", e))
        })?;
        if reserve.reservation_result != 1 {
            return Err(ActionError::Execution(format!(
                "reservation failed with result code {}",
                reserve.reservation_result
            )));
        }
        Ok(reserve)
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub struct FetchReservationsHandler {
    client: Arc<ReservationClient>,
}

impl FetchReservationsHandler {
    pub fn new(client: Arc<ReservationClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionHandler for FetchReservationsHandler {
    fn action_type(&self) -> ActionType {
        ActionType::FetchReservations
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        self.client.fetch_reservations(cancel, payload).await
    }
}

pub struct SearchTeeTimesHandler {
    client: Arc<ReservationClient>,
}

impl SearchTeeTimesHandler {
    pub fn new(client: Arc<ReservationClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionHandler for SearchTeeTimesHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SearchTeeTimes
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        self.client.search_tee_times(cancel, payload).await
    }
}

pub struct BookTeeTimeHandler {
    client: Arc<ReservationClient>,
}

impl BookTeeTimeHandler {
    pub fn new(client: Arc<ReservationClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionHandler for BookTeeTimeHandler {
    fn action_type(&self) -> ActionType {
        ActionType::BookTeeTime
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        self.client.book_tee_time(cancel, payload).await
    }
}
