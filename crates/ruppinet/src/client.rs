//! HTTP client for the portal API.
//!
//! Every endpoint is a JSON POST carrying a bearer token. The client owns a
//! single `reqwest::Client`; the cache and poller talk to it through the
//! narrow [`WeekScheduleSource`] / [`GradesSource`] ports so they can be
//! exercised without a network.

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::schedule::dates::week_key;
use crate::types::{
    EventInfo, GradesData, GradesResponse, HomeDataResponse, HomeScheduleResponse,
    ScheduleCourse, ScheduleDataResponse, ScheduleEntry, ScheduleParams,
    SemesterScheduleResponse, UpcomingEvent, UserInfoResponse, WeekScheduleResponse,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Paths for the portal endpoints.
const SCHEDULE_DATA_PATH: &str = "/api/StudentSchedule/Data";
const SEMESTER_SCHEDULE_PATH: &str = "/api/StudentScheduleCommon/GetSchedule";
const WEEK_SCHEDULE_PATH: &str = "/api/StudentScheduleCommon/DateChanged";
const GRADES_PATH: &str = "/api/Grades/Data";
const HOME_SCHEDULE_PATH: &str = "/api/Home/ScheduleData";
const HOME_DATA_PATH: &str = "/api/Home/Data";
const USER_INFO_PATH: &str = "/api/Account/UserInfo";

/// Source of week-schedule data, as consumed by the schedule cache.
#[async_trait]
pub trait WeekScheduleSource: Send + Sync {
    async fn fetch_week(
        &self,
        token: &str,
        params: &ScheduleParams,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, PortalError>;
}

/// Source of the grades payload, as consumed by the grade poller.
#[async_trait]
pub trait GradesSource: Send + Sync {
    async fn fetch_grades(&self, token: &str) -> Result<GradesData, PortalError>;
}

/// Client for the portal's student API.
pub struct PortalClient {
    http: Client,
    config: PortalConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        Url::parse(&config.base_url)?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortalError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Fetches the opaque schedule parameters required by every schedule
    /// request.
    pub async fn fetch_schedule_params(&self, token: &str) -> Result<ScheduleParams, PortalError> {
        let body = self
            .post_json(SCHEDULE_DATA_PATH, token, &json!({"urlParameters": {}}))
            .await?;
        let response: ScheduleDataResponse = serde_json::from_str(&body)?;
        Ok(response.params)
    }

    /// Fetches the semester course list, sorted by start time.
    pub async fn fetch_semester_schedule(
        &self,
        token: &str,
        params: &ScheduleParams,
    ) -> Result<Vec<ScheduleCourse>, PortalError> {
        let body = self
            .post_json(SEMESTER_SCHEDULE_PATH, token, &serde_json::to_value(params)?)
            .await?;
        let response: SemesterScheduleResponse = serde_json::from_str(&body)?;
        let mut courses: Vec<ScheduleCourse> = response
            .semester
            .items
            .into_iter()
            .map(ScheduleCourse::from)
            .collect();
        courses.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(courses)
    }

    /// Fetches the grades payload.
    pub async fn fetch_grades_data(&self, token: &str) -> Result<GradesData, PortalError> {
        let body = self
            .post_json(GRADES_PATH, token, &json!({"urlParameters": {}}))
            .await?;
        let response: GradesResponse = serde_json::from_str(&body)?;
        Ok(GradesData::from(response))
    }

    /// Fetches the event currently in progress for `day`, if any.
    pub async fn fetch_current_event(
        &self,
        token: &str,
        day: NaiveDate,
    ) -> Result<Option<EventInfo>, PortalError> {
        let stamp = format!("{day}T00:00:00");
        let body = self
            .post_json(
                HOME_SCHEDULE_PATH,
                token,
                &json!({"fromDate": stamp, "toDate": stamp}),
            )
            .await?;
        let response: HomeScheduleResponse = serde_json::from_str(&body)?;
        Ok(response
            .events
            .into_iter()
            .next()
            .and_then(|event| event.data.into_event_info()))
    }

    /// Fetches upcoming events for the home screen. Events with unusable
    /// dates are dropped.
    pub async fn fetch_upcoming_events(
        &self,
        token: &str,
    ) -> Result<Vec<UpcomingEvent>, PortalError> {
        let body = self
            .post_json(HOME_DATA_PATH, token, &json!({"urlParameters": {}}))
            .await?;
        let response: HomeDataResponse = serde_json::from_str(&body)?;
        Ok(response
            .events
            .into_iter()
            .filter_map(|event| event.into_upcoming_event())
            .collect())
    }

    /// Fetches the signed-in student's display name.
    pub async fn fetch_user_name(&self, token: &str) -> Result<Option<String>, PortalError> {
        let body = self.post_json(USER_INFO_PATH, token, &json!({})).await?;
        let response: UserInfoResponse = serde_json::from_str(&body)?;
        Ok(response.user_info.and_then(|info| info.display_name()))
    }

    async fn post_json(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<String, PortalError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(url = %url, "portal request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::UnexpectedResponse {
                message: format!("{path} returned status {status}"),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WeekScheduleSource for PortalClient {
    async fn fetch_week(
        &self,
        token: &str,
        params: &ScheduleParams,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, PortalError> {
        let body = json!({
            "_ScheduleParams": params,
            "date": week_key(week_start),
        });
        let text = self.post_json(WEEK_SCHEDULE_PATH, token, &body).await?;
        let response: WeekScheduleResponse = serde_json::from_str(&text)?;
        Ok(response
            .week
            .items
            .into_iter()
            .map(ScheduleEntry::from)
            .collect())
    }
}

#[async_trait]
impl GradesSource for PortalClient {
    async fn fetch_grades(&self, token: &str) -> Result<GradesData, PortalError> {
        self.fetch_grades_data(token).await
    }
}
