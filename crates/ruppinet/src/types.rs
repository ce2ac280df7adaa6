//! Domain models and wire types for the portal API.
//!
//! The portal returns nested `clientData` arrays keyed by Hebrew-derived
//! field names (`krs_shm`, `moed_1_zin`, ...). The raw structs here mirror
//! that shape one-to-one; the public models are their cleaned-up form.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder grade for a course that has no grade yet. Distinct from any
/// real grade string the portal returns.
pub const NO_GRADE: &str = "No grade";

/// A single event in the week/month schedule view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// ISO 8601 date-time string as returned by the portal
    pub date: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub place: Option<String>,
    pub more_info: Option<String>,
}

impl ScheduleEntry {
    /// The calendar day this entry belongs to, taken from the date-only
    /// prefix of `date`. `None` if the prefix is not a valid date.
    pub fn day(&self) -> Option<NaiveDate> {
        let date_part = self.date.split('T').next()?;
        date_part.parse().ok()
    }
}

/// Opaque parameters returned by the schedule-data endpoint and echoed back
/// in every schedule request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParams {
    #[serde(rename = "__hash")]
    pub hash: String,
    pub pt: i64,
    #[serde(rename = "ptMsl")]
    pub pt_msl: i64,
    pub shl: i64,
}

/// One course meeting in the semester schedule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCourse {
    pub name: String,
    pub instructor: String,
    /// Time of day, `HH:MM`
    pub start_time: String,
    pub end_time: String,
    pub day: String,
    pub location: String,
    pub semester: String,
    pub study_year: String,
}

/// A course with its top-level grade and nested detail records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    /// Real grade or [`NO_GRADE`]
    pub grade: String,
    pub study_year: String,
    pub weight: String,
    pub details: Vec<CourseDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub name: String,
    pub final_grade: String,
    pub components: Vec<GradeComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeComponent {
    pub group: String,
    pub date: String,
    pub time: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradesAverages {
    pub cumulative_average: Option<String>,
    /// Oldest year first
    pub annual_averages: Vec<String>,
}

/// The full grades payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradesData {
    pub courses: Vec<Course>,
    pub averages: GradesAverages,
}

impl GradesData {
    /// The `(course name, grade)` pairs the grade poller diffs on.
    pub fn grade_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.courses
            .iter()
            .map(|c| (c.name.clone(), c.grade.clone()))
    }
}

/// The event currently in progress, shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub title: String,
    pub place: String,
    /// Time of day, `HH:MM`
    pub start_time: String,
    pub end_time: String,
}

/// An upcoming calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub title: String,
    /// `dd/mm/yyyy`
    pub date: String,
    pub kind: String,
    pub is_exam: bool,
}

impl UpcomingEvent {
    /// Days from `from` until this event; negative if it already passed.
    /// `None` if the stored date does not parse.
    pub fn days_until(&self, from: NaiveDate) -> Option<i64> {
        let event_date = NaiveDate::parse_from_str(&self.date, "%d/%m/%Y").ok()?;
        Some((event_date - from).num_days())
    }
}

// ---------------------------------------------------------------------------
// Wire types

/// The `{"clientData": [...]}` wrapper most portal list payloads use.
#[derive(Debug, Deserialize)]
pub(crate) struct ClientData<T> {
    #[serde(rename = "clientData", default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleDataResponse {
    #[serde(rename = "_ScheduleParams")]
    pub params: ScheduleParams,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeekScheduleResponse {
    #[serde(rename = "scheduleViewItemWeek")]
    pub week: ClientData<RawWeekEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawWeekEvent {
    pub date: String,
    pub title: String,
    #[serde(rename = "mar_full_start")]
    pub start: String,
    #[serde(rename = "mar_full_end")]
    pub end: String,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(rename = "moreinfo", default)]
    pub more_info: Option<String>,
}

impl From<RawWeekEvent> for ScheduleEntry {
    fn from(raw: RawWeekEvent) -> Self {
        Self {
            date: raw.date,
            title: raw.title,
            start_time: raw.start,
            end_time: raw.end,
            place: raw.place.filter(|p| !p.is_empty()),
            more_info: raw.more_info.filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SemesterScheduleResponse {
    #[serde(rename = "scheduleViewItemSms")]
    pub semester: ClientData<RawScheduleCourse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawScheduleCourse {
    #[serde(rename = "krs_shm")]
    pub name: String,
    #[serde(rename = "pm_shm")]
    pub instructor: String,
    #[serde(rename = "krs_moed_meshaa", default, deserialize_with = "lenient_string")]
    pub start: Option<String>,
    #[serde(rename = "krs_moed_adshaa", default, deserialize_with = "lenient_string")]
    pub end: Option<String>,
    #[serde(rename = "krs_moed_yom", default, deserialize_with = "lenient_string")]
    pub day: Option<String>,
    #[serde(rename = "hdr_shm", default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(rename = "krs_moed_sms", default, deserialize_with = "lenient_string")]
    pub semester: Option<String>,
    #[serde(rename = "krs_snl", default, deserialize_with = "lenient_string")]
    pub study_year: Option<String>,
}

impl From<RawScheduleCourse> for ScheduleCourse {
    fn from(raw: RawScheduleCourse) -> Self {
        Self {
            name: raw.name,
            instructor: raw.instructor,
            start_time: time_of_day_or_raw(raw.start.as_deref().unwrap_or("00:00")),
            end_time: time_of_day_or_raw(raw.end.as_deref().unwrap_or("00:00")),
            day: raw.day.unwrap_or_else(|| "Unknown".to_string()),
            location: raw.location.unwrap_or_else(|| "Unknown".to_string()),
            semester: raw.semester.unwrap_or_else(|| "Unknown".to_string()),
            study_year: raw.study_year.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// `HH:MM` slice of a full date-time string, or the string itself when it is
/// already a bare time.
fn time_of_day_or_raw(value: &str) -> String {
    value.get(11..16).unwrap_or(value).to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradesResponse {
    #[serde(rename = "collapsedCourses")]
    pub courses: ClientData<RawCourse>,
    #[serde(default)]
    pub averages: Vec<RawAverage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAverage {
    #[serde(rename = "cumulativeAverage", default, deserialize_with = "lenient_string")]
    pub cumulative: Option<String>,
    #[serde(rename = "annualAverage", default, deserialize_with = "lenient_string")]
    pub annual: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCourse {
    #[serde(rename = "krs_shm")]
    pub name: String,
    #[serde(rename = "moed_1_zin", default, deserialize_with = "lenient_string")]
    pub grade: Option<String>,
    #[serde(rename = "krs_snl", default, deserialize_with = "lenient_string")]
    pub study_year: Option<String>,
    #[serde(rename = "zikui_mishkal", default, deserialize_with = "lenient_string")]
    pub weight: Option<String>,
    #[serde(rename = "__body", default)]
    pub details: Vec<RawCourseDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCourseDetail {
    #[serde(rename = "krs_shm", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "bhnzin", default, deserialize_with = "lenient_string")]
    pub final_grade: Option<String>,
    #[serde(rename = "__body", default)]
    pub components: Vec<RawGradeComponent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGradeComponent {
    #[serde(rename = "zin_sug", default, deserialize_with = "lenient_string")]
    pub group: Option<String>,
    #[serde(rename = "bhn_moed_dtmoed", default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(rename = "bhn_moed_time", default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(rename = "moed_1_zin", default, deserialize_with = "lenient_string")]
    pub grade: Option<String>,
}

impl From<GradesResponse> for GradesData {
    fn from(raw: GradesResponse) -> Self {
        let cumulative_average = raw.averages.first().and_then(|a| a.cumulative.clone());
        let mut annual_averages: Vec<String> =
            raw.averages.into_iter().filter_map(|a| a.annual).collect();
        annual_averages.reverse();

        let courses = raw
            .courses
            .items
            .into_iter()
            .map(Course::from)
            .collect();

        Self {
            courses,
            averages: GradesAverages {
                cumulative_average,
                annual_averages,
            },
        }
    }
}

impl From<RawCourse> for Course {
    fn from(raw: RawCourse) -> Self {
        Self {
            name: raw.name,
            grade: raw.grade.unwrap_or_else(|| NO_GRADE.to_string()),
            study_year: raw.study_year.unwrap_or_default(),
            weight: raw.weight.unwrap_or_default(),
            details: raw.details.into_iter().map(CourseDetail::from).collect(),
        }
    }
}

impl From<RawCourseDetail> for CourseDetail {
    fn from(raw: RawCourseDetail) -> Self {
        Self {
            name: raw.name.unwrap_or_else(|| "No name".to_string()),
            final_grade: raw
                .final_grade
                .unwrap_or_else(|| "No final grade".to_string()),
            components: raw
                .components
                .into_iter()
                .map(GradeComponent::from)
                .collect(),
        }
    }
}

impl From<RawGradeComponent> for GradeComponent {
    fn from(raw: RawGradeComponent) -> Self {
        Self {
            group: raw.group.unwrap_or_else(|| "No group name".to_string()),
            date: raw.date.unwrap_or_default(),
            time: raw.time.unwrap_or_default(),
            grade: raw.grade.unwrap_or_else(|| NO_GRADE.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomeScheduleResponse {
    #[serde(default)]
    pub events: Vec<RawCurrentEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCurrentEvent {
    pub data: RawEventData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEventData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<String>,
}

impl RawEventData {
    /// `None` when either time lacks a `T<HH:MM...>` part.
    pub(crate) fn into_event_info(self) -> Option<EventInfo> {
        let start = time_part(self.start_time.as_deref()?)?;
        let end = time_part(self.end_time.as_deref()?)?;
        Some(EventInfo {
            title: self.title.unwrap_or_else(|| "No title".to_string()),
            place: self.place.unwrap_or_else(|| "No location".to_string()),
            start_time: start.to_string(),
            end_time: end.to_string(),
        })
    }
}

fn time_part(datetime: &str) -> Option<&str> {
    let (_, time) = datetime.split_once('T')?;
    time.get(..5)
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomeDataResponse {
    #[serde(default)]
    pub events: Vec<RawUpcomingEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUpcomingEvent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl RawUpcomingEvent {
    /// `None` when the date prefix does not parse as a calendar date.
    pub(crate) fn into_upcoming_event(self) -> Option<UpcomingEvent> {
        let raw_date = self.date?;
        let day: NaiveDate = raw_date.split('T').next()?.parse().ok()?;
        let kind = self.kind.unwrap_or_default();
        Some(UpcomingEvent {
            title: self.title.unwrap_or_else(|| "No title".to_string()),
            date: day.format("%d/%m/%Y").to_string(),
            is_exam: kind == "StudentExams",
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoResponse {
    #[serde(rename = "userInfo", default)]
    pub user_info: Option<RawUserInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUserInfo {
    #[serde(default)]
    pub smp: Option<String>,
    #[serde(default)]
    pub smm: Option<String>,
}

impl RawUserInfo {
    pub(crate) fn display_name(self) -> Option<String> {
        let first = self.smp.unwrap_or_default();
        let last = self.smm.unwrap_or_default();
        let full = format!("{first} {last}").trim().to_string();
        (!full.is_empty()).then_some(full)
    }
}

/// Accepts a string, number, bool, or null where a string is expected,
/// mirroring the portal's habit of switching between them.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn week_event_parses_with_missing_optionals() {
        let payload = json!({
            "scheduleViewItemWeek": {
                "clientData": [
                    {
                        "date": "2024-03-14T00:00:00",
                        "title": "Linear Algebra",
                        "mar_full_start": "2024-03-14T09:30:00",
                        "mar_full_end": "2024-03-14T11:00:00"
                    }
                ]
            }
        });
        let response: WeekScheduleResponse = serde_json::from_value(payload).unwrap();
        let entry = ScheduleEntry::from(response.week.items.into_iter().next().unwrap());
        assert_eq!(entry.title, "Linear Algebra");
        assert_eq!(entry.place, None);
        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2024, 3, 14));
    }

    #[test]
    fn entry_day_is_none_for_garbage_dates() {
        let entry = ScheduleEntry {
            date: "not-a-date".to_string(),
            title: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            place: None,
            more_info: None,
        };
        assert_eq!(entry.day(), None);
    }

    #[test]
    fn grades_parse_with_numeric_and_missing_grades() {
        let payload = json!({
            "collapsedCourses": {
                "clientData": [
                    {"krs_shm": "Calculus", "moed_1_zin": 85, "krs_snl": 2024, "zikui_mishkal": "4"},
                    {"krs_shm": "Physics", "moed_1_zin": null},
                    {
                        "krs_shm": "Chemistry",
                        "moed_1_zin": "90",
                        "__body": [
                            {
                                "krs_shm": "Chemistry Lab",
                                "bhnzin": "88",
                                "__body": [
                                    {"zin_sug": "Exam", "bhn_moed_dtmoed": "2024-02-01", "moed_1_zin": 88}
                                ]
                            }
                        ]
                    }
                ]
            },
            "averages": [
                {"cumulativeAverage": "88.5", "annualAverage": "91.0"},
                {"annualAverage": "86.0"}
            ]
        });
        let data = GradesData::from(serde_json::from_value::<GradesResponse>(payload).unwrap());

        assert_eq!(data.courses[0].grade, "85");
        assert_eq!(data.courses[0].study_year, "2024");
        assert_eq!(data.courses[1].grade, NO_GRADE);
        assert_eq!(data.courses[2].details[0].final_grade, "88");
        assert_eq!(data.courses[2].details[0].components[0].grade, "88");

        assert_eq!(data.averages.cumulative_average.as_deref(), Some("88.5"));
        // Annual averages come newest-first from the portal.
        assert_eq!(data.averages.annual_averages, vec!["86.0", "91.0"]);
    }

    #[test]
    fn grade_pairs_feed_the_poller() {
        let data = GradesData {
            courses: vec![Course {
                name: "Calculus".to_string(),
                grade: "85".to_string(),
                study_year: String::new(),
                weight: String::new(),
                details: Vec::new(),
            }],
            averages: GradesAverages {
                cumulative_average: None,
                annual_averages: Vec::new(),
            },
        };
        let pairs: Vec<_> = data.grade_pairs().collect();
        assert_eq!(pairs, vec![("Calculus".to_string(), "85".to_string())]);
    }

    #[test]
    fn current_event_requires_well_formed_times() {
        let good = RawEventData {
            title: Some("Lecture".to_string()),
            place: None,
            start_time: Some("2024-03-14T09:30:00".to_string()),
            end_time: Some("2024-03-14T11:00:00".to_string()),
        };
        let info = good.into_event_info().unwrap();
        assert_eq!(info.start_time, "09:30");
        assert_eq!(info.place, "No location");

        let bad = RawEventData {
            title: None,
            place: None,
            start_time: Some(String::new()),
            end_time: Some("2024-03-14T11:00:00".to_string()),
        };
        assert!(bad.into_event_info().is_none());
    }

    #[test]
    fn upcoming_event_reformats_date_and_flags_exams() {
        let raw = RawUpcomingEvent {
            title: Some("Final".to_string()),
            date: Some("2024-07-01T00:00:00".to_string()),
            kind: Some("StudentExams".to_string()),
        };
        let event = raw.into_upcoming_event().unwrap();
        assert_eq!(event.date, "01/07/2024");
        assert!(event.is_exam);
        assert_eq!(
            event.days_until(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()),
            Some(3)
        );

        let malformed = RawUpcomingEvent {
            title: None,
            date: Some("whenever".to_string()),
            kind: None,
        };
        assert!(malformed.into_upcoming_event().is_none());
    }

    #[test]
    fn user_name_joins_and_trims() {
        let raw = RawUserInfo {
            smp: Some("Noor".to_string()),
            smm: None,
        };
        assert_eq!(raw.display_name().as_deref(), Some("Noor"));

        let empty = RawUserInfo {
            smp: None,
            smm: None,
        };
        assert_eq!(empty.display_name(), None);
    }

    #[test]
    fn schedule_params_round_trip_wire_names() {
        let params = ScheduleParams {
            hash: "abc".to_string(),
            pt: 1,
            pt_msl: 2,
            shl: 3,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"__hash": "abc", "pt": 1, "ptMsl": 2, "shl": 3}));
    }
}
