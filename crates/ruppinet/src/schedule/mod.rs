//! Week-granular schedule caching for the calendar view.

pub mod cache;
pub mod dates;

pub use cache::ScheduleCache;
pub use dates::YearMonth;
