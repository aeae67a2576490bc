//! Service calendar: which service ids run on a given date.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use super::tables::{Calendar, CalendarDate, ExceptionType};

/// Days on which one service runs.
#[derive(Debug, Clone, Default)]
struct ServiceDays {
    pattern: Option<Calendar>,
    added: HashSet<NaiveDate>,
    removed: HashSet<NaiveDate>,
}

impl ServiceDays {
    fn runs_on(&self, date: NaiveDate) -> bool {
        // Explicit additions win over everything else
        if self.added.contains(&date) {
            return true;
        }
        if self.removed.contains(&date) {
            return false;
        }
        self.pattern.as_ref().is_some_and(|p| p.covers(date))
    }
}

/// The combined calendar.txt + calendar_dates.txt view of a feed.
#[derive(Debug, Clone, Default)]
pub struct ServiceCalendar {
    services: HashMap<String, ServiceDays>,
}

impl ServiceCalendar {
    /// Build the calendar from weekly patterns and date exceptions.
    ///
    /// Services that only appear in the exception table are supported.
    pub fn new(calendars: Vec<Calendar>, exceptions: Vec<CalendarDate>) -> Self {
        let mut services: HashMap<String, ServiceDays> = HashMap::new();

        for calendar in calendars {
            let service_id = calendar.service_id.clone();
            services.entry(service_id).or_default().pattern = Some(calendar);
        }

        for exception in exceptions {
            let days = services.entry(exception.service_id).or_default();
            match exception.exception {
                ExceptionType::Added => days.added.insert(exception.date),
                ExceptionType::Removed => days.removed.insert(exception.date),
            };
        }

        Self { services }
    }

    /// Service ids running on `date`, in sorted order.
    pub fn active_services(&self, date: NaiveDate) -> BTreeSet<String> {
        self.services
            .iter()
            .filter(|(_, days)| days.runs_on(date))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of distinct service ids known to the calendar.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True if the calendar defines no services.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
