//! Static weekly class schedule.

use chrono::{NaiveTime, Weekday};

/// One recurring class meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSlot {
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub course_code: &'static str,
    pub title: &'static str,
    pub room: &'static str,
    pub instructor: &'static str,
}

type RawSlot = (
    Weekday,
    (u32, u32),
    (u32, u32),
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

const WEEK: &[RawSlot] = &[
    (Weekday::Mon, (8, 0), (9, 30), "NCM 101", "Fundamentals of Nursing", "NB-201", "Prof. Reyes"),
    (Weekday::Mon, (10, 0), (11, 30), "CS 102", "Data Structures", "CL-3", "Dr. Santos"),
    (Weekday::Mon, (13, 0), (14, 30), "ENG 201", "Engineering Mechanics", "EB-105", "Engr. Villanueva"),
    (Weekday::Tue, (7, 30), (9, 0), "MATH 121", "Calculus I", "AS-110", "Prof. Garcia"),
    (Weekday::Tue, (9, 30), (11, 0), "BA 110", "Principles of Management", "BB-204", "Dr. Mendoza"),
    (Weekday::Tue, (14, 0), (17, 0), "NCM 101L", "Fundamentals of Nursing Lab", "NB-Skills", "Prof. Reyes"),
    (Weekday::Wed, (8, 0), (9, 30), "NCM 101", "Fundamentals of Nursing", "NB-201", "Prof. Reyes"),
    (Weekday::Wed, (10, 0), (11, 30), "CS 102", "Data Structures", "CL-3", "Dr. Santos"),
    (Weekday::Wed, (13, 0), (14, 30), "ENG 201", "Engineering Mechanics", "EB-105", "Engr. Villanueva"),
    (Weekday::Thu, (7, 30), (9, 0), "MATH 121", "Calculus I", "AS-110", "Prof. Garcia"),
    (Weekday::Thu, (9, 30), (11, 0), "BA 110", "Principles of Management", "BB-204", "Dr. Mendoza"),
    (Weekday::Thu, (13, 0), (16, 0), "CS 102L", "Data Structures Lab", "CL-1", "Dr. Santos"),
    (Weekday::Fri, (8, 0), (10, 0), "EDUC 105", "Facilitating Learning", "ED-302", "Prof. Aquino"),
    (Weekday::Fri, (10, 30), (12, 0), "PE 2", "Rhythmic Activities", "Gym", "Coach Ramos"),
    (Weekday::Sat, (8, 0), (11, 0), "NSTP 1", "National Service Training", "AS-Hall", "Mr. Dela Cruz"),
];

/// The whole week, ordered by day then start time.
pub fn week() -> Vec<ClassSlot> {
    let mut slots: Vec<ClassSlot> = WEEK.iter().filter_map(slot_from_raw).collect();
    slots.sort_by_key(|s| (s.day.num_days_from_monday(), s.start));
    slots
}

/// Classes meeting on one day, ordered by start time.
pub fn for_day(day: Weekday) -> Vec<ClassSlot> {
    week().into_iter().filter(|s| s.day == day).collect()
}

fn slot_from_raw(raw: &RawSlot) -> Option<ClassSlot> {
    let (day, (sh, sm), (eh, em), course_code, title, room, instructor) = *raw;
    Some(ClassSlot {
        day,
        start: NaiveTime::from_hms_opt(sh, sm, 0)?,
        end: NaiveTime::from_hms_opt(eh, em, 0)?,
        course_code,
        title,
        room,
        instructor,
    })
}
