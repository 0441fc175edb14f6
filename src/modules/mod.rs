pub mod academic_years;
pub mod announcements;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classrooms;
pub mod dashboard;
pub mod exams;
pub mod halls;
pub mod parents;
pub mod payments;
pub mod results;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod timetables;
