//! Seed records and run configuration.

use chrono::NaiveDate;

/// Account columns shared by teachers, parents and students.
pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
}

pub struct TeacherSeed {
    pub user: UserSeed,
    pub employee_number: String,
    pub specialization: String,
    pub hire_date: NaiveDate,
}

pub struct ParentSeed {
    pub user: UserSeed,
    pub occupation: String,
    pub address: String,
}

pub struct StudentSeed {
    pub user: UserSeed,
    pub admission_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: &'static str,
    /// Index into the seeded classrooms.
    pub classroom_idx: usize,
    /// Index into the seeded parents.
    pub parent_idx: usize,
}

pub struct ClassroomSeed {
    pub grade: String,
    pub section: String,
    pub capacity: i32,
}

/// Everything generated for one run.
pub struct SeedBatch {
    pub teachers: Vec<TeacherSeed>,
    pub parents: Vec<ParentSeed>,
    pub classrooms: Vec<ClassroomSeed>,
    pub students: Vec<StudentSeed>,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub academic_year: String,
    pub teachers: usize,
    pub classrooms: usize,
    pub students: usize,
}

impl SeedConfig {
    pub fn new(academic_year: impl Into<String>) -> Self {
        Self {
            academic_year: academic_year.into(),
            teachers: 10,
            classrooms: 6,
            students: 150,
        }
    }

    pub fn with_teachers(mut self, teachers: usize) -> Self {
        self.teachers = teachers;
        self
    }

    pub fn with_classrooms(mut self, classrooms: usize) -> Self {
        self.classrooms = classrooms;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if year_bounds(&self.academic_year).is_none() {
            return Err(format!(
                "Invalid academic year '{}', expected YYYY-YYYY with consecutive years",
                self.academic_year
            ));
        }
        if self.students > 0 && self.classrooms == 0 {
            return Err("Students need at least one classroom".to_string());
        }
        Ok(())
    }

    /// Seats per classroom, with a little headroom for manual enrolment.
    pub fn classroom_capacity(&self) -> i32 {
        let per_room = self.students.div_ceil(self.classrooms.max(1));
        i32::try_from(per_room + 5).unwrap_or(i32::MAX)
    }

    /// One parent for every two students.
    pub fn parents(&self) -> usize {
        self.students.div_ceil(2)
    }
}

/// First and last day of a `YYYY-YYYY` academic year (September to July).
pub fn year_bounds(academic_year: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = academic_year.split_once('-')?;
    if start.len() != 4 || end.len() != 4 {
        return None;
    }
    let start: i32 = start.parse().ok()?;
    let end: i32 = end.parse().ok()?;
    if end != start + 1 {
        return None;
    }
    Some((
        NaiveDate::from_ymd_opt(start, 9, 1)?,
        NaiveDate::from_ymd_opt(end, 7, 31)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds("2024-2025").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
        assert!(year_bounds("2024-2026").is_none());
        assert!(year_bounds("24-25").is_none());
        assert!(year_bounds("2024").is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(SeedConfig::new("2024-2025").validate().is_ok());
        assert!(SeedConfig::new("2024/2025").validate().is_err());
        assert!(
            SeedConfig::new("2024-2025")
                .with_classrooms(0)
                .validate()
                .is_err()
        );
        assert!(
            SeedConfig::new("2024-2025")
                .with_classrooms(0)
                .with_students(0)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_capacity_and_parents() {
        let config = SeedConfig::new("2024-2025")
            .with_classrooms(4)
            .with_students(101);
        assert_eq!(config.classroom_capacity(), 31);
        assert_eq!(config.parents(), 51);
    }
}
