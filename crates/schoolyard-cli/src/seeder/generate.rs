//! Parallel fake data generation.

use chrono::{Datelike, Duration, NaiveDate};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rayon::prelude::*;
use uuid::Uuid;

use super::models::{
    ClassroomSeed, ParentSeed, SeedBatch, SeedConfig, StudentSeed, TeacherSeed, UserSeed,
    year_bounds,
};

const SPECIALIZATIONS: &[&str] = &[
    "Mathematics",
    "English",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Geography",
    "Computer Science",
];

const SECTIONS: &[&str] = &["A", "B", "C"];

pub fn generate_batch(config: &SeedConfig, password_hash: &str) -> SeedBatch {
    // Unique per run so repeated seeding does not collide on emails or numbers
    let tag = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    let year_start = year_bounds(&config.academic_year)
        .map(|(start, _)| start)
        .unwrap_or_default();

    SeedBatch {
        teachers: generate_teachers(config.teachers, &tag, year_start, password_hash),
        parents: generate_parents(config.parents(), &tag, password_hash),
        classrooms: generate_classrooms(config),
        students: generate_students(config, &tag, year_start, password_hash),
    }
}

fn generate_user(role: &str, idx: usize, tag: &str, password_hash: &str) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    let email = format!(
        "{}.{}+{}{}.{}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        role,
        idx,
        tag.to_lowercase()
    );

    UserSeed {
        first_name,
        last_name,
        email,
        password_hash: password_hash.to_string(),
        phone: Some(PhoneNumber().fake()),
    }
}

fn generate_teachers(
    count: usize,
    tag: &str,
    year_start: NaiveDate,
    password_hash: &str,
) -> Vec<TeacherSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let mut rng = rand::thread_rng();
            TeacherSeed {
                user: generate_user("teacher", idx, tag, password_hash),
                employee_number: format!("EMP-{}-{:04}", tag, idx + 1),
                specialization: SPECIALIZATIONS[idx % SPECIALIZATIONS.len()].to_string(),
                hire_date: year_start - Duration::days(rng.gen_range(30..3650)),
            }
        })
        .collect()
}

fn generate_parents(count: usize, tag: &str, password_hash: &str) -> Vec<ParentSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let building: String = BuildingNumber().fake();
            let street: String = StreetName().fake();
            let city: String = CityName().fake();
            ParentSeed {
                user: generate_user("parent", idx, tag, password_hash),
                occupation: Title().fake(),
                address: format!("{} {}, {}", building, street, city),
            }
        })
        .collect()
}

/// Grades numbered from 1, each split into sections A, B, C.
fn generate_classrooms(config: &SeedConfig) -> Vec<ClassroomSeed> {
    let capacity = config.classroom_capacity();
    (0..config.classrooms)
        .map(|idx| ClassroomSeed {
            grade: format!("Grade {}", idx / SECTIONS.len() + 1),
            section: SECTIONS[idx % SECTIONS.len()].to_string(),
            capacity,
        })
        .collect()
}

fn generate_students(
    config: &SeedConfig,
    tag: &str,
    year_start: NaiveDate,
    password_hash: &str,
) -> Vec<StudentSeed> {
    let classrooms = config.classrooms.max(1);
    (0..config.students)
        .into_par_iter()
        .map(|idx| {
            let mut rng = rand::thread_rng();
            let classroom_idx = idx % classrooms;
            // Older grades get older students
            let age = 6 + (classroom_idx / SECTIONS.len()) as i32;
            let birth_year = year_start.year() - age;
            let date_of_birth = NaiveDate::from_yo_opt(birth_year, rng.gen_range(1..=365))
                .unwrap_or(year_start);

            StudentSeed {
                user: generate_user("student", idx, tag, password_hash),
                admission_number: format!("ADM-{}-{:05}", tag, idx + 1),
                date_of_birth,
                gender: if rng.gen_bool(0.5) { "female" } else { "male" },
                classroom_idx,
                parent_idx: idx / 2,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_batch_shape() {
        let config = SeedConfig::new("2024-2025")
            .with_teachers(3)
            .with_classrooms(4)
            .with_students(9);
        let batch = generate_batch(&config, "hash");

        assert_eq!(batch.teachers.len(), 3);
        assert_eq!(batch.classrooms.len(), 4);
        assert_eq!(batch.students.len(), 9);
        assert_eq!(batch.parents.len(), 5);

        assert_eq!(batch.classrooms[0].grade, "Grade 1");
        assert_eq!(batch.classrooms[3].grade, "Grade 2");
        assert_eq!(batch.classrooms[3].section, "A");

        assert!(batch.students.iter().all(|s| s.classroom_idx < 4));
        assert!(batch.students.iter().all(|s| s.parent_idx < 5));
    }

    #[test]
    fn test_identifiers_are_unique() {
        let config = SeedConfig::new("2024-2025").with_students(200);
        let batch = generate_batch(&config, "hash");

        let emails: HashSet<_> = batch.students.iter().map(|s| &s.user.email).collect();
        let admissions: HashSet<_> = batch
            .students
            .iter()
            .map(|s| &s.admission_number)
            .collect();
        assert_eq!(emails.len(), 200);
        assert_eq!(admissions.len(), 200);
    }
}
