//! CSV export.
//!
//! The writers take any [`Write`] so they can be tested against a `Vec<u8>`;
//! [`csv_response`] wraps the bytes for download.

use std::io::Write;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use schoolyard_core::AppError;
use schoolyard_models::{
    attendance::AttendanceRecord, payments::Payment, results::StudentResult, students::Student,
};

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Formats minor units as a decimal amount, e.g. `150050` as `1500.50`.
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Export students to CSV
pub fn write_students_csv<W: Write>(writer: W, students: &[Student]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Admission Number",
        "First Name",
        "Last Name",
        "Email",
        "Phone",
        "Gender",
        "Date of Birth",
        "Classroom ID",
        "Parent ID",
        "Enrolled On",
    ])?;

    for student in students {
        wtr.write_record([
            student.admission_number.clone(),
            student.first_name.clone(),
            student.last_name.clone(),
            student.email.clone(),
            opt(&student.phone),
            opt(&student.gender),
            opt(&student.date_of_birth),
            opt(&student.classroom_id),
            opt(&student.parent_id),
            student.enrolled_on.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export attendance records to CSV
pub fn write_attendance_csv<W: Write>(
    writer: W,
    records: &[AttendanceRecord],
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Date",
        "Admission Number",
        "Student",
        "Status",
        "Remarks",
        "Academic Year",
    ])?;

    for record in records {
        wtr.write_record([
            record.date.to_string(),
            record.admission_number.clone(),
            record.student_name.clone(),
            record.status.to_string(),
            opt(&record.remarks),
            record.academic_year.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export results to CSV
pub fn write_results_csv<W: Write>(writer: W, results: &[StudentResult]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Admission Number",
        "Student",
        "Subject Code",
        "Subject",
        "Academic Year",
        "First Test",
        "Second Test",
        "Assignment",
        "Midterm",
        "Final Exam",
        "Total",
        "Grade",
        "Remarks",
    ])?;

    for result in results {
        wtr.write_record([
            result.admission_number.clone(),
            result.student_name.clone(),
            result.subject_code.clone(),
            result.subject_name.clone(),
            result.academic_year.clone(),
            result.first_test.to_string(),
            result.second_test.to_string(),
            result.assignment.to_string(),
            result.midterm.to_string(),
            result.final_exam.to_string(),
            format!("{:.2}", result.total),
            result.grade.clone(),
            opt(&result.remarks),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export payments to CSV
pub fn write_payments_csv<W: Write>(writer: W, payments: &[Payment]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Admission Number",
        "Student",
        "Academic Year",
        "Description",
        "Amount Due",
        "Amount Paid",
        "Outstanding",
        "Status",
        "Due Date",
        "Last Paid On",
        "Method",
        "Reference",
    ])?;

    for payment in payments {
        wtr.write_record([
            payment.admission_number.clone(),
            payment.student_name.clone(),
            payment.academic_year.clone(),
            payment.description.clone(),
            format_minor_units(payment.amount_due),
            format_minor_units(payment.amount_paid),
            format_minor_units(payment.outstanding()),
            payment.status.to_string(),
            opt(&payment.due_date),
            opt(&payment.last_paid_on),
            opt(&payment.method),
            opt(&payment.reference),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Runs a CSV writer against an in-memory buffer.
pub fn to_csv_bytes<F>(write: F) -> Result<Vec<u8>, AppError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), csv::Error>,
{
    let mut buffer = Vec::new();
    write(&mut buffer).map_err(AppError::internal)?;
    Ok(buffer)
}

/// A `text/csv` attachment named `<name>.csv`.
pub fn csv_response(name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", name),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use schoolyard_models::attendance::AttendanceStatus;
    use schoolyard_models::payments::PaymentStatus;
    use uuid::Uuid;

    fn student(first: &str, last: &str, admission: &str) -> Student {
        Student {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@school.test", first.to_lowercase()),
            phone: None,
            admission_number: admission.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 3, 4),
            gender: Some("female".to_string()),
            address: None,
            classroom_id: None,
            parent_id: None,
            enrolled_on: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn as_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_format_minor_units() {
        assert_eq!(format_minor_units(150050), "1500.50");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(0), "0.00");
        assert_eq!(format_minor_units(-250), "-2.50");
    }

    #[test]
    fn test_students_csv_header_and_rows() {
        let students = vec![
            student("Ada", "Obi", "ADM-001"),
            student("Tunde", "Bello, Jr", "ADM-002"),
        ];
        let csv = as_string(to_csv_bytes(|buf| write_students_csv(buf, &students)).unwrap());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Admission Number,First Name,Last Name"));
        assert_eq!(
            lines[1],
            "ADM-001,Ada,Obi,ada@school.test,,female,2012-03-04,,,2024-09-01"
        );
        // Commas are quoted by the writer
        assert!(lines[2].contains("\"Bello, Jr\""));
    }

    #[test]
    fn test_empty_export_has_only_header() {
        let csv = as_string(to_csv_bytes(|buf| write_payments_csv(buf, &[])).unwrap());
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_attendance_csv_uses_status_names() {
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: "Ada Obi".to_string(),
            admission_number: "ADM-001".to_string(),
            classroom_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 10, 7).unwrap(),
            status: AttendanceStatus::DayOff,
            remarks: Some("Public holiday".to_string()),
            academic_year: "2024-2025".to_string(),
            recorded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let csv = as_string(to_csv_bytes(|buf| write_attendance_csv(buf, &[record])).unwrap());
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            format!(
                "2024-10-07,ADM-001,Ada Obi,{},Public holiday,2024-2025",
                AttendanceStatus::DayOff
            )
        );
    }

    #[test]
    fn test_payments_csv_formats_amounts() {
        let payment = Payment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: "Ada Obi".to_string(),
            admission_number: "ADM-001".to_string(),
            academic_year: "2024-2025".to_string(),
            description: "Tuition".to_string(),
            amount_due: 50000,
            amount_paid: 12550,
            status: PaymentStatus::Partial,
            due_date: None,
            last_paid_on: None,
            method: Some("cash".to_string()),
            reference: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let csv = as_string(to_csv_bytes(|buf| write_payments_csv(buf, &[payment])).unwrap());
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",500.00,125.50,374.50,partial,"));
        assert!(row.ends_with(",,,cash,"));
    }

    #[test]
    fn test_csv_response_headers() {
        let response = csv_response("students", b"a,b\n".to_vec());
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"students.csv\""
        );
    }
}
