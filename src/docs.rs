use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use schoolyard_auth::UserRole;
use schoolyard_core::{PaginationMeta, PaginationParams};
use schoolyard_models::academic_years::{AcademicYear, CreateAcademicYearDto};
use schoolyard_models::announcements::{
    Announcement, Audience, CreateAnnouncementDto, PaginatedAnnouncementsResponse,
    UpdateAnnouncementDto,
};
use schoolyard_models::assignments::{
    Assignment, CreateAssignmentDto, PaginatedAssignmentsResponse, UpdateAssignmentDto,
};
use schoolyard_models::attendance::{
    AttendanceEntryDto, AttendanceRecord, AttendanceStatus, AttendanceSummary,
    MarkAttendanceDto, MarkAttendanceResponse, MarkTeacherAttendanceDto,
    PaginatedAttendanceResponse, PaginatedTeacherAttendanceResponse, TeacherAttendanceEntryDto,
    TeacherAttendanceRecord, UpdateAttendanceDto,
};
use schoolyard_models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, UserProfile,
};
use schoolyard_models::classrooms::{
    Classroom, ClassroomWithStats, CreateClassroomDto, PaginatedClassroomsResponse,
    UpdateClassroomDto,
};
use schoolyard_models::common::{AssignStudentsDto, BulkAssignResponse, MessageResponse};
use schoolyard_models::dashboard::DashboardStats;
use schoolyard_models::exams::{CreateExamDto, Exam, PaginatedExamsResponse, UpdateExamDto};
use schoolyard_models::halls::{
    AssignHallDto, CreateHallDto, Hall, HallAssignment, PaginatedHallsResponse, UpdateHallDto,
};
use schoolyard_models::parents::{
    CreateParentDto, PaginatedParentsResponse, Parent, UpdateParentDto,
};
use schoolyard_models::payments::{
    CreatePaymentDto, PaginatedPaymentsResponse, Payment, PaymentStatus, PaymentSummary,
    RecordPaymentDto, UpdatePaymentDto,
};
use schoolyard_models::results::{
    CreateResultDto, Grade, PaginatedResultsResponse, ResultSummary, Scores, StudentResult,
    SubjectScore, UpdateResultDto,
};
use schoolyard_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, UpdateStudentDto,
};
use schoolyard_models::subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, UpdateSubjectDto,
};
use schoolyard_models::teachers::{
    CreateTeacherDto, PaginatedTeachersResponse, Teacher, UpdateTeacherDto,
};
use schoolyard_models::timetables::{
    CreateTimetableEntryDto, DayOfWeek, TimetableEntry, UpdateTimetableEntryDto,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::change_password,
        crate::modules::academic_years::controller::create_academic_year,
        crate::modules::academic_years::controller::get_academic_years,
        crate::modules::academic_years::controller::get_current_academic_year,
        crate::modules::academic_years::controller::set_current_academic_year,
        crate::modules::academic_years::controller::delete_academic_year,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::export_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::students::controller::get_student_attendance,
        crate::modules::students::controller::get_student_attendance_summary,
        crate::modules::students::controller::get_student_results,
        crate::modules::students::controller::get_student_result_summary,
        crate::modules::students::controller::get_student_payments,
        crate::modules::students::controller::get_student_hall_assignments,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::get_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::teachers::controller::get_teacher_timetable,
        crate::modules::teachers::controller::get_teacher_classrooms,
        crate::modules::parents::controller::create_parent,
        crate::modules::parents::controller::get_parents,
        crate::modules::parents::controller::get_parent,
        crate::modules::parents::controller::update_parent,
        crate::modules::parents::controller::delete_parent,
        crate::modules::parents::controller::assign_children,
        crate::modules::parents::controller::get_children,
        crate::modules::classrooms::controller::create_classroom,
        crate::modules::classrooms::controller::get_classrooms,
        crate::modules::classrooms::controller::get_classroom,
        crate::modules::classrooms::controller::update_classroom,
        crate::modules::classrooms::controller::delete_classroom,
        crate::modules::classrooms::controller::assign_students,
        crate::modules::classrooms::controller::get_classroom_students,
        crate::modules::classrooms::controller::get_classroom_timetable,
        crate::modules::classrooms::controller::get_classroom_exams,
        crate::modules::classrooms::controller::get_classroom_assignments,
        crate::modules::halls::controller::create_hall,
        crate::modules::halls::controller::get_halls,
        crate::modules::halls::controller::get_hall,
        crate::modules::halls::controller::update_hall,
        crate::modules::halls::controller::delete_hall,
        crate::modules::halls::controller::assign_students,
        crate::modules::halls::controller::get_assignments,
        crate::modules::halls::controller::delete_assignment,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::exams::controller::create_exam,
        crate::modules::exams::controller::get_exams,
        crate::modules::exams::controller::get_exam,
        crate::modules::exams::controller::update_exam,
        crate::modules::exams::controller::delete_exam,
        crate::modules::attendance::controller::mark_attendance,
        crate::modules::attendance::controller::get_attendance,
        crate::modules::attendance::controller::get_attendance_summary,
        crate::modules::attendance::controller::export_attendance,
        crate::modules::attendance::controller::update_attendance,
        crate::modules::attendance::controller::delete_attendance,
        crate::modules::attendance::controller::mark_teacher_attendance,
        crate::modules::attendance::controller::get_teacher_attendance,
        crate::modules::attendance::controller::get_teacher_attendance_summary,
        crate::modules::results::controller::create_result,
        crate::modules::results::controller::get_results,
        crate::modules::results::controller::export_results,
        crate::modules::results::controller::get_result,
        crate::modules::results::controller::update_result,
        crate::modules::results::controller::delete_result,
        crate::modules::payments::controller::create_payment,
        crate::modules::payments::controller::get_payments,
        crate::modules::payments::controller::get_payment_summary,
        crate::modules::payments::controller::export_payments,
        crate::modules::payments::controller::get_payment,
        crate::modules::payments::controller::update_payment,
        crate::modules::payments::controller::record_payment,
        crate::modules::payments::controller::delete_payment,
        crate::modules::timetables::controller::create_entry,
        crate::modules::timetables::controller::get_entries,
        crate::modules::timetables::controller::get_entry,
        crate::modules::timetables::controller::update_entry,
        crate::modules::timetables::controller::delete_entry,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::get_assignments,
        crate::modules::assignments::controller::get_assignment,
        crate::modules::assignments::controller::update_assignment,
        crate::modules::assignments::controller::delete_assignment,
        crate::modules::announcements::controller::create_announcement,
        crate::modules::announcements::controller::get_announcements,
        crate::modules::announcements::controller::get_announcement,
        crate::modules::announcements::controller::update_announcement,
        crate::modules::announcements::controller::delete_announcement,
        crate::modules::dashboard::controller::get_dashboard,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            UserRole,
            PaginationMeta,
            PaginationParams,
            BulkAssignResponse,
            AssignStudentsDto,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            ChangePasswordRequest,
            UserProfile,
            AcademicYear,
            CreateAcademicYearDto,
            Student,
            CreateStudentDto,
            UpdateStudentDto,
            PaginatedStudentsResponse,
            Teacher,
            CreateTeacherDto,
            UpdateTeacherDto,
            PaginatedTeachersResponse,
            Parent,
            CreateParentDto,
            UpdateParentDto,
            PaginatedParentsResponse,
            Classroom,
            ClassroomWithStats,
            CreateClassroomDto,
            UpdateClassroomDto,
            PaginatedClassroomsResponse,
            Hall,
            CreateHallDto,
            UpdateHallDto,
            PaginatedHallsResponse,
            HallAssignment,
            AssignHallDto,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            PaginatedSubjectsResponse,
            Exam,
            CreateExamDto,
            UpdateExamDto,
            PaginatedExamsResponse,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceEntryDto,
            MarkAttendanceDto,
            MarkAttendanceResponse,
            UpdateAttendanceDto,
            PaginatedAttendanceResponse,
            AttendanceSummary,
            TeacherAttendanceRecord,
            TeacherAttendanceEntryDto,
            MarkTeacherAttendanceDto,
            PaginatedTeacherAttendanceResponse,
            Grade,
            Scores,
            StudentResult,
            CreateResultDto,
            UpdateResultDto,
            PaginatedResultsResponse,
            SubjectScore,
            ResultSummary,
            PaymentStatus,
            Payment,
            CreatePaymentDto,
            RecordPaymentDto,
            UpdatePaymentDto,
            PaginatedPaymentsResponse,
            PaymentSummary,
            DayOfWeek,
            TimetableEntry,
            CreateTimetableEntryDto,
            UpdateTimetableEntryDto,
            Assignment,
            CreateAssignmentDto,
            UpdateAssignmentDto,
            PaginatedAssignmentsResponse,
            Audience,
            Announcement,
            CreateAnnouncementDto,
            UpdateAnnouncementDto,
            PaginatedAnnouncementsResponse,
            DashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and password change"),
        (name = "Academic Years", description = "Academic year management"),
        (name = "Students", description = "Student records and per-student views"),
        (name = "Teachers", description = "Teacher records"),
        (name = "Parents", description = "Parent records and their children"),
        (name = "Classrooms", description = "Classrooms, enrolment and classroom views"),
        (name = "Halls", description = "Exam halls and seating"),
        (name = "Subjects", description = "Subject catalogue"),
        (name = "Exams", description = "Exam scheduling"),
        (name = "Attendance", description = "Student and teacher attendance"),
        (name = "Results", description = "Scores and grades"),
        (name = "Payments", description = "School fees and installments"),
        (name = "Timetables", description = "Weekly timetable"),
        (name = "Assignments", description = "Homework assignments"),
        (name = "Announcements", description = "Announcements and events"),
        (name = "Dashboard", description = "Administrative overview")
    ),
    info(
        title = "Schoolyard API",
        version = "0.1.0",
        description = "School administration REST API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
