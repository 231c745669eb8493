use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, Duration, Utc};
use tracing::error;

use crate::api::types::*;
use crate::api::{AppState, AuthBearer};
use crate::errors::AppError;
use crate::models::announcement::TargetAudience;
use crate::models::user::{User, UserResponse, UserRole};

fn auth_failure(err: &AppError) -> Response {
    let status = match err {
        AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

fn internal(which: &str, e: &AppError) -> Response {
    error!(action = "dashboard_failed", dashboard = which, error = %e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!(
            "Error fetching {which} dashboard data"
        ))),
    )
        .into_response()
}

async fn load_user(state: &AppState, token: &str, role: UserRole) -> Result<User, Response> {
    let identity = state
        .auth
        .authorize(token, &[role])
        .await
        .map_err(|e| auth_failure(&e))?;
    match state.db.get_user_by_id(&identity.user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("User not found")),
        )
            .into_response()),
        Err(e) => Err(internal(role.as_str(), &e)),
    }
}

/// Student dashboard: announcements, schedule, fees, pending work and
/// attendance for the authenticated student.
#[utoipa::path(get, path = "/api/dashboard/student",
    responses(
        (status = 200, body = StudentDashboardResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse)
    ))]
pub async fn student(State(state): State<AppState>, AuthBearer(token): AuthBearer) -> Response {
    let user = match load_user(&state, &token, UserRole::Student).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let details = match user.student_details.as_ref() {
        Some(d) => d,
        None => {
            return internal(
                "student",
                &AppError::InternalError("student record missing details".to_string()),
            );
        }
    };

    let result: crate::errors::Result<StudentDashboard> = async {
        let announcements = state
            .db
            .announcements_for_audience(TargetAudience::Student, 10)
            .await?;
        let upcoming_events = state.db.upcoming_events(5).await?;

        let now = Utc::now();
        let week_start = now - Duration::days(now.weekday().num_days_from_sunday() as i64);
        let week_end = week_start + Duration::days(6);
        let weekly_schedule = state
            .db
            .schedules_for_course(&details.course, details.semester, week_start, week_end)
            .await?;

        let structure = state
            .db
            .fee_structure_for(&details.course, details.semester)
            .await?;
        let payments = state.db.payments_for_student(&user.id, 5).await?;

        let pending_assignments = state
            .db
            .pending_assignments_for_student(&user.id, &details.course, details.semester, 10)
            .await?;
        let recent_attendance = state.db.recent_attendance(&user.id, 10).await?;
        let attendance_percentage = state.db.attendance_percentage(&user.id).await?;

        Ok(StudentDashboard {
            student: StudentSummary {
                id: user.id,
                name: format!("{} {}", user.profile.first_name, user.profile.last_name),
                email: user.email.clone(),
                roll_number: details.roll_number.clone(),
                course: details.course.clone(),
                semester: details.semester,
                batch: details.batch.clone(),
            },
            stats: StudentStats {
                attendance_percentage,
                pending_assignments: pending_assignments.len() as i64,
                upcoming_events: upcoming_events.len() as i64,
                fee_status: details.fee_status.as_str().to_string(),
                total_fees: details.total_fees,
                paid_fees: details.paid_fees,
            },
            announcements,
            upcoming_events,
            weekly_schedule,
            pending_assignments,
            recent_attendance,
            fee_info: FeeInfo {
                structure,
                payments,
                pending_amount: details.total_fees - details.paid_fees,
            },
        })
    }
    .await;

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(StudentDashboardResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(e) => internal("student", &e),
    }
}

/// Teacher dashboard: today's classes, assignment load and grading queue.
#[utoipa::path(get, path = "/api/dashboard/teacher",
    responses(
        (status = 200, body = TeacherDashboardResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse)
    ))]
pub async fn teacher(State(state): State<AppState>, AuthBearer(token): AuthBearer) -> Response {
    let user = match load_user(&state, &token, UserRole::Teacher).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let details = match user.teacher_details.as_ref() {
        Some(d) => d,
        None => {
            return internal(
                "teacher",
                &AppError::InternalError("teacher record missing details".to_string()),
            );
        }
    };

    let result: crate::errors::Result<TeacherDashboard> = async {
        let now = Utc::now();
        let day_start = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = day_start + Duration::days(1) - Duration::seconds(1);

        let today_classes = state
            .db
            .schedules_for_teacher(&user.id, day_start, day_end)
            .await?;
        let assignments = state.db.active_assignments_for_teacher(&user.id).await?;
        let pending_grading = state.db.pending_grading_count(&user.id).await?;
        let announcements = state
            .db
            .announcements_for_audience(TargetAudience::Teacher, 10)
            .await?;

        Ok(TeacherDashboard {
            teacher: TeacherSummary {
                id: user.id,
                name: format!("{} {}", user.profile.first_name, user.profile.last_name),
                email: user.email.clone(),
                employee_id: details.employee_id.clone(),
                department: details.department.clone(),
                subjects: details.subjects.clone(),
            },
            stats: TeacherStats {
                today_classes: today_classes.len() as i64,
                active_assignments: assignments.len() as i64,
                pending_grading,
            },
            today_classes,
            recent_assignments: assignments.into_iter().take(5).collect(),
            announcements,
        })
    }
    .await;

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(TeacherDashboardResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(e) => internal("teacher", &e),
    }
}

/// Principal dashboard: campus-wide totals and distributions.
#[utoipa::path(get, path = "/api/dashboard/principal",
    responses(
        (status = 200, body = PrincipalDashboardResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse)
    ))]
pub async fn principal(State(state): State<AppState>, AuthBearer(token): AuthBearer) -> Response {
    if let Err(resp) = load_user(&state, &token, UserRole::Principal).await {
        return resp;
    }

    let result: crate::errors::Result<PrincipalDashboard> = async {
        let total_students = state.db.count_users_by_role(UserRole::Student).await?;
        let total_teachers = state.db.count_users_by_role(UserRole::Teacher).await?;
        let total_announcements = state.db.count_active_announcements().await?;
        let total_events = state.db.count_upcoming_events().await?;
        let (total_fee_collected, total_transactions) = state.db.fee_collection_stats().await?;

        let recent_users = state
            .db
            .recent_users(10)
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect();
        let recent_announcements = state.db.recent_announcements(10).await?;
        let course_distribution = state
            .db
            .course_distribution()
            .await?
            .into_iter()
            .map(|(course, count)| CourseCount { course, count })
            .collect();
        let monthly_registrations = state
            .db
            .monthly_registrations(Utc::now().year())
            .await?
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect();

        Ok(PrincipalDashboard {
            stats: PrincipalStats {
                total_students,
                total_teachers,
                total_announcements,
                total_events,
                total_fee_collected,
                total_transactions,
            },
            recent_users,
            recent_announcements,
            course_distribution,
            monthly_registrations,
        })
    }
    .await;

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(PrincipalDashboardResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(e) => internal("principal", &e),
    }
}
