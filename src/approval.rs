//! Course approval lifecycle: draft → pending → published/rejected →
//! archived, plus the update-draft clone/merge path. Every transition runs
//! in its own transaction; notifications go out after commit and never
//! fail the operation.

use thiserror::Error;
use uuid::Uuid;

use crate::curriculum::{CurriculumError, CurriculumTree};
use crate::model::entity::{
    Account, ApprovalRequestType, ApprovalStatus, Course, CourseApprovalRequest, CourseStatus,
    Lesson, ReviewDecision, Section,
};
use crate::model::{DatabaseError, ModelManager};
use crate::notify::notify_best_effort;
use crate::web::AuthenticatedUser;

pub type ApprovalResult<T> = std::result::Result<T, ApprovalError>;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("curriculum error: {0}")]
    Curriculum(#[from] CurriculumError),

    #[error("course not found")]
    CourseNotFound,

    #[error("approval request not found")]
    RequestNotFound,

    #[error("caller does not own this course")]
    NotOwner,

    #[error("only admins may review or feature courses")]
    AdminOnly,

    #[error("course cannot be submitted in its current status")]
    NotSubmittable,

    #[error("course already has a pending approval request")]
    AlreadyPending,

    #[error("course needs at least one section and one complete lesson")]
    EmptyCurriculum,

    #[error("approval request was already decided")]
    AlreadyDecided,

    #[error("course is not published")]
    NotPublished,

    #[error("course already has a live update draft")]
    DraftExists,
}

/// Instructor submits a draft or rejected course for review.
pub async fn submit_course(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
    notes: Option<&str>,
) -> ApprovalResult<CourseApprovalRequest> {
    let mut tx = mm.begin().await?;

    let course = Course::find_by_id_conn(&mut tx, course_id)
        .await?
        .ok_or(ApprovalError::CourseNotFound)?;

    if course.instructor_id() != actor.user_id() {
        return Err(ApprovalError::NotOwner);
    }

    let previous_status = course.status();
    if !previous_status.is_editable() {
        return Err(ApprovalError::NotSubmittable);
    }

    if CourseApprovalRequest::find_pending_by_course(&mut tx, course_id)
        .await?
        .is_some()
    {
        return Err(ApprovalError::AlreadyPending);
    }

    let sections = Section::count_by_course(&mut tx, course_id).await?;
    let lessons = Lesson::count_active_by_course(&mut tx, course_id).await?;
    let presentable = Lesson::count_presentable_by_course(&mut tx, course_id).await?;
    if sections < 1 || lessons < 1 || presentable < 1 {
        return Err(ApprovalError::EmptyCurriculum);
    }

    let request_type = if previous_status == CourseStatus::Rejected {
        ApprovalRequestType::ReSubmission
    } else {
        ApprovalRequestType::InitialSubmission
    };

    let request = CourseApprovalRequest::insert(
        &mut tx,
        course_id,
        actor.user_id(),
        request_type,
        notes,
    )
    .await?;
    Course::set_status(&mut tx, course_id, CourseStatus::Pending).await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    let admins = Account::all_admin_ids(mm).await.unwrap_or_default();
    for admin_id in admins {
        notify_best_effort(
            mm,
            admin_id,
            "course_submitted",
            &format!("Course '{}' is awaiting review.", course.name()),
            Some("course"),
            Some(course_id),
        )
        .await;
    }

    Ok(request)
}

/// Admin decides a pending request. Approving publishes the course (or
/// merges an update draft back into its live course); both rejection
/// flavors send the course back to rejected while the request keeps the
/// distinct decision.
pub async fn review_request(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    request_id: Uuid,
    decision: ReviewDecision,
    admin_notes: Option<&str>,
) -> ApprovalResult<CourseApprovalRequest> {
    if !actor.is_admin() {
        return Err(ApprovalError::AdminOnly);
    }

    let mut tx = mm.begin().await?;

    let request = CourseApprovalRequest::find_by_id_conn(&mut tx, request_id)
        .await?
        .ok_or(ApprovalError::RequestNotFound)?;

    if request.status() != ApprovalStatus::Pending {
        return Err(ApprovalError::AlreadyDecided);
    }

    let course = Course::find_by_id_conn(&mut tx, request.course_id())
        .await?
        .ok_or(ApprovalError::CourseNotFound)?;

    match decision {
        ReviewDecision::Approved => match course.live_course_id() {
            Some(live_id) => {
                // Update-draft path: the live course swallows the draft's
                // curriculum and fields, the draft itself is retired.
                CurriculumTree::delete_all(&mut tx, live_id).await?;
                CurriculumTree::clone_into(&mut tx, course.id(), live_id).await?;
                Course::merge_fields_from(&mut tx, live_id, course.id()).await?;
                Course::retire_draft(&mut tx, course.id()).await?;
            }
            None => {
                Course::mark_published(&mut tx, course.id()).await?;
            }
        },
        ReviewDecision::Rejected | ReviewDecision::NeedsRevision => {
            Course::set_status(&mut tx, course.id(), CourseStatus::Rejected).await?;
        }
    }

    let updated = CourseApprovalRequest::mark_reviewed(
        &mut tx,
        request_id,
        decision,
        actor.user_id(),
        admin_notes,
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    let message = match (decision, admin_notes) {
        (ReviewDecision::Approved, _) => {
            format!("Course '{}' was approved and published.", course.name())
        }
        (_, Some(notes)) => format!("Course '{}' needs changes: {notes}", course.name()),
        (_, None) => format!("Course '{}' was not approved.", course.name()),
    };
    notify_best_effort(
        mm,
        request.instructor_id(),
        "course_reviewed",
        &message,
        Some("course"),
        Some(course.id()),
    )
    .await;

    Ok(updated)
}

/// Admin toggles the featured flag of a published course.
pub async fn toggle_featured(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> ApprovalResult<bool> {
    if !actor.is_admin() {
        return Err(ApprovalError::AdminOnly);
    }

    let mut tx = mm.begin().await?;

    let course = Course::find_by_id_conn(&mut tx, course_id)
        .await?
        .ok_or(ApprovalError::CourseNotFound)?;

    if course.status() != CourseStatus::Published {
        return Err(ApprovalError::NotPublished);
    }

    let featured = !course.is_featured();
    Course::set_featured(&mut tx, course_id, featured).await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(featured)
}

/// Owner (or admin) takes a published course off the marketplace.
pub async fn archive_course(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> ApprovalResult<()> {
    let mut tx = mm.begin().await?;

    let course = Course::find_by_id_conn(&mut tx, course_id)
        .await?
        .ok_or(ApprovalError::CourseNotFound)?;

    if !actor.is_admin() && course.instructor_id() != actor.user_id() {
        return Err(ApprovalError::NotOwner);
    }

    if course.status() != CourseStatus::Published {
        return Err(ApprovalError::NotPublished);
    }

    Course::set_status(&mut tx, course_id, CourseStatus::Archived).await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(())
}

/// Spawns the single live update draft of a published course: a cloned
/// course row plus a deep-cloned curriculum.
pub async fn spawn_update_draft(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> ApprovalResult<Course> {
    let mut tx = mm.begin().await?;

    let course = Course::find_by_id_conn(&mut tx, course_id)
        .await?
        .ok_or(ApprovalError::CourseNotFound)?;

    if !actor.is_admin() && course.instructor_id() != actor.user_id() {
        return Err(ApprovalError::NotOwner);
    }

    if course.status() != CourseStatus::Published {
        return Err(ApprovalError::NotPublished);
    }

    if Course::find_update_draft_conn(&mut tx, course_id)
        .await?
        .is_some()
    {
        return Err(ApprovalError::DraftExists);
    }

    let draft = Course::clone_as_draft(&mut tx, &course).await?;
    CurriculumTree::clone_into(&mut tx, course_id, draft.id()).await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(draft)
}
