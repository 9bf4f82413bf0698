//! The curriculum sync engine. Reconciles a client-submitted desired tree
//! against persisted state inside a single transaction: nodes with ids are
//! updated in place, nodes without ids are created, persisted nodes missing
//! from the payload are archived (lessons, questions, options) or deleted
//! (sections, attachments, subtitles).

use std::collections::HashSet;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::assets::AssetStore;
use crate::curriculum::{
    CurriculumError, CurriculumPayload, CurriculumResult, LessonPayload, OrderLevel,
    QuestionPayload, SectionPayload, validate_sequential_order,
};
use crate::model::ModelManager;
use crate::model::entity::{
    Course, Lesson, LessonAttachment, LessonContent, LessonSubtitle, LessonType, QuizOption,
    QuizQuestion, Section, VideoSource,
};
use crate::web::AuthenticatedUser;

/// Applies the desired tree to the course curriculum. All-or-nothing: any
/// failure rolls the whole sync back. Returns nothing, the caller re-reads
/// the tree if it needs the assigned ids.
pub async fn sync_curriculum(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
    mut payload: CurriculumPayload,
    assets: &dyn AssetStore,
) -> CurriculumResult<()> {
    validate_payload(&payload)?;
    fill_missing_durations(&mut payload, assets).await;

    let mut tx = mm.begin().await?;

    let course = Course::find_by_id_conn(&mut tx, course_id)
        .await?
        .ok_or(CurriculumError::CourseNotFound)?;

    if !actor.is_admin() {
        if course.instructor_id() != actor.user_id() {
            return Err(CurriculumError::NotOwner);
        }
        if !course.status().is_editable() {
            return Err(CurriculumError::NotEditable);
        }
    }

    let orphaned_assets = sync_sections(&mut tx, course_id, &payload.sections).await?;

    revalidate_tree(&mut tx, course_id).await?;

    tx.commit().await.map_err(crate::model::DatabaseError::from)?;

    // Best-effort cleanup of uploads left behind by re-typed lessons. The
    // sync already committed, a failed delete is logged cleanup debt.
    for public_id in orphaned_assets {
        if let Err(e) = assets.delete(&public_id).await {
            tracing::warn!("failed to delete orphaned asset {public_id}: {e}");
        }
    }

    Ok(())
}

/// Pure payload validation: ordering at every level, content/type
/// coherence per lesson and option shape per question.
fn validate_payload(payload: &CurriculumPayload) -> CurriculumResult<()> {
    let section_orders: Vec<i32> = payload.sections.iter().map(|s| s.section_order).collect();
    if !validate_sequential_order(&section_orders) {
        return Err(CurriculumError::InvalidOrder(OrderLevel::Section));
    }

    for section in &payload.sections {
        let lesson_orders: Vec<i32> = section.lessons.iter().map(|l| l.lesson_order).collect();
        if !validate_sequential_order(&lesson_orders) {
            return Err(CurriculumError::InvalidOrder(OrderLevel::Lesson));
        }

        for lesson in &section.lessons {
            lesson.content()?;

            if lesson.lesson_type == LessonType::Quiz {
                let question_orders: Vec<i32> =
                    lesson.questions.iter().map(|q| q.question_order).collect();
                if !validate_sequential_order(&question_orders) {
                    return Err(CurriculumError::InvalidOrder(OrderLevel::Question));
                }

                for question in &lesson.questions {
                    validate_question_shape(question)?;
                }
            }
        }
    }

    Ok(())
}

fn validate_question_shape(question: &QuestionPayload) -> CurriculumResult<()> {
    if question.options.len() < 2 {
        return Err(CurriculumError::BadQuizShape {
            question: question.question_text.clone(),
            reason: "a question needs at least two options",
        });
    }
    let correct = question
        .options
        .iter()
        .filter(|o| o.is_correct_answer)
        .count();
    if correct != 1 {
        return Err(CurriculumError::BadQuizShape {
            question: question.question_text.clone(),
            reason: "exactly one option must be marked correct",
        });
    }
    Ok(())
}

/// Platform-hosted durations the client didn't provide are probed before
/// the transaction opens. Lookup failures leave the field empty.
async fn fill_missing_durations(payload: &mut CurriculumPayload, assets: &dyn AssetStore) {
    for section in &mut payload.sections {
        for lesson in &mut section.lessons {
            let (Some(source), Some(video_id)) = (lesson.video_source, lesson.video_id.as_deref())
            else {
                continue;
            };
            if lesson.duration_seconds.is_some() || source == VideoSource::Cloudinary {
                continue;
            }
            match assets.lookup_duration(source, video_id).await {
                Ok(duration) => lesson.duration_seconds = duration,
                Err(e) => {
                    tracing::warn!("duration lookup failed for {video_id}: {e}");
                }
            }
        }
    }
}

async fn sync_sections(
    conn: &mut PgConnection,
    course_id: Uuid,
    sections: &[SectionPayload],
) -> CurriculumResult<Vec<String>> {
    let current = Section::all_by_course(conn, course_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|s| s.id()).collect();
    let incoming_ids: HashSet<Uuid> = sections.iter().filter_map(|s| s.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "section" });
        }
    }

    // Sections carry no attempt history: omitted ones are hard-deleted and
    // the cascade takes their lessons with them.
    for section in &current {
        if !incoming_ids.contains(&section.id()) {
            Section::delete(conn, section.id()).await?;
        }
    }

    let mut orphaned_assets = Vec::new();

    for section in sections {
        let section_id = match section.id {
            Some(id) => {
                Section::update_fields(
                    conn,
                    id,
                    &section.section_name,
                    section.description.as_deref(),
                    section.section_order,
                )
                .await?;
                id
            }
            None => {
                Section::insert(
                    conn,
                    course_id,
                    &section.section_name,
                    section.description.as_deref(),
                    section.section_order,
                    None,
                )
                .await?
                .id()
            }
        };

        let mut orphans = sync_lessons(conn, section_id, &section.lessons).await?;
        orphaned_assets.append(&mut orphans);
    }

    Ok(orphaned_assets)
}

async fn sync_lessons(
    conn: &mut PgConnection,
    section_id: Uuid,
    lessons: &[LessonPayload],
) -> CurriculumResult<Vec<String>> {
    let current = Lesson::active_by_section(conn, section_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|l| l.id()).collect();
    let incoming_ids: HashSet<Uuid> = lessons.iter().filter_map(|l| l.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "lesson" });
        }
    }

    for lesson in &current {
        if !incoming_ids.contains(&lesson.id()) {
            Lesson::archive(conn, lesson.id()).await?;
        }
    }

    let mut orphaned_assets = Vec::new();

    for lesson in lessons {
        let content = lesson.content()?;

        let lesson_id = match lesson.id {
            Some(id) => {
                let stored = current
                    .iter()
                    .find(|l| l.id() == id)
                    .ok_or(CurriculumError::NodeNotFound { level: "lesson" })?;

                check_type_transition(conn, stored, &content, lesson, &mut orphaned_assets)
                    .await?;

                Lesson::update_fields(
                    conn,
                    id,
                    &lesson.lesson_name,
                    lesson.description.as_deref(),
                    lesson.lesson_order,
                    lesson.is_free_preview,
                    &content,
                )
                .await?;
                id
            }
            None => {
                // Fresh uploads never arrive through the bulk endpoint.
                if matches!(
                    content,
                    LessonContent::Video {
                        source: VideoSource::Cloudinary,
                        ..
                    }
                ) {
                    return Err(CurriculumError::HostedVideoNotAllowed {
                        lesson: lesson.lesson_name.clone(),
                    });
                }

                Lesson::insert(
                    conn,
                    section_id,
                    &lesson.lesson_name,
                    lesson.description.as_deref(),
                    lesson.lesson_order,
                    lesson.is_free_preview,
                    &content,
                )
                .await?
                .id()
            }
        };

        if lesson.lesson_type == LessonType::Quiz {
            sync_questions(conn, lesson_id, &lesson.questions).await?;
        }
        sync_attachments(conn, lesson_id, &lesson.attachments).await?;
        sync_subtitles(conn, lesson_id, &lesson.subtitles).await?;
    }

    Ok(orphaned_assets)
}

/// Guards a lesson changing its content type and records uploads that the
/// transition strands in the asset store.
async fn check_type_transition(
    conn: &mut PgConnection,
    stored: &Lesson,
    new_content: &LessonContent,
    payload: &LessonPayload,
    orphaned_assets: &mut Vec<String>,
) -> CurriculumResult<()> {
    let old_type = stored.lesson_type()?;
    let new_type = new_content.lesson_type();

    if old_type == LessonType::Quiz && new_type != LessonType::Quiz {
        let active = QuizQuestion::count_active_by_lesson(conn, stored.id()).await?;
        if active > 0 {
            return Err(CurriculumError::QuizNotEmpty {
                lesson: payload.lesson_name.clone(),
            });
        }
    }

    if let LessonContent::Video {
        source: VideoSource::Cloudinary,
        video_id,
        ..
    } = new_content
    {
        // Only an unchanged, already-hosted video may be restated here;
        // switching to a hosted source goes through the upload endpoint.
        let unchanged = stored.hosted_video_public_id() == Some(video_id.as_str());
        if !unchanged {
            return Err(CurriculumError::HostedVideoNotAllowed {
                lesson: payload.lesson_name.clone(),
            });
        }
    }

    if let Some(public_id) = stored.hosted_video_public_id() {
        let keeps_upload = matches!(
            new_content,
            LessonContent::Video {
                source: VideoSource::Cloudinary,
                video_id,
                ..
            } if video_id == public_id
        );
        if !keeps_upload {
            orphaned_assets.push(public_id.to_string());
        }
    }

    Ok(())
}

async fn sync_questions(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    questions: &[QuestionPayload],
) -> CurriculumResult<()> {
    let current = QuizQuestion::active_by_lesson(conn, lesson_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|q| q.id()).collect();
    let incoming_ids: HashSet<Uuid> = questions.iter().filter_map(|q| q.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "question" });
        }
    }

    // Archive, never delete: answered attempts keep their references.
    for question in &current {
        if !incoming_ids.contains(&question.id()) {
            QuizQuestion::archive(conn, question.id()).await?;
        }
    }

    for question in questions {
        let question_id = match question.id {
            Some(id) => {
                QuizQuestion::update_fields(
                    conn,
                    id,
                    &question.question_text,
                    question.explanation.as_deref(),
                    question.question_order,
                )
                .await?;
                id
            }
            None => {
                QuizQuestion::insert(
                    conn,
                    lesson_id,
                    &question.question_text,
                    question.explanation.as_deref(),
                    question.question_order,
                )
                .await?
                .id()
            }
        };

        sync_options(conn, question_id, question).await?;
    }

    Ok(())
}

async fn sync_options(
    conn: &mut PgConnection,
    question_id: Uuid,
    question: &QuestionPayload,
) -> CurriculumResult<()> {
    let current = QuizOption::active_by_question(conn, question_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|o| o.id()).collect();
    let incoming_ids: HashSet<Uuid> = question.options.iter().filter_map(|o| o.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "option" });
        }
    }

    for option in &current {
        if !incoming_ids.contains(&option.id()) {
            QuizOption::archive(conn, option.id()).await?;
        }
    }

    for (position, option) in question.options.iter().enumerate() {
        match option.id {
            Some(id) => {
                QuizOption::update_fields(
                    conn,
                    id,
                    &option.option_text,
                    option.is_correct_answer,
                    position as i32,
                )
                .await?;
            }
            None => {
                QuizOption::insert(
                    conn,
                    question_id,
                    &option.option_text,
                    option.is_correct_answer,
                    position as i32,
                )
                .await?;
            }
        }
    }

    Ok(())
}

async fn sync_attachments(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    attachments: &[crate::curriculum::AttachmentPayload],
) -> CurriculumResult<()> {
    let current = LessonAttachment::all_by_lesson(conn, lesson_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|a| a.id()).collect();
    let incoming_ids: HashSet<Uuid> = attachments.iter().filter_map(|a| a.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "attachment" });
        }
    }

    for attachment in &current {
        if !incoming_ids.contains(&attachment.id()) {
            LessonAttachment::delete(conn, attachment.id()).await?;
        }
    }

    for attachment in attachments {
        match attachment.id {
            Some(id) => {
                LessonAttachment::update_fields(
                    conn,
                    id,
                    &attachment.file_name,
                    &attachment.file_url,
                )
                .await?;
            }
            None => {
                LessonAttachment::insert(
                    conn,
                    lesson_id,
                    &attachment.file_name,
                    &attachment.file_url,
                )
                .await?;
            }
        }
    }

    Ok(())
}

async fn sync_subtitles(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    subtitles: &[crate::curriculum::SubtitlePayload],
) -> CurriculumResult<()> {
    let current = LessonSubtitle::all_by_lesson(conn, lesson_id).await?;
    let current_ids: HashSet<Uuid> = current.iter().map(|s| s.id()).collect();
    let incoming_ids: HashSet<Uuid> = subtitles.iter().filter_map(|s| s.id).collect();

    for id in &incoming_ids {
        if !current_ids.contains(id) {
            return Err(CurriculumError::NodeNotFound { level: "subtitle" });
        }
    }

    for subtitle in &current {
        if !incoming_ids.contains(&subtitle.id()) {
            LessonSubtitle::delete(conn, subtitle.id()).await?;
        }
    }

    let mut default_id = None;

    for subtitle in subtitles {
        let id = match subtitle.id {
            Some(id) => {
                LessonSubtitle::update_fields(
                    conn,
                    id,
                    &subtitle.language_code,
                    &subtitle.file_url,
                )
                .await?;
                id
            }
            None => {
                LessonSubtitle::insert(
                    conn,
                    lesson_id,
                    &subtitle.language_code,
                    &subtitle.file_url,
                )
                .await?
                .id()
            }
        };

        if subtitle.is_default && default_id.is_none() {
            default_id = Some(id);
        }
    }

    LessonSubtitle::clear_default(conn, lesson_id).await?;
    if let Some(id) = default_id {
        LessonSubtitle::set_default(conn, id).await?;
    }

    Ok(())
}

/// Post-write invariant check against the database state. The payload was
/// validated up front, this re-reads what actually landed before commit.
async fn revalidate_tree(conn: &mut PgConnection, course_id: Uuid) -> CurriculumResult<()> {
    let section_positions = Section::positions_by_course(conn, course_id).await?;
    if !validate_sequential_order(&section_positions) {
        return Err(CurriculumError::InvalidOrder(OrderLevel::Section));
    }

    let sections = Section::all_by_course(conn, course_id).await?;
    for section in &sections {
        let lesson_positions = Lesson::positions_by_section(conn, section.id()).await?;
        if !validate_sequential_order(&lesson_positions) {
            return Err(CurriculumError::InvalidOrder(OrderLevel::Lesson));
        }

        let lessons = Lesson::active_by_section(conn, section.id()).await?;
        for lesson in &lessons {
            if lesson.lesson_type()? != LessonType::Quiz {
                continue;
            }

            let question_positions = QuizQuestion::positions_by_lesson(conn, lesson.id()).await?;
            if !validate_sequential_order(&question_positions) {
                return Err(CurriculumError::InvalidOrder(OrderLevel::Question));
            }

            let questions = QuizQuestion::active_by_lesson(conn, lesson.id()).await?;
            for question in &questions {
                let (total, correct) = QuizOption::shape_of_question(conn, question.id()).await?;
                if total < 2 || correct != 1 {
                    return Err(CurriculumError::BadQuizShape {
                        question: question.question_text().to_string(),
                        reason: "active questions must keep two options and one correct answer",
                    });
                }
            }
        }
    }

    Ok(())
}
