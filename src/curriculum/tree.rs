//! Loading and bulk-cloning of the persisted curriculum tree. Children are
//! keyed by owner id per level, the tree is assembled in memory and never
//! holds back-references.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::curriculum::CurriculumResult;
use crate::model::entity::{
    Lesson, LessonAttachment, LessonSubtitle, QuizOption, QuizQuestion, Section,
};

#[derive(Debug)]
pub struct CurriculumTree {
    pub sections: Vec<SectionNode>,
}

#[derive(Debug)]
pub struct SectionNode {
    pub section: Section,
    pub lessons: Vec<LessonNode>,
}

#[derive(Debug)]
pub struct LessonNode {
    pub lesson: Lesson,
    pub questions: Vec<QuestionNode>,
    pub attachments: Vec<LessonAttachment>,
    pub subtitles: Vec<LessonSubtitle>,
}

#[derive(Debug)]
pub struct QuestionNode {
    pub question: QuizQuestion,
    pub options: Vec<QuizOption>,
}

impl CurriculumTree {
    /// Loads the full active tree of a course. Archived lessons, questions
    /// and options are excluded.
    pub async fn load(conn: &mut PgConnection, course_id: Uuid) -> CurriculumResult<Self> {
        let sections = Section::all_by_course(conn, course_id).await?;
        let mut section_nodes = Vec::with_capacity(sections.len());

        for section in sections {
            let lessons = Lesson::active_by_section(conn, section.id()).await?;
            let mut lesson_nodes = Vec::with_capacity(lessons.len());

            for lesson in lessons {
                let questions = QuizQuestion::active_by_lesson(conn, lesson.id()).await?;
                let mut question_nodes = Vec::with_capacity(questions.len());
                for question in questions {
                    let options = QuizOption::active_by_question(conn, question.id()).await?;
                    question_nodes.push(QuestionNode { question, options });
                }

                let attachments = LessonAttachment::all_by_lesson(conn, lesson.id()).await?;
                let subtitles = LessonSubtitle::all_by_lesson(conn, lesson.id()).await?;

                lesson_nodes.push(LessonNode {
                    lesson,
                    questions: question_nodes,
                    attachments,
                    subtitles,
                });
            }

            section_nodes.push(SectionNode {
                section,
                lessons: lesson_nodes,
            });
        }

        Ok(Self {
            sections: section_nodes,
        })
    }

    /// Deep-clones the active tree of `source_course_id` under
    /// `target_course_id`. Every node gets a fresh id; cloned sections
    /// remember their source through `original_id`.
    pub async fn clone_into(
        conn: &mut PgConnection,
        source_course_id: Uuid,
        target_course_id: Uuid,
    ) -> CurriculumResult<()> {
        let tree = Self::load(conn, source_course_id).await?;

        for section_node in &tree.sections {
            let src = &section_node.section;
            let cloned_section = Section::insert(
                conn,
                target_course_id,
                src.name(),
                src.description(),
                src.position(),
                Some(src.id()),
            )
            .await?;

            for lesson_node in &section_node.lessons {
                let lesson = &lesson_node.lesson;
                let content = lesson.content()?;
                let cloned_lesson = Lesson::insert(
                    conn,
                    cloned_section.id(),
                    lesson.name(),
                    lesson.description(),
                    lesson.position(),
                    lesson.is_free_preview(),
                    &content,
                )
                .await?;

                for question_node in &lesson_node.questions {
                    let question = &question_node.question;
                    let cloned_question = QuizQuestion::insert(
                        conn,
                        cloned_lesson.id(),
                        question.question_text(),
                        question.explanation(),
                        question.position(),
                    )
                    .await?;

                    for option in &question_node.options {
                        QuizOption::insert(
                            conn,
                            cloned_question.id(),
                            option.option_text(),
                            option.is_correct(),
                            option.position(),
                        )
                        .await?;
                    }
                }

                for attachment in &lesson_node.attachments {
                    LessonAttachment::insert(
                        conn,
                        cloned_lesson.id(),
                        attachment.file_name(),
                        attachment.file_url(),
                    )
                    .await?;
                }

                for subtitle in &lesson_node.subtitles {
                    let cloned = LessonSubtitle::insert(
                        conn,
                        cloned_lesson.id(),
                        subtitle.language_code(),
                        subtitle.file_url(),
                    )
                    .await?;
                    if subtitle.is_default() {
                        LessonSubtitle::set_default(conn, cloned.id()).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Drops the whole tree of a course. Used when an approved update draft
    /// replaces the live curriculum; cascades take the lesson children.
    pub async fn delete_all(conn: &mut PgConnection, course_id: Uuid) -> CurriculumResult<()> {
        sqlx::query("DELETE FROM sections WHERE course_id = $1")
            .bind(course_id)
            .execute(conn)
            .await
            .map_err(crate::model::DatabaseError::from)?;
        Ok(())
    }
}
