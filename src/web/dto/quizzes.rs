use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::{AttemptDetail, SubmittedAnswer};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitAnswersBody {
    pub answers: Vec<AnswerBody>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerBody {
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
}

impl From<AnswerBody> for SubmittedAnswer {
    fn from(body: AnswerBody) -> Self {
        Self {
            question_id: body.question_id,
            selected_option_id: body.selected_option_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResultResponse {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub score: Option<f64>,
    pub is_passed: Option<bool>,
    pub answers: Vec<AnswerResultDto>,
}

/// Correct flags are shown here on purpose: answers are revealed once the
/// attempt is submitted.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResultDto {
    pub question_id: Uuid,
    pub question_text: String,
    pub explanation: Option<String>,
    pub selected_option_id: Uuid,
    pub is_correct: bool,
    pub options: Vec<OptionResultDto>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionResultDto {
    pub id: Uuid,
    pub option_text: String,
    pub is_correct_answer: bool,
}

impl From<AttemptDetail> for AttemptResultResponse {
    fn from(detail: AttemptDetail) -> Self {
        Self {
            attempt_id: detail.attempt.id(),
            attempt_number: detail.attempt.attempt_number(),
            score: detail.attempt.score(),
            is_passed: detail.attempt.is_passed(),
            answers: detail
                .answers
                .into_iter()
                .map(|a| AnswerResultDto {
                    question_id: a.question.id(),
                    question_text: a.question.question_text().to_string(),
                    explanation: a.question.explanation().map(str::to_string),
                    selected_option_id: a.selected_option_id,
                    is_correct: a.is_correct,
                    options: a
                        .options
                        .into_iter()
                        .map(|o| OptionResultDto {
                            id: o.id(),
                            option_text: o.option_text().to_string(),
                            is_correct_answer: o.is_correct(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
