use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::account_signup_handler,
        crate::web::routes::account::account_signin_handler,
        crate::web::routes::account::account_list_handler,
        crate::web::routes::account::account_update_handler,
        crate::web::routes::account::account_delete_handler,
        crate::web::routes::account::account_notifications_handler,
        crate::web::routes::courses::course_create_handler,
        crate::web::routes::courses::course_get_handler,
        crate::web::routes::courses::course_update_handler,
        crate::web::routes::courses::course_delete_handler,
        crate::web::routes::courses::course_enroll_handler,
        crate::web::routes::courses::course_feature_handler,
        crate::web::routes::courses::course_archive_handler,
        crate::web::routes::courses::course_draft_handler,
        crate::web::routes::courses::course_thumbnail_handler,
        crate::web::routes::courses::lesson_video_handler,
        crate::web::routes::curriculum::curriculum_sync_handler,
        crate::web::routes::curriculum::curriculum_get_handler,
        crate::web::routes::reviews::course_submit_handler,
        crate::web::routes::reviews::course_reviews_handler,
        crate::web::routes::reviews::review_decide_handler,
        crate::web::routes::quizzes::attempt_start_handler,
        crate::web::routes::quizzes::attempt_submit_handler,
        crate::web::routes::quizzes::attempt_result_handler,
        crate::web::routes::quizzes::attempt_history_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
