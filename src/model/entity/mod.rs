mod account;
pub use account::{Account, AccountCreateUpdate};

mod course;
pub use course::{Course, CourseCreateUpdate, CourseStatus};

mod section;
pub use section::Section;

mod lesson;
pub use lesson::{Lesson, LessonContent, LessonType, VideoSource};

mod question;
pub use question::QuizQuestion;

mod option;
pub use self::option::QuizOption;

mod attachment;
pub use attachment::LessonAttachment;

mod subtitle;
pub use subtitle::LessonSubtitle;

mod approval;
pub use approval::{
    ApprovalRequestType, ApprovalStatus, CourseApprovalRequest, ReviewDecision,
};

mod attempt;
pub use attempt::{QuizAttempt, QuizAttemptAnswer};

mod enrollment;
pub use enrollment::Enrollment;

mod notification;
pub use notification::Notification;
