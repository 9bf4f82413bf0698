pub mod curriculum;
pub mod quizzes;
