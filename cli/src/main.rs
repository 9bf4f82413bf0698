use clap::{Parser, Subcommand};
use coursehub::auth::hash_password;
use coursehub::model::entity::{
    Account, AccountCreateUpdate, Course, CourseCreateUpdate, LessonContent, Lesson, Section,
};
use coursehub::model::{CrudRepository, DbConnection, ModelManager};
use coursehub::web::AuthenticatedUser;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the coursehub DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage sections
    Section {
        #[command(subcommand)]
        action: SectionCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Create an account
    Create {
        username: String,
        password: String,
        #[arg(default_value = "student")]
        role: String,
    },
    /// List accounts
    List,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    /// Create a draft course owned by the given instructor
    Create {
        name: String,
        instructor: String,
    },
    /// List courses
    List,
}

#[derive(Subcommand, Debug)]
pub enum SectionCommands {
    /// Append a section to a course
    Add {
        course_id: Uuid,
        name: String,
        position: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    /// Append a text lesson to a section
    AddText {
        section_id: Uuid,
        name: String,
        position: i32,
        text: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL is not set");
    let db = DbConnection::connect(&database_url).expect("unable to connect to database");
    let mm = ModelManager::new(db);
    let admin = AuthenticatedUser::admin();

    match cli.command {
        Commands::Account { action } => match action {
            AccountCommands::Create {
                username,
                password,
                role,
            } => {
                let hash = hash_password(&password).expect("unable to hash password");
                let account = Account::create(
                    &mm,
                    &admin,
                    AccountCreateUpdate {
                        username,
                        password_hash: hash,
                        role,
                    },
                )
                .await
                .expect("unable to create account");
                println!("created account {} ({})", account.username(), account.id());
            }
            AccountCommands::List => {
                let accounts = Account::list(&mm, &admin, 100, 0)
                    .await
                    .expect("unable to list accounts");
                for account in accounts {
                    println!("{} {} {}", account.id(), account.username(), account.role());
                }
            }
        },
        Commands::Course { action } => match action {
            CourseCommands::Create { name, instructor } => {
                let owner = Account::find_by_username(&mm, &admin, &instructor)
                    .await
                    .expect("unable to look up instructor")
                    .expect("instructor not found");
                let actor = AuthenticatedUser::new(owner.id(), owner.role());
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreateUpdate {
                        name,
                        subtitle: None,
                        description: None,
                        price_original: None,
                        price_discounted: None,
                        category: None,
                        level: None,
                        language_code: None,
                    },
                )
                .await
                .expect("unable to create course");
                println!("created course {} ({})", course.name(), course.id());
            }
            CourseCommands::List => {
                let courses = Course::list(&mm, &admin, 100, 0)
                    .await
                    .expect("unable to list courses");
                for course in courses {
                    println!(
                        "{} {} [{}]",
                        course.id(),
                        course.name(),
                        course.status().as_db()
                    );
                }
            }
        },
        Commands::Section { action } => match action {
            SectionCommands::Add {
                course_id,
                name,
                position,
            } => {
                let mut conn = mm.acquire().await.expect("unable to acquire connection");
                let section = Section::insert(&mut conn, course_id, &name, None, position, None)
                    .await
                    .expect("unable to create section");
                println!("created section {} ({})", section.name(), section.id());
            }
        },
        Commands::Lesson { action } => match action {
            LessonCommands::AddText {
                section_id,
                name,
                position,
                text,
            } => {
                let mut conn = mm.acquire().await.expect("unable to acquire connection");
                let lesson = Lesson::insert(
                    &mut conn,
                    section_id,
                    &name,
                    None,
                    position,
                    false,
                    &LessonContent::Text { body: text },
                )
                .await
                .expect("unable to create lesson");
                println!("created lesson {} ({})", lesson.name(), lesson.id());
            }
        },
    }
}
