/// Domain models for Taskhub
///
/// Plain data types shared by the repositories, services and HTTP layer.
/// All wire names are camelCase.
///
/// # Models
///
/// - `user`: User accounts
/// - `session`: Authentication sessions
/// - `task`: Tasks, list filters and pages
/// - `category`: Derived category counts

pub mod category;
pub mod session;
pub mod task;
pub mod user;

pub use category::CategoryCount;
pub use session::Session;
pub use task::{CreateTask, Task, TaskFilters, TaskPage};
pub use user::{CreateUser, User};
