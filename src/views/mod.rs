//! One controller per dashboard screen. Each view owns its own state and is
//! driven with a shared [`crate::api::ApiClient`] and the session's [`crate::ui::Ui`].

pub mod attendance;
pub mod dashboard;
pub mod register;
pub mod users;

pub use attendance::{AttendanceFilter, AttendanceState, AttendanceView, FilterMode};
pub use dashboard::{DashboardView, HealthLine, MarkReport};
pub use register::{FormError, RegisterForm, RegisterOutcome, RegisterView};
pub use users::{SortDirection, SortKey, UsersView, PAGE_SIZE};
