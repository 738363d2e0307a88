pub mod activity_repo;
pub mod security_alert_repo;
pub mod service_repo;
pub mod session_repo;
pub mod shadow_token_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use security_alert_repo::SecurityAlertRepo;
pub use service_repo::ServiceRepo;
pub use session_repo::SessionRepo;
pub use shadow_token_repo::ShadowTokenRepo;
pub use user_repo::UserRepo;
