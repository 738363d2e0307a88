pub mod activity;
pub mod security_alert;
pub mod service;
pub mod session;
pub mod shadow_token;
pub mod user;

pub use activity::{Activity, CreateActivity, RedemptionEvent};
pub use security_alert::{CreateSecurityAlert, SecurityAlert};
pub use service::{CreateService, CreateServicePortal, Service, ServicePortal};
pub use session::{CreateSession, MultiIdentityDevice, Session};
pub use shadow_token::{CreateShadowToken, ShadowToken};
pub use user::{CreateUser, User};
