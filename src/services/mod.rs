pub mod auth_service;
pub mod error;
pub mod policy;
pub mod ticket_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginRequest, LoginResponse};
pub use error::{ServiceError, ServiceResult};
pub use ticket_service::{CreateTicketRequest, TicketService};
pub use user_service::UserService;
