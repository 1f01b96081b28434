pub mod comment;
pub mod ticket;
pub mod user;

pub use comment::{Comment, CommentView, NewComment};
pub use ticket::{NewTicket, StatusCounts, Ticket, TicketChange, TicketDetail, TicketSummary};
pub use user::{NewUser, PublicUser, User};
