//! Ticket domain entities.

pub mod attachment;
pub mod comment;
pub mod history;
pub mod model;
pub mod status;
pub mod workflow;

pub use attachment::{AttachmentKind, NewAttachment, TicketAttachment};
pub use comment::TicketComment;
pub use history::{NewHistory, TicketHistory};
pub use model::{NewTicket, Ticket, TicketFilter, TicketPatch, format_ticket_number};
pub use status::{Priority, Severity, TicketStatus};
pub use workflow::TicketAction;
