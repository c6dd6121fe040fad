//! Ticket reporting, workflow and attachments.

pub mod service;
pub mod upload;
pub mod workflow;

pub use service::{CreateTicketRequest, TicketDetail, TicketListQuery, TicketService, UpdateTicketRequest};
pub use upload::{UploadService, UploadedFile};
pub use workflow::WorkflowRequest;
