pub mod money;
pub mod ports;
pub mod seller;
pub mod ticket;

/// Identifier of a seller record, assigned by the persistence collaborator.
pub type SellerId = u32;

/// Identifier of a ticket record.
pub type TicketId = u32;
