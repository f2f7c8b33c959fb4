//! Tickets: ownership tags, the registry and the message relay.
//!
//! - Ownership is stored in the ticket channel's topic (`codec`)
//! - Open tickets are cached per user (`registry`)
//! - DMs and staff replies are relayed between both sides (`relay`)

pub mod codec;
pub mod content;
pub mod registry;
pub mod relay;

pub use codec::OwnershipTag;
pub use content::RelayedContent;
pub use registry::{Ticket, TicketRegistry};
pub use relay::{InboundMessage, MessageRelay};
