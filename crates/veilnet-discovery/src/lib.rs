//! Service discovery data model
//!
//! Providers advertise their services as [`ServiceProposal`] records in the
//! discovery directory. A proposal names the provider, how to reach it
//! ([`Contact`]), and two payloads whose concrete shape depends on a string
//! tag: the service definition and the payment method. Payload decoders are
//! registered per tag during bootstrap; proposals carrying an unregistered
//! tag still parse, with the tag preserved and the typed payload left empty.

mod client;
mod contact;
mod money;
mod payload;
mod proposal;

pub use client::{DirectoryClient, DirectoryError};
pub use contact::Contact;
pub use money::Money;
pub use payload::{
    payment_method_registered, register_payment_method, register_service_definition,
    service_definition_registered, PaymentMethod, ServiceDefinition,
};
pub use proposal::{ServiceProposal, PROPOSAL_FORMAT};
