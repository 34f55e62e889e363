//! JSON encoding of cached values.
//!
//! A single record and the collection snapshot are both stored as UTF-8 JSON text, so entries stay readable with
//! any key-value store client.

use crate::error::CodecError;
use crate::types::Contact;

pub fn encode_contact(contact: &Contact) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(contact).map_err(|source| CodecError::Encode {
        what: "contact",
        source,
    })
}

pub fn decode_contact(bytes: &[u8]) -> Result<Contact, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
        what: "contact",
        source,
    })
}

pub fn encode_contacts(contacts: &[Contact]) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(contacts).map_err(|source| CodecError::Encode {
        what: "contact list",
        source,
    })
}

pub fn decode_contacts(bytes: &[u8]) -> Result<Vec<Contact>, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
        what: "contact list",
        source,
    })
}
