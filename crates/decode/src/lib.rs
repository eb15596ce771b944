//! Decoding of raw content delivery pages into linked resource graphs.
//!
//! A page is a JSON object holding `items` (the direct hits of a query),
//! `includes` (resources transmitted because something links to them) and
//! optionally `errors` (links the server could not resolve). [`decode`]
//! turns it into a [`ResourceArray`]: every resource registered exactly once
//! in a [`Registry`], every link field replaced by a handle to its target
//! (or dropped when the target never arrived), cycles included.
//!
//! ```
//! use serde_json::json;
//! use weft_decode::decode;
//! use weft_model::{LocaleChain, Localized};
//!
//! let page = json!({
//!     "items": [{
//!         "sys": {"type": "Entry", "id": "nyancat", "locale": "en-US"},
//!         "fields": {"name": "Nyan Cat"}
//!     }]
//! });
//! let array = decode(&page).unwrap();
//! let entry = array.entry("nyancat").unwrap();
//! let name = entry.field("name", &LocaleChain::default()).and_then(|v| v.as_str());
//! assert_eq!(name, Some("Nyan Cat"));
//! ```

mod array;
pub mod error;
mod registry;
mod resolve;

pub use crate::array::{ResourceArray, decode, fetch_one};
pub use crate::registry::Registry;
pub use crate::resolve::Resolver;
