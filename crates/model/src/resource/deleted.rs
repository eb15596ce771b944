use super::Identifiable;
use crate::sys::Sys;

/// A `DeletedEntry` or `DeletedAsset` marker from a sync page. Carries
/// nothing but the identity of the removed resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub sys: Sys,
}
impl Identifiable for Deleted {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
