use super::{Identifiable, LocaleInfo};
use crate::error::{ErrorKind, Result};
use crate::sys::Sys;
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub sys: Sys,
    pub name: Option<String>,
    pub locales: Vec<LocaleInfo>,
}

#[derive(Deserialize)]
struct Body {
    name: Option<String>,
    #[serde(default)]
    locales: Vec<LocaleInfo>,
}

impl Space {
    pub fn from_node(sys: Sys, node: &Value) -> Result<Self> {
        let body = Body::deserialize(node).or_raise(|| ErrorKind::MalformedPayload("Space"))?;
        Ok(Self { sys, name: body.name, locales: body.locales })
    }
}
impl Identifiable for Space {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
