//! Remote object introspection.
//!
//! Servers describe their API tree through `zmqRemoteApi.info(name)`. Each
//! member of the returned object is one of:
//!
//! ```text
//! {"func": ...}      a callable function, called as "<name>.<member>"
//! {"const": value}   a constant
//! {...}              a nested object, described the same way
//! ```

use std::collections::{BTreeMap, BTreeSet};

use zrapi_types::{Codec, Map, Value};

use crate::client::RpcClient;
use crate::error::{Error, Result};
use crate::protocol::FUNC_KEY;
use crate::transport::Transport;

/// Remote function returning the description of an object.
pub const INFO_FUNCTION: &str = "zmqRemoteApi.info";

const CONST_KEY: &str = "const";

/// Description of a remote object's functions, constants and sub-objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteObject {
    name: String,
    functions: BTreeSet<String>,
    constants: Map,
    children: BTreeMap<String, RemoteObject>,
}

impl RemoteObject {
    /// Build from the reply of [`INFO_FUNCTION`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if `info` or any member descriptor is not an
    /// object.
    pub fn from_info(name: &str, info: Value) -> Result<Self> {
        let entries = info
            .into_object()
            .map_err(|e| Error::protocol(format!("description of {name} is invalid: {e}")))?;

        let mut object = Self {
            name: name.to_string(),
            ..Self::default()
        };

        for (member, descriptor) in entries {
            let path = format!("{name}.{member}");
            let mut fields = match descriptor {
                Value::Object(fields) => fields,
                other => {
                    return Err(Error::protocol(format!(
                        "member {path} is described by {} instead of an object",
                        other.kind()
                    )));
                }
            };

            if fields.len() == 1 {
                if fields.contains_key(FUNC_KEY) {
                    object.functions.insert(member);
                    continue;
                }
                if let Some(value) = fields.remove(CONST_KEY) {
                    object.constants.insert(member, value);
                    continue;
                }
            }

            let child = Self::from_info(&path, Value::Object(fields))?;
            object.children.insert(member, child);
        }

        Ok(object)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_function(&self, member: &str) -> bool {
        self.functions.contains(member)
    }

    /// Fully qualified name to call `member` with, e.g. `sim.getObject`.
    #[must_use]
    pub fn function_path(&self, member: &str) -> Option<String> {
        self.has_function(member)
            .then(|| format!("{}.{member}", self.name))
    }

    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    #[must_use]
    pub fn constants(&self) -> &Map {
        &self.constants
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&RemoteObject> {
        self.children.get(name)
    }
}

impl<T: Transport, C: Codec> RpcClient<T, C> {
    /// Fetch the description of remote object `name`.
    ///
    /// # Errors
    ///
    /// Any error of [`RpcClient::call`], or `Error::Protocol` if the
    /// description is malformed.
    pub fn get_object(&mut self, name: &str) -> Result<RemoteObject> {
        let info = self.call_unpacked(INFO_FUNCTION, vec![Value::from(name)])?;
        RemoteObject::from_info(name, info)
    }

    /// Call function `member` of `object`, unpacking the return array like
    /// [`RpcClient::call_unpacked`].
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownMember` without contacting the server if
    /// `object` has no such function, otherwise any error of
    /// [`RpcClient::call`].
    pub fn call_member(
        &mut self,
        object: &RemoteObject,
        member: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        let path = object
            .function_path(member)
            .ok_or_else(|| Error::UnknownMember {
                object: object.name.clone(),
                member: member.to_string(),
            })?;
        self.call_unpacked(&path, args)
    }
}
