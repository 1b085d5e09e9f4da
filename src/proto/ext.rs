use prost::Message;

use super::op_item::Op;
use super::EmptyOp;
use super::Endpoint;
use super::OpItem;
use super::Ref;
use super::Service;
use super::Set;
use super::Value;
use super::WatchReq;

impl WatchReq {
    pub fn for_node(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }
}

impl OpItem {
    /// `Set` operation carrying an already encoded payload
    pub fn set(
        set: Set,
        path: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            op: Some(Op::Set(Value {
                r#ref: Some(Ref {
                    set: set as i32,
                    path: path.into(),
                }),
                bytes,
            })),
        }
    }

    pub fn set_service(
        path: impl Into<String>,
        service: &Service,
    ) -> Self {
        Self::set(Set::ServicesSet, path, service.encode_to_vec())
    }

    pub fn set_endpoint(
        path: impl Into<String>,
        endpoint: &Endpoint,
    ) -> Self {
        Self::set(Set::EndpointsSet, path, endpoint.encode_to_vec())
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            op: Some(Op::Delete(Ref {
                set: Set::ServicesSet as i32,
                path: path.into(),
            })),
        }
    }

    pub fn sync() -> Self {
        Self {
            op: Some(Op::Sync(EmptyOp {})),
        }
    }

    pub fn is_sync(&self) -> bool {
        matches!(self.op, Some(Op::Sync(_)))
    }
}
