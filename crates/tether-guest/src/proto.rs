//! Protobuf messages exchanged with the host.
//!
//! The `prost::Message` impls are written out by hand so the encoding rules
//! of the protocol hold exactly: scalar fields are always written, even when
//! they hold their default; repeated fields are skipped when empty; optional
//! messages are skipped when `None`. Decoding accepts fields in any order and
//! skips tags it does not know.

use bytes::{Buf, BufMut};
use prost::encoding::{self, DecodeContext, WireType};
use prost::{DecodeError, Message};

use crate::codec::in_field;

// ─── Owner ──────────────────────────────────────────────────────────────

/// Identity of the resource whose lifecycle triggered the invocation.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Owner {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    pub namespace: String,
}

impl Message for Owner {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.api_version, buf);
        encoding::string::encode(2, &self.kind, buf);
        encoding::string::encode(3, &self.name, buf);
        encoding::string::encode(4, &self.uid, buf);
        encoding::string::encode(5, &self.namespace, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "Owner";
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.api_version, buf, ctx)
                .map_err(in_field(NAME, "api_version")),
            2 => encoding::string::merge(wire_type, &mut self.kind, buf, ctx)
                .map_err(in_field(NAME, "kind")),
            3 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field(NAME, "name")),
            4 => encoding::string::merge(wire_type, &mut self.uid, buf, ctx)
                .map_err(in_field(NAME, "uid")),
            5 => encoding::string::merge(wire_type, &mut self.namespace, buf, ctx)
                .map_err(in_field(NAME, "namespace")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.api_version)
            + encoding::string::encoded_len(2, &self.kind)
            + encoding::string::encoded_len(3, &self.name)
            + encoding::string::encoded_len(4, &self.uid)
            + encoding::string::encoded_len(5, &self.namespace)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── KeyValue ───────────────────────────────────────────────────────────

/// A name/value pair: environment variables, labels and annotations.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct KeyValue {
    pub name: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Message for KeyValue {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.name, buf);
        encoding::string::encode(2, &self.value, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field("KeyValue", "name")),
            2 => encoding::string::merge(wire_type, &mut self.value, buf, ctx)
                .map_err(in_field("KeyValue", "value")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.name) + encoding::string::encoded_len(2, &self.value)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── EnvFrom ────────────────────────────────────────────────────────────

/// Where an `EnvFrom` reference points.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Hash)]
#[repr(i32)]
pub enum EnvFromType {
    #[default]
    Secret = 0,
    ConfigMap = 1,
}

impl EnvFromType {
    /// Unknown wire values fall back to the default.
    pub fn from_wire(value: i32) -> Self {
        match value {
            1 => Self::ConfigMap,
            _ => Self::Secret,
        }
    }
}

/// Import every key of a Secret or ConfigMap as environment variables.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct EnvFrom {
    pub name: String,
    pub optional: bool,
    pub kind: EnvFromType,
}

impl Message for EnvFrom {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.name, buf);
        encoding::bool::encode(2, &self.optional, buf);
        encoding::int32::encode(3, &(self.kind as i32), buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field("EnvFrom", "name")),
            2 => encoding::bool::merge(wire_type, &mut self.optional, buf, ctx)
                .map_err(in_field("EnvFrom", "optional")),
            3 => {
                let mut raw = self.kind as i32;
                encoding::int32::merge(wire_type, &mut raw, buf, ctx)
                    .map_err(in_field("EnvFrom", "type"))?;
                self.kind = EnvFromType::from_wire(raw);
                Ok(())
            }
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.name)
            + encoding::bool::encoded_len(2, &self.optional)
            + encoding::int32::encoded_len(3, &(self.kind as i32))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── Validation ─────────────────────────────────────────────────────────

/// Which admission operation a `Validate` call is checking.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Hash)]
#[repr(i32)]
pub enum ValidationType {
    #[default]
    Create = 0,
    Update = 1,
    Delete = 2,
}

impl ValidationType {
    /// Map the raw export argument; unrecognised values mean `Create`.
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => Self::Update,
            2 => Self::Delete,
            _ => Self::Create,
        }
    }
}

/// One validation finding: where, what, and the offending value.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ValidationError {
    pub path: String,
    pub detail: String,
    pub value: String,
}

impl ValidationError {
    pub fn new(
        path: impl Into<String>,
        detail: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            detail: detail.into(),
            value: value.into(),
        }
    }
}

impl Message for ValidationError {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.path, buf);
        encoding::string::encode(2, &self.detail, buf);
        encoding::string::encode(3, &self.value, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "ValidationError";
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.path, buf, ctx)
                .map_err(in_field(NAME, "path")),
            2 => encoding::string::merge(wire_type, &mut self.detail, buf, ctx)
                .map_err(in_field(NAME, "detail")),
            3 => encoding::string::merge(wire_type, &mut self.value, buf, ctx)
                .map_err(in_field(NAME, "value")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.path)
            + encoding::string::encoded_len(2, &self.detail)
            + encoding::string::encoded_len(3, &self.value)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── GroupVersionResource ───────────────────────────────────────────────

/// Selector addressing a resource collection on the host.
#[derive(Clone, PartialEq, Eq, Default, Debug, Hash, PartialOrd, Ord)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

impl std::fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

impl Message for GroupVersionResource {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.group, buf);
        encoding::string::encode(2, &self.version, buf);
        encoding::string::encode(3, &self.resource, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "GroupVersionResource";
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.group, buf, ctx)
                .map_err(in_field(NAME, "group")),
            2 => encoding::string::merge(wire_type, &mut self.version, buf, ctx)
                .map_err(in_field(NAME, "version")),
            3 => encoding::string::merge(wire_type, &mut self.resource, buf, ctx)
                .map_err(in_field(NAME, "resource")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.group)
            + encoding::string::encoded_len(2, &self.version)
            + encoding::string::encoded_len(3, &self.resource)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── Containers ─────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl Message for EnvVar {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.name, buf);
        encoding::string::encode(2, &self.value, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field("EnvVar", "name")),
            2 => encoding::string::merge(wire_type, &mut self.value, buf, ctx)
                .map_err(in_field("EnvVar", "value")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.name) + encoding::string::encoded_len(2, &self.value)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ContainerPort {
    pub name: String,
    pub host_port: i32,
    pub container_port: i32,
    pub protocol: String,
}

impl Message for ContainerPort {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.name, buf);
        encoding::int32::encode(2, &self.host_port, buf);
        encoding::int32::encode(3, &self.container_port, buf);
        encoding::string::encode(4, &self.protocol, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "ContainerPort";
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field(NAME, "name")),
            2 => encoding::int32::merge(wire_type, &mut self.host_port, buf, ctx)
                .map_err(in_field(NAME, "host_port")),
            3 => encoding::int32::merge(wire_type, &mut self.container_port, buf, ctx)
                .map_err(in_field(NAME, "container_port")),
            4 => encoding::string::merge(wire_type, &mut self.protocol, buf, ctx)
                .map_err(in_field(NAME, "protocol")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.name)
            + encoding::int32::encoded_len(2, &self.host_port)
            + encoding::int32::encoded_len(3, &self.container_port)
            + encoding::string::encoded_len(4, &self.protocol)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The subset of a pod container that extensions inject as init
/// containers or sidecars.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub working_dir: String,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    pub image_pull_policy: String,
}

impl Message for Container {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode(1, &self.name, buf);
        encoding::string::encode(2, &self.image, buf);
        encoding::string::encode_repeated(3, &self.command, buf);
        encoding::string::encode_repeated(4, &self.args, buf);
        encoding::string::encode(5, &self.working_dir, buf);
        encoding::message::encode_repeated(6, &self.ports, buf);
        encoding::message::encode_repeated(7, &self.env, buf);
        encoding::string::encode(14, &self.image_pull_policy, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "Container";
        match tag {
            1 => encoding::string::merge(wire_type, &mut self.name, buf, ctx)
                .map_err(in_field(NAME, "name")),
            2 => encoding::string::merge(wire_type, &mut self.image, buf, ctx)
                .map_err(in_field(NAME, "image")),
            3 => encoding::string::merge_repeated(wire_type, &mut self.command, buf, ctx)
                .map_err(in_field(NAME, "command")),
            4 => encoding::string::merge_repeated(wire_type, &mut self.args, buf, ctx)
                .map_err(in_field(NAME, "args")),
            5 => encoding::string::merge(wire_type, &mut self.working_dir, buf, ctx)
                .map_err(in_field(NAME, "working_dir")),
            6 => encoding::message::merge_repeated(wire_type, &mut self.ports, buf, ctx)
                .map_err(in_field(NAME, "ports")),
            7 => encoding::message::merge_repeated(wire_type, &mut self.env, buf, ctx)
                .map_err(in_field(NAME, "env")),
            14 => encoding::string::merge(wire_type, &mut self.image_pull_policy, buf, ctx)
                .map_err(in_field(NAME, "image_pull_policy")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len(1, &self.name)
            + encoding::string::encoded_len(2, &self.image)
            + encoding::string::encoded_len_repeated(3, &self.command)
            + encoding::string::encoded_len_repeated(4, &self.args)
            + encoding::string::encoded_len(5, &self.working_dir)
            + encoding::message::encoded_len_repeated(6, &self.ports)
            + encoding::message::encoded_len_repeated(7, &self.env)
            + encoding::string::encoded_len(14, &self.image_pull_policy)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── SyncRequest ────────────────────────────────────────────────────────

/// The invocation context the host hands to an extension: who owns the
/// resource and the extension's slice of its spec (JSON bytes).
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct SyncRequest {
    pub owner: Option<Owner>,
    pub spec: Vec<u8>,
}

impl Message for SyncRequest {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(owner) = &self.owner {
            encoding::message::encode(1, owner, buf);
        }
        encoding::bytes::encode(2, &self.spec, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::message::merge(
                wire_type,
                self.owner.get_or_insert_with(Owner::default),
                buf,
                ctx,
            )
            .map_err(in_field("SyncRequest", "owner")),
            2 => encoding::bytes::merge(wire_type, &mut self.spec, buf, ctx)
                .map_err(in_field("SyncRequest", "spec")),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.owner
            .as_ref()
            .map_or(0, |owner| encoding::message::encoded_len(1, owner))
            + encoding::bytes::encoded_len(2, &self.spec)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{append_unknown_bytes, append_unknown_varint, decode, encode};

    fn owner() -> Owner {
        Owner {
            api_version: "tether.dev/v1".into(),
            kind: "Application".into(),
            name: "some-app".into(),
            uid: "4f1c1d3e-2b0a-4c57-9d0e-1a2b3c4d5e6f".into(),
            namespace: "mynamespace".into(),
        }
    }

    fn container() -> Container {
        Container {
            name: "proxy".into(),
            image: "envoyproxy/envoy:v1.30".into(),
            command: vec!["envoy".into()],
            args: vec!["-c".into(), "/etc/envoy.yaml".into()],
            working_dir: "/".into(),
            ports: vec![ContainerPort {
                name: "admin".into(),
                host_port: 0,
                container_port: 9901,
                protocol: "TCP".into(),
            }],
            env: vec![EnvVar {
                name: "LOG_LEVEL".into(),
                value: "info".into(),
            }],
            image_pull_policy: "IfNotPresent".into(),
        }
    }

    // ── Round trips ─────────────────────────────────────────────────

    #[test]
    fn test_owner_round_trip() {
        let decoded: Owner = decode(encode(&owner())).unwrap();
        assert_eq!(decoded, owner());
    }

    #[test]
    fn test_container_round_trip() {
        let decoded: Container = decode(encode(&container())).unwrap();
        assert_eq!(decoded, container());
    }

    #[test]
    fn test_container_empty_collections_round_trip() {
        let bare = Container {
            name: "init".into(),
            image: "busybox".into(),
            ..Default::default()
        };
        let decoded: Container = decode(encode(&bare)).unwrap();
        assert_eq!(decoded, bare);
        assert!(decoded.ports.is_empty());
        assert!(decoded.command.is_empty());
    }

    #[test]
    fn test_sync_request_with_owner_round_trip() {
        let req = SyncRequest {
            owner: Some(owner()),
            spec: br#"{"ingresses":[]}"#.to_vec(),
        };
        let decoded: SyncRequest = decode(encode(&req)).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_sync_request_without_owner_round_trip() {
        let req = SyncRequest {
            owner: None,
            spec: b"{}".to_vec(),
        };
        let decoded: SyncRequest = decode(encode(&req)).unwrap();
        assert_eq!(decoded.owner, None);
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_env_from_round_trip() {
        let env_from = EnvFrom {
            name: "db-credentials".into(),
            optional: true,
            kind: EnvFromType::ConfigMap,
        };
        let decoded: EnvFrom = decode(encode(&env_from)).unwrap();
        assert_eq!(decoded, env_from);
    }

    // ── Emission policy ─────────────────────────────────────────────

    #[test]
    fn test_default_scalars_are_emitted() {
        let bytes = encode(&KeyValue::default());
        // Two empty strings: key + zero length each.
        assert_eq!(bytes, vec![0x0a, 0x00, 0x12, 0x00]);
    }

    #[test]
    fn test_default_bool_and_enum_are_emitted() {
        let bytes = encode(&EnvFrom::default());
        assert_eq!(bytes, vec![0x0a, 0x00, 0x10, 0x00, 0x18, 0x00]);
    }

    #[test]
    fn test_empty_repeated_fields_are_omitted() {
        let bytes = encode(&Container::default());
        // name, image, working_dir, image_pull_policy: four empty strings.
        assert_eq!(bytes.len(), 2 + 2 + 2 + 2);
    }

    #[test]
    fn test_encoded_len_matches_output() {
        assert_eq!(owner().encoded_len(), encode(&owner()).len());
        assert_eq!(container().encoded_len(), encode(&container()).len());
        let req = SyncRequest {
            owner: Some(owner()),
            spec: vec![1, 2, 3],
        };
        assert_eq!(req.encoded_len(), encode(&req).len());
    }

    // ── Forward compatibility ───────────────────────────────────────

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut bytes = encode(&owner());
        append_unknown_varint(&mut bytes, 99, 123_456);
        append_unknown_bytes(&mut bytes, 42, b"from a newer host");
        let decoded: Owner = decode(bytes).unwrap();
        assert_eq!(decoded, owner());
    }

    #[test]
    fn test_unknown_fields_interleaved() {
        let gvr = GroupVersionResource::new("networking.k8s.io", "v1", "ingresses");
        let mut bytes = Vec::new();
        append_unknown_bytes(&mut bytes, 7, b"leading");
        bytes.extend(encode(&gvr));
        append_unknown_varint(&mut bytes, 8, 1);
        let decoded: GroupVersionResource = decode(bytes).unwrap();
        assert_eq!(decoded, gvr);
    }

    #[test]
    fn test_unknown_nested_field_inside_owner() {
        let mut owner_bytes = encode(&owner());
        append_unknown_varint(&mut owner_bytes, 31, 9);
        let mut bytes = Vec::new();
        append_unknown_bytes(&mut bytes, 1, &owner_bytes);
        let decoded: SyncRequest = decode(bytes).unwrap();
        assert_eq!(decoded.owner, Some(owner()));
    }

    #[test]
    fn test_fields_out_of_order() {
        let kv = KeyValue::new("app", "web");
        let mut bytes = Vec::new();
        encoding::string::encode(2, &kv.value, &mut bytes);
        encoding::string::encode(1, &kv.name, &mut bytes);
        let decoded: KeyValue = decode(bytes).unwrap();
        assert_eq!(decoded, kv);
    }

    #[test]
    fn test_repeated_field_in_pieces() {
        let mut bytes = Vec::new();
        encoding::string::encode(3, &"a".to_string(), &mut bytes);
        encoding::string::encode(1, &"c".to_string(), &mut bytes);
        encoding::string::encode(3, &"b".to_string(), &mut bytes);
        let decoded: Container = decode(bytes).unwrap();
        assert_eq!(decoded.command, vec!["a", "b"]);
        assert_eq!(decoded.name, "c");
    }

    // ── Enumerations ────────────────────────────────────────────────

    #[test]
    fn test_validation_type_from_raw() {
        assert_eq!(ValidationType::from_raw(0), ValidationType::Create);
        assert_eq!(ValidationType::from_raw(1), ValidationType::Update);
        assert_eq!(ValidationType::from_raw(2), ValidationType::Delete);
        assert_eq!(ValidationType::from_raw(-1), ValidationType::Create);
        assert_eq!(ValidationType::from_raw(17), ValidationType::Create);
    }

    #[test]
    fn test_unknown_env_from_type_falls_back() {
        let mut bytes = Vec::new();
        encoding::int32::encode(3, &9, &mut bytes);
        let decoded: EnvFrom = decode(bytes).unwrap();
        assert_eq!(decoded.kind, EnvFromType::Secret);
    }

    #[test]
    fn test_gvr_display() {
        let gvr = GroupVersionResource::new("networking.k8s.io", "v1", "ingresses");
        assert_eq!(gvr.to_string(), "networking.k8s.io/v1/ingresses");
        assert_eq!(GroupVersionResource::new("", "v1", "configmaps").to_string(), "v1/configmaps");
    }
}
