//! Names of the import/export table shared with the host.

/// Wasm import module every host function lives in.
pub const IMPORT_MODULE: &str = "tether";

/// Bumped whenever an import or export signature changes.
pub const ABI_VERSION: u32 = 2;

// ─── Imports ────────────────────────────────────────────────────────────

pub mod import {
    pub const ADD_ENV: &str = "addEnv";
    pub const ADD_ENV_FROM: &str = "addEnvFrom";
    pub const ADD_LABEL: &str = "addLabel";
    pub const ADD_ANNOTATION: &str = "addAnnotation";
    pub const ADD_INIT_CONTAINER: &str = "addInitContainer";
    pub const ADD_SIDECAR: &str = "addSidecar";
    pub const MERGE_PATCH: &str = "mergePatch";
    pub const VALIDATION_ERROR: &str = "validationError";
    pub const GET_OWNER: &str = "getOwner";
    pub const GET_SPEC: &str = "getSpec";
    pub const GET_OLD: &str = "getOld";
    pub const GET_RESOURCE: &str = "getResource";
    pub const CREATE_RESOURCE: &str = "createResource";
    pub const UPDATE_RESOURCE: &str = "updateResource";
    pub const DELETE_RESOURCE: &str = "deleteResource";

    /// Every import, in table order.
    pub const ALL: [&str; 15] = [
        ADD_ENV,
        ADD_ENV_FROM,
        ADD_LABEL,
        ADD_ANNOTATION,
        ADD_INIT_CONTAINER,
        ADD_SIDECAR,
        MERGE_PATCH,
        VALIDATION_ERROR,
        GET_OWNER,
        GET_SPEC,
        GET_OLD,
        GET_RESOURCE,
        CREATE_RESOURCE,
        UPDATE_RESOURCE,
        DELETE_RESOURCE,
    ];
}

// ─── Exports ────────────────────────────────────────────────────────────

pub mod export {
    pub const ALLOCATE: &str = "allocate";
    pub const RELEASE: &str = "release";
    pub const VALIDATE: &str = "Validate";
    pub const DEFAULTING: &str = "Defaulting";
    pub const SYNC: &str = "Sync";
    pub const DELETE: &str = "Delete";

    pub const ALL: [&str; 6] = [ALLOCATE, RELEASE, VALIDATE, DEFAULTING, SYNC, DELETE];
}
