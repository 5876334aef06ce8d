//! Configuration system
//!
//! Loads the optional ~/.config/roomservice/config.yaml and resolves API
//! credentials from netrc. Values from the command line and environment
//! (`ROOMSERVICE_BRANCHES` and friends) are layered on top in `main`.

pub mod netrc;
mod roomservice_config;

pub use netrc::{Credentials, Netrc};
pub use roomservice_config::{
    parse_branch_list, RoomserviceConfig, BRANCHES_ENV, DEFAULT_API_URL, DEFAULT_ORG,
    DEFAULT_REMOTE,
};
