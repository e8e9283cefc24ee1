use std::path::PathBuf;

use crate::db::DbPool;

/// Shared handler state, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Root of the public static directory uploads are written under.
    pub public_root: PathBuf,
}
