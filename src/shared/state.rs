use crate::shared::utils::DbPool;

pub struct AppState {
    pub conn: DbPool,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}
