//! Persistence gateway: uniform save / find / delete per entity kind.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::error::AppError;
use crate::model::Id;
use async_trait::async_trait;

/// In-place edit applied to a stored entity by [`Repository::update_with`].
pub type Change<E> = Box<dyn FnOnce(&mut E) + Send>;

/// Storage contract for one entity kind `E`.
#[async_trait]
pub trait Repository<E: Send + 'static>: Send + Sync {
    /// Insert when `e` has no id, otherwise update the row with that id.
    /// Relation sets carried by `e` replace the stored ones.
    async fn save(&self, e: E) -> Result<E, AppError>;

    /// Every row; empty when the store holds none.
    async fn find_all(&self) -> Result<Vec<E>, AppError>;

    async fn find_by_id(&self, id: Id) -> Result<Option<E>, AppError>;

    /// Read the row `id`, apply `change` and save it. `None` when no row has that id.
    /// `change` must leave the id alone. Stores that can hold a row lock override
    /// this so the read and the write are one unit of work.
    async fn update_with(&self, id: Id, change: Change<E>) -> Result<Option<E>, AppError> {
        let Some(mut e) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        change(&mut e);
        self.save(e).await.map(Some)
    }

    /// Remove the row. Missing ids are a no-op.
    async fn delete_by_id(&self, id: Id) -> Result<(), AppError>;
}
