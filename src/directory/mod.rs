pub mod domain;
pub mod repository;
pub mod seed;

pub use domain::{ListParams, ListQuery, SearchPredicate, SortColumn, SortDirection};
pub use repository::{DirectoryRepository, RepositoryError, SqliteDirectoryRepository};
