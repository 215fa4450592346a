pub mod memory;
pub mod seaorm;

pub use memory::MemoryCatalogRepository;
pub use seaorm::SeaOrmCatalogRepository;
