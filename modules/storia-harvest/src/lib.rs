pub mod config;
pub mod enrich;
pub mod extract;
pub mod normalize;
pub mod page;
pub mod page_source;
pub mod record;
pub mod run;
pub mod selectors;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
