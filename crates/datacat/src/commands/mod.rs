pub(crate) use completions::Completions;
pub(crate) use config::Config;
pub(crate) use duplicates::Duplicates;
pub(crate) use export::Export;
pub(crate) use init::Init;
pub(crate) use list::List;
pub(crate) use search::Search;
pub(crate) use serve::Serve;

mod completions;
mod config;
mod duplicates;
mod export;
mod init;
mod list;
mod search;
mod serve;
