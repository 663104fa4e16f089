mod links;
mod run;
mod seed;
mod solutions;
mod stats;
mod subsections;

pub use run::run;
pub(crate) use links::resolve_links;
pub(crate) use stats::IngestStats;

use run::*;
use seed::*;
use solutions::*;
use subsections::*;
