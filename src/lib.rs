pub mod cli;
pub mod diff;
pub mod error;
pub mod github;
pub mod input;
pub mod lcov;
pub mod model;
pub mod options;
pub mod path;
pub mod report;
